use crate::model::Snapshot;

/// Sequential id generator for components (`c1`, `c2`, …) and sections
/// (`s1`, `s2`, …).
///
/// Counters only move forward, so an id is never handed out twice in a
/// session even after the original owner has been removed.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    components: u32,
    sections: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counters past every id already present in `snapshot`
    pub fn observe(&mut self, snapshot: &Snapshot) {
        for id in snapshot.components.keys() {
            if let Some(n) = sequence_of(id, 'c') {
                self.components = self.components.max(n);
            }
        }
        for section in &snapshot.sections {
            if let Some(n) = sequence_of(&section.id, 's') {
                self.sections = self.sections.max(n);
            }
        }
    }

    pub fn next_component(&mut self, snapshot: &Snapshot) -> String {
        loop {
            self.components += 1;
            let id = format!("c{}", self.components);
            if !snapshot.components.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn next_section(&mut self, snapshot: &Snapshot) -> String {
        loop {
            self.sections += 1;
            let id = format!("s{}", self.sections);
            if snapshot.section(&id).is_none() {
                return id;
            }
        }
    }
}

fn sequence_of(id: &str, prefix: char) -> Option<u32> {
    id.strip_prefix(prefix)?.parse().ok()
}
