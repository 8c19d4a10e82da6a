use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending<V> {
    value: V,
    deadline: Instant,
    seq: u64,
}

/// Per-key trailing-edge debounce with injected time.
///
/// A new push for a key replaces its value and restarts its window. Due
/// entries come out in the order of their most recent push.
#[derive(Debug)]
pub struct Debouncer<K, V> {
    window: Duration,
    pending: HashMap<K, Pending<V>>,
    seq: u64,
}

impl<K: Eq + Hash + Clone, V> Debouncer<K, V> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
            seq: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn push(&mut self, key: K, value: V, now: Instant) {
        self.seq += 1;
        self.pending.insert(
            key,
            Pending {
                value,
                deadline: now + self.window,
                seq: self.seq,
            },
        );
    }

    /// Queue `value` under `key` with an explicit deadline, e.g. to carry an
    /// entry over to a new key without restarting its window
    pub fn push_until(&mut self, key: K, value: V, deadline: Instant) {
        self.seq += 1;
        self.pending.insert(
            key,
            Pending {
                value,
                deadline,
                seq: self.seq,
            },
        );
    }

    /// Remove and return everything whose window has elapsed
    pub fn take_due(&mut self, now: Instant) -> Vec<(K, V)> {
        self.remove_matching(|_, p| p.deadline <= now)
            .into_iter()
            .map(|(k, v, _)| (k, v))
            .collect()
    }

    /// Remove entries matching `predicate` whether due or not, with their
    /// deadlines, in push order
    pub fn take_where(&mut self, mut predicate: impl FnMut(&K, &V) -> bool) -> Vec<(K, V, Instant)> {
        self.remove_matching(|k, p| predicate(k, &p.value))
    }

    fn remove_matching(&mut self, mut predicate: impl FnMut(&K, &Pending<V>) -> bool) -> Vec<(K, V, Instant)> {
        let keys: Vec<K> = self
            .pending
            .iter()
            .filter(|(k, p)| predicate(*k, *p))
            .map(|(k, _)| k.clone())
            .collect();

        let mut removed: Vec<(u64, K, V, Instant)> = keys
            .into_iter()
            .filter_map(|k| self.pending.remove(&k).map(|p| (p.seq, k, p.value, p.deadline)))
            .collect();
        removed.sort_by_key(|(seq, ..)| *seq);
        removed.into_iter().map(|(_, k, v, d)| (k, v, d)).collect()
    }

    /// Drop pending entries matching `predicate`; returns how many
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&K, &V) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|k, p| !predicate(k, &p.value));
        before - self.pending.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(150);

    #[test]
    fn test_new_push_restarts_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        debouncer.push("a", 1, start);
        debouncer.push("a", 2, start + Duration::from_millis(100));

        assert!(debouncer.take_due(start + WINDOW).is_empty());
        assert_eq!(
            debouncer.take_due(start + Duration::from_millis(250)),
            vec![("a", 2)]
        );
        assert!(debouncer.is_empty());
    }

    #[test]
    fn test_due_in_push_order() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        debouncer.push("b", 1, start);
        debouncer.push("a", 2, start + Duration::from_millis(10));

        let due = debouncer.take_due(start + Duration::from_secs(1));
        assert_eq!(due, vec![("b", 1), ("a", 2)]);
    }

    #[test]
    fn test_take_where_keeps_deadline_for_push_until() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push(1, "a", start);
        debouncer.push(2, "b", start + Duration::from_millis(100));

        let taken = debouncer.take_where(|_, v| *v == "a");
        assert_eq!(taken, vec![(1, "a", start + WINDOW)]);
        assert_eq!(debouncer.len(), 1);

        // Re-keyed entry fires at its original deadline, not later
        let (_, value, deadline) = taken[0];
        debouncer.push_until(7, value, deadline);
        assert_eq!(debouncer.take_due(start + WINDOW), vec![(7, "a")]);
        assert!(debouncer.is_pending(&2));
    }

    #[test]
    fn test_cancel_and_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push(1, "x", start);
        debouncer.push(2, "y", start + Duration::from_millis(20));

        assert_eq!(debouncer.next_deadline(), Some(start + WINDOW));
        assert_eq!(debouncer.cancel_where(|k, _| *k == 1), 1);
        assert_eq!(
            debouncer.next_deadline(),
            Some(start + Duration::from_millis(20) + WINDOW)
        );
    }
}
