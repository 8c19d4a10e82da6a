//! # State Store
//!
//! Sole owner of the document snapshot. All changes go through typed
//! operations that build a [`Mutation`], apply it to a copy of the current
//! snapshot and commit the copy on success.
//!
//! ## Commit pipeline
//!
//! 1. Apply the mutation to a cloned snapshot (failures leave state untouched)
//! 2. Record the previous snapshot for undo
//! 3. Write the local cache synchronously (failures are logged only)
//! 4. Queue the snapshot for the remote writer (never rolls back the cache)
//! 5. Broadcast [`StateChanged`]
//!
//! Inside a batch, steps 2-5 happen once when the batch ends.

use crate::errors::StoreError;
use crate::history::{History, DEFAULT_HISTORY_LIMIT};
use crate::ids::IdGenerator;
use crate::model::{
    Component, ComponentData, LayoutType, PartialSnapshot, Section, SectionOptions, Snapshot,
};
use crate::mutations::{Direction, Mutation, MutationError};
use crate::persistence::{LocalCache, RemoteSink, RemoteSnapshotService};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_SIGNAL_CAPACITY: usize = 64;

/// Who caused a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A user-facing operation (intent, CLI, API call)
    Local,
    /// An edit propagated from the editor or preview surface
    Sync,
    /// Initial load from cache or remote
    Hydration,
    /// Undo or redo
    History,
    /// The cache changed underneath us
    Reload,
}

/// The `state-changed` signal
#[derive(Debug, Clone)]
pub struct StateChanged {
    pub snapshot: Arc<Snapshot>,
    pub version: u64,
    pub origin: ChangeOrigin,
}

/// Which source won during hydration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationSource {
    Cache,
    Remote,
    Empty,
}

#[derive(Debug)]
struct Batch {
    base: Arc<Snapshot>,
    depth: usize,
    dirty: bool,
    origin: ChangeOrigin,
}

pub struct Store {
    state: Arc<Snapshot>,
    version: u64,
    ids: IdGenerator,
    history: History,
    batch: Option<Batch>,
    cache: Box<dyn LocalCache>,
    remote: Option<RemoteSink>,
    events: broadcast::Sender<StateChanged>,
}

impl Store {
    pub fn new(cache: Box<dyn LocalCache>) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_SIGNAL_CAPACITY);
        Self {
            state: Arc::new(Snapshot::default()),
            version: 0,
            ids: IdGenerator::new(),
            history: History::with_max_levels(DEFAULT_HISTORY_LIMIT),
            batch: None,
            cache,
            remote: None,
            events,
        }
    }

    /// Forward every committed snapshot to a remote writer
    pub fn with_remote(mut self, sink: RemoteSink) -> Self {
        self.remote = Some(sink);
        self
    }

    pub fn with_history_limit(mut self, max_levels: usize) -> Self {
        self.history = History::with_max_levels(max_levels);
        self
    }

    pub fn with_signal_capacity(mut self, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        self.events = events;
        self
    }

    /// Load the initial document: local cache, then remote, then empty.
    ///
    /// A cache holding any components wins even if the remote snapshot is
    /// newer. Emits `state-changed` with [`ChangeOrigin::Hydration`]; the
    /// hydrated snapshot is not written back to the cache.
    #[instrument(skip(self, remote))]
    pub async fn hydrate(&mut self, remote: Option<&dyn RemoteSnapshotService>) -> HydrationSource {
        let cached = match self.cache.load() {
            Ok(Some(snapshot)) if !snapshot.components.is_empty() => Some(snapshot),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "local cache unreadable; falling back to remote");
                None
            }
        };

        let (snapshot, source) = match cached {
            Some(snapshot) => {
                debug!(
                    cached_modified = ?snapshot.meta.last_modified,
                    "local cache supersedes remote snapshot without comparing timestamps"
                );
                (snapshot, HydrationSource::Cache)
            }
            None => match remote {
                Some(remote) => match remote.load().await {
                    Ok(Some(snapshot)) => (snapshot, HydrationSource::Remote),
                    Ok(None) => (Snapshot::default(), HydrationSource::Empty),
                    Err(e) => {
                        warn!(error = %e, "remote snapshot unavailable; starting empty");
                        (Snapshot::default(), HydrationSource::Empty)
                    }
                },
                None => (Snapshot::default(), HydrationSource::Empty),
            },
        };

        info!(?source, components = snapshot.components.len(), "store hydrated");
        self.install(snapshot, ChangeOrigin::Hydration);
        source
    }

    /// Re-read the local cache after an external change.
    ///
    /// Returns false when the cache is empty or identical to the current
    /// document (our own writes come back through file watchers).
    pub fn reload_from_cache(&mut self) -> Result<bool, StoreError> {
        if self.batch.is_some() {
            return Err(StoreError::BatchOpen);
        }
        let Some(snapshot) = self.cache.load()? else {
            return Ok(false);
        };
        if snapshot == *self.state {
            return Ok(false);
        }
        self.history.clear();
        self.install(snapshot, ChangeOrigin::Reload);
        Ok(true)
    }

    fn install(&mut self, mut snapshot: Snapshot, origin: ChangeOrigin) {
        for violation in snapshot.sanitize() {
            warn!(%violation, "repaired reference in loaded document");
        }
        self.ids.observe(&snapshot);
        self.state = Arc::new(snapshot);
        self.emit(origin);
    }

    /// Read-only view of the current snapshot
    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    /// Shared handle to the current snapshot
    pub fn state(&self) -> Arc<Snapshot> {
        self.state.clone()
    }

    /// Number of emitted `state-changed` signals
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChanged> {
        self.events.subscribe()
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.state.component(id)
    }

    /// Insert a component, assigning an id when it has none
    pub fn add_component(&mut self, mut component: Component) -> String {
        if component.id.is_empty() {
            component.id = self.ids.next_component(&self.state);
        }
        let id = component.id.clone();
        // AddComponent only fails on an empty id, which we just ruled out
        self.commit(Mutation::AddComponent { component }, ChangeOrigin::Local);
        id
    }

    /// Merge `data` into a component. False when the id is unknown.
    pub fn update_component(&mut self, id: &str, data: ComponentData) -> bool {
        self.update_component_with_origin(id, data, ChangeOrigin::Local)
    }

    #[instrument(skip(self, data), fields(component_id = %id))]
    pub fn update_component_with_origin(
        &mut self,
        id: &str,
        data: ComponentData,
        origin: ChangeOrigin,
    ) -> bool {
        self.commit(
            Mutation::UpdateComponent {
                id: id.to_string(),
                data,
            },
            origin,
        )
    }

    /// Set a single data field
    pub fn set_field(&mut self, id: &str, key: &str, value: impl Into<Value>) -> bool {
        let mut data = Map::new();
        data.insert(key.to_string(), value.into());
        self.update_component(id, data)
    }

    pub fn remove_component(&mut self, id: &str) -> bool {
        self.commit(
            Mutation::RemoveComponent { id: id.to_string() },
            ChangeOrigin::Local,
        )
    }

    /// Shallow-merge top-level keys into the snapshot
    pub fn set_state(&mut self, partial: PartialSnapshot) {
        if self.commit(Mutation::SetState { partial }, ChangeOrigin::Local) {
            self.ids.observe(&self.state);
        }
    }

    pub fn move_component(&mut self, id: &str, direction: Direction) -> bool {
        self.commit(
            Mutation::MoveComponent {
                id: id.to_string(),
                direction,
            },
            ChangeOrigin::Local,
        )
    }

    /// Copy a component; returns the new id
    pub fn duplicate_component(&mut self, id: &str) -> Option<String> {
        if self.state.component(id).is_none() {
            warn!(component_id = %id, "cannot duplicate unknown component");
            return None;
        }
        let new_id = self.ids.next_component(&self.state);
        let mutation = Mutation::DuplicateComponent {
            id: id.to_string(),
            new_id: new_id.clone(),
        };
        self.commit(mutation, ChangeOrigin::Local).then_some(new_id)
    }

    pub fn set_layout_order(&mut self, order: Vec<String>) -> bool {
        self.commit(Mutation::SetLayoutOrder { order }, ChangeOrigin::Local)
    }

    /// Append a section; returns its id
    pub fn add_section(&mut self, layout_type: LayoutType) -> String {
        let id = self.ids.next_section(&self.state);
        let section = Section::new(id.clone(), layout_type);
        self.commit(
            Mutation::AddSection {
                section,
                after: None,
            },
            ChangeOrigin::Local,
        );
        id
    }

    pub fn insert_section_after(&mut self, after: &str, layout_type: LayoutType) -> Option<String> {
        let id = self.ids.next_section(&self.state);
        let section = Section::new(id.clone(), layout_type);
        let mutation = Mutation::AddSection {
            section,
            after: Some(after.to_string()),
        };
        self.commit(mutation, ChangeOrigin::Local).then_some(id)
    }

    pub fn retype_section(&mut self, id: &str, layout_type: LayoutType) -> bool {
        self.commit(
            Mutation::RetypeSection {
                id: id.to_string(),
                layout_type,
            },
            ChangeOrigin::Local,
        )
    }

    pub fn update_section_options(&mut self, id: &str, options: SectionOptions) -> bool {
        self.commit(
            Mutation::UpdateSectionOptions {
                id: id.to_string(),
                options,
            },
            ChangeOrigin::Local,
        )
    }

    /// Remove a section; its components stay in the document
    pub fn remove_section(&mut self, id: &str) -> bool {
        self.commit(
            Mutation::RemoveSection { id: id.to_string() },
            ChangeOrigin::Local,
        )
    }

    /// Place a component in a section column (clamped)
    pub fn assign_component(&mut self, component_id: &str, section_id: &str, column: i32) -> bool {
        self.commit(
            Mutation::AssignComponent {
                component_id: component_id.to_string(),
                section_id: section_id.to_string(),
                column,
            },
            ChangeOrigin::Local,
        )
    }

    pub fn update_global_settings(&mut self, settings: Map<String, Value>) -> bool {
        self.commit(
            Mutation::UpdateGlobalSettings { settings },
            ChangeOrigin::Local,
        )
    }

    pub fn set_theme(&mut self, theme: &str) -> bool {
        let mut settings = Map::new();
        settings.insert("theme".to_string(), Value::String(theme.to_string()));
        self.update_global_settings(settings)
    }

    pub fn reset(&mut self) {
        self.commit(Mutation::Reset, ChangeOrigin::Local);
    }

    /// Apply an arbitrary mutation
    pub fn apply(&mut self, mutation: Mutation) -> Result<(), StoreError> {
        self.try_commit(mutation, ChangeOrigin::Local)?;
        Ok(())
    }

    /// Start grouping mutations into one signal, one write and one undo step
    pub fn begin_batch(&mut self) {
        match &mut self.batch {
            Some(batch) => batch.depth += 1,
            None => {
                self.batch = Some(Batch {
                    base: self.state.clone(),
                    depth: 1,
                    dirty: false,
                    origin: ChangeOrigin::Local,
                })
            }
        }
    }

    pub fn end_batch(&mut self) {
        let Some(batch) = self.batch.as_mut() else {
            warn!("end_batch called without an open batch");
            return;
        };
        batch.depth -= 1;
        if batch.depth > 0 {
            return;
        }
        if let Some(batch) = self.batch.take() {
            if batch.dirty {
                self.history.record(batch.base);
                self.publish(batch.origin);
            }
        }
    }

    pub fn batch<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Store),
    {
        self.begin_batch();
        f(self);
        self.end_batch();
    }

    pub fn can_undo(&self) -> bool {
        self.batch.is_none() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.batch.is_none() && self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        if self.batch.is_some() {
            warn!("undo ignored while a batch is open");
            return false;
        }
        match self.history.undo(self.state.clone()) {
            Some(previous) => {
                self.state = previous;
                self.ids.observe(&self.state);
                self.publish(ChangeOrigin::History);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.batch.is_some() {
            warn!("redo ignored while a batch is open");
            return false;
        }
        match self.history.redo(self.state.clone()) {
            Some(next) => {
                self.state = next;
                self.ids.observe(&self.state);
                self.publish(ChangeOrigin::History);
                true
            }
            None => false,
        }
    }

    /// Commit and log failures; the operation-level API reports a bool
    fn commit(&mut self, mutation: Mutation, origin: ChangeOrigin) -> bool {
        let name = mutation.name();
        match self.try_commit(mutation, origin) {
            Ok(()) => true,
            Err(e) => {
                warn!(mutation = name, error = %e, "mutation rejected");
                false
            }
        }
    }

    fn try_commit(&mut self, mutation: Mutation, origin: ChangeOrigin) -> Result<(), MutationError> {
        let mut next = (*self.state).clone();
        mutation.apply(&mut next)?;
        next.meta.touch();

        let previous = std::mem::replace(&mut self.state, Arc::new(next));
        debug!(mutation = mutation.name(), ?origin, "mutation committed");

        match &mut self.batch {
            Some(batch) => {
                batch.dirty = true;
                batch.origin = origin;
            }
            None => {
                self.history.record(previous);
                self.publish(origin);
            }
        }
        Ok(())
    }

    fn publish(&mut self, origin: ChangeOrigin) {
        self.persist();
        self.emit(origin);
    }

    fn persist(&mut self) {
        if let Err(e) = self.cache.save(&self.state) {
            warn!(error = %e, "local cache write failed");
        }
        if let Some(remote) = &self.remote {
            if let Err(e) = remote.submit(self.state.clone()) {
                warn!(error = %e, "remote submit failed");
            }
        }
    }

    fn emit(&mut self, origin: ChangeOrigin) {
        self.version += 1;
        // No subscribers is not an error
        let _ = self.events.send(StateChanged {
            snapshot: self.state.clone(),
            version: self.version,
            origin,
        });
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("version", &self.version)
            .field("components", &self.state.components.len())
            .field("sections", &self.state.sections.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryCache;

    #[test]
    fn test_failed_mutation_emits_nothing() {
        let mut store = Store::new(Box::new(MemoryCache::new()));
        let mut rx = store.subscribe();

        assert!(!store.update_component("missing", Map::new()));
        assert!(!store.remove_component("missing"));
        assert!(rx.try_recv().is_err());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_batch_emits_once() {
        let cache = MemoryCache::new();
        let mut store = Store::new(Box::new(cache.clone()));
        let mut rx = store.subscribe();

        store.batch(|store| {
            let id = store.add_component(Component::new("hero"));
            store.set_field(&id, "title", "Hello");
            store.add_component(Component::new("bio"));
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.origin, ChangeOrigin::Local);
        assert_eq!(event.snapshot.components.len(), 2);
        assert!(rx.try_recv().is_err());
        assert_eq!(cache.saves(), 1);

        assert!(store.undo());
        assert!(store.snapshot().components.is_empty());
    }

    #[test]
    fn test_undo_redo_restores_snapshots() {
        let mut store = Store::new(Box::new(MemoryCache::new()));
        let id = store.add_component(Component::new("hero"));
        store.set_field(&id, "title", "One");
        store.set_field(&id, "title", "Two");

        assert!(store.undo());
        assert_eq!(store.component(&id).unwrap().text("title").as_deref(), Some("One"));
        assert!(store.redo());
        assert_eq!(store.component(&id).unwrap().text("title").as_deref(), Some("Two"));
        assert!(!store.redo());
    }

    #[test]
    fn test_ids_are_not_reused_after_removal() {
        let mut store = Store::new(Box::new(MemoryCache::new()));
        let first = store.add_component(Component::new("hero"));
        store.remove_component(&first);
        let second = store.add_component(Component::new("hero"));
        assert_eq!(first, "c1");
        assert_eq!(second, "c2");
    }
}
