//! # Sync Coordinator
//!
//! Keeps tracked properties equal between the editor and preview surfaces
//! of each registered component, and writes edits into the store.
//!
//! ```text
//! edit ──> debounce (per element) ──> infer property ──┬──> Store (origin Sync)
//!                                                      └──> other surface (guarded)
//! ```
//!
//! Time is passed in by the caller. [`SyncCoordinator::poll`] fires whatever
//! is due and [`SyncCoordinator::next_deadline`] says when to call it again.

use crate::debounce::Debouncer;
use crate::errors::SyncError;
use crate::guard::EchoGuard;
use crate::inference::infer_property;
use crate::mapping::{PropertySpec, PropertyTable};
use crate::surface::{EditEvent, ElementHandle, ElementInfo, Surface, SurfaceHost};
use mediakit_store::{value_as_text, ChangeOrigin, Component, Snapshot, StateChanged, Store};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, instrument, trace, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);
pub const DEFAULT_REATTACH_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub debounce: Duration,
    pub reattach_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            reattach_delay: DEFAULT_REATTACH_DELAY,
        }
    }
}

/// Active sync registration of one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub component_id: String,
    pub kind: String,
    /// Ordered property descriptors
    pub properties: Vec<String>,
    /// Properties were supplied by the caller rather than derived
    pub explicit: bool,
    pub editor: Vec<ElementHandle>,
    pub preview: Vec<ElementHandle>,
}

impl Registration {
    pub fn handles(&self, surface: Surface) -> &[ElementHandle] {
        match surface {
            Surface::Editor => &self.editor,
            Surface::Preview => &self.preview,
        }
    }

    pub fn owns(&self, element: ElementHandle) -> bool {
        self.editor.contains(&element) || self.preview.contains(&element)
    }

    fn all_handles(&self) -> Vec<ElementHandle> {
        self.editor.iter().chain(&self.preview).copied().collect()
    }
}

/// What one `poll` or state signal did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub propagated: usize,
    pub dropped: usize,
    pub writes: usize,
    pub reattached: usize,
    pub resynced: usize,
    pub unregistered: usize,
}

impl SyncReport {
    pub fn absorb(&mut self, other: SyncReport) {
        self.propagated += other.propagated;
        self.dropped += other.dropped;
        self.writes += other.writes;
        self.reattached += other.reattached;
        self.resynced += other.resynced;
        self.unregistered += other.unregistered;
    }

    pub fn is_idle(&self) -> bool {
        *self == SyncReport::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub registrations: u64,
    pub propagations: u64,
    pub dropped: u64,
    pub writes: u64,
    pub resyncs: u64,
}

/// A debounced edit lifted off its element while the host rebuilds a
/// surface. Keeps the typed value and the original deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldEdit {
    pub component_id: String,
    pub surface: Surface,
    pub property: String,
    pub value: String,
    pub deadline: Instant,
}

#[derive(Debug, Clone)]
struct PendingEdit {
    component_id: String,
    surface: Surface,
}

pub struct SyncCoordinator<H: SurfaceHost> {
    host: H,
    config: SyncConfig,
    table: PropertyTable,
    registrations: BTreeMap<String, Registration>,
    debouncer: Debouncer<ElementHandle, PendingEdit>,
    guard: EchoGuard,
    subscription: Option<broadcast::Receiver<StateChanged>>,
    stats: SyncStats,
}

impl<H: SurfaceHost> SyncCoordinator<H> {
    pub fn new(host: H, table: PropertyTable, config: SyncConfig) -> Self {
        Self {
            host,
            debouncer: Debouncer::new(config.debounce),
            guard: EchoGuard::new(config.reattach_delay),
            config,
            table,
            registrations: BTreeMap::new(),
            subscription: None,
            stats: SyncStats::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    pub fn table(&self) -> &PropertyTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut PropertyTable {
        &mut self.table
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn is_registered(&self, component_id: &str) -> bool {
        self.registrations.contains_key(component_id)
    }

    pub fn registration(&self, component_id: &str) -> Option<&Registration> {
        self.registrations.get(component_id)
    }

    pub fn registered(&self) -> Vec<&str> {
        self.registrations.keys().map(String::as_str).collect()
    }

    /// Edits waiting for their debounce window
    pub fn pending_edits(&self) -> usize {
        self.debouncer.len()
    }

    /// Earliest instant at which `poll` has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debouncer.next_deadline(), self.guard.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ---- registration ----

    /// Register a component and listen on all of its elements.
    ///
    /// Without explicit `properties` the tracked list comes from the property
    /// table for the component's type, then from property identifiers found
    /// on its elements. Registering again replaces the previous registration.
    /// Returns the number of elements bound.
    #[instrument(skip(self, component, properties), fields(component_id = %component.id))]
    pub fn register(
        &mut self,
        component: &Component,
        properties: Option<Vec<String>>,
    ) -> Result<usize, SyncError> {
        let editor = self.host.elements(Surface::Editor, &component.id);
        let preview = self.host.elements(Surface::Preview, &component.id);
        if editor.is_empty() && preview.is_empty() {
            return Err(SyncError::NoElements(component.id.clone()));
        }

        let explicit = properties.is_some();
        let properties = match properties {
            Some(properties) => properties,
            None => self.derive_properties(component, &editor, &preview),
        };
        if properties.is_empty() {
            return Err(SyncError::NoProperties(component.id.clone()));
        }

        if self.registrations.contains_key(&component.id) {
            debug!("replacing existing registration");
            self.release_listeners(&component.id);
        }

        let registration = Registration {
            component_id: component.id.clone(),
            kind: component.kind.clone(),
            properties,
            explicit,
            editor: editor.iter().map(|e| e.handle).collect(),
            preview: preview.iter().map(|e| e.handle).collect(),
        };

        let handles = registration.all_handles();
        for handle in &handles {
            if !self.guard.defer_attach(*handle) {
                self.host.attach(*handle);
            }
        }
        self.debouncer
            .cancel_where(|element, edit| edit.component_id == component.id && !handles.contains(element));

        info!(
            properties = registration.properties.len(),
            elements = handles.len(),
            "registered component for sync"
        );
        self.registrations.insert(component.id.clone(), registration);
        self.stats.registrations += 1;
        Ok(handles.len())
    }

    /// Detach all listeners of a component and drop its pending edits
    pub fn unregister(&mut self, component_id: &str) -> bool {
        if !self.registrations.contains_key(component_id) {
            return false;
        }
        let handles = self.release_listeners(component_id);
        self.guard.forget(&handles);
        let cancelled = self
            .debouncer
            .cancel_where(|_, edit| edit.component_id == component_id);
        self.registrations.remove(component_id);
        info!(%component_id, cancelled, "unregistered component");
        true
    }

    /// Push notification from the view layer that a component's elements
    /// now exist. Registers (or rebinds) it and writes the store values in.
    pub fn notify_mounted(&mut self, component_id: &str, snapshot: &Snapshot, now: Instant) -> bool {
        let Some(component) = snapshot.component(component_id) else {
            debug!(%component_id, "mounted component is not in the store");
            return false;
        };
        let explicit = self.explicit_properties(component_id);
        match self.register(component, explicit) {
            Ok(_) => {
                self.resync(Some(component_id), snapshot, now);
                true
            }
            Err(e) => {
                debug!(%component_id, error = %e, "component not ready for sync");
                false
            }
        }
    }

    /// Scan every component in the store and register the ones with
    /// elements. Fallback for hosts that cannot push mount notifications.
    pub fn discover(&mut self, snapshot: &Snapshot, now: Instant) -> usize {
        let candidates: Vec<String> = snapshot
            .components
            .keys()
            .filter(|id| !self.registrations.contains_key(*id))
            .cloned()
            .collect();

        let registered = candidates
            .iter()
            .filter(|id| self.notify_mounted(id, snapshot, now))
            .count();
        if registered > 0 {
            debug!(registered, "discovered components");
        }
        registered
    }

    /// Re-query element handles of every registration, e.g. after the
    /// preview was rebuilt
    pub fn rebind_all(&mut self, snapshot: &Snapshot) -> usize {
        let ids: Vec<String> = self.registrations.keys().cloned().collect();
        let mut rebound = 0;
        for id in ids {
            let Some(component) = snapshot.component(&id) else {
                self.unregister(&id);
                continue;
            };
            let explicit = self.explicit_properties(&id);
            match self.register(component, explicit) {
                Ok(_) => rebound += 1,
                Err(e) => {
                    debug!(component_id = %id, error = %e, "dropping registration on rebind");
                    self.unregister(&id);
                }
            }
        }
        rebound
    }

    // ---- edits ----

    /// Queue an edit; false when it does not belong to a registration
    pub fn handle_edit(&mut self, event: EditEvent, now: Instant) -> bool {
        let Some(registration) = self.registrations.get(&event.component_id) else {
            trace!(component_id = %event.component_id, "edit on unregistered component");
            return false;
        };
        if !registration.owns(event.element) {
            trace!(element = %event.element, "edit on unbound element");
            return false;
        }
        if self.guard.is_suppressed(event.element) {
            trace!(element = %event.element, "ignoring echo of a guarded write");
            return false;
        }
        self.debouncer.push(
            event.element,
            PendingEdit {
                component_id: event.component_id,
                surface: event.surface,
            },
            now,
        );
        true
    }

    /// Take the pending edits of `surface` off their elements before the
    /// host replaces them. Host events not seen yet are queued first so no
    /// typed input is lost with the old elements.
    pub fn hold_pending(&mut self, surface: Surface, now: Instant) -> Vec<HeldEdit> {
        for event in self.host.drain_events() {
            self.handle_edit(event, now);
        }

        let mut held = Vec::new();
        for (element, edit, deadline) in self.debouncer.take_where(|_, edit| edit.surface == surface) {
            let property = self.registrations.get(&edit.component_id).and_then(|registration| {
                let info = self.host.element(element)?;
                infer_property(&info, &registration.properties).ok()
            });
            match (property, self.host.read(element)) {
                (Some(property), Some(value)) => held.push(HeldEdit {
                    component_id: edit.component_id,
                    surface,
                    property,
                    value,
                    deadline,
                }),
                _ => debug!(%element, "pending edit has no readable property"),
            }
        }
        held
    }

    /// Put held edits back on the elements that replaced theirs: the typed
    /// value is written in and the edit keeps its deadline. Returns how many
    /// found an element.
    pub fn restore_pending(&mut self, held: Vec<HeldEdit>) -> usize {
        let mut restored = 0;
        for edit in held {
            let Some(properties) = self
                .registrations
                .get(&edit.component_id)
                .map(|r| r.properties.clone())
            else {
                debug!(component_id = %edit.component_id, "held edit for unregistered component");
                continue;
            };
            let target = self
                .host
                .elements(edit.surface, &edit.component_id)
                .into_iter()
                .find(|info| infer_property(info, &properties).as_deref() == Ok(edit.property.as_str()));
            let Some(target) = target else {
                debug!(
                    component_id = %edit.component_id,
                    property = %edit.property,
                    "held edit lost its element"
                );
                continue;
            };

            // Quiet write; the edit is already queued
            let listening = self.host.is_attached(target.handle);
            if listening {
                self.host.detach(target.handle);
            }
            let written = self.host.write(target.handle, &edit.value);
            if listening {
                self.host.attach(target.handle);
            }
            if let Err(e) = written {
                warn!(component_id = %edit.component_id, error = %e, "cannot restore held edit");
                continue;
            }

            self.debouncer.push_until(
                target.handle,
                PendingEdit {
                    component_id: edit.component_id,
                    surface: edit.surface,
                },
                edit.deadline,
            );
            restored += 1;
        }
        restored
    }

    /// Reattach expired guards, collect host edits and propagate the ones
    /// whose window elapsed
    pub fn poll(&mut self, now: Instant, store: &mut Store) -> SyncReport {
        let mut report = SyncReport {
            reattached: self.guard.release_due(&mut self.host, now),
            ..SyncReport::default()
        };

        for event in self.host.drain_events() {
            self.handle_edit(event, now);
        }

        for (element, edit) in self.debouncer.take_due(now) {
            match self.propagate(element, &edit, now, store) {
                Ok(writes) => {
                    report.propagated += 1;
                    report.writes += writes;
                }
                Err(e) => {
                    warn!(
                        component_id = %edit.component_id,
                        %element,
                        surface = %edit.surface,
                        error = %e,
                        "dropping edit"
                    );
                    self.stats.dropped += 1;
                    report.dropped += 1;
                }
            }
        }
        report
    }

    fn propagate(
        &mut self,
        element: ElementHandle,
        edit: &PendingEdit,
        now: Instant,
        store: &mut Store,
    ) -> Result<usize, SyncError> {
        let registration = self
            .registrations
            .get(&edit.component_id)
            .ok_or_else(|| SyncError::NotRegistered(edit.component_id.clone()))?;
        let properties = registration.properties.clone();
        let targets = registration.handles(edit.surface.other()).to_vec();

        let info = self
            .host
            .element(element)
            .ok_or(SyncError::UnknownElement(element))?;
        let property = infer_property(&info, &properties)?;
        let value = self
            .host
            .read(element)
            .ok_or(SyncError::UnknownElement(element))?;

        let mut data = Map::new();
        data.insert(property.clone(), Value::String(value.clone()));
        if !store.update_component_with_origin(&edit.component_id, data, ChangeOrigin::Sync) {
            return Err(SyncError::ComponentNotFound(edit.component_id.clone()));
        }

        let mut writes = 0;
        for target in targets {
            let Some(target_info) = self.host.element(target) else {
                continue;
            };
            if infer_property(&target_info, &properties).as_deref() != Ok(property.as_str()) {
                continue;
            }
            if self.host.read(target).as_deref() == Some(value.as_str()) {
                continue;
            }
            self.guarded_write(target, &value, now)?;
            writes += 1;
        }

        self.stats.propagations += 1;
        debug!(
            component_id = %edit.component_id,
            %property,
            from = %edit.surface,
            writes,
            "propagated edit"
        );
        Ok(writes)
    }

    // ---- resync ----

    /// Write every tracked property from `snapshot` into both surfaces,
    /// bypassing debounce. Pending edits of the affected components are
    /// cancelled. Properties absent from the component's data are left
    /// alone. Returns the number of writes.
    #[instrument(skip(self, snapshot, now))]
    pub fn resync(&mut self, component_id: Option<&str>, snapshot: &Snapshot, now: Instant) -> usize {
        let ids: Vec<String> = match component_id {
            Some(id) if self.registrations.contains_key(id) => vec![id.to_string()],
            Some(id) => {
                debug!(component_id = %id, "resync requested for unregistered component");
                return 0;
            }
            None => self.registrations.keys().cloned().collect(),
        };

        let mut writes = 0;
        for id in ids {
            self.debouncer.cancel_where(|_, edit| edit.component_id == id);

            let Some(component) = snapshot.component(&id) else {
                continue;
            };
            let Some(registration) = self.registrations.get(&id) else {
                continue;
            };
            let properties = registration.properties.clone();

            for handle in registration.all_handles() {
                let Some(info) = self.host.element(handle) else {
                    continue;
                };
                let Ok(property) = infer_property(&info, &properties) else {
                    continue;
                };
                let Some(value) = component.data.get(&property).and_then(value_as_text) else {
                    continue;
                };
                match self.guarded_write(handle, &value, now) {
                    Ok(()) => writes += 1,
                    Err(e) => warn!(component_id = %id, %property, error = %e, "resync write failed"),
                }
            }
        }

        self.stats.resyncs += 1;
        writes
    }

    // ---- state signal ----

    /// Listen to the store's state signal
    pub fn attach(&mut self, store: &Store) {
        self.subscription = Some(store.subscribe());
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// React to one state change: drop registrations of removed components
    /// and resync everything unless the change came from sync itself
    pub fn on_state_changed(&mut self, event: &StateChanged, now: Instant) -> SyncReport {
        self.apply_state(&event.snapshot, event.origin != ChangeOrigin::Sync, now)
    }

    /// Drain the subscription and handle the latest state once
    pub fn pump(&mut self, now: Instant) -> SyncReport {
        let Some(rx) = self.subscription.as_mut() else {
            return SyncReport::default();
        };

        let mut latest = None;
        let mut needs_resync = false;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    needs_resync |= event.origin != ChangeOrigin::Sync;
                    latest = Some(event.snapshot);
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "sync coordinator fell behind state changes");
                    needs_resync = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        match latest {
            Some(snapshot) => self.apply_state(&snapshot, needs_resync, now),
            None => SyncReport::default(),
        }
    }

    fn apply_state(&mut self, snapshot: &Snapshot, resync: bool, now: Instant) -> SyncReport {
        let mut report = SyncReport::default();

        let removed: Vec<String> = self
            .registrations
            .keys()
            .filter(|id| snapshot.component(id).is_none())
            .cloned()
            .collect();
        for id in removed {
            if self.unregister(&id) {
                report.unregistered += 1;
            }
        }

        if resync && !self.registrations.is_empty() {
            report.resynced = self.registrations.len();
            report.writes += self.resync(None, snapshot, now);
        }
        report
    }

    // ---- internals ----

    fn guarded_write(&mut self, element: ElementHandle, value: &str, now: Instant) -> Result<(), SyncError> {
        let host = &mut self.host;
        self.guard
            .with_suppressed_echo(host, element, now, |h| h.write(element, value))?;
        self.stats.writes += 1;
        Ok(())
    }

    fn release_listeners(&mut self, component_id: &str) -> Vec<ElementHandle> {
        let handles = self
            .registrations
            .get(component_id)
            .map(Registration::all_handles)
            .unwrap_or_default();
        for handle in &handles {
            self.host.detach(*handle);
        }
        handles
    }

    fn explicit_properties(&self, component_id: &str) -> Option<Vec<String>> {
        self.registrations
            .get(component_id)
            .filter(|r| r.explicit)
            .map(|r| r.properties.clone())
    }

    fn derive_properties(
        &self,
        component: &Component,
        editor: &[ElementInfo],
        preview: &[ElementInfo],
    ) -> Vec<String> {
        if let Some(spec) = self.table.get(&component.kind) {
            let items = if spec.list_based {
                list_items(spec, component, editor, preview)
            } else {
                0
            };
            let properties = spec.expand(items);
            if !properties.is_empty() {
                return properties;
            }
        }

        let mut properties: Vec<String> = Vec::new();
        for info in editor.iter().chain(preview) {
            if let Some(property) = &info.property {
                if !properties.contains(property) {
                    properties.push(property.clone());
                }
            }
        }
        properties
    }
}

/// Items of a list-based instance: the larger of what the data holds and
/// what either surface shows
fn list_items(
    spec: &PropertySpec,
    component: &Component,
    editor: &[ElementInfo],
    preview: &[ElementInfo],
) -> usize {
    let fields = spec.fields.len().max(1);
    let from_data = (1..)
        .take_while(|n| {
            spec.fields
                .iter()
                .any(|f| component.data.contains_key(&format!("{}_{}", f, n)))
        })
        .count();
    let on_surface = |elements: &[ElementInfo]| (elements.len() + fields - 1) / fields;
    from_data.max(on_surface(editor)).max(on_surface(preview))
}
