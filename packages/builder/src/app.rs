//! # Builder
//!
//! Wires the store, renderer and sync coordinator together.
//!
//! ## Bootstrap order
//!
//! 1. Hydrate the store (cache, then remote, then empty)
//! 2. Mount the renderer and project its output into the preview surface
//! 3. Attach the sync coordinator and discover components with elements
//!
//! After that, [`Builder::tick`] moves state changes through the pipeline and
//! [`Builder::run`] drives it from UI events and timers.

use crate::builtin::property_table;
use crate::config::Config;
use crate::errors::BuilderResult;
use crate::intents::{apply_intent, IntentOutcome};
use crate::projection::{close_editor_panel, open_editor_panel, project_preview};
use futures::Stream;
use mediakit_render::{Intent, Renderer, TemplateRegistry, VirtualDomDocument};
use mediakit_store::{
    spawn_remote_writer, Component, HydrationSource, LocalCache, RemoteSnapshotService,
    SaveOutcome, Snapshot, Store,
};
use mediakit_sync::{ElementHandle, MemorySurface, Surface, SyncCoordinator, SyncReport};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, instrument, warn};

/// Events fed into [`Builder::run`]
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// The user typed into an element
    Edit {
        element: ElementHandle,
        value: String,
    },
    /// A control was activated; `confirmed` answers any confirmation prompt
    Intent { intent: Intent, confirmed: bool },
    /// The view layer finished mounting a component
    Mounted(String),
    Resync(Option<String>),
    OpenEditor(String),
    CloseEditor,
    AddComponent(Component),
    Undo,
    Redo,
    /// The cache file changed on disk
    CacheChanged,
    Shutdown,
}

/// Completed bootstrap steps, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootStage {
    Hydrated(HydrationSource),
    Rendered { components: usize },
    SyncReady { registered: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub rebuilds: usize,
    pub sync: SyncReport,
    pub remote_failures: usize,
}

pub type RenderHook = Box<dyn FnMut(&VirtualDomDocument) + Send>;

pub struct Builder {
    config: Config,
    store: Store,
    renderer: Renderer,
    sync: SyncCoordinator<MemorySurface>,
    editor_open: Option<String>,
    remote_outcomes: Option<mpsc::UnboundedReceiver<SaveOutcome>>,
    on_render: Option<RenderHook>,
    stages: Vec<BootStage>,
}

impl Builder {
    /// Hydrate, render, then start sync. Must run inside a tokio runtime
    /// when `remote` is given.
    #[instrument(skip_all)]
    pub async fn bootstrap(
        config: Config,
        cache: Box<dyn LocalCache>,
        templates: TemplateRegistry,
        remote: Option<Arc<dyn RemoteSnapshotService>>,
    ) -> BuilderResult<Self> {
        let mut stages = Vec::new();

        let mut store = Store::new(cache)
            .with_history_limit(config.history_limit)
            .with_signal_capacity(config.signal_capacity);
        let mut remote_outcomes = None;
        if let Some(service) = &remote {
            let writer = spawn_remote_writer(service.clone());
            store = store.with_remote(writer.sink);
            remote_outcomes = Some(writer.outcomes);
        }

        let source = store.hydrate(remote.as_deref()).await;
        stages.push(BootStage::Hydrated(source));

        let table = property_table(&templates);
        let mut renderer = Renderer::new(Arc::new(templates));
        let mut surface = MemorySurface::new();
        let mounted = project_preview(renderer.mount(&store), &mut surface);
        stages.push(BootStage::Rendered {
            components: mounted.len(),
        });

        let mut sync = SyncCoordinator::new(surface, table, config.sync_config());
        sync.attach(&store);
        let registered = sync.discover(store.snapshot(), Instant::now());
        stages.push(BootStage::SyncReady { registered });

        info!(?source, registered, "builder ready");
        Ok(Self {
            config,
            store,
            renderer,
            sync,
            editor_open: None,
            remote_outcomes,
            on_render: None,
            stages,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stages(&self) -> &[BootStage] {
        &self.stages
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn output(&self) -> &VirtualDomDocument {
        self.renderer.output()
    }

    pub fn sync(&self) -> &SyncCoordinator<MemorySurface> {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncCoordinator<MemorySurface> {
        &mut self.sync
    }

    pub fn surface(&self) -> &MemorySurface {
        self.sync.host()
    }

    pub fn editor_open(&self) -> Option<&str> {
        self.editor_open.as_deref()
    }

    /// Called with the new output after every rebuild
    pub fn set_render_hook(&mut self, hook: RenderHook) {
        self.on_render = Some(hook);
    }

    /// Snapshots as they are committed
    pub fn state_stream(&self) -> impl Stream<Item = Arc<Snapshot>> {
        BroadcastStream::new(self.store.subscribe()).filter_map(|event| match event {
            Ok(event) => Some(event.snapshot),
            Err(e) => {
                warn!(error = %e, "state stream lagged");
                None
            }
        })
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.sync.next_deadline()
    }

    /// Apply a control intent; an edit intent opens the editor panel
    pub fn apply_intent(&mut self, intent: &Intent, confirm: &mut dyn FnMut(&str) -> bool) -> IntentOutcome {
        let outcome = apply_intent(&mut self.store, intent, confirm);
        if let IntentOutcome::OpenEditor(id) = &outcome {
            self.open_editor(id, Instant::now());
        }
        outcome
    }

    /// Show the editor panel for a component and register it for sync
    pub fn open_editor(&mut self, component_id: &str, now: Instant) -> bool {
        let Some(component) = self.store.component(component_id).cloned() else {
            return false;
        };
        let properties = self.editor_properties(&component);
        if properties.is_empty() {
            debug!(%component_id, "nothing editable");
            return false;
        }

        open_editor_panel(self.sync.host_mut(), &component, &properties);
        self.editor_open = Some(component_id.to_string());
        let state = self.store.state();
        self.sync.notify_mounted(component_id, &state, now)
    }

    pub fn close_editor(&mut self) {
        if self.editor_open.take().is_some() {
            close_editor_panel(self.sync.host_mut());
            let state = self.store.state();
            self.sync.rebind_all(&state);
        }
    }

    /// Simulate user input on an element
    pub fn user_edit(&mut self, element: ElementHandle, value: &str) -> bool {
        self.sync.host_mut().user_edit(element, value)
    }

    /// Move pending state changes through renderer and sync, then fire due
    /// timers
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        report.rebuilds += self.refresh_preview(now);
        report.sync.absorb(self.sync.pump(now));
        report.sync.absorb(self.sync.poll(now, &mut self.store));

        // Propagated edits changed the store; show them in this tick
        report.rebuilds += self.refresh_preview(now);
        report.sync.absorb(self.sync.pump(now));

        if let Some(outcomes) = self.remote_outcomes.as_mut() {
            while let Ok(outcome) = outcomes.try_recv() {
                if let SaveOutcome::Failed(e) = outcome {
                    warn!(error = %e, "remote persistence failed");
                    report.remote_failures += 1;
                }
            }
        }
        report
    }

    /// Handle one UI event at `now`
    pub fn handle_event(&mut self, event: UiEvent, now: Instant) {
        match event {
            UiEvent::Edit { element, value } => {
                if !self.user_edit(element, &value) {
                    debug!(%element, "edit on unknown element");
                }
            }
            UiEvent::Intent { intent, confirmed } => {
                self.apply_intent(&intent, &mut |_| confirmed);
            }
            UiEvent::Mounted(component_id) => {
                let state = self.store.state();
                self.sync.notify_mounted(&component_id, &state, now);
            }
            UiEvent::Resync(component_id) => {
                let state = self.store.state();
                self.sync.resync(component_id.as_deref(), &state, now);
            }
            UiEvent::OpenEditor(component_id) => {
                self.open_editor(&component_id, now);
            }
            UiEvent::CloseEditor => self.close_editor(),
            UiEvent::AddComponent(component) => {
                self.store.add_component(component);
            }
            UiEvent::Undo => {
                self.store.undo();
            }
            UiEvent::Redo => {
                self.store.redo();
            }
            UiEvent::CacheChanged => match self.store.reload_from_cache() {
                Ok(true) => info!("reloaded document after external cache change"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "cache reload failed"),
            },
            UiEvent::Shutdown => {}
        }
    }

    /// Event loop: UI events from `events`, timers from the sync
    /// coordinator. Ends on `shutdown`, [`UiEvent::Shutdown`] or when every
    /// sender is gone.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<UiEvent>,
        shutdown: impl Future<Output = ()>,
    ) -> BuilderResult<Self> {
        tokio::pin!(shutdown);
        self.tick(Instant::now());

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                event = events.recv() => match event {
                    Some(UiEvent::Shutdown) | None => break,
                    Some(event) => self.handle_event(event, Instant::now()),
                },
                _ = sleep_until(deadline) => {}
            }
            self.tick(Instant::now());
        }

        Ok(self)
    }

    fn refresh_preview(&mut self, now: Instant) -> usize {
        if !self.renderer.pump() {
            return 0;
        }
        // Typed preview text still inside its debounce window outlives the
        // old elements
        let held = self.sync.hold_pending(Surface::Preview, now);
        let document = self.renderer.output();
        project_preview(document, self.sync.host_mut());
        self.sync.restore_pending(held);
        if let Some(hook) = self.on_render.as_mut() {
            hook(document);
        }

        let state = self.store.state();
        self.sync.rebind_all(&state);
        // Components that gained elements in this rebuild
        self.sync.discover(&state, now);

        if let Some(id) = self.editor_open.clone() {
            if state.component(&id).is_none() {
                debug!(component_id = %id, "edited component removed; closing panel");
                self.editor_open = None;
                close_editor_panel(self.sync.host_mut());
            }
        }
        1
    }

    fn editor_properties(&self, component: &Component) -> Vec<String> {
        if let Some(registration) = self.sync.registration(&component.id) {
            return registration.properties.clone();
        }
        match self.sync.table().get(&component.kind) {
            Some(spec) if spec.list_based => {
                let items = (1..)
                    .take_while(|n| {
                        spec.fields
                            .iter()
                            .any(|f| component.data.contains_key(&format!("{}_{}", f, n)))
                    })
                    .count();
                spec.expand(items.max(1))
            }
            Some(spec) => spec.expand(0),
            None => component.data.keys().cloned().collect(),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}
