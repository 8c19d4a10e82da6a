//! # Media Kit Store
//!
//! The single source of truth for a media kit document.
//!
//! ## Architecture
//!
//! ```text
//! operation ──> Mutation ──> apply on copy ──> commit ──┬──> LocalCache (sync)
//!                                                       ├──> RemoteSink (async)
//!                                                       └──> StateChanged broadcast
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut store = Store::new(Box::new(FileCache::new(".mediakit/state.json")));
//! store.hydrate(Some(&remote)).await;
//!
//! let id = store.add_component(Component::new("hero"));
//! store.set_field(&id, "title", "Hello");
//! ```

pub mod errors;
pub mod history;
pub mod ids;
pub mod model;
pub mod mutations;
pub mod persistence;
pub mod store;

pub use errors::{CacheError, RemoteError, StoreError};
pub use history::{History, DEFAULT_HISTORY_LIMIT};
pub use ids::IdGenerator;
pub use model::{
    value_as_text, BackgroundType, ColumnAssignment, Component, ComponentData, DocumentMeta,
    IntegrityViolation, LayoutType, PartialSnapshot, Section, SectionOptions, Snapshot,
};
pub use mutations::{Direction, Mutation, MutationError};
pub use persistence::{
    spawn_remote_writer, FileCache, LocalCache, MemoryCache, MemoryRemote, RemoteSink,
    RemoteSnapshotService, RemoteWriter, SaveOutcome,
};
pub use store::{
    ChangeOrigin, HydrationSource, StateChanged, Store, DEFAULT_SIGNAL_CAPACITY,
};
