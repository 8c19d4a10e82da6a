//! # Media Kit Sync
//!
//! Bi-directional property sync between the editor panel and the preview.
//!
//! ## Modules
//!
//! - `surface`: the [`SurfaceHost`] seam and element identities
//! - `memory_surface`: headless host
//! - `mapping`: tracked properties per component type
//! - `inference`: element to property resolution
//! - `debounce` / `guard`: timing and loop prevention
//! - `coordinator`: registrations, propagation, resync

pub mod coordinator;
pub mod debounce;
pub mod errors;
pub mod guard;
pub mod inference;
pub mod mapping;
pub mod memory_surface;
pub mod surface;

pub use coordinator::{
    HeldEdit, Registration, SyncConfig, SyncCoordinator, SyncReport, SyncStats, DEFAULT_DEBOUNCE,
    DEFAULT_REATTACH_DELAY,
};
pub use debounce::Debouncer;
pub use errors::{InferenceError, SyncError};
pub use guard::EchoGuard;
pub use inference::infer_property;
pub use mapping::{PropertySpec, PropertyTable};
pub use memory_surface::{ElementSpec, MemorySurface, WriteRecord};
pub use surface::{EditEvent, ElementHandle, ElementInfo, Surface, SurfaceHost};
