use crate::surface::{ElementHandle, Surface};
use thiserror::Error;

/// Why an edited element could not be tied to a property
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("Element {0} carries no property, index or class")]
    NoCandidate(ElementHandle),

    #[error("Property {property} on element {element} is not tracked")]
    Untracked {
        element: ElementHandle,
        property: String,
    },

    #[error("Position {position} of element {element} exceeds {tracked} tracked properties")]
    OutOfRange {
        element: ElementHandle,
        position: usize,
        tracked: usize,
    },
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Unknown element: {0}")]
    UnknownElement(ElementHandle),

    #[error("Component {0} has no elements on either surface")]
    NoElements(String),

    #[error("No tracked properties for component {0}")]
    NoProperties(String),

    #[error("Component not registered: {0}")]
    NotRegistered(String),

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Write to {surface} element {element} rejected: {message}")]
    WriteRejected {
        surface: Surface,
        element: ElementHandle,
        message: String,
    },

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),
}
