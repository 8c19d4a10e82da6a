//! Which tracked property an element shows
//!
//! Resolution order:
//! 1. explicit property identifier
//! 2. explicit 1-based index marker
//! 3. position among siblings of the same class

use crate::errors::InferenceError;
use crate::surface::ElementInfo;

pub fn infer_property(element: &ElementInfo, tracked: &[String]) -> Result<String, InferenceError> {
    if let Some(property) = &element.property {
        return if tracked.iter().any(|p| p == property) {
            Ok(property.clone())
        } else {
            Err(InferenceError::Untracked {
                element: element.handle,
                property: property.clone(),
            })
        };
    }

    if let Some(index) = element.index {
        return index
            .checked_sub(1)
            .and_then(|i| tracked.get(i))
            .cloned()
            .ok_or(InferenceError::OutOfRange {
                element: element.handle,
                position: index,
                tracked: tracked.len(),
            });
    }

    if element.class.is_some() {
        return tracked
            .get(element.position)
            .cloned()
            .ok_or(InferenceError::OutOfRange {
                element: element.handle,
                position: element.position + 1,
                tracked: tracked.len(),
            });
    }

    Err(InferenceError::NoCandidate(element.handle))
}
