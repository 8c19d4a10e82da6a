//! In-memory surface host used headless and in tests

use crate::errors::SyncError;
use crate::surface::{EditEvent, ElementHandle, ElementInfo, Surface, SurfaceHost};
use std::collections::{BTreeMap, VecDeque};

/// How an element identifies the property it shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSpec {
    pub property: Option<String>,
    pub index: Option<usize>,
    pub class: Option<String>,
    pub value: String,
}

impl ElementSpec {
    pub fn property(name: impl Into<String>) -> Self {
        Self {
            property: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn index(index: usize) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }

    pub fn class(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            ..Self::default()
        }
    }

    /// No identifying markers at all
    pub fn bare() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

/// A recorded programmatic write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub surface: Surface,
    pub element: ElementHandle,
    pub value: String,
}

#[derive(Debug, Clone)]
struct Element {
    info: ElementInfo,
    value: String,
    listening: bool,
}

#[derive(Debug, Default)]
pub struct MemorySurface {
    next_handle: u64,
    elements: BTreeMap<ElementHandle, Element>,
    events: VecDeque<EditEvent>,
    writes: Vec<WriteRecord>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element to a component on `surface`
    pub fn insert(&mut self, surface: Surface, component_id: &str, spec: ElementSpec) -> ElementHandle {
        self.next_handle += 1;
        let handle = ElementHandle(self.next_handle);

        let position = match &spec.class {
            Some(class) => self
                .elements
                .values()
                .filter(|e| {
                    e.info.surface == surface
                        && e.info.component_id == component_id
                        && e.info.class.as_deref() == Some(class.as_str())
                })
                .count(),
            None => 0,
        };

        self.elements.insert(
            handle,
            Element {
                info: ElementInfo {
                    handle,
                    surface,
                    component_id: component_id.to_string(),
                    property: spec.property,
                    index: spec.index,
                    class: spec.class,
                    position,
                },
                value: spec.value,
                listening: false,
            },
        );
        handle
    }

    /// Simulate typing into an element
    pub fn user_edit(&mut self, handle: ElementHandle, value: &str) -> bool {
        match self.elements.get_mut(&handle) {
            Some(element) => {
                element.value = value.to_string();
                if element.listening {
                    self.events.push_back(EditEvent {
                        element: handle,
                        surface: element.info.surface,
                        component_id: element.info.component_id.clone(),
                    });
                }
                true
            }
            None => false,
        }
    }

    pub fn value(&self, handle: ElementHandle) -> Option<&str> {
        self.elements.get(&handle).map(|e| e.value.as_str())
    }

    /// First element of a component carrying `property` on `surface`
    pub fn find(&self, surface: Surface, component_id: &str, property: &str) -> Option<ElementHandle> {
        self.elements
            .values()
            .find(|e| {
                e.info.surface == surface
                    && e.info.component_id == component_id
                    && e.info.property.as_deref() == Some(property)
            })
            .map(|e| e.info.handle)
    }

    pub fn remove(&mut self, handle: ElementHandle) -> bool {
        self.elements.remove(&handle).is_some()
    }

    /// Drop every element of `surface`, optionally limited to one component
    pub fn clear(&mut self, surface: Surface, component_id: Option<&str>) -> usize {
        let before = self.elements.len();
        self.elements.retain(|_, e| {
            e.info.surface != surface
                || component_id.is_some_and(|id| e.info.component_id != id)
        });
        self.events
            .retain(|event| event.surface != surface || component_id.is_some_and(|id| event.component_id != id));
        before - self.elements.len()
    }

    pub fn writes(&self) -> &[WriteRecord] {
        &self.writes
    }

    pub fn writes_to(&self, surface: Surface) -> usize {
        self.writes.iter().filter(|w| w.surface == surface).count()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

impl SurfaceHost for MemorySurface {
    fn elements(&self, surface: Surface, component_id: &str) -> Vec<ElementInfo> {
        self.elements
            .values()
            .filter(|e| e.info.surface == surface && e.info.component_id == component_id)
            .map(|e| e.info.clone())
            .collect()
    }

    fn element(&self, handle: ElementHandle) -> Option<ElementInfo> {
        self.elements.get(&handle).map(|e| e.info.clone())
    }

    fn read(&self, handle: ElementHandle) -> Option<String> {
        self.elements.get(&handle).map(|e| e.value.clone())
    }

    fn write(&mut self, handle: ElementHandle, value: &str) -> Result<(), SyncError> {
        let element = self
            .elements
            .get_mut(&handle)
            .ok_or(SyncError::UnknownElement(handle))?;
        element.value = value.to_string();
        self.writes.push(WriteRecord {
            surface: element.info.surface,
            element: handle,
            value: value.to_string(),
        });
        // A listening element hears programmatic writes too
        if element.listening {
            self.events.push_back(EditEvent {
                element: handle,
                surface: element.info.surface,
                component_id: element.info.component_id.clone(),
            });
        }
        Ok(())
    }

    fn attach(&mut self, handle: ElementHandle) -> bool {
        match self.elements.get_mut(&handle) {
            Some(element) => {
                element.listening = true;
                true
            }
            None => false,
        }
    }

    fn detach(&mut self, handle: ElementHandle) -> bool {
        match self.elements.get_mut(&handle) {
            Some(element) => {
                element.listening = false;
                true
            }
            None => false,
        }
    }

    fn is_attached(&self, handle: ElementHandle) -> bool {
        self.elements.get(&handle).is_some_and(|e| e.listening)
    }

    fn drain_events(&mut self) -> Vec<EditEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listening_write_echoes() {
        let mut surface = MemorySurface::new();
        let handle = surface.insert(Surface::Preview, "c1", ElementSpec::property("title"));

        surface.write(handle, "quiet").unwrap();
        assert!(surface.drain_events().is_empty());

        surface.attach(handle);
        surface.write(handle, "loud").unwrap();
        let events = surface.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].element, handle);
        assert_eq!(surface.writes_to(Surface::Preview), 2);
    }

    #[test]
    fn test_sibling_positions_per_class() {
        let mut surface = MemorySurface::new();
        let a = surface.insert(Surface::Editor, "c1", ElementSpec::class("topic"));
        let other = surface.insert(Surface::Editor, "c1", ElementSpec::class("note"));
        let b = surface.insert(Surface::Editor, "c1", ElementSpec::class("topic"));
        let foreign = surface.insert(Surface::Editor, "c2", ElementSpec::class("topic"));

        assert_eq!(surface.element(a).unwrap().position, 0);
        assert_eq!(surface.element(other).unwrap().position, 0);
        assert_eq!(surface.element(b).unwrap().position, 1);
        assert_eq!(surface.element(foreign).unwrap().position, 0);
    }

    #[test]
    fn test_clear_one_component() {
        let mut surface = MemorySurface::new();
        surface.insert(Surface::Preview, "c1", ElementSpec::property("title"));
        let kept = surface.insert(Surface::Preview, "c2", ElementSpec::property("title"));
        let editor = surface.insert(Surface::Editor, "c1", ElementSpec::property("title"));

        assert_eq!(surface.clear(Surface::Preview, Some("c1")), 1);
        assert!(surface.element(kept).is_some());
        assert!(surface.element(editor).is_some());

        assert_eq!(surface.clear(Surface::Preview, None), 1);
        assert!(surface.element(editor).is_some());
    }
}
