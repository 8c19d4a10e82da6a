//! Toolkit-independent view of an editable surface

use crate::errors::SyncError;
use std::fmt;

/// The two representations kept in sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Surface {
    /// Form controls of the editor panel
    Editor,
    /// Content-editable elements of the rendered preview
    Preview,
}

impl Surface {
    pub fn other(self) -> Surface {
        match self {
            Surface::Editor => Surface::Preview,
            Surface::Preview => Surface::Editor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Surface::Editor => "editor",
            Surface::Preview => "preview",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque, host-assigned element identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(pub u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the host knows about an element belonging to a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub handle: ElementHandle,
    pub surface: Surface,
    pub component_id: String,
    /// Explicit property identifier (`data-property`)
    pub property: Option<String>,
    /// Explicit 1-based index marker (`data-index`)
    pub index: Option<usize>,
    pub class: Option<String>,
    /// 0-based position among siblings sharing `class`
    pub position: usize,
}

/// A user edit observed by a listener. The value is read when the edit
/// propagates, so the latest content always wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEvent {
    pub element: ElementHandle,
    pub surface: Surface,
    pub component_id: String,
}

/// Host of the editor and preview surfaces.
///
/// A write to an element whose listener is attached must be reported back as
/// an [`EditEvent`], the same way a dispatched input event would be.
pub trait SurfaceHost {
    /// Elements of a component on one surface, in document order
    fn elements(&self, surface: Surface, component_id: &str) -> Vec<ElementInfo>;

    fn element(&self, handle: ElementHandle) -> Option<ElementInfo>;

    fn read(&self, handle: ElementHandle) -> Option<String>;

    fn write(&mut self, handle: ElementHandle, value: &str) -> Result<(), SyncError>;

    /// Start listening for edits; false when the element does not exist
    fn attach(&mut self, handle: ElementHandle) -> bool;

    fn detach(&mut self, handle: ElementHandle) -> bool;

    fn is_attached(&self, handle: ElementHandle) -> bool;

    /// Edit events observed since the last call, oldest first
    fn drain_events(&mut self) -> Vec<EditEvent>;
}
