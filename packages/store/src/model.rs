//! # Document Model
//!
//! The persisted shape of a media kit: components keyed by id, the
//! document-level order, sections with column assignments, and free-form
//! global settings.
//!
//! ## Invariants
//!
//! - Every id in `layout_order` exists in `components`
//! - Every `component_id` in a section's `column_assignment` exists in
//!   `components`
//! - Column numbers are clamped into the range supported by the section's
//!   layout type, never rejected
//!
//! Persisted JSON uses camelCase keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Free-form component payload
pub type ComponentData = Map<String, Value>;

pub const SCHEMA_VERSION: u32 = 1;

/// A typed content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Empty until the store assigns one
    #[serde(default)]
    pub id: String,

    /// Selects the content template used to render this component
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub data: ComponentData,
}

impl Component {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            kind: kind.into(),
            data: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// String form of a data field, if present and scalar
    pub fn text(&self, key: &str) -> Option<String> {
        self.data.get(key).and_then(value_as_text)
    }
}

/// Render a scalar JSON value as plain text
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Section layout type
///
/// Unknown names found in persisted data are kept verbatim and behave like
/// `FullWidth` everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayoutType {
    #[default]
    FullWidth,
    TwoColumn,
    ThreeColumn,
    MainAside,
    Grid,
    Hero,
    Unknown(String),
}

impl LayoutType {
    /// Known layouts, in retype cycle order
    pub const KNOWN: [LayoutType; 6] = [
        LayoutType::FullWidth,
        LayoutType::TwoColumn,
        LayoutType::ThreeColumn,
        LayoutType::MainAside,
        LayoutType::Grid,
        LayoutType::Hero,
    ];

    /// Accepts both `two-column` and `two_column` spellings
    pub fn parse(name: &str) -> Self {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "full-width" => LayoutType::FullWidth,
            "two-column" => LayoutType::TwoColumn,
            "three-column" => LayoutType::ThreeColumn,
            "main-aside" => LayoutType::MainAside,
            "grid" => LayoutType::Grid,
            "hero" => LayoutType::Hero,
            _ => LayoutType::Unknown(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LayoutType::FullWidth => "full-width",
            LayoutType::TwoColumn => "two-column",
            LayoutType::ThreeColumn => "three-column",
            LayoutType::MainAside => "main-aside",
            LayoutType::Grid => "grid",
            LayoutType::Hero => "hero",
            LayoutType::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, LayoutType::Unknown(_))
    }

    /// Fixed column count, `None` for auto-flow layouts
    pub fn column_count(&self) -> Option<i32> {
        match self {
            LayoutType::FullWidth | LayoutType::Hero | LayoutType::Unknown(_) => Some(1),
            LayoutType::TwoColumn | LayoutType::MainAside => Some(2),
            LayoutType::ThreeColumn => Some(3),
            LayoutType::Grid => None,
        }
    }

    /// Clamp a 1-based column number into the valid range
    pub fn clamp_column(&self, column: i32) -> i32 {
        match self.column_count() {
            Some(count) => column.clamp(1, count),
            None => column.max(1),
        }
    }

    /// Next layout in the retype cycle; unknown layouts restart the cycle
    pub fn next(&self) -> LayoutType {
        let position = Self::KNOWN.iter().position(|known| known == self);
        match position {
            Some(index) => Self::KNOWN[(index + 1) % Self::KNOWN.len()].clone(),
            None => LayoutType::FullWidth,
        }
    }
}

impl From<String> for LayoutType {
    fn from(value: String) -> Self {
        LayoutType::parse(&value)
    }
}

impl From<&str> for LayoutType {
    fn from(value: &str) -> Self {
        LayoutType::parse(value)
    }
}

impl From<LayoutType> for String {
    fn from(value: LayoutType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placement of a component in a section column (1-based)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAssignment {
    pub component_id: String,
    pub column: i32,
}

impl ColumnAssignment {
    pub fn new(component_id: impl Into<String>, column: i32) -> Self {
        Self {
            component_id: component_id.into(),
            column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    None,
    Color,
    Gradient,
}

/// Per-section overrides merged over the layout's style defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_type: Option<BackgroundType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing_top: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing_bottom: Option<String>,
}

impl SectionOptions {
    pub fn is_empty(&self) -> bool {
        self == &SectionOptions::default()
    }

    /// Overlay the fields set in `other`
    pub fn merge(&mut self, other: &SectionOptions) {
        if other.background_type.is_some() {
            self.background_type = other.background_type;
        }
        if other.background_color.is_some() {
            self.background_color = other.background_color.clone();
        }
        if other.spacing_top.is_some() {
            self.spacing_top = other.spacing_top.clone();
        }
        if other.spacing_bottom.is_some() {
            self.spacing_bottom = other.spacing_bottom.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,

    #[serde(default, alias = "layout_type", alias = "layout")]
    pub layout_type: LayoutType,

    #[serde(default, alias = "column_assignment")]
    pub column_assignment: Vec<ColumnAssignment>,

    #[serde(default, skip_serializing_if = "SectionOptions::is_empty")]
    pub options: SectionOptions,
}

impl Section {
    pub fn new(id: impl Into<String>, layout_type: LayoutType) -> Self {
        Self {
            id: id.into(),
            layout_type,
            column_assignment: Vec::new(),
            options: SectionOptions::default(),
        }
    }

    pub fn with_assignment(mut self, component_id: impl Into<String>, column: i32) -> Self {
        self.column_assignment
            .push(ColumnAssignment::new(component_id, column));
        self
    }

    pub fn contains(&self, component_id: &str) -> bool {
        self.column_assignment
            .iter()
            .any(|a| a.component_id == component_id)
    }

    pub fn is_empty(&self) -> bool {
        self.column_assignment.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            last_modified: None,
        }
    }
}

impl DocumentMeta {
    pub fn touch(&mut self) {
        self.last_modified = Some(chrono::Utc::now().timestamp_millis());
    }
}

/// A reference that breaks a document invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    #[error("layout order references missing component {0}")]
    DanglingOrder(String),

    #[error("section {section_id} assigns missing component {component_id}")]
    DanglingAssignment {
        section_id: String,
        component_id: String,
    },

    #[error("section {section_id} column {column} is out of range for its layout")]
    ColumnOutOfRange { section_id: String, column: i32 },
}

/// The complete document state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub components: BTreeMap<String, Component>,

    #[serde(default)]
    pub layout_order: Vec<String>,

    #[serde(default)]
    pub sections: Vec<Section>,

    #[serde(default)]
    pub global_settings: Map<String, Value>,

    #[serde(default)]
    pub meta: DocumentMeta,
}

impl Snapshot {
    /// True when there is nothing to render
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.sections.is_empty()
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_index(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    /// Section holding a component, with the assignment's index
    pub fn placement_of(&self, component_id: &str) -> Option<(usize, usize)> {
        self.sections.iter().enumerate().find_map(|(s, section)| {
            section
                .column_assignment
                .iter()
                .position(|a| a.component_id == component_id)
                .map(|a| (s, a))
        })
    }

    /// Components in document order
    pub fn ordered_components(&self) -> impl Iterator<Item = &Component> {
        self.layout_order
            .iter()
            .filter_map(|id| self.components.get(id))
    }

    /// Active theme from global settings
    pub fn theme(&self) -> &str {
        self.global_settings
            .get("theme")
            .and_then(Value::as_str)
            .filter(|theme| !theme.is_empty())
            .unwrap_or("default")
    }

    /// Every broken reference, in document order
    pub fn integrity_violations(&self) -> Vec<IntegrityViolation> {
        let mut violations: Vec<IntegrityViolation> = self
            .layout_order
            .iter()
            .filter(|id| !self.components.contains_key(*id))
            .map(|id| IntegrityViolation::DanglingOrder(id.clone()))
            .collect();

        for section in &self.sections {
            for assignment in &section.column_assignment {
                if !self.components.contains_key(&assignment.component_id) {
                    violations.push(IntegrityViolation::DanglingAssignment {
                        section_id: section.id.clone(),
                        component_id: assignment.component_id.clone(),
                    });
                } else if section.layout_type.clamp_column(assignment.column) != assignment.column {
                    violations.push(IntegrityViolation::ColumnOutOfRange {
                        section_id: section.id.clone(),
                        column: assignment.column,
                    });
                }
            }
        }

        violations
    }

    /// Repair the snapshot in place, returning what was fixed.
    ///
    /// Dangling references are removed, out-of-range columns are clamped,
    /// component ids are aligned with their map keys and duplicate order
    /// entries are dropped.
    pub fn sanitize(&mut self) -> Vec<IntegrityViolation> {
        let violations = self.integrity_violations();

        for (key, component) in self.components.iter_mut() {
            if &component.id != key {
                component.id = key.clone();
            }
        }

        let components = &self.components;
        let mut seen = std::collections::HashSet::new();
        self.layout_order
            .retain(|id| components.contains_key(id) && seen.insert(id.clone()));

        for section in &mut self.sections {
            let layout = section.layout_type.clone();
            section
                .column_assignment
                .retain(|a| components.contains_key(&a.component_id));
            for assignment in &mut section.column_assignment {
                assignment.column = layout.clamp_column(assignment.column);
            }
        }

        violations
    }
}

/// Top-level keys for a shallow `set_state` merge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<BTreeMap<String, Component>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_order: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_settings: Option<Map<String, Value>>,
}

impl From<Snapshot> for PartialSnapshot {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            components: Some(snapshot.components),
            layout_order: Some(snapshot.layout_order),
            sections: Some(snapshot.sections),
            global_settings: Some(snapshot.global_settings),
        }
    }
}

/// Merge `patch` into `target` key by key; a patched key replaces the old
/// value whole, nested objects included.
pub fn merge_data(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
}
