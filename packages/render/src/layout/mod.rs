//! # Section Layout Composer
//!
//! Turns a section and its resolved components into a column layout.
//!
//! - `partition`: column count and emphasis per layout type, assignment
//!   grouping with clamping
//! - `style`: per-layout style defaults, responsive overrides, section CSS
//! - `composer`: the output block with drop placeholders and controls

pub mod composer;
pub mod partition;
pub mod style;

pub use composer::{compose_section, SectionBlock};
pub use partition::{ColumnCount, ColumnGroup, EffectiveLayout, Emphasis, Partition};
pub use style::{defaults_for, lighten_color, section_rules, LayoutDefaults, LayoutStyle};
