//! # Media Kit Renderer
//!
//! Projects store snapshots into a virtual document.
//!
//! ## Architecture
//!
//! ```text
//! StateChanged ──> Renderer::pump ──> full rebuild ──┬──> sections ──> layout composer
//!                                                    └──> components in layout order
//! ```
//!
//! Content templates are registered per component type and return a
//! [`VNode`] subtree. The renderer wraps each one with its control surface;
//! [`html::to_html`] serializes the result.

pub mod controls;
pub mod html;
pub mod layout;
pub mod renderer;
pub mod templates;
pub mod vdom;

pub use controls::{
    collect_intents, component_controls, section_controls, ComponentAction, Intent, SectionAction,
};
pub use html::{node_to_html, to_css, to_html, HtmlOptions};
pub use layout::{compose_section, EffectiveLayout, Partition, SectionBlock};
pub use renderer::{RenderStats, Renderer, ROOT_ID};
pub use templates::{
    FieldSchema, MountedView, RenderFn, Rendered, TemplateError, TemplateRegistry, TemplateSchema,
};
pub use vdom::{CssRule, VNode, VirtualDomDocument};
