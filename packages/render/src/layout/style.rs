//! Per-layout style defaults and the CSS rules generated for a section.
//!
//! Each layout carries desktop defaults plus tablet and mobile overrides.
//! Section options (background, spacing) are layered over the layout's
//! default options. Breakpoint rules only contain what differs from the
//! desktop rule.

use super::partition::EffectiveLayout;
use crate::vdom::CssRule;
use mediakit_store::{BackgroundType, SectionOptions};
use std::collections::BTreeMap;

pub const TABLET_MEDIA: &str = "(max-width: 1024px)";
pub const MOBILE_MEDIA: &str = "(max-width: 768px)";
pub const DEFAULT_GRADIENT_BASE: &str = "#295cff";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutStyle {
    pub max_width: Option<&'static str>,
    pub padding: Option<&'static str>,
    pub min_height: Option<&'static str>,
    pub columns: Option<u32>,
    pub column_gap: Option<&'static str>,
    pub row_gap: Option<&'static str>,
    pub grid_template_columns: Option<&'static str>,
    pub flex_center: bool,
}

impl LayoutStyle {
    /// `self` with every field set in `over` replaced
    pub fn merged(&self, over: &LayoutStyle) -> LayoutStyle {
        LayoutStyle {
            max_width: over.max_width.or(self.max_width),
            padding: over.padding.or(self.padding),
            min_height: over.min_height.or(self.min_height),
            columns: over.columns.or(self.columns),
            column_gap: over.column_gap.or(self.column_gap),
            row_gap: over.row_gap.or(self.row_gap),
            grid_template_columns: over.grid_template_columns.or(self.grid_template_columns),
            flex_center: over.flex_center || self.flex_center,
        }
    }

    pub fn properties(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();
        let mut set = |key: &str, value: String| {
            props.insert(key.to_string(), value);
        };

        if let Some(max_width) = self.max_width {
            set("max-width", max_width.to_string());
        }
        if let Some(padding) = self.padding {
            set("padding", padding.to_string());
        }
        if let Some(min_height) = self.min_height {
            set("min-height", min_height.to_string());
        }

        if self.flex_center {
            set("display", "flex".to_string());
            set("align-items", "center".to_string());
            set("justify-content", "center".to_string());
        }

        let template = match (self.grid_template_columns, self.columns) {
            (Some(template), _) => Some(template.to_string()),
            (None, Some(columns)) if columns > 1 => Some(format!("repeat({}, 1fr)", columns)),
            _ => None,
        };
        if let Some(template) = template {
            set("display", "grid".to_string());
            set("grid-template-columns", template);
            if let Some(gap) = self.column_gap {
                set("column-gap", gap.to_string());
            }
            if let Some(gap) = self.row_gap {
                set("row-gap", gap.to_string());
            }
        }

        props
    }
}

/// Everything a layout starts with before section options apply
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDefaults {
    pub desktop: LayoutStyle,
    pub tablet: LayoutStyle,
    pub mobile: LayoutStyle,
    pub options: SectionOptions,
}

fn options(background: BackgroundType, color: Option<&str>, top: &str, bottom: &str) -> SectionOptions {
    SectionOptions {
        background_type: Some(background),
        background_color: color.map(str::to_string),
        spacing_top: Some(top.to_string()),
        spacing_bottom: Some(bottom.to_string()),
    }
}

pub fn defaults_for(layout: EffectiveLayout) -> LayoutDefaults {
    let constrained = LayoutStyle {
        max_width: Some("1200px"),
        padding: Some("60px 20px"),
        ..LayoutStyle::default()
    };

    match layout {
        EffectiveLayout::FullWidth => LayoutDefaults {
            desktop: LayoutStyle {
                max_width: Some("100%"),
                padding: Some("40px 20px"),
                columns: Some(1),
                ..LayoutStyle::default()
            },
            tablet: LayoutStyle {
                padding: Some("30px 20px"),
                ..LayoutStyle::default()
            },
            mobile: LayoutStyle {
                padding: Some("20px 15px"),
                ..LayoutStyle::default()
            },
            options: options(BackgroundType::None, None, "medium", "medium"),
        },
        EffectiveLayout::TwoColumn => LayoutDefaults {
            desktop: LayoutStyle {
                columns: Some(2),
                column_gap: Some("40px"),
                ..constrained.clone()
            },
            tablet: LayoutStyle {
                column_gap: Some("30px"),
                ..LayoutStyle::default()
            },
            mobile: LayoutStyle {
                grid_template_columns: Some("1fr"),
                column_gap: Some("0px"),
                ..LayoutStyle::default()
            },
            options: options(BackgroundType::None, None, "large", "large"),
        },
        EffectiveLayout::ThreeColumn => LayoutDefaults {
            desktop: LayoutStyle {
                columns: Some(3),
                column_gap: Some("30px"),
                ..constrained.clone()
            },
            tablet: LayoutStyle {
                grid_template_columns: Some("repeat(2, 1fr)"),
                column_gap: Some("20px"),
                ..LayoutStyle::default()
            },
            mobile: LayoutStyle {
                grid_template_columns: Some("1fr"),
                column_gap: Some("0px"),
                ..LayoutStyle::default()
            },
            options: options(BackgroundType::None, None, "large", "large"),
        },
        EffectiveLayout::MainAside => LayoutDefaults {
            desktop: LayoutStyle {
                grid_template_columns: Some("2fr 1fr"),
                column_gap: Some("40px"),
                ..constrained.clone()
            },
            tablet: LayoutStyle {
                column_gap: Some("30px"),
                ..LayoutStyle::default()
            },
            mobile: LayoutStyle {
                grid_template_columns: Some("1fr"),
                column_gap: Some("0px"),
                ..LayoutStyle::default()
            },
            options: options(BackgroundType::None, None, "large", "large"),
        },
        EffectiveLayout::Grid => LayoutDefaults {
            desktop: LayoutStyle {
                grid_template_columns: Some("repeat(auto-fit, minmax(300px, 1fr))"),
                column_gap: Some("30px"),
                row_gap: Some("30px"),
                ..constrained
            },
            tablet: LayoutStyle {
                grid_template_columns: Some("repeat(2, 1fr)"),
                ..LayoutStyle::default()
            },
            mobile: LayoutStyle {
                grid_template_columns: Some("1fr"),
                column_gap: Some("0px"),
                ..LayoutStyle::default()
            },
            options: options(BackgroundType::None, None, "large", "large"),
        },
        EffectiveLayout::Hero => LayoutDefaults {
            desktop: LayoutStyle {
                max_width: Some("100%"),
                padding: Some("80px 20px"),
                min_height: Some("70vh"),
                columns: Some(1),
                flex_center: true,
                ..LayoutStyle::default()
            },
            tablet: LayoutStyle {
                min_height: Some("60vh"),
                padding: Some("70px 20px"),
                ..LayoutStyle::default()
            },
            mobile: LayoutStyle {
                min_height: Some("50vh"),
                padding: Some("60px 15px"),
                ..LayoutStyle::default()
            },
            options: options(
                BackgroundType::Gradient,
                Some(DEFAULT_GRADIENT_BASE),
                "none",
                "large",
            ),
        },
    }
}

/// Named spacing steps; anything else is passed through as a length
fn spacing_length(value: &str) -> String {
    match value {
        "none" => "0px".to_string(),
        "small" => "20px".to_string(),
        "medium" => "40px".to_string(),
        "large" => "60px".to_string(),
        other => other.to_string(),
    }
}

fn option_properties(options: &SectionOptions) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();

    match options.background_type {
        Some(BackgroundType::Color) => {
            if let Some(color) = &options.background_color {
                props.insert("background-color".to_string(), color.clone());
            }
        }
        Some(BackgroundType::Gradient) => {
            let base = options
                .background_color
                .as_deref()
                .unwrap_or(DEFAULT_GRADIENT_BASE);
            props.insert(
                "background".to_string(),
                format!("linear-gradient(135deg, {}, {})", base, lighten_color(base, 0.2)),
            );
        }
        Some(BackgroundType::None) | None => {}
    }

    if let Some(top) = &options.spacing_top {
        props.insert("margin-top".to_string(), spacing_length(top));
    }
    if let Some(bottom) = &options.spacing_bottom {
        props.insert("margin-bottom".to_string(), spacing_length(bottom));
    }

    props
}

pub fn section_selector(section_id: &str) -> String {
    format!("[data-section-id=\"{}\"].mk-section", section_id)
}

/// Desktop rule followed by tablet and mobile rules (when they differ)
pub fn section_rules(section_id: &str, layout: EffectiveLayout, overrides: &SectionOptions) -> Vec<CssRule> {
    let defaults = defaults_for(layout);
    let mut options = defaults.options.clone();
    options.merge(overrides);

    let mut desktop = defaults.desktop.properties();
    desktop.extend(option_properties(&options));

    let selector = section_selector(section_id);
    let mut rules = vec![CssRule::new(selector.clone(), desktop.clone())];

    for (style, media) in [(&defaults.tablet, TABLET_MEDIA), (&defaults.mobile, MOBILE_MEDIA)] {
        let changed: BTreeMap<String, String> = defaults
            .desktop
            .merged(style)
            .properties()
            .into_iter()
            .filter(|(key, value)| desktop.get(key) != Some(value))
            .collect();
        if !changed.is_empty() {
            rules.push(CssRule::new(selector.clone(), changed).with_media(media));
        }
    }

    rules
}

/// Brighten a `#rrggbb` (or `#rgb`) color by `amount` of full scale on each
/// channel. Unparseable input is returned unchanged.
pub fn lighten_color(color: &str, amount: f32) -> String {
    let hex = color.trim().trim_start_matches('#');
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return color.to_string(),
    };
    let Ok(value) = u32::from_str_radix(&expanded, 16) else {
        return color.to_string();
    };

    let step = (amount * 255.0).round() as i32;
    let channel = |shift: u32| -> u32 {
        let c = ((value >> shift) & 0xff) as i32;
        (c + step).clamp(0, 255) as u32
    };

    format!(
        "#{:06x}",
        (channel(16) << 16) | (channel(8) << 8) | channel(0)
    )
}
