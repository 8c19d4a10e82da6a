//! Tracked properties per component type

use std::collections::BTreeMap;

/// Editable fields of one component type.
///
/// List-based types repeat their fields per item; item `n` (1-based) of field
/// `f` is tracked as `f_n`, fields interleaved item by item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub fields: Vec<String>,
    pub list_based: bool,
}

impl PropertySpec {
    pub fn new(fields: &[&str], list_based: bool) -> Self {
        Self {
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
            list_based,
        }
    }

    /// Ordered property names for an instance with `items` list entries
    pub fn expand(&self, items: usize) -> Vec<String> {
        if !self.list_based {
            return self.fields.clone();
        }
        (1..=items)
            .flat_map(|n| self.fields.iter().map(move |f| format!("{}_{}", f, n)))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PropertyTable {
    specs: BTreeMap<String, PropertySpec>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field mappings for the stock component types
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (kind, fields, list_based) in [
            ("topics", &["title", "description"][..], true),
            ("hero", &["title", "subtitle", "description"][..], false),
            ("biography", &["title", "content"][..], false),
            ("contact", &["email", "phone", "website", "address"][..], false),
            ("questions", &["question"][..], true),
            ("social", &["platform", "url"][..], true),
            ("guest-intro", &["name", "title", "introduction"][..], false),
            ("authority-hook", &["headline", "subheadline"][..], false),
            ("testimonials", &["quote", "author"][..], true),
            ("stats", &["value", "label"][..], true),
            ("portfolio", &["title", "description"][..], true),
            ("call-to-action", &["title", "buttonText"][..], false),
        ] {
            table.insert(kind, PropertySpec::new(fields, list_based));
        }
        table
    }

    /// Register or replace the property spec for a type
    pub fn insert(&mut self, kind: impl Into<String>, spec: PropertySpec) {
        self.specs.insert(kind.into(), spec);
    }

    /// Seed a type from a template schema's field list
    pub fn insert_fields(&mut self, kind: impl Into<String>, fields: Vec<String>, list_based: bool) {
        self.insert(kind, PropertySpec { fields, list_based });
    }

    pub fn get(&self, kind: &str) -> Option<&PropertySpec> {
        self.specs.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
