/*
 * attr.rs
 * Copyright (c) 2025 Posit, PBC
 */

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Identifier, classes and key/value attributes of a node.
///
/// `attributes` keeps source order and duplicates; [`Attr::keyval_map`] is the
/// lookup view the writer uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub id: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
}

pub fn empty_attr() -> Attr {
    Attr::default()
}

impl Attr {
    pub fn new(
        id: impl Into<String>,
        classes: Vec<String>,
        attributes: Vec<(String, String)>,
    ) -> Self {
        Attr {
            id: id.into(),
            classes,
            attributes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.classes.is_empty() && self.attributes.is_empty()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Key/value attributes as a map. Order is lost and the last value wins
    /// for a repeated key.
    pub fn keyval_map(&self) -> FxHashMap<&str, &str> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Value of the last attribute named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
