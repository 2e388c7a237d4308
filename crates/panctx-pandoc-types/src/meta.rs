/*
 * meta.rs
 * Copyright (c) 2025 Posit, PBC
 */

use crate::block::Blocks;
use crate::inline::{Inline, Inlines};
use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};

// Pandoc's MetaValue notably does not support numbers or nulls, so we don't either
// https://pandoc.org/lua-filters.html#type-metavalue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaValue {
    MetaString(String),
    MetaBool(bool),
    MetaInlines(Inlines),
    MetaBlocks(Blocks),
    MetaList(Vec<MetaValue>),
    MetaMap(LinkedHashMap<String, MetaValue>),
}

impl Default for MetaValue {
    fn default() -> Self {
        MetaValue::MetaMap(LinkedHashMap::new())
    }
}

pub type Meta = LinkedHashMap<String, MetaValue>;

impl MetaValue {
    /// Plain text of a `MetaInlines` value, `None` for every other kind.
    ///
    /// Str and RawInline contribute their text, Space a blank, SoftBreak and
    /// LineBreak a newline. Other inlines contribute nothing.
    pub fn inline_text(&self) -> Option<String> {
        match self {
            MetaValue::MetaInlines(inlines) => Some(flatten_plain(inlines)),
            _ => None,
        }
    }
}

fn flatten_plain(inlines: &Inlines) -> String {
    let mut text = String::new();
    for inline in inlines {
        match inline {
            Inline::Str(s) => text.push_str(&s.text),
            Inline::RawInline(raw) => text.push_str(&raw.text),
            Inline::Space => text.push(' '),
            Inline::SoftBreak | Inline::LineBreak => text.push('\n'),
            _ => {}
        }
    }
    text
}
