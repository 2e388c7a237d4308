/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

use crate::block::Blocks;
use crate::meta::Meta;
use hashlink::LinkedHashMap;

/*
 * A data structure that mimics Pandoc's `data Pandoc` type: metadata plus
 * the top-level block list. Produced by the JSON reader, read-only after.
 */

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// `pandoc-api-version`, empty when the input had none
    pub api_version: Vec<u64>,
    pub meta: Meta,
    pub blocks: Blocks,
}

impl Document {
    /// Metadata entries usable as template variables.
    ///
    /// Only `MetaInlines` entries are included, flattened to plain text;
    /// every other kind of value is skipped. Entries keep document order.
    pub fn variables(&self) -> LinkedHashMap<String, String> {
        self.meta
            .iter()
            .filter_map(|(key, value)| value.inline_text().map(|text| (key.clone(), text)))
            .collect()
    }
}
