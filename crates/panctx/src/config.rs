/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! ConTeXt writer configuration.

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Maps an image URL from the document to the path written into
/// `\externalfigure`. Called once per image.
pub type ImagePathResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Which ConTeXt division a level-1 heading becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopLevelDivision {
    Part,
    #[default]
    Chapter,
    Section,
}

impl TopLevelDivision {
    /// Parse a division name. Anything other than `part` or `chapter`
    /// selects `section`.
    pub fn parse_lenient(name: &str) -> Self {
        match name {
            "part" => TopLevelDivision::Part,
            "chapter" => TopLevelDivision::Chapter,
            _ => TopLevelDivision::Section,
        }
    }

    /// Amount added to a heading level before choosing its command.
    pub fn offset(self) -> usize {
        match self {
            TopLevelDivision::Part => 0,
            TopLevelDivision::Chapter => 1,
            TopLevelDivision::Section => 2,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ContextConfig {
    #[serde(rename = "top-heading")]
    pub top_level_division: TopLevelDivision,

    /// Size options appended verbatim to `\externalfigure` when an image
    /// has neither width nor height and is not an SVG
    #[serde(rename = "default-externalfigure-size")]
    pub default_figure_size: Option<String>,

    /// Report dropped nodes at warn level instead of debug
    pub strict: bool,

    #[serde(skip, default = "identity_resolver")]
    pub image_path_resolver: ImagePathResolver,
}

fn identity_resolver() -> ImagePathResolver {
    Arc::new(|url: &str| url.to_string())
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            top_level_division: TopLevelDivision::default(),
            default_figure_size: None,
            strict: false,
            image_path_resolver: identity_resolver(),
        }
    }
}

impl fmt::Debug for ContextConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextConfig")
            .field("top_level_division", &self.top_level_division)
            .field("default_figure_size", &self.default_figure_size)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

impl ContextConfig {
    /// Build a configuration from flat string definitions, as found in
    /// document variables or project definitions.
    ///
    /// Recognized keys are `top-heading` and `default-externalfigure-size`.
    /// A missing `top-heading` keeps the default; an unrecognized value
    /// selects `section`. An empty figure size counts as unset.
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use panctx::config::{ContextConfig, TopLevelDivision};
    ///
    /// let defs = HashMap::from([
    ///     ("top-heading".to_string(), "part".to_string()),
    ///     ("default-externalfigure-size".to_string(), "maxwidth=\\textwidth".to_string()),
    /// ]);
    /// let config = ContextConfig::from_definitions(&defs);
    /// assert_eq!(config.top_level_division, TopLevelDivision::Part);
    /// assert_eq!(config.top_level_offset(), 0);
    /// ```
    pub fn from_definitions<'a, I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut config = ContextConfig::default();
        for (key, value) in definitions {
            match key.as_str() {
                "top-heading" => {
                    config.top_level_division = TopLevelDivision::parse_lenient(value);
                }
                "default-externalfigure-size" if !value.is_empty() => {
                    config.default_figure_size = Some(value.clone());
                }
                _ => {}
            }
        }
        config
    }

    pub fn with_image_path_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.image_path_resolver = Arc::new(resolver);
        self
    }

    pub fn top_level_offset(&self) -> usize {
        self.top_level_division.offset()
    }

    pub(crate) fn resolve_image_path(&self, url: &str) -> String {
        (self.image_path_resolver)(url)
    }
}
