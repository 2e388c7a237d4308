/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pandoc JSON to ConTeXt.
//!
//! - [`readers::json`] decodes a Pandoc JSON AST into
//!   [`panctx_pandoc_types::Document`]
//! - [`writers::context`] renders blocks as ConTeXt markup
//! - [`wildcards`] scans and substitutes `$<prefix:content>$` tokens in
//!   template buffers
//!
//! ```
//! use panctx::config::ContextConfig;
//!
//! let doc = panctx::readers::json::read_str(
//!     r#"{"pandoc-api-version": [1, 23, 1], "meta": {},
//!         "blocks": [{"t": "Header", "c": [1, ["intro", [], []], [{"t": "Str", "c": "Intro"}]]}]}"#,
//! )
//! .unwrap();
//! let text = panctx::writers::context::render_document(&doc, &ContextConfig::default());
//! assert_eq!(text, "\\chapter[intro]{Intro}");
//! ```

pub mod config;
pub mod readers;
pub mod wildcards;
pub mod writers;

pub use config::{ContextConfig, TopLevelDivision};
pub use readers::json::{DecodeErrorKind, JsonReadError};
pub use wildcards::WildcardError;
