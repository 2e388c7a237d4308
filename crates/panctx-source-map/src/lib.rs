//! Source locations for panctx diagnostics
//!
//! This crate maps byte offsets in a text buffer to human-readable
//! line/column positions. It is used to annotate wildcard errors and any
//! other diagnostic that points into a raw template buffer.
//!
//! # Overview
//!
//! - [`SourceLocation`]: a resolved 1-based line/column plus the byte
//!   offsets it was computed from
//! - [`LineIndex`]: a line-start index built once per buffer, answering
//!   repeated lookups by binary search
//! - [`locate`]: one-shot convenience over [`LineIndex`]
//!
//! # Example
//!
//! ```rust
//! use panctx_source_map::locate;
//!
//! let loc = locate("first\nsecond", 8);
//! assert_eq!(loc.line, 2);
//! assert_eq!(loc.column, 3);
//! assert_eq!(loc.to_string(), "2:3");
//! ```

pub mod line_index;
pub mod types;
pub mod utils;

pub use line_index::LineIndex;
pub use types::SourceLocation;
pub use utils::{extract_line, locate};
