//! Diagnostic messages for panctx.
//!
//! Diagnostics follow a tidyverse-style layout: a short title, an optional
//! problem statement, bulleted details and hints. They render either as
//! plain text (with an ariadne source snippet when the caller supplies the
//! buffer the location points into) or as JSON.
//!
//! ```
//! use panctx_error_reporting::DiagnosticMessageBuilder;
//!
//! let msg = DiagnosticMessageBuilder::warning("Dropped inline")
//!     .problem("`Cite` has no ConTeXt rendering")
//!     .add_hint("Resolve citations before rendering?")
//!     .build();
//! assert!(msg.to_text(None).starts_with("Warning: Dropped inline"));
//! ```

pub mod builder;
pub mod diagnostic;

pub use builder::DiagnosticMessageBuilder;
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
