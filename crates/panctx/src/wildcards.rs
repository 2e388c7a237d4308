/*
 * wildcards.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `$<prefix:content>$` placeholders in raw text buffers.
//!
//! A token is the shortest `$<` ... `>$` run whose inner text contains
//! neither `>` nor `$`. The inner text splits at its first `:` into a
//! prefix and a content part; the content may itself contain `:`. This
//! module assigns no meaning to prefixes, callers do.
//!
//! A token without a `:` is always an error, both when scanning and when
//! replacing. Errors carry the line and column of the token's opening `$<`.

use once_cell::sync::Lazy;
use panctx_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use panctx_source_map::{LineIndex, SourceLocation};
use regex::{CaptureMatches, Regex};
use std::ops::Range;
use thiserror::Error;

static WILDCARD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$<([^>$]*)>\$").unwrap());

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum WildcardError {
    #[error("[{location}] invalid wildcard `{token}`: expected `$<prefix:content>$`")]
    MissingSeparator {
        token: String,
        location: SourceLocation,
    },

    #[error("[{location}] invalid wildcard `$<{prefix}:{content}>$`: {source}")]
    Handler {
        prefix: String,
        content: String,
        location: SourceLocation,
        source: BoxedError,
    },
}

impl WildcardError {
    pub fn location(&self) -> SourceLocation {
        match self {
            WildcardError::MissingSeparator { location, .. }
            | WildcardError::Handler { location, .. } => *location,
        }
    }

    /// Convert to a diagnostic pointing at the offending token.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            WildcardError::MissingSeparator { token, location } => {
                DiagnosticMessageBuilder::error("Invalid wildcard")
                    .problem(format!("`{}` has no `:` between prefix and content", token))
                    .with_location(*location)
                    .add_hint("Write the wildcard as `$<prefix:content>$`?")
                    .build()
            }
            WildcardError::Handler {
                prefix,
                content,
                location,
                source,
            } => DiagnosticMessageBuilder::error("Wildcard could not be resolved")
                .problem(format!("`$<{}:{}>$` was rejected", prefix, content))
                .add_detail(source.to_string())
                .with_location(*location)
                .build(),
        }
    }
}

/// One token found in a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wildcard<'a> {
    /// Byte range of the whole token, `$<` through `>$`
    pub range: Range<usize>,
    /// Text between the delimiters
    pub inner: &'a str,
}

impl<'a> Wildcard<'a> {
    /// The token as written in the buffer.
    pub fn token(&self) -> String {
        format!("$<{}>$", self.inner)
    }

    /// Prefix and content, split at the first `:`.
    pub fn parts(&self) -> Option<(&'a str, &'a str)> {
        self.inner.split_once(':')
    }
}

/// Iterator over the tokens of a buffer, in order of appearance.
pub struct Wildcards<'r, 'a> {
    captures: CaptureMatches<'r, 'a>,
}

impl<'r, 'a> Iterator for Wildcards<'r, 'a> {
    type Item = Wildcard<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.captures.next()?;
        let whole = caps.get(0)?;
        let inner = caps.get(1)?;
        Some(Wildcard {
            range: whole.range(),
            inner: inner.as_str(),
        })
    }
}

/// Iterate over every token in `buffer` without resolving anything.
///
/// ```
/// use panctx::wildcards::for_each_wildcard;
///
/// let found: Vec<_> = for_each_wildcard("see $<ref:fig:a>$ and $<x>$")
///     .map(|w| (w.range.start, w.parts()))
///     .collect();
/// assert_eq!(found, vec![(4, Some(("ref", "fig:a"))), (22, None)]);
/// ```
pub fn for_each_wildcard(buffer: &str) -> Wildcards<'static, '_> {
    Wildcards {
        captures: WILDCARD_RE.captures_iter(buffer),
    }
}

/// Resolves locations against one buffer, building the line index on first
/// use. Most passes never fail and never need it.
struct Locator<'a> {
    buffer: &'a str,
    index: Option<LineIndex<'a>>,
}

impl<'a> Locator<'a> {
    fn new(buffer: &'a str) -> Self {
        Locator {
            buffer,
            index: None,
        }
    }

    fn locate(&mut self, offset: usize) -> SourceLocation {
        let buffer = self.buffer;
        self.index
            .get_or_insert_with(|| LineIndex::new(buffer))
            .locate(offset)
    }
}

fn missing_separator(wildcard: &Wildcard<'_>, locator: &mut Locator<'_>) -> WildcardError {
    let location = locator.locate(wildcard.range.start);
    tracing::debug!(
        token = wildcard.inner,
        %location,
        "wildcard without separator"
    );
    WildcardError::MissingSeparator {
        token: wildcard.token(),
        location,
    }
}

/// Call `handler(prefix, content)` for every token, in order.
///
/// Stops at the first token without a `:` separator; the handler has been
/// called for every token before it.
pub fn scan_wildcards<F>(buffer: &str, mut handler: F) -> Result<(), WildcardError>
where
    F: FnMut(&str, &str),
{
    let mut locator = Locator::new(buffer);
    for wildcard in for_each_wildcard(buffer) {
        let Some((prefix, content)) = wildcard.parts() else {
            return Err(missing_separator(&wildcard, &mut locator));
        };
        tracing::trace!(prefix, content, offset = wildcard.range.start, "wildcard");
        handler(prefix, content);
    }
    Ok(())
}

/// Replace every token with the text `handler(prefix, content)` returns.
///
/// The first failure, from the handler or a missing separator, aborts the
/// pass and no output is returned.
///
/// ```
/// use panctx::wildcards::replace_wildcards;
///
/// let out = replace_wildcards("Hello $<var:name>$!", |prefix, content| {
///     Ok::<_, String>(format!("<{}={}>", prefix, content))
/// })
/// .unwrap();
/// assert_eq!(out, "Hello <var=name>!");
/// ```
pub fn replace_wildcards<F, E>(buffer: &str, mut handler: F) -> Result<String, WildcardError>
where
    F: FnMut(&str, &str) -> Result<String, E>,
    E: Into<BoxedError>,
{
    let mut locator = Locator::new(buffer);
    let mut out = String::with_capacity(buffer.len());
    let mut last = 0;
    for wildcard in for_each_wildcard(buffer) {
        let Some((prefix, content)) = wildcard.parts() else {
            return Err(missing_separator(&wildcard, &mut locator));
        };
        tracing::trace!(prefix, content, offset = wildcard.range.start, "wildcard");
        match handler(prefix, content) {
            Ok(replacement) => {
                out.push_str(&buffer[last..wildcard.range.start]);
                out.push_str(&replacement);
                last = wildcard.range.end;
            }
            Err(err) => {
                let source: BoxedError = err.into();
                let location = locator.locate(wildcard.range.start);
                tracing::debug!(
                    prefix,
                    content,
                    %location,
                    error = %source,
                    "wildcard handler failed"
                );
                return Err(WildcardError::Handler {
                    prefix: prefix.to_string(),
                    content: content.to_string(),
                    location,
                    source,
                });
            }
        }
    }
    out.push_str(&buffer[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_grammar() {
        let inners: Vec<&str> = for_each_wildcard("$<a:b>$ $<c:d>e>$ $<$<f:g>$ $<>$")
            .map(|w| w.inner)
            .collect();
        assert_eq!(inners, vec!["a:b", "f:g", ""]);
    }

    #[test]
    fn test_parts_split_at_first_colon() {
        let w = for_each_wildcard("$<md:chapters/one.md:2>$").next().unwrap();
        assert_eq!(w.parts(), Some(("md", "chapters/one.md:2")));
        assert_eq!(w.range, 0..24);
        assert_eq!(w.token(), "$<md:chapters/one.md:2>$");
    }

    #[test]
    fn test_empty_prefix_is_accepted() {
        let mut seen = Vec::new();
        scan_wildcards("$<:logo.png>$", |p, c| seen.push((p.to_string(), c.to_string())))
            .unwrap();
        assert_eq!(seen, vec![(String::new(), "logo.png".to_string())]);
    }

    #[test]
    fn test_replace_missing_separator_is_an_error() {
        let err = replace_wildcards("x\n  $<oops>$", |_, _| Ok::<_, String>(String::new()))
            .unwrap_err();
        assert!(matches!(err, WildcardError::MissingSeparator { .. }));
        assert_eq!(err.location().line, 2);
        assert_eq!(err.location().column, 3);
        assert_eq!(
            err.to_string(),
            "[2:3] invalid wildcard `$<oops>$`: expected `$<prefix:content>$`"
        );
    }

    #[test]
    fn test_handler_error_display_and_source() {
        let err = replace_wildcards("$<var:a>$ $<var:missing>$", |_, content| {
            if content == "a" {
                Ok("A".to_string())
            } else {
                Err(format!("unknown variable `{}`", content))
            }
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "[1:11] invalid wildcard `$<var:missing>$`: unknown variable `missing`"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("unknown variable `missing`"));
    }

    #[test]
    fn test_diagnostic_has_location() {
        let err = scan_wildcards("$<bad>$", |_, _| {}).unwrap_err();
        let diag = err.to_diagnostic();
        assert!(diag.is_error());
        assert_eq!(diag.location.map(|l| l.offset()), Some(0));
        let text = diag.to_text(None);
        assert!(text.contains("Invalid wildcard"));
        assert!(text.contains("at 1:1"));
    }
}
