//! Core types for source locations

use serde::{Deserialize, Serialize};

/// A resolved position inside a text buffer.
///
/// `line` and `column` are 1-based. `column` counts Unicode code points
/// from the start of the line, not bytes. The two offsets are byte offsets
/// and allow the caller to slice the original buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in code points)
    pub column: usize,
    /// Byte offset of the line start, relative to the buffer start
    pub line_start_offset: usize,
    /// Byte offset of the location, relative to `line_start_offset`
    pub offset_within_line: usize,
}

impl SourceLocation {
    /// Absolute byte offset of this location in the buffer.
    pub fn offset(&self) -> usize {
        self.line_start_offset + self.offset_within_line
    }

    pub fn is_valid(&self) -> bool {
        self.line > 0 && self.column > 0
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
