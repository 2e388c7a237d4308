//! Line-start index for offset lookups

use crate::types::SourceLocation;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Line-start index over a borrowed buffer
///
/// Scans the buffer once to record where every line begins. Lookups then
/// binary-search this table, so a caller resolving many offsets in the same
/// buffer pays for the scan only once.
///
/// A leading UTF-8 byte-order mark is skipped: the first line starts right
/// after it. `\n`, `\r` and `\r\n` each count as a single line boundary.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a [u8],
    /// Byte offset where each line starts; never empty
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Build the index for `source`.
    ///
    /// # Example
    ///
    /// ```
    /// use panctx_source_map::LineIndex;
    ///
    /// let index = LineIndex::new("a\r\nb\rc\nd");
    /// assert_eq!(index.line_count(), 4);
    /// ```
    pub fn new(source: &'a str) -> Self {
        let bytes = source.as_bytes();
        let content_start = if bytes.starts_with(UTF8_BOM) {
            UTF8_BOM.len()
        } else {
            0
        };

        let mut line_starts = vec![content_start];
        let mut cur = content_start;
        while cur < bytes.len() {
            match bytes[cur] {
                b'\n' => {
                    cur += 1;
                    line_starts.push(cur);
                }
                b'\r' => {
                    cur += 1;
                    if bytes.get(cur) == Some(&b'\n') {
                        cur += 1;
                    }
                    line_starts.push(cur);
                }
                _ => cur += 1,
            }
        }

        LineIndex {
            source: bytes,
            line_starts,
        }
    }

    /// Offset of the first byte after the byte-order mark, if any.
    pub fn content_start(&self) -> usize {
        self.line_starts[0]
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Resolve a byte offset to a line/column location.
    ///
    /// Offsets past the end of the buffer are clamped to its length, and
    /// offsets inside the byte-order mark are clamped to the first content
    /// byte. An offset that lands between the `\r` and `\n` of a CRLF pair
    /// is reported at the start of the following line.
    ///
    /// # Example
    ///
    /// ```
    /// use panctx_source_map::LineIndex;
    ///
    /// let index = LineIndex::new("héllo\nwörld");
    /// let loc = index.locate(3);
    /// assert_eq!((loc.line, loc.column), (1, 3));
    /// ```
    pub fn locate(&self, offset: usize) -> SourceLocation {
        let offset = offset.clamp(self.content_start(), self.source.len());

        // Index of the last line start at or before `offset`
        let mut line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let mut line_start = self.line_starts[line];

        if offset > line_start
            && self.source[offset - 1] == b'\r'
            && self.source.get(offset) == Some(&b'\n')
        {
            line += 1;
            line_start = offset;
        }

        SourceLocation {
            line: line + 1,
            column: 1 + count_code_points(&self.source[line_start..offset]),
            line_start_offset: line_start,
            offset_within_line: offset - line_start,
        }
    }
}

/// Count code points by counting bytes that do not continue a UTF-8 sequence.
fn count_code_points(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| (b & 0xC0) != 0x80).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);

        let loc = index.locate(0);
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 1);
        assert_eq!(loc.line_start_offset, 0);
        assert_eq!(loc.offset_within_line, 0);
    }

    #[test]
    fn test_single_line() {
        let index = LineIndex::new("hello world");
        let loc = index.locate(6);
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 7);
        assert_eq!(loc.offset_within_line, 6);
    }

    #[test]
    fn test_line_boundaries() {
        // lines: "a", "b", "c", "d"
        let index = LineIndex::new("a\r\nb\rc\nd");
        assert_eq!(index.line_count(), 4);

        assert_eq!(index.locate(0).line, 1);
        assert_eq!(index.locate(3).line, 2);
        assert_eq!(index.locate(5).line, 3);
        let loc = index.locate(7);
        assert_eq!(loc.line, 4);
        assert_eq!(loc.line_start_offset, 7);
        assert_eq!(loc.column, 1);
    }

    #[test]
    fn test_offset_at_newline_belongs_to_its_line() {
        let index = LineIndex::new("ab\ncd");
        let loc = index.locate(2);
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 3);
    }

    #[test]
    fn test_offset_between_cr_and_lf() {
        let index = LineIndex::new("ab\r\ncd");
        let loc = index.locate(3);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.line_start_offset, 3);
        assert_eq!(loc.column, 1);
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let source = "\u{FEFF}abc\ndef";
        let index = LineIndex::new(source);
        assert_eq!(index.content_start(), 3);

        let loc = index.locate(3);
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 1);
        assert_eq!(loc.line_start_offset, 3);
        assert_eq!(loc.offset_within_line, 0);

        // offsets inside the mark are clamped
        assert_eq!(index.locate(1), loc);

        let loc = index.locate(8);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 2);
    }

    #[test]
    fn test_columns_count_code_points() {
        // '€' is 3 bytes
        let source = "x\n€y";
        let index = LineIndex::new(source);
        let loc = index.locate(5);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 2);
        assert_eq!(loc.offset_within_line, 3);
    }

    #[test]
    fn test_out_of_bounds_offset_is_clamped() {
        let index = LineIndex::new("abc");
        let loc = index.locate(100);
        assert_eq!(loc.column, 4);
        assert_eq!(loc.offset(), 3);
    }

    #[test]
    fn test_trailing_newline_opens_empty_line() {
        let index = LineIndex::new("line 1\n");
        assert_eq!(index.line_count(), 2);
        let loc = index.locate(7);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 1);
    }
}
