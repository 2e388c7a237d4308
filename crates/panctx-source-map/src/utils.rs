//! Convenience functions over [`LineIndex`]

use crate::line_index::LineIndex;
use crate::types::SourceLocation;

/// Resolve a single byte offset in `buffer`.
///
/// Builds a throwaway [`LineIndex`]; callers resolving several offsets in
/// the same buffer should keep an index instead.
pub fn locate(buffer: &str, byte_offset: usize) -> SourceLocation {
    LineIndex::new(buffer).locate(byte_offset)
}

/// The text of the line containing `location`, without its terminator.
pub fn extract_line<'a>(buffer: &'a str, location: &SourceLocation) -> &'a str {
    let Some(rest) = buffer.get(location.line_start_offset..) else {
        return "";
    };
    match rest.find(['\r', '\n']) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_locate_multiline() {
        let source = "first\nsecond\nthird";
        let loc = locate(source, 9);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 4);
        assert_eq!(loc.line_start_offset, 6);
    }

    #[test]
    fn test_locate_bom_and_multibyte() {
        // BOM, then a 3-byte character followed by 'a'
        let source = "\u{FEFF}\u{4E16}a";
        let loc = locate(source, 3);
        assert_eq!((loc.line, loc.column), (1, 1));
        let loc = locate(source, 6);
        assert_eq!((loc.line, loc.column), (1, 2));
    }

    #[test]
    fn test_extract_line() {
        let source = "one\r\ntwo\nthree";
        let loc = locate(source, 6);
        assert_eq!(extract_line(source, &loc), "two");

        let loc = locate(source, source.len());
        assert_eq!(extract_line(source, &loc), "three");
    }

    proptest! {
        #[test]
        fn ascii_columns_match_byte_distance(
            lines in proptest::collection::vec("[a-z ]{0,12}", 1..6),
            pick in any::<prop::sample::Index>(),
        ) {
            let source = lines.join("\n");
            let offset = pick.index(source.len() + 1);
            let loc = locate(&source, offset);

            prop_assert_eq!(loc.offset(), offset);
            prop_assert_eq!(loc.column, loc.offset_within_line + 1);
            prop_assert_eq!(loc.line, 1 + source[..offset].matches('\n').count());
        }
    }
}
