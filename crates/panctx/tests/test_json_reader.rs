/*
 * test_json_reader.rs
 * Copyright (c) 2025 Posit, PBC
 */

use panctx::readers::json::{self, DecodeErrorKind, PathSegment};
use panctx_pandoc_types::{
    Alignment, Block, CitationMode, ColWidth, FormatKind, Inline, ListNumberDelim,
    ListNumberStyle, MathType, MetaValue, QuoteType,
};
use serde_json::{Value, json};

fn attr() -> Value {
    json!(["", [], []])
}

fn decode_block(block: Value) -> Block {
    let mut blocks = json::decode_blocks(&json!([block])).unwrap();
    assert_eq!(blocks.len(), 1);
    blocks.remove(0)
}

fn decode_inline(inline: Value) -> Inline {
    match decode_block(json!({"t": "Plain", "c": [inline]})) {
        Block::Plain(mut plain) => plain.content.remove(0),
        other => panic!("expected Plain, got {:?}", other),
    }
}

#[test]
fn test_every_block_tag_decodes() {
    let cases = vec![
        (json!({"t": "Plain", "c": []}), "Plain"),
        (json!({"t": "Para", "c": []}), "Para"),
        (json!({"t": "LineBlock", "c": [[]]}), "LineBlock"),
        (json!({"t": "CodeBlock", "c": [attr(), "x"]}), "CodeBlock"),
        (json!({"t": "RawBlock", "c": ["tex", "x"]}), "RawBlock"),
        (json!({"t": "BlockQuote", "c": []}), "BlockQuote"),
        (
            json!({"t": "OrderedList", "c": [[1, {"t": "Decimal"}, {"t": "Period"}], []]}),
            "OrderedList",
        ),
        (json!({"t": "BulletList", "c": [[]]}), "BulletList"),
        (json!({"t": "DefinitionList", "c": []}), "DefinitionList"),
        (json!({"t": "Header", "c": [1, attr(), []]}), "Header"),
        (json!({"t": "HorizontalRule"}), "HorizontalRule"),
        (
            json!({"t": "Table", "c": [attr(), [null, []], [], [attr(), []], [], [attr(), []]]}),
            "Table",
        ),
        (json!({"t": "Div", "c": [attr(), []]}), "Div"),
    ];
    for (value, tag) in cases {
        assert_eq!(decode_block(value).tag(), tag);
    }
}

#[test]
fn test_every_inline_tag_decodes() {
    let cases = vec![
        (json!({"t": "Str", "c": "x"}), "Str"),
        (json!({"t": "Emph", "c": []}), "Emph"),
        (json!({"t": "Underline", "c": []}), "Underline"),
        (json!({"t": "Strong", "c": []}), "Strong"),
        (json!({"t": "Strikeout", "c": []}), "Strikeout"),
        (json!({"t": "Superscript", "c": []}), "Superscript"),
        (json!({"t": "Subscript", "c": []}), "Subscript"),
        (json!({"t": "SmallCaps", "c": []}), "SmallCaps"),
        (json!({"t": "Quoted", "c": [{"t": "SingleQuote"}, []]}), "Quoted"),
        (json!({"t": "Cite", "c": [[], []]}), "Cite"),
        (json!({"t": "Code", "c": [attr(), "x"]}), "Code"),
        (json!({"t": "Space"}), "Space"),
        (json!({"t": "SoftBreak"}), "SoftBreak"),
        (json!({"t": "LineBreak"}), "LineBreak"),
        (json!({"t": "Math", "c": [{"t": "InlineMath"}, "x"]}), "Math"),
        (json!({"t": "RawInline", "c": ["tex", "x"]}), "RawInline"),
        (json!({"t": "Link", "c": [attr(), [], ["u", "t"]]}), "Link"),
        (json!({"t": "Image", "c": [attr(), [], ["u", "t"]]}), "Image"),
        (json!({"t": "Note", "c": []}), "Note"),
        (json!({"t": "Span", "c": [attr(), []]}), "Span"),
    ];
    for (value, tag) in cases {
        assert_eq!(decode_inline(value).tag(), tag);
    }
}

#[test]
fn test_unknown_tags_are_named_in_errors() {
    let err = json::decode_blocks(&json!([{"t": "Marquee", "c": []}])).unwrap_err();
    assert!(matches!(err.kind, DecodeErrorKind::UnknownBlock(_)));
    assert_eq!(err.path, vec![PathSegment::Index(0)]);
    assert!(err.to_string().contains("Marquee"));

    let err = json::decode_blocks(&json!([{"t": "Para", "c": [{"t": "Blink"}]}])).unwrap_err();
    assert!(matches!(err.kind, DecodeErrorKind::UnknownInline(_)));
    assert_eq!(
        err.to_string(),
        "[0] > Para > [0]: Unknown inline type: Blink"
    );
}

#[test]
fn test_figure_is_unsupported() {
    let err = json::decode_blocks(&json!([
        {"t": "Figure", "c": [attr(), [null, []], []]}
    ]))
    .unwrap_err();
    assert!(matches!(err.kind, DecodeErrorKind::UnsupportedVariant(_)));
    assert_eq!(err.path, vec![PathSegment::Index(0)]);
    assert_eq!(err.to_string(), "[0]: Unsupported variant: Block: Figure");
}

#[test]
fn test_wrong_arity_reports_node() {
    let err = json::decode_blocks(&json!([
        {"t": "Header", "c": [1, attr()]}
    ]))
    .unwrap_err();
    assert!(matches!(
        err.kind,
        DecodeErrorKind::WrongArity {
            what: "Header",
            expected: 3,
            found: 2
        }
    ));
    assert_eq!(
        err.path,
        vec![PathSegment::Index(0), PathSegment::Tag("Header".to_string())]
    );
}

#[test]
fn test_missing_tag() {
    let err = json::decode_blocks(&json!([{"c": []}])).unwrap_err();
    assert!(matches!(err.kind, DecodeErrorKind::MissingField(ref f) if f == "t"));
}

#[test]
fn test_invalid_json_text() {
    let err = json::read_str("{\"blocks\": [").unwrap_err();
    assert!(matches!(err.kind, DecodeErrorKind::InvalidJson(_)));
}

#[test]
fn test_read_from_reader() {
    let input = r#"{"pandoc-api-version":[1,23,1],"meta":{},"blocks":[{"t":"HorizontalRule"}]}"#;
    let doc = json::read(&mut input.as_bytes()).unwrap();
    assert_eq!(doc.blocks, vec![Block::HorizontalRule]);
}

#[test]
fn test_inline_payloads() {
    match decode_inline(json!({"t": "Quoted", "c": [{"t": "DoubleQuote"}, [{"t": "Str", "c": "q"}]]})) {
        Inline::Quoted(q) => {
            assert_eq!(q.quote_type, QuoteType::DoubleQuote);
            assert_eq!(q.content, vec![Inline::str("q")]);
        }
        other => panic!("unexpected {:?}", other),
    }

    match decode_inline(json!({"t": "Math", "c": [{"t": "DisplayMath"}, "e=mc^2"]})) {
        Inline::Math(m) => {
            assert_eq!(m.math_type, MathType::DisplayMath);
            assert_eq!(m.text, "e=mc^2");
        }
        other => panic!("unexpected {:?}", other),
    }

    match decode_inline(json!({"t": "SmallCaps", "c": [{"t": "Str", "c": "sc"}]})) {
        Inline::Formatted(f) => assert_eq!(f.kind, FormatKind::SmallCaps),
        other => panic!("unexpected {:?}", other),
    }

    match decode_inline(json!({"t": "Image", "c": [
        ["img", ["c"], [["width", "3cm"]]],
        [{"t": "Str", "c": "alt"}],
        ["a.png", "title"]
    ]})) {
        Inline::Image(img) => {
            assert_eq!(img.attr.id, "img");
            assert_eq!(img.attr.get("width"), Some("3cm"));
            assert_eq!(img.target, ("a.png".to_string(), "title".to_string()));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_citation_fields() {
    let inline = decode_inline(json!({"t": "Cite", "c": [[{
        "citationId": "doe2020",
        "citationPrefix": [{"t": "Str", "c": "see"}],
        "citationSuffix": [],
        "citationMode": {"t": "AuthorInText"},
        "citationNoteNum": 3,
        "citationHash": 7
    }], [{"t": "Str", "c": "@doe2020"}]]}));
    match inline {
        Inline::Cite(cite) => {
            let c = &cite.citations[0];
            assert_eq!(c.id, "doe2020");
            assert_eq!(c.mode, CitationMode::AuthorInText);
            assert_eq!(c.note_num, 3);
            assert_eq!(c.hash, 7);
            assert_eq!(c.prefix, vec![Inline::str("see")]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_citation_missing_field_path() {
    let err = json::decode_blocks(&json!([{"t": "Para", "c": [{"t": "Cite", "c": [[{
        "citationId": "x",
        "citationPrefix": [],
        "citationSuffix": [],
        "citationMode": {"t": "NormalCitation"},
        "citationNoteNum": 0
    }], []]}]}]))
    .unwrap_err();
    assert!(matches!(err.kind, DecodeErrorKind::MissingField(ref f) if f == "citationHash"));
    assert_eq!(
        err.to_string(),
        "[0] > Para > [0] > Cite > citations > [0]: Missing required field: citationHash"
    );
}

#[test]
fn test_ordered_list_attributes() {
    match decode_block(json!({"t": "OrderedList", "c": [
        [4, {"t": "UpperAlpha"}, {"t": "TwoParens"}],
        [[{"t": "Plain", "c": []}]]
    ]})) {
        Block::OrderedList(list) => {
            assert_eq!(list.attr.start, 4);
            assert_eq!(list.attr.style, ListNumberStyle::UpperAlpha);
            assert_eq!(list.attr.delim, ListNumberDelim::TwoParens);
            assert_eq!(list.content.len(), 1);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_table_decodes_fully() {
    let cell = json!([attr(), {"t": "AlignRight"}, 2, 1, [{"t": "Plain", "c": [{"t": "Str", "c": "c"}]}]]);
    let row = json!([attr(), [cell]]);
    let block = decode_block(json!({"t": "Table", "c": [
        ["tbl", [], []],
        [[{"t": "Str", "c": "short"}], [{"t": "Plain", "c": [{"t": "Str", "c": "long"}]}]],
        [[{"t": "AlignCenter"}, {"t": "ColWidth", "c": 0.25}]],
        [attr(), [row.clone()]],
        [[attr(), 1, [row.clone()], [row.clone(), row.clone()]]],
        [attr(), [row]]
    ]}));
    let Block::Table(table) = block else {
        panic!("expected Table");
    };
    assert_eq!(table.attr.id, "tbl");
    assert_eq!(table.caption.short, Some(vec![Inline::str("short")]));
    assert_eq!(table.caption.long.len(), 1);
    assert_eq!(table.colspec, vec![(Alignment::Center, ColWidth::Percentage(0.25))]);
    assert_eq!(table.head.rows.len(), 1);
    assert_eq!(table.bodies[0].rowhead_columns, 1);
    assert_eq!(table.bodies[0].head.len(), 1);
    assert_eq!(table.body_row_count(), 2);
    assert_eq!(table.foot.rows.len(), 1);
    let cell = &table.head.rows[0].cells[0];
    assert_eq!(cell.alignment, Alignment::Right);
    assert_eq!(cell.row_span, 2);
    assert_eq!(cell.col_span, 1);
}

#[test]
fn test_meta_values() {
    let doc = json::decode(&json!({
        "meta": {
            "title": {"t": "MetaInlines", "c": [
                {"t": "Str", "c": "A"}, {"t": "Space"}, {"t": "Str", "c": "Title"}
            ]},
            "draft": {"t": "MetaBool", "c": false},
            "tags": {"t": "MetaList", "c": [{"t": "MetaString", "c": "x"}]},
            "opts": {"t": "MetaMap", "c": {"k": {"t": "MetaString", "c": "v"}}},
            "abstract": {"t": "MetaBlocks", "c": [{"t": "Para", "c": []}]}
        },
        "blocks": []
    }))
    .unwrap();
    assert!(doc.api_version.is_empty());
    assert_eq!(doc.meta.len(), 5);
    assert_eq!(doc.meta.get("draft"), Some(&MetaValue::MetaBool(false)));
    assert!(matches!(doc.meta.get("tags"), Some(MetaValue::MetaList(items)) if items.len() == 1));
    assert!(matches!(doc.meta.get("opts"), Some(MetaValue::MetaMap(map)) if map.contains_key("k")));

    let vars = doc.variables();
    assert_eq!(vars.len(), 1);
    assert_eq!(vars.get("title").map(String::as_str), Some("A Title"));
}

#[test]
fn test_document_must_be_object() {
    let err = json::decode(&json!([])).unwrap_err();
    assert!(matches!(err.kind, DecodeErrorKind::InvalidType(_)));
}
