/*
 * json.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Reader for the Pandoc JSON AST.
//!
//! Decoding is all-or-nothing: any unknown tag, wrong arity or wrong scalar
//! type fails the whole document with a [`JsonReadError`] that records where
//! in the tree the problem was found. `Null` blocks are accepted and dropped.
//! Metadata is the exception: an entry that fails to decode is skipped.

use hashlink::LinkedHashMap;
use panctx_pandoc_types::{
    Alignment, Attr, Block, BlockQuote, Blocks, BulletList, Caption, Cell, Citation, CitationMode,
    Cite, Code, CodeBlock, ColSpec, ColWidth, DefinitionList, Div, Document, FormatKind, Formatted,
    Header, Image, Inline, Inlines, LineBlock, Link, ListAttributes, ListNumberDelim,
    ListNumberStyle, Math, MathType, Meta, MetaValue, Note, OrderedList, Paragraph, Plain,
    QuoteType, Quoted, RawBlock, RawInline, Row, Span, Str, Table, TableBody, TableFoot,
    TableHead, Target,
};
use serde_json::Value;
use thiserror::Error;

/// One step on the way from the document root to a failing node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A node tag such as `Para` or `Table`
    Tag(String),
    /// A named field such as `meta` or `citationId`
    Field(&'static str),
    /// A position inside a list
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Tag(tag) => write!(f, "{}", tag),
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(idx) => write!(f, "[{}]", idx),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeErrorKind {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Invalid type: expected {0}")]
    InvalidType(String),
    #[error("{what} must have {expected} elements, found {found}")]
    WrongArity {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Unsupported variant: {0}")]
    UnsupportedVariant(String),
    #[error("Unknown block type: {0}")]
    UnknownBlock(String),
    #[error("Unknown inline type: {0}")]
    UnknownInline(String),
}

/// A decoding failure and the path to the node that caused it.
///
/// `path` is ordered outermost first. Displayed as
/// `blocks > [2] > BulletList > [0] > [1] > Para > [3]: Unknown inline type: Foo`.
#[derive(Debug, Error)]
#[error("{}", render_error(.path, .kind))]
pub struct JsonReadError {
    pub kind: DecodeErrorKind,
    pub path: Vec<PathSegment>,
}

fn render_error(path: &[PathSegment], kind: &DecodeErrorKind) -> String {
    if path.is_empty() {
        return kind.to_string();
    }
    let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
    format!("{}: {}", path.join(" > "), kind)
}

impl JsonReadError {
    pub fn new(kind: DecodeErrorKind) -> Self {
        JsonReadError {
            kind,
            path: Vec::new(),
        }
    }

    fn invalid_type(expected: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::InvalidType(expected.into()))
    }

    /// True when the error is about the node's own tag rather than its content.
    fn rejects_own_tag(&self) -> bool {
        self.path.is_empty()
            && matches!(
                self.kind,
                DecodeErrorKind::UnknownBlock(_) | DecodeErrorKind::UnknownInline(_)
            )
    }

    fn missing_field(name: &str) -> Self {
        Self::new(DecodeErrorKind::MissingField(name.to_string()))
    }

    fn unsupported(what: &str, variant: &str) -> Self {
        Self::new(DecodeErrorKind::UnsupportedVariant(format!(
            "{}: {}",
            what, variant
        )))
    }
}

impl From<serde_json::Error> for JsonReadError {
    fn from(err: serde_json::Error) -> Self {
        JsonReadError::new(DecodeErrorKind::InvalidJson(err))
    }
}

type Result<T> = std::result::Result<T, JsonReadError>;

/// Prepend a path segment to the error of a failed decode step.
trait WithPath<T> {
    fn in_tag(self, tag: &str) -> Result<T>;
    fn in_field(self, name: &'static str) -> Result<T>;
    fn at_index(self, idx: usize) -> Result<T>;
}

impl<T> WithPath<T> for Result<T> {
    fn in_tag(self, tag: &str) -> Result<T> {
        self.map_err(|mut e| {
            e.path.insert(0, PathSegment::Tag(tag.to_string()));
            e
        })
    }

    fn in_field(self, name: &'static str) -> Result<T> {
        self.map_err(|mut e| {
            e.path.insert(0, PathSegment::Field(name));
            e
        })
    }

    fn at_index(self, idx: usize) -> Result<T> {
        self.map_err(|mut e| {
            e.path.insert(0, PathSegment::Index(idx));
            e
        })
    }
}

/// Read JSON text from `reader` and decode it.
pub fn read<R: std::io::Read>(reader: &mut R) -> Result<Document> {
    let mut buffer = String::new();
    reader
        .read_to_string(&mut buffer)
        .map_err(|e| JsonReadError::from(serde_json::Error::io(e)))?;
    read_str(&buffer)
}

/// Parse JSON text and decode it.
pub fn read_str(text: &str) -> Result<Document> {
    let json: Value = serde_json::from_str(text)?;
    decode(&json)
}

/// Decode an already-parsed Pandoc JSON document.
pub fn decode(value: &Value) -> Result<Document> {
    let obj = value
        .as_object()
        .ok_or_else(|| JsonReadError::invalid_type("object for Pandoc document"))?;

    let api_version = match obj.get("pandoc-api-version") {
        Some(v) => read_api_version(v).in_field("pandoc-api-version")?,
        None => Vec::new(),
    };

    let meta = match obj.get("meta") {
        Some(v) => read_meta(v).in_field("meta")?,
        None => Meta::new(),
    };

    let blocks = read_blocks(
        obj.get("blocks")
            .ok_or_else(|| JsonReadError::missing_field("blocks"))?,
    )
    .in_field("blocks")?;

    tracing::debug!(
        blocks = blocks.len(),
        meta_entries = meta.len(),
        "decoded pandoc document"
    );

    Ok(Document {
        api_version,
        meta,
        blocks,
    })
}

/// Decode a bare block list, such as the `blocks` field of a document.
pub fn decode_blocks(value: &Value) -> Result<Blocks> {
    read_blocks(value)
}

fn read_api_version(value: &Value) -> Result<Vec<u64>> {
    as_array(value, "pandoc-api-version")?
        .iter()
        .enumerate()
        .map(|(idx, v)| {
            v.as_u64()
                .ok_or_else(|| JsonReadError::invalid_type("non-negative integer"))
                .at_index(idx)
        })
        .collect()
}

// -- scalar and shape helpers --

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| JsonReadError::invalid_type(format!("array for {}", what)))
}

fn as_tuple<'a>(value: &'a Value, what: &'static str, expected: usize) -> Result<&'a [Value]> {
    let arr = as_array(value, what)?;
    if arr.len() != expected {
        return Err(JsonReadError::new(DecodeErrorKind::WrongArity {
            what,
            expected,
            found: arr.len(),
        }));
    }
    Ok(arr)
}

fn as_string(value: &Value, what: &str) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| JsonReadError::invalid_type(format!("string for {}", what)))
}

fn as_int(value: &Value, what: &str) -> Result<i64> {
    if let Some(i) = value.as_i64() {
        return Ok(i);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 => Ok(f as i64),
        _ => Err(JsonReadError::invalid_type(format!("integer for {}", what))),
    }
}

fn as_count(value: &Value, what: &str) -> Result<usize> {
    let i = as_int(value, what)?;
    usize::try_from(i)
        .map_err(|_| JsonReadError::invalid_type(format!("non-negative integer for {}", what)))
}

/// Split a `{"t": tag, "c": content}` node. Content may be absent.
fn read_tagged<'a>(value: &'a Value, what: &str) -> Result<(&'a str, Option<&'a Value>)> {
    let obj = value
        .as_object()
        .ok_or_else(|| JsonReadError::invalid_type(format!("object for {}", what)))?;
    let t = obj
        .get("t")
        .ok_or_else(|| JsonReadError::missing_field("t"))?
        .as_str()
        .ok_or_else(|| JsonReadError::invalid_type("string for t"))?;
    Ok((t, obj.get("c")))
}

fn content(c: Option<&Value>) -> Result<&Value> {
    c.ok_or_else(|| JsonReadError::missing_field("c"))
}

/// Tag of a content-less enumeration node such as `{"t": "AlignLeft"}`.
fn read_enum_tag<'a>(value: &'a Value, what: &str) -> Result<&'a str> {
    read_tagged(value, what).map(|(t, _)| t)
}

// -- attributes --

fn read_attr(value: &Value) -> Result<Attr> {
    let arr = as_tuple(value, "Attr", 3)?;

    let id = as_string(&arr[0], "Attr id").in_field("id")?;

    let classes = as_array(&arr[1], "Attr classes")
        .in_field("classes")?
        .iter()
        .enumerate()
        .map(|(idx, v)| as_string(v, "class").at_index(idx).in_field("classes"))
        .collect::<Result<Vec<_>>>()?;

    let attributes = as_array(&arr[2], "Attr key-values")
        .in_field("attributes")?
        .iter()
        .enumerate()
        .map(|(idx, v)| read_key_value(v).at_index(idx).in_field("attributes"))
        .collect::<Result<Vec<_>>>()?;

    Ok(Attr {
        id,
        classes,
        attributes,
    })
}

fn read_key_value(value: &Value) -> Result<(String, String)> {
    let kv = as_tuple(value, "Key-value pair", 2)?;
    let key = as_string(&kv[0], "key")?;
    let val = as_string(&kv[1], "value")?;
    Ok((key, val))
}

fn read_target(value: &Value) -> Result<Target> {
    let arr = as_tuple(value, "Target", 2)?;
    let url = as_string(&arr[0], "Target url")?;
    let title = as_string(&arr[1], "Target title")?;
    Ok((url, title))
}

// -- inlines --

fn read_inlines(value: &Value) -> Result<Inlines> {
    as_array(value, "inlines")?
        .iter()
        .enumerate()
        .map(|(idx, v)| read_inline(v).at_index(idx))
        .collect()
}

fn read_inline(value: &Value) -> Result<Inline> {
    let (t, c) = read_tagged(value, "Inline")?;
    match read_inline_content(t, c) {
        Err(err) if err.rejects_own_tag() => Err(err),
        result => result.in_tag(t),
    }
}

fn read_inline_content(t: &str, c: Option<&Value>) -> Result<Inline> {
    if let Some(kind) = FormatKind::from_tag(t) {
        return Ok(Inline::Formatted(Formatted {
            kind,
            content: read_inlines(content(c)?)?,
        }));
    }

    match t {
        "Str" => Ok(Inline::Str(Str {
            text: as_string(content(c)?, "Str")?,
        })),
        "Space" => Ok(Inline::Space),
        "SoftBreak" => Ok(Inline::SoftBreak),
        "LineBreak" => Ok(Inline::LineBreak),
        "Quoted" => {
            let arr = as_tuple(content(c)?, "Quoted", 2)?;
            let quote_type = match read_enum_tag(&arr[0], "QuoteType")? {
                "SingleQuote" => QuoteType::SingleQuote,
                "DoubleQuote" => QuoteType::DoubleQuote,
                other => return Err(JsonReadError::unsupported("QuoteType", other)),
            };
            Ok(Inline::Quoted(Quoted {
                quote_type,
                content: read_inlines(&arr[1])?,
            }))
        }
        "Cite" => {
            let arr = as_tuple(content(c)?, "Cite", 2)?;
            let citations = as_array(&arr[0], "citations")?
                .iter()
                .enumerate()
                .map(|(idx, v)| read_citation(v).at_index(idx))
                .collect::<Result<Vec<_>>>()
                .in_field("citations")?;
            Ok(Inline::Cite(Cite {
                citations,
                content: read_inlines(&arr[1])?,
            }))
        }
        "Code" => {
            let arr = as_tuple(content(c)?, "Code", 2)?;
            Ok(Inline::Code(Code {
                attr: read_attr(&arr[0])?,
                text: as_string(&arr[1], "Code text")?,
            }))
        }
        "Math" => {
            let arr = as_tuple(content(c)?, "Math", 2)?;
            let math_type = match read_enum_tag(&arr[0], "MathType")? {
                "InlineMath" => MathType::InlineMath,
                "DisplayMath" => MathType::DisplayMath,
                other => return Err(JsonReadError::unsupported("MathType", other)),
            };
            Ok(Inline::Math(Math {
                math_type,
                text: as_string(&arr[1], "Math text")?,
            }))
        }
        "RawInline" => {
            let arr = as_tuple(content(c)?, "RawInline", 2)?;
            Ok(Inline::RawInline(RawInline {
                format: as_string(&arr[0], "RawInline format")?,
                text: as_string(&arr[1], "RawInline text")?,
            }))
        }
        "Link" => {
            let arr = as_tuple(content(c)?, "Link", 3)?;
            Ok(Inline::Link(Link {
                attr: read_attr(&arr[0])?,
                content: read_inlines(&arr[1])?,
                target: read_target(&arr[2])?,
            }))
        }
        "Image" => {
            let arr = as_tuple(content(c)?, "Image", 3)?;
            Ok(Inline::Image(Image {
                attr: read_attr(&arr[0])?,
                content: read_inlines(&arr[1])?,
                target: read_target(&arr[2])?,
            }))
        }
        "Note" => Ok(Inline::Note(Note {
            content: read_blocks(content(c)?)?,
        })),
        "Span" => {
            let arr = as_tuple(content(c)?, "Span", 2)?;
            Ok(Inline::Span(Span {
                attr: read_attr(&arr[0])?,
                content: read_inlines(&arr[1])?,
            }))
        }
        _ => Err(JsonReadError::new(DecodeErrorKind::UnknownInline(
            t.to_string(),
        ))),
    }
}

fn read_citation(value: &Value) -> Result<Citation> {
    let obj = value
        .as_object()
        .ok_or_else(|| JsonReadError::invalid_type("object for Citation"))?;
    let field = |name: &'static str| -> Result<&Value> {
        obj.get(name).ok_or_else(|| JsonReadError::missing_field(name))
    };

    let id = as_string(field("citationId")?, "citationId").in_field("citationId")?;
    let prefix = read_inlines(field("citationPrefix")?).in_field("citationPrefix")?;
    let suffix = read_inlines(field("citationSuffix")?).in_field("citationSuffix")?;
    let mode = read_citation_mode(field("citationMode")?).in_field("citationMode")?;
    let note_num = as_int(field("citationNoteNum")?, "citationNoteNum").in_field("citationNoteNum")?;
    let hash = as_int(field("citationHash")?, "citationHash").in_field("citationHash")?;

    Ok(Citation {
        id,
        prefix,
        suffix,
        mode,
        note_num,
        hash,
    })
}

fn read_citation_mode(value: &Value) -> Result<CitationMode> {
    match read_enum_tag(value, "CitationMode")? {
        "AuthorInText" => Ok(CitationMode::AuthorInText),
        "SuppressAuthor" => Ok(CitationMode::SuppressAuthor),
        "NormalCitation" => Ok(CitationMode::NormalCitation),
        other => Err(JsonReadError::unsupported("CitationMode", other)),
    }
}

// -- blocks --

fn read_blocks(value: &Value) -> Result<Blocks> {
    let arr = as_array(value, "blocks")?;
    let mut blocks = Vec::with_capacity(arr.len());
    for (idx, v) in arr.iter().enumerate() {
        if let Some(block) = read_block(v).at_index(idx)? {
            blocks.push(block);
        }
    }
    Ok(blocks)
}

fn read_blockss(value: &Value) -> Result<Vec<Blocks>> {
    as_array(value, "list items")?
        .iter()
        .enumerate()
        .map(|(idx, v)| read_blocks(v).at_index(idx))
        .collect()
}

/// `Ok(None)` for a `Null` block.
fn read_block(value: &Value) -> Result<Option<Block>> {
    let (t, c) = read_tagged(value, "Block")?;
    if t == "Null" {
        tracing::trace!("dropping Null block");
        return Ok(None);
    }
    if t == "Figure" {
        return Err(JsonReadError::unsupported("Block", t));
    }
    match read_block_content(t, c) {
        Err(err) if err.rejects_own_tag() => Err(err),
        result => result.in_tag(t).map(Some),
    }
}

fn read_block_content(t: &str, c: Option<&Value>) -> Result<Block> {
    match t {
        "Plain" => Ok(Block::Plain(Plain {
            content: read_inlines(content(c)?)?,
        })),
        "Para" => Ok(Block::Paragraph(Paragraph {
            content: read_inlines(content(c)?)?,
        })),
        "LineBlock" => {
            let lines = as_array(content(c)?, "LineBlock")?
                .iter()
                .enumerate()
                .map(|(idx, v)| read_inlines(v).at_index(idx))
                .collect::<Result<Vec<_>>>()?;
            Ok(Block::LineBlock(LineBlock { content: lines }))
        }
        "CodeBlock" => {
            let arr = as_tuple(content(c)?, "CodeBlock", 2)?;
            Ok(Block::CodeBlock(CodeBlock {
                attr: read_attr(&arr[0])?,
                text: as_string(&arr[1], "CodeBlock text")?,
            }))
        }
        "RawBlock" => {
            let arr = as_tuple(content(c)?, "RawBlock", 2)?;
            Ok(Block::RawBlock(RawBlock {
                format: as_string(&arr[0], "RawBlock format")?,
                text: as_string(&arr[1], "RawBlock text")?,
            }))
        }
        "BlockQuote" => Ok(Block::BlockQuote(BlockQuote {
            content: read_blocks(content(c)?)?,
        })),
        "OrderedList" => {
            let arr = as_tuple(content(c)?, "OrderedList", 2)?;
            Ok(Block::OrderedList(OrderedList {
                attr: read_list_attributes(&arr[0]).in_field("ListAttributes")?,
                content: read_blockss(&arr[1])?,
            }))
        }
        "BulletList" => Ok(Block::BulletList(BulletList {
            content: read_blockss(content(c)?)?,
        })),
        "DefinitionList" => {
            let items = as_array(content(c)?, "DefinitionList")?
                .iter()
                .enumerate()
                .map(|(idx, v)| read_definition_item(v).at_index(idx))
                .collect::<Result<Vec<_>>>()?;
            Ok(Block::DefinitionList(DefinitionList { content: items }))
        }
        "Header" => {
            let arr = as_tuple(content(c)?, "Header", 3)?;
            Ok(Block::Header(Header {
                level: as_count(&arr[0], "Header level")?,
                attr: read_attr(&arr[1])?,
                content: read_inlines(&arr[2])?,
            }))
        }
        "HorizontalRule" => Ok(Block::HorizontalRule),
        "Table" => read_table(content(c)?).map(Block::Table),
        "Div" => {
            let arr = as_tuple(content(c)?, "Div", 2)?;
            Ok(Block::Div(Div {
                attr: read_attr(&arr[0])?,
                content: read_blocks(&arr[1])?,
            }))
        }
        _ => Err(JsonReadError::new(DecodeErrorKind::UnknownBlock(
            t.to_string(),
        ))),
    }
}

fn read_definition_item(value: &Value) -> Result<(Inlines, Vec<Blocks>)> {
    let arr = as_tuple(value, "DefinitionList item", 2)?;
    let term = read_inlines(&arr[0]).in_field("term")?;
    let definitions = read_blockss(&arr[1]).in_field("definitions")?;
    Ok((term, definitions))
}

fn read_list_attributes(value: &Value) -> Result<ListAttributes> {
    let arr = as_tuple(value, "ListAttributes", 3)?;

    let start = as_int(&arr[0], "ListAttributes start number")?;

    let style = match read_enum_tag(&arr[1], "ListNumberStyle")? {
        "DefaultStyle" => ListNumberStyle::Default,
        "Example" => ListNumberStyle::Example,
        "Decimal" => ListNumberStyle::Decimal,
        "LowerRoman" => ListNumberStyle::LowerRoman,
        "UpperRoman" => ListNumberStyle::UpperRoman,
        "LowerAlpha" => ListNumberStyle::LowerAlpha,
        "UpperAlpha" => ListNumberStyle::UpperAlpha,
        other => return Err(JsonReadError::unsupported("ListNumberStyle", other)),
    };

    let delim = match read_enum_tag(&arr[2], "ListNumberDelim")? {
        "DefaultDelim" => ListNumberDelim::Default,
        "Period" => ListNumberDelim::Period,
        "OneParen" => ListNumberDelim::OneParen,
        "TwoParens" => ListNumberDelim::TwoParens,
        other => return Err(JsonReadError::unsupported("ListNumberDelim", other)),
    };

    Ok(ListAttributes {
        start,
        style,
        delim,
    })
}

// -- tables --

// Table: [attr, caption, colspecs, head, bodies, foot]
fn read_table(value: &Value) -> Result<Table> {
    let arr = as_tuple(value, "Table", 6)?;

    let attr = read_attr(&arr[0])?;
    let caption = read_caption(&arr[1]).in_field("caption")?;
    let colspec = as_array(&arr[2], "colspecs")?
        .iter()
        .enumerate()
        .map(|(idx, v)| read_colspec(v).at_index(idx))
        .collect::<Result<Vec<_>>>()
        .in_field("colspecs")?;
    let head = read_table_head(&arr[3]).in_field("head")?;
    let bodies = as_array(&arr[4], "bodies")?
        .iter()
        .enumerate()
        .map(|(idx, v)| read_table_body(v).at_index(idx))
        .collect::<Result<Vec<_>>>()
        .in_field("bodies")?;
    let foot = read_table_foot(&arr[5]).in_field("foot")?;

    Ok(Table {
        attr,
        caption,
        colspec,
        head,
        bodies,
        foot,
    })
}

// Caption: [short | null, blocks]
fn read_caption(value: &Value) -> Result<Caption> {
    let arr = as_tuple(value, "Caption", 2)?;
    let short = if arr[0].is_null() {
        None
    } else {
        Some(read_inlines(&arr[0]).in_field("short")?)
    };
    let long = read_blocks(&arr[1])?;
    Ok(Caption { short, long })
}

fn read_alignment(value: &Value) -> Result<Alignment> {
    match read_enum_tag(value, "Alignment")? {
        "AlignLeft" => Ok(Alignment::Left),
        "AlignCenter" => Ok(Alignment::Center),
        "AlignRight" => Ok(Alignment::Right),
        "AlignDefault" => Ok(Alignment::Default),
        other => Err(JsonReadError::unsupported("Alignment", other)),
    }
}

fn read_colwidth(value: &Value) -> Result<ColWidth> {
    let (t, c) = read_tagged(value, "ColWidth")?;
    match t {
        "ColWidthDefault" => Ok(ColWidth::Default),
        "ColWidth" => {
            let width = content(c)?
                .as_f64()
                .ok_or_else(|| JsonReadError::invalid_type("number for ColWidth"))?;
            Ok(ColWidth::Percentage(width))
        }
        other => Err(JsonReadError::unsupported("ColWidth", other)),
    }
}

fn read_colspec(value: &Value) -> Result<ColSpec> {
    let arr = as_tuple(value, "ColSpec", 2)?;
    Ok((read_alignment(&arr[0])?, read_colwidth(&arr[1])?))
}

fn read_rows(value: &Value) -> Result<Vec<Row>> {
    as_array(value, "rows")?
        .iter()
        .enumerate()
        .map(|(idx, v)| read_row(v).at_index(idx))
        .collect()
}

// Row: [attr, cells]
fn read_row(value: &Value) -> Result<Row> {
    let arr = as_tuple(value, "Row", 2)?;
    let attr = read_attr(&arr[0])?;
    let cells = as_array(&arr[1], "cells")?
        .iter()
        .enumerate()
        .map(|(idx, v)| read_cell(v).at_index(idx))
        .collect::<Result<Vec<_>>>()?;
    Ok(Row { attr, cells })
}

// Cell: [attr, alignment, rowSpan, colSpan, blocks]
fn read_cell(value: &Value) -> Result<Cell> {
    let arr = as_tuple(value, "Cell", 5)?;
    Ok(Cell {
        attr: read_attr(&arr[0])?,
        alignment: read_alignment(&arr[1])?,
        row_span: as_count(&arr[2], "Cell row span")?,
        col_span: as_count(&arr[3], "Cell column span")?,
        content: read_blocks(&arr[4])?,
    })
}

// TableHead: [attr, rows]
fn read_table_head(value: &Value) -> Result<TableHead> {
    let arr = as_tuple(value, "TableHead", 2)?;
    Ok(TableHead {
        attr: read_attr(&arr[0])?,
        rows: read_rows(&arr[1])?,
    })
}

// TableBody: [attr, rowHeadColumns, intermediate head rows, body rows]
fn read_table_body(value: &Value) -> Result<TableBody> {
    let arr = as_tuple(value, "TableBody", 4)?;
    Ok(TableBody {
        attr: read_attr(&arr[0])?,
        rowhead_columns: as_count(&arr[1], "TableBody row head columns")?,
        head: read_rows(&arr[2]).in_field("head")?,
        body: read_rows(&arr[3]).in_field("body")?,
    })
}

// TableFoot: [attr, rows]
fn read_table_foot(value: &Value) -> Result<TableFoot> {
    let arr = as_tuple(value, "TableFoot", 2)?;
    Ok(TableFoot {
        attr: read_attr(&arr[0])?,
        rows: read_rows(&arr[1])?,
    })
}

// -- metadata --

fn read_meta(value: &Value) -> Result<Meta> {
    let obj = value
        .as_object()
        .ok_or_else(|| JsonReadError::invalid_type("object for meta"))?;

    let mut meta = Meta::new();
    for (key, v) in obj {
        match read_meta_value(v) {
            Ok(mv) => {
                meta.insert(key.clone(), mv);
            }
            Err(err) => {
                tracing::debug!(key = %key, error = %err, "skipping undecodable meta entry");
            }
        }
    }
    Ok(meta)
}

fn read_meta_value(value: &Value) -> Result<MetaValue> {
    let (t, c) = read_tagged(value, "MetaValue")?;
    read_meta_value_content(t, c).in_tag(t)
}

fn read_meta_value_content(t: &str, c: Option<&Value>) -> Result<MetaValue> {
    match t {
        "MetaString" => Ok(MetaValue::MetaString(as_string(content(c)?, "MetaString")?)),
        "MetaBool" => content(c)?
            .as_bool()
            .map(MetaValue::MetaBool)
            .ok_or_else(|| JsonReadError::invalid_type("boolean for MetaBool")),
        "MetaInlines" => Ok(MetaValue::MetaInlines(read_inlines(content(c)?)?)),
        "MetaBlocks" => Ok(MetaValue::MetaBlocks(read_blocks(content(c)?)?)),
        "MetaList" => as_array(content(c)?, "MetaList")?
            .iter()
            .enumerate()
            .map(|(idx, v)| read_meta_value(v).at_index(idx))
            .collect::<Result<Vec<_>>>()
            .map(MetaValue::MetaList),
        "MetaMap" => {
            let obj = content(c)?
                .as_object()
                .ok_or_else(|| JsonReadError::invalid_type("object for MetaMap"))?;
            let mut map = LinkedHashMap::new();
            for (key, v) in obj {
                map.insert(key.clone(), read_meta_value(v)?);
            }
            Ok(MetaValue::MetaMap(map))
        }
        other => Err(JsonReadError::unsupported("MetaValue", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(blocks: Value) -> Value {
        json!({"pandoc-api-version": [1, 23, 1], "meta": {}, "blocks": blocks})
    }

    #[test]
    fn test_read_attr() {
        let attr = read_attr(&json!(["fig", ["a", "b"], [["width", "50%"], ["k", "v"]]])).unwrap();
        assert_eq!(attr.id, "fig");
        assert_eq!(attr.classes, vec!["a", "b"]);
        assert_eq!(attr.get("width"), Some("50%"));
    }

    #[test]
    fn test_read_attr_arity() {
        let err = read_attr(&json!(["id", []])).unwrap_err();
        assert!(matches!(
            err.kind,
            DecodeErrorKind::WrongArity {
                what: "Attr",
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_null_block_is_dropped() {
        let d = decode(&doc(json!([
            {"t": "Null"},
            {"t": "HorizontalRule"},
            {"t": "Null"}
        ])))
        .unwrap();
        assert_eq!(d.blocks, vec![Block::HorizontalRule]);
        assert_eq!(d.api_version, vec![1, 23, 1]);
    }

    #[test]
    fn test_error_path_is_outermost_first() {
        let err = decode(&doc(json!([
            {"t": "Para", "c": [{"t": "Str", "c": "ok"}]},
            {"t": "BlockQuote", "c": [
                {"t": "Para", "c": [{"t": "Space"}, {"t": "Blink", "c": []}]}
            ]}
        ])))
        .unwrap_err();

        assert!(matches!(err.kind, DecodeErrorKind::UnknownInline(ref t) if t == "Blink"));
        assert_eq!(
            err.path,
            vec![
                PathSegment::Field("blocks"),
                PathSegment::Index(1),
                PathSegment::Tag("BlockQuote".to_string()),
                PathSegment::Index(0),
                PathSegment::Tag("Para".to_string()),
                PathSegment::Index(1),
            ]
        );
        assert_eq!(
            err.to_string(),
            "blocks > [1] > BlockQuote > [0] > Para > [1]: Unknown inline type: Blink"
        );
    }

    #[test]
    fn test_missing_meta_is_empty() {
        let d = decode(&json!({"blocks": [{"t": "HorizontalRule"}]})).unwrap();
        assert!(d.meta.is_empty());
        assert_eq!(d.blocks, vec![Block::HorizontalRule]);
    }

    #[test]
    fn test_missing_blocks_field() {
        let err = decode(&json!({"meta": {}})).unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::MissingField(ref f) if f == "blocks"));
    }

    #[test]
    fn test_bad_meta_entry_is_skipped() {
        let d = decode(&json!({
            "meta": {
                "title": {"t": "MetaInlines", "c": [{"t": "Str", "c": "T"}]},
                "broken": {"t": "MetaInlines", "c": [{"t": "Nope"}]},
                "flag": {"t": "MetaBool", "c": true}
            },
            "blocks": []
        }))
        .unwrap();
        assert_eq!(d.meta.len(), 2);
        assert!(d.meta.contains_key("title"));
        assert!(d.meta.contains_key("flag"));
    }

    #[test]
    fn test_header_level_must_be_non_negative() {
        let err = decode_blocks(&json!([
            {"t": "Header", "c": [-1, ["", [], []], []]}
        ]))
        .unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::InvalidType(_)));
        assert_eq!(err.path[1], PathSegment::Tag("Header".to_string()));
    }
}
