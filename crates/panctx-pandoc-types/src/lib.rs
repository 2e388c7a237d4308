/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Pandoc AST type definitions for panctx.
 *
 * A closed model of the Pandoc document tree: every block and inline the
 * JSON reader accepts has exactly one variant here, and the ConTeXt writer
 * matches on these exhaustively. Nodes are built once by the reader and
 * read-only afterwards.
 */

pub mod attr;
pub mod block;
pub mod document;
pub mod inline;
pub mod list;
pub mod meta;
pub mod table;

pub use attr::{Attr, empty_attr};
pub use block::{
    Block, BlockQuote, Blocks, BulletList, CodeBlock, DefinitionList, Div, Header, LineBlock,
    OrderedList, Paragraph, Plain, RawBlock,
};
pub use document::Document;
pub use inline::{
    Citation, CitationMode, Cite, Code, FormatKind, Formatted, Image, Inline, Inlines, Link, Math,
    MathType, Note, QuoteType, Quoted, RawInline, Span, Str, Target,
};
pub use list::{ListAttributes, ListNumberDelim, ListNumberStyle};
pub use meta::{Meta, MetaValue};
pub use table::{
    Alignment, Caption, Cell, ColSpec, ColWidth, Row, Table, TableBody, TableFoot, TableHead,
};
