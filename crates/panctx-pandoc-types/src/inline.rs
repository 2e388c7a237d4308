/*
 * inline.rs
 * Copyright (c) 2025 Posit, PBC
 */

use crate::attr::Attr;
use crate::block::Blocks;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    Str(Str),
    /// Emph, Underline, Strong, Strikeout, Superscript, Subscript, SmallCaps
    Formatted(Formatted),
    Quoted(Quoted),
    Cite(Cite),
    Code(Code),
    Space,
    SoftBreak,
    LineBreak,
    Math(Math),
    RawInline(RawInline),
    Link(Link),
    Image(Image),
    Note(Note),
    Span(Span),
}

pub type Inlines = Vec<Inline>;

/// Which Pandoc formatting constructor a [`Formatted`] run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatKind {
    Emph,
    Underline,
    Strong,
    Strikeout,
    Superscript,
    Subscript,
    SmallCaps,
}

impl FormatKind {
    /// The Pandoc JSON tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            FormatKind::Emph => "Emph",
            FormatKind::Underline => "Underline",
            FormatKind::Strong => "Strong",
            FormatKind::Strikeout => "Strikeout",
            FormatKind::Superscript => "Superscript",
            FormatKind::Subscript => "Subscript",
            FormatKind::SmallCaps => "SmallCaps",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "Emph" => FormatKind::Emph,
            "Underline" => FormatKind::Underline,
            "Strong" => FormatKind::Strong,
            "Strikeout" => FormatKind::Strikeout,
            "Superscript" => FormatKind::Superscript,
            "Subscript" => FormatKind::Subscript,
            "SmallCaps" => FormatKind::SmallCaps,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuoteType {
    SingleQuote,
    DoubleQuote,
}

/// Link or image target: `(url, title)`.
pub type Target = (String, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MathType {
    InlineMath,
    DisplayMath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Str {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formatted {
    pub kind: FormatKind,
    pub content: Inlines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quoted {
    pub quote_type: QuoteType,
    pub content: Inlines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cite {
    pub citations: Vec<Citation>,
    pub content: Inlines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    pub attr: Attr,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Math {
    pub math_type: MathType,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInline {
    pub format: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub attr: Attr,
    pub content: Inlines,
    pub target: Target,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub attr: Attr,
    pub content: Inlines,
    pub target: Target,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub content: Blocks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub attr: Attr,
    pub content: Inlines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CitationMode {
    AuthorInText,
    SuppressAuthor,
    NormalCitation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub prefix: Inlines,
    pub suffix: Inlines,
    pub mode: CitationMode,
    pub note_num: i64,
    pub hash: i64,
}

impl Inline {
    pub fn str(text: impl Into<String>) -> Inline {
        Inline::Str(Str { text: text.into() })
    }

    /// The Pandoc JSON tag this inline was decoded from.
    pub fn tag(&self) -> &'static str {
        match self {
            Inline::Str(_) => "Str",
            Inline::Formatted(f) => f.kind.tag(),
            Inline::Quoted(_) => "Quoted",
            Inline::Cite(_) => "Cite",
            Inline::Code(_) => "Code",
            Inline::Space => "Space",
            Inline::SoftBreak => "SoftBreak",
            Inline::LineBreak => "LineBreak",
            Inline::Math(_) => "Math",
            Inline::RawInline(_) => "RawInline",
            Inline::Link(_) => "Link",
            Inline::Image(_) => "Image",
            Inline::Note(_) => "Note",
            Inline::Span(_) => "Span",
        }
    }
}
