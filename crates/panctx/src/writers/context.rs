/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! ConTeXt writer for the Pandoc AST.
//!
//! The writer threads two pieces of state through the recursion in
//! [`ContextWriterContext`]:
//!
//! - the pending block separator, chosen by the block written last and
//!   emitted before the next block of the same list
//! - the forced-inline depth; while it is positive, images render as
//!   `\externalfigure` instead of a floating `\placefigure` (table cells and
//!   `combination` divs raise it)
//!
//! Nodes with no ConTeXt rendering are dropped. Each drop resets the
//! separator and records a warning diagnostic; [`render_checked`] turns
//! those warnings into an error.
//!
//! Literal text is escaped exactly once, where it enters the stream, with
//! [`escape`]. Markup produced by the writer is never escaped.

use crate::config::ContextConfig;
use panctx_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use panctx_pandoc_types::{
    Alignment, Block, CodeBlock, DefinitionList, Div, Document, FormatKind, Header, Image, Inline,
    Link, MathType, QuoteType, Row, Table,
};
use std::borrow::Cow;
use std::io::{self, Write};
use std::path::Path;

/// Separator before the next block when nothing special applies.
const PARAGRAPH_SEP: &str = "\n\n";

/// Cell separator for centered and right-aligned columns. The zero-width
/// space keeps xtable from collapsing the alignment of the first line.
const ALIGNED_CELL_SEP: &str = "\n\u{200B}";

/// Raw formats passed through verbatim.
const RAW_FORMATS: [&str; 2] = ["tex", "context"];

/// Writer state for one render call.
pub struct ContextWriterContext<'cfg, W: Write> {
    writer: W,
    config: &'cfg ContextConfig,
    block_sep: &'static str,
    force_inline: usize,
    diagnostics: Vec<DiagnosticMessage>,
}

impl<'cfg, W: Write> ContextWriterContext<'cfg, W> {
    pub fn new(writer: W, config: &'cfg ContextConfig) -> Self {
        Self {
            writer,
            config,
            block_sep: "",
            force_inline: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        &self.diagnostics
    }

    /// Give back the underlying writer and the collected diagnostics.
    pub fn into_parts(self) -> (W, Vec<DiagnosticMessage>) {
        (self.writer, self.diagnostics)
    }

    fn wr(&mut self, s: &str) -> io::Result<()> {
        self.writer.write_all(s.as_bytes())
    }

    fn write_pending_separator(&mut self) -> io::Result<()> {
        let sep = self.block_sep;
        self.wr(sep)
    }

    fn warn_dropped_node(&mut self, node: &str, reason: &str) {
        tracing::debug!(node, reason, "dropping node from ConTeXt output");
        let diag = DiagnosticMessageBuilder::warning(format!(
            "Node dropped in ConTeXt output: {}",
            node
        ))
        .problem(reason)
        .build();
        self.diagnostics.push(diag);
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Render blocks and return the text together with the dropped-node
/// warnings.
pub fn render_with_diagnostics(
    blocks: &[Block],
    config: &ContextConfig,
) -> (String, Vec<DiagnosticMessage>) {
    let mut ctx = ContextWriterContext::new(Vec::new(), config);
    if let Err(err) = write_blocks(blocks, &mut ctx) {
        tracing::warn!(error = %err, "ConTeXt output is incomplete");
    }
    let (bytes, diagnostics) = ctx.into_parts();
    (String::from_utf8_lossy(&bytes).into_owned(), diagnostics)
}

/// Render blocks to ConTeXt markup. Unsupported nodes are dropped.
///
/// ```
/// use panctx::config::ContextConfig;
/// use panctx::writers::context::render;
/// use panctx_pandoc_types::{Block, Inline, Paragraph};
///
/// let blocks = vec![
///     Block::Paragraph(Paragraph { content: vec![Inline::str("50%")] }),
///     Block::HorizontalRule,
/// ];
/// let text = render(&blocks, &ContextConfig::default());
/// assert_eq!(text, "50\\letterpercent{}\n\n\\thinrule");
/// ```
pub fn render(blocks: &[Block], config: &ContextConfig) -> String {
    render_with_diagnostics(blocks, config).0
}

/// Render a whole document. Dropped nodes are logged, at warn level when
/// `config.strict` is set.
pub fn render_document(document: &Document, config: &ContextConfig) -> String {
    let (text, diagnostics) = render_with_diagnostics(&document.blocks, config);
    for diag in &diagnostics {
        if config.strict {
            tracing::warn!(title = %diag.title, "ConTeXt writer dropped content");
        } else {
            tracing::debug!(title = %diag.title, "ConTeXt writer dropped content");
        }
    }
    text
}

/// Render blocks, failing with the collected warnings if any node was
/// dropped.
pub fn render_checked(
    blocks: &[Block],
    config: &ContextConfig,
) -> Result<String, Vec<DiagnosticMessage>> {
    let (text, diagnostics) = render_with_diagnostics(blocks, config);
    if diagnostics.is_empty() {
        Ok(text)
    } else {
        Err(diagnostics)
    }
}

// ============================================================================
// Escaping
// ============================================================================

const ESCAPED_CHARS: [char; 8] = ['#', '$', '%', '&', '\\', '{', '}', '~'];

/// Characters that make inline code render with `\mono` instead of `\type`.
const CODE_TRIGGER_CHARS: [char; 7] = ['\\', '~', '%', '$', '#', '{', '}'];

/// Escape literal text for ConTeXt.
///
/// `%` and `\` become `\letterpercent{}` and `\letterbackslash{}`; the
/// other special characters get a backslash prefix.
///
/// ```
/// use panctx::writers::context::escape;
///
/// assert_eq!(escape("a & b"), "a \\& b");
/// assert_eq!(escape("plain"), "plain");
/// ```
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| ESCAPED_CHARS.contains(&c)) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '#' => out.push_str("\\#"),
            '$' => out.push_str("\\$"),
            '%' => out.push_str("\\letterpercent{}"),
            '&' => out.push_str("\\&"),
            '\\' => out.push_str("\\letterbackslash{}"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '~' => out.push_str("\\~"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Flatten inlines to escaped text, keeping only quotes as markup.
///
/// Used for link labels, where the rendered text decides between a
/// cross-reference and a hyperlink.
pub fn flatten_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    flatten_into(inlines, &mut out);
    out
}

fn flatten_into(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Space => out.push(' '),
            Inline::SoftBreak | Inline::LineBreak => out.push('\n'),
            Inline::Str(s) => out.push_str(&escape(&s.text)),
            Inline::Formatted(f) => flatten_into(&f.content, out),
            Inline::Quoted(q) => {
                out.push_str(quote_open(q.quote_type));
                flatten_into(&q.content, out);
                out.push('}');
            }
            Inline::RawInline(raw) => out.push_str(&raw.text),
            _ => {}
        }
    }
}

fn is_target_format(format: &str) -> bool {
    RAW_FORMATS.contains(&format)
}

// ============================================================================
// Block writing
// ============================================================================

/// Write blocks, emitting the pending separator before each one.
pub fn write_blocks<W: Write>(
    blocks: &[Block],
    ctx: &mut ContextWriterContext<'_, W>,
) -> io::Result<()> {
    for block in blocks {
        ctx.write_pending_separator()?;
        write_block(block, ctx)?;
    }
    Ok(())
}

fn write_block<W: Write>(block: &Block, ctx: &mut ContextWriterContext<'_, W>) -> io::Result<()> {
    match block {
        Block::Plain(plain) => {
            write_inlines(&plain.content, ctx)?;
            ctx.block_sep = PARAGRAPH_SEP;
        }
        Block::Paragraph(para) => {
            write_inlines(&para.content, ctx)?;
            ctx.block_sep = PARAGRAPH_SEP;
        }
        Block::LineBlock(line_block) => {
            for (i, line) in line_block.content.iter().enumerate() {
                if i > 0 {
                    ctx.wr("\n")?;
                }
                write_inlines(line, ctx)?;
            }
            ctx.block_sep = PARAGRAPH_SEP;
        }
        Block::CodeBlock(code) => {
            write_code_block(code, ctx)?;
            ctx.block_sep = PARAGRAPH_SEP;
        }
        Block::RawBlock(raw) => {
            if is_target_format(&raw.format) {
                ctx.wr(&raw.text)?;
                ctx.block_sep = PARAGRAPH_SEP;
            } else {
                ctx.warn_dropped_node(
                    "RawBlock",
                    &format!("raw `{}` content is not passed to ConTeXt", raw.format),
                );
                ctx.block_sep = "";
            }
        }
        Block::BlockQuote(quote) => {
            if !write_admonition(&quote.content, ctx)? {
                ctx.wr("\\startblockquote")?;
                ctx.block_sep = "\n";
                write_blocks(&quote.content, ctx)?;
                ctx.wr("\n\\stopblockquote")?;
            }
            ctx.block_sep = PARAGRAPH_SEP;
        }
        Block::OrderedList(list) => {
            write_itemize("\\startitemize[n,packed][stopper=.]", &list.content, ctx)?;
        }
        Block::BulletList(list) => {
            write_itemize("\\startitemize", &list.content, ctx)?;
        }
        Block::DefinitionList(list) => write_definition_list(list, ctx)?,
        Block::Header(header) => {
            write_header(header, ctx)?;
            ctx.block_sep = PARAGRAPH_SEP;
        }
        Block::HorizontalRule => {
            ctx.wr("\\thinrule")?;
            ctx.block_sep = PARAGRAPH_SEP;
        }
        Block::Table(table) => {
            write_table(table, ctx)?;
            ctx.block_sep = PARAGRAPH_SEP;
        }
        Block::Div(div) => {
            write_div(div, ctx)?;
            ctx.block_sep = PARAGRAPH_SEP;
        }
    }
    Ok(())
}

fn write_code_block<W: Write>(
    code: &CodeBlock,
    ctx: &mut ContextWriterContext<'_, W>,
) -> io::Result<()> {
    ctx.wr("\\starttyping")?;
    if let Some(lang) = code.attr.classes.first() {
        ctx.wr("[option=")?;
        ctx.wr(lang)?;
        ctx.wr("]")?;
    }
    ctx.wr("\n")?;
    ctx.wr(&code.text)?;
    ctx.wr("\n\\stoptyping")
}

fn write_itemize<W: Write>(
    open: &str,
    items: &[Vec<Block>],
    ctx: &mut ContextWriterContext<'_, W>,
) -> io::Result<()> {
    ctx.wr(open)?;
    for item in items {
        ctx.wr("\n\\item\n")?;
        ctx.block_sep = "";
        write_blocks(item, ctx)?;
    }
    ctx.wr("\n\\stopitemize")?;
    ctx.block_sep = PARAGRAPH_SEP;
    Ok(())
}

fn write_definition_list<W: Write>(
    list: &DefinitionList,
    ctx: &mut ContextWriterContext<'_, W>,
) -> io::Result<()> {
    for (i, (term, definitions)) in list.content.iter().enumerate() {
        if i > 0 {
            ctx.wr("\n\n")?;
        }
        ctx.wr("\\startdescription{")?;
        write_inlines(term, ctx)?;
        ctx.wr("}")?;
        ctx.block_sep = "\n";
        for definition in definitions {
            write_blocks(definition, ctx)?;
        }
        ctx.wr("\n\\stopdescription")?;
        ctx.block_sep = PARAGRAPH_SEP;
    }
    Ok(())
}

/// Division command for a heading, or `None` when the shifted level falls
/// outside 1..=10.
///
/// 1 is `\part`, 2 is `\chapter`, 3 is `\section`, and each further level
/// adds one `sub` prefix.
pub fn heading_command(level: usize, top_level_offset: usize) -> Option<String> {
    match level + top_level_offset {
        1 => Some("\\part".to_string()),
        2 => Some("\\chapter".to_string()),
        effective @ 3..=10 => Some(format!("\\{}section", "sub".repeat(effective - 3))),
        _ => None,
    }
}

fn write_header<W: Write>(header: &Header, ctx: &mut ContextWriterContext<'_, W>) -> io::Result<()> {
    let offset = ctx.config.top_level_offset();
    let Some(command) = heading_command(header.level, offset) else {
        tracing::debug!(
            level = header.level,
            offset,
            "heading level out of range, writing its text only"
        );
        return write_inlines(&header.content, ctx);
    };

    ctx.wr(&command)?;
    if !header.attr.id.is_empty() {
        ctx.wr("[")?;
        ctx.wr(&header.attr.id)?;
        ctx.wr("]")?;
    }
    ctx.wr("{")?;
    write_inlines(&header.content, ctx)?;
    ctx.wr("}")
}

// ============================================================================
// Admonitions
// ============================================================================

struct Admonition {
    env: &'static str,
    title: &'static str,
    icon: &'static str,
    color: &'static str,
}

fn admonition_for(kind: &str) -> Option<Admonition> {
    let (env, title) = match kind.to_ascii_uppercase().as_str() {
        "NOTE" => ("NOTE", "Note"),
        "TIP" => ("TIP", "Tip"),
        "IMPORTANT" => ("IMPORTANT", "Important"),
        "WARNING" => ("WARNING", "Warning"),
        "CAUTION" => ("CAUTION", "Caution"),
        _ => return None,
    };
    let (icon, color) = match env {
        "NOTE" => ("\\NoteIcon", "AlertNoteColor"),
        "TIP" => ("\\TipIcon", "AlertTipColor"),
        "IMPORTANT" => ("\\ImportantIcon", "AlertImportantColor"),
        "WARNING" => ("\\WarningIcon", "AlertWarningColor"),
        _ => ("\\CautionIcon", "AlertCautionColor"),
    };
    Some(Admonition {
        env,
        title,
        icon,
        color,
    })
}

/// The `[!KIND]` marker text of an inline: a bare Str, or a Strong run
/// whose only content is that Str.
fn marker_text(inline: &Inline) -> Option<&str> {
    match inline {
        Inline::Str(s) => Some(&s.text),
        Inline::Formatted(f) if f.kind == FormatKind::Strong => match f.content.as_slice() {
            [Inline::Str(s)] => Some(&s.text),
            _ => None,
        },
        _ => None,
    }
}

/// Write a blockquote as a callout if its first paragraph starts with an
/// admonition marker. Returns false, having written nothing, otherwise.
fn write_admonition<W: Write>(
    blocks: &[Block],
    ctx: &mut ContextWriterContext<'_, W>,
) -> io::Result<bool> {
    let Some(Block::Paragraph(para)) = blocks.first() else {
        return Ok(false);
    };
    let Some(first) = para.content.first() else {
        return Ok(false);
    };
    let Some(admonition) = marker_text(first)
        .and_then(|text| text.strip_prefix("[!"))
        .and_then(|text| text.strip_suffix(']'))
        .and_then(admonition_for)
    else {
        return Ok(false);
    };

    ctx.wr("\\start")?;
    ctx.wr(admonition.env)?;
    ctx.wr(&format!(
        "{{\\color[{}]{{{}\\space\\raise1.5pt\\hbox{{\\ss\\bf {}}}}}}}",
        admonition.color, admonition.icon, admonition.title
    ))?;
    ctx.wr("\n\\blank[small]\n")?;

    if para.content.len() > 1 {
        ctx.block_sep = "\n";
        write_inlines(&para.content[1..], ctx)?;
    }
    if blocks.len() > 1 {
        ctx.block_sep = "\n";
        write_blocks(&blocks[1..], ctx)?;
    }

    ctx.wr("\n\\stop")?;
    ctx.wr(admonition.env)?;
    Ok(true)
}

// ============================================================================
// Tables
// ============================================================================

fn write_table<W: Write>(table: &Table, ctx: &mut ContextWriterContext<'_, W>) -> io::Result<()> {
    ctx.wr("\\startplacetable[")?;
    if table.caption.long.is_empty() {
        ctx.wr("location={here,none}")?;
    } else {
        ctx.wr("title={")?;
        ctx.block_sep = "";
        write_blocks(&table.caption.long, ctx)?;
        ctx.wr("}")?;
    }
    ctx.wr("]")?;

    ctx.force_inline += 1;
    ctx.wr("\n\\startxtable")?;

    if !table.head.rows.is_empty() {
        ctx.wr("\n\\startxtablehead")?;
        for row in &table.head.rows {
            ctx.wr("\n")?;
            write_row(table, row, "head", ctx)?;
        }
        ctx.wr("\n\\stopxtablehead")?;
    }

    // Only the last ordinary row of the last body group is styled "lastbody".
    let last_group = table.bodies.len().saturating_sub(1);
    for (j, body) in table.bodies.iter().enumerate() {
        ctx.wr("\n\\startxtablebody")?;
        for row in &body.head {
            ctx.wr("\n")?;
            write_row(table, row, "head", ctx)?;
        }
        let last_row = body.body.len().saturating_sub(1);
        for (i, row) in body.body.iter().enumerate() {
            let style = if j == last_group && i == last_row {
                "lastbody"
            } else {
                "body"
            };
            ctx.wr("\n")?;
            write_row(table, row, style, ctx)?;
        }
        ctx.wr("\n\\stopxtablebody")?;
    }

    if !table.foot.rows.is_empty() {
        ctx.wr("\n\\startxtablefoot")?;
        for row in &table.foot.rows {
            ctx.wr("\n")?;
            write_row(table, row, "foot", ctx)?;
        }
        ctx.wr("\n\\stopxtablefoot")?;
    }

    ctx.wr("\n\\stopxtable")?;
    ctx.force_inline -= 1;
    ctx.wr("\n\\stopplacetable")
}

fn write_row<W: Write>(
    table: &Table,
    row: &Row,
    style: &str,
    ctx: &mut ContextWriterContext<'_, W>,
) -> io::Result<()> {
    ctx.wr("\\startxrow[")?;
    ctx.wr(style)?;
    ctx.wr("]")?;
    for (i, cell) in row.cells.iter().enumerate() {
        let (options, sep) = match table.colspec.get(i).map(|(align, _)| *align) {
            Some(Alignment::Center) => ("[align=center]", ALIGNED_CELL_SEP),
            Some(Alignment::Right) => ("[align=flushright]", ALIGNED_CELL_SEP),
            _ => ("", "\n"),
        };
        ctx.wr("\n\\startxcell")?;
        ctx.wr(options)?;
        ctx.block_sep = sep;
        write_blocks(&cell.content, ctx)?;
        ctx.wr("\n\\stopxcell")?;
    }
    ctx.wr("\n\\stopxrow")
}

// ============================================================================
// Divs
// ============================================================================

fn write_div<W: Write>(div: &Div, ctx: &mut ContextWriterContext<'_, W>) -> io::Result<()> {
    let kv = div.attr.keyval_map();
    let non_empty = |key: &str| kv.get(key).copied().filter(|v| !v.is_empty());
    ctx.block_sep = "";

    let narrower = non_empty("narrower");
    if let Some(middle) = narrower {
        ctx.wr("\\startnarrow[middle=")?;
        ctx.wr(middle)?;
        ctx.wr("]\n")?;
    }

    if div.attr.has_class("HSTACK") {
        write_hstack(&div.content, ctx)?;
    } else if let Some(layout) = non_empty("combination") {
        ctx.wr("\\startcombination[")?;
        ctx.wr(layout)?;
        ctx.wr("]")?;
        ctx.block_sep = "\n";
        ctx.force_inline += 1;
        write_blocks(&div.content, ctx)?;
        ctx.force_inline -= 1;
        ctx.wr("\n\\stopcombination")?;
    } else if let Some(columns) = non_empty("columns") {
        ctx.wr("\\startcolumns[")?;
        ctx.wr(columns)?;
        ctx.wr("]")?;
        ctx.block_sep = "\n";
        write_blocks(&div.content, ctx)?;
        ctx.wr("\n\\stopcolumns")?;
    } else {
        write_blocks(&div.content, ctx)?;
    }

    if narrower.is_some() {
        ctx.wr("\n\\stopnarrow")?;
    }
    Ok(())
}

/// Lay children out side by side in a one-row xtable. A HorizontalRule
/// child starts the next cell.
fn write_hstack<W: Write>(blocks: &[Block], ctx: &mut ContextWriterContext<'_, W>) -> io::Result<()> {
    ctx.wr("\\startxtable\\startxrow\\startxcell")?;
    ctx.block_sep = "\n";
    for block in blocks {
        if matches!(block, Block::HorizontalRule) {
            ctx.wr("\n\\stopxcell\\startxcell")?;
            ctx.block_sep = "\n";
            continue;
        }
        ctx.write_pending_separator()?;
        write_block(block, ctx)?;
    }
    ctx.wr("\n\\stopxcell\\stopxrow\\stopxtable")
}

// ============================================================================
// Inline writing
// ============================================================================

fn format_open(kind: FormatKind) -> &'static str {
    match kind {
        FormatKind::Emph => "{\\em ",
        FormatKind::Underline => "\\underbar{",
        FormatKind::Strong => "{\\bf ",
        FormatKind::Strikeout => "\\overstrike{",
        FormatKind::Superscript => "\\high{",
        FormatKind::Subscript => "\\low{",
        FormatKind::SmallCaps => "{\\sc ",
    }
}

fn quote_open(quote_type: QuoteType) -> &'static str {
    match quote_type {
        QuoteType::SingleQuote => "\\quote{",
        QuoteType::DoubleQuote => "\\quotation{",
    }
}

pub fn write_inlines<W: Write>(
    inlines: &[Inline],
    ctx: &mut ContextWriterContext<'_, W>,
) -> io::Result<()> {
    for inline in inlines {
        write_inline(inline, ctx)?;
    }
    Ok(())
}

fn write_inline<W: Write>(inline: &Inline, ctx: &mut ContextWriterContext<'_, W>) -> io::Result<()> {
    match inline {
        Inline::Space => ctx.wr(" ")?,
        Inline::SoftBreak => ctx.wr("\n")?,
        Inline::LineBreak => ctx.wr("\\crlf\n")?,
        Inline::Str(s) => ctx.wr(&escape(&s.text))?,
        Inline::Formatted(f) => {
            ctx.wr(format_open(f.kind))?;
            write_inlines(&f.content, ctx)?;
            ctx.wr("}")?;
        }
        Inline::Quoted(q) => {
            ctx.wr(quote_open(q.quote_type))?;
            write_inlines(&q.content, ctx)?;
            ctx.wr("}")?;
        }
        Inline::Code(code) => {
            if code.text.chars().any(|c| CODE_TRIGGER_CHARS.contains(&c)) {
                ctx.wr("\\mono{")?;
                ctx.wr(&escape(&code.text))?;
            } else {
                ctx.wr("\\type{")?;
                ctx.wr(&code.text)?;
            }
            ctx.wr("}")?;
        }
        Inline::Math(math) => match math.math_type {
            MathType::DisplayMath => {
                ctx.wr("\\startformula ")?;
                ctx.wr(&math.text)?;
                ctx.wr(" \\stopformula")?;
            }
            MathType::InlineMath => {
                ctx.wr("$")?;
                ctx.wr(&math.text)?;
                ctx.wr("$")?;
            }
        },
        Inline::RawInline(raw) => {
            if is_target_format(&raw.format) {
                ctx.wr(&raw.text)?;
            } else {
                ctx.warn_dropped_node(
                    "RawInline",
                    &format!("raw `{}` content is not passed to ConTeXt", raw.format),
                );
            }
        }
        Inline::Image(image) => {
            let inline_placement = image
                .attr
                .keyval_map()
                .get("placement")
                .is_some_and(|p| *p == "inline");
            if inline_placement || ctx.force_inline > 0 {
                write_external_figure(image, ctx)?;
            } else {
                write_place_figure(image, ctx)?;
            }
        }
        Inline::Link(link) => write_link(link, ctx)?,
        Inline::Cite(_) => {
            ctx.warn_dropped_node("Cite", "citations have no ConTeXt rendering")
        }
        Inline::Note(_) => ctx.warn_dropped_node("Note", "footnotes have no ConTeXt rendering"),
        Inline::Span(_) => ctx.warn_dropped_node("Span", "spans have no ConTeXt rendering"),
    }
    Ok(())
}

/// A link whose label ends in `#` is an internal cross-reference
/// (`\in{label}[target]`); anything else is a hyperlink (`\goto`).
fn write_link<W: Write>(link: &Link, ctx: &mut ContextWriterContext<'_, W>) -> io::Result<()> {
    let url = &link.target.0;
    let target = url.strip_prefix('#').unwrap_or(url);

    let label = flatten_inlines(&link.content);
    if let Some(label) = label.strip_suffix("\\#") {
        ctx.wr("\\in{")?;
        ctx.wr(label)?;
        ctx.wr("}[")?;
        ctx.wr(target)?;
        return ctx.wr("]");
    }

    ctx.wr("\\goto{")?;
    write_inlines(&link.content, ctx)?;
    ctx.wr("}[url(")?;
    ctx.wr(target)?;
    ctx.wr(")]")
}

// ============================================================================
// Images
// ============================================================================

const SIZE_UNITS: [&str; 8] = ["%", "px", "cm", "mm", "in", "inch", "pt", "em"];

/// Parse a `<number><unit>` size into an `\externalfigure` dimension.
///
/// Percentages become a fraction of `relative_to` (`\textwidth` or
/// `\textheight`) and `inch` is written as `in`. A size without a known
/// unit keeps the bare number. Returns `None` when the number does not
/// parse.
pub fn parse_dimension(size: &str, relative_to: &str) -> Option<String> {
    let (number, unit) = SIZE_UNITS
        .iter()
        .find_map(|unit| size.strip_suffix(unit).map(|n| (n, *unit)))
        .unwrap_or((size, ""));

    let mut value: f64 = number.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let unit = match unit {
        "%" => {
            value /= 100.0;
            relative_to
        }
        "inch" => "in",
        other => other,
    };
    Some(format!("{:.6}{}", value, unit))
}

fn is_vector_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

fn write_external_figure<W: Write>(
    image: &Image,
    ctx: &mut ContextWriterContext<'_, W>,
) -> io::Result<()> {
    let path = ctx.config.resolve_image_path(&image.target.0);
    let kv = image.attr.keyval_map();
    let non_empty = |key: &str| kv.get(key).copied().filter(|v| !v.is_empty());

    let offsets: Vec<String> = [("x", non_empty("dx")), ("y", non_empty("dy"))]
        .into_iter()
        .filter_map(|(axis, value)| value.map(|v| format!("{}={}", axis, v)))
        .collect();
    if !offsets.is_empty() {
        ctx.wr("\\offset[")?;
        ctx.wr(&offsets.join(","))?;
        ctx.wr("]")?;
    }

    ctx.wr("{\\externalfigure[")?;
    ctx.wr(&path)?;
    ctx.wr("]")?;

    let mut options = vec!["conversion=mp".to_string()];
    let mut has_size = false;
    for (key, relative_to) in [("width", "\\textwidth"), ("height", "\\textheight")] {
        let Some(size) = non_empty(key) else {
            continue;
        };
        has_size = true;
        match parse_dimension(size, relative_to) {
            Some(dimension) => options.push(format!("{}={}", key, dimension)),
            None => tracing::debug!(key, size, "ignoring unparseable image size"),
        }
    }
    if !has_size && !is_vector_path(&path) {
        if let Some(default_size) = ctx.config.default_figure_size.as_deref() {
            if !default_size.is_empty() {
                options.push(default_size.to_string());
            }
        }
    }

    ctx.wr("[")?;
    ctx.wr(&options.join(","))?;
    ctx.wr("]}")
}

fn write_place_figure<W: Write>(
    image: &Image,
    ctx: &mut ContextWriterContext<'_, W>,
) -> io::Result<()> {
    let kv = image.attr.keyval_map();
    let mut options: Vec<&str> = Vec::new();
    if image.content.is_empty() {
        options.push("none");
    }
    if let Some(extra) = kv.get("options").copied().filter(|v| !v.is_empty()) {
        options.extend(extra.split(','));
    }

    ctx.wr("\\placefigure[")?;
    ctx.wr(&options.join(","))?;
    ctx.wr("][")?;
    ctx.wr(&image.attr.id)?;
    ctx.wr("]{")?;
    write_inlines(&image.content, ctx)?;
    ctx.wr("}")?;

    write_external_figure(image, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use panctx_pandoc_types::{Attr, BlockQuote, Formatted, Paragraph, Plain};
    use proptest::prelude::*;

    fn para(inlines: Vec<Inline>) -> Block {
        Block::Paragraph(Paragraph { content: inlines })
    }

    #[test]
    fn test_escape_all_trigger_classes() {
        assert_eq!(
            escape("100% $5 {x}\\y"),
            "100\\letterpercent{} \\$5 \\{x\\}\\letterbackslash{}y"
        );
        assert_eq!(escape("#&~"), "\\#\\&\\~");
    }

    #[test]
    fn test_escape_leaves_plain_text_borrowed() {
        assert!(matches!(escape("Hello, world 42"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_heading_command() {
        assert_eq!(heading_command(1, 0).as_deref(), Some("\\part"));
        assert_eq!(heading_command(1, 1).as_deref(), Some("\\chapter"));
        assert_eq!(heading_command(1, 2).as_deref(), Some("\\section"));
        assert_eq!(heading_command(3, 2).as_deref(), Some("\\subsubsection"));
        assert_eq!(
            heading_command(8, 2).as_deref(),
            Some("\\subsubsubsubsubsubsubsection")
        );
        assert_eq!(heading_command(9, 2), None);
        assert_eq!(heading_command(0, 0), None);
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(
            parse_dimension("50%", "\\textwidth").as_deref(),
            Some("0.500000\\textwidth")
        );
        assert_eq!(
            parse_dimension("2inch", "\\textwidth").as_deref(),
            Some("2.000000in")
        );
        assert_eq!(
            parse_dimension("3.5cm", "\\textwidth").as_deref(),
            Some("3.500000cm")
        );
        assert_eq!(
            parse_dimension("120", "\\textheight").as_deref(),
            Some("120.000000")
        );
        assert_eq!(parse_dimension("wide", "\\textwidth"), None);
    }

    #[test]
    fn test_flatten_inlines() {
        let inlines = vec![
            Inline::str("a&b"),
            Inline::Space,
            Inline::Formatted(Formatted {
                kind: FormatKind::Emph,
                content: vec![Inline::str("c")],
            }),
            Inline::SoftBreak,
            Inline::str("d#"),
        ];
        assert_eq!(flatten_inlines(&inlines), "a\\&b c\nd\\#");
    }

    #[test]
    fn test_separator_between_blocks() {
        let blocks = vec![
            para(vec![Inline::str("one")]),
            Block::Plain(Plain {
                content: vec![Inline::str("two")],
            }),
        ];
        assert_eq!(render(&blocks, &ContextConfig::default()), "one\n\ntwo");
    }

    #[test]
    fn test_dropped_node_resets_separator() {
        let blocks = vec![
            para(vec![Inline::str("a")]),
            Block::RawBlock(panctx_pandoc_types::RawBlock {
                format: "html".to_string(),
                text: "<hr>".to_string(),
            }),
            para(vec![Inline::str("b")]),
        ];
        let (text, diagnostics) = render_with_diagnostics(&blocks, &ContextConfig::default());
        assert_eq!(text, "a\n\nb");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].title.contains("RawBlock"));
    }

    #[test]
    fn test_malformed_admonition_falls_back() {
        let blocks = vec![Block::BlockQuote(BlockQuote {
            content: vec![para(vec![Inline::str("[!NOPE]")])],
        })];
        assert_eq!(
            render(&blocks, &ContextConfig::default()),
            "\\startblockquote\n[!NOPE]\n\\stopblockquote"
        );
    }

    #[test]
    fn test_force_inline_restored_after_combination() {
        let config = ContextConfig::default();
        let mut ctx = ContextWriterContext::new(Vec::new(), &config);
        let div = Block::Div(Div {
            attr: Attr::new("", vec![], vec![("combination".into(), "2*1".into())]),
            content: vec![],
        });
        write_blocks(&[div], &mut ctx).unwrap();
        assert_eq!(ctx.force_inline, 0);
    }

    proptest! {
        #[test]
        fn escape_output_has_no_bare_specials(text in "[a-z0-9 #$%&{}~\\\\]{0,24}") {
            let escaped = escape(&text);
            let mut prev = None;
            for c in escaped.chars() {
                if matches!(c, '#' | '$' | '&' | '~' | '%') {
                    prop_assert_eq!(prev, Some('\\'));
                }
                prev = Some(c);
            }
            if !text.chars().any(|c| ESCAPED_CHARS.contains(&c)) {
                prop_assert_eq!(&*escaped, text.as_str());
            }
        }
    }
}
