//! # Target Renderer
//!
//! Renders blocks as target markup. Used for inserted blocks, whole-element
//! replacements and the re-rendered blocks of rehydration.
//!
//! ## Key Invariants
//!
//! - Block heading level `N` renders as `h{N-1}`, clamped to 1..=6.
//! - Structural blocks render as the empty string.
//! - Rendering never fails; unknown input passes through verbatim.

pub mod inline;
pub mod list;

use std::sync::OnceLock;

use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::Regex;

use crate::blocks::kinds::{BlockQuote, Callout, CodeFence, Table, basename};
use crate::blocks::{Block, BlockKind, StructuralKind};
use crate::text::patterns;

pub use inline::{render_heading_inline, render_inline};
pub use list::{render_list, render_list_inner};

/// Document-level facts that affect how single blocks render.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// The front-matter `title`, if any.
    pub title: Option<String>,
}

impl RenderContext {
    pub fn for_blocks(blocks: &[Block]) -> Self {
        let title = blocks
            .iter()
            .find(|b| b.kind == BlockKind::Structural(StructuralKind::FrontMatter))
            .and_then(|b| front_matter_title(&b.text));
        Self { title }
    }
}

/// The `title` field of a front-matter block.
pub fn front_matter_title(text: &str) -> Option<String> {
    let body = text.trim().strip_prefix("---")?.strip_suffix("---")?;
    let value: serde_yaml::Value = serde_yaml::from_str(body).ok()?;
    value
        .get("title")
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Renders a whole document.
pub fn render_document(blocks: &[Block]) -> String {
    let ctx = RenderContext::for_blocks(blocks);
    blocks.iter().map(|b| render_block(b, &ctx)).collect()
}

/// Renders one block.
pub fn render_block(block: &Block, ctx: &RenderContext) -> String {
    match block.kind {
        BlockKind::Structural(_) => String::new(),
        BlockKind::Heading => render_heading(block, ctx),
        BlockKind::Paragraph => render_paragraph(&block.text),
        BlockKind::Code => render_code(block),
        BlockKind::List => render_list(&block.text),
        BlockKind::Table => render_table(&block.text),
        BlockKind::Callout => render_callout(block, ctx),
        BlockKind::Figure => render_figure(block),
        BlockKind::Rule => "<hr />".to_string(),
        BlockKind::BlockQuote => render_blockquote(&block.text),
        BlockKind::RawMarkup => render_raw(&block.text),
    }
}

/// Target heading tag for a block heading level.
pub fn heading_tag(level: u8) -> String {
    format!("h{}", level.saturating_sub(1).clamp(1, 6))
}

fn render_heading(block: &Block, ctx: &RenderContext) -> String {
    let Some(caps) = patterns::heading().captures(block.text.trim()) else {
        return String::new();
    };
    let text = caps[2].trim();
    if block.level == 1 && ctx.title.as_deref() == Some(text) {
        return String::new();
    }
    let tag = heading_tag(block.level);
    format!("<{tag}>{}</{tag}>", render_heading_inline(&caps[2]))
}

/// Paragraph lines are trimmed and joined by a space.
pub fn paragraph_text(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_paragraph(content: &str) -> String {
    let text = paragraph_text(content);
    if text.is_empty() {
        return "<p />".to_string();
    }
    format!("<p>{}</p>", render_inline(&text))
}

fn render_code(block: &Block) -> String {
    let mut out = String::from("<ac:structured-macro ac:name=\"code\">");
    if !block.language.is_empty() {
        out.push_str(&format!(
            "<ac:parameter ac:name=\"language\">{}</ac:parameter>",
            block.language
        ));
    }
    out.push_str(&format!(
        "<ac:plain-text-body><![CDATA[{}]]></ac:plain-text-body></ac:structured-macro>",
        CodeFence::body(&block.text)
    ));
    out
}

fn render_table(content: &str) -> String {
    let lines: Vec<&str> = content.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() < 2 {
        return format!("<p>{}</p>", render_inline(content.trim()));
    }
    let row = |line: &str, cell_tag: &str| -> String {
        let cells: String = Table::cells(line)
            .into_iter()
            .map(|c| format!("<{cell_tag}><p>{}</p></{cell_tag}>", render_inline(c)))
            .collect();
        format!("<tr>{cells}</tr>")
    };
    let mut out = String::from("<table><tbody>");
    out.push_str(&row(lines[0], "th"));
    for line in &lines[2..] {
        out.push_str(&row(line, "td"));
    }
    out.push_str("</tbody></table>");
    out
}

fn render_callout(block: &Block, ctx: &RenderContext) -> String {
    let emoji = block.attribute("emoji").unwrap_or_default().trim();
    let kind = block.attribute("type").unwrap_or("default").trim().to_lowercase();
    let macro_name = if emoji.is_empty() {
        Callout::macro_name(&kind)
    } else {
        "panel"
    };
    let body: String = block
        .content_children()
        .map(|child| render_block(child, ctx))
        .collect();

    let mut out = format!("<ac:structured-macro ac:name=\"{macro_name}\">");
    if !emoji.is_empty() {
        out.push_str(&format!(
            "<ac:parameter ac:name=\"panelIcon\">{}</ac:parameter>",
            encode_text(emoji)
        ));
    }
    out.push_str(&format!(
        "<ac:rich-text-body>{body}</ac:rich-text-body></ac:structured-macro>"
    ));
    out
}

/// `<ac:image>` referencing an attachment, with an optional caption.
pub(crate) fn image_macro(filename: &str, width: &str, caption: &str) -> String {
    let mut out = String::from("<ac:image ac:align=\"center\"");
    if !width.is_empty() {
        out.push_str(&format!(" ac:width=\"{}\"", encode_double_quoted_attribute(width)));
    }
    out.push_str(&format!(
        "><ri:attachment ri:filename=\"{}\"></ri:attachment>",
        encode_double_quoted_attribute(filename)
    ));
    if !caption.is_empty() {
        out.push_str(&format!(
            "<ac:caption><p>{}</p></ac:caption>",
            render_inline(caption)
        ));
    }
    out.push_str("</ac:image>");
    out
}

fn render_figure(block: &Block) -> String {
    let src = block.attribute("src").unwrap_or_default().trim();
    if src.is_empty() {
        return String::new();
    }
    image_macro(
        basename(src),
        block.attribute("width").unwrap_or_default().trim(),
        block.attribute("caption").unwrap_or_default().trim(),
    )
}

fn render_blockquote(content: &str) -> String {
    let unquoted = BlockQuote::unquote(content);
    let paragraphs: Vec<String> = unquoted
        .split("\n\n")
        .map(paragraph_text)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        return "<blockquote><p /></blockquote>".to_string();
    }
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", render_inline(p)))
        .collect();
    format!("<blockquote>{body}</blockquote>")
}

fn table_cell() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<(td|th)([^>]*)>(.*?)</(td|th)>").expect("Invalid table cell regex")
    })
}

fn render_raw(content: &str) -> String {
    let stripped = content.trim();
    if matches!(stripped, "<p></p>" | "<p/>" | "<p />") {
        return "<p />".to_string();
    }
    if !stripped.starts_with("<table") {
        return stripped.to_string();
    }
    table_cell()
        .replace_all(stripped, |caps: &regex::Captures| {
            let inner = &caps[3];
            if caps[1] != caps[4] || (inner.contains('<') && inner.contains('>')) {
                return caps[0].to_string();
            }
            format!("<{}{}>{}</{}>", &caps[1], &caps[2], render_inline(inner.trim()), &caps[1])
        })
        .into_owned()
}
