use std::sync::OnceLock;

use regex::Regex;

use crate::blocks::kinds::{ListItem, basename};
use crate::text::patterns;

use super::inline::render_inline;

fn figure_in_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\s*<figure[^>]*>\s*<img\s+([^>]+?)\s*/?\s*>\s*</figure>")
            .expect("Invalid figure-in-list regex")
    })
}

fn trailing_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*<br\s*/?\s*>\s*$").expect("Invalid trailing break regex"))
}

/// One list item with its nested items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNode {
    pub ordered: bool,
    pub text: String,
    pub depth: usize,
    pub children: Vec<ListNode>,
}

/// Parses list source into a tree of items by indentation.
///
/// Each four columns of indentation is one level; lines without a marker are
/// appended to the previous item.
pub fn parse_list(content: &str) -> Vec<ListNode> {
    let mut flat: Vec<ListNode> = Vec::new();
    for line in content.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        let depth = ListItem::indent(line) / ListItem::TAB_WIDTH;
        if ListItem::is_marker_line(stripped) {
            flat.push(ListNode {
                ordered: ListItem::is_ordered(stripped),
                text: ListItem::strip_marker(stripped).to_string(),
                depth,
                children: Vec::new(),
            });
        } else if let Some(last) = flat.last_mut() {
            last.text = format!("{} {stripped}", last.text);
        }
    }
    build_tree(flat)
}

fn build_tree(flat: Vec<ListNode>) -> Vec<ListNode> {
    // Indices into `roots`/children, from the outermost open item inward.
    let mut roots: Vec<ListNode> = Vec::new();
    let mut path: Vec<(usize, usize)> = Vec::new();

    for item in flat {
        while path.last().is_some_and(|&(_, depth)| depth >= item.depth) {
            path.pop();
        }
        let depth = item.depth;
        let siblings = descend(&mut roots, &path);
        siblings.push(item);
        path.push((siblings.len() - 1, depth));
    }
    roots
}

fn descend<'a>(roots: &'a mut Vec<ListNode>, path: &[(usize, usize)]) -> &'a mut Vec<ListNode> {
    let mut level = roots;
    for &(idx, _) in path {
        level = &mut level[idx].children;
    }
    level
}

/// Renders list nodes, wrapping runs of equal orderedness in `<ol>`/`<ul>`.
pub fn render_nodes(nodes: &[ListNode]) -> String {
    let mut out = String::new();
    for run in nodes.chunk_by(|a, b| a.ordered == b.ordered) {
        let body: String = run.iter().map(render_item).collect();
        if run[0].ordered {
            out.push_str(&format!("<ol start=\"1\">{body}</ol>"));
        } else {
            out.push_str(&format!("<ul>{body}</ul>"));
        }
    }
    out
}

/// Renders the list block.
pub fn render_list(content: &str) -> String {
    render_nodes(&parse_list(content))
}

/// Renders only the top-level `<li>` sequence of a list.
pub fn render_list_inner(content: &str) -> String {
    parse_list(content).iter().map(render_item).collect()
}

fn render_item(node: &ListNode) -> String {
    let nested = render_nodes(&node.children);
    let Some(figure) = figure_in_item().captures(&node.text) else {
        return format!("<li><p>{}</p>{nested}</li>", render_inline(&node.text));
    };

    let whole = figure.get(0).map_or(0..0, |m| m.range());
    let before = trailing_break().replace(&node.text[..whole.start], "");
    let before = before.trim();
    let mut out = String::from("<li>");
    if !before.is_empty() {
        out.push_str(&format!("<p>{}</p>", render_inline(before)));
    }
    out.push_str(&attachment_image(&figure[1]));
    out.push_str("<p />");
    out.push_str(&nested);
    out.push_str("</li>");
    out
}

/// `<ac:image>` for the attributes of an `<img>` tag.
fn attachment_image(img_attrs: &str) -> String {
    let attrs = patterns::parse_attributes(img_attrs);
    let get = |key: &str| {
        attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    };
    super::image_macro(basename(get("src")), get("width"), "")
}
