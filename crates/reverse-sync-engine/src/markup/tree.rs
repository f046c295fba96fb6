use std::borrow::Cow;

use similar::{Algorithm, DiffTag, capture_diff_slices};

use super::tokenize::{TokenKind, tokenize};

/// Index of a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element with its raw tags kept for byte-exact serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    /// The opening tag exactly as written.
    pub open: String,
    /// The closing tag as written; `None` for self-closing, void and unclosed
    /// elements.
    pub close: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element(ElementData),
    /// Raw text, entities still escaped.
    Text(String),
    /// Raw `<![CDATA[...]]>` section.
    Cdata(String),
    Comment(String),
    /// Declarations and stray end tags.
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A lossless, arena-backed markup tree.
///
/// Serializing an unmodified document reproduces its input byte for byte.
/// Nodes removed from the tree stay in the arena, detached.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

const VOID_ELEMENTS: &[&str] = &[
    "br", "hr", "img", "col", "input", "meta", "link", "wbr", "source", "area", "base", "embed",
    "param", "track",
];

/// Whether `name` is an HTML void element, which never has a closing tag.
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

const EMOTICON: &str = "ac:emoticon";
const EMOJI_FALLBACK: &str = "ac:emoji-fallback";

impl Document {
    pub fn parse(markup: &str) -> Self {
        let mut doc = Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: vec![],
            }],
        };
        let root = doc.root();
        doc.build(markup, root);
        doc
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: vec![],
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn build(&mut self, markup: &str, container: NodeId) {
        let mut stack = vec![container];
        for tok in tokenize(markup) {
            let raw = tok.span.slice(markup).to_string();
            let top = stack.last().copied().unwrap_or(container);
            match tok.kind {
                TokenKind::Text => {
                    self.push(NodeKind::Text(raw), top);
                }
                TokenKind::Cdata => {
                    self.push(NodeKind::Cdata(raw), top);
                }
                TokenKind::Comment => {
                    self.push(NodeKind::Comment(raw), top);
                }
                TokenKind::Declaration => {
                    self.push(NodeKind::Raw(raw), top);
                }
                TokenKind::StartTag {
                    name,
                    attrs,
                    self_closing,
                } => {
                    let void = self_closing || is_void(&name);
                    let data = ElementData {
                        name,
                        attrs,
                        open: raw,
                        close: None,
                    };
                    let id = self.push(NodeKind::Element(data), top);
                    if !void {
                        stack.push(id);
                    }
                }
                TokenKind::EndTag { name } => {
                    let open_at = stack
                        .iter()
                        .rposition(|&n| self.name(n) == Some(name.as_str()));
                    match open_at {
                        Some(pos) if pos > 0 => {
                            if let NodeKind::Element(data) = &mut self.nodes[stack[pos].0].kind {
                                data.close = Some(raw);
                            }
                            stack.truncate(pos);
                        }
                        _ => {
                            self.push(NodeKind::Raw(raw), top);
                        }
                    }
                }
            }
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
    }

    /// Direct element child named `name`.
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.element_children(id)
            .find(|&c| self.name(c) == Some(name))
    }

    /// First descendant element named `name`, in document order.
    pub fn find_descendant(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .find(|&d| self.name(d) == Some(name))
    }

    /// All descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Whether `id` has an ancestor named `name`.
    pub fn has_ancestor(&self, id: NodeId, name: &str) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if self.name(p) == Some(name) {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Decoded text of a text node.
    pub fn text(&self, id: NodeId) -> Option<String> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(raw) => Some(html_escape::decode_html_entities(raw).into_owned()),
            _ => None,
        }
    }

    /// Decoded text of the subtree. CDATA bodies are included and emoticons
    /// contribute their fallback character.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(raw) => out.push_str(&html_escape::decode_html_entities(raw)),
            NodeKind::Cdata(raw) => out.push_str(cdata_body(raw)),
            NodeKind::Element(data) if data.name == EMOTICON => {
                if let Some(fallback) = self.attr(id, EMOJI_FALLBACK) {
                    out.push_str(fallback);
                }
            }
            NodeKind::Element(_) | NodeKind::Root => {
                for &c in self.children(id) {
                    self.collect_text(c, out);
                }
            }
            NodeKind::Comment(_) | NodeKind::Raw(_) => {}
        }
    }

    pub fn outer_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write(id, &mut out);
        out
    }

    pub fn inner_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &c in self.children(id) {
            self.write(c, &mut out);
        }
        out
    }

    /// The whole document as markup.
    pub fn serialize(&self) -> String {
        self.inner_markup(self.root())
    }

    fn write(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Root => {
                for &c in self.children(id) {
                    self.write(c, out);
                }
            }
            NodeKind::Element(data) => {
                out.push_str(&data.open);
                for &c in self.children(id) {
                    self.write(c, out);
                }
                if let Some(close) = &data.close {
                    out.push_str(close);
                }
            }
            NodeKind::Text(raw) | NodeKind::Cdata(raw) | NodeKind::Comment(raw) | NodeKind::Raw(raw) => {
                out.push_str(raw)
            }
        }
    }

    /// Parses `markup` into detached nodes owned by this arena.
    pub fn parse_fragment(&mut self, markup: &str) -> Vec<NodeId> {
        let holder = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: NodeKind::Root,
            parent: None,
            children: vec![],
        });
        self.build(markup, holder);
        let nodes = std::mem::take(&mut self.nodes[holder.0].children);
        for &n in &nodes {
            self.nodes[n.0].parent = None;
        }
        nodes
    }

    /// Removes `id` from its parent.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Inserts detached `node` directly after `anchor`.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        self.insert_relative(anchor, node, 1);
    }

    /// Inserts detached `node` directly before `anchor`.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) {
        self.insert_relative(anchor, node, 0);
    }

    fn insert_relative(&mut self, anchor: NodeId, node: NodeId, offset: usize) {
        let Some(parent) = self.parent(anchor) else {
            return;
        };
        self.detach(node);
        let siblings = &mut self.nodes[parent.0].children;
        let at = siblings
            .iter()
            .position(|&c| c == anchor)
            .map_or(siblings.len(), |p| p + offset);
        siblings.insert(at, node);
        self.nodes[node.0].parent = Some(parent);
    }

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) {
        self.detach(node);
        self.nodes[parent.0].children.push(node);
        self.nodes[node.0].parent = Some(parent);
    }

    /// Replaces the children of `id` with the nodes parsed from `markup`.
    pub fn replace_children(&mut self, id: NodeId, markup: &str) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
        for node in self.parse_fragment(markup) {
            self.append_child(id, node);
        }
    }

    /// Decoded text of a text node, or the body of a CDATA section.
    pub fn leaf_text(&self, id: NodeId) -> Option<String> {
        match &self.nodes[id.0].kind {
            NodeKind::Cdata(raw) => Some(cdata_body(raw).to_string()),
            _ => self.text(id),
        }
    }

    /// Text and CDATA nodes of the subtree, in document order. A leaf is its
    /// own only leaf.
    pub fn text_leaves(&self, id: NodeId) -> Vec<NodeId> {
        if matches!(self.nodes[id.0].kind, NodeKind::Text(_) | NodeKind::Cdata(_)) {
            return vec![id];
        }
        self.descendants(id)
            .into_iter()
            .filter(|&d| matches!(self.nodes[d.0].kind, NodeKind::Text(_) | NodeKind::Cdata(_)))
            .collect()
    }

    /// Sets the decoded text of a text or CDATA node. Only the changed middle
    /// of a text node is re-escaped; the unchanged prefix and suffix keep
    /// their original entity spelling.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if self.leaf_text(id).as_deref() == Some(text) {
            return;
        }
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(raw) => *raw = respell(raw, text),
            NodeKind::Cdata(raw) => *raw = format!("<![CDATA[{text}]]>"),
            _ => {}
        }
    }
}

/// One decoded unit of raw text: a character or a whole entity reference.
struct RawUnit<'a> {
    start: usize,
    end: usize,
    decoded: Cow<'a, str>,
}

fn raw_units(raw: &str) -> Vec<RawUnit<'_>> {
    let mut units = Vec::new();
    let mut rest = raw.char_indices().peekable();
    while let Some((start, c)) = rest.next() {
        if c == '&'
            && let Some(len) = entity_len(&raw[start..])
        {
            let slice = &raw[start..start + len];
            let decoded = html_escape::decode_html_entities(slice);
            if decoded != slice {
                while rest.next_if(|&(i, _)| i < start + len).is_some() {}
                units.push(RawUnit {
                    start,
                    end: start + len,
                    decoded,
                });
                continue;
            }
        }
        let end = start + c.len_utf8();
        units.push(RawUnit {
            start,
            end,
            decoded: Cow::Borrowed(&raw[start..end]),
        });
    }
    units
}

/// Byte length of an entity reference at the start of `s`, `;` included.
fn entity_len(s: &str) -> Option<usize> {
    let semi = s.find(';')?;
    let body = &s[1..semi];
    let ok = match body.strip_prefix('#') {
        Some(num) => match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
        },
        None => {
            body.starts_with(|c: char| c.is_ascii_alphabetic())
                && body.chars().all(|c| c.is_ascii_alphanumeric())
        }
    };
    ok.then_some(semi + 1)
}

/// Raw text for `text`, reusing the spelling of `raw` for every unit the
/// edit leaves in place.
fn respell(raw: &str, text: &str) -> String {
    let units = raw_units(raw);
    let old: Vec<&str> = units.iter().map(|u| u.decoded.as_ref()).collect();
    let new: Vec<&str> = text
        .char_indices()
        .map(|(i, c)| &text[i..i + c.len_utf8()])
        .collect();
    let mut out = String::with_capacity(raw.len());
    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                let kept = &units[old_range];
                if let (Some(first), Some(last)) = (kept.first(), kept.last()) {
                    out.push_str(&raw[first.start..last.end]);
                }
            }
            DiffTag::Delete => {}
            DiffTag::Insert | DiffTag::Replace => {
                out.push_str(&html_escape::encode_text(&new[new_range].concat()));
            }
        }
    }
    out
}

fn cdata_body(raw: &str) -> &str {
    let body = raw.strip_prefix("<![CDATA[").unwrap_or(raw);
    body.strip_suffix("]]>").unwrap_or(body)
}
