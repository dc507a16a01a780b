//! Owned, mutable HTML document model.
//!
//! Parsing goes through `scraper` (html5ever), but the parsed tree is copied
//! into a flat arena keyed by `NodeHandle`. scraper trees are read-only; the
//! arena gives the pipeline stable handles plus the two mutations it needs
//! (replace a node's text, replace a node's children from markup).
//!
//! Serialization is deliberately minimal: tags and attributes as parsed,
//! text entity-escaped. The invariant that matters is that
//! `serialize(parse(serialize(x))) == serialize(x)` for well-formed input, so
//! a snapshot written back verbatim reads back verbatim.

use relevel_core::{DocumentHost, NodeHandle, NodeQuery};

/// Block-level tags considered candidates for snapshotting and rewriting.
const TEXT_BLOCK_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "blockquote",
    "td",
    "dt",
    "dd",
    "figcaption",
    "pre",
];

/// Tags serialized without a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<NodeHandle>,
}

#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct HtmlDocument {
    nodes: Vec<DomNode>,
    roots: Vec<NodeHandle>,
}

impl HtmlDocument {
    /// Parse a full HTML document. Comments and doctypes are dropped.
    pub fn parse(html: &str) -> Self {
        let parsed = scraper::Html::parse_document(html);
        Self::from_scraper(&parsed, false)
    }

    /// Parse an HTML fragment (no implicit `html`/`body` wrapper in the result).
    pub fn parse_fragment(html: &str) -> Self {
        let parsed = scraper::Html::parse_fragment(html);
        Self::from_scraper(&parsed, true)
    }

    fn from_scraper(parsed: &scraper::Html, unwrap_html: bool) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            roots: Vec::new(),
        };
        let root = parsed.tree.root();

        // html5ever wraps fragments in a synthetic `<html>` element; unwrap it
        // so fragment markup round-trips without gaining a wrapper.
        if unwrap_html {
            let wrapper = root.children().find(
                |n| matches!(n.value(), scraper::Node::Element(el) if el.name() == "html"),
            );
            if let Some(wrapper) = wrapper {
                for child in wrapper.children() {
                    if let Some(h) = doc.convert(child) {
                        doc.roots.push(h);
                    }
                }
                return doc;
            }
        }

        for child in root.children() {
            if let Some(h) = doc.convert(child) {
                doc.roots.push(h);
            }
        }
        doc
    }

    fn convert(&mut self, node: ego_tree::NodeRef<'_, scraper::Node>) -> Option<NodeHandle> {
        match node.value() {
            scraper::Node::Element(el) => {
                let data = ElementData {
                    name: el.name().to_string(),
                    attrs: el
                        .attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                    children: Vec::new(),
                };
                let handle = self.push(DomNode::Element(data));
                let mut children = Vec::new();
                for child in node.children() {
                    if let Some(h) = self.convert(child) {
                        children.push(h);
                    }
                }
                if let DomNode::Element(el) = &mut self.nodes[handle.index()] {
                    el.children = children;
                }
                Some(handle)
            }
            scraper::Node::Text(t) => Some(self.push(DomNode::Text(t.text.to_string()))),
            _ => None,
        }
    }

    fn push(&mut self, node: DomNode) -> NodeHandle {
        let handle = NodeHandle::from_index(self.nodes.len());
        self.nodes.push(node);
        handle
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&DomNode> {
        self.nodes.get(handle.index())
    }

    /// Serialize the whole document.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            self.write_node(*root, &mut out);
        }
        out
    }

    /// Serialize the roots of a fragment parsed with [`parse_fragment`].
    ///
    /// [`parse_fragment`]: HtmlDocument::parse_fragment
    pub fn markup(&self) -> String {
        self.outer_html()
    }

    /// Pre-order walk yielding the first text node that contains
    /// non-whitespace, descending through element children.
    pub fn first_text_leaf(&self) -> Option<NodeHandle> {
        fn walk(doc: &HtmlDocument, handle: NodeHandle) -> Option<NodeHandle> {
            match doc.node(handle)? {
                DomNode::Text(t) => {
                    if t.chars().any(|c| !c.is_whitespace()) {
                        Some(handle)
                    } else {
                        None
                    }
                }
                DomNode::Element(el) => el.children.iter().find_map(|c| walk(doc, *c)),
            }
        }
        self.roots.iter().find_map(|r| walk(self, *r))
    }

    /// Overwrite the value of a text node. Returns false for non-text handles.
    pub fn set_text_node_value(&mut self, handle: NodeHandle, value: &str) -> bool {
        match self.nodes.get_mut(handle.index()) {
            Some(DomNode::Text(t)) => {
                *t = value.to_string();
                true
            }
            _ => false,
        }
    }

    fn collect_text(&self, handle: NodeHandle, out: &mut String) {
        match &self.nodes[handle.index()] {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(el) => {
                for child in &el.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    fn write_node(&self, handle: NodeHandle, out: &mut String) {
        match &self.nodes[handle.index()] {
            DomNode::Text(t) => out.push_str(&escape_text(t)),
            DomNode::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (k, v) in &el.attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(v));
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&el.name.as_str()) && el.children.is_empty() {
                    return;
                }
                for child in &el.children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }

    fn matches(&self, handle: NodeHandle, query: &NodeQuery) -> bool {
        let DomNode::Element(el) = &self.nodes[handle.index()] else {
            return false;
        };
        match query {
            NodeQuery::Tag(tag) => el.name.eq_ignore_ascii_case(tag),
            NodeQuery::Role(role) => attr(el, "role").is_some_and(|v| v.eq_ignore_ascii_case(role)),
            NodeQuery::Id(id) => attr(el, "id") == Some(*id),
            NodeQuery::Class(class) => attr(el, "class")
                .is_some_and(|v| v.split_whitespace().any(|c| c.eq_ignore_ascii_case(class))),
        }
    }

    fn walk_document_order(&self, mut visit: impl FnMut(NodeHandle) -> bool) {
        // Explicit stack keeps this a single restartable pass; `visit`
        // returning true stops the walk.
        let mut stack: Vec<NodeHandle> = self.roots.iter().rev().copied().collect();
        while let Some(handle) = stack.pop() {
            if visit(handle) {
                return;
            }
            if let DomNode::Element(el) = &self.nodes[handle.index()] {
                for child in el.children.iter().rev() {
                    stack.push(*child);
                }
            }
        }
    }
}

fn attr<'a>(el: &'a ElementData, name: &str) -> Option<&'a str> {
    el.attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
    out
}

impl DocumentHost for HtmlDocument {
    fn text_blocks(&self) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        self.walk_document_order(|handle| {
            if let DomNode::Element(el) = &self.nodes[handle.index()] {
                if TEXT_BLOCK_TAGS.contains(&el.name.as_str()) {
                    out.push(handle);
                }
            }
            false
        });
        out
    }

    fn flattened_text(&self, handle: NodeHandle) -> Option<String> {
        self.nodes.get(handle.index())?;
        let mut out = String::new();
        self.collect_text(handle, &mut out);
        Some(out)
    }

    fn inner_markup(&self, handle: NodeHandle) -> Option<String> {
        match self.nodes.get(handle.index())? {
            DomNode::Text(t) => Some(escape_text(t)),
            DomNode::Element(el) => {
                let mut out = String::new();
                for child in &el.children {
                    self.write_node(*child, &mut out);
                }
                Some(out)
            }
        }
    }

    fn set_text(&mut self, handle: NodeHandle, text: &str) {
        let child = self.push(DomNode::Text(text.to_string()));
        if let Some(DomNode::Element(el)) = self.nodes.get_mut(handle.index()) {
            el.children = vec![child];
        }
    }

    fn set_inner_markup(&mut self, handle: NodeHandle, markup: &str) {
        // Parse into a scratch arena, then graft the nodes into this one.
        // Replaced children stay orphaned in the arena; documents are
        // short-lived and the waste is bounded by the session.
        let fragment = HtmlDocument::parse_fragment(markup);
        let mut remap: Vec<NodeHandle> = Vec::with_capacity(fragment.nodes.len());
        for node in &fragment.nodes {
            let grafted = match node {
                DomNode::Text(t) => DomNode::Text(t.clone()),
                DomNode::Element(el) => DomNode::Element(ElementData {
                    name: el.name.clone(),
                    attrs: el.attrs.clone(),
                    children: Vec::new(),
                }),
            };
            remap.push(self.push(grafted));
        }
        for (i, node) in fragment.nodes.iter().enumerate() {
            if let DomNode::Element(el) = node {
                let mapped: Vec<NodeHandle> =
                    el.children.iter().map(|c| remap[c.index()]).collect();
                if let DomNode::Element(grafted) = &mut self.nodes[remap[i].index()] {
                    grafted.children = mapped;
                }
            }
        }
        let new_children: Vec<NodeHandle> =
            fragment.roots.iter().map(|r| remap[r.index()]).collect();
        if let Some(DomNode::Element(el)) = self.nodes.get_mut(handle.index()) {
            el.children = new_children;
        }
    }

    fn query_first(&self, query: &NodeQuery) -> Option<NodeHandle> {
        let mut found = None;
        self.walk_document_order(|handle| {
            if self.matches(handle, query) {
                found = Some(handle);
                true
            } else {
                false
            }
        });
        found
    }

    fn body_text(&self) -> String {
        if let Some(body) = self.query_first(&NodeQuery::Tag("body")) {
            return self.flattened_text(body).unwrap_or_default();
        }
        let mut out = String::new();
        for root in &self.roots {
            self.collect_text(*root, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_markup_round_trips_through_parse() {
        let markup = "Plain text with <strong>bold</strong> and <a href=\"/x\">a link</a>.";
        let doc = HtmlDocument::parse_fragment(markup);
        assert_eq!(doc.markup(), markup);
        // One more cycle: serialize(parse(serialize(x))) == serialize(x).
        let again = HtmlDocument::parse_fragment(&doc.markup());
        assert_eq!(again.markup(), markup);
    }

    #[test]
    fn text_entities_survive_a_round_trip() {
        let doc = HtmlDocument::parse_fragment("Fish &amp; chips &lt;cheap&gt;");
        assert_eq!(doc.markup(), "Fish &amp; chips &lt;cheap&gt;");
        let body = HtmlDocument::parse("<body><p>a &amp; b</p></body>");
        let p = body.query_first(&NodeQuery::Tag("p")).unwrap();
        assert_eq!(body.flattened_text(p).unwrap(), "a & b");
    }

    #[test]
    fn text_blocks_come_back_in_document_order() {
        let doc = HtmlDocument::parse(
            "<body><h1>Title here</h1><p>First paragraph.</p><ul><li>item one</li><li>item two</li></ul><p>Last.</p></body>",
        );
        let texts: Vec<String> = doc
            .text_blocks()
            .into_iter()
            .map(|h| doc.flattened_text(h).unwrap())
            .collect();
        assert_eq!(
            texts,
            vec![
                "Title here",
                "First paragraph.",
                "item one",
                "item two",
                "Last."
            ]
        );
    }

    #[test]
    fn query_first_matches_role_id_and_class() {
        let doc = HtmlDocument::parse(
            "<body><div class=\"wrap main-content\">wrapped</div><div role=\"main\">roled</div><div id=\"content\">ided</div></body>",
        );
        let by_class = doc.query_first(&NodeQuery::Class("main-content")).unwrap();
        assert_eq!(doc.flattened_text(by_class).unwrap(), "wrapped");
        let by_role = doc.query_first(&NodeQuery::Role("main")).unwrap();
        assert_eq!(doc.flattened_text(by_role).unwrap(), "roled");
        let by_id = doc.query_first(&NodeQuery::Id("content")).unwrap();
        assert_eq!(doc.flattened_text(by_id).unwrap(), "ided");
        assert!(doc.query_first(&NodeQuery::Id("missing")).is_none());
    }

    #[test]
    fn set_inner_markup_replaces_children_verbatim() {
        let mut doc = HtmlDocument::parse("<body><p>old <em>text</em></p></body>");
        let p = doc.query_first(&NodeQuery::Tag("p")).unwrap();
        let original = doc.inner_markup(p).unwrap();
        doc.set_text(p, "replaced");
        assert_eq!(doc.inner_markup(p).unwrap(), "replaced");
        doc.set_inner_markup(p, &original);
        assert_eq!(doc.inner_markup(p).unwrap(), original);
        assert_eq!(doc.flattened_text(p).unwrap(), "old text");
    }

    #[test]
    fn first_text_leaf_skips_whitespace_only_nodes() {
        let doc = HtmlDocument::parse_fragment("<span>  </span> <em>first words</em> tail");
        let leaf = doc.first_text_leaf().unwrap();
        match doc.node(leaf).unwrap() {
            DomNode::Text(t) => assert_eq!(t, "first words"),
            other => panic!("expected text node, got {other:?}"),
        }
    }

    #[test]
    fn void_elements_serialize_without_closing_tags() {
        let doc = HtmlDocument::parse_fragment("line one<br>line two");
        assert_eq!(doc.markup(), "line one<br>line two");
    }

    #[test]
    fn body_text_falls_back_to_whole_document() {
        let doc = HtmlDocument::parse_fragment("just a fragment");
        assert_eq!(doc.body_text(), "just a fragment");
    }
}
