//! In-memory document used by the engine tests.
//!
//! Structure and mutations live in a small arena. Selector matching is done by
//! `scraper` against the current markup, with every element tagged by its
//! arena index so matches map back to nodes.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use scraper::{Html, Selector};

use super::{Dom, SelectorError};

const DOCUMENT: usize = 0;
const NODE_ATTR: &str = "data-cf-node";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct NodeData {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl NodeData {
    fn new(tag: &str, parent: Option<usize>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            style: BTreeMap::new(),
            parent,
            children: Vec::new(),
        }
    }
}

pub struct MemoryDom {
    nodes: RefCell<Vec<NodeData>>,
    mutations: Cell<usize>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(vec![NodeData::new("#document", None)]),
            mutations: Cell::new(0),
        }
    }

    pub fn document(&self) -> NodeId {
        NodeId(DOCUMENT)
    }

    /// Append an element with attributes. `class` is split into the class
    /// list and `style` is parsed as `prop: value;` pairs.
    pub fn element(&self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        let mut data = NodeData::new(tag, Some(parent.0));

        for (name, value) in attrs {
            match *name {
                "class" => data.classes = value.split_whitespace().map(str::to_string).collect(),
                "style" => {
                    for decl in value.split(';') {
                        if let Some((prop, val)) = decl.split_once(':') {
                            data.style.insert(prop.trim().to_string(), val.trim().to_string());
                        }
                    }
                }
                _ => {
                    data.attrs.insert(name.to_ascii_lowercase(), value.to_string());
                }
            }
        }

        nodes.push(data);
        nodes[parent.0].children.push(id);
        NodeId(id)
    }

    pub fn append(&self, parent: NodeId, tag: &str) -> NodeId {
        self.element(parent, tag, &[])
    }

    /// True while the node is reachable from the document.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(node.0);
        while let Some(id) = current {
            if id == DOCUMENT {
                return true;
            }
            current = nodes[id].parent;
        }
        false
    }

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.nodes.borrow()[node.0].classes.clone()
    }

    /// Number of mutations performed through the [`Dom`] trait.
    pub fn mutations(&self) -> usize {
        self.mutations.get()
    }

    /// Serialized markup of the whole document.
    pub fn render(&self) -> String {
        self.markup(DOCUMENT, false)
    }

    /// Markup of the children of `top`, optionally tagged with arena indices.
    fn markup(&self, top: usize, tagged: bool) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        for &child in &nodes[top].children {
            render_node(&nodes, child, tagged, &mut out);
        }
        out
    }

    fn bump(&self) {
        self.mutations.set(self.mutations.get() + 1);
    }
}

fn escape(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}

fn render_node(nodes: &[NodeData], id: usize, tagged: bool, out: &mut String) {
    let node = &nodes[id];
    out.push('<');
    out.push_str(&node.tag);
    if tagged {
        out.push_str(&format!(" {NODE_ATTR}=\"{id}\""));
    }
    for (name, value) in &node.attrs {
        out.push_str(&format!(" {name}=\"{}\"", escape(value)));
    }
    if !node.classes.is_empty() {
        out.push_str(&format!(" class=\"{}\"", escape(&node.classes.join(" "))));
    }
    if !node.style.is_empty() {
        let decls: Vec<String> = node.style.iter().map(|(k, v)| format!("{k}: {v};")).collect();
        out.push_str(&format!(" style=\"{}\"", escape(&decls.join(" "))));
    }
    out.push('>');
    for &child in &node.children {
        render_node(nodes, child, tagged, out);
    }
    out.push_str(&format!("</{}>", node.tag));
}

/// Topmost ancestor of `id`: the document, or the root of a detached subtree.
fn top_of(nodes: &[NodeData], id: usize) -> usize {
    let mut current = id;
    while let Some(parent) = nodes[current].parent {
        current = parent;
    }
    current
}

fn is_descendant(nodes: &[NodeData], id: usize, ancestor: usize) -> bool {
    let mut current = nodes[id].parent;
    while let Some(parent) = current {
        if parent == ancestor {
            return true;
        }
        current = nodes[parent].parent;
    }
    false
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn query_selector_all(&self, root: &NodeId, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let parsed = Selector::parse(selector).map_err(|e| SelectorError::invalid(selector, e.to_string()))?;

        let top = top_of(&self.nodes.borrow(), root.0);
        let html = if top == DOCUMENT {
            Html::parse_document(&self.markup(DOCUMENT, true))
        } else {
            let mut out = String::new();
            render_node(&self.nodes.borrow(), top, true, &mut out);
            Html::parse_fragment(&out)
        };

        // elements the parser synthesized carry no index and are skipped
        let nodes = self.nodes.borrow();
        let matched = html
            .select(&parsed)
            .filter_map(|element| element.value().attr(NODE_ATTR)?.parse::<usize>().ok())
            .filter(|&id| is_descendant(&nodes, id, root.0))
            .map(NodeId)
            .collect();
        Ok(matched)
    }

    fn remove(&self, node: &NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[node.0].parent.take() {
            nodes[parent].children.retain(|&c| c != node.0);
            drop(nodes);
            self.bump();
        }
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.is_attached(*node)
    }

    fn has_class(&self, node: &NodeId, class_name: &str) -> bool {
        self.nodes.borrow()[node.0].classes.iter().any(|c| c == class_name)
    }

    fn remove_class(&self, node: &NodeId, class_name: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let before = nodes[node.0].classes.len();
        nodes[node.0].classes.retain(|c| c != class_name);
        let changed = nodes[node.0].classes.len() != before;
        drop(nodes);
        if changed {
            self.bump();
        }
    }

    fn style_property(&self, node: &NodeId, property: &str) -> String {
        self.nodes.borrow()[node.0].style.get(property).cloned().unwrap_or_default()
    }

    fn set_style_property(&self, node: &NodeId, property: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        if value.is_empty() {
            nodes[node.0].style.remove(property);
        } else {
            nodes[node.0].style.insert(property.to_string(), value.to_string());
        }
        drop(nodes);
        self.bump();
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.nodes.borrow()[node.0].tag.to_ascii_uppercase()
    }

    fn id(&self, node: &NodeId) -> Option<String> {
        self.nodes.borrow()[node.0].attrs.get("id").cloned()
    }

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.borrow()[node.0]
            .parent
            .filter(|&p| p != DOCUMENT)
            .map(NodeId)
    }

    fn previous_element_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        let parent = nodes[node.0].parent?;
        let siblings = &nodes[parent].children;
        let pos = siblings.iter().position(|&c| c == node.0)?;
        if pos == 0 {
            None
        } else {
            Some(NodeId(siblings[pos - 1]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_selector_all() {
        let dom = MemoryDom::new();
        let html = dom.append(dom.document(), "html");
        let body = dom.append(html, "body");
        let ad = dom.element(body, "div", &[("class", "ad banner")]);
        let main = dom.element(body, "div", &[("id", "main")]);
        let span = dom.append(main, "span");

        let root = dom.document();
        assert_eq!(dom.query_selector_all(&root, ".ad").unwrap(), vec![ad]);
        assert_eq!(dom.query_selector_all(&root, "div.ad.banner").unwrap(), vec![ad]);
        assert_eq!(dom.query_selector_all(&root, "#main > span").unwrap(), vec![span]);
        assert_eq!(dom.query_selector_all(&root, "body span").unwrap(), vec![span]);
        assert_eq!(dom.query_selector_all(&root, "div:nth-of-type(2)").unwrap(), vec![main]);
        assert_eq!(dom.query_selector_all(&root, "html").unwrap(), vec![html]);
        assert_eq!(dom.query_selector_all(&root, "[id^=\"ma\"]").unwrap(), vec![main]);
        assert_eq!(dom.query_selector_all(&root, "span, .banner").unwrap(), vec![ad, span]);
        assert_eq!(dom.query_selector_all(&root, "div:not(.ad)").unwrap(), vec![main]);
        assert_eq!(dom.query_selector_all(&root, ".ad + div").unwrap(), vec![main]);
    }

    #[test]
    fn test_query_scoped_to_root() {
        let dom = MemoryDom::new();
        let html = dom.append(dom.document(), "html");
        let body = dom.append(html, "body");
        let aside = dom.append(body, "aside");
        let inner = dom.element(aside, "p", &[("class", "x")]);
        dom.element(body, "p", &[("class", "x")]);

        // the root itself is excluded but ancestors still take part in matching
        assert_eq!(dom.query_selector_all(&aside, "body p").unwrap(), vec![inner]);
        assert!(dom.query_selector_all(&aside, "aside").unwrap().is_empty());
    }

    #[test]
    fn test_query_detached_subtree() {
        let dom = MemoryDom::new();
        let html = dom.append(dom.document(), "html");
        let body = dom.append(html, "body");
        let card = dom.append(body, "section");
        let link = dom.element(card, "a", &[("href", "/x?a=1&b=\"2\"")]);
        dom.remove(&card);

        assert!(dom.query_selector_all(&dom.document(), "a").unwrap().is_empty());
        assert_eq!(dom.query_selector_all(&card, "a[href$='\"2\"']").unwrap(), vec![link]);
    }

    #[test]
    fn test_rejects_invalid_selectors() {
        let dom = MemoryDom::new();
        let root = dom.document();
        assert!(dom.query_selector_all(&root, "||ads.example.com^").is_err());
        assert!(dom.query_selector_all(&root, "div:nth-child(").is_err());
        assert!(dom.query_selector_all(&root, "[[").is_err());
        assert!(dom.query_selector_all(&root, "").is_err());
    }

    #[test]
    fn test_remove_detaches() {
        let dom = MemoryDom::new();
        let html = dom.append(dom.document(), "html");
        let div = dom.append(html, "div");
        dom.remove(&div);
        assert!(!dom.is_attached(div));
        assert_eq!(dom.mutations(), 1);
        dom.remove(&div);
        assert_eq!(dom.mutations(), 1);
    }
}
