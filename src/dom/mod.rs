//! Detached node tree
//!
//! Nodes live in an arena owned by [`Tree`] and are addressed by [`NodeId`].
//! Parent and child links are stored as ids, so a tree can be copied into
//! another arena and re-linked without any shared ownership between the two.

use std::cell::Cell;
use std::collections::HashMap;

/// Elements that never have content or an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are written without escaping
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Check if an element name is an HTML void element
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Check if an element starts SVG or MathML content
pub fn is_foreign_root(name: &str) -> bool {
    ["svg", "math"].iter().any(|f| f.eq_ignore_ascii_case(name))
}

/// Check if text inside this element is serialized verbatim
pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Handle to a node inside a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single `name="value"` pair on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// What a node is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Parentless container whose children are the content
    Fragment,
    /// Root of a full document
    Document,
    Doctype(String),
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Last known index among the parent's children
    slot: Cell<usize>,
    live: bool,
}

/// Arena-backed node tree
///
/// Removed nodes are recycled, so a [`NodeId`] must not be used after the
/// node it names has been removed.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<NodeData>,
    free: Vec<NodeId>,
    live: usize,
    mutations: u64,
}

impl Tree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Count of structural and content changes made so far
    ///
    /// Node creation is not counted; inserting, removing and editing are.
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    /// Check if an id still names a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).is_some_and(|n| n.live)
    }

    /// Create a detached node
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.live += 1;
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            slot: Cell::new(0),
            live: true,
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = data;
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeKind::Text(text.into()))
    }

    pub fn create_element(&mut self, name: impl Into<String>, attributes: Vec<Attribute>) -> NodeId {
        self.create(NodeKind::Element {
            name: name.into(),
            attributes,
        })
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    /// Replace what a node is, keeping its position and children
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.index()].kind = kind;
        self.mutations += 1;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Parent and index of a node, searching outward from its cached slot
    fn position(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let children = self.children(parent);
        let slot = &self.nodes[id.index()].slot;
        let hint = slot.get().min(children.len());
        let at = |i: usize| children.get(i) == Some(&id);
        let index = (0..=children.len()).find_map(|distance| {
            let after = hint + distance;
            if at(after) {
                return Some(after);
            }
            hint.checked_sub(distance + 1).filter(|&before| at(before))
        })?;
        slot.set(index);
        Some((parent, index))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.position(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.position(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Append a node as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let siblings = &mut self.nodes[parent.index()].children;
        siblings.push(child);
        let index = siblings.len() - 1;
        let data = &mut self.nodes[child.index()];
        data.parent = Some(parent);
        data.slot.set(index);
        self.mutations += 1;
    }

    /// Insert a node as the sibling right before `reference`
    ///
    /// Returns false when `reference` has no parent.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> bool {
        self.detach(node);
        let Some((parent, index)) = self.position(reference) else {
            return false;
        };
        self.nodes[node.index()].parent = Some(parent);
        self.nodes[node.index()].slot.set(index);
        self.nodes[parent.index()].children.insert(index, node);
        self.mutations += 1;
        true
    }

    /// Unlink a node from its parent without freeing it
    pub fn detach(&mut self, id: NodeId) {
        if let Some((parent, index)) = self.position(id) {
            self.nodes[parent.index()].children.remove(index);
            self.nodes[id.index()].parent = None;
            self.mutations += 1;
        }
    }

    /// Unlink a node and free it together with all of its descendants
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let data = &mut self.nodes[current.index()];
            if !data.live {
                continue;
            }
            data.live = false;
            data.parent = None;
            data.kind = NodeKind::Fragment;
            stack.append(&mut data.children);
            self.free.push(current);
            self.live -= 1;
        }
    }

    /// Remove `from` and its following siblings up to, not including, `until`
    ///
    /// Stops at the end of the sibling list if `until` is never reached.
    pub fn remove_range(&mut self, from: NodeId, until: NodeId) -> usize {
        if from == until {
            return 0;
        }
        let Some((parent, start)) = self.position(from) else {
            self.remove(from);
            return 1;
        };
        let end = match self.position(until) {
            Some((p, at)) if p == parent && at > start => at,
            _ => self.children(parent).len(),
        };
        let doomed: Vec<NodeId> = self.nodes[parent.index()].children.drain(start..end).collect();
        self.mutations += 1;
        for &node in &doomed {
            self.nodes[node.index()].parent = None;
            self.remove(node);
        }
        doomed.len()
    }

    /// Remove every sibling strictly between `start` and `end`
    pub fn remove_between(&mut self, start: NodeId, end: NodeId) -> usize {
        match self.next_sibling(start) {
            Some(first) if first != end => self.remove_range(first, end),
            _ => 0,
        }
    }

    /// Move all children of `from` under `to`, before `before` or at the end
    pub fn move_children(&mut self, from: NodeId, to: NodeId, before: Option<NodeId>) {
        let moved = std::mem::take(&mut self.nodes[from.index()].children);
        if moved.is_empty() {
            return;
        }
        let mut at = before
            .and_then(|b| self.children(to).iter().position(|&c| c == b))
            .unwrap_or(self.children(to).len());
        for child in moved {
            self.nodes[child.index()].parent = Some(to);
            self.nodes[child.index()].slot.set(at);
            self.nodes[to.index()].children.insert(at, child);
            at += 1;
        }
        self.mutations += 1;
    }

    /// Move all children of `from` to sit right before `reference`
    ///
    /// Returns false when `reference` has no parent.
    pub fn move_children_before(&mut self, from: NodeId, reference: NodeId) -> bool {
        match self.parent(reference) {
            Some(parent) => {
                self.move_children(from, parent, Some(reference));
                true
            }
            None => false,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Text(_))
    }

    pub fn is_document(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Document)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Replace the content of a text node; no-op on other kinds
    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> bool {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Text(text) => {
                *text = value.into();
                self.mutations += 1;
                true
            }
            _ => false,
        }
    }

    pub fn comment(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Comment(text) => Some(text),
            _ => None,
        }
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Attributes of an element, empty for every other kind
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Overwrite an attribute by name, appending it when absent
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> bool {
        let NodeKind::Element { attributes, .. } = &mut self.nodes[id.index()].kind else {
            return false;
        };
        let value = value.into();
        match attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => attributes.push(Attribute::new(name, value)),
        }
        self.mutations += 1;
        true
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<Attribute> {
        let NodeKind::Element { attributes, .. } = &mut self.nodes[id.index()].kind else {
            return None;
        };
        let index = attributes.iter().position(|a| a.name == name)?;
        self.mutations += 1;
        Some(attributes.remove(index))
    }

    /// Nodes of the subtree at `root` in pre-order, `root` first
    pub fn preorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        order
    }

    /// First element named `name` in the subtree at `root`
    pub fn find_element(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.preorder(root)
            .into_iter()
            .find(|&n| self.element_name(n) == Some(name))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, root: NodeId) -> String {
        self.preorder(root)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Deep-copy the subtree at `root` of `source` into this tree
    ///
    /// Every source node is copied first, recording original -> copy in a
    /// map; the copies are then re-linked through that map. The returned
    /// copy of `root` is detached.
    pub fn import(&mut self, source: &Tree, root: NodeId) -> NodeId {
        let order = source.preorder(root);
        let mut map: HashMap<NodeId, NodeId> = HashMap::with_capacity(order.len());
        for &original in &order {
            let copy = self.create(source.kind(original).clone());
            map.insert(original, copy);
        }
        for &original in &order {
            let copy = map[&original];
            let children: Vec<NodeId> = source.children(original).iter().map(|c| map[c]).collect();
            for (index, &child) in children.iter().enumerate() {
                self.nodes[child.index()].parent = Some(copy);
                self.nodes[child.index()].slot.set(index);
            }
            self.nodes[copy.index()].children = children;
        }
        map[&root]
    }
}
