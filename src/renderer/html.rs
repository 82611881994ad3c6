//! HTML serialization of node trees

use crate::dom::{is_raw_text_element, is_void_element, NodeId, NodeKind, Tree};

use super::SerializeConfig;

/// Writes a tree out as HTML
pub struct HtmlWriter<'a> {
    tree: &'a Tree,
    config: &'a SerializeConfig,
    out: String,
}

impl<'a> HtmlWriter<'a> {
    pub fn new(tree: &'a Tree, config: &'a SerializeConfig) -> Self {
        Self {
            tree,
            config,
            out: String::new(),
        }
    }

    /// Write a node; fragment and document roots write only their children
    pub fn write(mut self, root: NodeId) -> String {
        self.node(root, false);
        self.out
    }

    fn node(&mut self, id: NodeId, raw_parent: bool) {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Fragment | NodeKind::Document => self.children(id, false),
            NodeKind::Doctype(name) => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(name);
                self.out.push('>');
            }
            NodeKind::Comment(text) => {
                self.out.push_str("<!--");
                self.out.push_str(text);
                self.out.push_str("-->");
            }
            NodeKind::Text(text) if raw_parent => self.out.push_str(text),
            NodeKind::Text(text) => self.out.push_str(&escape_text(text)),
            NodeKind::Element { name, attributes } => {
                self.out.push('<');
                self.out.push_str(name);
                for attribute in attributes {
                    self.out.push(' ');
                    self.out.push_str(&attribute.name);
                    self.out.push_str("=\"");
                    self.out.push_str(&escape_attribute(&attribute.value));
                    self.out.push('"');
                }
                if is_void_element(name) {
                    self.out
                        .push_str(if self.config.self_close_void { "/>" } else { ">" });
                    return;
                }
                self.out.push('>');
                self.children(id, is_raw_text_element(name));
                self.out.push_str("</");
                self.out.push_str(name);
                self.out.push('>');
            }
        }
    }

    fn children(&mut self, id: NodeId, raw: bool) {
        for &child in self.tree.children(id) {
            self.node(child, raw);
        }
    }
}

/// Serialize the subtree at `root`
pub fn serialize(tree: &Tree, root: NodeId, config: &SerializeConfig) -> String {
    HtmlWriter::new(tree, config).write(root)
}

/// Escape text content
fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape a double-quoted attribute value
fn escape_attribute(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('"', "&quot;")
}
