//! Tree construction from lexed markup
//!
//! A stack of open elements decides where each item lands. End tags pop the
//! stack back to the nearest element with a matching name and are otherwise
//! ignored, so unbalanced markup still yields a tree.

use crate::dom::{is_foreign_root, is_void_element, Attribute, NodeId, NodeKind, Tree};
use crate::parser::grammar::StartTag;
use crate::parser::lexer::{Markup, Span};

#[derive(Debug)]
struct OpenElement {
    node: NodeId,
    name: String,
    /// Inside `<svg>` or `<math>`, where names keep their case
    foreign: bool,
}

/// Append the nodes described by `markup` under `root`
pub fn build(tree: &mut Tree, root: NodeId, markup: Vec<(Markup, Span)>) {
    let mut open: Vec<OpenElement> = Vec::new();

    for (item, _span) in markup {
        let parent = open.last().map_or(root, |e| e.node);
        match item {
            Markup::Text(text) => append_text(tree, parent, text),
            Markup::Comment(text) => {
                let node = tree.create(NodeKind::Comment(text));
                tree.append(parent, node);
            }
            Markup::Doctype(name) => {
                if open.is_empty() && tree.is_document(root) {
                    let node = tree.create(NodeKind::Doctype(name));
                    tree.append(root, node);
                } else {
                    log::trace!(target: "ssr_html::parser", "ignoring doctype outside document prologue");
                }
            }
            Markup::StartTag(tag) => {
                let inherited = open.last().is_some_and(|e| e.foreign);
                if let Some(element) = start_element(tree, parent, tag, inherited) {
                    open.push(element);
                }
            }
            Markup::EndTag(name) => {
                match open.iter().rposition(|e| e.name.eq_ignore_ascii_case(&name)) {
                    Some(at) => open.truncate(at),
                    None => {
                        log::trace!(target: "ssr_html::parser", "ignoring stray end tag </{}>", name)
                    }
                }
            }
        }
    }
}

/// Create the element and return it if it stays open
fn start_element(
    tree: &mut Tree,
    parent: NodeId,
    tag: StartTag,
    inherited_foreign: bool,
) -> Option<OpenElement> {
    let foreign_root = is_foreign_root(&tag.name);
    let foreign = inherited_foreign || foreign_root;
    let normalize = |name: String| {
        if foreign && !foreign_root {
            name
        } else {
            name.to_ascii_lowercase()
        }
    };

    let name = normalize(tag.name);
    let mut attributes: Vec<Attribute> = Vec::with_capacity(tag.attributes.len());
    for attribute in tag.attributes {
        let attr_name = if foreign {
            attribute.name
        } else {
            attribute.name.to_ascii_lowercase()
        };
        // First occurrence wins
        if attributes.iter().all(|a| a.name != attr_name) {
            attributes.push(Attribute::new(attr_name, attribute.value));
        }
    }

    let node = tree.create_element(name.clone(), attributes);
    tree.append(parent, node);

    let closed = if foreign {
        tag.self_closing
    } else {
        is_void_element(&name)
    };
    (!closed).then_some(OpenElement {
        node,
        name,
        foreign,
    })
}

/// Append text, merging with a preceding text sibling
fn append_text(tree: &mut Tree, parent: NodeId, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(&last) = tree.children(parent).last() {
        if let Some(existing) = tree.text(last) {
            let merged = format!("{existing}{text}");
            tree.set_text(last, merged);
            return;
        }
    }
    let node = tree.create_text(text);
    tree.append(parent, node);
}
