//! Template compilation
//!
//! Parses the joined markup once and records a [`TemplatePart`] for every
//! hole that can be bound: marker comments become empty text nodes that
//! anchor node parts, and attributes carrying the marker are removed and
//! become attribute parts. Parts are addressed by pre-order index so an
//! identical walk over a copy of the tree finds the same nodes.

use std::collections::{HashMap, VecDeque};

use crate::dom::{NodeId, NodeKind, Tree};
use crate::parser::{looks_like_document, parse_document, parse_fragment, parse_svg_fragment};
use crate::template::scanner::{self, Hole};
use crate::template::{TemplateKind, TemplateStrings, MARKER};
use crate::RenderError;

/// How the value of an attribute part is produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeStrings {
    /// The whole value is one hole
    Whole,
    /// Literal segments interleaved with holes, one more segment than holes
    Interpolated(Vec<String>),
}

impl AttributeStrings {
    fn from_segments(segments: Vec<String>) -> Self {
        if segments.len() == 2 && segments.iter().all(String::is_empty) {
            AttributeStrings::Whole
        } else {
            AttributeStrings::Interpolated(segments)
        }
    }

    /// Number of values this attribute consumes
    pub fn holes(&self) -> usize {
        match self {
            AttributeStrings::Whole => 1,
            AttributeStrings::Interpolated(segments) => segments.len() - 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePartKind {
    Node,
    Attribute {
        name: String,
        strings: AttributeStrings,
    },
}

/// A bindable location in a compiled template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePart {
    pub kind: TemplatePartKind,
    /// Pre-order position of the bound node, the root being 0
    pub index: usize,
    /// First value this part consumes
    pub value_index: usize,
}

impl TemplatePart {
    /// Values consumed: `None` for node parts
    pub fn size(&self) -> Option<usize> {
        match &self.kind {
            TemplatePartKind::Node => None,
            TemplatePartKind::Attribute { strings, .. } => Some(strings.holes()),
        }
    }
}

/// A compiled template: a prototype tree and the parts found in it
#[derive(Debug)]
pub struct Template {
    tree: Tree,
    root: NodeId,
    parts: Vec<TemplatePart>,
    kind: TemplateKind,
    value_count: usize,
}

impl Template {
    /// Compile template fragments
    ///
    /// With `detect_documents`, HTML whose markup starts with a doctype or
    /// `<html>` is parsed as a full document.
    pub fn compile(
        strings: &TemplateStrings,
        kind: TemplateKind,
        detect_documents: bool,
    ) -> Result<Self, RenderError> {
        let scan = scanner::scan(strings.as_slice(), kind == TemplateKind::Svg);
        let (mut tree, root) = match kind {
            TemplateKind::Html if detect_documents && looks_like_document(&scan.markup) => {
                parse_document(&scan.markup)?
            }
            TemplateKind::Html => parse_fragment(&scan.markup)?,
            TemplateKind::Svg => parse_svg_fragment(&scan.markup)?,
        };

        let mut node_holes = VecDeque::new();
        let mut attribute_holes: HashMap<usize, Vec<(String, usize)>> = HashMap::new();
        for (value_index, hole) in scan.holes.iter().enumerate() {
            match hole {
                Hole::Node => node_holes.push_back(value_index),
                Hole::Attribute { element, name } => attribute_holes
                    .entry(*element)
                    .or_default()
                    .push((name.clone(), value_index)),
                Hole::Unsupported(position) => {
                    log::warn!(
                        target: "ssr_html::compile",
                        "value {} sits in a {} and will be ignored",
                        value_index,
                        position
                    );
                }
            }
        }

        let mut parts = Vec::new();
        let mut element_ordinal = 0;
        for (index, node) in tree.preorder(root).into_iter().enumerate() {
            if tree.is_element(node) {
                let holes = attribute_holes.remove(&element_ordinal).unwrap_or_default();
                element_ordinal += 1;
                bind_attributes(&mut tree, node, index, holes, &mut parts);
            } else if tree.comment(node) == Some(MARKER) {
                if let Some(value_index) = node_holes.pop_front() {
                    tree.set_kind(node, NodeKind::Text(String::new()));
                    parts.push(TemplatePart {
                        kind: TemplatePartKind::Node,
                        index,
                        value_index,
                    });
                }
            }
        }

        for value_index in node_holes
            .into_iter()
            .chain(attribute_holes.into_values().flatten().map(|(_, v)| v))
        {
            log::warn!(target: "ssr_html::compile", "value {} could not be bound", value_index);
        }

        log::debug!(
            target: "ssr_html::compile",
            "compiled {:?} template: {} parts, {} values, {} nodes",
            kind,
            parts.len(),
            strings.hole_count(),
            tree.len()
        );

        Ok(Self {
            tree,
            root,
            parts,
            kind,
            value_count: strings.hole_count(),
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Number of values one render of this template supplies
    pub fn value_count(&self) -> usize {
        self.value_count
    }

    pub fn is_document(&self) -> bool {
        self.tree.is_document(self.root)
    }
}

/// Turn the marker-carrying attributes of one element into parts
fn bind_attributes(
    tree: &mut Tree,
    node: NodeId,
    index: usize,
    mut holes: Vec<(String, usize)>,
    parts: &mut Vec<TemplatePart>,
) {
    let marked: Vec<(String, String)> = tree
        .attributes(node)
        .iter()
        .filter(|a| a.value.contains(MARKER))
        .map(|a| (a.name.clone(), a.value.clone()))
        .collect();

    for (name, value) in marked {
        let segments: Vec<String> = value.split(MARKER).map(str::to_string).collect();
        let needed = segments.len() - 1;
        let matching: Vec<usize> = holes
            .iter()
            .enumerate()
            .filter(|(_, (hole, _))| hole.eq_ignore_ascii_case(&name))
            .map(|(at, _)| at)
            .take(needed)
            .collect();
        if matching.is_empty() {
            log::trace!(target: "ssr_html::compile", "attribute {} is static marker text", name);
            continue;
        }
        tree.remove_attribute(node, &name);
        if matching.len() != needed {
            log::warn!(
                target: "ssr_html::compile",
                "attribute {} has {} markers but {} holes, skipping",
                name,
                needed,
                matching.len()
            );
            continue;
        }
        let value_index = holes[matching[0]].1;
        for at in matching.into_iter().rev() {
            holes.remove(at);
        }
        parts.push(TemplatePart {
            kind: TemplatePartKind::Attribute {
                name,
                strings: AttributeStrings::from_segments(segments),
            },
            index,
            value_index,
        });
    }

    for (name, value_index) in holes {
        log::warn!(
            target: "ssr_html::compile",
            "value {} for attribute {} could not be bound",
            value_index,
            name
        );
    }
}
