//! Bound parts: the live counterparts of a template's holes

mod attribute;
mod node;

pub use attribute::AttributePart;
pub use node::NodePart;

use crate::dom::{NodeId, Tree};
use crate::renderer::RenderConfig;
use crate::template::{TemplateCache, TemplatePart, TemplatePartKind};
use crate::RenderError;

/// Everything a part needs while applying values
pub(crate) struct UpdateContext<'a> {
    pub tree: &'a mut Tree,
    pub cache: &'a mut TemplateCache,
    pub config: &'a RenderConfig,
}

/// Pending values seen by one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Fulfilled values applied to their parts
    pub resolved: usize,
    /// Rejections swallowed, previous content kept
    pub rejected: usize,
    /// Values still outstanding
    pub pending: usize,
}

impl FlushReport {
    /// No pending values remain
    pub fn is_settled(&self) -> bool {
        self.pending == 0
    }
}

#[derive(Debug)]
pub enum Part {
    Node(NodePart),
    Attribute(AttributePart),
}

impl Part {
    /// Bind a compiled part to its node in a freshly cloned tree
    pub(crate) fn bind(
        tree: &mut Tree,
        template_part: &TemplatePart,
        node: NodeId,
    ) -> Result<Part, RenderError> {
        match &template_part.kind {
            TemplatePartKind::Node => {
                let Some(parent) = tree.parent(node).filter(|_| tree.is_text(node)) else {
                    return Err(RenderError::PartMismatch {
                        index: template_part.index,
                        expected: "anchor text",
                    });
                };
                // The following sibling bounds the region, or a fresh marker
                let end = match tree.next_sibling(node) {
                    Some(next) => next,
                    None => {
                        let end = tree.create_text("");
                        tree.append(parent, end);
                        end
                    }
                };
                Ok(Part::Node(NodePart::new(node, end)))
            }
            TemplatePartKind::Attribute { name, strings } => {
                if !tree.is_element(node) {
                    return Err(RenderError::PartMismatch {
                        index: template_part.index,
                        expected: "element",
                    });
                }
                Ok(Part::Attribute(AttributePart::new(
                    node,
                    name.clone(),
                    strings.clone(),
                )))
            }
        }
    }

    /// Values consumed: `None` for node parts
    pub fn size(&self) -> Option<usize> {
        match self {
            Part::Node(_) => None,
            Part::Attribute(part) => Some(part.size()),
        }
    }
}
