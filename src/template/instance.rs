//! Template instances: a cloned template tree with live parts

use std::rc::Rc;

use crate::dom::{NodeId, Tree};
use crate::part::{FlushReport, Part, UpdateContext};
use crate::template::Template;
use crate::value::Value;
use crate::RenderError;

/// A copy of a compiled template bound to parts in some tree
///
/// `parts[i]` is bound from `template.parts()[i]`.
#[derive(Debug)]
pub struct TemplateInstance {
    template: Rc<Template>,
    parts: Vec<Part>,
}

impl TemplateInstance {
    /// Copy the template tree into `tree` and bind its parts
    ///
    /// Returns the instance and the detached copy of the template root,
    /// whose children are the instance content.
    pub(crate) fn clone_into(
        tree: &mut Tree,
        template: Rc<Template>,
    ) -> Result<(Self, NodeId), RenderError> {
        let root = tree.import(template.tree(), template.root());

        // Same pre-order walk as compilation, so indices line up
        let mut bindings = Vec::with_capacity(template.parts().len());
        let mut pending = template.parts().iter().peekable();
        for (index, node) in tree.preorder(root).into_iter().enumerate() {
            while let Some(part) = pending.next_if(|p| p.index == index) {
                bindings.push((part, node));
            }
        }
        if let Some(unbound) = pending.next() {
            return Err(RenderError::PartMismatch {
                index: unbound.index,
                expected: "node at part index",
            });
        }

        let parts = bindings
            .into_iter()
            .map(|(part, node)| Part::bind(tree, part, node))
            .collect::<Result<Vec<_>, _>>()?;

        log::trace!(
            target: "ssr_html::part",
            "cloned template with {} parts",
            parts.len()
        );
        Ok((Self { template, parts }, root))
    }

    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Distribute `values` to the parts by their value index
    pub(crate) fn update(
        &mut self,
        cx: &mut UpdateContext<'_>,
        values: Vec<Value>,
    ) -> Result<(), RenderError> {
        let expected = self.template.value_count();
        if values.len() != expected {
            if cx.config.strict_value_count {
                return Err(RenderError::ValueCount {
                    expected,
                    found: values.len(),
                });
            }
            log::debug!(
                target: "ssr_html::part",
                "template expects {} values, got {}",
                expected,
                values.len()
            );
        }

        let mut slots: Vec<Option<Value>> = values.into_iter().map(Some).collect();
        let mut take = |at: usize| slots.get_mut(at).and_then(Option::take).unwrap_or_default();

        for (part, compiled) in self.parts.iter_mut().zip(self.template.parts()) {
            let first = compiled.value_index;
            match part {
                Part::Node(node) => node.set_value(cx, take(first))?,
                Part::Attribute(attribute) => {
                    let values = (first..first + attribute.size()).map(&mut take).collect();
                    attribute.set_values(cx.tree, values);
                }
            }
        }
        Ok(())
    }

    /// Apply settled pending values anywhere below this instance
    pub(crate) fn flush(
        &mut self,
        cx: &mut UpdateContext<'_>,
        report: &mut FlushReport,
    ) -> Result<(), RenderError> {
        for part in &mut self.parts {
            if let Part::Node(node) = part {
                node.flush(cx, report)?;
            }
        }
        Ok(())
    }
}
