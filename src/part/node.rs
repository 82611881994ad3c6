//! Node part reconciliation
//!
//! A node part owns the siblings strictly between its `start` and `end`
//! boundary nodes and keeps them in step with the last value it was given,
//! touching as few nodes as possible.

use std::mem;
use std::rc::Rc;

use crate::dom::{NodeId, NodeKind, Tree};
use crate::part::{FlushReport, UpdateContext};
use crate::template::{TemplateInstance, TemplateResult};
use crate::value::{Deferred, Fragment, Primitive, Settlement, Value};
use crate::RenderError;

/// What the region currently shows
#[derive(Debug, Default)]
enum NodeState {
    #[default]
    Empty,
    Text(Primitive),
    Instance(Box<TemplateInstance>),
    Items(Vec<NodePart>),
    Node(Fragment),
    Pending(Deferred),
}

#[derive(Debug)]
pub struct NodePart {
    start: NodeId,
    end: NodeId,
    state: NodeState,
}

impl NodePart {
    pub(crate) fn new(start: NodeId, end: NodeId) -> Self {
        Self {
            start,
            end,
            state: NodeState::Empty,
        }
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    /// The instance rendered here, if the last value was a template
    pub fn instance(&self) -> Option<&TemplateInstance> {
        match &self.state {
            NodeState::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// The per-item parts, if the last value was an iterable
    pub fn items(&self) -> Option<&[NodePart]> {
        match &self.state {
            NodeState::Items(parts) => Some(parts),
            _ => None,
        }
    }

    /// Check if this part is waiting on a pending value
    pub fn is_pending(&self) -> bool {
        matches!(self.state, NodeState::Pending(_))
    }

    pub(crate) fn set_value(
        &mut self,
        cx: &mut UpdateContext<'_>,
        value: Value,
    ) -> Result<(), RenderError> {
        match value {
            Value::Primitive(primitive) => {
                if matches!(&self.state, NodeState::Text(previous) if *previous == primitive) {
                    log::trace!(target: "ssr_html::part", "primitive unchanged");
                    return Ok(());
                }
                self.set_text(cx.tree, primitive);
                Ok(())
            }
            Value::Template(result) => self.set_template(cx, result),
            Value::Iterable(items) => self.set_iterable(cx, items),
            Value::Node(fragment) => {
                self.set_node(cx.tree, fragment);
                Ok(())
            }
            Value::Pending(deferred) => {
                // Content stays as it was until the value settles
                self.state = NodeState::Pending(deferred);
                Ok(())
            }
            Value::Until {
                pending,
                placeholder,
            } => {
                if matches!(&self.state, NodeState::Pending(current) if current.ptr_eq(&pending)) {
                    log::trace!(target: "ssr_html::part", "still waiting on the same value");
                    return Ok(());
                }
                if let Settlement::Fulfilled(value) = pending.poll() {
                    return self.set_value(cx, value);
                }
                self.set_value(cx, *placeholder)?;
                self.state = NodeState::Pending(pending);
                Ok(())
            }
            Value::Absent => self.set_value(cx, Value::NULL),
            Value::Display(display) => {
                self.set_text(cx.tree, Primitive::Str(display.to_string()));
                Ok(())
            }
        }
    }

    /// The only node in the region, when it is a text node
    fn lone_text(&self, tree: &Tree) -> Option<NodeId> {
        let first = tree.next_sibling(self.start)?;
        let lone = first != self.end
            && tree.next_sibling(first) == Some(self.end)
            && tree.is_text(first);
        lone.then_some(first)
    }

    fn set_text(&mut self, tree: &mut Tree, primitive: Primitive) {
        let text = primitive.to_text();
        match self.lone_text(tree) {
            Some(node) => {
                log::trace!(target: "ssr_html::part", "updating text in place");
                tree.set_text(node, text);
            }
            None => {
                self.clear(tree);
                let node = tree.create_text(text);
                tree.insert_before(self.end, node);
            }
        }
        self.state = NodeState::Text(primitive);
    }

    fn set_template(
        &mut self,
        cx: &mut UpdateContext<'_>,
        result: TemplateResult,
    ) -> Result<(), RenderError> {
        let template = cx.cache.get_or_compile(&result)?;
        let values = result.into_values();

        if let NodeState::Instance(instance) = &mut self.state {
            if Rc::ptr_eq(instance.template(), &template) {
                log::trace!(target: "ssr_html::part", "reusing template instance");
                return instance.update(cx, values);
            }
        }

        self.clear(cx.tree);
        let (instance, fragment) = TemplateInstance::clone_into(cx.tree, template)?;
        cx.tree.move_children_before(fragment, self.end);
        cx.tree.remove(fragment);
        self.state = NodeState::Instance(Box::new(instance));
        match &mut self.state {
            NodeState::Instance(instance) => instance.update(cx, values),
            _ => Ok(()),
        }
    }

    fn set_iterable(
        &mut self,
        cx: &mut UpdateContext<'_>,
        items: Vec<Value>,
    ) -> Result<(), RenderError> {
        let mut parts = match mem::take(&mut self.state) {
            NodeState::Items(parts) => parts,
            _ => {
                self.clear(cx.tree);
                Vec::new()
            }
        };

        let mut count = 0;
        for item in items {
            if count == parts.len() {
                // Items after the first start at a separator before our end
                let start = match parts.last_mut() {
                    None => self.start,
                    Some(last) => {
                        let separator = cx.tree.create_text("");
                        cx.tree.insert_before(self.end, separator);
                        last.set_end(separator);
                        separator
                    }
                };
                parts.push(NodePart::new(start, self.end));
            }
            if let Err(err) = parts[count].set_value(cx, item) {
                self.state = NodeState::Items(parts);
                return Err(err);
            }
            count += 1;
        }

        if count == 0 {
            self.clear(cx.tree);
            self.state = NodeState::Empty;
            return Ok(());
        }

        if count < parts.len() {
            log::trace!(
                target: "ssr_html::part",
                "dropping {} trailing items",
                parts.len() - count
            );
            let separator = parts[count - 1].end;
            parts.truncate(count);
            cx.tree.remove_range(separator, self.end);
            parts[count - 1].set_end(self.end);
        }

        self.state = NodeState::Items(parts);
        Ok(())
    }

    fn set_node(&mut self, tree: &mut Tree, fragment: Fragment) {
        if matches!(&self.state, NodeState::Node(previous) if previous.ptr_eq(&fragment)) {
            return;
        }
        self.clear(tree);
        let copy = tree.import(fragment.tree(), fragment.root());
        match tree.kind(copy) {
            NodeKind::Fragment | NodeKind::Document => {
                tree.move_children_before(copy, self.end);
                tree.remove(copy);
            }
            _ => {
                tree.insert_before(self.end, copy);
            }
        }
        self.state = NodeState::Node(fragment);
    }

    /// Move the end boundary, carrying along a nested last item that shared it
    fn set_end(&mut self, end: NodeId) {
        let previous = mem::replace(&mut self.end, end);
        if let NodeState::Items(parts) = &mut self.state {
            if let Some(last) = parts.last_mut().filter(|last| last.end == previous) {
                last.set_end(end);
            }
        }
    }

    /// Remove everything strictly between the boundaries
    pub(crate) fn clear(&mut self, tree: &mut Tree) {
        tree.remove_between(self.start, self.end);
    }

    /// Apply settled pending values in this part and below
    pub(crate) fn flush(
        &mut self,
        cx: &mut UpdateContext<'_>,
        report: &mut FlushReport,
    ) -> Result<(), RenderError> {
        let settlement = match &mut self.state {
            NodeState::Pending(deferred) => deferred.poll(),
            NodeState::Instance(instance) => return instance.flush(cx, report),
            NodeState::Items(parts) => {
                for part in parts.iter_mut() {
                    part.flush(cx, report)?;
                }
                return Ok(());
            }
            _ => return Ok(()),
        };

        match settlement {
            Settlement::Waiting => report.pending += 1,
            Settlement::Fulfilled(value) => {
                log::trace!(target: "ssr_html::part", "applying resolved {} value", value.kind_name());
                report.resolved += 1;
                self.set_value(cx, value)?;
            }
            Settlement::Rejected => {
                log::warn!(target: "ssr_html::part", "pending value rejected, keeping previous content");
                report.rejected += 1;
                self.state = NodeState::Empty;
            }
        }
        Ok(())
    }
}
