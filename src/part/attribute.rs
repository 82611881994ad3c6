//! Attribute part reconciliation

use crate::dom::{NodeId, Tree};
use crate::template::AttributeStrings;
use crate::value::Value;

/// An attribute whose value is computed from one or more holes
#[derive(Debug)]
pub struct AttributePart {
    element: NodeId,
    name: String,
    strings: AttributeStrings,
    previous: Option<Vec<Value>>,
}

impl AttributePart {
    pub(crate) fn new(element: NodeId, name: String, strings: AttributeStrings) -> Self {
        Self {
            element,
            name,
            strings,
            previous: None,
        }
    }

    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of values this attribute consumes
    pub fn size(&self) -> usize {
        self.strings.holes()
    }

    /// Compute the attribute value and write it, unless nothing changed
    pub(crate) fn set_values(&mut self, tree: &mut Tree, values: Vec<Value>) {
        let unchanged = self.previous.as_ref().is_some_and(|previous| {
            previous.len() == values.len() && previous.iter().zip(&values).all(|(a, b)| a.same(b))
        });
        if unchanged {
            log::trace!(target: "ssr_html::part", "attribute {} unchanged", self.name);
            return;
        }

        if values.iter().any(|v| matches!(v, Value::Absent)) {
            if tree.remove_attribute(self.element, &self.name).is_some() {
                log::trace!(target: "ssr_html::part", "attribute {} left out", self.name);
            }
            self.previous = Some(values);
            return;
        }

        let text = match &self.strings {
            AttributeStrings::Whole => match values.first() {
                Some(Value::Iterable(items)) => items.iter().map(Value::to_attribute_text).collect(),
                Some(value) => value.to_attribute_text(),
                None => String::new(),
            },
            AttributeStrings::Interpolated(segments) => {
                let mut text = String::new();
                for (i, segment) in segments.iter().enumerate() {
                    text.push_str(segment);
                    if let Some(value) = values.get(i).filter(|_| i + 1 < segments.len()) {
                        text.push_str(&value.to_attribute_text());
                    }
                }
                text
            }
        };

        tree.set_attribute(self.element, &self.name, text);
        self.previous = Some(values);
    }
}
