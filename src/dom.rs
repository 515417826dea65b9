use std::collections::HashMap;

use crate::{Error, Result};

/// Handle to an element in a [`Page`](crate::Page) document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) value: String,
    pub(crate) checked: bool,
    pub(crate) disabled: bool,
}

/// Flat element arena in document order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Dom {
    elements: Vec<Element>,
    id_index: HashMap<String, NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create_element(
        &mut self,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let value = attrs.get("value").cloned().unwrap_or_default();
        let checked = attrs.contains_key("checked");
        let disabled = attrs.contains_key("disabled");
        let id = NodeId(self.elements.len());
        if let Some(id_attr) = attrs.get("id") {
            self.id_index.entry(id_attr.clone()).or_insert(id);
        }
        self.elements.push(Element {
            tag_name,
            attrs,
            value,
            checked,
            disabled,
        });
        id
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Result<&Element> {
        self.elements
            .get(node_id.0)
            .ok_or_else(|| Error::Runtime(format!("unknown node: {}", node_id.0)))
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Result<&mut Element> {
        self.elements
            .get_mut(node_id.0)
            .ok_or_else(|| Error::Runtime(format!("unknown node: {}", node_id.0)))
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.elements
            .get(node_id.0)
            .map(|element| element.tag_name.as_str())
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.elements
            .get(node_id.0)
            .and_then(|element| element.attrs.get(name))
            .map(String::as_str)
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    /// Every element whose `name` attribute equals `name`, in document order.
    pub(crate) fn by_name(&self, name: &str) -> Vec<NodeId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.attrs.get("name").map(String::as_str) == Some(name))
            .map(|(idx, _)| NodeId(idx))
            .collect()
    }

    pub(crate) fn value(&self, node_id: NodeId) -> Result<String> {
        Ok(self.element(node_id)?.value.clone())
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        self.element_mut(node_id)?.value = value.to_string();
        Ok(())
    }

    pub(crate) fn checked(&self, node_id: NodeId) -> Result<bool> {
        Ok(self.element(node_id)?.checked)
    }

    pub(crate) fn set_checked(&mut self, node_id: NodeId, checked: bool) -> Result<()> {
        self.element_mut(node_id)?.checked = checked;
        Ok(())
    }

    pub(crate) fn disabled(&self, node_id: NodeId) -> bool {
        self.elements
            .get(node_id.0)
            .is_some_and(|element| element.disabled)
    }

    pub(crate) fn set_disabled(&mut self, node_id: NodeId, disabled: bool) -> Result<()> {
        self.element_mut(node_id)?.disabled = disabled;
        Ok(())
    }

    /// Clears `checked` on every other radio button sharing `node_id`'s name.
    pub(crate) fn uncheck_radio_group(&mut self, node_id: NodeId) -> Result<()> {
        let Some(name) = self.attr(node_id, "name").map(str::to_string) else {
            return Ok(());
        };
        for other in self.by_name(&name) {
            if other != node_id && self.is_radio_input(other) {
                self.set_checked(other, false)?;
            }
        }
        Ok(())
    }

    pub(crate) fn is_checkable_input(&self, node_id: NodeId) -> bool {
        self.is_radio_input(node_id) || self.input_type_is(node_id, "checkbox")
    }

    pub(crate) fn is_radio_input(&self, node_id: NodeId) -> bool {
        self.input_type_is(node_id, "radio")
    }

    pub(crate) fn is_text_control(&self, node_id: NodeId) -> bool {
        match self.tag_name(node_id) {
            Some(tag) if tag.eq_ignore_ascii_case("textarea") => true,
            Some(tag) if tag.eq_ignore_ascii_case("input") => !self.is_checkable_input(node_id),
            _ => false,
        }
    }

    fn input_type_is(&self, node_id: NodeId, kind: &str) -> bool {
        let is_input = self
            .tag_name(node_id)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("input"));
        is_input
            && self
                .attr(node_id, "type")
                .is_some_and(|value| value.eq_ignore_ascii_case(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn elements_are_indexed_by_id_and_grouped_by_name() -> Result<()> {
        let mut dom = Dom::new();
        let a = dom.create_element("input".into(), attrs(&[("id", "a"), ("name", "title")]));
        let b = dom.create_element("input".into(), attrs(&[("name", "other")]));
        let c = dom.create_element("textarea".into(), attrs(&[("name", "title")]));

        assert_eq!(dom.by_id("a"), Some(a));
        assert_eq!(dom.by_name("title"), vec![a, c]);
        assert_eq!(dom.by_name("other"), vec![b]);
        assert!(dom.by_name("missing").is_empty());
        Ok(())
    }

    #[test]
    fn initial_state_comes_from_attributes() -> Result<()> {
        let mut dom = Dom::new();
        let node = dom.create_element(
            "input".into(),
            attrs(&[("type", "checkbox"), ("checked", "true"), ("disabled", "true")]),
        );
        assert!(dom.checked(node)?);
        assert!(dom.disabled(node));
        assert!(dom.is_checkable_input(node));
        assert!(!dom.is_text_control(node));
        Ok(())
    }

    #[test]
    fn unknown_nodes_are_runtime_errors() {
        let dom = Dom::new();
        assert!(matches!(dom.value(NodeId(3)), Err(Error::Runtime(_))));
        assert!(!dom.disabled(NodeId(3)));
    }
}
