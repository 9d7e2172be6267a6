//! `Dom` implementation over the browser document.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Node, NodeList};

use cf_core::dom::{Dom, SelectorError};

/// The live browser DOM. Roots may be the `Document` or any `Element`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebDom;

fn collect(list: NodeList) -> Vec<Node> {
    (0..list.length()).filter_map(|i| list.item(i)).collect()
}

fn error_message(err: &JsValue) -> String {
    err.dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"))
}

impl Dom for WebDom {
    type Node = Node;

    fn query_selector_all(&self, root: &Node, selector: &str) -> Result<Vec<Node>, SelectorError> {
        let result = if let Some(document) = root.dyn_ref::<Document>() {
            document.query_selector_all(selector)
        } else if let Some(element) = root.dyn_ref::<Element>() {
            element.query_selector_all(selector)
        } else {
            return Ok(Vec::new());
        };

        result
            .map(collect)
            .map_err(|err| SelectorError::invalid(selector, error_message(&err)))
    }

    fn remove(&self, node: &Node) {
        if let Some(element) = node.dyn_ref::<Element>() {
            element.remove();
        }
    }

    fn is_connected(&self, node: &Node) -> bool {
        node.is_connected()
    }

    fn has_class(&self, node: &Node, class_name: &str) -> bool {
        node.dyn_ref::<Element>()
            .is_some_and(|element| element.class_list().contains(class_name))
    }

    fn remove_class(&self, node: &Node, class_name: &str) {
        if let Some(element) = node.dyn_ref::<Element>() {
            if let Err(err) = element.class_list().remove_1(class_name) {
                log::warn!("Failed to remove class `{}`: {}", class_name, error_message(&err));
            }
        }
    }

    fn style_property(&self, node: &Node, property: &str) -> String {
        node.dyn_ref::<HtmlElement>()
            .and_then(|element| element.style().get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_style_property(&self, node: &Node, property: &str, value: &str) {
        let Some(element) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        if let Err(err) = element.style().set_property(property, value) {
            log::warn!("Failed to set style `{}`: {}", property, error_message(&err));
        }
    }

    fn tag_name(&self, node: &Node) -> String {
        node.dyn_ref::<Element>()
            .map(Element::tag_name)
            .unwrap_or_else(|| node.node_name())
    }

    fn id(&self, node: &Node) -> Option<String> {
        node.dyn_ref::<Element>().map(Element::id)
    }

    fn parent_element(&self, node: &Node) -> Option<Node> {
        node.parent_element().map(Node::from)
    }

    fn previous_element_sibling(&self, node: &Node) -> Option<Node> {
        node.dyn_ref::<Element>()?
            .previous_element_sibling()
            .map(Node::from)
    }
}
