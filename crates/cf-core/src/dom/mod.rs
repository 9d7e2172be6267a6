//! Host document abstraction
//!
//! The engine never parses or matches selectors itself. Everything it does to
//! a page goes through [`Dom`], which the host implements on top of its native
//! document (the browser binding wraps `web_sys`).

#[cfg(test)]
pub mod testing;

/// Error returned when the host rejects a selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("Invalid selector `{selector}`: {reason}")]
    Invalid { selector: String, reason: String },
}

impl SelectorError {
    pub fn invalid(selector: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

/// A live, mutable document.
///
/// All methods take `&self`; hosts are expected to use interior mutability,
/// the same way a browser document is shared.
pub trait Dom {
    /// Handle to a node. Cheap to clone.
    type Node: Clone;

    /// Every element under `root` (excluding `root`) matching `selector`, in
    /// document order.
    fn query_selector_all(&self, root: &Self::Node, selector: &str) -> Result<Vec<Self::Node>, SelectorError>;

    /// Detach `node` from its parent.
    fn remove(&self, node: &Self::Node);

    /// False once `node` or one of its ancestors has been detached.
    fn is_connected(&self, node: &Self::Node) -> bool;

    fn has_class(&self, node: &Self::Node, class_name: &str) -> bool;

    fn remove_class(&self, node: &Self::Node, class_name: &str);

    /// Inline style value of `property`, empty when unset.
    fn style_property(&self, node: &Self::Node, property: &str) -> String;

    /// Set an inline style property. An empty value clears it.
    fn set_style_property(&self, node: &Self::Node, property: &str, value: &str);

    /// Element tag name, any case.
    fn tag_name(&self, node: &Self::Node) -> String;

    /// Value of the `id` attribute, if present.
    fn id(&self, node: &Self::Node) -> Option<String>;

    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

    fn previous_element_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
}
