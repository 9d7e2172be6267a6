//! Removal specs
//!
//! A removal spec is a user- or default-authored bundle of DOM edits:
//! elements to delete, classes to strip and inline styles to reset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::default_true;

/// Strip `class_name` from every element matching `element_selector`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRemoval {
    pub element_selector: String,
    pub class_name: String,
}

/// Set each style property on every element matching `element_selector`.
///
/// An empty value clears the property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleReset {
    pub element_selector: String,
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
}

/// One edit of a removal spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalItem<'a> {
    /// Remove matching elements
    Element(&'a str),
    /// Remove a class from matching elements
    Class(&'a ClassRemoval),
    /// Reset styles on matching elements
    Style(&'a StyleReset),
}

impl<'a> RemovalItem<'a> {
    /// The selector this item matches elements with.
    pub fn selector(&self) -> &'a str {
        match *self {
            Self::Element(selector) => selector,
            Self::Class(item) => &item.element_selector,
            Self::Style(item) => &item.element_selector,
        }
    }
}

/// A removal spec as stored by the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalSpec {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub element_selectors: Vec<String>,
    #[serde(default)]
    pub class_removal: Vec<ClassRemoval>,
    #[serde(default)]
    pub style_reset: Vec<StyleReset>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub is_default: bool,
}

impl RemovalSpec {
    /// Empty, enabled, user-authored spec.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            element_selectors: Vec::new(),
            class_removal: Vec::new(),
            style_reset: Vec::new(),
            enabled: true,
            is_default: false,
        }
    }

    /// Draft spec for an element the user picked on the page.
    pub fn draft(
        id: impl Into<String>,
        name: impl Into<String>,
        selector: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let mut spec = Self::new(id, name);
        spec.description = description;
        spec.element_selectors.push(selector.into());
        spec
    }

    pub fn with_element(mut self, selector: impl Into<String>) -> Self {
        self.element_selectors.push(selector.into());
        self
    }

    pub fn with_class_removal(mut self, selector: impl Into<String>, class_name: impl Into<String>) -> Self {
        self.class_removal.push(ClassRemoval {
            element_selector: selector.into(),
            class_name: class_name.into(),
        });
        self
    }

    pub fn with_style_reset<I, K, V>(mut self, selector: impl Into<String>, styles: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.style_reset.push(StyleReset {
            element_selector: selector.into(),
            styles: styles.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        });
        self
    }

    /// All edits in application order: element removal, class removal,
    /// style reset.
    pub fn items(&self) -> impl Iterator<Item = RemovalItem<'_>> {
        self.element_selectors
            .iter()
            .map(|s| RemovalItem::Element(s.as_str()))
            .chain(self.class_removal.iter().map(RemovalItem::Class))
            .chain(self.style_reset.iter().map(RemovalItem::Style))
    }
}

/// Display name for a removal created on `hostname`: its last two labels.
pub fn removal_name_for_host(hostname: Option<&str>) -> String {
    let host = hostname.map(str::trim).unwrap_or("");
    if host.is_empty() {
        return "New Removal".to_string();
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    match labels.len() {
        0 => "New Removal".to_string(),
        1 => labels[0].to_string(),
        n => format!("{}.{}", labels[n - 2], labels[n - 1]),
    }
}

/// Built-in removal catalog.
pub fn default_removals() -> Vec<RemovalSpec> {
    let mut paywalls = RemovalSpec::new("remove-paywalls", "Remove payment wall")
        .with_element(".cmpbox")
        .with_element(".cmpboxBG")
        .with_style_reset("body", [("overflow", "")]);
    paywalls.description = Some("gutefrage.net, etc.".to_string());
    paywalls.is_default = true;

    let mut cookies = RemovalSpec::new("remove-cookie-consent", "Remove Cookie Consent from News websites")
        .with_element(r#"[id^="sp_message_container_"]"#)
        .with_class_removal("html", "sp-message-open")
        .with_style_reset("html", [("overflow", "")]);
    cookies.description = Some("Spiegel Online, Focus, Welt, etc.".to_string());
    cookies.is_default = true;

    vec![paywalls, cookies]
}
