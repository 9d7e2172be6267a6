//! Core type definitions for Curtain Fall
//!
//! These types are shared by the filter list compiler, the reconciliation
//! engine and the host bindings. They serialize to the same camelCase JSON
//! layout the extension keeps in storage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// =============================================================================
// Rule Kinds
// =============================================================================

/// What a parsed filter rule targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Element hiding - the pattern is handed to the DOM as a selector
    Element,
    /// Stylesheet request blocking - the pattern is a URL filter
    #[serde(alias = "css")]
    Stylesheet,
    /// Script request blocking - the pattern is a URL filter
    #[serde(alias = "js")]
    Script,
}

impl RuleKind {
    /// True for kinds handled by the host's network-rule subsystem.
    #[inline]
    pub fn is_network(self) -> bool {
        matches!(self, Self::Stylesheet | Self::Script)
    }
}

// =============================================================================
// Domain Scope
// =============================================================================

/// Anything carrying inclusion/exclusion hostname sets.
pub trait DomainScoped {
    fn inclusion_domains(&self) -> &BTreeSet<String>;
    fn exclusion_domains(&self) -> &BTreeSet<String>;
}

// =============================================================================
// Filter Rules
// =============================================================================

/// A structured rule parsed from filter list text.
///
/// Identity is structural: two rules with the same kind, pattern and domain
/// sets are the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule {
    pub kind: RuleKind,
    #[serde(default)]
    pub inclusion_domains: BTreeSet<String>,
    #[serde(default)]
    pub exclusion_domains: BTreeSet<String>,
    pub pattern: String,
}

impl FilterRule {
    /// Rule with no domain restriction.
    pub fn new(kind: RuleKind, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            inclusion_domains: BTreeSet::new(),
            exclusion_domains: BTreeSet::new(),
            pattern: pattern.into(),
        }
    }

    /// Element rule scoped to the given domain sets.
    pub fn element<I, E>(pattern: impl Into<String>, include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            kind: RuleKind::Element,
            inclusion_domains: include.into_iter().map(Into::into).collect(),
            exclusion_domains: exclude.into_iter().map(Into::into).collect(),
            pattern: pattern.into(),
        }
    }
}

impl DomainScoped for FilterRule {
    fn inclusion_domains(&self) -> &BTreeSet<String> {
        &self.inclusion_domains
    }

    fn exclusion_domains(&self) -> &BTreeSet<String> {
        &self.exclusion_domains
    }
}

/// Exception hiding rule (`domain#@#selector`).
///
/// Marks a scope where a filter rule with the same pattern must not apply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionRule {
    #[serde(default)]
    pub inclusion_domains: BTreeSet<String>,
    #[serde(default)]
    pub exclusion_domains: BTreeSet<String>,
    pub pattern: String,
}

impl ExceptionRule {
    pub fn new<I, E>(pattern: impl Into<String>, include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            inclusion_domains: include.into_iter().map(Into::into).collect(),
            exclusion_domains: exclude.into_iter().map(Into::into).collect(),
            pattern: pattern.into(),
        }
    }
}

impl DomainScoped for ExceptionRule {
    fn inclusion_domains(&self) -> &BTreeSet<String> {
        &self.inclusion_domains
    }

    fn exclusion_domains(&self) -> &BTreeSet<String> {
        &self.exclusion_domains
    }
}

// =============================================================================
// Blocking Lists
// =============================================================================

/// A subscribed third-party filter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingList {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Resolved rules from the last successful fetch
    #[serde(default)]
    pub rules: Vec<FilterRule>,
    /// Ids registered with the host's network-rule subsystem
    #[serde(default)]
    pub rule_ids: Vec<u32>,
}

pub(crate) fn default_true() -> bool {
    true
}
