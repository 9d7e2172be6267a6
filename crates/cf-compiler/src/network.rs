//! Network rule generation
//!
//! Script and stylesheet rules are blocked by the host's declarative request
//! rule subsystem, not by this engine. This module only describes them in the
//! shape that subsystem consumes. Element rules are never forwarded.

use serde::{Deserialize, Serialize};

use cf_core::types::{FilterRule, RuleKind};

/// Resource types understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Script,
    Stylesheet,
}

impl ResourceType {
    fn for_kind(kind: RuleKind) -> Option<Self> {
        match kind {
            RuleKind::Script => Some(Self::Script),
            RuleKind::Stylesheet => Some(Self::Stylesheet),
            RuleKind::Element => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NetworkAction {
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCondition {
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
}

/// One declarative blocking rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRule {
    pub id: u32,
    pub action: NetworkAction,
    pub condition: NetworkCondition,
}

/// Hands out rule ids. The host requires ids to be unique and positive.
#[derive(Debug, Clone)]
pub struct RuleIdAllocator {
    /// `None` once `u32::MAX` has been handed out
    next: Option<u32>,
}

impl Default for RuleIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleIdAllocator {
    pub fn new() -> Self {
        Self { next: Some(1) }
    }

    /// Allocator whose first id is above every id in `taken`.
    pub fn after<I: IntoIterator<Item = u32>>(taken: I) -> Self {
        let max = taken.into_iter().max().unwrap_or(0);
        Self {
            next: max.checked_add(1),
        }
    }

    /// Next free id, or `None` when the id space is used up.
    pub fn next_id(&mut self) -> Option<u32> {
        let id = self.next?;
        self.next = id.checked_add(1);
        Some(id)
    }
}

/// Describe the network-blockable rules in `rules`. Rules past the end of the
/// id space are left out.
pub fn generate_network_rules(rules: &[FilterRule], ids: &mut RuleIdAllocator) -> Vec<NetworkRule> {
    let mut network = Vec::new();
    for rule in rules {
        let Some(resource) = ResourceType::for_kind(rule.kind) else {
            continue;
        };
        let Some(id) = ids.next_id() else {
            log::warn!("network rule ids exhausted, dropping '{}' and later rules", rule.pattern);
            break;
        };
        network.push(NetworkRule {
            id,
            action: NetworkAction::Block,
            condition: NetworkCondition {
                url_filter: rule.pattern.clone(),
                resource_types: vec![resource],
            },
        });
    }
    network
}
