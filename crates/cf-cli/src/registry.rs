//! Network rule registry
//!
//! Stands in for the host's declarative request-blocking subsystem: it owns
//! the id space and the registered rule descriptions.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use cf_compiler::{generate_network_rules, NetworkRule, RuleIdAllocator};
use cf_core::FilterRule;

use crate::error::ListError;

pub trait NetworkRuleRegistry {
    /// Register the network-blockable rules among `rules`, returning their ids.
    fn register(&mut self, rules: &[FilterRule]) -> Result<Vec<u32>, ListError>;

    /// Drop previously registered ids. Unknown ids are ignored.
    fn release(&mut self, ids: &[u32]) -> Result<(), ListError>;
}

/// Registry persisted as a JSON array of rules.
pub struct JsonFileRegistry {
    path: PathBuf,
    rules: Vec<NetworkRule>,
}

impl JsonFileRegistry {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ListError> {
        let path = path.into();
        let rules = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| ListError::json(&path, e))?,
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(ListError::io(&path, err)),
        };
        Ok(Self { path, rules })
    }

    pub fn rules(&self) -> &[NetworkRule] {
        &self.rules
    }

    fn persist(&self) -> Result<(), ListError> {
        let text = serde_json::to_string_pretty(&self.rules).map_err(|e| ListError::json(&self.path, e))?;
        fs::write(&self.path, text).map_err(|e| ListError::io(&self.path, e))
    }
}

impl NetworkRuleRegistry for JsonFileRegistry {
    fn register(&mut self, rules: &[FilterRule]) -> Result<Vec<u32>, ListError> {
        let mut ids = RuleIdAllocator::after(self.rules.iter().map(|rule| rule.id));
        let added = generate_network_rules(rules, &mut ids);
        if added.is_empty() {
            return Ok(Vec::new());
        }

        let assigned: Vec<u32> = added.iter().map(|rule| rule.id).collect();
        self.rules.extend(added);
        self.persist()?;

        tracing::debug!(count = assigned.len(), "registered network rules");
        Ok(assigned)
    }

    fn release(&mut self, ids: &[u32]) -> Result<(), ListError> {
        if ids.is_empty() {
            return Ok(());
        }
        let before = self.rules.len();
        self.rules.retain(|rule| !ids.contains(&rule.id));
        if self.rules.len() != before {
            self.persist()?;
        }
        Ok(())
    }
}
