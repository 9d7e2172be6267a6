//! Removal spec store
//!
//! The extension persists removal specs under three storage keys. The
//! engine only needs [`RemovalStore::list`]; [`MemoryRemovalStore`] is the
//! in-memory form of that storage, shared by the browser binding and the
//! tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::removal::{default_removals, RemovalSpec};
use crate::types::default_true;

/// Storage keys the host emits change events for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    UserRemovals,
    EnabledDefaultRemovals,
    ExtensionEnabled,
}

impl StoreKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserRemovals => "userRemovals",
            Self::EnabledDefaultRemovals => "enabledDefaultRemovals",
            Self::ExtensionEnabled => "extensionEnabled",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "userRemovals" => Some(Self::UserRemovals),
            "enabledDefaultRemovals" => Some(Self::EnabledDefaultRemovals),
            "extensionEnabled" => Some(Self::ExtensionEnabled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Removal `{0}` is built in and can only be toggled")]
    BuiltIn(String),
    #[error("Removal `{0}` already exists")]
    DuplicateId(String),
}

/// Read side of the removal store.
pub trait RemovalStore {
    /// All specs, defaults first, then user specs. Includes disabled ones.
    fn list(&self) -> Vec<RemovalSpec>;

    /// Global switch; when false nothing is applied.
    fn extension_enabled(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledOverride {
    pub enabled: bool,
}

/// Serialized storage contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    pub user_removals: Vec<RemovalSpec>,
    #[serde(default)]
    pub enabled_default_removals: BTreeMap<String, EnabledOverride>,
    #[serde(default = "default_true")]
    pub extension_enabled: bool,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            user_removals: Vec::new(),
            enabled_default_removals: BTreeMap::new(),
            extension_enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryRemovalStore {
    defaults: Vec<RemovalSpec>,
    overrides: BTreeMap<String, EnabledOverride>,
    user: Vec<RemovalSpec>,
    extension_enabled: bool,
}

impl Default for MemoryRemovalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemovalStore {
    /// Store seeded with the built-in catalog and no user specs.
    pub fn new() -> Self {
        Self::with_defaults(default_removals())
    }

    pub fn with_defaults(defaults: Vec<RemovalSpec>) -> Self {
        Self {
            defaults,
            overrides: BTreeMap::new(),
            user: Vec::new(),
            extension_enabled: true,
        }
    }

    /// Rebuild from storage contents on top of the built-in catalog.
    pub fn from_state(state: StoreState) -> Self {
        Self {
            defaults: default_removals(),
            overrides: state.enabled_default_removals,
            user: state.user_removals,
            extension_enabled: state.extension_enabled,
        }
    }

    pub fn to_state(&self) -> StoreState {
        StoreState {
            user_removals: self.user.clone(),
            enabled_default_removals: self.overrides.clone(),
            extension_enabled: self.extension_enabled,
        }
    }

    pub fn get(&self, id: &str) -> Option<RemovalSpec> {
        self.list().into_iter().find(|spec| spec.id == id)
    }

    fn is_builtin(&self, id: &str) -> bool {
        self.defaults.iter().any(|spec| spec.id == id)
    }

    pub fn add(&mut self, mut spec: RemovalSpec) -> Result<StoreKey, StoreError> {
        if self.is_builtin(&spec.id) || self.user.iter().any(|s| s.id == spec.id) {
            return Err(StoreError::DuplicateId(spec.id));
        }
        spec.is_default = false;
        self.user.push(spec);
        Ok(StoreKey::UserRemovals)
    }

    /// Replace a user spec. `Ok(None)` when no spec has this id.
    pub fn update(&mut self, id: &str, mut spec: RemovalSpec) -> Result<Option<StoreKey>, StoreError> {
        if self.is_builtin(id) {
            return Err(StoreError::BuiltIn(id.to_string()));
        }
        let Some(slot) = self.user.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        spec.id = id.to_string();
        spec.is_default = false;
        *slot = spec;
        Ok(Some(StoreKey::UserRemovals))
    }

    /// Delete a user spec. `Ok(None)` when no spec has this id.
    pub fn delete(&mut self, id: &str) -> Result<Option<StoreKey>, StoreError> {
        if self.is_builtin(id) {
            return Err(StoreError::BuiltIn(id.to_string()));
        }
        let before = self.user.len();
        self.user.retain(|s| s.id != id);
        Ok((self.user.len() != before).then_some(StoreKey::UserRemovals))
    }

    /// Enable or disable a spec. Built-in specs are toggled through the
    /// override map so the catalog itself stays untouched.
    pub fn toggle(&mut self, id: &str, enabled: bool) -> Option<StoreKey> {
        if self.is_builtin(id) {
            self.overrides.insert(id.to_string(), EnabledOverride { enabled });
            return Some(StoreKey::EnabledDefaultRemovals);
        }
        let spec = self.user.iter_mut().find(|s| s.id == id)?;
        spec.enabled = enabled;
        Some(StoreKey::UserRemovals)
    }

    pub fn set_extension_enabled(&mut self, enabled: bool) -> StoreKey {
        self.extension_enabled = enabled;
        StoreKey::ExtensionEnabled
    }
}

impl RemovalStore for MemoryRemovalStore {
    fn list(&self) -> Vec<RemovalSpec> {
        let defaults = self.defaults.iter().map(|spec| {
            let mut spec = spec.clone();
            if let Some(o) = self.overrides.get(&spec.id) {
                spec.enabled = o.enabled;
            }
            spec
        });
        defaults.chain(self.user.iter().cloned()).collect()
    }

    fn extension_enabled(&self) -> bool {
        self.extension_enabled
    }
}
