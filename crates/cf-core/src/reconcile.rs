//! DOM Reconciliation Engine
//!
//! Applies the merged rule set (removal specs plus element filter rules) to a
//! document subtree. A pass is a full re-application, never a diff, and is
//! idempotent: running it on an already reconciled tree changes nothing.
//!
//! The engine owns its rule snapshot. Hosts call [`Reconciler::reload`] or
//! [`Reconciler::handle_change`] when storage changes and [`Reconciler::run`]
//! whenever the document mutates.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::domain::applies;
use crate::dom::Dom;
use crate::removal::{RemovalItem, RemovalSpec};
use crate::store::{RemovalStore, StoreKey};
use crate::types::{FilterRule, RuleKind};

/// Per-page engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Hostname of the page; filter rules are scoped against it
    pub hostname: String,
    /// Global extension switch
    pub enabled: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            enabled: true,
        }
    }
}

impl ReconcilerConfig {
    pub fn for_host(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }
}

/// Counters for a single pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub elements_removed: usize,
    pub classes_removed: usize,
    pub styles_set: usize,
    pub selector_errors: usize,
}

impl PassReport {
    /// Number of DOM mutations made by the pass.
    pub fn mutations(&self) -> usize {
        self.elements_removed + self.classes_removed + self.styles_set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Applied(PassReport),
    /// Extension switched off, nothing touched
    Disabled,
    /// A pass was already running on this engine
    Busy,
}

/// What a storage change event did to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Reloaded,
    Switched(bool),
    Ignored,
}

pub struct Reconciler {
    config: ReconcilerConfig,
    specs: Vec<RemovalSpec>,
    element_rules: Vec<FilterRule>,
    in_pass: Cell<bool>,
    reported: RefCell<HashSet<String>>,
}

struct PassGuard<'a>(&'a Cell<bool>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self {
            config,
            specs: Vec::new(),
            element_rules: Vec::new(),
            in_pass: Cell::new(false),
            reported: RefCell::new(HashSet::new()),
        }
    }

    /// Engine loaded from `store`.
    pub fn from_store<S: RemovalStore>(config: ReconcilerConfig, store: &S) -> Self {
        let mut reconciler = Self::new(config);
        reconciler.config.enabled = store.extension_enabled();
        reconciler.reload(store.list());
        reconciler
    }

    pub fn hostname(&self) -> &str {
        &self.config.hostname
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// Replace the removal spec snapshot. Disabled specs are dropped here so a
    /// pass never sees them.
    pub fn reload(&mut self, specs: Vec<RemovalSpec>) {
        self.specs = specs.into_iter().filter(|spec| spec.enabled).collect();
        log::debug!("reloaded {} enabled removal specs", self.specs.len());
    }

    /// Replace the filter rule snapshot. Only element rules active on this
    /// page's hostname are kept.
    pub fn reload_filter_rules<I>(&mut self, rules: I)
    where
        I: IntoIterator<Item = FilterRule>,
    {
        let hostname = self.config.hostname.as_str();
        self.element_rules = rules
            .into_iter()
            .filter(|rule| rule.kind == RuleKind::Element && applies(rule, hostname))
            .collect();
        log::debug!(
            "reloaded {} element filter rules for `{}`",
            self.element_rules.len(),
            hostname
        );
    }

    pub fn specs(&self) -> &[RemovalSpec] {
        &self.specs
    }

    pub fn element_rules(&self) -> &[FilterRule] {
        &self.element_rules
    }

    /// React to a storage change event carrying `key`.
    pub fn handle_change<S: RemovalStore>(&mut self, key: &str, store: &S) -> ChangeAction {
        match StoreKey::from_key(key) {
            Some(StoreKey::UserRemovals | StoreKey::EnabledDefaultRemovals) => {
                self.reload(store.list());
                ChangeAction::Reloaded
            }
            Some(StoreKey::ExtensionEnabled) => {
                let enabled = store.extension_enabled();
                self.set_enabled(enabled);
                ChangeAction::Switched(enabled)
            }
            None => ChangeAction::Ignored,
        }
    }

    /// Run one full pass over `root`.
    pub fn run<D: Dom>(&self, dom: &D, root: &D::Node) -> PassOutcome {
        if !self.config.enabled {
            return PassOutcome::Disabled;
        }
        if self.in_pass.replace(true) {
            return PassOutcome::Busy;
        }
        let _guard = PassGuard(&self.in_pass);

        let mut report = PassReport::default();

        for spec in &self.specs {
            for item in spec.items() {
                self.apply_item(dom, root, &spec.id, item, &mut report);
            }
        }

        for rule in &self.element_rules {
            self.apply_item(dom, root, "filter", RemovalItem::Element(&rule.pattern), &mut report);
        }

        if report.mutations() > 0 {
            log::debug!(
                "pass removed {} elements, {} classes, set {} styles",
                report.elements_removed,
                report.classes_removed,
                report.styles_set
            );
        }

        PassOutcome::Applied(report)
    }

    fn apply_item<D: Dom>(
        &self,
        dom: &D,
        root: &D::Node,
        source: &str,
        item: RemovalItem<'_>,
        report: &mut PassReport,
    ) {
        let selector = item.selector();
        let nodes = match dom.query_selector_all(root, selector) {
            Ok(nodes) => nodes,
            Err(err) => {
                report.selector_errors += 1;
                // Every mutation re-runs the pass; only the first failure of a
                // selector is worth a warning.
                if self.reported.borrow_mut().insert(selector.to_string()) {
                    log::warn!("{source}: {err}");
                } else {
                    log::debug!("{source}: {err}");
                }
                return;
            }
        };

        match item {
            RemovalItem::Element(_) => {
                for node in &nodes {
                    // already gone with a matched ancestor
                    if !dom.is_connected(node) {
                        continue;
                    }
                    dom.remove(node);
                    report.elements_removed += 1;
                }
            }
            RemovalItem::Class(removal) => {
                if removal.class_name.is_empty() {
                    return;
                }
                for node in &nodes {
                    if dom.has_class(node, &removal.class_name) {
                        dom.remove_class(node, &removal.class_name);
                        report.classes_removed += 1;
                    }
                }
            }
            RemovalItem::Style(reset) => {
                for node in &nodes {
                    for (property, value) in &reset.styles {
                        if dom.style_property(node, property) != *value {
                            dom.set_style_property(node, property, value);
                            report.styles_set += 1;
                        }
                    }
                }
            }
        }
    }
}
