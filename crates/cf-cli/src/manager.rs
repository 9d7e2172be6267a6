//! Blocking-list lifecycle: subscribe, refresh, toggle and remove lists, and
//! keep the network rule registry in step with them.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use cf_compiler::compile_filter_list;
use cf_core::{BlockingList, FilterRule};

use crate::error::ListError;
use crate::fetch::ListFetcher;
use crate::registry::NetworkRuleRegistry;
use crate::store::BlockingListStore;

/// Outcome of one refresh round.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: usize,
    /// Ids of lists that could not be fetched or registered; they keep their
    /// previous rules
    pub failed: Vec<String>,
    pub skipped_disabled: usize,
}

pub struct BlockingListManager<S, F, R> {
    store: S,
    fetcher: F,
    registry: R,
}

impl<S, F, R> BlockingListManager<S, F, R>
where
    S: BlockingListStore,
    F: ListFetcher,
    R: NetworkRuleRegistry,
{
    pub fn new(store: S, fetcher: F, registry: R) -> Self {
        Self {
            store,
            fetcher,
            registry,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn lists(&self) -> Result<Vec<BlockingList>, ListError> {
        self.store.load()
    }

    /// Subscribe to a new list. Nothing is stored when the first fetch fails,
    /// and nothing stays registered when the list cannot be stored.
    pub async fn create(&mut self, name: &str, url: &str) -> Result<BlockingList, ListError> {
        let mut lists = self.store.load()?;
        let text = self.fetcher.fetch(url).await?;
        let (rules, stats) = compile_filter_list(&text);
        let rule_ids = self.registry.register(&rules)?;

        let list = BlockingList {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            url: url.to_string(),
            enabled: true,
            rules,
            rule_ids,
        };

        lists.push(list.clone());
        if let Err(err) = self.store.save(&lists) {
            if let Err(release_err) = self.registry.release(&list.rule_ids) {
                tracing::warn!(error = %release_err, "failed to release rules of unsaved list");
            }
            return Err(err);
        }

        tracing::info!(
            id = %list.id,
            name,
            rules = stats.rules,
            network_rules = list.rule_ids.len(),
            "added blocking list"
        );
        Ok(list)
    }

    /// Re-fetch every enabled list. A list whose fetch or registration fails
    /// is left as it was; the others are still refreshed and saved.
    pub async fn refresh_all(&mut self) -> Result<RefreshReport, ListError> {
        let mut lists = self.store.load()?;
        let mut report = RefreshReport::default();

        for list in lists.iter_mut() {
            if !list.enabled {
                report.skipped_disabled += 1;
                continue;
            }

            match self.refresh_one(list).await {
                Ok(rules) => {
                    report.refreshed += 1;
                    tracing::debug!(name = %list.name, rules, "refreshed blocking list");
                }
                Err(err) => {
                    tracing::warn!(name = %list.name, error = %err, "refresh failed, keeping previous rules");
                    report.failed.push(list.id.clone());
                }
            }
        }

        self.store.save(&lists)?;
        Ok(report)
    }

    /// Swap in freshly fetched rules. New rules are registered before the old
    /// ones are released, so on error `list` and the registry still agree.
    async fn refresh_one(&mut self, list: &mut BlockingList) -> Result<usize, ListError> {
        let text = self.fetcher.fetch(&list.url).await?;
        let (rules, stats) = compile_filter_list(&text);

        let rule_ids = self.registry.register(&rules)?;
        if let Err(err) = self.registry.release(&list.rule_ids) {
            if let Err(rollback_err) = self.registry.release(&rule_ids) {
                tracing::warn!(error = %rollback_err, "failed to release replacement rules");
            }
            return Err(err);
        }

        list.rule_ids = rule_ids;
        list.rules = rules;
        Ok(stats.rules)
    }

    /// Enable or disable a list. Disabled lists have no registered network
    /// rules. Returns `None` for an unknown id.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<Option<BlockingList>, ListError> {
        let mut lists = self.store.load()?;
        let Some(list) = lists.iter_mut().find(|list| list.id == id) else {
            return Ok(None);
        };

        let mut registered = Vec::new();
        if list.enabled != enabled {
            if enabled {
                list.rule_ids = self.registry.register(&list.rules)?;
                registered = list.rule_ids.clone();
            } else {
                self.registry.release(&list.rule_ids)?;
                list.rule_ids.clear();
            }
            list.enabled = enabled;
        }

        let updated = list.clone();
        if let Err(err) = self.store.save(&lists) {
            if let Err(release_err) = self.registry.release(&registered) {
                tracing::warn!(error = %release_err, "failed to release rules of unsaved list");
            }
            return Err(err);
        }
        Ok(Some(updated))
    }

    /// Remove a list and release its network rules.
    pub fn delete(&mut self, id: &str) -> Result<Option<BlockingList>, ListError> {
        let mut lists = self.store.load()?;
        let Some(index) = lists.iter().position(|list| list.id == id) else {
            return Ok(None);
        };

        self.registry.release(&lists[index].rule_ids)?;
        let removed = lists.remove(index);
        self.store.save(&lists)?;

        tracing::info!(id, name = %removed.name, "deleted blocking list");
        Ok(Some(removed))
    }

    /// Rules of all enabled lists, in list order.
    pub fn enabled_rules(&self) -> Result<Vec<FilterRule>, ListError> {
        Ok(self
            .store
            .load()?
            .into_iter()
            .filter(|list| list.enabled)
            .flat_map(|list| list.rules)
            .collect())
    }

    /// Refresh on a fixed period, starting immediately. Never returns.
    pub async fn watch(&mut self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.refresh_all().await {
                Ok(report) => tracing::info!(
                    refreshed = report.refreshed,
                    failed = report.failed.len(),
                    "periodic refresh done"
                ),
                Err(err) => tracing::warn!(error = %err, "periodic refresh failed"),
            }
        }
    }
}
