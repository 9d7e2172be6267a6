use std::collections::HashSet;

use cf_core::types::FilterRule;

pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
}

/// Drop structural duplicates, keeping the first occurrence of each rule.
pub fn optimize_rules(rules: &mut Vec<FilterRule>) -> OptimizeStats {
    let before = rules.len();

    let mut seen: HashSet<FilterRule> = HashSet::with_capacity(before);
    rules.retain(|rule| seen.insert(rule.clone()));

    let after = rules.len();

    OptimizeStats {
        before,
        after,
        deduped: before - after,
    }
}
