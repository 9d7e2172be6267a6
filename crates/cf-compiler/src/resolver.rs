//! Exception resolution
//!
//! Drops filter rules overridden by an exception rule. This runs once per
//! rule set change and does not depend on the page; callers narrow the
//! result to the current hostname with `cf_core::domain::applies`.

use std::collections::HashMap;

use cf_core::types::{ExceptionRule, FilterRule};

/// Remove every rule suppressed by `exceptions`, keeping relative order.
pub fn resolve_rules(rules: Vec<FilterRule>, exceptions: &[ExceptionRule]) -> Vec<FilterRule> {
    if exceptions.is_empty() {
        return rules;
    }

    let mut by_pattern: HashMap<&str, Vec<&ExceptionRule>> = HashMap::new();
    for exception in exceptions {
        by_pattern.entry(exception.pattern.as_str()).or_default().push(exception);
    }

    let before = rules.len();
    let resolved: Vec<FilterRule> = rules
        .into_iter()
        .filter(|rule| {
            by_pattern
                .get(rule.pattern.as_str())
                .map_or(true, |candidates| !candidates.iter().any(|e| suppresses(e, rule)))
        })
        .collect();

    log::debug!("exceptions suppressed {} of {} rules", before - resolved.len(), before);
    resolved
}

/// True if `exception` overrides `rule`.
///
/// Requires an identical pattern, an overlapping scope (an exception without
/// inclusion domains covers everything) and no exception exclusion naming one
/// of the rule's inclusion domains.
pub fn suppresses(exception: &ExceptionRule, rule: &FilterRule) -> bool {
    if exception.pattern != rule.pattern {
        return false;
    }

    let overlap = exception.inclusion_domains.is_empty()
        || exception
            .inclusion_domains
            .iter()
            .any(|domain| rule.inclusion_domains.contains(domain));

    let conflict = exception
        .exclusion_domains
        .iter()
        .any(|domain| rule.inclusion_domains.contains(domain));

    overlap && !conflict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_filter_list;
    use cf_core::types::RuleKind;

    fn none() -> Vec<String> {
        Vec::new()
    }

    #[test]
    fn test_universal_exception_drops_scoped_rule() {
        let rule = FilterRule::element(".ad", ["a.com"], none());
        let exception = ExceptionRule::new(".ad", none(), none());
        assert!(resolve_rules(vec![rule], &[exception]).is_empty());
    }

    #[test]
    fn test_pattern_must_match_exactly() {
        let rule = FilterRule::element(".ad", none(), none());
        let exception = ExceptionRule::new(".ad ", none(), none());
        assert_eq!(resolve_rules(vec![rule.clone()], &[exception]), vec![rule]);
    }

    #[test]
    fn test_scoped_exception_needs_overlap() {
        let on_a = FilterRule::element(".ad", ["a.com"], none());
        let on_b = FilterRule::element(".ad", ["b.com"], none());
        let everywhere = FilterRule::element(".ad", none(), none());
        let exception = ExceptionRule::new(".ad", ["a.com"], none());

        let resolved = resolve_rules(vec![on_a, on_b.clone(), everywhere.clone()], &[exception]);
        assert_eq!(resolved, vec![on_b, everywhere]);
    }

    #[test]
    fn test_exclusion_conflict_keeps_rule() {
        let rule = FilterRule::element(".ad", ["a.com"], none());
        let exception = ExceptionRule::new(".ad", none(), ["a.com"]);
        assert_eq!(resolve_rules(vec![rule.clone()], &[exception]), vec![rule]);
    }

    #[test]
    fn test_network_rules_can_be_suppressed_by_pattern() {
        let rule = FilterRule::new(RuleKind::Script, "||ads.example.com/*.js");
        let exception = ExceptionRule::new("||ads.example.com/*.js", none(), none());
        assert!(!suppresses(&exception, &FilterRule::new(RuleKind::Script, "||x.com/*.js")));
        assert!(resolve_rules(vec![rule], &[exception]).is_empty());
    }

    #[test]
    fn test_resolves_parsed_list_in_order() {
        let parsed = parse_filter_list(
            "example.com##.ad-banner\n\
             ##.sticky\n\
             news.com##.ad-banner\n\
             example.com#@#.ad-banner\n",
        );
        let resolved = resolve_rules(parsed.rules, &parsed.exceptions);
        let patterns: Vec<(&str, Vec<&String>)> = resolved
            .iter()
            .map(|r| (r.pattern.as_str(), r.inclusion_domains.iter().collect()))
            .collect();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].0, ".sticky");
        assert_eq!(patterns[1].0, ".ad-banner");
        assert_eq!(patterns[1].1, vec!["news.com"]);
    }
}
