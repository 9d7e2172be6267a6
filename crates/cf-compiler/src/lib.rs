//! Curtain Fall Filter List Compiler
//!
//! This crate turns Adblock-Plus style filter list text into resolved
//! `cf_core` rules and describes the network-blockable ones for the host.

pub mod network;
pub mod optimizer;
pub mod parser;
pub mod resolver;

use cf_core::types::FilterRule;

pub use network::{generate_network_rules, NetworkRule, RuleIdAllocator};
pub use optimizer::optimize_rules;
pub use parser::{classify_line, parse_filter_list, LineKind, ParseStats, ParsedList};
pub use resolver::resolve_rules;

/// Counters for one compiled list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub parse: ParseStats,
    pub suppressed: usize,
    pub deduped: usize,
    pub rules: usize,
}

/// Parse, resolve exceptions and dedupe a filter list.
pub fn compile_filter_list(text: &str) -> (Vec<FilterRule>, CompileStats) {
    let parsed = parse_filter_list(text);
    let parsed_rules = parsed.rules.len();

    let mut rules = resolve_rules(parsed.rules, &parsed.exceptions);
    let suppressed = parsed_rules - rules.len();
    let optimize = optimize_rules(&mut rules);

    let stats = CompileStats {
        parse: parsed.stats,
        suppressed,
        deduped: optimize.deduped,
        rules: rules.len(),
    };
    (rules, stats)
}
