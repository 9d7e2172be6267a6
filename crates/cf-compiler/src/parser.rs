use std::collections::BTreeSet;

use cf_core::types::{ExceptionRule, FilterRule, RuleKind};

/// Output of [`parse_filter_list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedList {
    pub rules: Vec<FilterRule>,
    pub exceptions: Vec<ExceptionRule>,
    pub stats: ParseStats,
}

/// Line counts by classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub comments: usize,
    pub rules: usize,
    pub exceptions: usize,
    pub skipped: usize,
}

/// How a single filter list line was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Comment,
    Exception(ExceptionRule),
    Rule(FilterRule),
    /// Syntax this parser does not understand
    Skipped,
}

/// Parse filter list text. Never fails: unknown lines are skipped.
pub fn parse_filter_list(text: &str) -> ParsedList {
    let mut parsed = ParsedList::default();

    for raw_line in text.lines() {
        parsed.stats.lines += 1;
        match classify_line(raw_line) {
            LineKind::Comment => parsed.stats.comments += 1,
            LineKind::Exception(exception) => {
                parsed.stats.exceptions += 1;
                parsed.exceptions.push(exception);
            }
            LineKind::Rule(rule) => {
                parsed.stats.rules += 1;
                parsed.rules.push(rule);
            }
            LineKind::Skipped => parsed.stats.skipped += 1,
        }
    }

    log::debug!(
        "parsed {} lines: {} rules, {} exceptions, {} skipped",
        parsed.stats.lines,
        parsed.stats.rules,
        parsed.stats.exceptions,
        parsed.stats.skipped
    );

    parsed
}

/// Classify one line. The first matching form wins.
pub fn classify_line(raw_line: &str) -> LineKind {
    let line = raw_line.trim();
    if line.is_empty() || is_comment_line(line) {
        return LineKind::Comment;
    }

    if let Some((domain_part, selector)) = line.split_once("#@#") {
        let (include, exclude) = parse_domains(domain_part);
        return LineKind::Exception(ExceptionRule {
            inclusion_domains: include,
            exclusion_domains: exclude,
            pattern: selector.to_string(),
        });
    }

    if line.starts_with("||") {
        if let Some((domain, ext)) = parse_resource_rule(line) {
            let kind = if ext == "js" { RuleKind::Script } else { RuleKind::Stylesheet };
            return LineKind::Rule(FilterRule::new(kind, format!("||{domain}/*.{ext}")));
        }

        if let Some(domain) = parse_domain_block(line) {
            return LineKind::Rule(FilterRule::new(RuleKind::Element, format!("||{domain}^")));
        }
    }

    if let Some((domain_part, id)) = line.split_once("###") {
        return LineKind::Rule(hiding_rule(domain_part, format!("#{id}")));
    }

    if let Some((domain_part, selector)) = line.split_once("##") {
        return LineKind::Rule(hiding_rule(domain_part, selector.to_string()));
    }

    LineKind::Skipped
}

fn hiding_rule(domain_part: &str, pattern: String) -> FilterRule {
    let (include, exclude) = parse_domains(domain_part);
    FilterRule {
        kind: RuleKind::Element,
        inclusion_domains: include,
        exclusion_domains: exclude,
        pattern,
    }
}

fn is_comment_line(line: &str) -> bool {
    if line.starts_with('!') {
        return true;
    }
    line.starts_with('#') && !line.starts_with("##") && !line.starts_with("#@#")
}

/// `a.com,~b.a.com` → ({a.com}, {b.a.com})
fn parse_domains(domain_part: &str) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut include = BTreeSet::new();
    let mut exclude = BTreeSet::new();

    for token in domain_part.split(',') {
        let token = token.trim();
        if let Some(rest) = token.strip_prefix('~') {
            exclude.insert(rest.to_string());
        } else if !token.is_empty() {
            include.insert(token.to_string());
        }
    }

    (include, exclude)
}

/// `||host/*.js` or `||host/*.css`
fn parse_resource_rule(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("||")?;
    let end = rest.find(['/', '^'])?;
    let (domain, tail) = rest.split_at(end);
    if domain.is_empty() {
        return None;
    }

    match tail {
        "/*.js" => Some((domain, "js")),
        "/*.css" => Some((domain, "css")),
        _ => None,
    }
}

/// `||host^`
fn parse_domain_block(line: &str) -> Option<&str> {
    let domain = line.strip_prefix("||")?.strip_suffix('^')?;
    if domain.is_empty() || domain.contains(['/', '^']) {
        return None;
    }
    Some(domain)
}
