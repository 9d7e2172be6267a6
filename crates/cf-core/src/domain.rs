//! Domain scope matching
//!
//! Hostnames are compared by exact string equality against the tokens stored
//! on the rule. There is no subdomain expansion: a rule scoped to
//! `example.com` does not apply on `sub.example.com`. This is a known
//! limitation kept for compatibility with stored rule sets.

use crate::types::DomainScoped;

/// Returns true if a rule with this scope is active on `hostname`.
///
/// - empty inclusion set: active everywhere except excluded hosts
/// - non-empty inclusion set: active only on listed hosts, minus excluded ones
#[inline]
pub fn applies<R: DomainScoped + ?Sized>(rule: &R, hostname: &str) -> bool {
    if rule.exclusion_domains().contains(hostname) {
        return false;
    }

    let include = rule.inclusion_domains();
    include.is_empty() || include.contains(hostname)
}
