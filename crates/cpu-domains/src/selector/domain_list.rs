//! `nodestr_to_nodelist`/`sockstr_to_socklist`: parse a comma-separated list
//! of plain indices into a list of NUMA-node or socket indices, validating
//! each index against the domain set.
//!
//! Each comma-separated item `k` is prefixed with `prefix` (`"M"` for nodes,
//! `"S"` for sockets) and accepted into the result iff a domain tagged
//! `<prefix><k>` exists; otherwise a `warn!` diagnostic is logged and the
//! item is skipped.

use log::warn;

use crate::domains::AffinityDomains;

fn expr_to_list(expr: &str, prefix: char, domains: &AffinityDomains) -> Vec<usize> {
    let mut result = Vec::new();
    for item in expr.split(',').filter(|s| !s.is_empty()) {
        let Ok(idx) = item.parse::<usize>() else {
            warn!("Invalid index '{item}' in '{expr}'");
            continue;
        };
        let tag = format!("{prefix}{idx}");
        if domains.get(&tag).is_some() {
            result.push(idx);
        } else {
            warn!("Domain {tag} cannot be found");
        }
    }
    result
}

/// Parses a comma-separated list of NUMA node indices, keeping only those
/// for which a `M<idx>` domain exists.
pub fn nodestr_to_nodelist(nodestr: &str, domains: &AffinityDomains) -> Vec<usize> {
    expr_to_list(nodestr, 'M', domains)
}

/// Parses a comma-separated list of socket indices, keeping only those for
/// which an `S<idx>` domain exists.
pub fn sockstr_to_socklist(sockstr: &str, domains: &AffinityDomains) -> Vec<usize> {
    expr_to_list(sockstr, 'S', domains)
}
