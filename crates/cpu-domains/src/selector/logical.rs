//! Logical mode: `L:domain:indexlist`.
//!
//! The domain's processor list is first passed through the sort
//! transformation ([`super::sort_transform`]), then `indexlist`'s comma/range
//! items are walked, each index taken modulo the sorted list's length. If the
//! item list asks for more entries than the domain has hardware threads, a
//! warning is logged (unless `LIKWID_SILENT` is set) and emission wraps
//! around: when the running insert count hits the sorted list's length
//! mid-item, emission restarts from the first item in the list *without*
//! resetting the insert counter, so a second (or later) pass through the
//! items continues filling in where the first left off. This "shadowed
//! restart" means an item interrupted partway through a wrap is fully
//! replayed on the next pass.

use log::warn;

use crate::domains::AffinityDomains;
use crate::selector::{parse_item_list, sort_transform};

/// Ceiling on how many hardware thread IDs a single segment emits,
/// independent of the caller's own truncation bound (applied later, in
/// `lib.rs::cpu_list`). Keeps a pathological index list such as
/// `"L:N:0-999999999"` from allocating gigabytes up front.
const MAX_EMIT: usize = 1 << 16;

pub(crate) fn resolve(segment: &str, domains: &AffinityDomains, threads_per_core: usize) -> Vec<usize> {
    let parts: Vec<&str> = segment.split(':').collect();
    let [tag, domain_tag, list_str] = parts.as_slice() else {
        warn!(
            "Invalid expression '{segment}', should look like L:<domain>:<indexlist> or be in a cpuset"
        );
        return Vec::new();
    };
    if *tag != "L" {
        warn!("Not a valid CPU expression '{segment}'");
        return Vec::new();
    }

    let Some(domain) = domains.get(domain_tag) else {
        warn!("Cannot find domain {domain_tag}");
        return Vec::new();
    };

    let sorted = sort_transform(&domain.processor_list, threads_per_core);
    let ret = sorted.len();
    if ret == 0 {
        warn!("Domain {domain_tag} has no processors");
        return Vec::new();
    }

    let items = parse_item_list(list_str);
    let require: usize = items.iter().map(|i| i.width()).sum();
    if require == 0 {
        return Vec::new();
    }

    if require > ret && std::env::var("LIKWID_SILENT").is_err() {
        warn!(
            "Selected affinity domain {domain_tag} has only {ret} hardware threads, but \
             selection string evaluates to {require} threads. This results in multiple \
             threads on the same hardware thread."
        );
    }

    let emit = require.min(MAX_EMIT);
    let mut result = vec![0usize; emit];
    let mut insert = 0usize;
    'redo: loop {
        for item in &items {
            for idx in item.indices() {
                if insert >= emit {
                    break 'redo;
                }
                let pos = idx.rem_euclid(ret as i64) as usize;
                result[insert] = sorted[pos];
                insert += 1;
                if insert == ret {
                    if insert == emit {
                        break 'redo;
                    }
                    continue 'redo;
                }
            }
        }
        break;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::AffinityDomain;

    fn domains_with(tag: &str, list: Vec<usize>) -> AffinityDomains {
        AffinityDomains {
            domains: vec![AffinityDomain {
                tag: tag.to_string(),
                num_cores: list.len(),
                num_processors: list.len(),
                processor_list: list,
            }],
            num_socket_domains: 1,
            num_numa_domains: 1,
            num_processors_per_socket: 0,
            num_cache_domains: 0,
            num_cores_per_cache: 0,
            num_processors_per_cache: 0,
        }
    }

    #[test]
    fn plain_index_list_selects_by_sorted_position() {
        let domains = domains_with("N", vec![0, 1, 2, 3]);
        assert_eq!(resolve("L:N:0-3", &domains, 1), vec![0, 1, 2, 3]);
    }

    #[test]
    fn over_subscription_wraps_with_shadowed_restart() {
        // Domain has 2 threads, caller asks for 3: 0,1,0 (wrap, no reset of
        // the insert counter since the item list itself is replayed).
        let domains = domains_with("N", vec![5, 6]);
        assert_eq!(resolve("L:N:0-2", &domains, 1), vec![5, 6, 5]);
    }

    #[test]
    fn unknown_domain_returns_empty() {
        let domains = domains_with("N", vec![0, 1]);
        assert!(resolve("L:S9:0", &domains, 1).is_empty());
    }

    #[test]
    fn malformed_segment_returns_empty() {
        let domains = domains_with("N", vec![0, 1]);
        assert!(resolve("L:N", &domains, 1).is_empty());
    }
}
