//! Scatter mode: `<X>:scatter`, where `X` is a domain-tag prefix (`N`/`S`/`C`/`M`).
//!
//! Every domain whose tag starts with `X` and holds at least one processor
//! is collected, each domain's processor list is sort-transformed
//! ([`super::sort_transform`]) to push SMT siblings to the back, and the
//! results are then interleaved round-robin: index 0 of every domain, then
//! index 1 of every domain, and so on. This spreads consecutive selections
//! across sockets/caches/NUMA nodes instead of exhausting one domain before
//! moving to the next.

use log::warn;

use crate::domains::AffinityDomains;
use crate::selector::sort_transform;

pub(crate) fn resolve(segment: &str, domains: &AffinityDomains, threads_per_core: usize) -> Vec<usize> {
    let Some(prefix) = segment.chars().next() else {
        warn!("Empty scatter expression");
        return Vec::new();
    };

    let sorted_lists: Vec<Vec<usize>> = domains
        .with_prefix(prefix)
        .map(|d| sort_transform(&d.processor_list, threads_per_core))
        .collect();

    if sorted_lists.is_empty() {
        warn!("No domains found for scatter prefix '{prefix}'");
        return Vec::new();
    }

    let max_procs = sorted_lists.iter().map(|l| l.len()).max().unwrap_or(0);
    let mut result = Vec::with_capacity(sorted_lists.iter().map(|l| l.len()).sum());
    for off in 0..max_procs {
        for list in &sorted_lists {
            if let Some(&cpu) = list.get(off) {
                result.push(cpu);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::AffinityDomain;

    fn multi_socket_domains() -> AffinityDomains {
        AffinityDomains {
            domains: vec![
                AffinityDomain {
                    tag: "S0".to_string(),
                    num_cores: 2,
                    num_processors: 2,
                    processor_list: vec![0, 1],
                },
                AffinityDomain {
                    tag: "S1".to_string(),
                    num_cores: 2,
                    num_processors: 2,
                    processor_list: vec![2, 3],
                },
            ],
            num_socket_domains: 2,
            num_numa_domains: 1,
            num_processors_per_socket: 2,
            num_cache_domains: 0,
            num_cores_per_cache: 0,
            num_processors_per_cache: 0,
        }
    }

    #[test]
    fn interleaves_round_robin_across_matching_domains() {
        let domains = multi_socket_domains();
        assert_eq!(resolve("S:scatter", &domains, 1), vec![0, 2, 1, 3]);
    }

    #[test]
    fn uneven_domain_sizes_skip_drained_domains_instead_of_reading_garbage() {
        let mut domains = multi_socket_domains();
        domains.domains[1].processor_list = vec![2];
        domains.domains[1].num_processors = 1;
        assert_eq!(resolve("S:scatter", &domains, 1), vec![0, 2, 1]);
    }

    #[test]
    fn no_matching_domains_returns_empty() {
        let domains = multi_socket_domains();
        assert!(resolve("M:scatter", &domains, 1).is_empty());
    }
}
