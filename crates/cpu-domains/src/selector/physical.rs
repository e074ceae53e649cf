//! Physical mode: `[domain:]indexlist`, default domain `N`.
//!
//! Each item in `indexlist` is a literal hardware thread ID (or an
//! inclusive, possibly descending, range of them). An ID is appended only if
//! it is a member of the named domain's processor list; non-members are
//! reported via a `warn!` diagnostic and otherwise skipped, never aborting
//! the rest of the segment.

use log::warn;

use crate::domains::AffinityDomains;
use crate::selector::parse_item_list;

pub(crate) fn resolve(segment: &str, domains: &AffinityDomains) -> Vec<usize> {
    let (domain_tag, list_str) = match segment.split_once(':') {
        Some((domain, list)) => (domain, list),
        None => ("N", segment),
    };

    let Some(domain) = domains.get(domain_tag) else {
        warn!("Cannot find domain {domain_tag}");
        return Vec::new();
    };

    let mut result = Vec::new();
    for item in parse_item_list(list_str) {
        for idx in item.indices() {
            if idx < 0 {
                warn!("CPU {idx} not in domain {domain_tag}");
                continue;
            }
            let cpu = idx as usize;
            if domain.processor_list.contains(&cpu) {
                result.push(cpu);
            } else {
                warn!("CPU {cpu} not in domain {domain_tag}");
            }
        }
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
    fn bare_list_defaults_to_node_domain() {
        let domains = domains_with("N", vec![0, 1, 2, 3]);
        assert_eq!(resolve("1,3", &domains), vec![1, 3]);
    }

    #[test]
    fn explicit_domain_and_range() {
        let domains = domains_with("S0", vec![4, 5, 6, 7]);
        assert_eq!(resolve("S0:4-6", &domains), vec![4, 5, 6]);
    }

    #[test]
    fn ids_outside_the_domain_are_skipped_not_aborted() {
        let domains = domains_with("N", vec![0, 1]);
        assert_eq!(resolve("0,9,1", &domains), vec![0, 1]);
    }

    #[test]
    fn unknown_domain_returns_empty() {
        let domains = domains_with("N", vec![0, 1]);
        assert!(resolve("S5:0", &domains).is_empty());
    }
}
