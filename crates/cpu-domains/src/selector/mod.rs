//! The Selector Grammar: parses selector expressions into ordered hardware
//! thread ID lists.
//!
//! A selector string is first split into `@`-separated segments, each
//! resolved independently and concatenated in order. Each segment is
//! dispatched to one of four modes by inspecting its prefix:
//!
//! 1. **Scatter** (contains the substring `"scatter"`), see [`scatter`].
//! 2. **Expression** (`E:domain:count[:chunk:stride]`), see [`expression`].
//! 3. **Logical** (`L:domain:indexlist`), see [`logical`].
//! 4. A bare `N`/`S`/`C`/`M`-prefixed segment containing `:` is auto-upgraded
//!    to Logical mode (`L:` prepended), unconditionally when running inside a
//!    restricted cpuset and otherwise too.
//! 5. **Physical** (`[domain:]indexlist`, default domain `N`), the fallback,
//!    see [`physical`].
//!
//! All modes that resolve against a named domain go through
//! [`crate::domains::AffinityDomains::get`]; diagnostics for unknown domains
//! or out-of-domain CPUs are logged as warnings rather than returned as
//! errors.

mod domain_list;
mod expression;
mod logical;
mod physical;
mod scatter;

use log::info;

pub use domain_list::{nodestr_to_nodelist, sockstr_to_socklist};

use crate::domains::AffinityDomains;

/// Parses a selector expression (possibly containing multiple `@`-separated
/// segments) into an ordered list of hardware thread IDs.
///
/// `threads_per_core` is used by the sort transformation in Scatter and
/// Logical mode. `cpuset_restricted` should be `true` when the calling
/// process's active hardware thread count is less than the machine's total
/// hardware thread count (i.e. the process is confined to a cpuset).
pub fn select(
    expr: &str,
    domains: &AffinityDomains,
    threads_per_core: usize,
    cpuset_restricted: bool,
) -> Vec<usize> {
    let mut result = Vec::new();
    for segment in expr.split('@') {
        if segment.is_empty() {
            continue;
        }
        result.extend(select_segment(
            segment,
            domains,
            threads_per_core,
            cpuset_restricted,
        ));
    }
    result
}

fn select_segment(
    segment: &str,
    domains: &AffinityDomains,
    threads_per_core: usize,
    cpuset_restricted: bool,
) -> Vec<usize> {
    let first = segment.chars().next();

    if segment.contains("scatter") {
        return scatter::resolve(segment, domains, threads_per_core);
    }
    if first == Some('E') {
        return expression::resolve(segment, domains);
    }
    if first == Some('L') {
        return logical::resolve(segment, domains, threads_per_core);
    }

    let is_domain_prefixed = matches!(first, Some('N') | Some('S') | Some('C') | Some('M'))
        && segment.contains(':');

    if cpuset_restricted {
        info!(
            "You are running in a cpuset with a restricted set of CPUs, only logical numbering allowed"
        );
        let upgraded = if is_domain_prefixed {
            format!("L:{segment}")
        } else {
            format!("L:N:{segment}")
        };
        return logical::resolve(&upgraded, domains, threads_per_core);
    }

    if is_domain_prefixed {
        let upgraded = format!("L:{segment}");
        return logical::resolve(&upgraded, domains, threads_per_core);
    }

    physical::resolve(segment, domains)
}

/// Sorts a domain's processor list so that SMT siblings of the same core
/// end up in separate, successive groups instead of being adjacent:
/// `inner = ceil(len / threads_per_core)`; for `off in 0..threads_per_core`,
/// for `i in 0..inner`, emit `input[i * threads_per_core + off]` whenever
/// that index exists. An index past the end of a non-evenly-divisible input
/// (`inner * threads_per_core` can exceed `input.len()`) is simply skipped,
/// which yields the same ordering for every in-bounds element.
pub(crate) fn sort_transform(input: &[usize], threads_per_core: usize) -> Vec<usize> {
    if input.is_empty() || threads_per_core == 0 {
        return input.to_vec();
    }
    let inner = input.len().div_ceil(threads_per_core);
    let mut out = Vec::with_capacity(input.len());
    for off in 0..threads_per_core {
        for i in 0..inner {
            let idx = i * threads_per_core + off;
            if let Some(&value) = input.get(idx) {
                out.push(value);
            }
        }
        if out.len() == input.len() {
            break;
        }
    }
    out
}

/// Parses a comma-separated selector item list into individual items, where
/// each item is either a single index or an inclusive (possibly descending)
/// range.
pub(crate) fn parse_item_list(list: &str) -> Vec<SelectorItem> {
    list.split(',').filter(|s| !s.is_empty()).map(parse_item).collect()
}

/// One item within a comma-separated selector list.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SelectorItem {
    Single(i64),
    Range(i64, i64),
}

impl SelectorItem {
    /// Number of indices this item expands to.
    pub(crate) fn width(&self) -> usize {
        match self {
            SelectorItem::Single(_) => 1,
            SelectorItem::Range(a, b) => (a - b).unsigned_abs() as usize + 1,
        }
    }

    /// Iterates the indices this item expands to, in the item's own order
    /// (a descending range yields its indices descending).
    pub(crate) fn indices(&self) -> Vec<i64> {
        match self {
            SelectorItem::Single(v) => vec![*v],
            SelectorItem::Range(a, b) => {
                if a <= b {
                    (*a..=*b).collect()
                } else {
                    (*b..=*a).rev().collect()
                }
            }
        }
    }
}

fn parse_item(item: &str) -> SelectorItem {
    if let Some(dash) = item.find('-') {
        let (a, b) = item.split_at(dash);
        let b = &b[1..];
        if let (Ok(a), Ok(b)) = (a.parse::<i64>(), b.parse::<i64>()) {
            return SelectorItem::Range(a, b);
        }
    }
    SelectorItem::Single(item.parse::<i64>().unwrap_or(0))
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
    fn at_separated_segments_concatenate_in_order() {
        let domains = domains_with("N", vec![0, 1, 2, 3]);
        assert_eq!(select("0@2", &domains, 1, false), vec![0, 2]);
    }

    #[test]
    fn empty_segments_are_ignored() {
        let domains = domains_with("N", vec![0, 1]);
        assert_eq!(select("0@@1", &domains, 1, false), vec![0, 1]);
    }

    #[test]
    fn domain_prefixed_segment_with_colon_upgrades_to_logical_mode() {
        let domains = domains_with("N", vec![5, 6, 7, 8]);
        // "N:0-1" would be read literally by Physical mode, but since it's
        // domain-prefixed it goes through Logical mode (sorted-position
        // indexing) instead.
        assert_eq!(select("N:0-1", &domains, 1, false), vec![5, 6]);
    }

    #[test]
    fn cpuset_restricted_forces_logical_mode_even_for_bare_lists() {
        let domains = domains_with("N", vec![5, 6, 7, 8]);
        assert_eq!(select("0-1", &domains, 1, true), vec![5, 6]);
    }

    #[test]
    fn sort_transform_groups_smt_siblings_to_the_back() {
        // 4 hardware threads, 2 per core: (0,1) on core 0, (2,3) on core 1.
        // threads_per_core=2 should push index-1-within-core entries back.
        assert_eq!(sort_transform(&[0, 1, 2, 3], 2), vec![0, 2, 1, 3]);
    }

    #[test]
    fn sort_transform_tolerates_non_divisible_lengths() {
        assert_eq!(sort_transform(&[0, 1, 2], 2), vec![0, 2, 1]);
    }

    #[test]
    fn parse_item_list_splits_commas_and_ranges() {
        let items = parse_item_list("0,2-4,9");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].indices(), vec![0]);
        assert_eq!(items[1].indices(), vec![2, 3, 4]);
        assert_eq!(items[2].indices(), vec![9]);
    }

    #[test]
    fn parse_item_list_handles_descending_ranges() {
        let items = parse_item_list("4-2");
        assert_eq!(items[0].indices(), vec![4, 3, 2]);
        assert_eq!(items[0].width(), 3);
    }
}
