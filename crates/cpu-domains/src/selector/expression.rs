//! Expression mode: `E:domain:count[:chunk:stride]`.
//!
//! Walks `domain`'s raw (unsorted) processor list in chunks of `chunk`
//! entries, advancing the cursor by `stride` each step and wrapping back to
//! the start of the list when the cursor runs past its end, until `count`
//! hardware thread IDs have been emitted.

use log::warn;

use crate::domains::AffinityDomains;

pub(crate) fn resolve(segment: &str, domains: &AffinityDomains) -> Vec<usize> {
    let parts: Vec<&str> = segment.split(':').collect();

    let (domain_tag, count, chunk, stride) = match parts.as_slice() {
        ["E", domain, count] => match count.parse::<usize>() {
            Ok(count) => (*domain, count, 1usize, 1usize),
            Err(_) => {
                warn!("Invalid count in expression '{segment}'");
                return Vec::new();
            }
        },
        ["E", domain, count, chunk, stride] => {
            match (count.parse(), chunk.parse(), stride.parse()) {
                (Ok(count), Ok(chunk), Ok(stride)) => (*domain, count, chunk, stride),
                _ => {
                    warn!("Invalid count/chunk/stride in expression '{segment}'");
                    return Vec::new();
                }
            }
        }
        _ => {
            warn!("Not a valid CPU expression '{segment}'");
            return Vec::new();
        }
    };

    let Some(domain) = domains.get(domain_tag) else {
        warn!("Cannot find domain {domain_tag}");
        return Vec::new();
    };

    let list = &domain.processor_list;
    if list.is_empty() || count == 0 {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(count);
    let mut offset = 0usize;
    let mut insert = 0usize;
    for _ in 0..count {
        let mut j = 0usize;
        while j < chunk && offset + j < list.len() {
            result.push(list[offset + j]);
            insert += 1;
            j += 1;
            if insert == count {
                return result;
            }
        }
        offset += stride;
        if offset >= list.len() {
            offset = 0;
        }
        if insert >= count {
            break;
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
    fn default_chunk_and_stride_take_count_entries_in_order() {
        let domains = domains_with("N", vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(resolve("E:N:4", &domains), vec![0, 1, 2, 3]);
    }

    #[test]
    fn chunk_and_stride_wrap_around_the_list() {
        // 8 entries, chunk 2, stride 4: (0,1), wrap to (0,1), ... until 6 taken.
        let domains = domains_with("N", vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(resolve("E:N:6:2:4", &domains), vec![0, 1, 4, 5, 0, 1]);
    }

    #[test]
    fn unknown_domain_returns_empty() {
        let domains = domains_with("N", vec![0, 1]);
        assert!(resolve("E:S3:2", &domains).is_empty());
    }

    #[test]
    fn zero_count_returns_empty() {
        let domains = domains_with("N", vec![0, 1]);
        assert!(resolve("E:N:0", &domains).is_empty());
    }
}
