//! The Domain Builder: groups hardware threads into named affinity domains.
//!
//! Builds domains in a fixed construction order: one Node domain, one Socket
//! domain per socket, one Cache domain per last-level-cache group per
//! socket, then one Memory domain per NUMA node.

use log::{debug, warn};

use crate::topology::{NumaInfo, Topology};

/// One named affinity domain: a tag (`N`, `S0`, `C2`, `M1`, ...) and the
/// ordered list of hardware thread IDs that belong to it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AffinityDomain {
    /// The domain's tag, e.g. `"N"`, `"S0"`, `"C2"`, `"M1"`.
    pub tag: String,
    /// Number of physical cores nominally covered by this domain. For the
    /// memory-domain empty-list edge case (see [`build_domains`]) this
    /// reflects the nominal NUMA node size, not `processor_list.len()`.
    pub num_cores: usize,
    /// Number of hardware threads nominally in this domain. See the note
    /// on `num_cores` above for the one case where this can exceed
    /// `processor_list.len()`.
    pub num_processors: usize,
    /// The ordered hardware thread IDs belonging to this domain, in
    /// core-major/thread-minor tree traversal order.
    pub processor_list: Vec<usize>,
}

/// The full set of affinity domains built for a machine, plus the summary
/// counts used by selector-grammar helpers (`nodestr_to_nodelist` et al.)
/// and by diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AffinityDomains {
    /// All domains, in construction order: `N`, then `S0..Sn`, then
    /// `C0..Cm`, then `M0..Mk`.
    pub domains: Vec<AffinityDomain>,
    /// Number of socket (`S`) domains.
    pub num_socket_domains: usize,
    /// Number of NUMA (`M`) domains.
    pub num_numa_domains: usize,
    /// Number of hardware threads per socket.
    pub num_processors_per_socket: usize,
    /// Number of cache (`C`) domains.
    pub num_cache_domains: usize,
    /// Number of physical cores sharing one last-level cache.
    pub num_cores_per_cache: usize,
    /// Number of hardware threads sharing one last-level cache.
    pub num_processors_per_cache: usize,
}

impl AffinityDomains {
    /// Looks up a domain by its exact tag (e.g. `"S1"`).
    pub fn get(&self, tag: &str) -> Option<&AffinityDomain> {
        self.domains.iter().find(|d| d.tag == tag)
    }

    /// Iterates over domains whose tag starts with `prefix` and which have
    /// at least one processor, in construction order. Used by the Scatter
    /// selector mode.
    pub(crate) fn with_prefix(&self, prefix: char) -> impl Iterator<Item = &AffinityDomain> {
        self.domains
            .iter()
            .filter(move |d| d.tag.starts_with(prefix) && d.num_processors > 0)
    }
}

/// Descends the socket/core/thread tree and emits up to `max_entries`
/// in-cpuset hardware thread IDs into `out[start_idx..]`, core-major and
/// thread-minor, starting at the `core_offset`-th core of socket
/// `socket_id` and visiting at most `core_span` cores.
///
/// Returns the number of entries actually written. Tolerant of a socket or
/// core index that runs past the end of the tree: in that case traversal
/// simply stops and fewer (possibly zero) entries are written.
pub(crate) fn fill(
    topology: &Topology,
    out: &mut [usize],
    start_idx: usize,
    socket_id: usize,
    core_offset: usize,
    core_span: usize,
    max_entries: usize,
) -> usize {
    let Some(socket) = topology.sockets.get(socket_id) else {
        warn!("Cannot find socket {socket_id} in topology tree");
        return 0;
    };

    let mut counter = max_entries;
    let mut cores_visited = 0usize;
    let mut core_idx = core_offset;

    while counter > 0 && cores_visited < core_span {
        let Some(core) = socket.cores.get(core_idx) else {
            warn!("Cannot find core {core_idx} in topology tree");
            break;
        };

        for thread in &core.threads {
            if counter == 0 {
                break;
            }
            if thread.in_cpu_set {
                out[start_idx + (max_entries - counter)] = thread.hwt_id;
                counter -= 1;
            }
        }

        cores_visited += 1;
        core_idx += 1;
    }

    max_entries - counter
}

/// Builds the full set of affinity domains for `topology`/`numa`, in a fixed
/// construction order: one Node domain, one Socket domain per socket, one
/// Cache domain per last-level-cache group per socket, then Memory domains.
///
/// # Memory-domain edge case
///
/// When a socket's per-node cursor (`offset`) runs past the number of cores
/// actually available on that socket, the `fill` call for that node is
/// skipped, but the node's `num_processors`/`num_cores` keep their nominal
/// (pre-fill) value from [`NumaInfo`] rather than resetting to zero: the
/// domain is still constructed, named, and counted, but its
/// `processor_list` is empty. See `DESIGN.md` for the full rationale.
pub fn build_domains(topology: &Topology, numa: &NumaInfo) -> crate::Result<AffinityDomains> {
    let num_socket_domains = topology.num_sockets();
    let num_numa_domains = numa.num_nodes();
    let cores_per_socket = topology.num_cores_per_socket();
    let threads_per_core = topology.num_threads_per_core().max(1);
    let num_processors_per_socket = cores_per_socket * threads_per_core;

    let threads_per_llc = topology.threads_per_llc();
    let num_cores_per_cache = (threads_per_llc / threads_per_core).max(1);
    let num_processors_per_cache = threads_per_llc;
    let num_cache_domains = num_socket_domains * (cores_per_socket / num_cores_per_cache);

    debug!(
        "Affinity: {num_socket_domains} socket domains, {num_numa_domains} NUMA domains, \
         {num_processors_per_socket} processors/socket, {num_cache_domains} cache domains \
         ({num_cores_per_cache} cores/{num_processors_per_cache} processors per cache)"
    );

    let mut domains = Vec::new();

    // Node domain.
    {
        let active = topology.active_hw_threads();
        let mut list = vec![0usize; topology.num_hw_threads.max(active)];
        let filled = if num_socket_domains > 1 {
            let mut offset = 0usize;
            for socket_id in 0..num_socket_domains {
                let written = fill(
                    topology,
                    &mut list,
                    offset,
                    socket_id,
                    0,
                    cores_per_socket,
                    num_processors_per_socket,
                );
                offset += written;
            }
            offset
        } else {
            fill(
                topology,
                &mut list,
                0,
                0,
                0,
                num_socket_domains * cores_per_socket,
                active,
            )
        };
        list.truncate(filled);
        debug!("Affinity domain N: {filled} HW threads on {} cores", num_socket_domains * cores_per_socket);
        domains.push(AffinityDomain {
            tag: "N".to_string(),
            num_cores: num_socket_domains * cores_per_socket,
            num_processors: filled,
            processor_list: list,
        });
    }

    // Socket domains.
    for socket_id in 0..num_socket_domains {
        let mut list = vec![0usize; num_processors_per_socket];
        let written = fill(
            topology,
            &mut list,
            0,
            socket_id,
            0,
            cores_per_socket,
            num_processors_per_socket,
        );
        let filled = written.min(num_processors_per_socket);
        list.truncate(filled);
        debug!("Affinity domain S{socket_id}: {filled} HW threads on {cores_per_socket} cores");
        domains.push(AffinityDomain {
            tag: format!("S{socket_id}"),
            num_cores: cores_per_socket,
            num_processors: filled,
            processor_list: list,
        });
    }

    // Cache domains.
    let caches_per_socket = num_cache_domains / num_socket_domains.max(1);
    let mut cache_index = 0usize;
    for socket_id in 0..num_socket_domains {
        let mut offset = 0usize;
        for _ in 0..caches_per_socket {
            let mut list = vec![0usize; num_processors_per_cache];
            let written = fill(
                topology,
                &mut list,
                0,
                socket_id,
                offset,
                num_cores_per_cache,
                num_processors_per_cache,
            );
            list.truncate(written);
            debug!(
                "Affinity domain C{cache_index}: {written} HW threads on {num_cores_per_cache} cores"
            );
            domains.push(AffinityDomain {
                tag: format!("C{cache_index}"),
                num_cores: num_cores_per_cache,
                num_processors: written,
                processor_list: list,
            });
            offset += written.min(num_cores_per_cache);
            cache_index += 1;
        }
    }

    // Memory domains.
    if num_numa_domains >= num_socket_domains && num_numa_domains > 1 {
        let nodes_per_socket = (num_numa_domains as f64 / num_socket_domains as f64).ceil() as usize;
        let mut node_index = 0usize;
        for socket_id in 0..num_socket_domains {
            let mut offset = 0usize;
            for _ in 0..nodes_per_socket {
                let Some(node) = numa.nodes.get(node_index) else {
                    break;
                };
                let nominal_processors = node.num_processors;
                let nominal_cores = nominal_processors / threads_per_core;
                let tag = format!("M{node_index}");

                if offset >= cores_per_socket * num_socket_domains {
                    // Offset has run off this socket's cores. Skip the fill
                    // call and leave `num_processors`/`num_cores` at their
                    // pre-fill nominal value, with an empty processor list.
                    debug!(
                        "Affinity domain {tag}: offset {offset} exceeds available cores, \
                         emitting empty domain with nominal count {nominal_processors}"
                    );
                    domains.push(AffinityDomain {
                        tag,
                        num_cores: nominal_cores,
                        num_processors: nominal_processors,
                        processor_list: Vec::new(),
                    });
                } else {
                    let mut list = vec![0usize; nominal_processors];
                    let written = fill(
                        topology,
                        &mut list,
                        0,
                        socket_id,
                        offset,
                        nominal_cores,
                        nominal_processors,
                    );
                    list.truncate(written);
                    debug!("Affinity domain {tag}: {written} HW threads on {nominal_cores} cores");
                    domains.push(AffinityDomain {
                        tag,
                        num_cores: nominal_cores,
                        num_processors: written,
                        processor_list: list,
                    });
                    offset += nominal_cores;
                }
                node_index += 1;
            }
        }
    } else {
        let numa_threads = num_processors_per_socket * num_socket_domains;
        let mut list = vec![0usize; numa_threads];
        let mut filled = 0usize;
        for socket_id in 0..num_socket_domains {
            filled += fill(
                topology,
                &mut list,
                filled,
                socket_id,
                0,
                cores_per_socket,
                num_processors_per_socket,
            );
        }
        list.truncate(filled);
        debug!("Affinity domain M0: {filled} HW threads on {} cores", numa_threads / threads_per_core);
        domains.push(AffinityDomain {
            tag: "M0".to_string(),
            num_cores: numa_threads / threads_per_core,
            num_processors: filled,
            processor_list: list,
        });
    }

    Ok(AffinityDomains {
        domains,
        num_socket_domains,
        num_numa_domains,
        num_processors_per_socket,
        num_cache_domains,
        num_cores_per_cache,
        num_processors_per_cache,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{CacheLevelInfo, CoreNode, NumaNode, SocketNode, ThreadNode};

    fn single_socket_topology() -> Topology {
        let cores = (0..4)
            .map(|core_id| CoreNode {
                id: core_id,
                threads: vec![ThreadNode {
                    hwt_id: core_id,
                    in_cpu_set: true,
                }],
            })
            .collect();
        Topology {
            sockets: vec![SocketNode { id: 0, cores }],
            cache_levels: vec![CacheLevelInfo {
                depth: 3,
                threads_per_cache: 4,
            }],
            num_hw_threads: 4,
        }
    }

    fn dual_socket_topology() -> Topology {
        let make_socket = |socket_id: usize, base: usize| SocketNode {
            id: socket_id,
            cores: (0..2)
                .map(|core_id| CoreNode {
                    id: core_id,
                    threads: vec![ThreadNode {
                        hwt_id: base + core_id,
                        in_cpu_set: true,
                    }],
                })
                .collect(),
        };
        Topology {
            sockets: vec![make_socket(0, 0), make_socket(1, 2)],
            cache_levels: vec![CacheLevelInfo {
                depth: 3,
                threads_per_cache: 2,
            }],
            num_hw_threads: 4,
        }
    }

    #[test]
    fn single_socket_builds_node_socket_cache_and_one_memory_domain() {
        let topology = single_socket_topology();
        let numa = NumaInfo {
            nodes: vec![NumaNode {
                processors: vec![0, 1, 2, 3],
                num_processors: 4,
            }],
        };

        let domains = build_domains(&topology, &numa).unwrap();

        assert_eq!(domains.get("N").unwrap().processor_list, vec![0, 1, 2, 3]);
        assert_eq!(domains.get("S0").unwrap().processor_list, vec![0, 1, 2, 3]);
        assert_eq!(domains.get("C0").unwrap().processor_list, vec![0, 1, 2, 3]);
        assert_eq!(domains.get("M0").unwrap().processor_list, vec![0, 1, 2, 3]);
        assert!(domains.get("M1").is_none());
        assert_eq!(domains.num_cache_domains, 1);
    }

    #[test]
    fn dual_socket_with_matching_numa_nodes_builds_one_memory_domain_per_socket() {
        let topology = dual_socket_topology();
        let numa = NumaInfo {
            nodes: vec![
                NumaNode {
                    processors: vec![0, 1],
                    num_processors: 2,
                },
                NumaNode {
                    processors: vec![2, 3],
                    num_processors: 2,
                },
            ],
        };

        let domains = build_domains(&topology, &numa).unwrap();

        assert_eq!(domains.get("S0").unwrap().processor_list, vec![0, 1]);
        assert_eq!(domains.get("S1").unwrap().processor_list, vec![2, 3]);
        assert_eq!(domains.get("M0").unwrap().processor_list, vec![0, 1]);
        assert_eq!(domains.get("M1").unwrap().processor_list, vec![2, 3]);
        assert_eq!(domains.num_numa_domains, 2);
    }

    #[test]
    fn memory_domain_offset_overrun_emits_empty_but_counted_domain() {
        // Three NUMA nodes on a single dual-core socket: the third node's
        // cursor runs past the socket's two cores.
        let topology = single_socket_topology();
        let mut topology = topology;
        topology.sockets[0].cores.truncate(2);
        topology.num_hw_threads = 2;

        let numa = NumaInfo {
            nodes: vec![
                NumaNode {
                    processors: vec![0],
                    num_processors: 1,
                },
                NumaNode {
                    processors: vec![1],
                    num_processors: 1,
                },
                NumaNode {
                    processors: vec![],
                    num_processors: 1,
                },
            ],
        };

        let domains = build_domains(&topology, &numa).unwrap();

        let m2 = domains.get("M2").unwrap();
        assert!(m2.processor_list.is_empty());
        assert_eq!(m2.num_processors, 1);
    }

    #[test]
    fn with_prefix_skips_empty_domains() {
        let topology = dual_socket_topology();
        let numa = NumaInfo {
            nodes: vec![
                NumaNode {
                    processors: vec![0, 1],
                    num_processors: 2,
                },
                NumaNode {
                    processors: vec![2, 3],
                    num_processors: 2,
                },
            ],
        };
        let domains = build_domains(&topology, &numa).unwrap();
        let tags: Vec<&str> = domains.with_prefix('S').map(|d| d.tag.as_str()).collect();
        assert_eq!(tags, vec!["S0", "S1"]);
    }
}
