//! Linux sysfs-backed NUMA node discovery.
//!
//! Walks `/sys/devices/system/node/node*/cpulist`, the same way `topology.rs`
//! walks `/sys/devices/system/cpu`. Falls back to a single synthetic node
//! covering every hardware thread in `topology` when the kernel was built
//! without NUMA support (no `node*` directories present).

use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::platform::linux::utils::read_cpu_range_list;
use crate::topology::{NumaInfo, NumaNode, Topology};

const NODE_SYSFS_ROOT: &str = "/sys/devices/system/node";

pub(crate) fn discover_numa(topology: &Topology) -> Result<NumaInfo> {
    discover_numa_at(Path::new(NODE_SYSFS_ROOT), topology)
}

pub(crate) fn discover_numa_at(node_base: &Path, topology: &Topology) -> Result<NumaInfo> {
    let Ok(entries) = std::fs::read_dir(node_base) else {
        debug!("No NUMA sysfs tree at {node_base:?}, falling back to a single synthetic node");
        return Ok(single_node_fallback(topology));
    };

    let mut node_dirs: Vec<(usize, std::path::PathBuf)> = entries
        .flatten()
        .filter_map(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.strip_prefix("node")
                .filter(|rest| rest.bytes().all(|b| b.is_ascii_digit()) && !rest.is_empty())
                .and_then(|rest| rest.parse::<usize>().ok())
                .map(|id| (id, e.path()))
        })
        .collect();
    node_dirs.sort_by_key(|(id, _)| *id);

    if node_dirs.is_empty() {
        debug!("No node* directories under {node_base:?}, falling back to a single synthetic node");
        return Ok(single_node_fallback(topology));
    }

    let mut nodes = Vec::with_capacity(node_dirs.len());
    for (node_id, path) in node_dirs {
        let processors = match read_cpu_range_list(&path.join("cpulist")) {
            Ok(set) => set.into_iter().collect::<Vec<_>>(),
            Err(e) => {
                debug!("Failed to read cpulist for NUMA node {node_id}: {e}");
                Vec::new()
            }
        };
        let num_processors = processors.len();
        nodes.push(NumaNode {
            processors,
            num_processors,
        });
    }

    Ok(NumaInfo { nodes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{CoreNode, SocketNode, ThreadNode};
    use std::fs;

    fn sample_topology() -> Topology {
        Topology {
            sockets: vec![SocketNode {
                id: 0,
                cores: vec![CoreNode {
                    id: 0,
                    threads: vec![ThreadNode {
                        hwt_id: 0,
                        in_cpu_set: true,
                    }],
                }],
            }],
            cache_levels: vec![],
            num_hw_threads: 1,
        }
    }

    #[test]
    fn discovers_nodes_from_sysfs() {
        let root = std::env::temp_dir().join("cpu-domains-test-numa-basic");
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("node0")).unwrap();
        fs::create_dir_all(root.join("node1")).unwrap();
        fs::write(root.join("node0/cpulist"), "0-1\n").unwrap();
        fs::write(root.join("node1/cpulist"), "2-3\n").unwrap();

        let numa = discover_numa_at(&root, &sample_topology()).unwrap();
        assert_eq!(numa.num_nodes(), 2);
        assert_eq!(numa.nodes[0].processors, vec![0, 1]);
        assert_eq!(numa.nodes[1].processors, vec![2, 3]);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn falls_back_to_single_node_when_no_numa_tree_exists() {
        let root = std::env::temp_dir().join("cpu-domains-test-numa-missing");
        let _ = fs::remove_dir_all(&root);

        let numa = discover_numa_at(&root, &sample_topology()).unwrap();
        assert_eq!(numa.num_nodes(), 1);
        assert_eq!(numa.nodes[0].processors, vec![0]);
    }
}

fn single_node_fallback(topology: &Topology) -> NumaInfo {
    let processors: Vec<usize> = topology
        .sockets
        .iter()
        .flat_map(|s| &s.cores)
        .flat_map(|c| &c.threads)
        .filter(|t| t.in_cpu_set)
        .map(|t| t.hwt_id)
        .collect();
    let num_processors = processors.len();
    NumaInfo {
        nodes: vec![NumaNode {
            processors,
            num_processors,
        }],
    }
}
