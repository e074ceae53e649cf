//! Linux sysfs-backed discovery of the hardware-thread tree and cache
//! levels that feed [`crate::domains::build_domains`].
//!
//! Walks `/sys/devices/system/cpu` to find every online hardware thread's
//! owning socket (`topology/physical_package_id`) and core
//! (`topology/core_id`), then walks one representative thread's
//! `cache/index*` directories to determine the last-level cache's sharing
//! width. Cache sizes, line sizes, and core types are not tracked, only
//! the sharing width the domain builder needs.

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::platform::linux::utils::{read_cpu_range_list, read_sysfs_value};
use crate::topology::{CacheLevelInfo, CoreNode, SocketNode, ThreadNode, Topology};

const CPU_SYSFS_ROOT: &str = "/sys/devices/system/cpu";

/// Walks `/sys/devices/system/cpu` to build the socket/core/thread tree and
/// the cache-level summary for the current machine.
pub(crate) fn discover_topology() -> Result<Topology> {
    discover_topology_at(Path::new(CPU_SYSFS_ROOT))
}

pub(crate) fn discover_topology_at(cpu_base: &Path) -> Result<Topology> {
    if !cpu_base.exists() {
        return Err(Error::Detection(format!(
            "CPU sysfs path not found: {cpu_base:?}"
        )));
    }

    let online = read_cpu_range_list(&cpu_base.join("online"))?;
    if online.is_empty() {
        return Err(Error::Detection(
            "No online CPUs reported by the system".to_string(),
        ));
    }
    debug!("Online hardware threads: {:?}", online);

    let num_hw_threads = count_cpu_dirs(cpu_base);

    let mut sockets: BTreeMap<usize, BTreeMap<usize, Vec<ThreadNode>>> = BTreeMap::new();
    for &hwt_id in &online {
        let topo_path = cpu_base.join(format!("cpu{hwt_id}")).join("topology");
        let socket_id = read_sysfs_value::<usize>(&topo_path.join("physical_package_id"))
            .unwrap_or_else(|_| {
                warn!("Cannot determine socket for hardware thread {hwt_id}, assuming 0");
                0
            });
        let core_id = read_sysfs_value::<usize>(&topo_path.join("core_id")).unwrap_or(hwt_id);

        sockets
            .entry(socket_id)
            .or_default()
            .entry(core_id)
            .or_default()
            .push(ThreadNode {
                hwt_id,
                in_cpu_set: true,
            });
    }

    let sockets = sockets
        .into_iter()
        .map(|(socket_id, cores)| SocketNode {
            id: socket_id,
            cores: cores
                .into_iter()
                .map(|(core_id, mut threads)| {
                    threads.sort_by_key(|t| t.hwt_id);
                    CoreNode {
                        id: core_id,
                        threads,
                    }
                })
                .collect(),
        })
        .collect();

    let cache_levels = discover_cache_levels(cpu_base, &online);

    Ok(Topology {
        sockets,
        cache_levels,
        num_hw_threads: num_hw_threads.max(online.iter().copied().max().map_or(0, |m| m + 1)),
    })
}

/// Counts `cpuN` directories under `cpu_base` (online or not) to size the
/// lookup tables in [`crate::lookups::ThreadLookups`].
fn count_cpu_dirs(cpu_base: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(cpu_base) else {
        return 0;
    };
    entries
        .flatten()
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.strip_prefix("cpu")
                .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        })
        .count()
}

/// Reads `cache/index*/{level,shared_cpu_list}` for one representative
/// online hardware thread and returns one [`CacheLevelInfo`] per distinct
/// depth found, ordered from innermost to outermost.
fn discover_cache_levels(cpu_base: &Path, online: &std::collections::BTreeSet<usize>) -> Vec<CacheLevelInfo> {
    let Some(&representative) = online.iter().next() else {
        return Vec::new();
    };
    let cache_path = cpu_base.join(format!("cpu{representative}")).join("cache");
    let Ok(entries) = std::fs::read_dir(&cache_path) else {
        debug!("No cache sysfs tree at {cache_path:?}");
        return Vec::new();
    };

    let mut levels = BTreeMap::new();
    for entry in entries.flatten() {
        let index_path = entry.path();
        if !index_path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with("index"))
        {
            continue;
        }
        let Ok(depth) = read_sysfs_value::<u8>(&index_path.join("level")) else {
            continue;
        };
        let Ok(shared) = read_cpu_range_list(&index_path.join("shared_cpu_list")) else {
            continue;
        };
        levels
            .entry(depth)
            .and_modify(|count: &mut usize| *count = (*count).max(shared.len()))
            .or_insert(shared.len());
    }

    levels
        .into_iter()
        .map(|(depth, threads_per_cache)| CacheLevelInfo {
            depth,
            threads_per_cache,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Builds a minimal fake `/sys/devices/system/cpu` tree for two
    /// single-threaded cores on one socket, sharing one L3 cache, under a
    /// fresh temp directory.
    fn fake_cpu_sysfs(name: &str) -> std::path::PathBuf {
        let root = std::env::temp_dir().join(format!("cpu-domains-test-{name}"));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("online"), "0-1\n").unwrap();

        for cpu in 0..2 {
            let topo = root.join(format!("cpu{cpu}/topology"));
            fs::create_dir_all(&topo).unwrap();
            fs::write(topo.join("physical_package_id"), "0\n").unwrap();
            fs::write(topo.join("core_id"), format!("{cpu}\n")).unwrap();

            let index0 = root.join(format!("cpu{cpu}/cache/index0"));
            fs::create_dir_all(&index0).unwrap();
            fs::write(index0.join("level"), "3\n").unwrap();
            fs::write(index0.join("shared_cpu_list"), "0-1\n").unwrap();
        }
        root
    }

    #[test]
    fn discovers_sockets_cores_and_cache_levels_from_sysfs() {
        let root = fake_cpu_sysfs("topology-basic");
        let topology = discover_topology_at(&root).unwrap();

        assert_eq!(topology.num_sockets(), 1);
        assert_eq!(topology.sockets[0].cores.len(), 2);
        assert_eq!(topology.cache_levels, vec![CacheLevelInfo {
            depth: 3,
            threads_per_cache: 2,
        }]);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_sysfs_root_is_a_detection_error() {
        let root = std::env::temp_dir().join("cpu-domains-test-definitely-missing");
        let _ = fs::remove_dir_all(&root);
        assert!(discover_topology_at(&root).is_err());
    }
}
