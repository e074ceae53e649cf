//! Flat per-hardware-thread lookup tables.
//!
//! Four parallel arrays sized `num_hw_threads`, each mapping a hardware
//! thread ID to the ID of its enclosing core, socket, NUMA node, or
//! last-level-cache group. Entries for hardware threads with no known
//! ancestor (should not happen for a consistent [`crate::topology::Topology`],
//! but tolerated the same way the tree traversal in the domain builder
//! tolerates missing nodes) are left at the sentinel `-1`, so callers that
//! compare against `-1` keep working.

use crate::topology::{NumaInfo, Topology};

/// Four parallel hardware-thread lookup tables.
///
/// Each table is indexed by hardware thread ID and sized
/// `topology.num_hw_threads`. A value of `-1` means "no such ancestor is
/// known for this thread" (including hardware threads the topology simply
/// never mentioned).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreadLookups {
    thread_to_core: Vec<isize>,
    thread_to_socket: Vec<isize>,
    thread_to_numa: Vec<isize>,
    thread_to_shared_llc: Vec<isize>,
}

impl ThreadLookups {
    /// Builds the lookup tables by walking `topology`'s tree once (for
    /// core/socket ancestry) and `numa`'s node list once (for NUMA
    /// ancestry), then walking the last cache level's thread groups.
    pub fn build(topology: &Topology, numa: &NumaInfo) -> Self {
        let n = topology.num_hw_threads;
        let mut thread_to_core = vec![-1isize; n];
        let mut thread_to_socket = vec![-1isize; n];
        let mut thread_to_numa = vec![-1isize; n];
        let mut thread_to_shared_llc = vec![-1isize; n];

        for socket in &topology.sockets {
            for core in &socket.cores {
                for thread in &core.threads {
                    if thread.hwt_id >= n {
                        continue;
                    }
                    thread_to_core[thread.hwt_id] = core.id as isize;
                    thread_to_socket[thread.hwt_id] = socket.id as isize;
                }
            }
        }

        for (node_id, node) in numa.nodes.iter().enumerate() {
            for &hwt_id in &node.processors {
                if hwt_id < n {
                    thread_to_numa[hwt_id] = node_id as isize;
                }
            }
        }

        // The shared-LLC group ID is assigned per distinct group of cores
        // seen at the last cache depth; cores are grouped by
        // `core_id / cores_per_llc` within a socket.
        let threads_per_core = topology.num_threads_per_core();
        let cores_per_llc = (topology.threads_per_llc() / threads_per_core).max(1);
        let mut group_id = 0usize;
        for socket in &topology.sockets {
            for chunk in socket.cores.chunks(cores_per_llc) {
                for core in chunk {
                    for thread in &core.threads {
                        if thread.hwt_id < n {
                            thread_to_shared_llc[thread.hwt_id] = group_id as isize;
                        }
                    }
                }
                group_id += 1;
            }
        }

        ThreadLookups {
            thread_to_core,
            thread_to_socket,
            thread_to_numa,
            thread_to_shared_llc,
        }
    }

    /// Returns the core ID for `hwt_id`, or `-1` if unknown.
    pub fn core_of(&self, hwt_id: usize) -> isize {
        self.thread_to_core.get(hwt_id).copied().unwrap_or(-1)
    }

    /// Returns the socket ID for `hwt_id`, or `-1` if unknown.
    pub fn socket_of(&self, hwt_id: usize) -> isize {
        self.thread_to_socket.get(hwt_id).copied().unwrap_or(-1)
    }

    /// Returns the NUMA node ID for `hwt_id`, or `-1` if unknown.
    pub fn numa_of(&self, hwt_id: usize) -> isize {
        self.thread_to_numa.get(hwt_id).copied().unwrap_or(-1)
    }

    /// Returns the shared last-level-cache group ID for `hwt_id`, or `-1`
    /// if unknown.
    pub fn shared_llc_of(&self, hwt_id: usize) -> isize {
        self.thread_to_shared_llc
            .get(hwt_id)
            .copied()
            .unwrap_or(-1)
    }
}
