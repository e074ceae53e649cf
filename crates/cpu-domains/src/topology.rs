//! The hardware topology data model.
//!
//! [`Topology`] and [`NumaInfo`] are the two inputs the domain builder
//! ([`crate::domains`]) and the topology lookups ([`crate::lookups`]) operate
//! on. Both are plain, inert data: nothing in this module talks to the
//! operating system. Discovery of real values lives behind
//! [`crate::platform::linux::topology::discover_topology`] and
//! [`crate::platform::linux::numa::discover_numa`]; tests construct these
//! types by hand to exercise the domain builder and selector grammar against
//! known machine shapes.

/// One hardware thread (logical processor) underneath a [`CoreNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreadNode {
    /// The hardware thread ID, as used throughout this crate and by the
    /// affinity syscalls (`sched_setaffinity` et al.).
    pub hwt_id: usize,
    /// Whether this thread is part of the process's current cpuset, i.e.
    /// schedulable by this process. Threads outside the cpuset still appear
    /// in the tree (topology is a property of the machine, not the process)
    /// but are skipped by domain construction and emptied from selector
    /// results.
    pub in_cpu_set: bool,
}

/// One physical core underneath a [`SocketNode`], holding one or more SMT
/// [`ThreadNode`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreNode {
    /// Core ID, unique within its socket.
    pub id: usize,
    /// Hardware threads on this core, ordered by `hwt_id`.
    pub threads: Vec<ThreadNode>,
}

/// One CPU socket (package), holding one or more [`CoreNode`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SocketNode {
    /// Socket ID.
    pub id: usize,
    /// Cores on this socket, ordered by `id`.
    pub cores: Vec<CoreNode>,
}

/// Describes one level of shared cache discovered in the topology. Only the
/// information the domain builder needs is kept: the depth (1 = L1, 2 = L2,
/// 3 = L3/LLC, ...) and how many hardware threads share one instance of a
/// cache at that depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheLevelInfo {
    /// Cache depth/level, e.g. `3` for the last-level cache.
    pub depth: u8,
    /// Number of hardware threads sharing one instance of a cache at this
    /// depth.
    pub threads_per_cache: usize,
}

/// The discovered hardware-thread hierarchy: sockets, each holding cores,
/// each holding hardware threads, plus the cache-level summary the domain
/// builder's "C" (cache) domains are derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Topology {
    /// Sockets, ordered by `id`.
    pub sockets: Vec<SocketNode>,
    /// Cache levels, ordered from innermost (L1) to outermost (LLC). The
    /// last entry is taken to be the last-level cache for the purposes of
    /// cache-domain construction, mirroring the single-LLC assumption the
    /// domain builder makes.
    pub cache_levels: Vec<CacheLevelInfo>,
    /// Total number of hardware threads present on the machine, online or
    /// not. This sizes the lookup tables in [`crate::lookups::ThreadLookups`].
    pub num_hw_threads: usize,
}

impl Topology {
    /// Number of sockets.
    pub fn num_sockets(&self) -> usize {
        self.sockets.len()
    }

    /// Number of cores per socket, assumed uniform across sockets (the same
    /// assumption the domain builder makes for cache- and memory-domain
    /// sizing).
    pub fn num_cores_per_socket(&self) -> usize {
        self.sockets.first().map_or(0, |s| s.cores.len())
    }

    /// Number of SMT threads per core, assumed uniform across cores.
    pub fn num_threads_per_core(&self) -> usize {
        self.sockets
            .first()
            .and_then(|s| s.cores.first())
            .map_or(1, |c| c.threads.len().max(1))
    }

    /// Number of hardware threads currently in the process's cpuset.
    pub fn active_hw_threads(&self) -> usize {
        self.sockets
            .iter()
            .flat_map(|s| &s.cores)
            .flat_map(|c| &c.threads)
            .filter(|t| t.in_cpu_set)
            .count()
    }

    /// The number of hardware threads sharing the last-level cache, i.e.
    /// `cache_levels.last().threads_per_cache`. Defaults to one thread per
    /// core (no cache sharing known) if no cache levels were discovered.
    pub fn threads_per_llc(&self) -> usize {
        self.cache_levels
            .last()
            .map_or(self.num_threads_per_core(), |c| c.threads_per_cache)
    }
}

/// One NUMA node: the set of hardware threads local to that node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumaNode {
    /// Hardware threads belonging to this node.
    pub processors: Vec<usize>,
    /// Number of hardware threads belonging to this node. Kept as a
    /// separate field (rather than derived from `processors.len()`) because
    /// the memory-domain construction in [`crate::domains`] intentionally
    /// preserves a stale count in one edge case; see that module's docs.
    pub num_processors: usize,
}

/// NUMA topology: one [`NumaNode`] per node discovered on the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumaInfo {
    /// Discovered NUMA nodes, ordered by node ID.
    pub nodes: Vec<NumaNode>,
}

impl NumaInfo {
    /// Number of NUMA nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}
