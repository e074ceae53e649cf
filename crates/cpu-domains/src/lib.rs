//! CPU topology and affinity domain management for Linux.
//!
//! This crate discovers a machine's hardware parallelism hierarchy
//! (sockets, last-level caches, NUMA memory nodes, cores, hardware
//! threads), groups hardware threads into named "affinity domains" (`N`,
//! `S0..Sn`, `C0..Cm`, `M0..Mk`), and parses a small selector language that
//! resolves to an ordered list of hardware thread IDs for process/thread
//! pinning.
//!
//! # Key Features
//!
//! * **Topology & NUMA discovery** ([`topology()`], [`numa_info()`]):
//!   builds a read-only [`Topology`]/[`NumaInfo`] snapshot from
//!   `/sys/devices/system/cpu` and `/sys/devices/system/node`.
//! * **Topology lookups** ([`thread_lookups()`]): flat hardware-thread →
//!   {core, socket, NUMA node, shared-LLC} arrays.
//! * **Affinity domains** ([`affinity_domains()`], [`build_domains()`]):
//!   the ordered Node/Socket/Cache/Memory domain set hardware threads are
//!   grouped into.
//! * **Selector grammar** ([`cpu_list()`], [`select()`]): parses
//!   expressions like `"S0:0-3"`, `"E:S1:4:2:4"`, `"S:scatter"`, or
//!   `"L:N:0-3"` into an ordered hardware-thread ID list.
//! * **Pinning facade** ([`pin_process()`], [`pin_thread()`],
//!   [`current_processor_id()`]): binds the process or calling thread to a
//!   resolved hardware-thread ID list.
//!
//! # Getting Started
//!
//! ```no_run
//! use cpu_domains::{affinity_domains, cpu_list, pin_process};
//!
//! fn main() -> cpu_domains::Result<()> {
//!     let domains = affinity_domains()?;
//!     println!("Discovered {} affinity domains", domains.domains.len());
//!
//!     let cpus = cpu_list("S0:scatter", 4)?;
//!     pin_process(&cpus)?;
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! * `serde`: enables (de)serialization of the topology/domain data model.

mod affinity;
mod domains;
mod error;
mod lookups;
mod platform;
mod selector;
mod topology;

use std::sync::OnceLock;

pub use affinity::{current_processor_id, pin_process, pin_thread};
pub use domains::{AffinityDomain, AffinityDomains, build_domains};
pub use error::{Error, Result};
pub use lookups::ThreadLookups;
pub use selector::{nodestr_to_nodelist, select, sockstr_to_socklist};
pub use topology::{CacheLevelInfo, CoreNode, NumaInfo, NumaNode, SocketNode, ThreadNode, Topology};

/// Discovers (and caches) the machine's hardware-thread topology.
///
/// Detection runs once, on the first call from anywhere in the process;
/// subsequent calls return the cached snapshot.
pub fn topology() -> Result<&'static Topology> {
    static TOPOLOGY: OnceLock<Result<Topology>> = OnceLock::new();
    match TOPOLOGY.get_or_init(|| {
        #[cfg(target_os = "linux")]
        {
            platform::linux::topology::discover_topology()
        }
        #[cfg(not(target_os = "linux"))]
        {
            Err(Error::Unsupported(
                "Topology discovery is only supported on Linux".to_string(),
            ))
        }
    }) {
        Ok(topology) => Ok(topology),
        Err(e) => Err(e.clone()),
    }
}

/// Discovers (and caches) the machine's NUMA node layout.
///
/// Depends on [`topology()`] to fall back to a single synthetic node when
/// the kernel reports no NUMA sysfs tree.
pub fn numa_info() -> Result<&'static NumaInfo> {
    static NUMA: OnceLock<Result<NumaInfo>> = OnceLock::new();
    match NUMA.get_or_init(|| {
        let topology = topology()?;
        #[cfg(target_os = "linux")]
        {
            platform::linux::numa::discover_numa(topology)
        }
        #[cfg(not(target_os = "linux"))]
        {
            let _ = topology;
            Err(Error::Unsupported(
                "NUMA discovery is only supported on Linux".to_string(),
            ))
        }
    }) {
        Ok(numa) => Ok(numa),
        Err(e) => Err(e.clone()),
    }
}

/// Builds (and caches) the flat per-hardware-thread lookup tables.
pub fn thread_lookups() -> Result<&'static ThreadLookups> {
    static LOOKUPS: OnceLock<Result<ThreadLookups>> = OnceLock::new();
    match LOOKUPS.get_or_init(|| {
        let topology = topology()?;
        let numa = numa_info()?;
        Ok(ThreadLookups::build(topology, numa))
    }) {
        Ok(lookups) => Ok(lookups),
        Err(e) => Err(e.clone()),
    }
}

/// Builds (and caches) the full set of affinity domains for the current
/// machine.
///
/// This is a convenience on top of the explicitly-owned [`build_domains`];
/// callers that manage their own topology/NUMA snapshots (e.g. tests) should
/// call [`build_domains`] directly instead.
pub fn affinity_domains() -> Result<&'static AffinityDomains> {
    static DOMAINS: OnceLock<Result<AffinityDomains>> = OnceLock::new();
    match DOMAINS.get_or_init(|| {
        let topology = topology()?;
        let numa = numa_info()?;
        build_domains(topology, numa)
    }) {
        Ok(domains) => Ok(domains),
        Err(e) => Err(e.clone()),
    }
}

/// Resolves a selector expression against the cached affinity domains,
/// truncating the result to at most `max` hardware thread IDs.
///
/// `cpuset_restricted` is derived automatically from whether the machine's
/// active hardware-thread count is less than its total hardware-thread
/// count.
pub fn cpu_list(expr: &str, max: usize) -> Result<Vec<usize>> {
    let topology = topology()?;
    let domains = affinity_domains()?;
    let cpuset_restricted = topology.active_hw_threads() < topology.num_hw_threads;
    let mut list = select(
        expr,
        domains,
        topology.num_threads_per_core(),
        cpuset_restricted,
    );
    list.truncate(max);
    Ok(list)
}
