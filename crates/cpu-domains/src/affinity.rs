//! The Pinning Facade: binds the current process or thread to a set of
//! hardware thread IDs.
//!
//! The actual `sched_setaffinity`/`pthread_setaffinity_np` calls live behind
//! [`crate::platform::linux::affinity`].

use crate::error::Result;

/// Binds the calling process to the given hardware thread IDs.
///
/// Always available on Linux. Builds a CPU bitmask from `hwt_ids` and calls
/// `sched_setaffinity(0, ...)`.
pub fn pin_process(hwt_ids: &[usize]) -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        crate::platform::linux::affinity::pin_process(hwt_ids)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = hwt_ids;
        Err(crate::error::Error::Unsupported(
            "Process pinning is only supported on Linux".to_string(),
        ))
    }
}

/// Binds the calling thread to a single hardware thread ID.
///
/// Degrades to a no-op on platforms without thread-level affinity control.
/// There is none on the Linux-only target this crate builds for, but the
/// fallback arm is kept for parity with every other platform-dispatched
/// function in this crate.
pub fn pin_thread(hwt_id: usize) -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        crate::platform::linux::affinity::pin_thread(hwt_id)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = hwt_id;
        Ok(())
    }
}

/// Returns the hardware thread ID the calling thread is currently running
/// on, found as the first set bit of its current affinity mask.
///
/// `num_hw_threads` bounds the scan and should come from the machine's
/// [`crate::topology::Topology::num_hw_threads`].
pub fn current_processor_id(num_hw_threads: usize) -> Result<usize> {
    #[cfg(target_os = "linux")]
    {
        crate::platform::linux::affinity::current_processor_id(num_hw_threads)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = num_hw_threads;
        Err(crate::error::Error::Unsupported(
            "Querying the current processor ID is only supported on Linux".to_string(),
        ))
    }
}
