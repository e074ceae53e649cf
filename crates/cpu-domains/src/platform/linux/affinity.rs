//! Linux backend for the Pinning Facade ([`crate::affinity`]).
//!
//! `sched_setaffinity` binds the whole process, `pthread_setaffinity_np`
//! binds a single pthread, and `sched_getaffinity` plus a first-set-bit
//! scan recovers the current processor ID.

use log::{debug, error};

use crate::error::{Error, Result};

/// Builds a `cpu_set_t` containing `hwt_ids`.
///
/// SAFETY: `cpu_set_t` is POD with no non-zeroable invariants; zero-init
/// followed by `CPU_ZERO` yields a valid, empty set.
fn build_cpu_set(hwt_ids: &[usize]) -> Result<libc::cpu_set_t> {
    if hwt_ids.is_empty() {
        return Err(Error::Affinity(
            "Cannot build a CPU set from an empty hardware-thread list".to_string(),
        ));
    }

    let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    unsafe {
        libc::CPU_ZERO(&mut set);
    }

    let max_cpus = libc::CPU_SETSIZE as usize;
    let mut added = 0usize;
    for &hwt_id in hwt_ids {
        if hwt_id >= max_cpus {
            error!("Hardware thread ID {hwt_id} exceeds CPU_SETSIZE {max_cpus}, skipping");
            continue;
        }
        // SAFETY: CPU_SET is safe given a valid cpu_set_t pointer and an
        // in-range CPU index, both of which hold here.
        unsafe {
            libc::CPU_SET(hwt_id, &mut set);
        }
        added += 1;
    }

    if added == 0 {
        return Err(Error::Affinity(
            "No valid hardware thread IDs could be added to the CPU set".to_string(),
        ));
    }

    Ok(set)
}

/// Binds the calling process to `hwt_ids` via `sched_setaffinity(0, ...)`.
pub(crate) fn pin_process(hwt_ids: &[usize]) -> Result<()> {
    let set = build_cpu_set(hwt_ids)?;
    debug!("Pinning process to hardware threads {hwt_ids:?}");

    // SAFETY: sched_setaffinity with pid 0 targets the calling process;
    // `set` was just initialized above to a valid, non-empty mask.
    let res = unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) };
    if res == -1 {
        let err = std::io::Error::last_os_error();
        error!("sched_setaffinity failed: {err}");
        return Err(Error::Affinity(format!("sched_setaffinity failed: {err}")));
    }
    Ok(())
}

/// Binds the calling thread to a single hardware thread via
/// `pthread_setaffinity_np`.
pub(crate) fn pin_thread(hwt_id: usize) -> Result<()> {
    let set = build_cpu_set(&[hwt_id])?;
    debug!("Pinning current thread to hardware thread {hwt_id}");

    // SAFETY: pthread_self() always returns a valid handle to the calling
    // thread; `set` is a valid, non-empty mask sized for `cpu_set_t`.
    let res = unsafe {
        libc::pthread_setaffinity_np(
            libc::pthread_self(),
            std::mem::size_of::<libc::cpu_set_t>(),
            &set,
        )
    };
    if res != 0 {
        let err = std::io::Error::from_raw_os_error(res);
        error!("pthread_setaffinity_np failed: {err}");
        return Err(Error::Affinity(format!(
            "pthread_setaffinity_np failed: {err}"
        )));
    }
    Ok(())
}

/// Returns the index of the first hardware thread set in the calling
/// thread's current affinity mask.
pub(crate) fn current_processor_id(num_hw_threads: usize) -> Result<usize> {
    // SAFETY: zero-initializing cpu_set_t is always valid; sched_getaffinity
    // with pid 0 queries the calling process's own mask into `set`.
    let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    unsafe {
        libc::CPU_ZERO(&mut set);
    }
    let res =
        unsafe { libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) };
    if res == -1 {
        let err = std::io::Error::last_os_error();
        error!("sched_getaffinity failed: {err}");
        return Err(Error::Affinity(format!("sched_getaffinity failed: {err}")));
    }

    for hwt_id in 0..num_hw_threads {
        // SAFETY: CPU_ISSET is safe given a valid cpu_set_t and in-range index.
        if unsafe { libc::CPU_ISSET(hwt_id, &set) } {
            return Ok(hwt_id);
        }
    }
    Err(Error::Affinity(
        "No hardware thread set in the current affinity mask".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_hwt_list_is_rejected() {
        assert!(build_cpu_set(&[]).is_err());
    }

    #[test]
    fn out_of_range_ids_are_skipped_but_valid_ones_still_set() {
        let set = build_cpu_set(&[0, usize::MAX]).unwrap();
        assert!(unsafe { libc::CPU_ISSET(0, &set) });
    }

    #[test]
    fn all_out_of_range_is_rejected() {
        assert!(build_cpu_set(&[usize::MAX]).is_err());
    }
}
