//! Small sysfs-reading helpers shared by [`super::topology`] and [`super::numa`].

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::{Error, Result};

/// Reads a value from a sysfs file and parses it into a specified type.
///
/// Sysfs files often contain single values (e.g., a number, a string). This
/// function reads the entire content of the file at `path`, trims
/// whitespace, and parses it into type `T`.
///
/// # Errors
///
/// Returns `Error::Detection` if the file cannot be read or the content
/// cannot be parsed into `T`.
pub(crate) fn read_sysfs_value<T: FromStr>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Detection(format!("Failed to read sysfs file {:?}: {}", path, e)))?;
    content
        .trim()
        .parse::<T>()
        .map_err(|_| Error::Detection(format!("Failed to parse value from {:?}", path)))
}

/// Parses a Linux-style CPU range list, e.g. `"0-3,7,10-11"`, into the set
/// of individual IDs it denotes.
///
/// This is the format shared by `/sys/devices/system/cpu/online`,
/// `/sys/devices/system/node/node*/cpulist`, and
/// `/sys/devices/system/cpu/cpu*/cache/index*/shared_cpu_list`.
pub(crate) fn parse_cpu_range_list(list: &str) -> Result<BTreeSet<usize>> {
    let mut ids = BTreeSet::new();
    for part in list.trim().split(',').filter(|s| !s.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let start = start
                .parse::<usize>()
                .map_err(|_| Error::Detection(format!("Invalid CPU range start: {start}")))?;
            let end = end
                .parse::<usize>()
                .map_err(|_| Error::Detection(format!("Invalid CPU range end: {end}")))?;
            if start > end {
                return Err(Error::Detection(format!(
                    "Invalid CPU range order: {start}-{end}"
                )));
            }
            ids.extend(start..=end);
        } else {
            let id = part
                .parse::<usize>()
                .map_err(|_| Error::Detection(format!("Invalid CPU ID in range list: {part}")))?;
            ids.insert(id);
        }
    }
    Ok(ids)
}

/// Reads and parses a CPU range list from a sysfs file (`.../online`,
/// `.../cpulist`, `.../shared_cpu_list`).
pub(crate) fn read_cpu_range_list(path: &Path) -> Result<BTreeSet<usize>> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Detection(format!("Failed to read {:?}: {}", path, e)))?;
    parse_cpu_range_list(&content)
}
