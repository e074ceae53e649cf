//! Defines the error types and `Result` alias used throughout the `cpu-domains` crate.
//!
//! This module provides a centralized way to handle errors that can occur during
//! CPU topology/NUMA discovery, affinity domain construction, selector parsing,
//! or thread/process pinning. The primary error type is [`Error`], and the
//! standard `Result` type is aliased as [`Result<T>`] for convenience.

use thiserror::Error as ThisError;

/// A specialized `Result` type for `cpu-domains` operations.
///
/// This type alias uses [`crate::error::Error`] as its error type.
/// All functions in this crate that can fail will return this `Result` type.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error enum for all operations within the `cpu-domains` crate.
///
/// This enum consolidates various error conditions that can arise, such as
/// issues with topology detection, platform incompatibilities, permission
/// problems, I/O errors, and malformed selector expressions.
#[derive(Debug, Clone, ThisError)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// An error occurred while discovering CPU topology or NUMA node
    /// information from the operating system. Contains a descriptive
    /// message about the detection failure.
    #[error("CPU detection error: {0}")]
    Detection(String),

    /// A requested hardware thread ID does not exist in the discovered
    /// topology.
    #[error("Invalid hardware thread ID: {0}")]
    InvalidProcessorId(usize),

    /// A named affinity domain (e.g. `S1`, `C0`, `M2`) does not exist.
    #[error("Affinity domain not found: {0}")]
    DomainNotFound(String),

    /// An error occurred during thread or process affinity operations, such
    /// as an empty mask or an OS-level affinity syscall failing.
    #[error("Thread affinity error: {0}")]
    Affinity(String),

    /// The requested operation is not supported on the current operating
    /// system or hardware platform.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The operation could not be completed due to insufficient
    /// permissions.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// An underlying Input/Output error occurred, typically while reading
    /// sysfs/procfs entries during discovery.
    #[error("I/O error: {0}")]
    Io(String),

    /// An error occurred during a system call not covered by
    /// `std::io::Error`.
    #[error("System call error: {0}")]
    SystemCall(String),

    /// A selector expression was malformed beyond what can be recovered by
    /// skipping the offending item. Most malformed selector items are
    /// reported as warnings (see the crate-level docs on `LIKWID_SILENT`)
    /// rather than surfaced here; this variant exists for callers that want
    /// a typed error instead of scraping log output.
    #[error("Invalid selector expression: {0}")]
    InvalidSelector(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
