//! Platform abstraction trait definitions.

use std::fmt::Debug;
use std::io;
use std::time::Duration;

/// Memory use of the current process.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ProcessMemory {
    /// Bytes of physical memory in use right now, if the platform reports it.
    pub(crate) resident_bytes: Option<u64>,

    /// The most physical memory the process has used at any point.
    pub(crate) peak_resident_bytes: u64,

    /// Size of the virtual address space of the process, if the platform reports it.
    pub(crate) virtual_bytes: Option<u64>,
}

/// Processor time consumed by the current process.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ProcessTimes {
    pub(crate) user: Duration,
    pub(crate) kernel: Duration,
}

/// Provides process resource usage queries.
///
/// This trait abstracts the underlying platform-specific resource accounting
/// mechanisms, allowing for both real implementations (using system calls)
/// and fake implementations (for testing).
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Gets the physical memory usage of the current process.
    fn process_memory(&self) -> io::Result<ProcessMemory>;

    /// Gets the user and kernel mode processor time of the current process.
    fn process_times(&self) -> io::Result<ProcessTimes>;
}
