//! Fake platform implementation for testing.

use std::io;
use std::time::Duration;

use crate::pal::abstractions::{Platform, ProcessMemory, ProcessTimes};

/// Fake implementation of the platform abstraction for testing.
///
/// This implementation allows tests to control the reported resource usage
/// instead of relying on actual system calls. A query with no value set fails
/// the way an unsupported platform would.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    memory: Option<ProcessMemory>,
    times: Option<ProcessTimes>,
}

impl FakePlatform {
    /// Creates a new fake platform with zero usage values.
    pub(crate) fn new() -> Self {
        Self {
            memory: Some(ProcessMemory {
                resident_bytes: Some(0),
                peak_resident_bytes: 0,
                virtual_bytes: Some(0),
            }),
            times: Some(ProcessTimes {
                user: Duration::ZERO,
                kernel: Duration::ZERO,
            }),
        }
    }

    /// Creates a fake platform on which every query fails.
    pub(crate) fn unsupported() -> Self {
        Self {
            memory: None,
            times: None,
        }
    }

    pub(crate) fn set_memory(&mut self, memory: ProcessMemory) {
        self.memory = Some(memory);
    }

    pub(crate) fn set_times(&mut self, times: ProcessTimes) {
        self.times = Some(times);
    }
}

fn unsupported() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "not available on the fake platform")
}

impl Platform for FakePlatform {
    fn process_memory(&self) -> io::Result<ProcessMemory> {
        self.memory.ok_or_else(unsupported)
    }

    fn process_times(&self) -> io::Result<ProcessTimes> {
        self.times.ok_or_else(unsupported)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn initializes_with_zero_usage() {
        let platform = FakePlatform::new();

        assert_eq!(platform.process_memory().unwrap().peak_resident_bytes, 0);
        assert_eq!(platform.process_times().unwrap().user, Duration::ZERO);
    }

    #[test]
    fn unsupported_platform_fails_queries() {
        let platform = FakePlatform::unsupported();

        assert_eq!(
            platform.process_memory().unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );
        assert!(platform.process_times().is_err());
    }

    #[test]
    fn set_memory_is_reported() {
        let mut platform = FakePlatform::new();
        platform.set_memory(ProcessMemory {
            resident_bytes: None,
            peak_resident_bytes: 4096,
            virtual_bytes: Some(8192),
        });

        let memory = platform.process_memory().unwrap();
        assert_eq!(memory.resident_bytes, None);
        assert_eq!(memory.peak_resident_bytes, 4096);
        assert_eq!(memory.virtual_bytes, Some(8192));
    }
}
