//! Process resource usage report.

use std::fmt;

use tracing::warn;

use crate::ByteSize;
use crate::pal::{Platform, ProcessMemory, ProcessTimes};

/// Memory and processor time used by the current process, as reported by the operating system.
///
/// Either part may be missing if the platform cannot report it; the report then says so instead
/// of failing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ResourceUsage {
    memory: Option<ProcessMemory>,
    times: Option<ProcessTimes>,
}

impl ResourceUsage {
    pub(crate) fn query(platform: &impl Platform) -> Self {
        let memory = platform
            .process_memory()
            .inspect_err(|error| warn!(%error, "process memory usage is unavailable"))
            .ok();

        let times = platform
            .process_times()
            .inspect_err(|error| warn!(%error, "process processor time is unavailable"))
            .ok();

        Self { memory, times }
    }
}

impl fmt::Display for ResourceUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Process Resource Usage ===")?;

        writeln!(f, "Memory Statistics:")?;
        match self.memory {
            Some(memory) => {
                match memory.resident_bytes {
                    Some(resident) => writeln!(
                        f,
                        "  Resident Set Size: {} (physical memory currently in use by the process)",
                        ByteSize(resident)
                    )?,
                    None => writeln!(f, "  Resident Set Size: unavailable")?,
                }

                writeln!(
                    f,
                    "  Peak Resident Set: {} (maximum physical memory used by the process)",
                    ByteSize(memory.peak_resident_bytes)
                )?;

                match memory.virtual_bytes {
                    Some(size) => writeln!(
                        f,
                        "  Virtual Memory: {} (address space reserved by the process)",
                        ByteSize(size)
                    )?,
                    None => writeln!(f, "  Virtual Memory: unavailable")?,
                }
            }
            None => writeln!(f, "  unavailable on this platform")?,
        }

        writeln!(f)?;
        writeln!(f, "CPU Time:")?;
        match self.times {
            Some(times) => {
                writeln!(
                    f,
                    "  Kernel Time: {:.3} seconds (time spent in kernel mode)",
                    times.kernel.as_secs_f64()
                )?;
                writeln!(
                    f,
                    "  User Time: {:.3} seconds (time spent in user mode)",
                    times.user.as_secs_f64()
                )?;
            }
            None => writeln!(f, "  unavailable on this platform")?,
        }

        Ok(())
    }
}
