//! Real platform implementation using system calls.

#[cfg(target_os = "linux")]
use std::fs;
use std::io;
#[cfg(unix)]
use std::mem;
#[cfg(unix)]
use std::time::Duration;

use crate::pal::abstractions::{Platform, ProcessMemory, ProcessTimes};

/// Real implementation of the platform abstraction, querying the operating system.
#[derive(Debug, Clone)]
pub(crate) struct RealPlatform;

// Real OS bindings are excluded from coverage measurement because error paths require
// OS-level failures that are impractical to trigger in tests.
#[cfg(unix)]
#[cfg_attr(coverage_nightly, coverage(off))]
impl Platform for RealPlatform {
    fn process_memory(&self) -> io::Result<ProcessMemory> {
        let usage = rusage_self()?;
        let current = current_memory();

        Ok(ProcessMemory {
            resident_bytes: current.resident_bytes,
            peak_resident_bytes: max_rss_to_bytes(usage.ru_maxrss),
            virtual_bytes: current.virtual_bytes,
        })
    }

    fn process_times(&self) -> io::Result<ProcessTimes> {
        let usage = rusage_self()?;

        Ok(ProcessTimes {
            user: timeval_to_duration(usage.ru_utime),
            kernel: timeval_to_duration(usage.ru_stime),
        })
    }
}

#[cfg(not(unix))]
impl Platform for RealPlatform {
    fn process_memory(&self) -> io::Result<ProcessMemory> {
        Err(unsupported())
    }

    fn process_times(&self) -> io::Result<ProcessTimes> {
        Err(unsupported())
    }
}

#[cfg(not(unix))]
fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "process resource queries are only implemented for Unix-like platforms",
    )
}

#[cfg(unix)]
fn rusage_self() -> io::Result<libc::rusage> {
    // SAFETY: All-zero is a valid initial value for this type.
    let mut usage: libc::rusage = unsafe { mem::zeroed() };

    // SAFETY: We are passing valid arguments, no other safety requirements.
    let result = unsafe { libc::getrusage(libc::RUSAGE_SELF, &raw mut usage) };

    if result == 0 {
        Ok(usage)
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn timeval_to_duration(value: libc::timeval) -> Duration {
    // Negative values are not produced by getrusage(); treat them as zero if they ever appear.
    let seconds = u64::try_from(value.tv_sec).unwrap_or_default();
    let micros = u64::try_from(value.tv_usec).unwrap_or_default();

    Duration::from_secs(seconds).saturating_add(Duration::from_micros(micros))
}

/// `ru_maxrss` is in bytes on Apple platforms and in kilobytes everywhere else.
#[cfg(unix)]
fn max_rss_to_bytes(max_rss: libc::c_long) -> u64 {
    let max_rss = u64::try_from(max_rss).unwrap_or_default();

    if cfg!(target_vendor = "apple") {
        max_rss
    } else {
        max_rss.saturating_mul(1024)
    }
}

/// Memory use right now, as opposed to the peak reported by `getrusage()`.
#[cfg(unix)]
#[derive(Debug, Default)]
struct CurrentMemory {
    resident_bytes: Option<u64>,
    virtual_bytes: Option<u64>,
}

#[cfg(target_os = "linux")]
fn current_memory() -> CurrentMemory {
    let Ok(statm) = fs::read_to_string("/proc/self/statm") else {
        return CurrentMemory::default();
    };
    let Some(pages) = parse_statm(&statm) else {
        return CurrentMemory::default();
    };

    // SAFETY: No safety requirements.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    let Ok(page_size) = u64::try_from(page_size) else {
        return CurrentMemory::default();
    };

    CurrentMemory {
        resident_bytes: pages.resident.checked_mul(page_size),
        virtual_bytes: pages.size.checked_mul(page_size),
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
fn current_memory() -> CurrentMemory {
    CurrentMemory::default()
}

/// The first two fields of `/proc/self/statm`, both in pages.
#[cfg(any(target_os = "linux", test))]
#[derive(Debug, Eq, PartialEq)]
struct StatmPages {
    size: u64,
    resident: u64,
}

#[cfg(any(target_os = "linux", test))]
fn parse_statm(statm: &str) -> Option<StatmPages> {
    let mut fields = statm.split_whitespace();

    Some(StatmPages {
        size: fields.next()?.parse().ok()?,
        resident: fields.next()?.parse().ok()?,
    })
}
