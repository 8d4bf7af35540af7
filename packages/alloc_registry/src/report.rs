//! Human-readable reports on tracked allocations.

use std::fmt;
use std::slice;

use crate::{AllocationRecord, Snapshot, VisualizationConfig};

/// Memory usage visualization of a [`Snapshot`].
///
/// Displays every allocation as a numbered block with its address, size, source and a bar whose
/// length is proportional to the size, as configured by [`VisualizationConfig`].
///
/// # Examples
///
/// ```
/// use alloc_registry::{Registry, VisualizationConfig};
///
/// let registry = Registry::new();
/// let _data = registry.track(300, "Data Processing")?;
///
/// let snapshot = registry.enumerate();
/// let map = snapshot.visualize(&VisualizationConfig::default()).to_string();
///
/// assert!(map.contains(&format!("[{}]", "*".repeat(30))));
/// # Ok::<(), alloc_registry::Error>(())
/// ```
#[derive(Debug)]
pub struct MemoryMap<'a> {
    snapshot: &'a Snapshot,
    config: &'a VisualizationConfig,
}

impl<'a> MemoryMap<'a> {
    pub(crate) fn new(snapshot: &'a Snapshot, config: &'a VisualizationConfig) -> Self {
        Self { snapshot, config }
    }

    /// Prints the memory map to stdout.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_to_stdout(&self) {
        println!("{self}");
    }
}

impl fmt::Display for MemoryMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Memory Usage Visualization ===")?;
        writeln!(
            f,
            "Each [{}] represents ~{} bytes",
            self.config.glyph(),
            self.config.scale()
        )?;

        if self.snapshot.is_empty() {
            writeln!(f)?;
            writeln!(f, "No tracked allocations.")?;
            return Ok(());
        }

        for (number, record) in (1_usize..).zip(self.snapshot) {
            writeln!(f)?;
            writeln!(f, "Block {number}:")?;
            write_record_details(f, record)?;
            writeln!(f, "  Memory Map: [{}]", self.config.bar(record.size()))?;
        }

        Ok(())
    }
}

/// Summary of allocations that were never untracked.
///
/// A leak report is created from a [`Snapshot`] (or directly from the registry) and owns its
/// data, so it stays valid after the registry is gone. This is what
/// [`Registry::shutdown()`](crate::Registry::shutdown) returns.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LeakReport {
    leaks: Vec<AllocationRecord>,
    total_leaked_bytes: usize,
}

impl LeakReport {
    pub(crate) fn new(leaks: Vec<AllocationRecord>) -> Self {
        let total_leaked_bytes = leaks.iter().fold(0_usize, |total, record| {
            total
                .checked_add(record.size())
                .expect("sizes of simultaneously live allocations always fit in usize")
        });

        Self {
            leaks,
            total_leaked_bytes,
        }
    }

    /// Whether there are no leaks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaks.is_empty()
    }

    /// The number of leaked allocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaks.len()
    }

    /// The leaked allocations, most recently tracked first.
    pub fn leaks(&self) -> slice::Iter<'_, AllocationRecord> {
        self.leaks.iter()
    }

    /// The sum of the sizes of all leaked allocations.
    #[must_use]
    pub fn total_leaked_bytes(&self) -> usize {
        self.total_leaked_bytes
    }

    /// Prints the leak report to stdout.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_to_stdout(&self) {
        println!("{self}");
    }
}

impl fmt::Display for LeakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Memory Leak Analysis ===")?;

        if self.leaks.is_empty() {
            writeln!(f, "No memory leaks.")?;
            return Ok(());
        }

        writeln!(f, "Checking unfreed memory allocations...")?;

        for (number, record) in (1_usize..).zip(&self.leaks) {
            writeln!(f)?;
            writeln!(f, "Leak {number}:")?;
            write_record_details(f, record)?;
        }

        writeln!(f)?;
        writeln!(f, "Total leaked memory: {} bytes", self.total_leaked_bytes)
    }
}

fn write_record_details(f: &mut fmt::Formatter<'_>, record: &AllocationRecord) -> fmt::Result {
    writeln!(f, "  Address: {}", record.handle())?;
    writeln!(f, "  Size: {} bytes", record.size())?;
    writeln!(f, "  Source: {}", record.source())
}
