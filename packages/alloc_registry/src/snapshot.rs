use std::slice;
use std::vec;

use crate::{AllocationRecord, LeakReport, MemoryMap, VisualizationConfig};

/// A point-in-time copy of the allocations tracked by a [`Registry`](crate::Registry).
///
/// Records are ordered with the most recently tracked allocation first. A snapshot is detached
/// from the registry: tracking or untracking allocations afterwards does not change it, and it
/// can be sent to another thread for rendering.
///
/// # Examples
///
/// ```
/// use alloc_registry::{Registry, VisualizationConfig};
///
/// let registry = Registry::new();
/// let _main = registry.track(1000, "Main Function")?;
/// let _gui = registry.track(500, "GUI Module")?;
///
/// let snapshot = registry.enumerate();
/// assert_eq!(snapshot.len(), 2);
/// assert_eq!(snapshot.total_bytes(), 1500);
///
/// println!("{}", snapshot.visualize(&VisualizationConfig::default()));
/// # Ok::<(), alloc_registry::Error>(())
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    records: Vec<AllocationRecord>,
}

impl Snapshot {
    pub(crate) fn new(records: Vec<AllocationRecord>) -> Self {
        Self { records }
    }

    /// The records, most recently tracked first.
    #[must_use]
    pub fn records(&self) -> &[AllocationRecord] {
        &self.records
    }

    /// Iterates over the records, most recently tracked first.
    pub fn iter(&self) -> slice::Iter<'_, AllocationRecord> {
        self.records.iter()
    }

    /// The number of allocations in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot contains no allocations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The sum of the sizes of all allocations in the snapshot.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.records.iter().fold(0_usize, |total, record| {
            total
                .checked_add(record.size())
                .expect("sizes of simultaneously live allocations always fit in usize")
        })
    }

    /// Renders the snapshot as a memory map, one bar per allocation.
    #[must_use]
    pub fn visualize<'a>(&'a self, config: &'a VisualizationConfig) -> MemoryMap<'a> {
        MemoryMap::new(self, config)
    }

    /// Treats every allocation in the snapshot as leaked and summarizes them.
    #[must_use]
    pub fn leak_report(&self) -> LeakReport {
        LeakReport::new(self.records.clone())
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a AllocationRecord;
    type IntoIter = slice::Iter<'a, AllocationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for Snapshot {
    type Item = AllocationRecord;
    type IntoIter = vec::IntoIter<AllocationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
