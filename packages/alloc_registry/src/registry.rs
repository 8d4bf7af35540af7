//! The allocation registry.

use std::alloc::{GlobalAlloc, Layout, System};
#[cfg(debug_assertions)]
use std::cell::Cell;
use std::cmp::Reverse;
use std::fmt;
use std::mem;
use std::num::NonZero;
#[cfg(debug_assertions)]
use std::ptr;

use new_zealand::nz;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use crate::allocator::Region;
use crate::{AllocationRecord, Error, Handle, LeakReport, Result, Snapshot};

/// Matches the alignment guarantee of the platform `malloc()` on 64-bit targets.
pub const DEFAULT_ALIGNMENT: NonZero<usize> = nz!(16);

#[cfg(debug_assertions)]
thread_local! {
    /// Identity of the registry whose memory this thread is accessing in `with_allocation()`.
    static ACCESSING_REGISTRY: Cell<usize> = const { Cell::new(0) };
}

/// Tracks live allocations together with their size and source.
///
/// Memory is requested from an underlying [`GlobalAlloc`] implementation via
/// [`track()`](Self::track) and returned to it via [`untrack()`](Self::untrack). In between, the
/// registry holds one [`AllocationRecord`] per allocation. Whatever is still tracked at any given
/// moment is what would leak if the program stopped now, which is what
/// [`enumerate()`](Self::enumerate) and [`leak_report()`](Self::leak_report) show.
///
/// The registry is an ordinary value: create one where tracking starts, share it by reference
/// (or `Arc`) with the code that allocates and call [`shutdown()`](Self::shutdown) (or drop it)
/// when tracking ends. Independent registries do not see each other's allocations.
///
/// # Thread safety
///
/// All operations may be called concurrently from any number of threads. A single lock guards
/// the record set, so every `track()`, `untrack()` and `enumerate()` call observes the registry
/// either before or after any other call, never in the middle of one.
///
/// # Examples
///
/// ```
/// use alloc_registry::Registry;
///
/// let registry = Registry::new();
///
/// let config = registry.track(1000, "Main Function")?;
/// let buffer = registry.track(2000, "Data Processing")?;
///
/// registry.untrack(config)?;
///
/// let report = registry.leak_report();
/// assert_eq!(report.total_leaked_bytes(), 2000);
///
/// // Untracking the same allocation twice is reported, not fatal.
/// assert!(registry.untrack(config).is_err());
///
/// registry.untrack(buffer)?;
/// assert!(registry.shutdown().is_empty());
/// # Ok::<(), alloc_registry::Error>(())
/// ```
pub struct Registry<A: GlobalAlloc = System> {
    allocator: A,
    alignment: NonZero<usize>,
    state: Mutex<RecordSet>,
}

impl Registry<System> {
    /// Creates a registry that allocates from the system allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(System)
    }
}

impl Default for Registry<System> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: GlobalAlloc> Registry<A> {
    /// Creates a registry that allocates from the provided allocator.
    ///
    /// The registry only adds bookkeeping around the allocator; the allocation strategy itself
    /// is unchanged.
    #[must_use]
    pub fn with_allocator(allocator: A) -> Self {
        Self {
            allocator,
            alignment: DEFAULT_ALIGNMENT,
            state: Mutex::new(RecordSet::new()),
        }
    }

    /// Sets the alignment of the memory returned by [`track()`](Self::track).
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two.
    #[must_use]
    pub fn with_alignment(mut self, alignment: NonZero<usize>) -> Self {
        assert!(
            alignment.is_power_of_two(),
            "allocation alignment must be a power of two, got {alignment}"
        );

        self.alignment = alignment;
        self
    }

    /// Allocates `size` bytes of zeroed memory and records it under the `source` label.
    ///
    /// The label is copied, so it may be a temporary. The returned handle identifies the
    /// allocation in later calls; the allocation stays tracked until passed to
    /// [`untrack()`](Self::untrack).
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidSize`] if `size` is zero or too large to form a valid layout.
    /// * [`Error::AllocationFailed`] if the underlying allocator is out of memory or the registry
    ///   cannot store the record. In both cases no memory stays allocated and the registry is
    ///   unchanged.
    pub fn track(&self, size: usize, source: &str) -> Result<Handle> {
        let layout = self.layout_for(size)?;

        let region =
            Region::allocate(&self.allocator, layout).ok_or(Error::AllocationFailed { size })?;

        let insertion = match self.copy_label(source) {
            Some(label) => self.lock().insert(region, size, label),
            None => Insertion::Rejected(region),
        };

        match insertion {
            Insertion::Recorded(handle) => {
                trace!(address = %handle, size, source, "tracked allocation");

                Ok(handle)
            }
            Insertion::Rejected(region) => {
                warn!(size, source, "no memory to record allocation, releasing it again");

                // SAFETY: The region was allocated from this allocator above and was never
                // published, so nobody else can release it.
                unsafe { region.release(&self.allocator) };

                Err(Error::AllocationFailed { size })
            }
        }
    }

    /// Stops tracking an allocation and returns its memory to the underlying allocator.
    ///
    /// # Errors
    ///
    /// [`Error::NotTracked`] if the handle does not identify a tracked allocation, for example
    /// because it was already untracked. This includes stale handles whose address has since
    /// been reused by a newer allocation. Nothing is released in that case.
    pub fn untrack(&self, handle: Handle) -> Result<()> {
        let removed = self.lock().remove(handle);

        let Some(entry) = removed else {
            warn!(address = %handle, "attempted to untrack memory that is not tracked");

            return Err(Error::NotTracked {
                address: handle.address(),
            });
        };

        trace!(
            address = %handle,
            size = entry.record.size(),
            source = entry.record.source(),
            "untracked allocation"
        );

        // SAFETY: Every region in the record set was allocated from this allocator by `track()`.
        // Removing it from the set under the lock makes us its only owner.
        unsafe { entry.region.release(&self.allocator) };

        Ok(())
    }

    /// Takes a snapshot of all tracked allocations, most recently tracked first.
    ///
    /// The snapshot is a copy; it does not change when the registry does.
    #[must_use]
    pub fn enumerate(&self) -> Snapshot {
        let mut records: Vec<AllocationRecord> = {
            let state = self.lock();
            state
                .entries
                .values()
                .map(|entry| entry.record.clone())
                .collect()
        };

        records.sort_unstable_by_key(|record| Reverse(record.sequence()));

        Snapshot::new(records)
    }

    /// Creates a leak report of everything currently tracked.
    ///
    /// This is a shorthand for `self.enumerate().leak_report()` and does not change the registry.
    #[must_use]
    pub fn leak_report(&self) -> LeakReport {
        self.enumerate().leak_report()
    }

    /// Gives `f` access to the memory of a tracked allocation.
    ///
    /// The registry lock is held while `f` runs, so other threads using the registry wait for
    /// `f` to return. Keep it short.
    ///
    /// # Errors
    ///
    /// [`Error::NotTracked`] if the handle does not identify a tracked allocation.
    ///
    /// # Panics
    ///
    /// `f` must not call back into this registry. Debug builds detect this and panic; in release
    /// builds such a call deadlocks.
    pub fn with_allocation<R>(&self, handle: Handle, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        let mut state = self.lock();

        let entry = state.get_mut(handle).ok_or(Error::NotTracked {
            address: handle.address(),
        })?;

        #[cfg(debug_assertions)]
        let _scope = AccessScope::enter(self.identity());

        Ok(f(entry.region.as_mut_slice()))
    }

    /// The number of tracked allocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// The sum of the sizes of all tracked allocations.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.lock().total_bytes
    }

    /// Ends tracking, returning a report of everything that was never untracked.
    ///
    /// Memory that is still tracked is returned to the underlying allocator.
    #[must_use]
    pub fn shutdown(self) -> LeakReport {
        self.leak_report()
    }

    fn layout_for(&self, size: usize) -> Result<Layout> {
        if size == 0 {
            return Err(Error::InvalidSize {
                size,
                problem: "zero-sized allocations are not supported",
            });
        }

        Layout::from_size_align(size, self.alignment.get()).map_err(|_layout_error| {
            Error::InvalidSize {
                size,
                problem: "size exceeds the largest possible allocation",
            }
        })
    }

    /// Copies the source label, returning `None` instead of aborting if memory is exhausted.
    fn copy_label(&self, source: &str) -> Option<Box<str>> {
        #[cfg(test)]
        if self.lock().take_injected_failure(BookkeepingStep::LabelCopy) {
            return None;
        }

        let mut label = String::new();
        label.try_reserve_exact(source.len()).ok()?;
        label.push_str(source);

        Some(label.into_boxed_str())
    }

    fn lock(&self) -> MutexGuard<'_, RecordSet> {
        #[cfg(debug_assertions)]
        assert!(
            ACCESSING_REGISTRY.get() != self.identity(),
            "registry used from inside its own with_allocation() callback, which would deadlock"
        );

        self.state.lock()
    }

    #[cfg(debug_assertions)]
    fn identity(&self) -> usize {
        ptr::from_ref(self).addr()
    }

    /// Makes the given step of the next `track()` fail as if memory were exhausted.
    #[cfg(test)]
    pub(crate) fn fail_next_bookkeeping(&self, step: BookkeepingStep) {
        self.lock().injected_failure = Some(step);
    }
}

impl<A: GlobalAlloc> Drop for Registry<A> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let total_bytes = state.total_bytes;
        let entries = mem::take(&mut state.entries);

        if !entries.is_empty() {
            debug!(
                outstanding = entries.len(),
                total_bytes, "releasing allocations still tracked at registry shutdown"
            );
        }

        for entry in entries.into_values() {
            // SAFETY: Every region in the record set was allocated from this allocator by
            // `track()` and we have exclusive access to the registry.
            unsafe { entry.region.release(&self.allocator) };
        }
    }
}

impl<A: GlobalAlloc> fmt::Debug for Registry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();

        f.debug_struct("Registry")
            .field("allocator", &"<allocator>")
            .field("alignment", &self.alignment)
            .field("tracked", &state.entries.len())
            .field("total_bytes", &state.total_bytes)
            .finish()
    }
}

/// Marks the current thread as inside `with_allocation()` of one registry until dropped.
#[cfg(debug_assertions)]
#[derive(Debug)]
struct AccessScope {
    previous: usize,
}

#[cfg(debug_assertions)]
impl AccessScope {
    fn enter(registry: usize) -> Self {
        Self {
            previous: ACCESSING_REGISTRY.replace(registry),
        }
    }
}

#[cfg(debug_assertions)]
impl Drop for AccessScope {
    fn drop(&mut self) {
        ACCESSING_REGISTRY.set(self.previous);
    }
}

/// One tracked allocation: the memory itself plus its description.
#[derive(Debug)]
struct Entry {
    region: Region,
    record: AllocationRecord,
}

#[derive(Debug)]
enum Insertion {
    Recorded(Handle),

    /// There was no memory for the record. The region is handed back so it can be released.
    Rejected(Region),
}

/// A part of `track()` that needs memory for bookkeeping and can therefore fail.
#[cfg(test)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum BookkeepingStep {
    LabelCopy,
    RecordStorage,
}

/// The state guarded by the registry lock.
#[derive(Debug)]
struct RecordSet {
    entries: foldhash::HashMap<usize, Entry>,
    next_sequence: u64,
    total_bytes: usize,

    #[cfg(test)]
    injected_failure: Option<BookkeepingStep>,
}

impl RecordSet {
    fn new() -> Self {
        Self {
            entries: foldhash::HashMap::default(),
            next_sequence: 0,
            total_bytes: 0,
            #[cfg(test)]
            injected_failure: None,
        }
    }

    /// Records a freshly allocated region under a new handle.
    fn insert(&mut self, region: Region, size: usize, source: Box<str>) -> Insertion {
        if !self.reserve_one() {
            return Insertion::Rejected(region);
        }

        let handle = Handle::new(region.address(), self.next_sequence);
        self.next_sequence = self.next_sequence.wrapping_add(1);

        // Cannot overflow: the sizes of simultaneously live allocations always fit in usize.
        self.total_bytes = self.total_bytes.wrapping_add(size);

        let previous = self.entries.insert(
            handle.address(),
            Entry {
                region,
                record: AllocationRecord::new(handle, size, source),
            },
        );

        debug_assert!(
            previous.is_none(),
            "allocator returned address {handle} that is already tracked"
        );

        Insertion::Recorded(handle)
    }

    /// Looks up the entry of a handle. A stale handle whose address now belongs to a newer
    /// allocation does not match.
    fn get_mut(&mut self, handle: Handle) -> Option<&mut Entry> {
        self.entries
            .get_mut(&handle.address())
            .filter(|entry| entry.record.handle() == handle)
    }

    fn remove(&mut self, handle: Handle) -> Option<Entry> {
        self.get_mut(handle)?;

        let entry = self.entries.remove(&handle.address())?;

        // Cannot underflow: the total includes the size of every entry in the set.
        self.total_bytes = self.total_bytes.wrapping_sub(entry.record.size());

        Some(entry)
    }

    /// Makes room for one more entry, returning `false` if the storage cannot grow.
    fn reserve_one(&mut self) -> bool {
        #[cfg(test)]
        if self.take_injected_failure(BookkeepingStep::RecordStorage) {
            return false;
        }

        self.entries.try_reserve(1).is_ok()
    }

    #[cfg(test)]
    fn take_injected_failure(&mut self, step: BookkeepingStep) -> bool {
        if self.injected_failure == Some(step) {
            self.injected_failure = None;
            true
        } else {
            false
        }
    }
}
