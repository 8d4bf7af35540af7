//! Fake allocator for testing.

use std::alloc::{GlobalAlloc, Layout, System};
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::Arc;
use std::sync::atomic::{self, AtomicBool, AtomicUsize};

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct FakeAllocatorState {
    allocations: AtomicUsize,
    releases: AtomicUsize,
    fail_next: AtomicBool,

    // Only used by reusing allocators: the most recently released block, handed out again to the
    // next request with the same layout.
    reuse: bool,
    cached: Mutex<Option<CachedBlock>>,
}

impl Drop for FakeAllocatorState {
    fn drop(&mut self) {
        if let Some(block) = self.cached.get_mut().take() {
            // SAFETY: Cached blocks were allocated from the system allocator with this layout
            // and are owned by nobody else.
            unsafe { System.dealloc(block.ptr.as_ptr(), block.layout) };
        }
    }
}

#[derive(Debug)]
struct CachedBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: A cached block is released memory owned by the allocator, not accessed by anyone.
unsafe impl Send for CachedBlock {}

/// Allocator that forwards to the system allocator while counting calls.
///
/// Clones share the same counters, so a test can keep one clone while handing another to the
/// registry under test. It can also be told to fail the next allocation, to simulate running
/// out of memory.
#[derive(Clone, Debug, Default)]
pub(crate) struct FakeAllocator {
    state: Arc<FakeAllocatorState>,
}

impl FakeAllocator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator that returns a released block to the next request with the same
    /// layout, the way real allocators reuse addresses.
    pub(crate) fn reusing() -> Self {
        Self {
            state: Arc::new(FakeAllocatorState {
                allocations: AtomicUsize::new(0),
                releases: AtomicUsize::new(0),
                fail_next: AtomicBool::new(false),
                reuse: true,
                cached: Mutex::new(None),
            }),
        }
    }

    /// Number of successful allocations served so far.
    pub(crate) fn allocations(&self) -> usize {
        self.state.allocations.load(atomic::Ordering::Relaxed)
    }

    /// Number of regions released so far.
    pub(crate) fn releases(&self) -> usize {
        self.state.releases.load(atomic::Ordering::Relaxed)
    }

    /// Makes the next allocation return null. The failure is one-shot.
    pub(crate) fn fail_next_allocation(&self) {
        self.state.fail_next.store(true, atomic::Ordering::Relaxed);
    }
}

// SAFETY: We delegate all allocation operations to the system allocator, only adding counters,
// an optional simulated failure (returning null is a valid out-of-memory response) and, for
// reusing allocators, a one-block cache of released memory that is only handed out again for
// an identical layout.
unsafe impl GlobalAlloc for FakeAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if self.state.fail_next.swap(false, atomic::Ordering::Relaxed) {
            return ptr::null_mut();
        }

        self.state.allocations.fetch_add(1, atomic::Ordering::Relaxed);

        let reused = self
            .state
            .cached
            .lock()
            .take_if(|block| block.layout == layout);

        if let Some(block) = reused {
            return block.ptr.as_ptr();
        }

        // SAFETY: Forwarding the caller's guarantees to the system allocator.
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.state.releases.fetch_add(1, atomic::Ordering::Relaxed);

        if self.state.reuse {
            let block = NonNull::new(ptr).map(|ptr| CachedBlock { ptr, layout });
            let previous = mem::replace(&mut *self.state.cached.lock(), block);

            if let Some(block) = previous {
                // SAFETY: Cached blocks were allocated from the system allocator with this
                // layout and were released by their owner.
                unsafe { System.dealloc(block.ptr.as_ptr(), block.layout) };
            }

            return;
        }

        // SAFETY: Forwarding the caller's guarantees to the system allocator.
        unsafe { System.dealloc(ptr, layout) }
    }
}
