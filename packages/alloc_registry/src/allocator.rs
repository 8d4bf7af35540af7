//! Memory regions obtained from the underlying allocator.

use std::alloc::{GlobalAlloc, Layout};
use std::fmt;
use std::ptr::NonNull;
use std::slice;

/// A zero-initialized block of memory obtained from a [`GlobalAlloc`] implementation.
///
/// A region does not remember which allocator it came from and does not release itself when
/// dropped. The owner must hand it back via [`release()`](Self::release) to the same allocator
/// that produced it; a region that is dropped instead is leaked.
pub(crate) struct Region {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: The region is the unique owner of its memory block, so moving it to another thread
// moves exclusive access with it. The allocators we accept are `GlobalAlloc` implementations,
// which must support releasing memory from any thread.
unsafe impl Send for Region {}

impl Region {
    /// Obtains a zeroed block of memory for `layout`, returning `None` if the allocator
    /// cannot satisfy the request.
    ///
    /// # Panics
    ///
    /// Panics if the layout has zero size. Zero-sized requests are rejected before they get here.
    pub(crate) fn allocate<A: GlobalAlloc>(allocator: &A, layout: Layout) -> Option<Self> {
        assert!(layout.size() != 0, "zero-sized regions are not supported");

        // SAFETY: The layout has a non-zero size, as asserted above. We forward the call to the
        // underlying allocator which implements GlobalAlloc.
        let ptr = unsafe { allocator.alloc_zeroed(layout) };

        NonNull::new(ptr).map(|ptr| Self { ptr, layout })
    }

    /// Returns the memory block to the allocator.
    ///
    /// # Safety
    ///
    /// The caller must pass the same allocator that was used to allocate this region.
    pub(crate) unsafe fn release<A: GlobalAlloc>(self, allocator: &A) {
        // SAFETY: The pointer was returned by `alloc_zeroed()` on this allocator with this exact
        // layout (guaranteed by the caller) and we consume `self`, so it cannot be released twice.
        unsafe { allocator.dealloc(self.ptr.as_ptr(), self.layout) };
    }

    /// The address of the region, used as its identity. Never converted back into a pointer.
    pub(crate) fn address(&self) -> usize {
        self.ptr.as_ptr().addr()
    }

    pub(crate) fn size(&self) -> usize {
        self.layout.size()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: The region exclusively owns `layout.size()` bytes starting at `ptr`, which were
        // zero-initialized on allocation, and `&mut self` guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("layout", &self.layout)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::alloc::System;

    use super::*;

    static_assertions::assert_impl_all!(Region: Send);
    static_assertions::assert_not_impl_any!(Region: Sync, Clone);

    #[test]
    fn allocated_region_is_zeroed_and_writable() {
        let layout = Layout::from_size_align(64, 16).unwrap();
        let mut region = Region::allocate(&System, layout).unwrap();

        assert_eq!(region.size(), 64);
        assert_eq!(region.address() % 16, 0);
        assert!(region.as_mut_slice().iter().all(|b| *b == 0));

        region.as_mut_slice().fill(0xAB);
        assert!(region.as_mut_slice().iter().all(|b| *b == 0xAB));

        // SAFETY: Allocated from System above.
        unsafe { region.release(&System) };
    }

    #[test]
    #[should_panic]
    fn zero_sized_region_panics() {
        let layout = Layout::from_size_align(0, 16).unwrap();
        _ = Region::allocate(&System, layout);
    }
}
