use std::fmt;

/// Identifies one allocation tracked by a [`Registry`](crate::Registry).
///
/// A handle is returned by [`Registry::track()`](crate::Registry::track) and is required by
/// [`Registry::untrack()`](crate::Registry::untrack). It carries the address of the allocation
/// as an opaque value together with the position of the allocation in tracking order. The
/// registry only ever compares both against what it tracks and never dereferences the address.
///
/// Allocators reuse addresses. A handle kept after its allocation was untracked therefore never
/// matches a later allocation at the same address; presenting it is reported as
/// [`Error::NotTracked`](crate::Error::NotTracked) instead of releasing someone else's memory.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Handle {
    address: usize,
    sequence: u64,
}

impl Handle {
    pub(crate) const fn new(address: usize, sequence: u64) -> Self {
        Self { address, sequence }
    }

    /// The address of the allocation this handle identifies.
    #[must_use]
    pub const fn address(self) -> usize {
        self.address
    }

    pub(crate) const fn sequence(self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.address)
    }
}

/// Describes one live allocation: where it is, how large it is and who asked for it.
///
/// Records are immutable. The source label is copied when the allocation is tracked, so the
/// caller's string does not need to outlive the allocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllocationRecord {
    handle: Handle,
    size: usize,
    source: Box<str>,
}

impl AllocationRecord {
    pub(crate) fn new(handle: Handle, size: usize, source: Box<str>) -> Self {
        Self {
            handle,
            size,
            source,
        }
    }

    /// The address of the allocation.
    #[must_use]
    pub fn address(&self) -> usize {
        self.handle.address()
    }

    /// The handle that identifies this allocation in the registry.
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Position of the allocation in tracking order.
    pub(crate) fn sequence(&self) -> u64 {
        self.handle.sequence()
    }

    /// The number of bytes that was requested.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The label of the call site or subsystem that requested the allocation.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}
