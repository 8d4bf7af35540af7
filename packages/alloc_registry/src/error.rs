use thiserror::Error;

/// Errors that can occur when tracking or untracking allocations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The memory could not be obtained, either from the underlying allocator or because the
    /// registry could not allocate storage for the bookkeeping record. No memory remains
    /// allocated and the registry is unchanged.
    #[error("failed to allocate {size} bytes")]
    AllocationFailed {
        /// The number of bytes that was requested.
        size: usize,
    },

    /// The requested size cannot be expressed as an allocation. This is the case for zero-sized
    /// requests and for sizes so large that no valid memory layout exists for them.
    #[error("cannot allocate {size} bytes: {problem}")]
    InvalidSize {
        /// The number of bytes that was requested.
        size: usize,

        /// A human-readable description of the problem.
        problem: &'static str,
    },

    /// The handle does not identify an allocation tracked by this registry. Either it was
    /// already untracked or it never came from this registry. No memory was released.
    #[error("memory at {address:#x} is not tracked by this registry")]
    NotTracked {
        /// The address of the handle that was presented.
        address: usize,
    },
}

/// A specialized `Result` type for registry operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
