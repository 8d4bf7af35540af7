use std::io;

use thiserror::Error;

/// Errors that stop a monitoring run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// One of the demonstration allocations could not be made. Without it there is nothing
    /// meaningful to report, so the run is aborted.
    #[error("allocation failed for {label}")]
    Allocation {
        /// The source label of the allocation that failed.
        label: &'static str,

        /// Why the registry could not satisfy the request.
        source: alloc_registry::Error,
    },

    /// Writing the console output or reading the console input failed.
    #[error("console I/O failed")]
    Console(#[from] io::Error),
}

/// A specialized `Result` type for monitoring runs, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
