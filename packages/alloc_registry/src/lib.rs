#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Tracks live heap allocations together with their size and source, for memory usage maps and
//! leak reports.
//!
//! This package wraps an existing memory allocator with a bookkeeping layer that remembers every
//! allocation made through it until the allocation is released again. At any point in time you
//! can take a snapshot of what is live, render it as a memory map or summarize it as leaks.
//!
//! The core functionality includes:
//! - [`Registry`] - Allocates memory, records it and releases it again, safely from any thread
//! - [`Handle`] - Identifies one tracked allocation
//! - [`Snapshot`] - A point-in-time copy of all tracked allocations
//! - [`MemoryMap`] - Renders a snapshot as bars proportional to allocation size
//! - [`LeakReport`] - Lists allocations that were never released and their total size
//!
//! This package is not meant for use in production, serving only as a development tool.
//!
//! # Simple usage
//!
//! ```
//! use alloc_registry::{Registry, VisualizationConfig};
//!
//! let registry = Registry::new();
//!
//! let request = registry.track(1000, "Main Function")?;
//! let _cache = registry.track(2000, "Data Processing")?;
//!
//! registry
//!     .enumerate()
//!     .visualize(&VisualizationConfig::default())
//!     .print_to_stdout();
//!
//! registry.untrack(request)?;
//!
//! // The cache was never released, so it shows up as a leak.
//! let leaks = registry.shutdown();
//! assert_eq!(leaks.total_leaked_bytes(), 2000);
//! leaks.print_to_stdout();
//! # Ok::<(), alloc_registry::Error>(())
//! ```
//!
//! # Logging
//!
//! The registry emits `tracing` events: every tracked and untracked allocation at trace level,
//! attempts to untrack unknown memory at warn level and the number of allocations still live at
//! shutdown at debug level. Install a subscriber to see them.
//!
//! # Overhead
//!
//! Every operation takes one lock that guards the record set. Raw allocation and release calls
//! to the underlying allocator happen outside of that lock.

mod allocator;
mod config;
mod error;
#[cfg(test)]
mod fake;
mod record;
mod registry;
mod report;
mod snapshot;

pub use config::*;
pub use error::Error;
pub(crate) use error::Result;
pub use record::*;
pub use registry::*;
pub use report::*;
pub use snapshot::Snapshot;
