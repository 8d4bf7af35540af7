#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Console tool that exercises [`alloc_registry`] end to end.
//!
//! A monitoring run tracks a few labeled allocations, renders them as a memory map, keeps the
//! processor busy for a while, reports the memory and processor time used by the process and
//! finally releases only some of the allocations so that the leak report has something to show.
//!
//! The pieces are usable on their own:
//! - [`run()`] - The whole scenario, configured by [`MonitorConfig`]
//! - [`simulate_cpu_load()`] - Keeps one processor busy for a share of the time
//! - [`ByteSize`] - Formats byte counts with binary units

mod cpu_load;
mod driver;
mod error;
mod format;
mod pal;
mod resources;

pub use cpu_load::*;
pub use driver::*;
pub use error::Error;
pub(crate) use error::Result;
pub use format::ByteSize;
