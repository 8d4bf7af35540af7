//! Platform abstraction layer for process resource queries.
//!
//! This module provides a platform abstraction that allows switching between
//! real operating system queries and fake implementations for testing purposes.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::{Platform, ProcessMemory, ProcessTimes};
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
