//! Platform facade for switching between real and fake implementations.

use std::io;

use crate::pal::abstractions::{Platform, ProcessMemory, ProcessTimes};
#[cfg(test)]
use crate::pal::fake::FakePlatform;
use crate::pal::real::RealPlatform;

/// Facade that allows switching between real and fake platform implementations.
#[derive(Debug, Clone)]
pub(crate) enum PlatformFacade {
    /// Real platform implementation using system calls.
    Real(RealPlatform),

    /// Fake platform implementation for testing.
    #[cfg(test)]
    Fake(FakePlatform),
}

impl PlatformFacade {
    /// Creates a new platform facade using the real implementation.
    pub(crate) fn real() -> Self {
        Self::Real(RealPlatform)
    }

    /// Creates a new platform facade using the fake implementation.
    #[cfg(test)]
    pub(crate) fn fake(fake_platform: FakePlatform) -> Self {
        Self::Fake(fake_platform)
    }
}

impl Platform for PlatformFacade {
    fn process_memory(&self) -> io::Result<ProcessMemory> {
        match self {
            Self::Real(platform) => platform.process_memory(),
            #[cfg(test)]
            Self::Fake(platform) => platform.process_memory(),
        }
    }

    fn process_times(&self) -> io::Result<ProcessTimes> {
        match self {
            Self::Real(platform) => platform.process_times(),
            #[cfg(test)]
            Self::Fake(platform) => platform.process_times(),
        }
    }
}
