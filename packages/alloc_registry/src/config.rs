//! Configuration of the memory map rendering.

use std::fmt::{self, Write};
use std::num::NonZero;

use new_zealand::nz;

/// Default number of bytes represented by one glyph of a memory map bar.
pub const DEFAULT_SCALE: NonZero<usize> = nz!(10);

/// Default maximum number of glyphs in one memory map bar.
pub const DEFAULT_MAX_BLOCKS: usize = 50;

/// Default glyph used to draw memory map bars.
pub const DEFAULT_GLYPH: char = '*';

/// Appended to a bar that was cut off at the glyph limit.
pub const TRUNCATION_MARKER: &str = "...";

/// Controls how allocation sizes are rendered as bars in a [`MemoryMap`](crate::MemoryMap).
///
/// Each allocation is drawn as one glyph per `scale` bytes (rounded down), up to `max_blocks`
/// glyphs. Bars that would be longer are cut off and followed by [`TRUNCATION_MARKER`].
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use alloc_registry::VisualizationConfig;
///
/// let config = VisualizationConfig::default()
///     .with_scale(NonZero::new(100).unwrap())
///     .with_max_blocks(20);
///
/// assert_eq!(config.bar(1_000).to_string(), "**********");
/// assert_eq!(config.bar(5_000).to_string(), "********************...");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VisualizationConfig {
    scale: NonZero<usize>,
    max_blocks: usize,
    glyph: char,
}

impl VisualizationConfig {
    /// Sets the number of bytes represented by one glyph.
    #[must_use]
    pub fn with_scale(mut self, scale: NonZero<usize>) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the maximum number of glyphs drawn for one allocation.
    #[must_use]
    pub fn with_max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = max_blocks;
        self
    }

    /// Sets the glyph used to draw bars.
    #[must_use]
    pub fn with_glyph(mut self, glyph: char) -> Self {
        self.glyph = glyph;
        self
    }

    /// The number of bytes represented by one glyph.
    #[must_use]
    pub fn scale(&self) -> NonZero<usize> {
        self.scale
    }

    /// The maximum number of glyphs drawn for one allocation.
    #[must_use]
    pub fn max_blocks(&self) -> usize {
        self.max_blocks
    }

    /// The glyph used to draw bars.
    #[must_use]
    pub fn glyph(&self) -> char {
        self.glyph
    }

    /// Calculates the bar for an allocation of `size` bytes.
    #[must_use]
    pub fn bar(&self, size: usize) -> Bar {
        let full_width = size
            .checked_div(self.scale.get())
            .expect("division by zero impossible - divisor is NonZero");

        Bar {
            glyphs: full_width.min(self.max_blocks),
            truncated: full_width > self.max_blocks,
            glyph: self.glyph,
        }
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            max_blocks: DEFAULT_MAX_BLOCKS,
            glyph: DEFAULT_GLYPH,
        }
    }
}

/// The rendered length of one allocation in a memory map.
///
/// Displays as the glyphs followed by [`TRUNCATION_MARKER`] if the bar was cut off.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Bar {
    glyphs: usize,
    truncated: bool,
    glyph: char,
}

impl Bar {
    /// The number of glyphs drawn, never more than the configured maximum.
    #[must_use]
    pub fn glyphs(&self) -> usize {
        self.glyphs
    }

    /// Whether the allocation was too large to draw in full.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.glyphs {
            f.write_char(self.glyph)?;
        }

        if self.truncated {
            f.write_str(TRUNCATION_MARKER)?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = VisualizationConfig::default();

        assert_eq!(config.scale().get(), 10);
        assert_eq!(config.max_blocks(), 50);
        assert_eq!(config.glyph(), '*');
    }

    #[test]
    fn large_allocation_is_capped_with_marker() {
        let bar = VisualizationConfig::default().bar(10_000);

        assert_eq!(bar.glyphs(), 50);
        assert!(bar.is_truncated());
        assert_eq!(bar.to_string(), format!("{}...", "*".repeat(50)));
    }

    #[test]
    fn small_allocation_is_drawn_in_full() {
        let bar = VisualizationConfig::default().bar(300);

        assert_eq!(bar.glyphs(), 30);
        assert!(!bar.is_truncated());
        assert_eq!(bar.to_string(), "*".repeat(30));
    }

    #[test]
    fn exactly_at_cap_is_not_truncated() {
        let bar = VisualizationConfig::default().bar(500);

        assert_eq!(bar.glyphs(), 50);
        assert!(!bar.is_truncated());
    }

    #[test]
    fn partial_glyphs_round_down() {
        let config = VisualizationConfig::default();

        assert_eq!(config.bar(9).glyphs(), 0);
        assert_eq!(config.bar(19).glyphs(), 1);
        assert_eq!(config.bar(9).to_string(), "");
    }

    #[test]
    fn custom_glyph_and_cap() {
        let config = VisualizationConfig::default()
            .with_glyph('#')
            .with_max_blocks(3);

        assert_eq!(config.bar(1_000).to_string(), "###...");
    }

    #[test]
    fn zero_cap_only_shows_marker() {
        let config = VisualizationConfig::default().with_max_blocks(0);

        assert_eq!(config.bar(10).to_string(), "...");
        assert_eq!(config.bar(5).to_string(), "");
    }
}
