use std::fmt;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// A byte count rendered with binary units (1 KB = 1024 bytes) and two decimals.
///
/// # Examples
///
/// ```
/// use heap_monitor::ByteSize;
///
/// assert_eq!(ByteSize(512).to_string(), "512.00 B");
/// assert_eq!(ByteSize(1536).to_string(), "1.50 KB");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ByteSize(pub u64);

impl fmt::Display for ByteSize {
    #[expect(
        clippy::cast_precision_loss,
        reason = "two decimals of a scaled value do not need more than f64 precision"
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0 as f64;
        let mut unit = UNITS[0];

        for &next_unit in UNITS.iter().skip(1) {
            if value < 1024.0 {
                break;
            }

            value /= 1024.0;
            unit = next_unit;
        }

        write!(f, "{value:.2} {unit}")
    }
}
