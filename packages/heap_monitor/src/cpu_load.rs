use std::hint;
use std::thread;
use std::time::{Duration, Instant};

/// Length of one busy/idle cycle of the load simulation.
const SLICE: Duration = Duration::from_millis(100);

/// What a processor load simulation actually did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CpuLoadSummary {
    /// Wall-clock time the simulation ran for.
    pub elapsed: Duration,

    /// Part of `elapsed` spent spinning on the processor.
    pub busy: Duration,
}

/// Keeps one processor busy for roughly `load_percent` percent of the time, for `duration`.
///
/// The time is split into short slices; in each slice the calling thread spins for the busy
/// share and sleeps for the rest. Values of `load_percent` outside `0..=100` are clamped and
/// `NaN` counts as zero.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use heap_monitor::simulate_cpu_load;
///
/// let summary = simulate_cpu_load(Duration::from_millis(50), 0.0);
/// assert_eq!(summary.busy, Duration::ZERO);
/// ```
#[must_use]
pub fn simulate_cpu_load(duration: Duration, load_percent: f64) -> CpuLoadSummary {
    let busy_per_slice = SLICE.mul_f64(load_fraction(load_percent));

    let start = Instant::now();
    let mut busy = Duration::ZERO;

    loop {
        let elapsed = start.elapsed();
        if elapsed >= duration {
            break;
        }

        let remaining = duration.saturating_sub(elapsed);

        let spin_for = busy_per_slice.min(remaining);
        let spin_start = Instant::now();
        while spin_start.elapsed() < spin_for {
            hint::spin_loop();
        }
        busy = busy.saturating_add(spin_start.elapsed());

        let idle_for = SLICE
            .saturating_sub(busy_per_slice)
            .min(duration.saturating_sub(start.elapsed()));
        if !idle_for.is_zero() {
            thread::sleep(idle_for);
        }
    }

    CpuLoadSummary {
        elapsed: start.elapsed(),
        busy,
    }
}

fn load_fraction(load_percent: f64) -> f64 {
    if load_percent.is_nan() {
        return 0.0;
    }

    load_percent.clamp(0.0, 100.0) / 100.0
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::float_cmp, reason = "exact values are expected for clamped inputs")]

    use super::*;

    #[test]
    fn load_fraction_is_clamped() {
        assert_eq!(load_fraction(-5.0), 0.0);
        assert_eq!(load_fraction(50.0), 0.5);
        assert_eq!(load_fraction(250.0), 1.0);
        assert_eq!(load_fraction(f64::NAN), 0.0);
    }

    #[test]
    fn zero_duration_returns_immediately() {
        let summary = simulate_cpu_load(Duration::ZERO, 100.0);

        assert_eq!(summary.busy, Duration::ZERO);
        assert!(summary.elapsed < Duration::from_secs(1));
    }

    #[test]
    fn zero_load_never_spins() {
        let summary = simulate_cpu_load(Duration::from_millis(120), 0.0);

        assert_eq!(summary.busy, Duration::ZERO);
        assert!(summary.elapsed >= Duration::from_millis(120));
    }

    #[test]
    fn full_load_spins_most_of_the_time() {
        let duration = Duration::from_millis(200);

        let summary = simulate_cpu_load(duration, 100.0);

        assert!(summary.elapsed >= duration);
        assert!(summary.busy >= duration / 2);
    }

    #[test]
    fn busy_time_never_exceeds_elapsed_time() {
        let summary = simulate_cpu_load(Duration::from_millis(150), 75.0);

        assert!(summary.busy <= summary.elapsed);
    }
}
