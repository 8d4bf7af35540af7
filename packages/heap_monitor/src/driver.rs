//! The monitoring scenario: allocate, visualize, load the processor, report resources and leaks.

use std::io::{BufRead, Write};
use std::time::Duration;

use alloc_registry::{Handle, LeakReport, Registry, VisualizationConfig};
use tracing::{info, warn};

use crate::pal::{Platform, PlatformFacade};
use crate::resources::ResourceUsage;
use crate::{Error, Result, simulate_cpu_load};

/// The allocations made by the scenario: size in bytes and source label.
const MAIN_ALLOCATION: (usize, &str) = (1000, "Main Function");
const DATA_ALLOCATION: (usize, &str) = (2000, "Data Processing");
const GUI_ALLOCATION: (usize, &str) = (500, "GUI Module");

/// Settings for one monitoring run.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use heap_monitor::MonitorConfig;
///
/// let config = MonitorConfig::default()
///     .with_cpu_load(Duration::from_millis(500), 50.0)
///     .with_wait_for_enter(true);
///
/// assert_eq!(config.cpu_duration(), Duration::from_millis(500));
/// ```
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    cpu_duration: Duration,
    cpu_load_percent: f64,
    visualization: VisualizationConfig,
    wait_for_enter: bool,
}

impl MonitorConfig {
    /// Sets how long the processor load simulation runs and how busy it keeps the processor.
    #[must_use]
    pub fn with_cpu_load(mut self, duration: Duration, load_percent: f64) -> Self {
        self.cpu_duration = duration;
        self.cpu_load_percent = load_percent;
        self
    }

    /// Sets how the memory map is rendered.
    #[must_use]
    pub fn with_visualization(mut self, visualization: VisualizationConfig) -> Self {
        self.visualization = visualization;
        self
    }

    /// Sets whether the run pauses for Enter before starting and before finishing.
    #[must_use]
    pub fn with_wait_for_enter(mut self, wait_for_enter: bool) -> Self {
        self.wait_for_enter = wait_for_enter;
        self
    }

    /// How long the processor load simulation runs.
    #[must_use]
    pub fn cpu_duration(&self) -> Duration {
        self.cpu_duration
    }

    /// Target processor load of the simulation, in percent.
    #[must_use]
    pub fn cpu_load_percent(&self) -> f64 {
        self.cpu_load_percent
    }

    /// How the memory map is rendered.
    #[must_use]
    pub fn visualization(&self) -> &VisualizationConfig {
        &self.visualization
    }

    /// Whether the run pauses for Enter before starting and before finishing.
    #[must_use]
    pub fn wait_for_enter(&self) -> bool {
        self.wait_for_enter
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cpu_duration: Duration::from_secs(2),
            cpu_load_percent: 75.0,
            visualization: VisualizationConfig::default(),
            wait_for_enter: false,
        }
    }
}

/// Runs the monitoring scenario, writing the reports to `output`.
///
/// Three labeled allocations are tracked and rendered as a memory map. After a processor load
/// simulation and a process resource report, two of them are released again and the third is
/// left behind, so the final leak report has exactly one entry. That report is also returned.
///
/// `input` is only read from if the configuration asks to wait for Enter.
///
/// # Errors
///
/// * [`Error::Allocation`] if one of the allocations fails; the run stops there.
/// * [`Error::Console`] if reading `input` or writing `output` fails.
pub fn run(
    config: &MonitorConfig,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<LeakReport> {
    run_with_platform(config, &PlatformFacade::real(), input, output)
}

fn run_with_platform(
    config: &MonitorConfig,
    platform: &impl Platform,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<LeakReport> {
    writeln!(output, "=== System Monitor ===")?;
    writeln!(output, "Tool for system resource visualization")?;

    if config.wait_for_enter {
        wait_for_enter(input, output, "Press Enter to start the simulations...")?;
    }

    let registry = Registry::new();

    writeln!(output)?;
    writeln!(output, "Running memory allocation simulation...")?;
    let main = track(&registry, MAIN_ALLOCATION)?;
    let _data = track(&registry, DATA_ALLOCATION)?;
    let gui = track(&registry, GUI_ALLOCATION)?;

    writeln!(output)?;
    write!(
        output,
        "{}",
        registry.enumerate().visualize(&config.visualization)
    )?;
    output.flush()?;

    writeln!(output)?;
    writeln!(output, "=== CPU Load Simulation ===")?;
    writeln!(output, "Target load: {:.1}%", config.cpu_load_percent)?;
    writeln!(
        output,
        "Duration: {:.1} seconds",
        config.cpu_duration.as_secs_f64()
    )?;
    output.flush()?;

    let summary = simulate_cpu_load(config.cpu_duration, config.cpu_load_percent);
    info!(
        elapsed_ms = summary.elapsed.as_millis(),
        busy_ms = summary.busy.as_millis(),
        "processor load simulation finished"
    );
    writeln!(output, "CPU load simulation done")?;
    output.flush()?;

    writeln!(output)?;
    write!(output, "{}", ResourceUsage::query(platform))?;
    output.flush()?;

    writeln!(output)?;
    writeln!(output, "Simulating a leak by releasing only some allocations...")?;
    release(&registry, main);
    release(&registry, gui);

    let leaks = registry.shutdown();

    writeln!(output)?;
    write!(output, "{leaks}")?;
    output.flush()?;

    if config.wait_for_enter {
        writeln!(output)?;
        wait_for_enter(input, output, "Simulation over. Press Enter to exit...")?;
    }

    Ok(leaks)
}

fn track(registry: &Registry, (size, label): (usize, &'static str)) -> Result<Handle> {
    registry
        .track(size, label)
        .map_err(|source| Error::Allocation { label, source })
}

/// Releases an allocation. Failing to do so is worth a warning but not worth stopping for.
fn release(registry: &Registry, handle: Handle) {
    if let Err(error) = registry.untrack(handle) {
        warn!(%error, "continuing after failed release");
    }
}

fn wait_for_enter(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> Result<()> {
    writeln!(output, "{prompt}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io;

    use super::*;
    use crate::pal::FakePlatform;

    fn quick_config() -> MonitorConfig {
        MonitorConfig::default().with_cpu_load(Duration::ZERO, 75.0)
    }

    fn run_to_string(config: &MonitorConfig, input: &str) -> (LeakReport, String) {
        let mut input = io::Cursor::new(input.as_bytes().to_vec());
        let mut output = Vec::new();

        let leaks = run_with_platform(
            config,
            &PlatformFacade::fake(FakePlatform::new()),
            &mut input,
            &mut output,
        )
        .unwrap();

        (leaks, String::from_utf8(output).unwrap())
    }

    #[test]
    fn leaves_exactly_the_data_allocation_behind() {
        let (leaks, _) = run_to_string(&quick_config(), "");

        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks.total_leaked_bytes(), 2000);

        let leak = leaks.leaks().next().unwrap();
        assert_eq!(leak.source(), "Data Processing");
    }

    #[test]
    fn output_contains_every_section_in_order() {
        let (_, output) = run_to_string(&quick_config(), "");

        let sections = [
            "=== System Monitor ===",
            "=== Memory Usage Visualization ===",
            "=== CPU Load Simulation ===",
            "CPU load simulation done",
            "=== Process Resource Usage ===",
            "=== Memory Leak Analysis ===",
            "Total leaked memory: 2000 bytes",
        ];

        let mut position = 0;
        for section in sections {
            let found = output
                .get(position..)
                .and_then(|rest| rest.find(section))
                .unwrap_or_else(|| panic!("missing or out of order: {section}\n{output}"));
            position += found + section.len();
        }
    }

    #[test]
    fn memory_map_shows_all_three_allocations_newest_first() {
        let (_, output) = run_to_string(&quick_config(), "");

        let sources: Vec<_> = output
            .lines()
            .filter_map(|line| line.strip_prefix("  Source: "))
            .collect();

        // Three in the memory map, then one in the leak report.
        assert_eq!(
            sources,
            ["GUI Module", "Data Processing", "Main Function", "Data Processing"]
        );
    }

    #[test]
    fn custom_visualization_is_used() {
        let config = quick_config().with_visualization(
            VisualizationConfig::default()
                .with_glyph('#')
                .with_max_blocks(5),
        );

        let (_, output) = run_to_string(&config, "");

        assert!(output.contains("Memory Map: [#####...]"));
    }

    #[test]
    fn waits_for_enter_twice_when_asked() {
        let config = quick_config().with_wait_for_enter(true);

        let (_, output) = run_to_string(&config, "\n\n");

        assert!(output.contains("Press Enter to start the simulations..."));
        assert!(output.contains("Simulation over. Press Enter to exit..."));
    }

    #[test]
    fn does_not_prompt_by_default() {
        let (_, output) = run_to_string(&quick_config(), "");

        assert!(!output.contains("Press Enter"));
    }

    #[test]
    fn write_failure_is_console_error() {
        struct BrokenPipe;

        impl Write for BrokenPipe {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let result = run_with_platform(
            &quick_config(),
            &FakePlatform::new(),
            &mut io::empty(),
            &mut BrokenPipe,
        );

        assert!(matches!(result, Err(Error::Console(_))));
    }
}
