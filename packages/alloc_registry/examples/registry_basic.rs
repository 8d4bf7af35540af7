//! Tracking a few labeled allocations, rendering them as a memory map and reporting leaks.
//!
//! Run with: `cargo run --example registry_basic`.

use alloc_registry::{Error, Registry, VisualizationConfig};

fn main() -> Result<(), Error> {
    let registry = Registry::new();

    let header = registry.track(1000, "Main Function")?;
    let _payload = registry.track(2000, "Data Processing")?;
    let widgets = registry.track(500, "GUI Module")?;

    // The memory is ours to use while it is tracked.
    registry.with_allocation(header, |bytes| {
        for (byte, tag) in bytes.iter_mut().zip(b"HEAD") {
            *byte = *tag;
        }
    })?;

    registry
        .enumerate()
        .visualize(&VisualizationConfig::default())
        .print_to_stdout();

    registry.untrack(header)?;
    registry.untrack(widgets)?;

    // Untracking twice is reported instead of corrupting anything.
    if let Err(error) = registry.untrack(widgets) {
        println!("As expected: {error}\n");
    }

    // The payload was never untracked, so it shows up as a leak.
    registry.shutdown().print_to_stdout();

    Ok(())
}
