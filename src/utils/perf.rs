//! Performance measurement utilities for memory analysis.
//!
//! The comparison runner reports the process's peak physical memory next to
//! its timing numbers. On Linux this is read from `/proc/self/status`; other
//! platforms report zero.

/// Reads the peak resident set size (the `VmHWM` high-water mark) from
/// `/proc/self/status` on Linux.
///
/// `VmHWM` tracks physical memory, which is the quantity of interest when
/// comparing a dense layer's footprint against a structured one; the virtual
/// peak (`VmPeak`) also counts reserved-but-untouched mappings.
///
/// # Returns
/// The peak resident memory in kilobytes, or 0 if it cannot be read.
#[cfg(target_os = "linux")]
pub fn peak_rss_kb() -> u64 {
    let status = match std::fs::read_to_string("/proc/self/status") {
        Ok(content) => content,
        Err(_) => return 0,
    };
    status
        .lines()
        .find_map(|line| {
            let value = line.strip_prefix("VmHWM:")?;
            value.split_whitespace().next()?.parse().ok()
        })
        .unwrap_or(0)
}

/// A dummy implementation for non-Linux platforms to ensure the code compiles.
#[cfg(not(target_os = "linux"))]
pub fn peak_rss_kb() -> u64 {
    use std::sync::Once;
    static WARN_ONCE: Once = Once::new();
    WARN_ONCE.call_once(|| {
        log::warn!("Peak RSS measurement is only supported on Linux; returning 0.");
    });
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn test_peak_rss_is_positive_on_linux() {
        // A running test process has touched memory, so the high-water mark
        // must be nonzero.
        assert!(peak_rss_kb() > 0);
    }
}
