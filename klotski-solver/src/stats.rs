//! Search summary and process memory reporting.

#[cfg(unix)]
use std::mem::MaybeUninit;
use std::time::Duration;

use klotski_core::SearchStats;

/// Peak resident set size of this process in bytes, from `getrusage`.
#[cfg(unix)]
pub fn peak_memory() -> Option<u64> {
    let mut usage = MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: getrusage only writes into the struct it is handed.
    if unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) } != 0 {
        return None;
    }
    // SAFETY: a zero return means the struct was filled in.
    let max_rss = u64::try_from(unsafe { usage.assume_init() }.ru_maxrss).ok()?;

    // Darwin reports bytes, everything else kilobytes.
    if cfg!(target_vendor = "apple") {
        Some(max_rss)
    } else {
        Some(max_rss * 1024)
    }
}

#[cfg(not(unix))]
pub fn peak_memory() -> Option<u64> {
    None
}

/// `1536` -> `"1.5 KB"`. Whole bytes below 1 KB.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Arrangements examined per second.
pub fn examine_rate(stats: &SearchStats, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        stats.examined as f64 / secs
    } else {
        0.0
    }
}

/// Print final summary
pub fn print_summary(stats: &SearchStats, elapsed: Duration) {
    println!("Arrangements examined: {}", stats.examined);
    println!("Arrangements discovered: {}", stats.discovered);
    println!("  - from double steps: {}", stats.lookahead);
    println!("Duplicates dropped: {}", stats.duplicates);
    println!("Deepest step: {}", stats.max_step);
    println!("Time: {:.3}s", elapsed.as_secs_f64());
    println!("Average rate: {:.0} arrangements/sec", examine_rate(stats, elapsed));
    if let Some(peak) = peak_memory() {
        println!("Peak memory: {}", format_bytes(peak));
    }
}
