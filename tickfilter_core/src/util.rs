//! Common time helpers for tickfilter_core.

use std::time::Duration;

/// Fallback ticks fire at this fraction of the nominal update period so that
/// input silence is detected with sub-period latency.
pub const FALLBACK_DIVISOR: f64 = 4.0;

/// Minimum fallback tick period in seconds; keeps the ticker well-defined
/// for degenerate update periods.
pub const MIN_FALLBACK_S: f64 = 0.001;

/// Compute the fallback ticker period for a nominal update period in seconds.
#[inline]
pub fn fallback_period(update_s: f64) -> Duration {
    let secs = (update_s / FALLBACK_DIVISOR).max(MIN_FALLBACK_S);
    Duration::from_secs_f64(secs)
}
