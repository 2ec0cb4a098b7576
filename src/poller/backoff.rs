//! Exponential backoff with optional jitter

use rand::Rng;
use std::time::Duration;
use super::config::PollingConfig;

/// Upper bound (exclusive) of the jitter multiplier
pub const MAX_JITTER_FACTOR: f64 = 1.2;

/// Computes the delay before the next attempt.
///
/// `delay = min(initial_delay * backoff_factor^attempt, max_delay)`, then
/// multiplied by a fresh factor in `[1.0, 1.2)` when jitter is enabled.
pub fn calculate_delay(config: &PollingConfig, attempt: u32) -> Duration {
    let jitter = if config.jitter {
        rand::thread_rng().gen_range(1.0..MAX_JITTER_FACTOR)
    } else {
        1.0
    };
    delay_with_jitter(config, attempt, jitter)
}

/// Same as [`calculate_delay`] with the jitter multiplier supplied by the
/// caller. The multiplier is clamped to `[1.0, 1.2]`; a jittered delay that
/// does not fit in a `Duration` saturates at `Duration::MAX`.
pub fn delay_with_jitter(config: &PollingConfig, attempt: u32, jitter: f64) -> Duration {
    let base = base_delay(config, attempt);
    let jitter = if jitter.is_finite() {
        jitter.clamp(1.0, MAX_JITTER_FACTOR)
    } else {
        1.0
    };
    Duration::try_from_secs_f64(base.as_secs_f64() * jitter).unwrap_or(Duration::MAX)
}

fn base_delay(config: &PollingConfig, attempt: u32) -> Duration {
    if config.initial_delay.is_zero() {
        return Duration::ZERO;
    }
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let secs = config.initial_delay.as_secs_f64() * config.backoff_factor.powi(exponent);
    // Overflows to infinity saturate at the cap.
    if !secs.is_finite() || secs >= config.max_delay.as_secs_f64() {
        return config.max_delay;
    }
    Duration::try_from_secs_f64(secs.max(0.0))
        .map_or(config.max_delay, |delay| delay.min(config.max_delay))
}
