// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Exponential backoff for transient storage failures.
//!
//! Delays are real wall-clock sleeps (`tokio::time::sleep`), not mediated
//! by `shepherd_core::Clock` — that abstraction exists for scheduler
//! bookkeeping, not for governing actual waits. Tests that need to avoid
//! waiting use `tokio::time::pause()`.

use rand::Rng;
use std::time::Duration;

pub const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(250);
const MAX_DELAY: Duration = Duration::from_secs(10);
const JITTER_FRACTION: f64 = 0.2;

/// Base delay (no jitter) before retry attempt `attempt` (1-indexed),
/// doubling each time and capped at `MAX_DELAY`.
pub fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    BASE_DELAY.saturating_mul(factor).min(MAX_DELAY)
}

/// `backoff_delay` jittered by +/-20%, so concurrent retries on the same
/// sheep or bucket don't all wake up in lockstep.
pub fn jittered_backoff_delay(attempt: u32) -> Duration {
    let base = backoff_delay(attempt);
    let jitter = rand::thread_rng().gen_range(-JITTER_FRACTION..=JITTER_FRACTION);
    let scaled = (base.as_secs_f64() * (1.0 + jitter)).max(0.0);
    Duration::from_secs_f64(scaled)
}

pub async fn sleep_for_attempt(attempt: u32) {
    tokio::time::sleep(jittered_backoff_delay(attempt)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        assert_eq!(backoff_delay(1), Duration::from_millis(250));
        assert_eq!(backoff_delay(2), Duration::from_millis(500));
        assert_eq!(backoff_delay(3), Duration::from_millis(1000));
        assert_eq!(backoff_delay(10), MAX_DELAY);
    }

    #[test]
    fn jitter_stays_within_twenty_percent() {
        let base = backoff_delay(2).as_secs_f64();
        for _ in 0..50 {
            let jittered = jittered_backoff_delay(2).as_secs_f64();
            assert!(jittered >= base * 0.8 - 1e-9);
            assert!(jittered <= base * 1.2 + 1e-9);
        }
    }
}
