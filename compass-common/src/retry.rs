//! Jittered exponential backoff shared by every retrying call site.
//!
//! The schedule is `base * 2^attempt * U[0.85, 1.15]`, capped at
//! [`MAX_BACKOFF`]. Jitter keeps concurrent handlers from hammering an
//! upstream in lockstep after a shared 429.

use std::time::Duration;

/// Ceiling applied to any single backoff sleep.
pub const MAX_BACKOFF: Duration = Duration::from_secs(32);

const JITTER_LOW: f64 = 0.85;
const JITTER_HIGH: f64 = 1.15;

/// Compute the sleep before retry number `attempt` (0-based: the delay
/// taken after the first failure is `attempt = 0`).
pub fn jittered_backoff(base: Duration, attempt: u32) -> Duration {
    let factor = rand::random_range(JITTER_LOW..=JITTER_HIGH);
    let exp = base.as_secs_f64() * f64::from(1u32 << attempt.min(10));
    let delay = Duration::from_secs_f64(exp * factor);
    delay.min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_jitter_band() {
        let base = Duration::from_millis(400);
        for attempt in 0..4u32 {
            let nominal = base.as_secs_f64() * f64::from(1u32 << attempt);
            let lo = Duration::from_secs_f64(nominal * JITTER_LOW);
            let hi = Duration::from_secs_f64(nominal * JITTER_HIGH);
            for _ in 0..32 {
                let d = jittered_backoff(base, attempt);
                assert!(d >= lo, "attempt {attempt}: {d:?} below band");
                assert!(d <= hi, "attempt {attempt}: {d:?} above band");
            }
        }
    }

    #[test]
    fn caps_at_max_backoff() {
        let d = jittered_backoff(Duration::from_secs(8), 6);
        assert_eq!(d, MAX_BACKOFF);
    }

    #[test]
    fn shift_saturates_for_absurd_attempts() {
        // 2^attempt must not overflow even if a caller loops far past the
        // configured attempt budget.
        let d = jittered_backoff(Duration::from_millis(100), 63);
        assert_eq!(d, MAX_BACKOFF);
    }
}
