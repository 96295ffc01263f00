//! Fuzz-tolerant feasible interval windows.
//!
//! # Algorithm
//!
//! The tolerance grows piecewise-linearly with the target interval:
//!
//! | Band (days) | Factor |
//! |-------------|--------|
//! | 2.5 – 7 | 0.15 |
//! | 7 – 20 | 0.10 |
//! | 20 – ∞ | 0.05 |
//!
//! `delta = 1 + Σ factor · max(min(target, end) - start, 0)`, and the
//! window is `round(target ± delta)` clipped to `[2, max_interval]`.
//! A card whose target exceeds the time already elapsed since its last
//! review is never scheduled earlier than tomorrow.

use crate::models::DayRange;

/// Targets below this many days are never fuzzed.
pub const FUZZ_THRESHOLD: f64 = 2.5;

struct FuzzBand {
    start: f64,
    end: f64,
    factor: f64,
}

const FUZZ_BANDS: [FuzzBand; 3] = [
    FuzzBand {
        start: 2.5,
        end: 7.0,
        factor: 0.15,
    },
    FuzzBand {
        start: 7.0,
        end: 20.0,
        factor: 0.1,
    },
    FuzzBand {
        start: 20.0,
        end: f64::INFINITY,
        factor: 0.05,
    },
];

/// Fuzz tolerance (days) for a target interval.
pub fn fuzz_delta(target_interval: f64) -> f64 {
    FUZZ_BANDS.iter().fold(1.0, |delta, band| {
        delta + band.factor * (target_interval.min(band.end) - band.start).max(0.0)
    })
}

/// Interval window `(low, high)` for a target interval.
///
/// Pure and deterministic. `low <= high` always holds on return.
///
/// # Example
/// ```
/// use u_due::allocation::feasible_range;
///
/// let (low, high) = feasible_range(10.0, 0, 36_500);
/// assert_eq!((low, high), (8, 12));
/// ```
pub fn feasible_range(target_interval: f64, last_elapsed_days: i64, max_interval: i64) -> (i64, i64) {
    let delta = fuzz_delta(target_interval);
    let target = target_interval.min(max_interval as f64);

    let mut low = ((target - delta).round() as i64).max(2);
    let high = ((target + delta).round() as i64).min(max_interval);

    if target > last_elapsed_days as f64 {
        low = low.max(last_elapsed_days + 1);
    }
    (low.min(high), high)
}

/// Absolute due-day window for a card last reviewed on `last_review`.
///
/// Targets under [`FUZZ_THRESHOLD`] produce the degenerate window at the
/// rounded target.
pub fn fuzzed_window(
    target_interval: f64,
    last_review: i64,
    last_elapsed_days: i64,
    max_interval: i64,
) -> DayRange {
    if target_interval < FUZZ_THRESHOLD {
        let ivl = (target_interval.round() as i64).clamp(1, max_interval.max(1));
        return DayRange::point(last_review + ivl);
    }
    let (low, high) = feasible_range(target_interval, last_elapsed_days, max_interval);
    DayRange::new(last_review + low, last_review + high)
        .unwrap_or_else(|_| DayRange::point(last_review + high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_bands() {
        assert!((fuzz_delta(2.0) - 1.0).abs() < 1e-12);
        assert!((fuzz_delta(7.0) - (1.0 + 0.15 * 4.5)).abs() < 1e-12);
        assert!((fuzz_delta(20.0) - (1.0 + 0.675 + 1.3)).abs() < 1e-12);
        assert!((fuzz_delta(30.0) - 3.475).abs() < 1e-12);
    }

    #[test]
    fn test_thirty_days() {
        // 30 - 3.475 = 26.525 rounds up; 30 + 3.475 = 33.475 rounds down.
        assert_eq!(feasible_range(30.0, 0, 36_500), (27, 33));
    }

    #[test]
    fn test_pure() {
        for _ in 0..5 {
            assert_eq!(feasible_range(123.4, 50, 36_500), feasible_range(123.4, 50, 36_500));
        }
    }

    #[test]
    fn test_minimum_low_is_two() {
        let (low, high) = feasible_range(3.0, 0, 36_500);
        assert_eq!(low, 2);
        assert!(high >= low);
    }

    #[test]
    fn test_clamped_to_max_interval() {
        // delta comes from the unclamped target: 26.975
        let (low, high) = feasible_range(500.0, 0, 100);
        assert_eq!(high, 100);
        assert_eq!(low, 73);
    }

    #[test]
    fn test_not_before_tomorrow() {
        // target 10 > elapsed 9 → low raised to 10
        assert_eq!(feasible_range(10.0, 9, 36_500), (10, 12));
    }

    #[test]
    fn test_elapsed_beyond_target_does_not_raise() {
        assert_eq!(feasible_range(10.0, 40, 36_500), (8, 12));
    }

    #[test]
    fn test_low_never_exceeds_high() {
        assert_eq!(feasible_range(10.0, 9, 11), (10, 11));
        // the floor of 2 exceeds a one-day maximum → collapsed onto high
        assert_eq!(feasible_range(3.0, 0, 1), (1, 1));
    }

    #[test]
    fn test_window_below_threshold_is_degenerate() {
        let w = fuzzed_window(1.6, 100, 0, 36_500);
        assert_eq!((w.low(), w.high()), (102, 102));
    }

    #[test]
    fn test_window_is_offset_by_last_review() {
        let w = fuzzed_window(10.0, 100, 0, 36_500);
        assert_eq!((w.low(), w.high()), (108, 112));
    }
}
