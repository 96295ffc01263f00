//! Load-weighted single-card day sampling.
//!
//! # Algorithm
//!
//! Each candidate day `d` with `n` cards already due gets a base weight
//!
//! ```text
//! w(d) = 1                                  if n == 0
//! w(d) = (1 / n^2.15) · (1 / offset(d)^3)   otherwise
//! ```
//!
//! where `offset(d)` is the distance from the anchor (last review) day.
//! Lightly loaded days and days close to the ideal interval dominate.
//!
//! An easy-day modifier `m(d) ∈ {0, 1}` then suppresses days whose load,
//! normalized by their weekday target, exceeds the normalized average of
//! the other candidates. Forced exclusions always get `m = 0`; a target of
//! 1 always gets `m = 1`. The draw uses `w · m`, falling back to `w` when
//! every modified weight is zero.
//!
//! With load balancing disabled, [`deterministic_day`] draws from an RNG
//! seeded by card id and repetition count, so an unchanged card always
//! lands on the same day. The generator is ChaCha8, whose output stream is
//! fixed across releases.

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::models::{CardId, DayRange};

/// Exponent applied to a day's existing load.
pub const LOAD_EXPONENT: f64 = 2.15;
/// Exponent applied to a day's distance from the anchor.
pub const DISTANCE_EXPONENT: f64 = 3.0;

/// Chooses one day from a card's window, weighted by load and preference.
#[derive(Debug, Clone, Copy)]
pub struct LoadBalancedSampler {
    anchor: i64,
}

impl LoadBalancedSampler {
    /// Creates a sampler measuring distances from `anchor` (the last review day).
    pub fn new(anchor: i64) -> Self {
        Self { anchor }
    }

    /// Base weight of a day with `load` cards already due.
    pub fn base_weight(&self, day: i64, load: u32) -> f64 {
        if load == 0 {
            return 1.0;
        }
        let offset = (day - self.anchor).abs().max(1) as f64;
        (1.0 / f64::from(load).powf(LOAD_EXPONENT)) * (1.0 / offset.powf(DISTANCE_EXPONENT))
    }

    /// Easy-day modifiers (0 or 1) per candidate.
    ///
    /// `loads` and `weekday_weights` are parallel to `candidates`; missing
    /// entries count as load 0 and weight 1.
    pub fn easy_day_modifiers(
        candidates: &[i64],
        loads: &[u32],
        weekday_weights: &[f32],
        forced_exclusions: &BTreeSet<i64>,
    ) -> Vec<f64> {
        let load_at = |i: usize| f64::from(loads.get(i).copied().unwrap_or(0));
        let target_at = |i: usize| f64::from(weekday_weights.get(i).copied().unwrap_or(1.0));

        let total_load: f64 = (0..candidates.len()).map(load_at).sum();
        let total_target: f64 = (0..candidates.len()).map(target_at).sum();

        candidates
            .iter()
            .enumerate()
            .map(|(i, day)| {
                if forced_exclusions.contains(day) {
                    return 0.0;
                }
                let target = target_at(i);
                if target >= 1.0 {
                    return 1.0;
                }
                if target <= 0.0 {
                    return 0.0;
                }
                let load = load_at(i);
                let other_target = total_target - target;
                if other_target <= 0.0 {
                    return 1.0;
                }
                let other_avg = (total_load - load) / other_target;
                if load / target > other_avg {
                    0.0
                } else {
                    1.0
                }
            })
            .collect()
    }

    /// Final `w · m` weights per candidate.
    pub fn weights(
        &self,
        candidates: &[i64],
        loads: &[u32],
        weekday_weights: &[f32],
        forced_exclusions: &BTreeSet<i64>,
    ) -> Vec<f64> {
        let modifiers =
            Self::easy_day_modifiers(candidates, loads, weekday_weights, forced_exclusions);
        self.base_weights(candidates, loads)
            .into_iter()
            .zip(modifiers)
            .map(|(w, m)| w * m)
            .collect()
    }

    fn base_weights(&self, candidates: &[i64], loads: &[u32]) -> Vec<f64> {
        candidates
            .iter()
            .enumerate()
            .map(|(i, &day)| self.base_weight(day, loads.get(i).copied().unwrap_or(0)))
            .collect()
    }

    /// Draws one candidate day.
    ///
    /// Never fails for a non-empty candidate list.
    ///
    /// # Errors
    /// [`Error::NoCandidates`] if `candidates` is empty.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        candidates: &[i64],
        loads: &[u32],
        weekday_weights: &[f32],
        forced_exclusions: &BTreeSet<i64>,
        rng: &mut R,
    ) -> Result<i64> {
        if candidates.is_empty() {
            return Err(Error::NoCandidates);
        }
        let weights = self.weights(candidates, loads, weekday_weights, forced_exclusions);
        let index = match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(rng),
            Err(_) => WeightedIndex::new(self.base_weights(candidates, loads))
                .map_err(|_| Error::NoCandidates)?
                .sample(rng),
        };
        Ok(candidates[index])
    }
}

/// Stable seed for a card's deterministic fuzz.
pub fn fuzz_seed(id: CardId, reps: u32) -> u64 {
    (id.0 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ u64::from(reps)
}

/// Deterministic per-card RNG.
pub fn card_rng(id: CardId, reps: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(fuzz_seed(id, reps))
}

/// Reproducible day within `range` for a card at a given repetition count.
pub fn deterministic_day(id: CardId, reps: u32, range: DayRange) -> i64 {
    let fuzz: f64 = card_rng(id, reps).random();
    let offset = (fuzz * range.span() as f64).floor() as i64;
    range.low() + offset.min(range.span() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;

    fn no_exclusions() -> BTreeSet<i64> {
        BTreeSet::new()
    }

    #[test]
    fn test_empty_day_weighs_one() {
        let s = LoadBalancedSampler::new(100);
        assert_eq!(s.base_weight(110, 0), 1.0);
    }

    #[test]
    fn test_weight_falls_with_load_and_distance() {
        let s = LoadBalancedSampler::new(100);
        assert!(s.base_weight(110, 2) < s.base_weight(110, 1));
        assert!(s.base_weight(120, 1) < s.base_weight(110, 1));
        // 1 / (1^2.15 · 10^3)
        assert!((s.base_weight(110, 1) - 1e-3).abs() < 1e-12);
    }

    #[test]
    fn test_modifier_full_weight_is_unrestricted() {
        let m = LoadBalancedSampler::easy_day_modifiers(
            &[1, 2, 3],
            &[50, 0, 0],
            &[1.0, 1.0, 1.0],
            &no_exclusions(),
        );
        assert_eq!(m, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_modifier_suppresses_overloaded_reduced_day() {
        // day 1 target 0.5 holds 10; others average 5 per unit → 20 > 5
        let m = LoadBalancedSampler::easy_day_modifiers(
            &[1, 2, 3],
            &[10, 5, 5],
            &[0.5, 1.0, 1.0],
            &no_exclusions(),
        );
        assert_eq!(m, vec![0.0, 1.0, 1.0]);

        // light enough: 2 / 0.5 = 4 <= 5
        let m = LoadBalancedSampler::easy_day_modifiers(
            &[1, 2, 3],
            &[2, 5, 5],
            &[0.5, 1.0, 1.0],
            &no_exclusions(),
        );
        assert_eq!(m[0], 1.0);
    }

    #[test]
    fn test_modifier_free_day_and_exclusions() {
        let exclusions: BTreeSet<i64> = [3].into_iter().collect();
        let m = LoadBalancedSampler::easy_day_modifiers(
            &[1, 2, 3],
            &[0, 0, 0],
            &[0.0, 1.0, 1.0],
            &exclusions,
        );
        assert_eq!(m, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_sample_avoids_excluded_days() {
        let s = LoadBalancedSampler::new(0);
        let exclusions: BTreeSet<i64> = [10, 11].into_iter().collect();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let d = s
                .sample(&[10, 11, 12], &[0, 0, 0], &[1.0; 3], &exclusions, &mut rng)
                .unwrap();
            assert_eq!(d, 12);
        }
    }

    #[test]
    fn test_sample_falls_back_when_everything_is_excluded() {
        let s = LoadBalancedSampler::new(0);
        let exclusions: BTreeSet<i64> = [10, 11].into_iter().collect();
        let mut rng = SmallRng::seed_from_u64(7);
        let d = s
            .sample(&[10, 11], &[0, 0], &[1.0; 2], &exclusions, &mut rng)
            .unwrap();
        assert!(d == 10 || d == 11);
    }

    #[test]
    fn test_sample_prefers_empty_day() {
        let s = LoadBalancedSampler::new(0);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut empty_hits = 0;
        for _ in 0..200 {
            let d = s
                .sample(&[10, 11], &[40, 0], &[1.0; 2], &no_exclusions(), &mut rng)
                .unwrap();
            if d == 11 {
                empty_hits += 1;
            }
        }
        assert!(empty_hits > 190);
    }

    #[test]
    fn test_sample_empty_candidates() {
        let s = LoadBalancedSampler::new(0);
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(matches!(
            s.sample(&[], &[], &[], &no_exclusions(), &mut rng),
            Err(Error::NoCandidates)
        ));
    }

    #[test]
    fn test_deterministic_day_is_reproducible() {
        let range = DayRange::new(100, 140).unwrap();
        let first = deterministic_day(CardId(1_700_000_000_123), 7, range);
        for _ in 0..10 {
            assert_eq!(deterministic_day(CardId(1_700_000_000_123), 7, range), first);
        }
        assert!(range.contains(first));
    }

    #[test]
    fn test_deterministic_day_fixed_values() {
        let wide = DayRange::new(0, 10_000).unwrap();
        assert_eq!(deterministic_day(CardId(42), 3, wide), 9589);
        assert_eq!(deterministic_day(CardId(42), 4, wide), 7378);
        assert_eq!(deterministic_day(CardId(1), 0, wide), 6511);
        assert_eq!(deterministic_day(CardId(7), 0, DayRange::new(100, 130).unwrap()), 117);
    }

    #[test]
    fn test_deterministic_day_varies_with_reps() {
        let range = DayRange::new(0, 10_000).unwrap();
        let days: BTreeSet<i64> = (0..20)
            .map(|reps| deterministic_day(CardId(42), reps, range))
            .collect();
        assert!(days.len() > 1);
    }

    #[test]
    fn test_deterministic_day_point_range() {
        assert_eq!(deterministic_day(CardId(5), 3, DayRange::point(77)), 77);
    }
}
