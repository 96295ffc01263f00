//! Sibling spreading by minimum-gap maximization.
//!
//! Assigns every group member a day inside its own window so that the
//! smallest distance between any two assigned days is as large as a
//! bounded randomized local search can make it. The exact problem
//! (max-min separation with interval constraints) is hard in general;
//! this is a heuristic with a hard attempt bound.
//!
//! # Algorithm
//!
//! 1. **Seed**: draw a day for every member inside its window.
//! 2. **Measure**: the minimum gap is 0 if two members share a day,
//!    otherwise the smallest difference between consecutive sorted days.
//! 3. **Tighten**: while the gap is positive, try `T = max(gap, best) + 1`
//!    by sweeping members in day order: the left-most stays put, every
//!    following member moves to `max(previous + T, window start)`. The
//!    sweep fails only when that day is past the member's window end; a
//!    member whose window starts beyond `previous + T` is lifted to its
//!    window start instead of failing the sweep, so an anchor far to the
//!    left of the sibling windows cannot block tightening.
//!    A full sweep is accepted and retried with a larger `T`.
//! 4. **Book-keep**: a gap better than the best so far snapshots the day
//!    table and resets the attempt counter.
//! 5. **Perturb**: members on crowded days (gap 0), or on the right-hand
//!    day of each minimum-gap pair, are redrawn inside their windows.
//! 6. Stop after `max_attempts` consecutive attempts without improvement.
//!
//! The left-most member is never moved by a sweep and never evicted by a
//! positive-gap perturbation.
//!
//! # Reference
//! Bounded random-restart local search; see Hoos & Stützle (2004),
//! "Stochastic Local Search: Foundations and Applications", Ch. 2.

use rand::rngs::ThreadRng;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

use super::sampler::LoadBalancedSampler;
use crate::models::{
    Assignment, DayLoad, DayRange, GroupMember, PreferenceWeights, PresetId, Timeline,
};

/// Default bound on consecutive non-improving attempts.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Source of random days for seeding and perturbation.
pub trait DayDrawer {
    /// Draws a day inside `range`, preferring days not in `occupied`.
    fn draw(&mut self, range: DayRange, occupied: &BTreeSet<i64>) -> i64;
}

/// Uniform draws over the free days of a window.
///
/// Falls back to a uniform draw over the whole window when every day is
/// occupied.
#[derive(Debug, Clone)]
pub struct UniformDrawer<R> {
    rng: R,
}

impl UniformDrawer<ThreadRng> {
    /// Drawer backed by the thread-local, unseeded RNG.
    pub fn unseeded() -> Self {
        Self { rng: rand::rng() }
    }
}

impl<R: Rng> UniformDrawer<R> {
    /// Drawer backed by the given RNG.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> DayDrawer for UniformDrawer<R> {
    fn draw(&mut self, range: DayRange, occupied: &BTreeSet<i64>) -> i64 {
        let free: Vec<i64> = range.days().filter(|d| !occupied.contains(d)).collect();
        if free.is_empty() {
            self.rng.random_range(range.low()..=range.high())
        } else {
            free[self.rng.random_range(0..free.len())]
        }
    }
}

/// Draws through [`LoadBalancedSampler`] so redrawn siblings also favor
/// lightly loaded days and preferred weekdays.
pub struct LoadWeightedDrawer<'a, R> {
    sampler: LoadBalancedSampler,
    load: &'a DayLoad,
    preset: PresetId,
    preferences: &'a PreferenceWeights,
    timeline: &'a Timeline,
    rng: R,
}

impl<'a, R: Rng> LoadWeightedDrawer<'a, R> {
    /// Creates a drawer measuring distances from `anchor`.
    pub fn new(
        anchor: i64,
        load: &'a DayLoad,
        preset: PresetId,
        preferences: &'a PreferenceWeights,
        timeline: &'a Timeline,
        rng: R,
    ) -> Self {
        Self {
            sampler: LoadBalancedSampler::new(anchor),
            load,
            preset,
            preferences,
            timeline,
            rng,
        }
    }
}

impl<R: Rng> DayDrawer for LoadWeightedDrawer<'_, R> {
    fn draw(&mut self, range: DayRange, occupied: &BTreeSet<i64>) -> i64 {
        let mut candidates: Vec<i64> = range.days().filter(|d| !occupied.contains(d)).collect();
        if candidates.is_empty() {
            candidates = range.days().collect();
        }
        let loads = self.load.loads(self.preset, &candidates);
        let weights: Vec<f32> = candidates
            .iter()
            .map(|&d| self.preferences.weight_of(self.timeline, d))
            .collect();
        let exclusions: BTreeSet<i64> = candidates
            .iter()
            .copied()
            .filter(|&d| self.preferences.is_override(self.timeline, d))
            .collect();
        self.sampler
            .sample(&candidates, &loads, &weights, &exclusions, &mut self.rng)
            .unwrap_or(range.low())
    }
}

/// Result of a sibling allocation.
#[derive(Debug, Clone)]
pub struct GroupAllocation {
    /// Days for the card members (anchors excluded).
    pub assignment: Assignment,
    /// Minimum gap across all members, anchors included.
    /// `None` with fewer than two members.
    pub min_gap: Option<i64>,
}

/// Randomized minimum-gap maximizer for sibling groups.
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
/// use u_due::allocation::{GapMaximizingAllocator, UniformDrawer};
/// use u_due::models::{CardId, DayRange, GroupMember, Item};
///
/// let range = DayRange::new(100, 104).unwrap();
/// let members: Vec<GroupMember> = (1..=3)
///     .map(|id| GroupMember::Card(Item::new(CardId(id), 100).with_range(range)))
///     .collect();
///
/// let mut drawer = UniformDrawer::new(SmallRng::seed_from_u64(3));
/// let result = GapMaximizingAllocator::new().allocate(&members, &mut drawer);
/// assert_eq!(result.assignment.len(), 3);
/// assert!(result.min_gap.unwrap() >= 1);
/// ```
#[derive(Debug, Clone)]
pub struct GapMaximizingAllocator {
    max_attempts: usize,
}

impl GapMaximizingAllocator {
    /// Creates an allocator with [`DEFAULT_MAX_ATTEMPTS`].
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets the bound on consecutive non-improving attempts (at least 1).
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Allocates one day per member.
    ///
    /// Always terminates and always returns days inside each member's
    /// window, even when no positive gap is achievable.
    pub fn allocate<D: DayDrawer + ?Sized>(
        &self,
        members: &[GroupMember],
        drawer: &mut D,
    ) -> GroupAllocation {
        let ranges: Vec<DayRange> = members.iter().map(GroupMember::range).collect();
        if ranges.is_empty() {
            return GroupAllocation {
                assignment: Assignment::new(),
                min_gap: None,
            };
        }

        let empty = BTreeSet::new();
        let mut table: Vec<i64> = ranges.iter().map(|&r| drawer.draw(r, &empty)).collect();
        if ranges.len() == 1 {
            return Self::expand(members, &table, None);
        }

        let mut best = table.clone();
        let mut best_gap = min_gap(&table);
        let mut attempts = 0;

        while attempts < self.max_attempts {
            let mut gap = min_gap(&table);
            while gap > 0 {
                let target = gap.max(best_gap) + 1;
                match tighten(&table, &ranges, target) {
                    Some(next) => {
                        table = next;
                        gap = min_gap(&table);
                    }
                    None => break,
                }
            }

            if gap > best_gap {
                best_gap = gap;
                best.clone_from(&table);
                attempts = 0;
            } else {
                attempts += 1;
            }

            perturb(&mut table, &ranges, gap, drawer);
        }

        tracing::debug!(
            members = members.len(),
            min_gap = best_gap,
            "sibling allocation finished"
        );
        Self::expand(members, &best, Some(best_gap))
    }

    fn expand(members: &[GroupMember], table: &[i64], gap: Option<i64>) -> GroupAllocation {
        let assignment = members
            .iter()
            .zip(table)
            .filter_map(|(m, &day)| m.item().map(|item| (item.id, day)))
            .collect();
        GroupAllocation {
            assignment,
            min_gap: gap,
        }
    }
}

impl Default for GapMaximizingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// 0 if two members share a day, else the smallest consecutive difference.
fn min_gap(table: &[i64]) -> i64 {
    let mut days = table.to_vec();
    days.sort_unstable();
    days.windows(2).map(|w| w[1] - w[0]).min().unwrap_or(0)
}

/// Member indices ordered by assigned day, then by index.
fn day_order(table: &[i64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..table.len()).collect();
    order.sort_by_key(|&i| (table[i], i));
    order
}

/// Left-to-right sweep placing members at least `gap` apart.
///
/// Members are lifted to their window start when `previous + gap` falls
/// short of it; only overshooting a window end fails the sweep.
fn tighten(table: &[i64], ranges: &[DayRange], gap: i64) -> Option<Vec<i64>> {
    let order = day_order(table);
    let mut next = table.to_vec();
    let mut prev = table[order[0]];
    for &i in &order[1..] {
        let target = (prev + gap).max(ranges[i].low());
        if target > ranges[i].high() {
            return None;
        }
        next[i] = target;
        prev = target;
    }
    Some(next)
}

/// Redraws the members bordering the current minimum gap.
fn perturb<D: DayDrawer + ?Sized>(
    table: &mut [i64],
    ranges: &[DayRange],
    gap: i64,
    drawer: &mut D,
) {
    let mut evicted: Vec<usize> = if gap == 0 {
        let mut per_day: BTreeMap<i64, usize> = BTreeMap::new();
        for &day in table.iter() {
            *per_day.entry(day).or_insert(0) += 1;
        }
        (0..table.len()).filter(|&i| per_day[&table[i]] > 1).collect()
    } else {
        let order = day_order(table);
        order
            .windows(2)
            .filter(|w| table[w[1]] - table[w[0]] == gap)
            .map(|w| w[1])
            .collect()
    };

    // Tightest windows first: pinned members reclaim their day before
    // flexible ones choose.
    evicted.sort_by_key(|&i| (ranges[i].span(), i));

    let mut occupied: BTreeSet<i64> = (0..table.len())
        .filter(|i| !evicted.contains(i))
        .map(|i| table[i])
        .collect();
    for i in evicted {
        let day = drawer.draw(ranges[i], &occupied);
        table[i] = day;
        occupied.insert(day);
    }
}
