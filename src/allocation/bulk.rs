//! Capacity-constrained bulk redistribution.
//!
//! Places many items onto a list of candidate days without exceeding a
//! per-day capacity target, in priority order. Used for flattening
//! overloaded days and for emptying busy periods or scheduled breaks.
//!
//! # Algorithm
//!
//! 1. Order items with a [`RuleEngine`].
//! 2. Remaining capacity per day = target − pre-existing load (floor 0).
//! 3. For each item pick a day inside its window with capacity left:
//!    - **Chronological**: the earliest such day, so days fill in order.
//!    - **NearestOriginal**: among days at or after the cutoff, the one
//!      minimizing `|day − original_due| / original_interval`; earliest
//!      wins ties.
//! 4. With no capacity left anywhere in the window, overflow onto the last
//!    candidate day inside the window (or the last candidate day overall).
//!
//! The allocator never refuses an item: a partial redistribution beats
//! no redistribution for a maintenance operation.
//!
//! # Complexity
//! Chronological: O(n log n + d) with a next-open-day forest.
//! NearestOriginal: O(n · d).

use serde::{Deserialize, Serialize};

use crate::dispatching::{PriorityContext, RuleEngine};
use crate::error::{Error, Result};
use crate::models::{Assignment, CardId, Item};
use crate::worker::BatchControl;

/// Per-day capacity targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityPlan {
    /// Same target on every candidate day.
    Uniform(u32),
    /// One target per candidate day, in candidate order.
    PerDay(Vec<u32>),
}

impl CapacityPlan {
    /// Spreads `total` over `days` days as evenly as possible; the
    /// remainder goes to the earliest days.
    ///
    /// # Example
    /// ```
    /// use u_due::allocation::CapacityPlan;
    ///
    /// assert_eq!(CapacityPlan::even_spread(3, 8), CapacityPlan::PerDay(vec![3, 3, 2]));
    /// ```
    pub fn even_spread(days: usize, total: u32) -> Self {
        if days == 0 {
            return CapacityPlan::PerDay(Vec::new());
        }
        let base = total / days as u32;
        let extra = (total % days as u32) as usize;
        CapacityPlan::PerDay(
            (0..days)
                .map(|i| base + u32::from(i < extra))
                .collect(),
        )
    }

    fn targets(&self, days: usize) -> Result<Vec<u32>> {
        match self {
            CapacityPlan::Uniform(cap) => Ok(vec![*cap; days]),
            CapacityPlan::PerDay(caps) if caps.len() == days => Ok(caps.clone()),
            CapacityPlan::PerDay(caps) => Err(Error::InvalidConfig(format!(
                "capacity plan has {} entries for {days} candidate days",
                caps.len()
            ))),
        }
    }
}

/// How a day is chosen among those with remaining capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementStrategy {
    /// Earliest day with capacity (flattening).
    Chronological,
    /// Day closest to the item's original due, relative to its interval,
    /// never before `cutoff` (busy/break spreading).
    NearestOriginal { cutoff: i64 },
}

/// Result of a bulk allocation.
#[derive(Debug, Clone, Default)]
pub struct BulkAllocation {
    /// Day per placed item.
    pub assignment: Assignment,
    /// Items placed beyond capacity.
    pub overflow: Vec<CardId>,
    /// Whether placement stopped early on cancellation.
    pub cancelled: bool,
}

/// Greedy capacity-honoring allocator.
#[derive(Debug, Clone)]
pub struct BulkCapacityAllocator {
    strategy: PlacementStrategy,
    priority: RuleEngine,
}

impl BulkCapacityAllocator {
    /// Creates an allocator with the given strategy and priority order.
    pub fn new(strategy: PlacementStrategy, priority: RuleEngine) -> Self {
        Self { strategy, priority }
    }

    /// Places every item on one of `candidate_days`.
    ///
    /// `existing` holds the load already present on each candidate day (in
    /// candidate order); an empty slice means no pre-existing load.
    ///
    /// # Errors
    /// - [`Error::UnsortedCandidates`] if days are not strictly ascending.
    /// - [`Error::InvalidConfig`] if a per-day plan or `existing` does not
    ///   match the number of candidate days.
    pub fn allocate(
        &self,
        items: &[Item],
        candidate_days: &[i64],
        capacity: &CapacityPlan,
        existing: &[u32],
        context: &PriorityContext,
        control: &mut BatchControl,
    ) -> Result<BulkAllocation> {
        check_candidates(candidate_days)?;
        if items.is_empty() {
            return Ok(BulkAllocation::default());
        }
        if candidate_days.is_empty() {
            return Err(Error::NoCandidates);
        }
        if !existing.is_empty() && existing.len() != candidate_days.len() {
            return Err(Error::InvalidConfig(format!(
                "existing load has {} entries for {} candidate days",
                existing.len(),
                candidate_days.len()
            )));
        }

        let mut remaining = capacity.targets(candidate_days.len())?;
        for (slot, &load) in remaining.iter_mut().zip(existing) {
            *slot = slot.saturating_sub(load);
        }

        let order = self.priority.sort_indices(items, context);
        let mut open = OpenDays::new(&remaining);
        let mut result = BulkAllocation::default();

        for (done, &i) in order.iter().enumerate() {
            let item = &items[i];
            let slot = match self.strategy {
                PlacementStrategy::Chronological => {
                    chronological_slot(item, candidate_days, &mut open)
                }
                PlacementStrategy::NearestOriginal { cutoff } => {
                    nearest_slot(item, candidate_days, &remaining, cutoff)
                }
            };

            let index = match slot {
                Some(index) => {
                    remaining[index] -= 1;
                    if remaining[index] == 0 {
                        open.close(index);
                    }
                    index
                }
                None => {
                    result.overflow.push(item.id);
                    overflow_slot(item, candidate_days)
                }
            };
            result.assignment.insert(item.id, candidate_days[index]);

            if !control.checkpoint(done + 1, order.len()) {
                result.cancelled = true;
                break;
            }
        }

        if !result.overflow.is_empty() {
            tracing::warn!(
                overflow = result.overflow.len(),
                items = items.len(),
                "bulk allocation exceeded capacity"
            );
        }
        tracing::debug!(
            placed = result.assignment.len(),
            strategy = ?self.strategy,
            "bulk allocation finished"
        );
        Ok(result)
    }
}

/// Rejects candidate days that are not strictly ascending.
pub fn check_candidates(days: &[i64]) -> Result<()> {
    match days.windows(2).position(|w| w[0] >= w[1]) {
        Some(index) => Err(Error::UnsortedCandidates { index: index + 1 }),
        None => Ok(()),
    }
}

/// First candidate index whose day lies inside the item's window and has
/// capacity left.
fn chronological_slot(item: &Item, days: &[i64], open: &mut OpenDays) -> Option<usize> {
    let range = item.feasible_range;
    let start = days.partition_point(|&d| d < range.low());
    let index = open.find(start);
    (index < days.len() && days[index] <= range.high()).then_some(index)
}

fn nearest_slot(item: &Item, days: &[i64], remaining: &[u32], cutoff: i64) -> Option<usize> {
    let range = item.feasible_range;
    let scale = item.original_interval.max(1) as f64;
    let mut best: Option<(usize, f64)> = None;
    for (index, &day) in days.iter().enumerate() {
        if day < cutoff || remaining[index] == 0 || !range.contains(day) {
            continue;
        }
        let cost = (day - item.original_due).abs() as f64 / scale;
        if best.map_or(true, |(_, c)| cost < c) {
            best = Some((index, cost));
        }
    }
    best.map(|(index, _)| index)
}

/// Last candidate inside the window, else the last candidate overall.
fn overflow_slot(item: &Item, days: &[i64]) -> usize {
    let range = item.feasible_range;
    let end = days.partition_point(|&d| d <= range.high());
    if end > 0 && days[end - 1] >= range.low() {
        end - 1
    } else {
        days.len() - 1
    }
}

/// Next-open-day forest: `find(i)` returns the first index `>= i` with
/// capacity left, or `len` when none remains.
struct OpenDays {
    next: Vec<usize>,
}

impl OpenDays {
    fn new(remaining: &[u32]) -> Self {
        let mut next: Vec<usize> = (0..=remaining.len()).collect();
        for (i, &cap) in remaining.iter().enumerate() {
            if cap == 0 {
                next[i] = i + 1;
            }
        }
        Self { next }
    }

    fn find(&mut self, start: usize) -> usize {
        let mut root = start;
        while self.next[root] != root {
            root = self.next[root];
        }
        let mut i = start;
        while self.next[i] != root {
            let following = self.next[i];
            self.next[i] = root;
            i = following;
        }
        root
    }

    fn close(&mut self, index: usize) {
        self.next[index] = index + 1;
    }
}
