//! Allocation engine facade.
//!
//! Binds the allocators to one [`Context`]: preset limits, fuzz and
//! load-balance toggles, weekday preferences and today's position on the
//! calendar all come from the context instead of being passed to every
//! allocator separately.
//!
//! # Entry points
//!
//! | Method | Allocator |
//! |--------|-----------|
//! | `compute_feasible_range` | [`feasible_range`] |
//! | `sample_single_day` | [`LoadBalancedSampler`] or [`deterministic_day`] |
//! | `allocate_group` | [`GapMaximizingAllocator`] |
//! | `allocate_bulk` | [`BulkCapacityAllocator`] |

use std::collections::BTreeSet;

use crate::allocation::{
    card_rng, check_candidates, deterministic_day, feasible_range, fuzzed_window,
    BulkAllocation, BulkCapacityAllocator, CapacityPlan, GapMaximizingAllocator,
    GroupAllocation, LoadBalancedSampler, LoadWeightedDrawer, PlacementStrategy, UniformDrawer,
};
use crate::config::{Context, SchedulerConfig};
use crate::dispatching::{rules, PriorityContext, RuleEngine, TieBreaker};
use crate::error::Result;
use crate::models::{Assignment, DayLoad, DayRange, GroupMember, Item, PresetId};
use crate::validation::{validate_group, validate_items};
use crate::worker::BatchControl;

/// Due-day allocation engine.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use u_due::config::{Context, SchedulerConfig};
/// use u_due::models::{CardId, DayLoad, Item, PresetId, Timeline};
/// use u_due::scheduler::Engine;
///
/// let timeline = Timeline::new(100, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
/// let engine = Engine::new(Context::new(SchedulerConfig::default(), timeline));
///
/// let window = engine.due_window(30.0, 90, PresetId(0));
/// let item = Item::new(CardId(1), 120).with_last_review(90).with_range(window);
/// let day = engine.sample_single_day(&item, 3, &DayLoad::new()).unwrap();
/// assert!(window.contains(day));
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    context: Context,
}

impl Engine {
    /// Creates an engine for the given context.
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    /// Configuration and timeline every call runs against.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Shorthand for `context().config`.
    pub fn config(&self) -> &SchedulerConfig {
        &self.context.config
    }

    /// Today's day number.
    pub fn today(&self) -> i64 {
        self.context.today()
    }

    /// Context for priority rules, evaluated as of today.
    pub fn priority_context(&self) -> PriorityContext {
        PriorityContext::at_day(self.today()).with_memory_model(self.config().memory_model)
    }

    /// Interval (days) at which a card of the given stability reaches the
    /// preset's desired retention, clamped to `[1, maximum_interval]`.
    pub fn target_interval(&self, stability: f64, preset: PresetId) -> f64 {
        let p = self.config().preset(preset);
        self.config()
            .memory_model
            .next_interval(stability, p.desired_retention)
            .clamp(1.0, p.maximum_interval.max(1) as f64)
    }

    /// Interval window `(low, high)` under the preset's maximum interval.
    pub fn compute_feasible_range(
        &self,
        target_interval: f64,
        last_elapsed_days: i64,
        preset: PresetId,
    ) -> (i64, i64) {
        feasible_range(
            target_interval,
            last_elapsed_days,
            self.config().preset(preset).maximum_interval,
        )
    }

    /// Absolute due-day window for a card last reviewed on `last_review`.
    ///
    /// With fuzz disabled the window is the single day at the rounded
    /// target interval.
    pub fn due_window(&self, target_interval: f64, last_review: i64, preset: PresetId) -> DayRange {
        let max_interval = self.config().preset(preset).maximum_interval;
        if !self.config().fuzz {
            let interval = (target_interval.round() as i64).clamp(1, max_interval.max(1));
            return DayRange::point(last_review + interval);
        }
        fuzzed_window(
            target_interval,
            last_review,
            self.today() - last_review,
            max_interval,
        )
    }

    /// Chooses the due day for one card inside its window.
    ///
    /// With load balancing enabled the draw is weighted by `load` and the
    /// weekday preferences; otherwise it is the card's deterministic fuzz
    /// day. Both draws are seeded by card id and `reps`, so the same card
    /// state against the same load always yields the same day.
    pub fn sample_single_day(&self, item: &Item, reps: u32, load: &DayLoad) -> Result<i64> {
        let range = item.feasible_range;
        if range.span() == 1 {
            return Ok(range.low());
        }
        if !self.config().load_balance {
            return Ok(deterministic_day(item.id, reps, range));
        }

        let timeline = &self.context.timeline;
        let preferences = &self.config().preferences;
        let candidates: Vec<i64> = range.days().collect();
        let loads = load.loads(item.preset_id, &candidates);
        let weights: Vec<f32> = candidates
            .iter()
            .map(|&d| preferences.weight_of(timeline, d))
            .collect();
        let exclusions: BTreeSet<i64> = candidates
            .iter()
            .copied()
            .filter(|&d| preferences.is_override(timeline, d))
            .collect();

        LoadBalancedSampler::new(item.last_review_day).sample(
            &candidates,
            &loads,
            &weights,
            &exclusions,
            &mut card_rng(item.id, reps),
        )
    }

    /// Spreads one sibling group.
    ///
    /// Redraws go through the load-weighted sampler when load balancing is
    /// enabled, measuring distance from the latest anchor.
    ///
    /// # Errors
    /// [`Error::Validation`](crate::Error::Validation) for duplicate ids or
    /// members from different notes.
    pub fn allocate_group(&self, members: &[GroupMember], load: &DayLoad) -> Result<GroupAllocation> {
        validate_group(members)?;
        let Some(first) = members.iter().find_map(GroupMember::item) else {
            return Ok(GroupAllocation {
                assignment: Assignment::new(),
                min_gap: None,
            });
        };

        let allocator = GapMaximizingAllocator::new();
        if !self.config().load_balance {
            return Ok(allocator.allocate(members, &mut UniformDrawer::unseeded()));
        }

        let anchor = members
            .iter()
            .filter_map(|m| match m {
                GroupMember::Anchor(day) => Some(*day),
                GroupMember::Card(_) => None,
            })
            .max()
            .unwrap_or(first.last_review_day);
        let mut drawer = LoadWeightedDrawer::new(
            anchor,
            load,
            first.preset_id,
            &self.config().preferences,
            &self.context.timeline,
            rand::rng(),
        );
        Ok(allocator.allocate(members, &mut drawer))
    }

    /// Redistributes many cards over `candidate_days` under a capacity plan.
    ///
    /// # Errors
    /// - [`Error::UnsortedCandidates`](crate::Error::UnsortedCandidates)
    /// - [`Error::Validation`](crate::Error::Validation) when an item's
    ///   window holds no candidate day
    pub fn allocate_bulk(
        &self,
        items: &[Item],
        candidate_days: &[i64],
        capacity: &CapacityPlan,
        existing: &[u32],
        strategy: PlacementStrategy,
        control: &mut BatchControl,
    ) -> Result<BulkAllocation> {
        check_candidates(candidate_days)?;
        validate_items(items, candidate_days)?;
        BulkCapacityAllocator::new(strategy, Self::priority(strategy)).allocate(
            items,
            candidate_days,
            capacity,
            existing,
            &self.priority_context(),
            control,
        )
    }

    /// Placement order for a strategy.
    ///
    /// Flattening serves the most overdue cards first; protected-window
    /// spreading serves the least stable cards first.
    pub fn priority(strategy: PlacementStrategy) -> RuleEngine {
        match strategy {
            PlacementStrategy::Chronological => RuleEngine::new()
                .with_rule(rules::OverdueRatio)
                .with_tie_breaker(rules::EarliestDue),
            PlacementStrategy::NearestOriginal { .. } => RuleEngine::new()
                .with_rule(rules::LowestStability)
                .with_tie_breaker(rules::EarliestReview)
                .with_tie_breaker(rules::EarliestDue),
        }
        .with_final_tie_breaker(TieBreaker::ById)
    }
}
