//! Due-day allocators.
//!
//! - [`range`]: fuzz-tolerant feasible windows
//! - [`sampler`]: single-card load-weighted day choice
//! - [`gap`]: sibling spreading by minimum-gap maximization
//! - [`bulk`]: capacity-honoring redistribution of many cards
//!
//! Every allocator returns days inside each item's feasible window. Only
//! the bulk allocator may exceed a capacity target, and only on its
//! overflow path.

pub mod bulk;
pub mod gap;
pub mod range;
pub mod sampler;

pub use bulk::{
    check_candidates, BulkAllocation, BulkCapacityAllocator, CapacityPlan, PlacementStrategy,
};
pub use gap::{
    DayDrawer, GapMaximizingAllocator, GroupAllocation, LoadWeightedDrawer, UniformDrawer,
    DEFAULT_MAX_ATTEMPTS,
};
pub use range::{feasible_range, fuzz_delta, fuzzed_window, FUZZ_THRESHOLD};
pub use sampler::{card_rng, deterministic_day, fuzz_seed, LoadBalancedSampler};
