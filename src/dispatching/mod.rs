//! Priority rules and rule engine for bulk redistribution.
//!
//! Bulk operations place cards one at a time in priority order; the
//! order decides which cards keep the scarce early capacity. Rules are
//! composable: a primary rule followed by tie-breakers.
//!
//! # Usage
//!
//! ```
//! use u_due::dispatching::{RuleEngine, PriorityContext};
//! use u_due::dispatching::rules;
//!
//! // busy-period spreading: least stable first, then oldest review, then earliest due
//! let engine = RuleEngine::new()
//!     .with_rule(rules::LowestStability)
//!     .with_tie_breaker(rules::EarliestReview)
//!     .with_tie_breaker(rules::EarliestDue);
//!
//! let context = PriorityContext::at_day(0);
//! assert!(engine.sort_indices(&[], &context).is_empty());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
pub mod rules;

pub use context::PriorityContext;
pub use engine::{RuleEngine, TieBreaker};

use crate::models::Item;
use std::fmt::Debug;

/// Score returned by a priority rule.
///
/// Lower scores = higher priority (placed first).
pub type RuleScore = f64;

/// A rule that scores how urgently an item should be placed.
///
/// # Score Convention
/// **Lower score = higher priority.**
pub trait PriorityRule: Send + Sync + Debug {
    /// Rule name (e.g., "OVERDUE", "STABILITY").
    fn name(&self) -> &'static str;

    /// Scores an item given the current context.
    fn evaluate(&self, item: &Item, context: &PriorityContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
