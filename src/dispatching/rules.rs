//! Built-in priority rules.
//!
//! # Categories
//!
//! - **Urgency**: OVERDUE (interval relative to elapsed time)
//! - **Memory**: STABILITY, R_HIGH, R_LOW
//! - **History**: REVIEW, DUE
//!
//! # Score Convention
//! All rules return lower scores for items that should be placed first.

use super::{PriorityContext, PriorityRule, RuleScore};
use crate::models::Item;

/// Guards the overdue ratio against cards reviewed today.
const ELAPSED_EPSILON: f64 = 1e-3;

/// Most overdue relative to interval first.
///
/// Score = `interval / (elapsed + ε)`. Cards whose elapsed time already
/// approaches or exceeds their interval come first.
#[derive(Debug, Clone, Copy)]
pub struct OverdueRatio;

impl PriorityRule for OverdueRatio {
    fn name(&self) -> &'static str {
        "OVERDUE"
    }

    fn evaluate(&self, item: &Item, context: &PriorityContext) -> RuleScore {
        let elapsed = item.elapsed_days(context.today).max(0) as f64;
        item.original_interval as f64 / (elapsed + ELAPSED_EPSILON)
    }

    fn description(&self) -> &'static str {
        "Interval over elapsed days, ascending"
    }
}

/// Least stable memory first.
#[derive(Debug, Clone, Copy)]
pub struct LowestStability;

impl PriorityRule for LowestStability {
    fn name(&self) -> &'static str {
        "STABILITY"
    }

    fn evaluate(&self, item: &Item, _context: &PriorityContext) -> RuleScore {
        item.stability
    }

    fn description(&self) -> &'static str {
        "Lowest stability"
    }
}

/// Oldest last review first.
#[derive(Debug, Clone, Copy)]
pub struct EarliestReview;

impl PriorityRule for EarliestReview {
    fn name(&self) -> &'static str {
        "REVIEW"
    }

    fn evaluate(&self, item: &Item, _context: &PriorityContext) -> RuleScore {
        item.last_review_day as f64
    }
}

/// Earliest original due day first.
#[derive(Debug, Clone, Copy)]
pub struct EarliestDue;

impl PriorityRule for EarliestDue {
    fn name(&self) -> &'static str {
        "DUE"
    }

    fn evaluate(&self, item: &Item, _context: &PriorityContext) -> RuleScore {
        item.original_due as f64
    }
}

/// Highest current retrievability first (safest to delay).
#[derive(Debug, Clone, Copy)]
pub struct HighestRetrievability;

impl PriorityRule for HighestRetrievability {
    fn name(&self) -> &'static str {
        "R_HIGH"
    }

    fn evaluate(&self, item: &Item, context: &PriorityContext) -> RuleScore {
        let elapsed = item.elapsed_days(context.today).max(0) as f64;
        -context.memory_model.retrievability(elapsed, item.stability)
    }

    fn description(&self) -> &'static str {
        "Highest retrievability today"
    }
}

/// Lowest current retrievability first (most in need of review).
#[derive(Debug, Clone, Copy)]
pub struct LowestRetrievability;

impl PriorityRule for LowestRetrievability {
    fn name(&self) -> &'static str {
        "R_LOW"
    }

    fn evaluate(&self, item: &Item, context: &PriorityContext) -> RuleScore {
        let elapsed = item.elapsed_days(context.today).max(0) as f64;
        context.memory_model.retrievability(elapsed, item.stability)
    }

    fn description(&self) -> &'static str {
        "Lowest retrievability today"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardId;

    fn item(due: i64, last_review: i64, stability: f64) -> Item {
        Item::new(CardId(1), due)
            .with_last_review(last_review)
            .with_stability(stability)
    }

    #[test]
    fn test_overdue_ratio() {
        let ctx = PriorityContext::at_day(20);
        // interval 10, elapsed 10 → ~1.0
        let score = OverdueRatio.evaluate(&item(20, 10, 5.0), &ctx);
        assert!((score - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_overdue_ratio_reviewed_today_is_finite() {
        let ctx = PriorityContext::at_day(10);
        let score = OverdueRatio.evaluate(&item(20, 10, 5.0), &ctx);
        assert!(score.is_finite());
        assert!(score > 1000.0);
    }

    #[test]
    fn test_stability_review_due() {
        let it = item(30, 12, 4.5);
        let ctx = PriorityContext::at_day(0);
        assert_eq!(LowestStability.evaluate(&it, &ctx), 4.5);
        assert_eq!(EarliestReview.evaluate(&it, &ctx), 12.0);
        assert_eq!(EarliestDue.evaluate(&it, &ctx), 30.0);
    }

    #[test]
    fn test_retrievability_rules_are_mirrored() {
        let it = item(30, 10, 20.0);
        let ctx = PriorityContext::at_day(30);
        let low = LowestRetrievability.evaluate(&it, &ctx);
        let high = HighestRetrievability.evaluate(&it, &ctx);
        assert!((low + high).abs() < 1e-12);
        assert!((low - 0.9).abs() < 1e-9); // elapsed == stability
    }
}
