//! Rule engine for multi-criteria item ordering.
//!
//! Applies rules in sequence: the next rule is consulted only when the
//! previous ones tie. Scores are snapped to a fixed grid before comparing,
//! so near-equal scores tie consistently and NaN sorts last.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;
use std::sync::Arc;

use super::{PriorityContext, PriorityRule, RuleScore};
use crate::models::Item;

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Default)]
pub enum TieBreaker {
    /// Keep input order (stable sort).
    #[default]
    InputOrder,
    /// Deterministic by card id.
    ById,
}

/// A composable rule engine for item prioritization.
///
/// # Example
/// ```
/// use u_due::dispatching::{PriorityContext, RuleEngine};
/// use u_due::dispatching::rules;
/// use u_due::models::{CardId, Item};
///
/// let items = vec![
///     Item::new(CardId(1), 30).with_last_review(10),
///     Item::new(CardId(2), 12).with_last_review(10),
/// ];
/// let engine = RuleEngine::new().with_rule(rules::OverdueRatio);
/// let order = engine.sort_indices(&items, &PriorityContext::at_day(11));
/// assert_eq!(order, vec![1, 0]);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn PriorityRule>>,
    tie_breaker: TieBreaker,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            tie_breaker: TieBreaker::InputOrder,
        }
    }

    /// Adds a primary rule.
    pub fn with_rule<R: PriorityRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Adds a tie-breaking rule, consulted after all earlier rules tie.
    pub fn with_tie_breaker<R: PriorityRule + 'static>(self, rule: R) -> Self {
        self.with_rule(rule)
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Sorts items by priority (highest priority first).
    ///
    /// Returns indices into the original slice.
    pub fn sort_indices(&self, items: &[Item], context: &PriorityContext) -> Vec<usize> {
        if items.is_empty() {
            return Vec::new();
        }
        // Scores are computed once per item; rules may be costly.
        let scores: Vec<Vec<RuleScore>> = items
            .iter()
            .map(|item| self.evaluate(item, context))
            .collect();

        let mut indices: Vec<usize> = (0..items.len()).collect();
        indices.sort_by(|&a, &b| self.compare(&scores[a], &scores[b], &items[a], &items[b]));
        indices
    }

    /// Evaluates a single item and returns scores from each rule.
    pub fn evaluate(&self, item: &Item, context: &PriorityContext) -> Vec<RuleScore> {
        self.rules
            .iter()
            .map(|rule| rule.evaluate(item, context))
            .collect()
    }

    fn compare(&self, a: &[RuleScore], b: &[RuleScore], item_a: &Item, item_b: &Item) -> Ordering {
        for (score_a, score_b) in a.iter().zip(b) {
            let ord = snap(*score_a).total_cmp(&snap(*score_b));
            if ord != Ordering::Equal {
                return ord;
            }
        }

        match &self.tie_breaker {
            TieBreaker::InputOrder => Ordering::Equal,
            TieBreaker::ById => item_a.id.cmp(&item_b.id),
        }
    }
}

/// Score grid step; scores closer than this may tie.
const SCORE_RESOLUTION: f64 = 1e-9;

/// Rounds a score onto the grid. NaN maps to positive NaN, which
/// `total_cmp` places after every number.
fn snap(score: RuleScore) -> f64 {
    if score.is_nan() {
        f64::NAN.abs()
    } else {
        (score / SCORE_RESOLUTION).round()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}
