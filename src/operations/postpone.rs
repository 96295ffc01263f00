//! Postponing due cards and advancing future ones.
//!
//! # Postpone
//!
//! Among cards due today or overdue, the `count` with the highest current
//! retrievability (safest to delay) get
//!
//! ```text
//! new_ivl = clamp(ceil(ivl · (1.05 + 0.05·u)) + delay, 1, max_ivl)
//! delay   = elapsed − ivl
//! ```
//!
//! with `u ∈ [0, 1)` drawn from the card's deterministic RNG. Unless the
//! maximum interval cuts it short, the new due day is after today.
//!
//! # Advance
//!
//! Among cards due after today, the `count` with the lowest current
//! retrievability become due today with `interval = elapsed`.

use rand::Rng;

use super::{review_cards, Collection, OperationReport, UpdateBatch};
use crate::allocation::card_rng;
use crate::dispatching::{rules, RuleEngine, TieBreaker};
use crate::error::Result;
use crate::models::{Card, Item};
use crate::scheduler::Engine;
use crate::worker::BatchControl;

/// Postpones up to `count` due cards.
#[tracing::instrument(skip_all, fields(today = engine.today(), count = count))]
pub fn postpone<C: Collection + ?Sized>(
    engine: &Engine,
    collection: &mut C,
    count: usize,
    control: &mut BatchControl,
) -> Result<OperationReport> {
    let today = engine.today();
    let priority = RuleEngine::new()
        .with_rule(rules::HighestRetrievability)
        .with_tie_breaker(rules::EarliestDue)
        .with_final_tie_breaker(TieBreaker::ById);

    run(engine, collection, "postpone", count, priority, control, |card| card.due <= today, |card| {
        let interval = card.interval.max(1);
        let delay = card.elapsed_days(today) - interval;
        let u: f64 = card_rng(card.id, card.reps).random();
        let stretched = (interval as f64 * (1.05 + 0.05 * u)).ceil() as i64;
        let max_interval = engine.config().preset(card.preset_id).maximum_interval;
        let new_interval = (stretched + delay).clamp(1, max_interval.max(1));
        Some((card.last_review_day() + new_interval, new_interval))
    })
}

/// Brings up to `count` future cards forward to today.
#[tracing::instrument(skip_all, fields(today = engine.today(), count = count))]
pub fn advance<C: Collection + ?Sized>(
    engine: &Engine,
    collection: &mut C,
    count: usize,
    control: &mut BatchControl,
) -> Result<OperationReport> {
    let today = engine.today();
    let priority = RuleEngine::new()
        .with_rule(rules::LowestRetrievability)
        .with_tie_breaker(rules::EarliestDue)
        .with_final_tie_breaker(TieBreaker::ById);

    run(engine, collection, "advance", count, priority, control, |card| card.due > today, |card| {
        let elapsed = card.elapsed_days(today);
        // reviewed today: nothing to advance into
        (elapsed >= 1).then_some((today, elapsed))
    })
}

/// Selects eligible cards, orders them, and applies `reschedule` to the
/// first `count`. `reschedule` returning `None` skips the card.
#[allow(clippy::too_many_arguments)]
fn run<C, E, F>(
    engine: &Engine,
    collection: &mut C,
    label: &str,
    count: usize,
    priority: RuleEngine,
    control: &mut BatchControl,
    eligible: E,
    reschedule: F,
) -> Result<OperationReport>
where
    C: Collection + ?Sized,
    E: Fn(&Card) -> bool,
    F: Fn(&Card) -> Option<(i64, i64)>,
{
    let cards: Vec<Card> = review_cards(collection)?
        .into_iter()
        .filter(|c| eligible(c))
        .collect();
    let without_memory = cards.iter().filter(|c| !c.has_usable_memory()).count();
    let (items, with_memory): (Vec<Item>, Vec<&Card>) = cards
        .iter()
        .filter_map(|c| c.to_item().map(|item| (item, c)))
        .unzip();

    let order = priority.sort_indices(&items, &engine.priority_context());
    let selected: Vec<&Card> = order.into_iter().take(count).map(|i| with_memory[i]).collect();

    let mut batch = UpdateBatch::begin(collection, label, engine.config().batch_cadence)?;
    batch.report.skipped = without_memory;
    let total = selected.len();
    for (done, card) in selected.into_iter().enumerate() {
        batch.report.processed += 1;
        match reschedule(card) {
            Some((due, interval)) => batch.update(card, due, interval)?,
            None => batch.report.skipped += 1,
        }
        if !control.checkpoint(done + 1, total) {
            break;
        }
    }

    let report = batch.finish(control.was_cancelled())?;
    tracing::info!(
        operation = label,
        changed = report.changed,
        skipped = report.skipped,
        "operation finished"
    );
    Ok(report)
}
