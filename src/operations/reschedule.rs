//! Full reschedule from memory state.
//!
//! # Algorithm
//!
//! For every review card with memory state:
//! 1. Target interval = interval reaching the preset's desired retention.
//! 2. Window = fuzz window around `last_review + target` (a single day
//!    with fuzz disabled or for targets under 2.5 days).
//! 3. Due day = load-weighted draw from the window, or the card's
//!    deterministic fuzz day when load balancing is off.
//!
//! The load table follows every move, so later cards see the load left
//! by earlier ones.

use super::{review_cards, Collection, OperationReport, UpdateBatch};
use crate::error::Result;
use crate::models::DayLoad;
use crate::scheduler::Engine;
use crate::worker::BatchControl;

/// Reschedules every review card from its memory state.
#[tracing::instrument(skip_all, fields(today = engine.today()))]
pub fn reschedule<C: Collection + ?Sized>(
    engine: &Engine,
    collection: &mut C,
    control: &mut BatchControl,
) -> Result<OperationReport> {
    let cards = review_cards(collection)?;
    let mut load = DayLoad::from_dues(cards.iter().map(|c| (c.preset_id, c.due)));
    let mut batch = UpdateBatch::begin(collection, "reschedule", engine.config().batch_cadence)?;

    let total = cards.len();
    for (done, card) in cards.iter().enumerate() {
        batch.report.processed += 1;
        match card.to_item() {
            None => batch.report.skipped += 1,
            Some(item) => {
                let target = engine.target_interval(item.stability, item.preset_id);
                let window = engine.due_window(target, item.last_review_day, item.preset_id);
                let item = item.with_range(window);
                let due = engine.sample_single_day(&item, card.reps, &load)?;
                load.relocate(card.preset_id, card.due, due);
                batch.update(card, due, due - item.last_review_day)?;
            }
        }
        if !control.checkpoint(done + 1, total) {
            break;
        }
    }

    let report = batch.finish(control.was_cancelled())?;
    tracing::info!(
        processed = report.processed,
        changed = report.changed,
        skipped = report.skipped,
        "reschedule finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Context, SchedulerConfig};
    use crate::models::{Card, CardId, Timeline};
    use crate::operations::MemoryCollection;
    use crate::scheduler::LoadKpi;
    use crate::worker::CancellationToken;
    use chrono::NaiveDate;

    fn engine(config: SchedulerConfig, today: i64) -> Engine {
        let timeline = Timeline::new(today, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        Engine::new(Context::new(config, timeline))
    }

    #[test]
    fn test_reschedule_without_fuzz_hits_target() {
        let e = engine(SchedulerConfig::new().with_fuzz(false), 100);
        // stability 30 at retention 0.9 → interval 30
        let mut col = MemoryCollection::with_cards([Card::review(1, 105, 10).with_memory(30.0, 5.0)]);
        let report = reschedule(&e, &mut col, &mut BatchControl::new()).unwrap();

        let card = col.card(CardId(1)).unwrap();
        assert_eq!(card.due, 95 + 30);
        assert_eq!(card.interval, 30);
        assert_eq!(report.changed, 1);
        assert_eq!(col.transactions(), ["reschedule".to_string()]);
    }

    #[test]
    fn test_reschedule_stays_in_window_and_skips_unknown_memory() {
        let e = engine(SchedulerConfig::default(), 100);
        let mut cards: Vec<Card> = (1..=20)
            .map(|id| Card::review(id, 100 + id, 20).with_memory(30.0, 5.0))
            .collect();
        cards.push(Card::review(99, 110, 10));
        let mut col = MemoryCollection::with_cards(cards.clone());

        let report = reschedule(&e, &mut col, &mut BatchControl::new()).unwrap();
        assert_eq!(report.processed, 21);
        assert_eq!(report.skipped, 1);
        assert_eq!(col.card(CardId(99)).unwrap().due, 110);

        for card in cards.iter().filter(|c| c.memory.is_some()) {
            let after = col.card(card.id).unwrap();
            let ivl = after.due - card.last_review_day();
            assert_eq!(after.interval, ivl);
            // target 30; window offsets (27, 33)
            assert!((27..=33).contains(&ivl), "interval {ivl}");
        }
    }

    #[test]
    fn test_reschedule_spreads_load() {
        let e = engine(SchedulerConfig::default(), 100);
        let cards: Vec<Card> = (1..=60)
            .map(|id| Card::review(id, 110, 10).with_memory(40.0, 5.0))
            .collect();
        let mut col = MemoryCollection::with_cards(cards);
        reschedule(&e, &mut col, &mut BatchControl::new()).unwrap();

        let load = DayLoad::from_dues(col.cards().unwrap().iter().map(|c| (c.preset_id, c.due)));
        let kpi = LoadKpi::calculate(&load, Default::default(), 100, 200, None);
        assert_eq!(kpi.total, 60);
        // target 40 → nine-day window; 60 cards never pile up on one day
        assert!(kpi.max_load < 20, "max load {}", kpi.max_load);
    }

    #[test]
    fn test_reschedule_deterministic_without_load_balance() {
        let config = SchedulerConfig::new().with_load_balance(false);
        let cards: Vec<Card> = (1..=10)
            .map(|id| Card::review(id, 110, 10).with_memory(25.0, 5.0).with_reps(3))
            .collect();

        let mut a = MemoryCollection::with_cards(cards.clone());
        let mut b = MemoryCollection::with_cards(cards);
        reschedule(&engine(config.clone(), 100), &mut a, &mut BatchControl::new()).unwrap();
        reschedule(&engine(config, 100), &mut b, &mut BatchControl::new()).unwrap();
        assert!(a.dues().eq(b.dues()));
    }

    #[test]
    fn test_reschedule_cancelled_keeps_written_chunks() {
        let mut config = SchedulerConfig::new().with_fuzz(false);
        config.batch_cadence = 2;
        let e = engine(config, 100);
        let cards: Vec<Card> = (1..=10)
            .map(|id| Card::review(id, 105, 10).with_memory(30.0, 5.0))
            .collect();
        let mut col = MemoryCollection::with_cards(cards);

        let token = CancellationToken::new();
        token.cancel();
        let mut control = BatchControl::new().with_token(token).with_cadence(4);
        let report = reschedule(&e, &mut col, &mut control).unwrap();

        assert!(report.cancelled);
        assert_eq!(report.processed, 4);
        assert_eq!(report.changed, 4);
        assert_eq!(col.dues().filter(|&(_, due)| due == 125).count(), 4);
        assert_eq!(col.transactions().len(), 1);
    }
}
