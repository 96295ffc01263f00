//! Daily-limit flattening.
//!
//! # Algorithm
//!
//! Per preset, over the days `today..=today + horizon`, with the preset's
//! `daily_limit` taking precedence over `limit`:
//! 1. On every day holding more than the limit, move the excess,
//!    lowest priority first (least overdue relative to their interval).
//!    Cards without memory state stay put but count against the limit.
//! 2. The rest may move to any later day up to `last_review + max_ivl`
//!    (and the horizon end).
//! 3. Capacity per day is `limit` minus the cards that stay; the
//!    chronological bulk allocator fills the earliest open days first.

use std::collections::BTreeMap;

use super::{review_cards, Collection, OperationReport, UpdateBatch};
use crate::allocation::{CapacityPlan, PlacementStrategy};
use crate::config::MAX_HORIZON_DAYS;
use crate::error::{Error, Result};
use crate::models::{Card, DayRange, Item, PresetId};
use crate::scheduler::Engine;
use crate::worker::BatchControl;

/// Moves cards off days holding more than `limit` reviews.
///
/// # Errors
/// [`Error::InvalidConfig`] for a zero limit or a horizon outside
/// `1..=MAX_HORIZON_DAYS`.
#[tracing::instrument(skip_all, fields(today = engine.today(), limit = limit, horizon = horizon))]
pub fn flatten<C: Collection + ?Sized>(
    engine: &Engine,
    collection: &mut C,
    limit: u32,
    horizon: i64,
    control: &mut BatchControl,
) -> Result<OperationReport> {
    if limit == 0 {
        return Err(Error::InvalidConfig("flatten limit must be positive".into()));
    }
    if !(1..=MAX_HORIZON_DAYS).contains(&horizon) {
        return Err(Error::InvalidConfig(format!(
            "flatten horizon {horizon} outside [1, {MAX_HORIZON_DAYS}]"
        )));
    }

    let today = engine.today();
    let end = today + horizon;
    let cards: Vec<Card> = review_cards(collection)?
        .into_iter()
        .filter(|c| (today..=end).contains(&c.due))
        .collect();

    let mut presets: BTreeMap<PresetId, Vec<&Card>> = BTreeMap::new();
    for card in &cards {
        presets.entry(card.preset_id).or_default().push(card);
    }

    let days: Vec<i64> = (today..=end).collect();
    let priority = Engine::priority(PlacementStrategy::Chronological);
    let context = engine.priority_context();

    let mut batch = UpdateBatch::begin(collection, "flatten", engine.config().batch_cadence)?;
    for (preset, preset_cards) in &presets {
        batch.report.processed += preset_cards.len();
        let preset_config = engine.config().preset(*preset);
        let max_interval = preset_config.maximum_interval;
        let limit = preset_config.daily_limit.unwrap_or(limit);

        let mut existing = vec![0u32; days.len()];
        let mut by_day: BTreeMap<i64, Vec<(Item, &Card)>> = BTreeMap::new();
        for &card in preset_cards {
            existing[(card.due - today) as usize] += 1;
            match card.to_item() {
                Some(item) => by_day.entry(card.due).or_default().push((item, card)),
                None => batch.report.skipped += 1,
            }
        }

        let mut movers: Vec<Item> = Vec::new();
        let mut mover_cards: BTreeMap<_, &Card> = BTreeMap::new();
        for (&day, entries) in &by_day {
            let slot = (day - today) as usize;
            let excess = existing[slot].saturating_sub(limit) as usize;
            if excess == 0 {
                continue;
            }
            let items: Vec<Item> = entries.iter().map(|(item, _)| item.clone()).collect();
            let order = priority.sort_indices(&items, &context);
            let keep = entries.len().saturating_sub(excess);
            for &i in &order[keep..] {
                let (item, card) = &entries[i];
                let high = (item.last_review_day + max_interval).min(end).max(day);
                movers.push(item.clone().with_range(DayRange::new(day, high)?));
                mover_cards.insert(item.id, *card);
                existing[slot] -= 1;
            }
        }
        if movers.is_empty() {
            continue;
        }

        let allocation = engine.allocate_bulk(
            &movers,
            &days,
            &CapacityPlan::Uniform(limit),
            &existing,
            PlacementStrategy::Chronological,
            control,
        )?;
        for (id, day) in allocation.assignment.iter() {
            if let Some(card) = mover_cards.get(&id) {
                batch.update(card, day, day - card.last_review_day())?;
            }
        }
        tracing::debug!(
            preset = preset.0,
            moved = movers.len(),
            overflow = allocation.overflow.len(),
            "preset flattened"
        );
        if allocation.cancelled {
            break;
        }
    }

    let report = batch.finish(control.was_cancelled())?;
    tracing::info!(
        changed = report.changed,
        skipped = report.skipped,
        "flatten finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Context, SchedulerConfig};
    use crate::models::{CardId, DayLoad, Timeline};
    use crate::operations::MemoryCollection;
    use crate::scheduler::LoadKpi;
    use chrono::NaiveDate;

    fn engine() -> Engine {
        let timeline = Timeline::new(0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        Engine::new(Context::new(SchedulerConfig::default(), timeline))
    }

    fn load_of(col: &MemoryCollection) -> DayLoad {
        DayLoad::from_dues(col.cards().unwrap().iter().map(|c| (c.preset_id, c.due)))
    }

    #[test]
    fn test_eight_cards_limit_five_moves_three() {
        let cards: Vec<Card> = (1..=8)
            .map(|id| Card::review(id, 10, 10).with_memory(10.0, 5.0))
            .collect();
        let mut col = MemoryCollection::with_cards(cards);
        let report = flatten(&engine(), &mut col, 5, 30, &mut BatchControl::new()).unwrap();

        assert_eq!(report.changed, 3);
        let load = load_of(&col);
        assert_eq!(load.get(PresetId::default(), 10), 5);
        assert_eq!(load.get(PresetId::default(), 11), 3);
        // equal priority: the lowest ids stay
        for id in 1..=5 {
            assert_eq!(col.card(CardId(id)).unwrap().due, 10);
        }
        assert_eq!(col.card(CardId(6)).unwrap().interval, 11);
    }

    #[test]
    fn test_flatten_respects_limit_everywhere() {
        let mut cards: Vec<Card> = (1..=12)
            .map(|id| Card::review(id, 3, 10).with_memory(10.0, 5.0))
            .collect();
        cards.extend((13..=16).map(|id| Card::review(id, 4, 10).with_memory(10.0, 5.0)));
        let mut col = MemoryCollection::with_cards(cards);
        flatten(&engine(), &mut col, 4, 20, &mut BatchControl::new()).unwrap();

        let kpi = LoadKpi::calculate(&load_of(&col), PresetId::default(), 0, 20, Some(4));
        assert_eq!(kpi.total, 16);
        assert_eq!(kpi.days_over_limit, 0);
        assert_eq!(kpi.max_load, 4);
    }

    #[test]
    fn test_flatten_never_moves_earlier() {
        let mut cards: Vec<Card> = (1..=6)
            .map(|id| Card::review(id, 8, 10).with_memory(10.0, 5.0))
            .collect();
        cards.push(Card::review(7, 2, 10).with_memory(10.0, 5.0));
        let mut col = MemoryCollection::with_cards(cards);
        flatten(&engine(), &mut col, 2, 30, &mut BatchControl::new()).unwrap();

        for id in 1..=6 {
            assert!(col.card(CardId(id)).unwrap().due >= 8);
        }
        assert_eq!(col.card(CardId(7)).unwrap().due, 2);
    }

    #[test]
    fn test_flatten_leaves_unknown_memory() {
        let mut cards: Vec<Card> = (1..=4)
            .map(|id| Card::review(id, 5, 10).with_memory(10.0, 5.0))
            .collect();
        cards.push(Card::review(5, 5, 10));
        let mut col = MemoryCollection::with_cards(cards);
        let report = flatten(&engine(), &mut col, 2, 30, &mut BatchControl::new()).unwrap();
        // five cards on day 5, one immovable: three move
        assert_eq!(report.skipped, 1);
        assert_eq!(report.changed, 3);
        assert_eq!(col.card(CardId(5)).unwrap().due, 5);
    }

    #[test]
    fn test_flatten_skips_unusable_stability() {
        let mut cards: Vec<Card> = (1..=5)
            .map(|id| Card::review(id, 5, 10).with_memory(10.0, 5.0))
            .collect();
        cards.push(Card::review(6, 5, 10).with_memory(f64::NAN, 5.0));
        let mut col = MemoryCollection::with_cards(cards);
        let report = flatten(&engine(), &mut col, 2, 30, &mut BatchControl::new()).unwrap();

        // six on day 5, one pinned: four move
        assert_eq!(report.skipped, 1);
        assert_eq!(report.changed, 4);
        assert_eq!(col.card(CardId(6)).unwrap().due, 5);
        assert_eq!(load_of(&col).get(PresetId::default(), 5), 2);
        assert_eq!(col.transactions().len(), 1);
    }

    #[test]
    fn test_preset_daily_limit_overrides() {
        let config = SchedulerConfig::new().with_preset(
            PresetId(2),
            crate::config::PresetConfig::default().with_daily_limit(2),
        );
        let timeline = Timeline::new(0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let e = Engine::new(Context::new(config, timeline));
        let mut cards: Vec<Card> = (1..=4)
            .map(|id| Card::review(id, 6, 10).with_memory(10.0, 5.0))
            .collect();
        cards.extend((5..=8).map(|id| {
            Card::review(id, 6, 10)
                .with_memory(10.0, 5.0)
                .with_preset(PresetId(2))
        }));
        let mut col = MemoryCollection::with_cards(cards);
        let report = flatten(&e, &mut col, 4, 30, &mut BatchControl::new()).unwrap();

        assert_eq!(report.changed, 2);
        let load = load_of(&col);
        assert_eq!(load.get(PresetId::default(), 6), 4);
        assert_eq!(load.get(PresetId(2), 6), 2);
        assert_eq!(load.get(PresetId(2), 7), 2);
    }

    #[test]
    fn test_flatten_rejects_bad_arguments() {
        let mut col = MemoryCollection::new();
        assert!(matches!(
            flatten(&engine(), &mut col, 0, 30, &mut BatchControl::new()),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            flatten(&engine(), &mut col, 5, 0, &mut BatchControl::new()),
            Err(Error::InvalidConfig(_))
        ));
    }
}
