//! Busy periods and scheduled breaks.
//!
//! Cards due inside a protected window are moved into an adjacent spread
//! window: before a busy period, after a break. The spread window gets an
//! even share of its own existing load plus the moved cards, and each
//! moved card takes the open day closest to its original due day relative
//! to its interval.

use std::collections::BTreeMap;

use super::{review_cards, Collection, OperationReport, UpdateBatch};
use crate::allocation::{CapacityPlan, PlacementStrategy};
use crate::error::{Error, Result};
use crate::models::{Card, DayLoad, DayRange, Item, PresetId};
use crate::scheduler::Engine;
use crate::worker::BatchControl;

/// Days to keep free of reviews and where their cards go instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectedWindow {
    /// Days that should hold no reviews.
    pub protected: DayRange,
    /// Days that absorb the moved cards.
    pub spread: DayRange,
}

impl ProtectedWindow {
    /// A busy period: cards are pulled into the `lead_days` before it.
    pub fn busy(protected: DayRange, lead_days: i64) -> Result<Self> {
        let lead = Self::check_span(lead_days)?;
        Ok(Self {
            protected,
            spread: DayRange::new(protected.low() - lead, protected.low() - 1)?,
        })
    }

    /// A break: cards are pushed into the `trail_days` after it.
    pub fn scheduled_break(protected: DayRange, trail_days: i64) -> Result<Self> {
        let trail = Self::check_span(trail_days)?;
        Ok(Self {
            protected,
            spread: DayRange::new(protected.high() + 1, protected.high() + trail)?,
        })
    }

    fn check_span(days: i64) -> Result<i64> {
        if days < 1 {
            return Err(Error::InvalidConfig(format!(
                "spread window of {days} days"
            )));
        }
        Ok(days)
    }

    /// Spread window with past days removed.
    pub fn usable_spread(&self, today: i64) -> Result<DayRange> {
        DayRange::new(self.spread.low().max(today), self.spread.high()).map_err(|_| {
            Error::InvalidConfig(format!(
                "spread window [{}, {}] lies before today",
                self.spread.low(),
                self.spread.high()
            ))
        })
    }
}

/// Moves cards out of a busy period or scheduled break.
#[tracing::instrument(skip_all, fields(
    today = engine.today(),
    low = window.protected.low(),
    high = window.protected.high()
))]
pub fn spread_protected_window<C: Collection + ?Sized>(
    engine: &Engine,
    collection: &mut C,
    window: ProtectedWindow,
    control: &mut BatchControl,
) -> Result<OperationReport> {
    let today = engine.today();
    let spread = window.usable_spread(today)?;
    let cards = review_cards(collection)?;
    let load = DayLoad::from_dues(cards.iter().map(|c| (c.preset_id, c.due)));

    let mut presets: BTreeMap<PresetId, Vec<&Card>> = BTreeMap::new();
    for card in cards
        .iter()
        .filter(|c| c.due >= today && window.protected.contains(c.due))
    {
        presets.entry(card.preset_id).or_default().push(card);
    }

    let days: Vec<i64> = spread.days().collect();
    let mut batch = UpdateBatch::begin(collection, "spread protected window", engine.config().batch_cadence)?;
    for (&preset, preset_cards) in &presets {
        batch.report.processed += preset_cards.len();

        let mut movers: Vec<Item> = Vec::new();
        let mut mover_cards: BTreeMap<_, &Card> = BTreeMap::new();
        for &card in preset_cards {
            let Some(item) = card.to_item() else {
                batch.report.skipped += 1;
                continue;
            };
            // never on or before the last review
            let low = spread.low().max(item.last_review_day + 1);
            match DayRange::new(low, spread.high()) {
                Ok(range) => {
                    mover_cards.insert(item.id, card);
                    movers.push(item.with_range(range));
                }
                Err(_) => batch.report.skipped += 1,
            }
        }
        if movers.is_empty() {
            continue;
        }

        let existing = load.loads(preset, &days);
        let total = existing.iter().sum::<u32>() + movers.len() as u32;
        let allocation = engine.allocate_bulk(
            &movers,
            &days,
            &CapacityPlan::even_spread(days.len(), total),
            &existing,
            PlacementStrategy::NearestOriginal {
                cutoff: spread.low(),
            },
            control,
        )?;
        for (id, day) in allocation.assignment.iter() {
            if let Some(card) = mover_cards.get(&id) {
                batch.update(card, day, day - card.last_review_day())?;
            }
        }
        tracing::debug!(
            preset = preset.0,
            moved = allocation.assignment.len(),
            overflow = allocation.overflow.len(),
            "protected window spread"
        );
        if allocation.cancelled {
            break;
        }
    }

    let report = batch.finish(control.was_cancelled())?;
    tracing::info!(
        changed = report.changed,
        skipped = report.skipped,
        "protected window cleared"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Context, SchedulerConfig};
    use crate::models::{CardId, Timeline};
    use crate::operations::MemoryCollection;
    use chrono::NaiveDate;

    fn engine() -> Engine {
        let timeline = Timeline::new(0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        Engine::new(Context::new(SchedulerConfig::default(), timeline))
    }

    fn counts(col: &MemoryCollection) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for (_, due) in col.dues() {
            *counts.entry(due).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_window_constructors() {
        let days = DayRange::new(10, 14).unwrap();
        let busy = ProtectedWindow::busy(days, 3).unwrap();
        assert_eq!(busy.spread, DayRange::new(7, 9).unwrap());
        let brk = ProtectedWindow::scheduled_break(days, 5).unwrap();
        assert_eq!(brk.spread, DayRange::new(15, 19).unwrap());
        assert!(ProtectedWindow::busy(days, 0).is_err());
        assert!(busy.usable_spread(10).is_err());
        assert_eq!(busy.usable_spread(8).unwrap(), DayRange::new(8, 9).unwrap());
    }

    #[test]
    fn test_break_spreads_evenly_after() {
        // two cards due on each break day
        let cards: Vec<Card> = (0..10)
            .map(|i| Card::review(i + 1, 10 + i / 2, 20).with_memory(5.0 + i as f64, 5.0))
            .collect();
        let mut col = MemoryCollection::with_cards(cards);
        let window = ProtectedWindow::scheduled_break(DayRange::new(10, 14).unwrap(), 5).unwrap();
        let report = spread_protected_window(&engine(), &mut col, window, &mut BatchControl::new()).unwrap();

        assert_eq!(report.changed, 10);
        let c = counts(&col);
        for day in 10..=14 {
            assert_eq!(c.get(&day), None);
        }
        for day in 15..=19 {
            assert_eq!(c[&day], 2);
        }
    }

    #[test]
    fn test_busy_pulls_cards_forward() {
        let mut cards: Vec<Card> = (1..=6)
            .map(|id| Card::review(id, 20 + id % 3, 15).with_memory(10.0, 5.0))
            .collect();
        // already on a spread day
        cards.push(Card::review(50, 17, 15).with_memory(10.0, 5.0));
        let mut col = MemoryCollection::with_cards(cards);
        let window = ProtectedWindow::busy(DayRange::new(20, 24).unwrap(), 4).unwrap();
        spread_protected_window(&engine(), &mut col, window, &mut BatchControl::new()).unwrap();

        let c = counts(&col);
        assert_eq!(c.range(20..=24).count(), 0);
        assert_eq!(c.values().sum::<usize>(), 7);
        // 7 cards over 4 days → at most 2 per day
        assert!(c.range(16..=19).all(|(_, &n)| n <= 2));
        for id in 1..=6 {
            let card = col.card(CardId(id)).unwrap();
            assert!((16..=19).contains(&card.due));
            assert_eq!(card.interval, card.due - card.last_review_day());
        }
    }

    #[test]
    fn test_cards_reviewed_inside_spread_are_skipped() {
        // last review on day 19 leaves no spread day after it
        let mut col = MemoryCollection::with_cards([Card::review(1, 21, 2).with_memory(3.0, 5.0)]);
        let window = ProtectedWindow::busy(DayRange::new(20, 24).unwrap(), 4).unwrap();
        let report = spread_protected_window(&engine(), &mut col, window, &mut BatchControl::new()).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(col.card(CardId(1)).unwrap().due, 21);
    }
}
