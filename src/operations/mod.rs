//! Scheduling operations over a card collection.
//!
//! Each operation reads the collection once, rebuilds the day-load table,
//! runs one of the allocators through the [`Engine`], and writes every
//! change inside a single transaction. Updates are flushed in chunks of
//! `batch_cadence` cards; the [`BatchControl`] is consulted at the same
//! cadence so a cancelled batch keeps the chunks it already wrote.
//!
//! | Operation | Allocator |
//! |-----------|-----------|
//! | [`reschedule`] | single-day sampler |
//! | [`postpone`], [`advance`] | retrievability ordering |
//! | [`disperse_siblings`] | gap maximizer |
//! | [`flatten`] | bulk, chronological |
//! | [`spread_protected_window`] | bulk, nearest original |
//!
//! Cards without memory state are never moved; they count as skipped.
//!
//! [`Engine`]: crate::scheduler::Engine
//! [`BatchControl`]: crate::worker::BatchControl

mod collection;
mod disperse;
mod flatten;
mod postpone;
mod protected;
mod reschedule;

pub use collection::{Collection, MemoryCollection};
pub use disperse::disperse_siblings;
pub use flatten::flatten;
pub use postpone::{advance, postpone};
pub use protected::{spread_protected_window, ProtectedWindow};
pub use reschedule::reschedule;

use serde::Serialize;

use crate::error::Result;
use crate::models::{Card, CardUpdate};

/// Outcome of one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    /// Cards examined.
    pub processed: usize,
    /// Cards written back with a new due day or interval.
    pub changed: usize,
    /// Cards left alone for lack of memory state or a usable window.
    pub skipped: usize,
    /// Whether the batch stopped on cancellation.
    pub cancelled: bool,
}

/// Chunked writer for one transaction.
///
/// Dropping a batch without [`UpdateBatch::finish`] (an operation bailing
/// out with `?`) discards unflushed updates and still closes the
/// transaction, so the collection stays usable.
struct UpdateBatch<'a, C: Collection + ?Sized> {
    collection: &'a mut C,
    pending: Vec<CardUpdate>,
    chunk: usize,
    report: OperationReport,
    open: bool,
}

impl<'a, C: Collection + ?Sized> UpdateBatch<'a, C> {
    fn begin(collection: &'a mut C, label: &str, chunk: usize) -> Result<Self> {
        collection.begin_transaction(label)?;
        Ok(Self {
            collection,
            pending: Vec::new(),
            chunk: chunk.max(1),
            report: OperationReport::default(),
            open: true,
        })
    }

    /// Queues an update when the card's due day or interval differs.
    fn update(&mut self, card: &Card, due: i64, interval: i64) -> Result<()> {
        if card.due == due && card.interval == interval {
            return Ok(());
        }
        self.pending.push(CardUpdate::new(card.id, due, interval));
        self.report.changed += 1;
        if self.pending.len() >= self.chunk {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            self.collection.apply(&self.pending)?;
            self.pending.clear();
        }
        Ok(())
    }

    fn finish(mut self, cancelled: bool) -> Result<OperationReport> {
        self.flush()?;
        self.open = false;
        self.collection.finish_transaction()?;
        self.report.cancelled = cancelled;
        Ok(self.report)
    }
}

impl<C: Collection + ?Sized> Drop for UpdateBatch<'_, C> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        tracing::warn!(
            discarded = self.pending.len(),
            changed = self.report.changed,
            "operation aborted; closing transaction"
        );
        if let Err(e) = self.collection.finish_transaction() {
            tracing::warn!(error = %e, "failed to close transaction");
        }
    }
}

/// Review-queue cards of the collection.
fn review_cards<C: Collection + ?Sized>(collection: &C) -> Result<Vec<Card>> {
    Ok(collection
        .cards()?
        .into_iter()
        .filter(Card::is_review)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardId;

    #[test]
    fn test_batch_flushes_in_chunks() {
        let cards: Vec<Card> = (1..=5).map(|id| Card::review(id, 10, 5)).collect();
        let mut col = MemoryCollection::with_cards(cards.clone());
        let mut batch = UpdateBatch::begin(&mut col, "chunks", 2).unwrap();
        for card in &cards {
            batch.update(card, 11, 6).unwrap();
        }
        // unchanged cards are not written
        batch.update(&Card::review(1, 10, 5).with_note(1), 10, 5).unwrap();
        let report = batch.finish(false).unwrap();

        assert_eq!(report.changed, 5);
        assert_eq!(col.apply_calls(), 3);
        assert_eq!(col.card(CardId(5)).unwrap().due, 11);
        assert_eq!(col.transactions().len(), 1);
    }

    #[test]
    fn test_dropped_batch_closes_transaction() {
        let card = Card::review(1, 10, 5);
        let mut col = MemoryCollection::with_cards([card.clone()]);
        {
            let mut batch = UpdateBatch::begin(&mut col, "aborted", 10).unwrap();
            batch.update(&card, 12, 7).unwrap();
        }
        // unflushed update discarded, transaction closed
        assert_eq!(col.card(CardId(1)).unwrap().due, 10);
        assert_eq!(col.transactions().len(), 1);
        assert!(col.begin_transaction("next").is_ok());
    }

    #[test]
    fn test_review_cards_filters_queue() {
        let col = MemoryCollection::with_cards([
            Card::review(1, 10, 5),
            Card::review(2, 10, 5).with_queue(crate::models::CardQueue::Suspended),
        ]);
        let cards = review_cards(&col).unwrap();
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn test_operation_on_background_worker() {
        use crate::config::{Context, SchedulerConfig};
        use crate::models::Timeline;
        use crate::scheduler::Engine;
        use crate::worker::spawn_batch;
        use chrono::NaiveDate;

        let timeline = Timeline::new(0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let engine = Engine::new(Context::new(SchedulerConfig::default(), timeline));
        let mut col = MemoryCollection::with_cards(
            (1..=8).map(|id| Card::review(id, 10, 10).with_memory(10.0, 5.0)),
        );

        let job = spawn_batch("flatten-worker", 200, None, move |mut control| {
            let report = flatten(&engine, &mut col, 5, 30, &mut control);
            (report, col)
        })
        .unwrap();
        let (report, col) = job.join().unwrap();

        assert_eq!(report.unwrap().changed, 3);
        assert_eq!(col.transactions().len(), 1);
    }
}
