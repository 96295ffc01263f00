//! Collection-side card view.
//!
//! A snapshot of the fields the engine reads from the host collection,
//! and the update record it writes back.

use serde::{Deserialize, Serialize};

use super::{CardId, DayRange, Item, NoteId, PresetId};

/// Tag stored in a card's custom data once the engine has rescheduled it.
pub const ENGINE_TAG: &str = "u-due";

/// Memory-model state supplied by the memory model collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    /// Days for retrievability to fall from 100% to 90%.
    pub stability: f64,
    /// Memory difficulty (1–10).
    pub difficulty: f64,
}

impl MemoryState {
    /// Finite, non-negative stability.
    pub fn is_usable(&self) -> bool {
        self.stability.is_finite() && self.stability >= 0.0
    }
}

/// Scheduling queue a card currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardQueue {
    New,
    Learning,
    Review,
    Suspended,
}

/// A card as read from the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub note_id: NoteId,
    pub preset_id: PresetId,
    pub queue: CardQueue,
    /// Current due day.
    pub due: i64,
    /// Current interval (days).
    pub interval: i64,
    /// Number of reviews so far.
    pub reps: u32,
    /// Day of the last review, if the card has been reviewed.
    pub last_review: Option<i64>,
    /// Memory state. `None` = not computed; such cards are skipped.
    pub memory: Option<MemoryState>,
    /// Opaque custom data tag.
    pub tag: Option<String>,
}

impl Card {
    /// Creates a review card due on `due` with interval `interval`.
    ///
    /// The last review day is derived as `due - interval`.
    pub fn review(id: i64, due: i64, interval: i64) -> Self {
        Self {
            id: CardId(id),
            note_id: NoteId(id),
            preset_id: PresetId::default(),
            queue: CardQueue::Review,
            due,
            interval,
            reps: 1,
            last_review: Some(due - interval),
            memory: None,
            tag: None,
        }
    }

    /// Sets the note (sibling group).
    pub fn with_note(mut self, note: i64) -> Self {
        self.note_id = NoteId(note);
        self
    }

    /// Sets the preset.
    pub fn with_preset(mut self, preset: PresetId) -> Self {
        self.preset_id = preset;
        self
    }

    /// Sets the memory state.
    pub fn with_memory(mut self, stability: f64, difficulty: f64) -> Self {
        self.memory = Some(MemoryState {
            stability,
            difficulty,
        });
        self
    }

    /// Sets the repetition count.
    pub fn with_reps(mut self, reps: u32) -> Self {
        self.reps = reps;
        self
    }

    /// Sets the queue.
    pub fn with_queue(mut self, queue: CardQueue) -> Self {
        self.queue = queue;
        self
    }

    #[inline]
    pub fn is_review(&self) -> bool {
        self.queue == CardQueue::Review
    }

    /// Last review day, falling back to `due - interval`.
    pub fn last_review_day(&self) -> i64 {
        self.last_review.unwrap_or(self.due - self.interval)
    }

    /// Days since the last review as of `today`.
    pub fn elapsed_days(&self, today: i64) -> i64 {
        today - self.last_review_day()
    }

    /// Whether the card carries memory state the allocators can use.
    pub fn has_usable_memory(&self) -> bool {
        self.memory.is_some_and(|m| m.is_usable())
    }

    /// Allocation item pinned to the current due day, or `None` when the
    /// card has no usable memory state.
    pub fn to_item(&self) -> Option<Item> {
        let memory = self.memory.filter(MemoryState::is_usable)?;
        Some(Item {
            id: self.id,
            group_key: Some(self.note_id),
            feasible_range: DayRange::point(self.due),
            stability: memory.stability,
            last_review_day: self.last_review_day(),
            original_due: self.due,
            original_interval: self.interval,
            preset_id: self.preset_id,
        })
    }
}

/// A new `(due, interval)` pair for one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardUpdate {
    pub id: CardId,
    pub due: i64,
    pub interval: i64,
    /// Custom data tag marking the card as engine-touched.
    pub tag: Option<String>,
}

impl CardUpdate {
    /// Creates a tagged update.
    pub fn new(id: CardId, due: i64, interval: i64) -> Self {
        Self {
            id,
            due,
            interval,
            tag: Some(ENGINE_TAG.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_card_defaults() {
        let c = Card::review(7, 120, 20).with_memory(25.0, 5.0);
        assert!(c.is_review());
        assert_eq!(c.last_review_day(), 100);
        assert_eq!(c.elapsed_days(110), 10);
        assert_eq!(c.memory.unwrap().stability, 25.0);
    }

    #[test]
    fn test_to_item_requires_memory() {
        let c = Card::review(3, 50, 10).with_note(9);
        assert!(c.to_item().is_none());

        let item = c.with_memory(12.0, 4.0).to_item().unwrap();
        assert_eq!(item.feasible_range, DayRange::point(50));
        assert_eq!(item.last_review_day, 40);
        assert_eq!(item.original_interval, 10);
        assert_eq!(item.group_key, Some(NoteId(9)));
    }

    #[test]
    fn test_to_item_rejects_unusable_stability() {
        for stability in [-1.0, f64::NAN, f64::INFINITY] {
            let c = Card::review(3, 50, 10).with_memory(stability, 4.0);
            assert!(!c.has_usable_memory());
            assert!(c.to_item().is_none());
        }
        assert!(Card::review(3, 50, 10).with_memory(0.0, 4.0).has_usable_memory());
    }

    #[test]
    fn test_update_is_tagged() {
        let u = CardUpdate::new(CardId(1), 10, 5);
        assert_eq!(u.tag.as_deref(), Some(ENGINE_TAG));
    }
}
