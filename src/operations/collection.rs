//! Host collection seam.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::{Card, CardId, CardUpdate};

/// Card store the operations read from and write back to.
///
/// Every operation brackets its writes in one transaction so the host can
/// undo it as a single step. Updates may arrive in several `apply` calls
/// inside that transaction.
pub trait Collection {
    /// Snapshot of every card.
    fn cards(&self) -> Result<Vec<Card>>;

    /// Opens an undoable transaction.
    fn begin_transaction(&mut self, label: &str) -> Result<()>;

    /// Writes new due days and intervals.
    fn apply(&mut self, updates: &[CardUpdate]) -> Result<()>;

    /// Commits the open transaction.
    fn finish_transaction(&mut self) -> Result<()>;
}

/// In-memory collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    cards: BTreeMap<CardId, Card>,
    open: Option<String>,
    committed: Vec<String>,
    apply_calls: usize,
}

impl MemoryCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection holding `cards`.
    pub fn with_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut collection = Self::new();
        for card in cards {
            collection.insert(card);
        }
        collection
    }

    /// Adds or replaces a card.
    pub fn insert(&mut self, card: Card) {
        self.cards.insert(card.id, card);
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    /// Labels of committed transactions, oldest first.
    pub fn transactions(&self) -> &[String] {
        &self.committed
    }

    /// Number of `apply` calls so far.
    pub fn apply_calls(&self) -> usize {
        self.apply_calls
    }

    /// Due days of every card, as `(card, due)` pairs.
    pub fn dues(&self) -> impl Iterator<Item = (CardId, i64)> + '_ {
        self.cards.values().map(|c| (c.id, c.due))
    }
}

impl Collection for MemoryCollection {
    fn cards(&self) -> Result<Vec<Card>> {
        Ok(self.cards.values().cloned().collect())
    }

    fn begin_transaction(&mut self, label: &str) -> Result<()> {
        if let Some(open) = &self.open {
            return Err(Error::Collection(format!(
                "transaction '{open}' is still open"
            )));
        }
        self.open = Some(label.to_string());
        Ok(())
    }

    fn apply(&mut self, updates: &[CardUpdate]) -> Result<()> {
        if self.open.is_none() {
            return Err(Error::Collection("apply outside a transaction".into()));
        }
        for update in updates {
            let card = self
                .cards
                .get_mut(&update.id)
                .ok_or_else(|| Error::Collection(format!("unknown {}", update.id)))?;
            card.due = update.due;
            card.interval = update.interval;
            card.tag.clone_from(&update.tag);
        }
        self.apply_calls += 1;
        Ok(())
    }

    fn finish_transaction(&mut self) -> Result<()> {
        let label = self
            .open
            .take()
            .ok_or_else(|| Error::Collection("no open transaction".into()))?;
        self.committed.push(label);
        Ok(())
    }
}
