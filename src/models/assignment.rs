//! Assignment (allocation result) model.
//!
//! An assignment maps each allocated card to the day it becomes due.
//! It is produced by exactly one allocator per call, applied to the
//! collection, then discarded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::CardId;

/// Card → assigned day mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment {
    days: BTreeMap<CardId, i64>,
}

impl Assignment {
    /// Creates an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a day for a card, replacing any previous one.
    pub fn insert(&mut self, id: CardId, day: i64) {
        self.days.insert(id, day);
    }

    /// Day assigned to a card.
    pub fn get(&self, id: CardId) -> Option<i64> {
        self.days.get(&id).copied()
    }

    /// Number of assigned cards.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Iterates `(card, day)` pairs ordered by card id.
    pub fn iter(&self) -> impl Iterator<Item = (CardId, i64)> + '_ {
        self.days.iter().map(|(&id, &day)| (id, day))
    }

    /// Number of cards assigned to each day.
    pub fn count_by_day(&self) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for &day in self.days.values() {
            *counts.entry(day).or_insert(0) += 1;
        }
        counts
    }

    /// Smallest difference between any two assigned days.
    ///
    /// Returns 0 when two cards share a day and `None` with fewer than
    /// two cards.
    pub fn min_gap(&self) -> Option<i64> {
        if self.days.len() < 2 {
            return None;
        }
        let mut sorted: Vec<i64> = self.days.values().copied().collect();
        sorted.sort_unstable();
        sorted.windows(2).map(|w| w[1] - w[0]).min()
    }
}

impl FromIterator<(CardId, i64)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (CardId, i64)>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_gap() {
        let a: Assignment = [(CardId(1), 100), (CardId(2), 104), (CardId(3), 102)]
            .into_iter()
            .collect();
        assert_eq!(a.min_gap(), Some(2));

        let collided: Assignment = [(CardId(1), 7), (CardId(2), 7)].into_iter().collect();
        assert_eq!(collided.min_gap(), Some(0));

        let single: Assignment = [(CardId(1), 7)].into_iter().collect();
        assert_eq!(single.min_gap(), None);
    }

    #[test]
    fn test_count_by_day() {
        let a: Assignment = [(CardId(1), 5), (CardId(2), 5), (CardId(3), 6)]
            .into_iter()
            .collect();
        let counts = a.count_by_day();
        assert_eq!(counts[&5], 2);
        assert_eq!(counts[&6], 1);
    }

    #[test]
    fn test_insert_replaces() {
        let mut a = Assignment::new();
        a.insert(CardId(1), 10);
        a.insert(CardId(1), 12);
        assert_eq!(a.len(), 1);
        assert_eq!(a.get(CardId(1)), Some(12));
        assert_eq!(a.get(CardId(2)), None);
    }
}
