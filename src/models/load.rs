//! Daily review-load table.
//!
//! Tracks how many cards are due on each day within each preset. Built
//! once per batch operation from collection state, consulted by the
//! samplers, updated as assignments are committed, then dropped.

use std::collections::{BTreeMap, HashMap};

use super::PresetId;

/// Running due-card counts: preset → day → count.
#[derive(Debug, Clone, Default)]
pub struct DayLoad {
    counts: HashMap<PresetId, BTreeMap<i64, u32>>,
}

impl DayLoad {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(preset, due day)` pairs.
    pub fn from_dues(dues: impl IntoIterator<Item = (PresetId, i64)>) -> Self {
        let mut load = Self::new();
        for (preset, day) in dues {
            load.add(preset, day);
        }
        load
    }

    /// Cards due on `day` within `preset`.
    pub fn get(&self, preset: PresetId, day: i64) -> u32 {
        self.counts
            .get(&preset)
            .and_then(|days| days.get(&day))
            .copied()
            .unwrap_or(0)
    }

    /// Loads for several days, in the given order.
    pub fn loads(&self, preset: PresetId, days: &[i64]) -> Vec<u32> {
        days.iter().map(|&d| self.get(preset, d)).collect()
    }

    /// Records one more card due on `day`.
    pub fn add(&mut self, preset: PresetId, day: i64) {
        *self
            .counts
            .entry(preset)
            .or_default()
            .entry(day)
            .or_insert(0) += 1;
    }

    /// Removes one card from `day`. Empty days are dropped; removing from
    /// an empty day is a no-op.
    pub fn remove(&mut self, preset: PresetId, day: i64) {
        if let Some(days) = self.counts.get_mut(&preset) {
            if let Some(count) = days.get_mut(&day) {
                *count -= 1;
                if *count == 0 {
                    days.remove(&day);
                }
            }
        }
    }

    /// Moves one card from `from` to `to`.
    pub fn relocate(&mut self, preset: PresetId, from: i64, to: i64) {
        if from != to {
            self.remove(preset, from);
            self.add(preset, to);
        }
    }

    /// Non-empty days of a preset, ascending.
    pub fn days(&self, preset: PresetId) -> impl Iterator<Item = (i64, u32)> + '_ {
        self.counts
            .get(&preset)
            .into_iter()
            .flat_map(|days| days.iter().map(|(&d, &c)| (d, c)))
    }

    /// Total cards tracked for a preset.
    pub fn total(&self, preset: PresetId) -> u64 {
        self.days(preset).map(|(_, c)| u64::from(c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: PresetId = PresetId(1);

    #[test]
    fn test_from_dues() {
        let load = DayLoad::from_dues([(P, 10), (P, 10), (P, 11), (PresetId(2), 10)]);
        assert_eq!(load.get(P, 10), 2);
        assert_eq!(load.get(P, 11), 1);
        assert_eq!(load.get(PresetId(2), 10), 1);
        assert_eq!(load.get(P, 12), 0);
        assert_eq!(load.total(P), 3);
    }

    #[test]
    fn test_relocate() {
        let mut load = DayLoad::from_dues([(P, 10), (P, 10)]);
        load.relocate(P, 10, 13);
        assert_eq!(load.get(P, 10), 1);
        assert_eq!(load.get(P, 13), 1);
        assert_eq!(load.total(P), 2);
    }

    #[test]
    fn test_remove_drops_empty_days() {
        let mut load = DayLoad::from_dues([(P, 4)]);
        load.remove(P, 4);
        load.remove(P, 4); // no-op
        assert_eq!(load.days(P).count(), 0);
    }

    #[test]
    fn test_loads_in_order() {
        let load = DayLoad::from_dues([(P, 1), (P, 3), (P, 3)]);
        assert_eq!(load.loads(P, &[3, 2, 1]), vec![2, 0, 1]);
    }
}
