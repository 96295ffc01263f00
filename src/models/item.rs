//! Allocation items and their feasibility windows.
//!
//! An item is one card to be (re)scheduled. Items are built fresh for every
//! scheduling operation from current collection state and discarded after
//! their assignment has been applied.
//!
//! # Day Model
//! All days are integer day numbers relative to the host collection's epoch.
//! The consumer defines what day 0 means; only differences matter here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Opaque card identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub i64);

/// Identifier of the source note shared by sibling cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

/// Identifier of a configuration preset (capacity/weight group).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PresetId(pub i64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card:{}", self.0)
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preset:{}", self.0)
    }
}

/// Inclusive integer day window `[low, high]`.
///
/// Construction fails when `low > high`: a malformed window is an upstream
/// programming error and is never repaired by swapping bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(i64, i64)", into = "(i64, i64)")]
pub struct DayRange {
    low: i64,
    high: i64,
}

impl DayRange {
    /// Creates a window, rejecting `low > high`.
    pub fn new(low: i64, high: i64) -> Result<Self> {
        if low > high {
            return Err(Error::InvalidRange { low, high });
        }
        Ok(Self { low, high })
    }

    /// Degenerate single-day window.
    pub fn point(day: i64) -> Self {
        Self {
            low: day,
            high: day,
        }
    }

    /// Lower bound (inclusive).
    #[inline]
    pub fn low(&self) -> i64 {
        self.low
    }

    /// Upper bound (inclusive).
    #[inline]
    pub fn high(&self) -> i64 {
        self.high
    }

    /// Number of days in the window.
    #[inline]
    pub fn span(&self) -> i64 {
        self.high - self.low + 1
    }

    #[inline]
    pub fn contains(&self, day: i64) -> bool {
        day >= self.low && day <= self.high
    }

    /// Shifts both bounds by `offset` days.
    pub fn shifted(&self, offset: i64) -> Self {
        Self {
            low: self.low + offset,
            high: self.high + offset,
        }
    }

    /// Iterates every day in the window, ascending.
    pub fn days(&self) -> impl Iterator<Item = i64> {
        self.low..=self.high
    }
}

impl TryFrom<(i64, i64)> for DayRange {
    type Error = Error;

    fn try_from((low, high): (i64, i64)) -> Result<Self> {
        Self::new(low, high)
    }
}

impl From<DayRange> for (i64, i64) {
    fn from(range: DayRange) -> Self {
        (range.low, range.high)
    }
}

/// One card to be scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Card identifier.
    pub id: CardId,
    /// Source note, shared by sibling cards.
    pub group_key: Option<NoteId>,
    /// Hard window for the assigned day.
    pub feasible_range: DayRange,
    /// Memory stability (days).
    pub stability: f64,
    /// Day of the most recent review.
    pub last_review_day: i64,
    /// Due day before this operation.
    pub original_due: i64,
    /// Interval (days) before this operation.
    pub original_interval: i64,
    /// Configuration group for capacity and weights.
    pub preset_id: PresetId,
}

impl Item {
    /// Creates an item whose window is the single day `due`.
    pub fn new(id: CardId, due: i64) -> Self {
        Self {
            id,
            group_key: None,
            feasible_range: DayRange::point(due),
            stability: 0.0,
            last_review_day: due,
            original_due: due,
            original_interval: 0,
            preset_id: PresetId::default(),
        }
    }

    /// Sets the feasible window.
    pub fn with_range(mut self, range: DayRange) -> Self {
        self.feasible_range = range;
        self
    }

    /// Sets the sibling group key.
    pub fn with_group(mut self, note: NoteId) -> Self {
        self.group_key = Some(note);
        self
    }

    /// Sets the stability.
    pub fn with_stability(mut self, stability: f64) -> Self {
        self.stability = stability;
        self
    }

    /// Sets the last review day and derives the original interval from the due day.
    pub fn with_last_review(mut self, day: i64) -> Self {
        self.last_review_day = day;
        self.original_interval = self.original_due - day;
        self
    }

    /// Sets the preset.
    pub fn with_preset(mut self, preset: PresetId) -> Self {
        self.preset_id = preset;
        self
    }

    /// Days elapsed between the last review and `today`.
    #[inline]
    pub fn elapsed_days(&self, today: i64) -> i64 {
        today - self.last_review_day
    }
}

/// A participant in a sibling allocation.
///
/// Anchors pin a reference day (typically the most recent sibling review)
/// that other members keep their distance from. They are never moved and
/// never appear in the returned assignment.
#[derive(Debug, Clone)]
pub enum GroupMember {
    /// A real card with its own feasible window.
    Card(Item),
    /// A fixed reference day.
    Anchor(i64),
}

impl GroupMember {
    /// The window this member may occupy.
    pub fn range(&self) -> DayRange {
        match self {
            GroupMember::Card(item) => item.feasible_range,
            GroupMember::Anchor(day) => DayRange::point(*day),
        }
    }

    /// The card, when this member is not an anchor.
    pub fn item(&self) -> Option<&Item> {
        match self {
            GroupMember::Card(item) => Some(item),
            GroupMember::Anchor(_) => None,
        }
    }
}
