//! Calendar and day-of-week preference models.
//!
//! Maps integer day numbers onto calendar dates so weekday preferences
//! and explicit date overrides can be applied to candidate days.
//!
//! # Time Model
//! Day numbers are relative to the host collection's epoch. A `Timeline`
//! pins one day number (today) to a calendar date; every other day is
//! derived by offset.
//!
//! # Precedence
//! Explicit date overrides win over weekday weights: an overridden date
//! is treated as weight 0 regardless of its weekday.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Anchors day numbers to calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    /// Today's day number.
    pub today: i64,
    /// Today's calendar date.
    pub today_date: NaiveDate,
}

impl Timeline {
    /// Creates a timeline pinning `today` to `today_date`.
    pub fn new(today: i64, today_date: NaiveDate) -> Self {
        Self { today, today_date }
    }

    /// Calendar date of a day number.
    ///
    /// Saturates at chrono's representable range.
    pub fn date_of(&self, day: i64) -> NaiveDate {
        let offset = day - self.today;
        let shifted = if offset >= 0 {
            self.today_date.checked_add_days(Days::new(offset as u64))
        } else {
            self.today_date.checked_sub_days(Days::new(offset.unsigned_abs()))
        };
        shifted.unwrap_or(if offset >= 0 {
            NaiveDate::MAX
        } else {
            NaiveDate::MIN
        })
    }

    /// Weekday index of a day number (Monday = 0 … Sunday = 6).
    pub fn weekday_index(&self, day: i64) -> usize {
        self.date_of(day).weekday().num_days_from_monday() as usize
    }
}

/// Coarse per-weekday preference, mapped to a load weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPreference {
    /// No restriction.
    Normal,
    /// Fewer reviews than other days.
    Reduced,
    /// As few reviews as possible.
    Free,
}

impl DayPreference {
    /// Weight in `[0, 1]`.
    pub fn weight(self) -> f32 {
        match self {
            DayPreference::Normal => 1.0,
            DayPreference::Reduced => 0.5,
            DayPreference::Free => 0.0,
        }
    }
}

/// Weekday weights plus explicit date overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceWeights {
    /// Weight per weekday, Monday first. 1 = no restriction.
    pub weekday: [f32; 7],
    /// Dates treated as weight 0.
    pub overrides: BTreeSet<NaiveDate>,
}

impl Default for PreferenceWeights {
    fn default() -> Self {
        Self {
            weekday: [1.0; 7],
            overrides: BTreeSet::new(),
        }
    }
}

impl PreferenceWeights {
    /// No preferences: every day weighs 1.
    pub fn uniform() -> Self {
        Self::default()
    }

    /// Builds weights from coarse preferences, Monday first.
    pub fn from_preferences(prefs: [DayPreference; 7]) -> Self {
        Self {
            weekday: prefs.map(DayPreference::weight),
            overrides: BTreeSet::new(),
        }
    }

    /// Adds an override date.
    pub fn with_override(mut self, date: NaiveDate) -> Self {
        self.overrides.insert(date);
        self
    }

    /// Weekday weight of a day number. Overrides are not applied here;
    /// they surface as forced exclusions.
    pub fn weight_of(&self, timeline: &Timeline, day: i64) -> f32 {
        self.weekday[timeline.weekday_index(day)]
    }

    /// Whether a day number falls on an override date.
    pub fn is_override(&self, timeline: &Timeline, day: i64) -> bool {
        !self.overrides.is_empty() && self.overrides.contains(&timeline.date_of(day))
    }
}
