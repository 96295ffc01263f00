//! Scheduler configuration and the per-call context.
//!
//! Configuration is an explicit value threaded through every allocator
//! call. Nothing in the crate reads configuration from global state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::memory::MemoryModel;
use crate::models::{PreferenceWeights, PresetId, Timeline};

/// Upper bound on intervals and flattening horizons (≈ 100 years).
pub const MAX_HORIZON_DAYS: i64 = 36_500;

/// Per-preset scheduling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetConfig {
    /// Target retrievability at the next review (0, 1).
    pub desired_retention: f64,
    /// Longest interval the scheduler may assign (days).
    pub maximum_interval: i64,
    /// Preferred number of reviews per day, if any.
    pub daily_limit: Option<u32>,
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            desired_retention: 0.9,
            maximum_interval: MAX_HORIZON_DAYS,
            daily_limit: None,
        }
    }
}

impl PresetConfig {
    /// Sets the desired retention.
    pub fn with_retention(mut self, retention: f64) -> Self {
        self.desired_retention = retention;
        self
    }

    /// Sets the maximum interval.
    pub fn with_maximum_interval(mut self, days: i64) -> Self {
        self.maximum_interval = days;
        self
    }

    /// Sets the daily limit.
    pub fn with_daily_limit(mut self, limit: u32) -> Self {
        self.daily_limit = Some(limit);
        self
    }
}

/// Engine-wide configuration.
///
/// # Example
/// ```
/// use u_due::config::SchedulerConfig;
///
/// let config = SchedulerConfig::from_json(r#"{ "fuzz": false, "load_balance": false }"#).unwrap();
/// assert!(!config.fuzz);
/// assert_eq!(config.default_preset.desired_retention, 0.9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Parameters for presets without an explicit entry.
    pub default_preset: PresetConfig,
    /// Preset-specific parameters.
    pub presets: HashMap<PresetId, PresetConfig>,
    /// Randomize due days within the fuzz window.
    pub fuzz: bool,
    /// Weight fuzz by daily load and weekday preferences.
    pub load_balance: bool,
    /// Weekday weights and date overrides.
    pub preferences: PreferenceWeights,
    /// Forgetting curve for interval derivation.
    pub memory_model: MemoryModel,
    /// Items processed between cancellation checks and progress reports.
    pub batch_cadence: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_preset: PresetConfig::default(),
            presets: HashMap::new(),
            fuzz: true,
            load_balance: true,
            preferences: PreferenceWeights::default(),
            memory_model: MemoryModel::default(),
            batch_cadence: 200,
        }
    }
}

impl SchedulerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parameters for a preset.
    pub fn preset(&self, id: PresetId) -> &PresetConfig {
        self.presets.get(&id).unwrap_or(&self.default_preset)
    }

    /// Adds preset-specific parameters.
    pub fn with_preset(mut self, id: PresetId, preset: PresetConfig) -> Self {
        self.presets.insert(id, preset);
        self
    }

    /// Sets the default preset.
    pub fn with_default_preset(mut self, preset: PresetConfig) -> Self {
        self.default_preset = preset;
        self
    }

    /// Enables or disables fuzz.
    pub fn with_fuzz(mut self, enabled: bool) -> Self {
        self.fuzz = enabled;
        self
    }

    /// Enables or disables load balancing.
    pub fn with_load_balance(mut self, enabled: bool) -> Self {
        self.load_balance = enabled;
        self
    }

    /// Sets weekday preferences.
    pub fn with_preferences(mut self, preferences: PreferenceWeights) -> Self {
        self.preferences = preferences;
        self
    }

    /// Sets the forgetting curve.
    pub fn with_memory_model(mut self, model: MemoryModel) -> Self {
        self.memory_model = model;
        self
    }

    /// Checks every value against its accepted domain.
    pub fn validate(&self) -> Result<()> {
        let check = |name: String, p: &PresetConfig| -> Result<()> {
            if !(p.desired_retention > 0.0 && p.desired_retention < 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name}: desired retention {} outside (0, 1)",
                    p.desired_retention
                )));
            }
            if p.maximum_interval < 1 || p.maximum_interval > MAX_HORIZON_DAYS {
                return Err(Error::InvalidConfig(format!(
                    "{name}: maximum interval {} outside [1, {MAX_HORIZON_DAYS}]",
                    p.maximum_interval
                )));
            }
            if p.daily_limit == Some(0) {
                return Err(Error::InvalidConfig(format!("{name}: daily limit of 0")));
            }
            Ok(())
        };

        check("default preset".into(), &self.default_preset)?;
        for (id, p) in &self.presets {
            check(id.to_string(), p)?;
        }
        if self
            .preferences
            .weekday
            .iter()
            .any(|w| !(0.0..=1.0).contains(w))
        {
            return Err(Error::InvalidConfig(
                "weekday weights must lie in [0, 1]".into(),
            ));
        }
        if !self.memory_model.is_valid() {
            return Err(Error::InvalidConfig(format!(
                "unusable memory model {:?}",
                self.memory_model
            )));
        }
        if self.batch_cadence == 0 {
            return Err(Error::InvalidConfig("batch cadence must be positive".into()));
        }
        Ok(())
    }
}

/// Configuration plus calendar position, passed to every call.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: SchedulerConfig,
    pub timeline: Timeline,
}

impl Context {
    /// Creates a context.
    pub fn new(config: SchedulerConfig, timeline: Timeline) -> Self {
        Self { config, timeline }
    }

    /// Today's day number.
    #[inline]
    pub fn today(&self) -> i64 {
        self.timeline.today
    }
}
