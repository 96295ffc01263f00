//! Forgetting-curve strategies.
//!
//! The memory model collaborator supplies stability per card; this module
//! turns stability into retrievability and target intervals. Two curve
//! families exist across memory-model versions and are selected by
//! configuration:
//!
//! - **Exponential**: `R(t) = 0.9^(t/S)` (legacy model).
//! - **Power law**: `R(t) = (1 + F·t/S)^(-decay)` with
//!   `F = 0.9^(-1/decay) - 1`, so that `R(S) = 0.9` for every decay.
//!
//! # Reference
//! Ye (2022–2024), "FSRS: Free Spaced Repetition Scheduler", versions 3–6.

use serde::{Deserialize, Serialize};

const MIN_STABILITY: f64 = 0.01;

/// Forgetting curve used to derive intervals from stability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryModel {
    /// Multiplicative (exponential) decay.
    Exponential,
    /// Power-law decay with the given exponent.
    PowerLaw { decay: f64 },
}

impl Default for MemoryModel {
    fn default() -> Self {
        Self::fsrs_v5()
    }
}

impl MemoryModel {
    /// FSRS v3 curve.
    pub fn fsrs_v3() -> Self {
        MemoryModel::Exponential
    }

    /// FSRS v4 curve (decay 1).
    pub fn fsrs_v4() -> Self {
        MemoryModel::PowerLaw { decay: 1.0 }
    }

    /// FSRS-4.5 / FSRS-5 curve (decay 0.5).
    pub fn fsrs_v5() -> Self {
        MemoryModel::PowerLaw { decay: 0.5 }
    }

    /// FSRS-6 curve with a trained decay parameter.
    pub fn fsrs_v6(decay: f64) -> Self {
        MemoryModel::PowerLaw { decay }
    }

    fn factor(decay: f64) -> f64 {
        0.9f64.powf(-1.0 / decay) - 1.0
    }

    /// Probability of recall after `elapsed_days` at the given stability.
    pub fn retrievability(&self, elapsed_days: f64, stability: f64) -> f64 {
        let s = stability.max(MIN_STABILITY);
        let t = elapsed_days.max(0.0);
        match *self {
            MemoryModel::Exponential => 0.9f64.powf(t / s),
            MemoryModel::PowerLaw { decay } => {
                (1.0 + Self::factor(decay) * t / s).powf(-decay)
            }
        }
    }

    /// Interval (days, unrounded) at which retrievability falls to
    /// `desired_retention`.
    pub fn next_interval(&self, stability: f64, desired_retention: f64) -> f64 {
        let s = stability.max(MIN_STABILITY);
        match *self {
            MemoryModel::Exponential => s * desired_retention.ln() / 0.9f64.ln(),
            MemoryModel::PowerLaw { decay } => {
                s / Self::factor(decay) * (desired_retention.powf(-1.0 / decay) - 1.0)
            }
        }
    }

    /// Whether the decay parameter is usable.
    pub fn is_valid(&self) -> bool {
        match *self {
            MemoryModel::Exponential => true,
            MemoryModel::PowerLaw { decay } => decay.is_finite() && decay > 0.0,
        }
    }
}
