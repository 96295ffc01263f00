//! Daily load metrics (KPIs).
//!
//! Summarizes how evenly reviews are spread over a range of days.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Max load | Largest daily count |
//! | Mean load | Average daily count over the range |
//! | Std-dev | Population standard deviation of daily counts |
//! | Days over limit | Days whose count exceeds a limit |
//!
//! Days without any card count as zero.

use serde::Serialize;

use crate::models::{DayLoad, PresetId};

/// Load indicators for one preset over an inclusive day range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadKpi {
    /// Largest daily count.
    pub max_load: u32,
    /// Mean daily count.
    pub mean_load: f64,
    /// Population standard deviation of daily counts.
    pub std_dev: f64,
    /// Days with more cards than the limit (0 without a limit).
    pub days_over_limit: usize,
    /// Cards due within the range.
    pub total: u64,
}

impl LoadKpi {
    /// Computes KPIs for `preset` over days `from..=to`.
    ///
    /// # Arguments
    /// * `limit` - Optional per-day limit for `days_over_limit`.
    pub fn calculate(load: &DayLoad, preset: PresetId, from: i64, to: i64, limit: Option<u32>) -> Self {
        let counts: Vec<u32> = (from..=to).map(|day| load.get(preset, day)).collect();
        Self::from_counts(&counts, limit)
    }

    /// Computes KPIs from raw daily counts.
    pub fn from_counts(counts: &[u32], limit: Option<u32>) -> Self {
        if counts.is_empty() {
            return Self {
                max_load: 0,
                mean_load: 0.0,
                std_dev: 0.0,
                days_over_limit: 0,
                total: 0,
            };
        }

        let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
        let mean = total as f64 / counts.len() as f64;
        let variance = counts
            .iter()
            .map(|&c| (f64::from(c) - mean).powi(2))
            .sum::<f64>()
            / counts.len() as f64;

        Self {
            max_load: counts.iter().copied().max().unwrap_or(0),
            mean_load: mean,
            std_dev: variance.sqrt(),
            days_over_limit: limit.map_or(0, |l| counts.iter().filter(|&&c| c > l).count()),
            total,
        }
    }

    /// Whether no day exceeds the given limit.
    pub fn within_limit(&self, limit: u32) -> bool {
        self.max_load <= limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kpi_basic_counts() {
        let kpi = LoadKpi::from_counts(&[2, 4, 6], Some(3));
        assert_eq!(kpi.max_load, 6);
        assert!((kpi.mean_load - 4.0).abs() < 1e-10);
        // sqrt((4 + 0 + 4) / 3)
        assert!((kpi.std_dev - (8.0f64 / 3.0).sqrt()).abs() < 1e-10);
        assert_eq!(kpi.days_over_limit, 2);
        assert_eq!(kpi.total, 12);
        assert!(!kpi.within_limit(5));
    }

    #[test]
    fn test_kpi_from_table_counts_empty_days() {
        let p = PresetId(1);
        let load = DayLoad::from_dues([(p, 10), (p, 10), (p, 12)]);
        let kpi = LoadKpi::calculate(&load, p, 10, 13, None);
        assert_eq!(kpi.max_load, 2);
        assert!((kpi.mean_load - 0.75).abs() < 1e-10);
        assert_eq!(kpi.days_over_limit, 0);
    }

    #[test]
    fn test_kpi_flat_load() {
        let kpi = LoadKpi::from_counts(&[5, 5, 5, 5], Some(5));
        assert_eq!(kpi.std_dev, 0.0);
        assert_eq!(kpi.days_over_limit, 0);
        assert!(kpi.within_limit(5));
    }

    #[test]
    fn test_kpi_empty_range() {
        let kpi = LoadKpi::calculate(&DayLoad::new(), PresetId(1), 5, 4, Some(1));
        assert_eq!(kpi.total, 0);
        assert_eq!(kpi.max_load, 0);
    }
}
