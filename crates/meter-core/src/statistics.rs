//! Descriptive statistics over meter readings.

use serde::{Deserialize, Serialize};

use crate::models::{CellValue, ConsumptionRecord, SourceCategory};
use crate::numbers::{is_measured, parse_number_strict};

// ── DailyAverage ──────────────────────────────────────────────────────────────

/// Mean of the measured values in a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyAverage {
    pub mean: f64,
    pub sum: f64,
    /// How many values survived the filter.
    pub count_used: usize,
    /// Whether any surviving value was negative (data-quality hint).
    pub had_negative: bool,
}

/// Summarize a column of raw cells.
///
/// Blank, non-numeric, non-finite and zero cells are dropped; the rest are
/// coerced to `f64`. Text must be a whole number (`"12 kWh"` is dropped).
/// An empty or fully filtered input gives all zeros.
pub fn summarize(values: &[CellValue]) -> DailyAverage {
    let numbers: Vec<f64> = values.iter().filter_map(parse_number_strict).collect();
    summarize_values(&numbers)
}

/// Summarize already-numeric values with the same filter as [`summarize`].
pub fn summarize_values(values: &[f64]) -> DailyAverage {
    let measured: Vec<f64> = values.iter().copied().filter(|v| is_measured(*v)).collect();
    if measured.is_empty() {
        return DailyAverage::default();
    }

    let sum: f64 = measured.iter().sum();
    DailyAverage {
        mean: sum / measured.len() as f64,
        sum,
        count_used: measured.len(),
        had_negative: measured.iter().any(|v| *v < 0.0),
    }
}

// ── SummaryStatistics ─────────────────────────────────────────────────────────

/// Plain total of one source's consumption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionTotal {
    pub total: f64,
    pub records: usize,
}

/// Per-source headline numbers shown above the tables and exported as the
/// statistics sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub water_daily: DailyAverage,
    pub energy_daily: DailyAverage,
    pub water_total: ConsumptionTotal,
    pub energy_total: ConsumptionTotal,
}

impl SummaryStatistics {
    /// Compute the summary over a mixed record list.
    pub fn from_records(records: &[ConsumptionRecord]) -> Self {
        Self {
            water_daily: Self::daily_for(records, SourceCategory::Water),
            energy_daily: Self::daily_for(records, SourceCategory::Energy),
            water_total: Self::total_for(records, SourceCategory::Water),
            energy_total: Self::total_for(records, SourceCategory::Energy),
        }
    }

    pub fn daily(&self, source: SourceCategory) -> &DailyAverage {
        match source {
            SourceCategory::Energy => &self.energy_daily,
            SourceCategory::Water => &self.water_daily,
        }
    }

    pub fn total(&self, source: SourceCategory) -> &ConsumptionTotal {
        match source {
            SourceCategory::Energy => &self.energy_total,
            SourceCategory::Water => &self.water_total,
        }
    }

    fn daily_for(records: &[ConsumptionRecord], source: SourceCategory) -> DailyAverage {
        let deltas: Vec<f64> = records
            .iter()
            .filter(|r| r.source == source)
            .map(|r| r.daily_delta)
            .collect();
        let daily = summarize_values(&deltas);
        if daily.had_negative {
            tracing::debug!(?source, "negative daily deltas included in the average");
        }
        daily
    }

    fn total_for(records: &[ConsumptionRecord], source: SourceCategory) -> ConsumptionTotal {
        records
            .iter()
            .filter(|r| r.source == source)
            .fold(ConsumptionTotal::default(), |mut acc, r| {
                if r.consumption.is_finite() {
                    acc.total += r.consumption;
                }
                acc.records += 1;
                acc
            })
    }
}
