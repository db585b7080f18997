//! Month-over-month trend of the average daily delta.

use std::collections::{BTreeMap, BTreeSet};

use meter_core::models::{ConsumptionRecord, MonthKey, SourceCategory};
use serde::Serialize;

use crate::aggregator::{MonthlyAnalysis, MonthlyBucket};

/// Fill in `variation` for every bucket, in chronological order.
///
/// The first month is always 0, as is any month whose predecessor had no
/// positive average delta.
pub fn apply_trend(buckets: &mut BTreeMap<MonthKey, MonthlyBucket>) {
    let mut previous: Option<f64> = None;
    for bucket in buckets.values_mut() {
        bucket.variation = match previous {
            Some(prev) if prev > 0.0 => (bucket.avg_daily_delta - prev) / prev * 100.0,
            _ => 0.0,
        };
        previous = Some(bucket.avg_daily_delta);
    }
}

/// Variation of the most recent month, when there are at least two months.
pub fn latest_variation(buckets: &BTreeMap<MonthKey, MonthlyBucket>) -> Option<f64> {
    if buckets.len() < 2 {
        return None;
    }
    buckets.values().next_back().map(|b| b.variation)
}

// ── Combined series ───────────────────────────────────────────────────────────

/// One month of the combined energy/water trend. Absent sources read 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub month: MonthKey,
    pub energy_avg_delta: f64,
    pub water_avg_delta: f64,
    pub energy_variation: f64,
    pub water_variation: f64,
}

/// Merge both sources into one chronological series.
pub fn combined_trend(analysis: &MonthlyAnalysis) -> Vec<TrendPoint> {
    let months: BTreeSet<MonthKey> = analysis
        .energy
        .keys()
        .chain(analysis.water.keys())
        .copied()
        .collect();

    months
        .into_iter()
        .map(|month| {
            let energy = analysis.energy.get(&month);
            let water = analysis.water.get(&month);
            TrendPoint {
                month,
                energy_avg_delta: energy.map_or(0.0, |b| b.avg_daily_delta),
                water_avg_delta: water.map_or(0.0, |b| b.avg_daily_delta),
                energy_variation: energy.map_or(0.0, |b| b.variation),
                water_variation: water.map_or(0.0, |b| b.variation),
            }
        })
        .collect()
}

/// Raw consumption summed per month for both sources.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub month: MonthKey,
    pub energy: f64,
    pub water: f64,
}

impl MonthlyTotal {
    pub fn get(&self, source: SourceCategory) -> f64 {
        match source {
            SourceCategory::Energy => self.energy,
            SourceCategory::Water => self.water,
        }
    }
}

/// Chronological per-month consumption totals.
pub fn monthly_consumption_totals(records: &[ConsumptionRecord]) -> Vec<MonthlyTotal> {
    let mut map: BTreeMap<MonthKey, MonthlyTotal> = BTreeMap::new();
    for record in records {
        let month = record.month();
        let total = map.entry(month).or_insert(MonthlyTotal {
            month,
            energy: 0.0,
            water: 0.0,
        });
        match record.source {
            SourceCategory::Energy => total.energy += record.consumption,
            SourceCategory::Water => total.water += record.consumption,
        }
    }
    map.into_values().collect()
}
