//! Per-month rollup of consumption records.

use std::collections::BTreeMap;

use meter_core::models::{ConsumptionRecord, MonthKey, SourceCategory};
use meter_core::numbers::is_measured;
use serde::Serialize;

// ── MonthlyBucket ─────────────────────────────────────────────────────────────

/// Statistics for one source in one calendar month.
///
/// Delta statistics only see positive, measured deltas; zero means the day
/// was not measured.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyBucket {
    pub count: u32,
    pub positive_delta_count: u32,
    pub consumption_sum: f64,
    pub delta_sum: f64,
    pub min_consumption: Option<f64>,
    pub max_consumption: Option<f64>,
    pub min_delta: Option<f64>,
    pub max_delta: Option<f64>,
    /// `consumption_sum / count`.
    pub avg_daily_consumption: f64,
    /// `delta_sum / positive_delta_count`, or 0 without measured days.
    pub avg_daily_delta: f64,
    /// Percent change of `avg_daily_delta` vs. the previous month.
    pub variation: f64,
}

impl MonthlyBucket {
    /// Accumulate one record into the running totals.
    pub fn add_record(&mut self, record: &ConsumptionRecord) {
        self.count += 1;
        self.consumption_sum += record.consumption;
        self.min_consumption = Some(fold_min(self.min_consumption, record.consumption));
        self.max_consumption = Some(fold_max(self.max_consumption, record.consumption));

        let delta = record.daily_delta;
        if is_measured(delta) && delta > 0.0 {
            self.positive_delta_count += 1;
            self.delta_sum += delta;
            self.min_delta = Some(fold_min(self.min_delta, delta));
            self.max_delta = Some(fold_max(self.max_delta, delta));
        }
    }

    /// Compute the derived averages from the accumulated totals.
    pub fn finalize(&mut self) {
        self.avg_daily_consumption = if self.count > 0 {
            self.consumption_sum / f64::from(self.count)
        } else {
            0.0
        };
        self.avg_daily_delta = if self.positive_delta_count > 0 {
            self.delta_sum / f64::from(self.positive_delta_count)
        } else {
            0.0
        };
    }

    pub fn min_consumption_or_zero(&self) -> f64 {
        self.min_consumption.unwrap_or(0.0)
    }

    pub fn max_consumption_or_zero(&self) -> f64 {
        self.max_consumption.unwrap_or(0.0)
    }

    pub fn min_delta_or_zero(&self) -> f64 {
        self.min_delta.unwrap_or(0.0)
    }

    pub fn max_delta_or_zero(&self) -> f64 {
        self.max_delta.unwrap_or(0.0)
    }
}

fn fold_min(current: Option<f64>, value: f64) -> f64 {
    current.map_or(value, |c| c.min(value))
}

fn fold_max(current: Option<f64>, value: f64) -> f64 {
    current.map_or(value, |c| c.max(value))
}

// ── MonthlyAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that groups records by calendar month.
pub struct MonthlyAggregator;

impl MonthlyAggregator {
    /// Aggregate the records of `source` by month.
    ///
    /// Records of the other source are ignored. Buckets come back finalized
    /// with `variation` left at 0; see [`crate::trend::apply_trend`].
    pub fn aggregate(
        records: &[ConsumptionRecord],
        source: SourceCategory,
    ) -> BTreeMap<MonthKey, MonthlyBucket> {
        let mut map: BTreeMap<MonthKey, MonthlyBucket> = BTreeMap::new();

        for record in records.iter().filter(|r| r.source == source) {
            map.entry(record.month()).or_default().add_record(record);
        }

        for bucket in map.values_mut() {
            bucket.finalize();
        }
        map
    }
}

// ── MonthlyAnalysis ───────────────────────────────────────────────────────────

/// Monthly buckets for both sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyAnalysis {
    pub energy: BTreeMap<MonthKey, MonthlyBucket>,
    pub water: BTreeMap<MonthKey, MonthlyBucket>,
}

impl MonthlyAnalysis {
    /// Aggregate both sources and fill in month-over-month variations.
    pub fn from_records(records: &[ConsumptionRecord]) -> Self {
        let mut energy = MonthlyAggregator::aggregate(records, SourceCategory::Energy);
        let mut water = MonthlyAggregator::aggregate(records, SourceCategory::Water);
        crate::trend::apply_trend(&mut energy);
        crate::trend::apply_trend(&mut water);
        Self { energy, water }
    }

    pub fn source(&self, source: SourceCategory) -> &BTreeMap<MonthKey, MonthlyBucket> {
        match source {
            SourceCategory::Energy => &self.energy,
            SourceCategory::Water => &self.water,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.energy.is_empty() && self.water.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(y: i32, m: u32, d: u32, source: SourceCategory, consumption: f64, delta: f64) -> ConsumptionRecord {
        ConsumptionRecord::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            source,
            consumption,
            delta,
        )
    }

    #[test]
    fn test_groups_by_month_in_order() {
        let records = vec![
            record(2024, 2, 1, SourceCategory::Energy, 10.0, 1.0),
            record(2023, 12, 31, SourceCategory::Energy, 5.0, 1.0),
            record(2024, 2, 9, SourceCategory::Energy, 20.0, 1.0),
        ];
        let map = MonthlyAggregator::aggregate(&records, SourceCategory::Energy);

        let keys: Vec<String> = map.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["2023-12", "2024-02"]);
        assert_eq!(map[&MonthKey::new(2024, 2)].count, 2);
        assert_eq!(map[&MonthKey::new(2024, 2)].avg_daily_consumption, 15.0);
    }

    #[test]
    fn test_other_source_ignored() {
        let records = vec![
            record(2024, 1, 1, SourceCategory::Energy, 10.0, 1.0),
            record(2024, 1, 1, SourceCategory::Water, 3.0, 0.2),
        ];
        let map = MonthlyAggregator::aggregate(&records, SourceCategory::Water);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&MonthKey::new(2024, 1)].consumption_sum, 3.0);
    }

    #[test]
    fn test_zero_and_negative_deltas_excluded() {
        let records = vec![
            record(2024, 3, 1, SourceCategory::Energy, 100.0, 10.0),
            record(2024, 3, 2, SourceCategory::Energy, 110.0, 0.0),
            record(2024, 3, 3, SourceCategory::Energy, 90.0, 20.0),
            record(2024, 3, 4, SourceCategory::Energy, 95.0, -4.0),
        ];
        let map = MonthlyAggregator::aggregate(&records, SourceCategory::Energy);
        let march = &map[&MonthKey::new(2024, 3)];

        assert_eq!(march.count, 4);
        assert_eq!(march.positive_delta_count, 2);
        assert_eq!(march.delta_sum, 30.0);
        assert_eq!(march.avg_daily_delta, 15.0);
        assert_eq!(march.min_delta, Some(10.0));
        assert_eq!(march.max_delta, Some(20.0));
        assert_eq!(march.min_consumption, Some(90.0));
        assert_eq!(march.max_consumption, Some(110.0));
    }

    #[test]
    fn test_month_without_measured_deltas() {
        let records = vec![record(2024, 5, 1, SourceCategory::Water, 40.0, 0.0)];
        let map = MonthlyAggregator::aggregate(&records, SourceCategory::Water);
        let may = &map[&MonthKey::new(2024, 5)];

        assert_eq!(may.positive_delta_count, 0);
        assert_eq!(may.avg_daily_delta, 0.0);
        assert_eq!(may.min_delta, None);
        assert_eq!(may.min_delta_or_zero(), 0.0);
        assert_eq!(may.max_delta_or_zero(), 0.0);
    }

    #[test]
    fn test_empty_records() {
        assert!(MonthlyAggregator::aggregate(&[], SourceCategory::Energy).is_empty());
        assert!(MonthlyAnalysis::from_records(&[]).is_empty());
    }

    #[test]
    fn test_analysis_march_april_variation() {
        let records = vec![
            record(2024, 3, 1, SourceCategory::Energy, 100.0, 10.0),
            record(2024, 3, 2, SourceCategory::Energy, 100.0, 0.0),
            record(2024, 3, 3, SourceCategory::Energy, 120.0, 20.0),
            record(2024, 4, 1, SourceCategory::Energy, 135.0, 15.0),
        ];
        let analysis = MonthlyAnalysis::from_records(&records);
        let march = &analysis.energy[&MonthKey::new(2024, 3)];
        let april = &analysis.energy[&MonthKey::new(2024, 4)];

        assert_eq!(march.positive_delta_count, 2);
        assert_eq!(march.delta_sum, 30.0);
        assert_eq!(march.avg_daily_delta, 15.0);
        assert_eq!(april.avg_daily_delta, 15.0);
        assert_eq!(april.variation, 0.0);
        assert!(analysis.water.is_empty());
    }
}
