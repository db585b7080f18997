//! Main analysis pipeline.
//!
//! Turns a workbook (or an already-normalized record list) into an
//! [`AnalysisResult`]: sorted records, monthly buckets with trends, the
//! summary statistics and the chart-ready series.

use chrono::Utc;
use meter_core::error::{MeterError, Result};
use meter_core::models::{sort_by_date, ConsumptionRecord, SourceCategory, Workbook};
use meter_core::statistics::SummaryStatistics;
use tracing::{info, warn};

use crate::aggregator::MonthlyAnalysis;
use crate::detector::SheetAssignment;
use crate::extractor::{extract_workbook, ExtractionMode};
use crate::trend::{
    combined_trend, latest_variation, monthly_consumption_totals, MonthlyTotal, TrendPoint,
};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Extraction strategy, or `None` for results built from records.
    pub mode: Option<String>,
    pub records_processed: usize,
    pub energy_records: usize,
    pub water_records: usize,
    /// Rows dropped during extraction.
    pub skipped_rows: usize,
    /// Number of distinct months across both sources.
    pub months_analyzed: usize,
    /// Wall-clock seconds spent aggregating.
    pub transform_time_seconds: f64,
}

/// The complete output of the pipeline.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// All records, ascending by date.
    pub records: Vec<ConsumptionRecord>,
    pub monthly: MonthlyAnalysis,
    pub summary: SummaryStatistics,
    pub trend: Vec<TrendPoint>,
    pub monthly_totals: Vec<MonthlyTotal>,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Records of one source, in date order.
    pub fn records_for(&self, source: SourceCategory) -> impl Iterator<Item = &ConsumptionRecord> {
        self.records.iter().filter(move |r| r.source == source)
    }

    /// Last month's variation for `source`, when it has two or more months.
    pub fn latest_variation(&self, source: SourceCategory) -> Option<f64> {
        latest_variation(self.monthly.source(source))
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline on a workbook.
///
/// 1. Detect the layout and extract records.
/// 2. Reject the import when nothing survived extraction.
/// 3. Aggregate, trend and summarize via [`analyze_records`].
pub fn analyze_workbook(workbook: &Workbook) -> Result<AnalysisResult> {
    let extraction = extract_workbook(workbook)?;
    if extraction.records.is_empty() {
        warn!(skipped = extraction.skipped_rows, "workbook produced no records");
        return Err(MeterError::NoValidRecords);
    }

    let mode = match extraction.mode {
        ExtractionMode::Unified => "unified",
        ExtractionMode::DualSheet(SheetAssignment::Keyword) => "dual-sheet (keyword)",
        ExtractionMode::DualSheet(SheetAssignment::Positional) => "dual-sheet (positional)",
    };

    let mut result = analyze_records(extraction.records);
    result.metadata.mode = Some(mode.to_string());
    result.metadata.skipped_rows = extraction.skipped_rows;
    Ok(result)
}

/// Aggregate an arbitrary record list. Records are re-sorted by date.
pub fn analyze_records(mut records: Vec<ConsumptionRecord>) -> AnalysisResult {
    let start = std::time::Instant::now();
    sort_by_date(&mut records);

    let monthly = MonthlyAnalysis::from_records(&records);
    let summary = SummaryStatistics::from_records(&records);
    let trend = combined_trend(&monthly);
    let monthly_totals = monthly_consumption_totals(&records);

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        mode: None,
        records_processed: records.len(),
        energy_records: summary.energy_total.records,
        water_records: summary.water_total.records,
        skipped_rows: 0,
        months_analyzed: trend.len(),
        transform_time_seconds: start.elapsed().as_secs_f64(),
    };

    info!(
        records = metadata.records_processed,
        months = metadata.months_analyzed,
        "analysis complete"
    );

    AnalysisResult {
        records,
        monthly,
        summary,
        trend,
        monthly_totals,
        metadata,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
