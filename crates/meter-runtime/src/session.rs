//! In-memory session state.
//!
//! A [`Session`] holds the current records together with everything derived
//! from them. Every change (an import, a manual entry, a clear) builds a
//! complete [`SessionState`] first and then swaps it in through
//! [`Session::replace`], so a failed import or a rejected entry leaves the
//! previous state untouched.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use meter_core::error::{MeterError, Result};
use meter_core::models::{ConsumptionRecord, Workbook};
use meter_data::analysis::{analyze_records, analyze_workbook, AnalysisResult};
use meter_data::export::{ExportFormat, ExportWorkbook};
use serde::Serialize;

use crate::entry::ManualEntry;
use crate::loader::load_workbook;

// ── SessionState ──────────────────────────────────────────────────────────────

/// Where the current records came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Provenance {
    /// Last imported file, if any.
    pub source_path: Option<PathBuf>,
    /// Manual entries accepted since that import.
    pub manual_entries: usize,
}

/// Immutable snapshot of everything the session knows.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    analysis: Option<AnalysisResult>,
    provenance: Provenance,
}

impl SessionState {
    /// Derive a state from a record list.
    pub fn from_records(records: Vec<ConsumptionRecord>, provenance: Provenance) -> Self {
        if records.is_empty() {
            return Self {
                analysis: None,
                provenance,
            };
        }
        Self {
            analysis: Some(analyze_records(records)),
            provenance,
        }
    }

    /// All records, ascending by date. Empty before the first import.
    pub fn records(&self) -> &[ConsumptionRecord] {
        self.analysis
            .as_ref()
            .map(|a| a.records.as_slice())
            .unwrap_or_default()
    }

    /// Monthly analysis, summary and trend series, when there is data.
    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn is_empty(&self) -> bool {
        self.analysis.is_none()
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Owner of the current [`SessionState`].
///
/// # Example
/// ```no_run
/// use meter_runtime::entry::ManualEntry;
/// use meter_runtime::session::Session;
///
/// let mut session = Session::new();
/// session.add_manual_entry(&ManualEntry::new("01/03/2024", "coelba", "12")).unwrap();
/// assert_eq!(session.state().records().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    /// When the state was last replaced.
    updated_at: Option<Instant>,
    /// Description of the last rejected import or entry.
    last_error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Public API ────────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Swap in a fully built state and return the previous one.
    pub fn replace(&mut self, next: SessionState) -> SessionState {
        tracing::debug!(records = next.records().len(), "session state replaced");
        self.updated_at = Some(Instant::now());
        self.last_error = None;
        std::mem::replace(&mut self.state, next)
    }

    /// Replace the session with the records of `workbook`.
    ///
    /// Fatal import errors (unidentified sheets, no valid records) are
    /// returned and the current state is kept.
    pub fn ingest_workbook(&mut self, workbook: &Workbook, path: Option<&Path>) -> Result<&SessionState> {
        let analysis = match analyze_workbook(workbook) {
            Ok(analysis) => analysis,
            Err(e) => return Err(self.reject(e)),
        };

        tracing::info!(
            records = analysis.records.len(),
            mode = analysis.metadata.mode.as_deref().unwrap_or("-"),
            "import accepted"
        );
        self.replace(SessionState {
            analysis: Some(analysis),
            provenance: Provenance {
                source_path: path.map(Path::to_path_buf),
                manual_entries: 0,
            },
        });
        Ok(&self.state)
    }

    /// Load `path` asynchronously and ingest it.
    pub async fn import_file(&mut self, path: &Path) -> Result<&SessionState> {
        let workbook = match load_workbook(path).await {
            Ok(workbook) => workbook,
            Err(e) => return Err(self.reject(e)),
        };
        self.ingest_workbook(&workbook, Some(path))
    }

    /// Validate `entry`, merge it into the records and rebuild everything.
    pub fn add_manual_entry(&mut self, entry: &ManualEntry) -> Result<ConsumptionRecord> {
        let record = match entry.validate() {
            Ok(record) => record,
            Err(e) => return Err(self.reject(e)),
        };

        let mut records = self.state.records().to_vec();
        records.push(record.clone());

        let mut provenance = self.state.provenance.clone();
        provenance.manual_entries += 1;

        tracing::info!(date = %record.date, source = ?record.source, "manual entry accepted");
        self.replace(SessionState::from_records(records, provenance));
        Ok(record)
    }

    /// Drop all data.
    pub fn clear(&mut self) {
        self.replace(SessionState::default());
    }

    /// Build the report from the current state.
    pub fn export_workbook(&self) -> Result<ExportWorkbook> {
        let analysis = self.state.analysis().ok_or(MeterError::NoData)?;
        ExportWorkbook::build(&analysis.records, &analysis.monthly, &analysis.summary)
    }

    /// Write the report into `dir`, named after `date`.
    pub fn export_to(&self, dir: &Path, format: ExportFormat, date: NaiveDate) -> Result<PathBuf> {
        self.export_workbook()?.write(dir, format, date)
    }

    /// Time since the state was last replaced.
    pub fn age(&self) -> Option<std::time::Duration> {
        self.updated_at.map(|ts| ts.elapsed())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn reject(&mut self, error: MeterError) -> MeterError {
        tracing::warn!(error = %error, "input rejected; keeping current state");
        self.last_error = Some(error.to_string());
        error
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
