use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Cells and workbooks ───────────────────────────────────────────────────────

/// A single spreadsheet cell as seen by the normalization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CellValue {
    /// Blank cell, or a cell type the engine does not interpret.
    #[default]
    Empty,
    /// Free-form text, possibly holding a number or a formatted date.
    Text(String),
    /// Numeric cell (also used for spreadsheet date serials).
    Number(f64),
    /// Native calendar date decoded by the spreadsheet backend.
    Date(NaiveDate),
}

impl CellValue {
    /// Convenience constructor for text cells.
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// `true` for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) | CellValue::Date(_) => false,
        }
    }

    /// Borrow the text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%d/%m/%Y")),
        }
    }
}

/// `true` when every cell of `row` is blank (an empty row counts as blank).
pub fn is_blank_row(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_blank)
}

/// One named grid of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// An ordered collection of named sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Look up a sheet by its exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

// ── SourceCategory ────────────────────────────────────────────────────────────

/// The two metered utilities. Closed set: not user-extensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    /// Electricity, supplied by Coelba.
    Energy,
    /// Water, supplied by Embasa.
    Water,
}

impl SourceCategory {
    pub const ALL: [SourceCategory; 2] = [SourceCategory::Energy, SourceCategory::Water];

    /// Measurement unit label.
    pub fn unit(self) -> &'static str {
        match self {
            SourceCategory::Energy => "kWh",
            SourceCategory::Water => "m³",
        }
    }

    /// Unit of a per-day rate, e.g. `"kWh/dia"`.
    pub fn daily_unit(self) -> &'static str {
        match self {
            SourceCategory::Energy => "kWh/dia",
            SourceCategory::Water => "m³/dia",
        }
    }

    /// Short display name.
    pub fn display_name(self) -> &'static str {
        match self {
            SourceCategory::Energy => "Energia",
            SourceCategory::Water => "Água",
        }
    }

    /// Label written to the "Origem" column of the unified table.
    pub fn origin_label(self) -> &'static str {
        match self {
            SourceCategory::Energy => "Coelba (Energia)",
            SourceCategory::Water => "Embasa (Água)",
        }
    }

    /// Name of the provider, used for the original-format sheets.
    pub fn provider(self) -> &'static str {
        match self {
            SourceCategory::Energy => "Coelba",
            SourceCategory::Water => "Embasa",
        }
    }

    /// Parse a user-supplied source name (form field or CLI flag).
    ///
    /// Accepts provider names, Portuguese and English category names,
    /// case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "coelba" | "energia" | "energy" => Some(SourceCategory::Energy),
            "embasa" | "agua" | "água" | "water" => Some(SourceCategory::Water),
            _ => None,
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ── ConsumptionRecord ─────────────────────────────────────────────────────────

/// One normalized meter reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    /// Calendar day of the reading.
    pub date: NaiveDate,
    /// Which utility the reading belongs to.
    pub source: SourceCategory,
    /// Meter reading or period consumption.
    pub consumption: f64,
    /// Day-over-day difference; `0.0` when not measured.
    #[serde(default)]
    pub daily_delta: f64,
}

impl ConsumptionRecord {
    pub fn new(date: NaiveDate, source: SourceCategory, consumption: f64, daily_delta: f64) -> Self {
        Self {
            date,
            source,
            consumption,
            daily_delta,
        }
    }

    /// Calendar month this record falls in.
    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

/// Stable ascending sort by date.
pub fn sort_by_date(records: &mut [ConsumptionRecord]) {
    records.sort_by_key(|r| r.date);
}

// ── MonthKey ──────────────────────────────────────────────────────────────────

/// A calendar month. Orders chronologically (year, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    /// 1-based month number.
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Display label in `MM/YYYY` form.
    pub fn label(&self) -> String {
        format!("{:02}/{}", self.month, self.year)
    }
}

impl fmt::Display for MonthKey {
    /// Zero-padded `YYYY-MM`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
