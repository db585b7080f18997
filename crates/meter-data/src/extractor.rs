//! Record extraction from cell grids.
//!
//! Two strategies share one output shape: the unified table (one row per
//! reading with an origin label) and the providers' original sheets (one
//! sheet per utility with loosely labelled columns). Rows that cannot be
//! read are skipped, never reported as errors; each skip is logged at
//! `debug` with its reason.

use meter_core::dates::normalize_date;
use meter_core::error::Result;
use meter_core::models::{
    is_blank_row, sort_by_date, CellValue, ConsumptionRecord, Sheet, SourceCategory, Workbook,
};
use meter_core::numbers::parse_number;
use tracing::{debug, info};

use crate::detector::{detect_layout, fold_name, SheetAssignment, WorkbookLayout};

/// Column of the consumption reading in original-format sheets.
const CONSUMPTION_COLUMN: usize = 1;

/// Delta column assumed when an original sheet has no recognisable header.
const DEFAULT_DELTA_COLUMN: usize = 2;

const WATER_ORIGIN_KEYWORDS: &[&str] = &["embasa", "agua"];
const ENERGY_ORIGIN_KEYWORDS: &[&str] = &["coelba", "energia"];

// ── Public types ──────────────────────────────────────────────────────────────

/// Which strategy produced an [`Extraction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    Unified,
    DualSheet(SheetAssignment),
}

/// Records extracted from one workbook.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub mode: ExtractionMode,
    /// Normalized records, ascending by date.
    pub records: Vec<ConsumptionRecord>,
    /// Number of non-header rows that were skipped.
    pub skipped_rows: usize,
}

impl Extraction {
    /// Record count for one source.
    pub fn count(&self, source: SourceCategory) -> usize {
        self.records.iter().filter(|r| r.source == source).count()
    }
}

#[derive(Debug, Clone, Copy)]
enum SkipReason {
    Blank,
    Date,
    Consumption,
    Origin,
}

/// Detect the layout of `workbook` and extract every readable record.
///
/// Fails only when the layout cannot be identified; an empty result is
/// returned as-is and left for the caller to judge.
pub fn extract_workbook(workbook: &Workbook) -> Result<Extraction> {
    let extraction = match detect_layout(workbook)? {
        WorkbookLayout::Unified(sheet) => {
            let (records, skipped_rows) = extract_unified(sheet);
            Extraction {
                mode: ExtractionMode::Unified,
                records,
                skipped_rows,
            }
        }
        WorkbookLayout::DualSheet {
            energy,
            water,
            assignment,
        } => {
            let (mut records, energy_skipped) = extract_original(energy, SourceCategory::Energy);
            let (water_records, water_skipped) = extract_original(water, SourceCategory::Water);
            records.extend(water_records);
            sort_by_date(&mut records);
            Extraction {
                mode: ExtractionMode::DualSheet(assignment),
                records,
                skipped_rows: energy_skipped + water_skipped,
            }
        }
    };

    info!(
        mode = ?extraction.mode,
        energy = extraction.count(SourceCategory::Energy),
        water = extraction.count(SourceCategory::Water),
        skipped = extraction.skipped_rows,
        "records extracted"
    );
    Ok(extraction)
}

// ── Unified strategy ──────────────────────────────────────────────────────────

/// Extract rows shaped `[date, origin, total consumption, daily delta]`.
///
/// The first row is a header. Rows whose origin names neither utility, or
/// whose date cannot be read, are skipped. An unreadable total counts as 0.
///
/// Returns the records sorted by date and the number of skipped rows.
pub fn extract_unified(sheet: &Sheet) -> (Vec<ConsumptionRecord>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (idx, row) in sheet.rows.iter().enumerate().skip(1) {
        match unified_row(row) {
            Ok(record) => records.push(record),
            Err(reason) => {
                skipped += 1;
                debug!(sheet = %sheet.name, row = idx, ?reason, "row skipped");
            }
        }
    }

    sort_by_date(&mut records);
    (records, skipped)
}

fn unified_row(row: &[CellValue]) -> std::result::Result<ConsumptionRecord, SkipReason> {
    if is_blank_row(row) {
        return Err(SkipReason::Blank);
    }

    let date = normalize_date(cell(row, 0)).ok_or(SkipReason::Date)?;
    let source = source_from_origin(cell(row, 1)).ok_or(SkipReason::Origin)?;
    let consumption = parse_number(cell(row, 2)).unwrap_or(0.0);
    let daily_delta = parse_number(cell(row, 3)).unwrap_or(0.0);

    Ok(ConsumptionRecord::new(date, source, consumption, daily_delta))
}

/// Map an origin label such as `"Embasa (Água)"` to its utility.
pub fn source_from_origin(cell: &CellValue) -> Option<SourceCategory> {
    let folded = fold_name(&cell.to_string());
    if WATER_ORIGIN_KEYWORDS.iter().any(|k| folded.contains(k)) {
        Some(SourceCategory::Water)
    } else if ENERGY_ORIGIN_KEYWORDS.iter().any(|k| folded.contains(k)) {
        Some(SourceCategory::Energy)
    } else {
        None
    }
}

// ── Original (dual-sheet) strategy ────────────────────────────────────────────

/// Column roles inferred from an original-format sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date: usize,
    pub daily_delta: Option<usize>,
    /// First data row (1 when a header row was recognised).
    pub start_row: usize,
}

/// Infer date and delta columns from the first row of `rows`.
///
/// A header equal to `dia` or containing `data` marks the date column; one
/// equal to `dif_dia`/`dif.dia` or containing `dif` marks the delta column.
/// Either marks row 0 as a header. Without a delta header, a sheet whose
/// second row has at least three cells uses column 2.
pub fn infer_columns(rows: &[Vec<CellValue>]) -> ColumnLayout {
    let mut layout = ColumnLayout {
        date: 0,
        daily_delta: None,
        start_row: 0,
    };
    let mut date_found = false;

    if let Some(header) = rows.first() {
        for (idx, cell) in header.iter().enumerate() {
            let token = cell.to_string().trim().to_lowercase();
            if token == "dia" || token.contains("data") {
                if !date_found {
                    layout.date = idx;
                    date_found = true;
                }
                layout.start_row = 1;
            } else if token == "dif_dia" || token == "dif.dia" || token.contains("dif") {
                layout.daily_delta.get_or_insert(idx);
                layout.start_row = 1;
            }
        }
    }

    if layout.daily_delta.is_none() && rows.get(1).is_some_and(|r| r.len() >= 3) {
        layout.daily_delta = Some(DEFAULT_DELTA_COLUMN);
    }

    layout
}

/// Extract one provider sheet; every record gets `source`.
///
/// Returns the records sorted by date and the number of skipped rows.
pub fn extract_original(sheet: &Sheet, source: SourceCategory) -> (Vec<ConsumptionRecord>, usize) {
    let layout = infer_columns(&sheet.rows);
    debug!(sheet = %sheet.name, ?source, ?layout, "column layout inferred");

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (idx, row) in sheet.rows.iter().enumerate().skip(layout.start_row) {
        match original_row(row, &layout, source) {
            Ok(record) => records.push(record),
            Err(reason) => {
                skipped += 1;
                debug!(sheet = %sheet.name, row = idx, ?reason, "row skipped");
            }
        }
    }

    sort_by_date(&mut records);
    (records, skipped)
}

fn original_row(
    row: &[CellValue],
    layout: &ColumnLayout,
    source: SourceCategory,
) -> std::result::Result<ConsumptionRecord, SkipReason> {
    if is_blank_row(row) {
        return Err(SkipReason::Blank);
    }

    let date = normalize_date(cell(row, layout.date)).ok_or(SkipReason::Date)?;
    let consumption = parse_number(cell(row, CONSUMPTION_COLUMN)).ok_or(SkipReason::Consumption)?;
    let daily_delta = layout
        .daily_delta
        .and_then(|idx| parse_number(cell(row, idx)))
        .unwrap_or(0.0);

    Ok(ConsumptionRecord::new(date, source, consumption, daily_delta))
}

/// Cell at `idx`, or an empty cell past the end of a short row.
fn cell(row: &[CellValue], idx: usize) -> &CellValue {
    static EMPTY: CellValue = CellValue::Empty;
    row.get(idx).unwrap_or(&EMPTY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use meter_core::error::MeterError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn t(s: &str) -> CellValue {
        CellValue::text(s)
    }

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    // ── unified ───────────────────────────────────────────────────────────────

    fn unified_sheet(rows: Vec<Vec<CellValue>>) -> Sheet {
        let mut all = vec![vec![
            t("Data"),
            t("Origem"),
            t("Consumo Total"),
            t("Dif_dia"),
            t("Unidade"),
        ]];
        all.extend(rows);
        Sheet::new("Dados de Consumo", all)
    }

    #[test]
    fn test_unified_basic_rows() {
        let sheet = unified_sheet(vec![
            vec![t("02/03/2024"), t("Coelba (Energia)"), n(1200.5), n(12.0), t("kWh")],
            vec![t("01/03/2024"), t("Embasa (Água)"), n(310.0), n(0.4), t("m³")],
        ]);
        let (records, skipped) = extract_unified(&sheet);

        assert_eq!(skipped, 0);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(2024, 3, 1));
        assert_eq!(records[0].source, SourceCategory::Water);
        assert_eq!(records[1].source, SourceCategory::Energy);
        assert_eq!(records[1].consumption, 1200.5);
        assert_eq!(records[1].daily_delta, 12.0);
    }

    #[test]
    fn test_unified_skips_blank_and_unknown_origin() {
        let sheet = unified_sheet(vec![
            vec![CellValue::Empty, t(""), CellValue::Empty],
            vec![t("01/03/2024"), t("Gás"), n(5.0), n(1.0)],
            vec![t("nope"), t("Coelba"), n(5.0), n(1.0)],
            vec![t("03/03/2024"), t("energia"), n(7.0)],
        ]);
        let (records, skipped) = extract_unified(&sheet);

        // Partial success: three rows dropped, the last one kept.
        assert_eq!(skipped, 3);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].daily_delta, 0.0);
    }

    #[test]
    fn test_unified_unreadable_total_is_zero() {
        let sheet = unified_sheet(vec![vec![t("01/03/2024"), t("Coelba (Energia)"), t("n/d"), t("3,5")]]);
        let (records, _) = extract_unified(&sheet);
        assert_eq!(records[0].consumption, 0.0);
        assert_eq!(records[0].daily_delta, 3.5);
    }

    #[test]
    fn test_source_from_origin() {
        assert_eq!(source_from_origin(&t("EMBASA (ÁGUA)")), Some(SourceCategory::Water));
        assert_eq!(source_from_origin(&t("Coelba (Energia)")), Some(SourceCategory::Energy));
        assert_eq!(source_from_origin(&t("água")), Some(SourceCategory::Water));
        assert_eq!(source_from_origin(&CellValue::Empty), None);
    }

    // ── column inference ──────────────────────────────────────────────────────

    #[test]
    fn test_infer_columns_with_headers() {
        let rows = vec![vec![t("Dia"), t("Medicao"), t("Dif.dia")]];
        assert_eq!(
            infer_columns(&rows),
            ColumnLayout {
                date: 0,
                daily_delta: Some(2),
                start_row: 1,
            }
        );
    }

    #[test]
    fn test_infer_columns_date_elsewhere() {
        let rows = vec![vec![t("Obs"), t("Leitura"), t("x"), t("Data da leitura"), t("DIF")]];
        let layout = infer_columns(&rows);
        assert_eq!(layout.date, 3);
        assert_eq!(layout.daily_delta, Some(4));
        assert_eq!(layout.start_row, 1);
    }

    #[test]
    fn test_infer_columns_headerless_default_delta() {
        let rows = vec![
            vec![n(45292.0), n(100.0), n(0.0)],
            vec![n(45293.0), n(110.0), n(10.0)],
        ];
        assert_eq!(
            infer_columns(&rows),
            ColumnLayout {
                date: 0,
                daily_delta: Some(2),
                start_row: 0,
            }
        );
    }

    #[test]
    fn test_infer_columns_two_columns_no_delta() {
        let rows = vec![vec![t("Dia"), t("Consumo")], vec![n(45292.0), n(100.0)]];
        let layout = infer_columns(&rows);
        assert_eq!(layout.daily_delta, None);
        assert_eq!(layout.start_row, 1);
    }

    // ── original ──────────────────────────────────────────────────────────────

    #[test]
    fn test_original_sheet_forced_source_and_sorted() {
        let sheet = Sheet::new(
            "Coelba",
            vec![
                vec![t("Dia"), t("Medicao"), t("Dif.dia")],
                vec![t("02/01/2024"), n(1010.0), n(10.0)],
                vec![CellValue::Date(date(2024, 1, 1)), n(1000.0), CellValue::Empty],
                vec![n(45294.0), t("1025"), t("15")],
            ],
        );
        let (records, skipped) = extract_original(&sheet, SourceCategory::Energy);

        assert_eq!(skipped, 0);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.source == SourceCategory::Energy));
        assert_eq!(records[0].date, date(2024, 1, 1));
        assert_eq!(records[0].daily_delta, 0.0);
        assert_eq!(records[2].date, date(2024, 1, 3));
        assert_eq!(records[2].consumption, 1025.0);
        assert_eq!(records[2].daily_delta, 15.0);
    }

    #[test]
    fn test_original_skips_bad_rows() {
        let sheet = Sheet::new(
            "Embasa",
            vec![
                vec![t("Dia"), t("Consumo"), t("Dif_dia")],
                vec![t("sem data"), n(10.0), n(1.0)],
                vec![t("05/01/2024"), t("---"), n(1.0)],
                vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
                vec![t("06/01/2024"), n(12.0), t("x")],
            ],
        );
        let (records, skipped) = extract_original(&sheet, SourceCategory::Water);

        assert_eq!(skipped, 3);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].daily_delta, 0.0);
    }

    // ── workbook ──────────────────────────────────────────────────────────────

    #[test]
    fn test_extract_workbook_dual_sheet() {
        let wb = Workbook::new(vec![
            Sheet::new(
                "Jan-Dez Luz",
                vec![
                    vec![t("Dia"), t("Medicao"), t("Dif.dia")],
                    vec![t("01/01/2024"), n(100.0), n(5.0)],
                ],
            ),
            Sheet::new(
                "Jan-Dez Água",
                vec![
                    vec![t("Dia"), t("Consumo"), t("Dif_dia")],
                    vec![t("01/01/2024"), n(20.0), n(0.3)],
                    vec![t("02/01/2024"), n(20.3), n(0.3)],
                ],
            ),
        ]);
        let extraction = extract_workbook(&wb).unwrap();

        assert_eq!(
            extraction.mode,
            ExtractionMode::DualSheet(SheetAssignment::Keyword)
        );
        assert_eq!(extraction.count(SourceCategory::Energy), 1);
        assert_eq!(extraction.count(SourceCategory::Water), 2);
        assert_eq!(extraction.records[0].source, SourceCategory::Energy);
    }

    #[test]
    fn test_extract_workbook_dual_sheet_merged_by_date() {
        let wb = Workbook::new(vec![
            Sheet::new(
                "Coelba",
                vec![
                    vec![t("Dia"), t("Medicao"), t("Dif.dia")],
                    vec![t("10/03/2024"), n(1100.0), n(10.0)],
                ],
            ),
            Sheet::new(
                "Embasa",
                vec![
                    vec![t("Dia"), t("Consumo"), t("Dif_dia")],
                    vec![t("01/03/2024"), n(50.0), n(0.5)],
                    vec![t("10/03/2024"), n(54.5), n(0.5)],
                ],
            ),
        ]);
        let records = extract_workbook(&wb).unwrap().records;

        let order: Vec<_> = records.iter().map(|r| (r.date, r.source)).collect();
        assert_eq!(
            order,
            vec![
                (date(2024, 3, 1), SourceCategory::Water),
                (date(2024, 3, 10), SourceCategory::Energy),
                (date(2024, 3, 10), SourceCategory::Water),
            ]
        );
    }

    #[test]
    fn test_extract_workbook_unidentified() {
        let wb = Workbook::new(vec![Sheet::new("Coelba", vec![])]);
        assert!(matches!(
            extract_workbook(&wb),
            Err(MeterError::SheetsNotIdentified)
        ));
    }
}
