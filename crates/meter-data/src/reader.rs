//! Workbook loading.
//!
//! Spreadsheets (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) go through
//! calamine; `.json` files and directories of `.csv` tables are the two
//! formats this tool exports, so they can be read back in.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use meter_core::error::{MeterError, Result};
use meter_core::models::{CellValue, Sheet, Workbook};
use tracing::{debug, info};

/// Extensions handed to the spreadsheet backend.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Input formats understood by [`read_workbook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Spreadsheet,
    Json,
    CsvDirectory,
}

impl InputFormat {
    /// Pick the format from a case-insensitive file extension.
    pub fn from_extension(ext: &str) -> Result<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Ok(InputFormat::Spreadsheet)
        } else if ext == "json" {
            Ok(InputFormat::Json)
        } else {
            Err(MeterError::UnsupportedFormat(ext))
        }
    }

    /// Format of `path`; directories are read as CSV tables.
    pub fn detect(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(InputFormat::CsvDirectory);
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Read a workbook from disk.
pub fn read_workbook(path: &Path) -> Result<Workbook> {
    let workbook = match InputFormat::detect(path)? {
        InputFormat::CsvDirectory => read_csv_dir(path)?,
        format => {
            let bytes = std::fs::read(path).map_err(|source| MeterError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
            read_workbook_bytes(bytes, format)?
        }
    };

    info!(
        path = %path.display(),
        sheets = workbook.sheets.len(),
        "workbook loaded"
    );
    Ok(workbook)
}

/// Decode an in-memory file of the given format.
///
/// `format` must not be [`InputFormat::CsvDirectory`].
pub fn read_workbook_bytes(bytes: Vec<u8>, format: InputFormat) -> Result<Workbook> {
    match format {
        InputFormat::Spreadsheet => read_spreadsheet(bytes),
        InputFormat::Json => Ok(serde_json::from_slice(&bytes)?),
        InputFormat::CsvDirectory => Err(MeterError::UnsupportedFormat(
            "a CSV directory cannot be read from bytes".to_string(),
        )),
    }
}

/// Read every `.csv` file of `dir` as one sheet named after the file stem.
///
/// Sheets are ordered by file name. Empty fields become empty cells.
pub fn read_csv_dir(dir: &Path) -> Result<Workbook> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|source| MeterError::FileRead {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();

    let mut sheets = Vec::with_capacity(files.len());
    for file in &files {
        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(file)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::text(field)
                        }
                    })
                    .collect(),
            );
        }
        debug!(sheet = %name, rows = rows.len(), "csv table read");
        sheets.push(Sheet::new(name, rows));
    }

    if sheets.is_empty() {
        return Err(MeterError::UnsupportedFormat(format!(
            "no .csv files in {}",
            dir.display()
        )));
    }
    Ok(Workbook::new(sheets))
}

// ── Spreadsheet backend ───────────────────────────────────────────────────────

fn read_spreadsheet(bytes: Vec<u8>) -> Result<Workbook> {
    let mut book = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| MeterError::Workbook(e.to_string()))?;

    let mut sheets = Vec::new();
    for name in book.sheet_names() {
        let range = book
            .worksheet_range(&name)
            .map_err(|e| MeterError::Workbook(format!("sheet '{name}': {e}")))?;
        let rows = range_to_rows(&range);
        debug!(sheet = %name, rows = rows.len(), "sheet decoded");
        sheets.push(Sheet::new(name, rows));
    }
    Ok(Workbook::new(sheets))
}

/// Convert a calamine range to a grid of rows.
///
/// The grid starts at the range's first used cell, not at A1, so a sheet
/// whose table begins at `B2` still has its header in row 0, column 0.
pub fn range_to_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect()
}

/// Map one calamine cell onto the engine's cell model.
pub fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => CellValue::Date(ndt.date()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        _ => CellValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract_original;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use chrono::NaiveDate;
    use meter_core::models::SourceCategory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_extension("XLSX").unwrap(), InputFormat::Spreadsheet);
        assert_eq!(InputFormat::from_extension(".ods").unwrap(), InputFormat::Spreadsheet);
        assert_eq!(InputFormat::from_extension("json").unwrap(), InputFormat::Json);
        assert!(matches!(
            InputFormat::from_extension("txt"),
            Err(MeterError::UnsupportedFormat(ext)) if ext == "txt"
        ));
    }

    #[test]
    fn test_convert_cell_mapping() {
        assert_eq!(convert_cell(&Data::Float(1.5)), CellValue::Number(1.5));
        assert_eq!(convert_cell(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(
            convert_cell(&Data::String("Dia".into())),
            CellValue::text("Dia")
        );
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2024-01-02".into())),
            CellValue::text("2024-01-02")
        );
        assert_eq!(convert_cell(&Data::Bool(true)), CellValue::Empty);
        assert_eq!(convert_cell(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn test_convert_cell_datetime() {
        let serial = ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(
            convert_cell(&Data::DateTime(serial)),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );

        let with_time = ExcelDateTime::new(45292.75, ExcelDateTimeType::DateTime, false);
        assert_eq!(
            convert_cell(&Data::DateTime(with_time)),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );

        let out_of_range = ExcelDateTime::new(1e10, ExcelDateTimeType::DateTime, false);
        assert_eq!(
            convert_cell(&Data::DateTime(out_of_range)),
            CellValue::Number(1e10)
        );
    }

    #[test]
    fn test_offset_range_header_is_row_zero() {
        let mut range: Range<Data> = Range::new((1, 1), (3, 3));
        range.set_value((1, 1), Data::String("Dia".into()));
        range.set_value((1, 2), Data::String("Medicao".into()));
        range.set_value((1, 3), Data::String("Dif.dia".into()));
        range.set_value((2, 1), Data::String("01/03/2024".into()));
        range.set_value((2, 2), Data::Float(1000.0));
        range.set_value((2, 3), Data::Float(0.0));
        range.set_value((3, 1), Data::String("02/03/2024".into()));
        range.set_value((3, 2), Data::Float(1012.5));
        range.set_value((3, 3), Data::Float(12.5));

        let rows = range_to_rows(&range);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], CellValue::text("Dia"));
        assert_eq!(rows[2][2], CellValue::Number(12.5));

        let (records, skipped) =
            extract_original(&Sheet::new("Coelba", rows), SourceCategory::Energy);
        assert_eq!(skipped, 0);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].consumption, 1012.5);
        assert_eq!(records[1].daily_delta, 12.5);
    }

    #[test]
    fn test_empty_range() {
        let range: Range<Data> = Range::empty();
        assert!(range_to_rows(&range).is_empty());
    }

    #[test]
    fn test_read_json_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.json");
        let wb = Workbook::new(vec![Sheet::new(
            "Coelba",
            vec![vec![CellValue::text("Dia"), CellValue::Number(3.0)]],
        )]);
        fs::write(&path, serde_json::to_vec(&wb).unwrap()).unwrap();

        assert_eq!(read_workbook(&path).unwrap(), wb);
    }

    #[test]
    fn test_read_csv_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Embasa.csv"), "Dia,Consumo,Dif_dia\n01/01/2024,10,\n").unwrap();
        fs::write(dir.path().join("Coelba.csv"), "Dia,Medicao,Dif.dia\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let wb = read_workbook(dir.path()).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Coelba", "Embasa"]);
        let embasa = wb.sheet("Embasa").unwrap();
        assert_eq!(embasa.rows[1][0], CellValue::text("01/01/2024"));
        assert_eq!(embasa.rows[1][2], CellValue::Empty);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.xlsx");
        match read_workbook(&path) {
            Err(MeterError::FileRead { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected FileRead, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_spreadsheet_is_workbook_error() {
        let result = read_workbook_bytes(b"not a zip".to_vec(), InputFormat::Spreadsheet);
        assert!(matches!(result, Err(MeterError::Workbook(_))));
    }
}
