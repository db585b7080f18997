//! Report export.
//!
//! The report is a workbook of five tables: the unified record table (which
//! the importer recognises, so an export can be loaded back), one table per
//! provider in its original column layout, the summary statistics and the
//! monthly analysis. It is written as an `.xlsx` workbook, as one JSON
//! workbook, or as a directory holding one CSV file per table.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use meter_core::error::{MeterError, Result};
use meter_core::formatting::{format_date_br, round_to};
use meter_core::models::{CellValue, ConsumptionRecord, Sheet, SourceCategory, Workbook};
use meter_core::statistics::SummaryStatistics;
use tracing::info;

use crate::aggregator::MonthlyAnalysis;
use crate::detector::UNIFIED_SHEET_NAME;

pub const STATISTICS_SHEET_NAME: &str = "Estatísticas";
pub const MONTHLY_SHEET_NAME: &str = "Análise Mensal";

const UNIFIED_HEADERS: &[&str] = &["Data", "Origem", "Consumo Total", "Dif_dia", "Unidade"];
const ENERGY_HEADERS: &[&str] = &["Dia", "Medicao", "Dif.dia"];
const WATER_HEADERS: &[&str] = &["Dia", "Consumo", "Dif_dia"];
const STATISTICS_HEADERS: &[&str] = &[
    "Estatística",
    "Valor",
    "Unidade",
    "Soma Total",
    "Valores Utilizados",
];
const MONTHLY_HEADERS: &[&str] = &[
    "Tipo",
    "Mês/Ano",
    "Média Diária (Dif_dia)",
    "Total Dif_dia",
    "Dias com Dados",
    "Variação % vs Mês Anterior",
    "Maior Dif_dia",
    "Menor Dif_dia",
    "Unidade",
];

/// Decimal places kept in numeric export cells.
const EXPORT_DECIMALS: u32 = 2;

/// On-disk shape of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" => Some(ExportFormat::Xlsx),
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    /// Resolve the `export_format` setting, rejecting unknown values.
    pub fn from_setting(s: &str) -> Result<Self> {
        Self::parse(s)
            .ok_or_else(|| MeterError::Config(format!("unknown export format '{}'", s.trim())))
    }
}

/// File stem of the report for `date`: `relatorio_consumo_<YYYY-MM-DD>`.
pub fn export_stem(date: NaiveDate) -> String {
    format!("relatorio_consumo_{}", date.format("%Y-%m-%d"))
}

// ── ExportWorkbook ────────────────────────────────────────────────────────────

/// The five-table report, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportWorkbook {
    workbook: Workbook,
}

impl ExportWorkbook {
    /// Build the report tables.
    ///
    /// Fails with [`MeterError::NoData`] when there are no records.
    pub fn build(
        records: &[ConsumptionRecord],
        monthly: &MonthlyAnalysis,
        summary: &SummaryStatistics,
    ) -> Result<Self> {
        if records.is_empty() {
            return Err(MeterError::NoData);
        }

        let workbook = Workbook::new(vec![
            unified_sheet(records),
            original_sheet(records, SourceCategory::Energy),
            original_sheet(records, SourceCategory::Water),
            statistics_sheet(summary),
            monthly_sheet(monthly),
        ]);
        Ok(Self { workbook })
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn into_workbook(self) -> Workbook {
        self.workbook
    }

    /// Write the report into `dir` and return the path created.
    pub fn write(&self, dir: &Path, format: ExportFormat, date: NaiveDate) -> Result<PathBuf> {
        let path = match format {
            ExportFormat::Xlsx => self.write_xlsx(dir, date)?,
            ExportFormat::Json => self.write_json(dir, date)?,
            ExportFormat::Csv => self.write_csv(dir, date)?,
        };
        info!(path = %path.display(), ?format, "report exported");
        Ok(path)
    }

    /// Write `<dir>/relatorio_consumo_<date>.xlsx`, one worksheet per table.
    pub fn write_xlsx(&self, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.xlsx", export_stem(date)));

        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        for sheet in &self.workbook.sheets {
            let ws = book
                .new_sheet(sheet.name.as_str())
                .map_err(|e| MeterError::WorkbookWrite(format!("{}: {e}", sheet.name)))?;
            for (r, row) in sheet.rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    let cell = ws.get_cell_mut((c as u32 + 1, r as u32 + 1));
                    match value {
                        CellValue::Empty => {}
                        CellValue::Number(n) => {
                            cell.set_value_number(*n);
                        }
                        CellValue::Text(t) => {
                            cell.set_value(t.as_str());
                        }
                        CellValue::Date(d) => {
                            cell.set_value(format_date_br(*d));
                        }
                    }
                }
            }
        }

        umya_spreadsheet::writer::xlsx::write(&book, &path)
            .map_err(|e| MeterError::WorkbookWrite(e.to_string()))?;
        Ok(path)
    }

    /// Write `<dir>/relatorio_consumo_<date>.json`.
    pub fn write_json(&self, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", export_stem(date)));
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.workbook)?)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Write `<dir>/relatorio_consumo_<date>/<table>.csv`, one file per table.
    pub fn write_csv(&self, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        let out = dir.join(export_stem(date));
        fs::create_dir_all(&out)?;

        for sheet in &self.workbook.sheets {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(out.join(format!("{}.csv", sheet.name)))?;
            for row in &sheet.rows {
                writer.write_record(row.iter().map(|c| c.to_string()))?;
            }
            writer.flush()?;
        }
        Ok(out)
    }
}

// ── Tables ────────────────────────────────────────────────────────────────────

fn header(names: &[&str]) -> Vec<CellValue> {
    names.iter().map(|n| CellValue::text(*n)).collect()
}

fn num(value: f64) -> CellValue {
    CellValue::Number(round_to(value, EXPORT_DECIMALS))
}

fn unified_sheet(records: &[ConsumptionRecord]) -> Sheet {
    let mut rows = vec![header(UNIFIED_HEADERS)];
    rows.extend(records.iter().map(|r| {
        vec![
            CellValue::text(format_date_br(r.date)),
            CellValue::text(r.source.origin_label()),
            num(r.consumption),
            num(r.daily_delta),
            CellValue::text(r.source.unit()),
        ]
    }));
    Sheet::new(UNIFIED_SHEET_NAME, rows)
}

fn original_sheet(records: &[ConsumptionRecord], source: SourceCategory) -> Sheet {
    let headers = match source {
        SourceCategory::Energy => ENERGY_HEADERS,
        SourceCategory::Water => WATER_HEADERS,
    };
    let mut rows = vec![header(headers)];
    rows.extend(records.iter().filter(|r| r.source == source).map(|r| {
        vec![
            CellValue::text(format_date_br(r.date)),
            num(r.consumption),
            num(r.daily_delta),
        ]
    }));
    Sheet::new(source.provider(), rows)
}

fn statistics_sheet(summary: &SummaryStatistics) -> Sheet {
    let mut rows = vec![header(STATISTICS_HEADERS)];

    for source in [SourceCategory::Water, SourceCategory::Energy] {
        let daily = summary.daily(source);
        rows.push(vec![
            CellValue::text(format!("Média Diária - {}", source.display_name())),
            num(daily.mean),
            CellValue::text(source.daily_unit()),
            num(daily.sum),
            CellValue::Number(daily.count_used as f64),
        ]);
    }
    for source in [SourceCategory::Water, SourceCategory::Energy] {
        let total = summary.total(source);
        rows.push(vec![
            CellValue::text(format!("Total {}", source.display_name())),
            num(total.total),
            CellValue::text(source.unit()),
            CellValue::text("-"),
            CellValue::Number(total.records as f64),
        ]);
    }

    Sheet::new(STATISTICS_SHEET_NAME, rows)
}

fn monthly_sheet(monthly: &MonthlyAnalysis) -> Sheet {
    let mut rows = vec![header(MONTHLY_HEADERS)];

    for source in SourceCategory::ALL {
        for (month, bucket) in monthly.source(source) {
            rows.push(vec![
                CellValue::text(source.display_name()),
                CellValue::text(month.label()),
                num(bucket.avg_daily_delta),
                num(bucket.delta_sum),
                CellValue::text(format!("{}/{}", bucket.positive_delta_count, bucket.count)),
                num(bucket.variation),
                num(bucket.max_delta_or_zero()),
                num(bucket.min_delta_or_zero()),
                CellValue::text(source.unit()),
            ]);
        }
    }

    Sheet::new(MONTHLY_SHEET_NAME, rows)
}
