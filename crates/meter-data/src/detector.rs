//! Workbook layout detection.
//!
//! A workbook is either the unified single-table layout written by this
//! tool's own export, or the providers' original layout with one sheet per
//! utility. The dual-sheet case is resolved by sheet-name keywords, with a
//! positional fallback when no name says anything.

use meter_core::error::{MeterError, Result};
use meter_core::models::{Sheet, Workbook};
use tracing::debug;

/// Name of the table written by the export and recognised on import.
pub const UNIFIED_SHEET_NAME: &str = "Dados de Consumo";

const ENERGY_SHEET_KEYWORDS: &[&str] = &["coelba", "energia", "luz"];
const WATER_SHEET_KEYWORDS: &[&str] = &["embasa", "agua", "water"];

// ── Layout plan (index based) ─────────────────────────────────────────────────

/// How the energy and water sheets of a dual-sheet workbook were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetAssignment {
    Keyword,
    Positional,
}

/// Detection result expressed as sheet indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPlan {
    /// The unified table lives at this index.
    Unified(usize),
    /// One sheet per utility.
    DualSheet {
        energy: usize,
        water: usize,
        assignment: SheetAssignment,
    },
}

/// Decide the layout from sheet names alone.
///
/// Fails with [`MeterError::SheetsNotIdentified`] when fewer than two
/// sheets exist or only one utility could be matched.
pub fn detect_from_names<S: AsRef<str>>(names: &[S]) -> Result<LayoutPlan> {
    if let Some(idx) = names.iter().position(|n| n.as_ref() == UNIFIED_SHEET_NAME) {
        return Ok(LayoutPlan::Unified(idx));
    }

    let mut energy: Option<usize> = None;
    let mut water: Option<usize> = None;

    for (idx, name) in names.iter().enumerate() {
        let folded = fold_name(name.as_ref());
        if contains_any(&folded, ENERGY_SHEET_KEYWORDS) {
            energy.get_or_insert(idx);
        } else if contains_any(&folded, WATER_SHEET_KEYWORDS) {
            water.get_or_insert(idx);
        }
    }

    match (energy, water) {
        (Some(energy), Some(water)) => Ok(LayoutPlan::DualSheet {
            energy,
            water,
            assignment: SheetAssignment::Keyword,
        }),
        (None, None) if names.len() >= 2 => Ok(LayoutPlan::DualSheet {
            energy: 0,
            water: 1,
            assignment: SheetAssignment::Positional,
        }),
        _ => Err(MeterError::SheetsNotIdentified),
    }
}

// ── Layout (borrowed sheets) ──────────────────────────────────────────────────

/// Detection result resolved against a workbook.
#[derive(Debug, Clone, Copy)]
pub enum WorkbookLayout<'a> {
    Unified(&'a Sheet),
    DualSheet {
        energy: &'a Sheet,
        water: &'a Sheet,
        assignment: SheetAssignment,
    },
}

/// Detect the layout of `workbook` and borrow the relevant sheets.
pub fn detect_layout(workbook: &Workbook) -> Result<WorkbookLayout<'_>> {
    let names = workbook.sheet_names();
    let plan = detect_from_names(&names)?;
    debug!(?plan, sheets = ?names, "workbook layout detected");

    let sheets = &workbook.sheets;
    Ok(match plan {
        LayoutPlan::Unified(idx) => WorkbookLayout::Unified(&sheets[idx]),
        LayoutPlan::DualSheet {
            energy,
            water,
            assignment,
        } => WorkbookLayout::DualSheet {
            energy: &sheets[energy],
            water: &sheets[water],
            assignment,
        },
    })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Lowercase and strip the Portuguese diacritics so `"Água"` matches `agua`.
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
