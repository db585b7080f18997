//! Asynchronous workbook loading.
//!
//! Reading the file is the only suspension point of an import. Decoding is
//! CPU-bound and runs on the blocking pool; everything after this returns an
//! immutable [`Workbook`] to the synchronous pipeline.

use std::path::{Path, PathBuf};

use meter_core::error::{MeterError, Result};
use meter_core::models::Workbook;
use meter_data::reader::{read_csv_dir, read_workbook_bytes, InputFormat};

/// Load the workbook at `path` without blocking the runtime.
pub async fn load_workbook(path: &Path) -> Result<Workbook> {
    let format = InputFormat::detect(path)?;
    let owned: PathBuf = path.to_path_buf();

    let workbook = match format {
        InputFormat::CsvDirectory => {
            run_blocking(move || read_csv_dir(&owned)).await?
        }
        format => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| MeterError::FileRead {
                    path: owned,
                    source,
                })?;
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "workbook bytes read");
            run_blocking(move || read_workbook_bytes(bytes, format)).await?
        }
    };

    tracing::info!(
        path = %path.display(),
        sheets = workbook.sheets.len(),
        "workbook loaded"
    );
    Ok(workbook)
}

async fn run_blocking<F>(f: F) -> Result<Workbook>
where
    F: FnOnce() -> Result<Workbook> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| MeterError::Workbook(format!("decoder task failed: {e}")))?
}
