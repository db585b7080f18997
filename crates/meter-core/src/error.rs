use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the utility monitor.
#[derive(Error, Debug)]
pub enum MeterError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The spreadsheet backend could not decode the workbook.
    #[error("Failed to read workbook: {0}")]
    Workbook(String),

    /// An `.xlsx` export could not be written.
    #[error("Failed to write workbook: {0}")]
    WorkbookWrite(String),

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A CSV table could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file extension is not one of the supported workbook formats.
    #[error("Unsupported workbook format: {0}")]
    UnsupportedFormat(String),

    /// Neither the unified table nor an energy/water sheet pair was found.
    #[error("Could not identify the energy (Coelba) and water (Embasa) sheets")]
    SheetsNotIdentified,

    /// The workbook was readable but no row produced a usable record.
    #[error("No valid records were found in the workbook")]
    NoValidRecords,

    /// A manually entered record was rejected.
    #[error("Invalid entry: {0}")]
    Validation(String),

    /// An operation needs records but the session is empty.
    #[error("No data available")]
    NoData,

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the meter crates.
pub type Result<T> = std::result::Result<T, MeterError>;
