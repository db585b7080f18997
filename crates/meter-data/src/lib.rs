//! Ingestion and aggregation layer for the utility monitor.
//!
//! Reads workbooks into the cell model, detects which layout they use,
//! extracts normalized consumption records, folds them into monthly buckets
//! with month-over-month trends, and builds the export workbook.

pub mod aggregator;
pub mod analysis;
pub mod detector;
pub mod export;
pub mod extractor;
pub mod reader;
pub mod trend;

pub use meter_core as core;
