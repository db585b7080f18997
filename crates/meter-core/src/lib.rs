//! Core types and pure computations for the utility consumption monitor.
//!
//! Holds the cell and record model, the error type, date normalization,
//! numeric cell parsing, descriptive statistics, display formatting and the
//! command-line settings shared by every other crate in the workspace.

pub mod dates;
pub mod error;
pub mod formatting;
pub mod models;
pub mod numbers;
pub mod settings;
pub mod statistics;
