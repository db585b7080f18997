//! Runtime layer for the utility monitor.
//!
//! Owns the in-memory session (the current records and everything derived
//! from them), validates manual entries, and performs the one asynchronous
//! step of the pipeline: reading workbook bytes from disk.

pub mod entry;
pub mod loader;
pub mod session;

pub use meter_core as core;
pub use meter_data as data;
