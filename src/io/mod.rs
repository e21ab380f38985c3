//! File outputs: CSV report export, JSON result store, CSV to YAML conversion.

pub mod convert;
pub mod export;
pub mod results;
