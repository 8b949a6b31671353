//! Building the working point table from raw inputs.
//!
//! The pipeline itself operates on an in-memory table; these helpers exist so
//! callers holding JSON point records or a CSV export can get one.
//!
//! - [`records`]: JSON point records, with GeoJSON-style geometry flattening
//! - [`csv_loader`]: CSV files, with measurement/identifier type forcing

pub mod csv_loader;
pub mod records;

#[cfg(test)]
mod records_tests;

pub use csv_loader::read_points_csv;
pub use records::{points_from_json_str, records_to_dataframe};
