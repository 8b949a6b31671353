//! CSV ingestion for point tables.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::core::schema::{COL_ID, COL_TIME, COL_TRACK_ID};

/// Reads a point table from CSV.
///
/// Types are inferred and then forced where inference can go wrong:
/// `.value` columns become Float64 (a column of whole numbers would otherwise
/// infer as integers) and the identifier/timestamp columns become String.
pub fn read_points_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(file)
        .finish()
        .context("Failed to parse CSV into DataFrame")?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut lazy_df = df.lazy();
    for name in &names {
        if name.ends_with(".value") {
            lazy_df = lazy_df.with_column(col(name.as_str()).cast(DataType::Float64));
        } else if name == COL_ID || name == COL_TIME || name == COL_TRACK_ID {
            lazy_df = lazy_df.with_column(col(name.as_str()).cast(DataType::String));
        }
    }

    lazy_df
        .collect()
        .context("Failed to cast columns to expected types")
}
