//! trackprep: quality control and uniform resampling for GPS vehicle-sensor
//! tracks.
//!
//! The crate takes an in-memory batch of timestamped, geolocated sensor
//! readings ("points") grouped into drives ("tracks") and produces cleaned,
//! uniformly sampled trajectories: duplicates removed, physically implausible
//! and statistically outlying values flagged or nulled, acceleration derived,
//! and each track regenerated at fixed distance or time steps.
//!
//! The working table is a polars [`DataFrame`](polars::prelude::DataFrame)
//! with a stable shape: `id`, `time`, `lng`/`lat` coordinates, `track.id`,
//! `<name>.value` measurement columns with optional `<name>.unit` tags, and
//! `track.*`/`sensor.*` metadata. Stages never mutate their input; each
//! returns a new frame plus a diagnostics report with every count it logged.
//!
//! ```no_run
//! use polars::prelude::*;
//! use trackprep::preprocessing::{preprocess, PreprocessConfig};
//!
//! # fn run(points: DataFrame) -> anyhow::Result<()> {
//! let config = PreprocessConfig::from_toml_str(
//!     r#"
//!     outlier_scope = "track"
//!     resample = true
//!     "#,
//! )?;
//! let result = preprocess(&points, config)?;
//! println!(
//!     "{} duplicates removed, {} points out",
//!     result.report.duplicates.map(|d| d.removed).unwrap_or(0),
//!     result.dataframe.height()
//! );
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod parsing;
pub mod preprocessing;
pub mod quality;
pub mod stats;
pub mod time;
pub mod trajectories;
pub mod transformations;
