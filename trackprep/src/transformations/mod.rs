//! Table transformations that reshape or rescale the point table without
//! judging data quality.
//!
//! - [`scaling`]: per-track min-max and z-score scaling
//! - [`slicing`]: cutting tracks down to an elapsed-time window
//! - [`missing`]: missing-value summaries and nearest-value filling

pub mod missing;
pub mod scaling;
pub mod slicing;

pub use missing::{
    drop_unit_columns, fill_missing_nearest, missing_value_summary, missing_values_per_track,
    ColumnMissing, TrackMissing,
};
pub use scaling::{normalize, standardize};
pub use slicing::{split_by_time, SECONDS_SINCE_START_COLUMN};
