//! Pipeline configuration, loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::PrepResult;
use crate::core::schema::TrackSchema;
use crate::quality::outliers::OutlierOptions;
use crate::quality::ranges::RangeFlagOptions;
use crate::trajectories::resample::ResampleOptions;

/// Which population the outlier detector compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierScope {
    Off,
    Sample,
    Track,
}

/// Configuration for the preprocessing pipeline.
///
/// Every stage is independently toggleable; defaults mirror the interactive
/// cleaning workflow: deduplicate, flag and null faulty percentages, flag
/// (but keep) implausible negatives, no outlier pass, no resampling. Partial
/// TOML files work; missing keys take these defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub validate: bool,
    pub deduplicate: bool,
    pub check_percentages: bool,
    pub check_negatives: bool,
    pub acceleration: bool,
    pub resample: bool,
    pub outlier_scope: OutlierScope,
    /// Variables to physically strip of outlying rows after flagging.
    pub remove_outlier_columns: Vec<String>,
    pub schema: TrackSchema,
    pub percentage_options: RangeFlagOptions,
    pub negative_options: RangeFlagOptions,
    pub outlier_options: OutlierOptions,
    pub resample_options: ResampleOptions,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            validate: true,
            deduplicate: true,
            check_percentages: true,
            check_negatives: true,
            acceleration: false,
            resample: false,
            outlier_scope: OutlierScope::Off,
            remove_outlier_columns: Vec::new(),
            schema: TrackSchema::default(),
            percentage_options: RangeFlagOptions {
                set_to_null: true,
                keep_variable_flags: false,
                keep_flag: true,
            },
            negative_options: RangeFlagOptions::default(),
            outlier_options: OutlierOptions::default(),
            resample_options: ResampleOptions::default(),
        }
    }
}

impl PreprocessConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> PrepResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> PrepResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
