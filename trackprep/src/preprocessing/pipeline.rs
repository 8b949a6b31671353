//! The preprocessing pipeline: validation, quality control, kinematics and
//! resampling as one configured sequence.
//!
//! Each stage consumes the previous stage's output table and contributes its
//! diagnostics to the run report; nothing mutates shared state, so any stage
//! can equally be called on its own.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::preprocessing::config::{OutlierScope, PreprocessConfig};
use crate::preprocessing::validator::{TrackValidator, ValidationResult};
use crate::quality::dedup::{drop_duplicates, DedupReport};
use crate::quality::outliers::{
    flag_outliers_in_sample, flag_outliers_in_track, remove_outliers, OutlierFlagReport,
    OutlierRemovalReport,
};
use crate::quality::ranges::{
    flag_faulty_percentages, flag_implausible_negatives, RangeFlagReport,
};
use crate::trajectories::kinematics::{derive_acceleration, AccelerationReport};
use crate::trajectories::resample::{resample, ResampleReport};

/// Diagnostics collected across a pipeline run, one entry per stage that ran.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    pub duplicates: Option<DedupReport>,
    pub percentages: Option<RangeFlagReport>,
    pub negatives: Option<RangeFlagReport>,
    pub outliers: Option<OutlierFlagReport>,
    pub removals: Vec<OutlierRemovalReport>,
    pub acceleration: Option<AccelerationReport>,
    pub resample: Option<ResampleReport>,
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct PreprocessResult {
    pub dataframe: DataFrame,
    pub validation: ValidationResult,
    pub report: PipelineReport,
}

/// The configured preprocessing pipeline.
pub struct PreprocessPipeline {
    config: PreprocessConfig,
}

impl PreprocessPipeline {
    /// Creates a pipeline with the default configuration.
    pub fn new() -> Self {
        Self {
            config: PreprocessConfig::default(),
        }
    }

    /// Creates a pipeline with a custom configuration.
    pub fn with_config(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Runs the configured stages over a point table.
    ///
    /// Validation issues do not abort the run; they are returned alongside
    /// the output so the caller decides. A stage hitting an input-shape
    /// problem fails the run with an error naming the offending column.
    pub fn process(&self, df: &DataFrame) -> Result<PreprocessResult> {
        let config = &self.config;

        let validation = if config.validate {
            TrackValidator::validate_dataframe(df, &config.schema)
        } else {
            ValidationResult::new()
        };

        let mut report = PipelineReport::default();
        let mut current = df.clone();

        if config.deduplicate {
            let (next, stage) = drop_duplicates(&current, &config.schema)
                .context("duplicate elimination failed")?;
            current = next;
            report.duplicates = Some(stage);
        }

        if config.check_percentages {
            let (next, stage) = flag_faulty_percentages(&current, &config.percentage_options)
                .context("percentage range check failed")?;
            current = next;
            report.percentages = Some(stage);
        }

        if config.check_negatives {
            let (next, stage) =
                flag_implausible_negatives(&current, &config.schema, &config.negative_options)
                    .context("sign plausibility check failed")?;
            current = next;
            report.negatives = Some(stage);
        }

        match config.outlier_scope {
            OutlierScope::Off => {}
            OutlierScope::Sample => {
                let (next, stage) = flag_outliers_in_sample(&current, &config.outlier_options)
                    .context("sample outlier detection failed")?;
                current = next;
                report.outliers = Some(stage);
            }
            OutlierScope::Track => {
                let (next, stage) = flag_outliers_in_track(&current, &config.outlier_options)
                    .context("track outlier detection failed")?;
                current = next;
                report.outliers = Some(stage);
            }
        }

        for column in &config.remove_outlier_columns {
            let (next, stage) = remove_outliers(&current, column)
                .with_context(|| format!("outlier removal failed for {column}"))?;
            current = next;
            report.removals.push(stage);
        }

        if config.acceleration {
            let (next, stage) =
                derive_acceleration(&current).context("acceleration derivation failed")?;
            current = next;
            report.acceleration = Some(stage);
        }

        if config.resample {
            let (next, stage) = resample(&current, &config.schema, &config.resample_options)
                .context("trajectory resampling failed")?;
            current = next;
            report.resample = Some(stage);
        }

        Ok(PreprocessResult {
            dataframe: current,
            validation,
            report,
        })
    }
}

impl Default for PreprocessPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to run one configured pass over a point table.
pub fn preprocess(df: &DataFrame, config: PreprocessConfig) -> Result<PreprocessResult> {
    PreprocessPipeline::with_config(config).process(df)
}
