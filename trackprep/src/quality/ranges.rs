//! Range and sign validation for measurement values.
//!
//! Two independent checks: percentage-typed variables outside [0, 100], and
//! physically non-negative quantities below 0. Each maintains one aggregate
//! flag column and one flag column per variable; the aggregate is 1 exactly
//! when at least one per-variable flag is 1 on that row.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::error::PrepResult;
use crate::core::schema::{self, TrackSchema};

/// Aggregate flag for out-of-range percentage values.
pub const FAULTY_PERCENTAGES_FLAG: &str = "faulty_percentages";
/// Aggregate flag for negative values of non-negative quantities.
pub const IMPLAUSIBLE_NEGATIVE_FLAG: &str = "implausible_neg_value";

/// Options shared by both range checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeFlagOptions {
    /// Replace flagged values with missing in place.
    pub set_to_null: bool,
    /// Keep the per-variable diagnostic columns.
    pub keep_variable_flags: bool,
    /// Keep the aggregate flag column.
    pub keep_flag: bool,
}

impl Default for RangeFlagOptions {
    fn default() -> Self {
        Self {
            set_to_null: false,
            keep_variable_flags: false,
            keep_flag: true,
        }
    }
}

/// Per-variable and aggregate counts from one range check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeFlagReport {
    pub per_variable: Vec<(String, usize)>,
    pub rows_flagged: usize,
}

/// Flags percentage-typed measurements outside [0, 100].
///
/// A variable participates when its `<name>.unit` column declares `%`; a
/// declared percentage without a value column is an input-shape error.
pub fn flag_faulty_percentages(
    df: &DataFrame,
    options: &RangeFlagOptions,
) -> PrepResult<(DataFrame, RangeFlagReport)> {
    let variables = schema::percentage_value_columns(df)?;
    flag_out_of_range(
        df,
        &variables,
        FAULTY_PERCENTAGES_FLAG,
        |value| value < 0.0 || value > 100.0,
        options,
    )
}

/// Flags negative values of the schema's non-negative quantities.
pub fn flag_implausible_negatives(
    df: &DataFrame,
    schema: &TrackSchema,
    options: &RangeFlagOptions,
) -> PrepResult<(DataFrame, RangeFlagReport)> {
    TrackSchema::require_columns(df, &schema.non_negative_columns)?;
    flag_out_of_range(
        df,
        &schema.non_negative_columns,
        IMPLAUSIBLE_NEGATIVE_FLAG,
        |value| value < 0.0,
        options,
    )
}

fn flag_out_of_range(
    df: &DataFrame,
    variables: &[String],
    flag_name: &str,
    out_of_range: impl Fn(f64) -> bool,
    options: &RangeFlagOptions,
) -> PrepResult<(DataFrame, RangeFlagReport)> {
    let mut out = df.clone();
    let mut aggregate = vec![0i32; df.height()];
    let mut per_variable = Vec::with_capacity(variables.len());

    for variable in variables {
        let (flags, nulled) = {
            let values = schema::float_column(&out, variable)?;
            let flags: Vec<i32> = values
                .into_iter()
                .map(|value| match value {
                    Some(v) if out_of_range(v) => 1,
                    _ => 0,
                })
                .collect();
            let nulled: Vec<Option<f64>> = values
                .into_iter()
                .zip(&flags)
                .map(|(value, &flag)| if flag == 1 { None } else { value })
                .collect();
            (flags, nulled)
        };

        let count = flags.iter().filter(|&&f| f == 1).count();
        log::info!("{flag_name}_{variable}: {count} values flagged");
        per_variable.push((variable.clone(), count));
        for (slot, &flag) in aggregate.iter_mut().zip(&flags) {
            if flag == 1 {
                *slot = 1;
            }
        }

        if options.set_to_null {
            out.with_column(Series::new(variable.as_str().into(), nulled))?;
        }
        if options.keep_variable_flags {
            out.with_column(Series::new(
                format!("{flag_name}_{variable}").into(),
                flags,
            ))?;
        }
    }

    let rows_flagged = aggregate.iter().filter(|&&f| f == 1).count();
    log::info!("{flag_name}: {rows_flagged} rows flagged");
    if options.keep_flag {
        out.with_column(Series::new(flag_name.into(), aggregate))?;
    }

    Ok((
        out,
        RangeFlagReport {
            per_variable,
            rows_flagged,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PrepError;

    fn percent_df() -> DataFrame {
        df!(
            "Engine Load.value" => [50.0, -3.0, 120.0, 80.0],
            "Engine Load.unit" => ["%", "%", "%", "%"],
            "Throttle Position.value" => [10.0, 20.0, 30.0, 101.0],
            "Throttle Position.unit" => ["%", "%", "%", "%"],
            "Speed.value" => [10.0, 20.0, 30.0, 40.0],
            "Speed.unit" => ["km/h", "km/h", "km/h", "km/h"],
        )
        .unwrap()
    }

    #[test]
    fn test_flags_and_counts() {
        let options = RangeFlagOptions {
            keep_variable_flags: true,
            ..Default::default()
        };
        let (out, report) = flag_faulty_percentages(&percent_df(), &options).unwrap();

        assert_eq!(report.rows_flagged, 3);
        assert_eq!(
            report.per_variable,
            vec![
                ("Engine Load.value".to_string(), 2),
                ("Throttle Position.value".to_string(), 1),
            ]
        );

        let aggregate: Vec<Option<i32>> = out
            .column(FAULTY_PERCENTAGES_FLAG)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(aggregate, vec![Some(0), Some(1), Some(1), Some(1)]);
    }

    #[test]
    fn test_aggregate_is_or_of_variable_flags() {
        let options = RangeFlagOptions {
            keep_variable_flags: true,
            ..Default::default()
        };
        let (out, _) = flag_faulty_percentages(&percent_df(), &options).unwrap();

        let aggregate = out
            .column(FAULTY_PERCENTAGES_FLAG)
            .unwrap()
            .i32()
            .unwrap()
            .clone();
        let load = out
            .column("faulty_percentages_Engine Load.value")
            .unwrap()
            .i32()
            .unwrap()
            .clone();
        let throttle = out
            .column("faulty_percentages_Throttle Position.value")
            .unwrap()
            .i32()
            .unwrap()
            .clone();

        for row in 0..out.height() {
            let any = load.get(row) == Some(1) || throttle.get(row) == Some(1);
            assert_eq!(aggregate.get(row) == Some(1), any);
        }
    }

    #[test]
    fn test_nulling_and_boundaries() {
        let options = RangeFlagOptions {
            set_to_null: true,
            ..Default::default()
        };
        let (out, report) = flag_faulty_percentages(&percent_df(), &options).unwrap();

        let load: Vec<Option<f64>> = out
            .column("Engine Load.value")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(load, vec![Some(50.0), None, None, Some(80.0)]);
        // exactly 0 and 100 are valid
        let df = df!(
            "Engine Load.value" => [0.0, 100.0],
            "Engine Load.unit" => ["%", "%"],
        )
        .unwrap();
        let (_, edge) = flag_faulty_percentages(&df, &RangeFlagOptions::default()).unwrap();
        assert_eq!(edge.rows_flagged, 0);
        assert_eq!(report.per_variable[0].1, 2);
    }

    #[test]
    fn test_flag_columns_dropped_by_default() {
        let (out, _) =
            flag_faulty_percentages(&percent_df(), &RangeFlagOptions::default()).unwrap();
        assert!(out.column("faulty_percentages_Engine Load.value").is_err());
        assert!(out.column(FAULTY_PERCENTAGES_FLAG).is_ok());

        let no_flag = RangeFlagOptions {
            keep_flag: false,
            ..Default::default()
        };
        let (out, _) = flag_faulty_percentages(&percent_df(), &no_flag).unwrap();
        assert!(out.column(FAULTY_PERCENTAGES_FLAG).is_err());
    }

    #[test]
    fn test_negative_values() {
        let df = df!(
            "Speed.value" => [10.0, -5.0, 20.0],
            "CO2.value" => [1.0, 2.0, 3.0],
            "Rpm.value" => [900.0, 1500.0, -1.0],
            "Consumption (GPS-based).value" => [5.0, 5.0, 5.0],
            "Consumption.value" => [5.0, 5.0, 5.0],
            "CO2 Emission (GPS-based).value" => [1.0, 1.0, 1.0],
        )
        .unwrap();
        let options = RangeFlagOptions {
            set_to_null: true,
            ..Default::default()
        };
        let (out, report) =
            flag_implausible_negatives(&df, &TrackSchema::default(), &options).unwrap();

        assert_eq!(report.rows_flagged, 2);
        let speeds: Vec<Option<f64>> = out
            .column("Speed.value")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(speeds, vec![Some(10.0), None, Some(20.0)]);
        let flags: Vec<Option<i32>> = out
            .column(IMPLAUSIBLE_NEGATIVE_FLAG)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(flags, vec![Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn test_missing_non_negative_column_fails_fast() {
        let df = df!("Speed.value" => [1.0]).unwrap();
        let err =
            flag_implausible_negatives(&df, &TrackSchema::default(), &RangeFlagOptions::default())
                .unwrap_err();
        assert!(matches!(err, PrepError::MissingColumn(_)));
    }
}
