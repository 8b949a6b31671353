//! Building the point table from JSON point records.
//!
//! Each record is a flat JSON object, with the GeoJSON-style `geometry`
//! object flattened into `lng`/`lat` columns. The column set is the union of
//! the keys over all records; absent keys become missing values. `.value`
//! keys are measurement columns and always come out Float64 (integer JSON
//! numbers included); other columns take the type of their first non-null
//! value, and a later value of a different type is an input-shape error.

use std::collections::HashMap;

use polars::prelude::*;
use serde_json::Value;

use crate::core::error::{PrepError, PrepResult};
use crate::core::schema::{COL_LAT, COL_LNG};

const GEOMETRY_KEY: &str = "geometry";

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Float,
    Str,
    Bool,
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parses a JSON array of point records into the working table.
pub fn points_from_json_str(json: &str) -> PrepResult<DataFrame> {
    let records: Vec<Value> = serde_json::from_str(json)?;
    records_to_dataframe(&records)
}

/// Converts point records into the working table.
pub fn records_to_dataframe(records: &[Value]) -> PrepResult<DataFrame> {
    let mut order: Vec<String> = Vec::new();
    let mut kinds: HashMap<String, ColumnKind> = HashMap::new();

    for (row, record) in records.iter().enumerate() {
        let object = record.as_object().ok_or(PrepError::Record { row })?;
        for (key, value) in object {
            if key == GEOMETRY_KEY {
                if !order.iter().any(|name| name == COL_LNG) {
                    order.push(COL_LNG.to_string());
                    order.push(COL_LAT.to_string());
                    kinds.insert(COL_LNG.to_string(), ColumnKind::Float);
                    kinds.insert(COL_LAT.to_string(), ColumnKind::Float);
                }
                continue;
            }
            if !order.iter().any(|name| name == key) {
                order.push(key.clone());
            }
            if kinds.contains_key(key) {
                continue;
            }
            let kind = if key.ends_with(".value") {
                Some(ColumnKind::Float)
            } else {
                match value {
                    Value::Null => None,
                    Value::Number(_) => Some(ColumnKind::Float),
                    Value::String(_) => Some(ColumnKind::Str),
                    Value::Bool(_) => Some(ColumnKind::Bool),
                    other => {
                        return Err(PrepError::ColumnType {
                            column: key.clone(),
                            expected: "scalar".to_string(),
                            actual: json_type(other).to_string(),
                        })
                    }
                }
            };
            if let Some(kind) = kind {
                kinds.insert(key.clone(), kind);
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(order.len());
    for name in &order {
        // a column observed only as null defaults to String
        let kind = kinds.get(name).copied().unwrap_or(ColumnKind::Str);
        let series = match kind {
            ColumnKind::Float => {
                let values = collect_floats(records, name)?;
                Series::new(name.as_str().into(), values)
            }
            ColumnKind::Str => {
                let values = collect_strings(records, name)?;
                Series::new(name.as_str().into(), values)
            }
            ColumnKind::Bool => {
                let values = collect_bools(records, name)?;
                Series::new(name.as_str().into(), values)
            }
        };
        columns.push(series.into_column());
    }

    Ok(DataFrame::new(columns)?)
}

fn coordinate(record: &Value, row: usize, axis: usize) -> PrepResult<Option<f64>> {
    let Some(geometry) = record.get(GEOMETRY_KEY) else {
        return Ok(None);
    };
    if geometry.is_null() {
        return Ok(None);
    }
    geometry
        .get("coordinates")
        .and_then(|coords| coords.get(axis))
        .and_then(Value::as_f64)
        .map(Some)
        .ok_or(PrepError::Geometry { row })
}

fn collect_floats(records: &[Value], name: &str) -> PrepResult<Vec<Option<f64>>> {
    let mut values = Vec::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        if name == COL_LNG || name == COL_LAT {
            let axis = if name == COL_LNG { 0 } else { 1 };
            values.push(coordinate(record, row, axis)?);
            continue;
        }
        let value = match record.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(other) => {
                return Err(PrepError::ColumnType {
                    column: name.to_string(),
                    expected: "number".to_string(),
                    actual: json_type(other).to_string(),
                })
            }
        };
        values.push(value);
    }
    Ok(values)
}

fn collect_strings(records: &[Value], name: &str) -> PrepResult<Vec<Option<String>>> {
    let mut values = Vec::with_capacity(records.len());
    for record in records {
        let value = match record.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(PrepError::ColumnType {
                    column: name.to_string(),
                    expected: "string".to_string(),
                    actual: json_type(other).to_string(),
                })
            }
        };
        values.push(value);
    }
    Ok(values)
}

fn collect_bools(records: &[Value], name: &str) -> PrepResult<Vec<Option<bool>>> {
    let mut values = Vec::with_capacity(records.len());
    for record in records {
        let value = match record.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => {
                return Err(PrepError::ColumnType {
                    column: name.to_string(),
                    expected: "boolean".to_string(),
                    actual: json_type(other).to_string(),
                })
            }
        };
        values.push(value);
    }
    Ok(values)
}
