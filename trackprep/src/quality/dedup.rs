//! Duplicate elimination over the domain-fixed identity columns.

use std::collections::HashMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::error::PrepResult;
use crate::core::schema::{self, TrackSchema};

/// Diagnostics for the duplicate eliminator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub removed: usize,
}

/// Removes rows identical on every identity column, keeping the last
/// occurrence; surviving rows keep their original order.
///
/// A missing value never equals anything, including another missing value, so
/// a row with a null in any identity column is always kept. Unit and id
/// columns are not part of the identity list and never affect the comparison.
/// Applying this twice yields the same table as once.
pub fn drop_duplicates(
    df: &DataFrame,
    schema: &TrackSchema,
) -> PrepResult<(DataFrame, DedupReport)> {
    TrackSchema::require_columns(df, &schema.identity_columns)?;
    let columns: Vec<&Column> = schema
        .identity_columns
        .iter()
        .map(|name| schema::column(df, name))
        .collect::<PrepResult<_>>()?;

    let rows_before = df.height();
    let mut keys: Vec<Option<String>> = Vec::with_capacity(rows_before);
    let mut last_seen: HashMap<String, usize> = HashMap::new();
    for row in 0..rows_before {
        let mut key = String::new();
        let mut has_null = false;
        for column in &columns {
            let value = column.get(row)?;
            if matches!(value, AnyValue::Null) {
                has_null = true;
                break;
            }
            key.push_str(&format!("{value:?}\u{1f}"));
        }
        if has_null {
            keys.push(None);
        } else {
            last_seen.insert(key.clone(), row);
            keys.push(Some(key));
        }
    }

    let keep: Vec<bool> = keys
        .iter()
        .enumerate()
        .map(|(row, key)| match key {
            Some(key) => last_seen[key] == row,
            None => true,
        })
        .collect();

    let deduped = df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
    let report = DedupReport {
        rows_before,
        rows_after: deduped.height(),
        removed: rows_before - deduped.height(),
    };
    log::info!("removed {} duplicate rows", report.removed);
    Ok((deduped, report))
}
