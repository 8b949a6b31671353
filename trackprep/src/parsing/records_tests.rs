use polars::prelude::*;
use serde_json::json;

use crate::core::error::PrepError;
use crate::parsing::records::{points_from_json_str, records_to_dataframe};

#[test]
fn test_geometry_flattens_to_coordinates() {
    let records = vec![json!({
        "id": "p1",
        "time": "2020-01-01T00:00:00",
        "geometry": {"type": "Point", "coordinates": [7.1, 51.5]},
        "track.id": "t1",
        "Speed.value": 12.5,
    })];
    let df = records_to_dataframe(&records).unwrap();

    let lng = df.column("lng").unwrap().f64().unwrap();
    let lat = df.column("lat").unwrap().f64().unwrap();
    assert_eq!(lng.get(0), Some(7.1));
    assert_eq!(lat.get(0), Some(51.5));
    assert!(df.column("geometry").is_err());
}

#[test]
fn test_column_union_with_missing_keys() {
    let records = vec![
        json!({"id": "p1", "Speed.value": 10.0}),
        json!({"id": "p2", "CO2.value": 3.5}),
    ];
    let df = records_to_dataframe(&records).unwrap();

    assert_eq!(df.height(), 2);
    let speeds = df.column("Speed.value").unwrap().f64().unwrap();
    assert_eq!(speeds.get(0), Some(10.0));
    assert_eq!(speeds.get(1), None);
    let co2 = df.column("CO2.value").unwrap().f64().unwrap();
    assert_eq!(co2.get(0), None);
    assert_eq!(co2.get(1), Some(3.5));
}

#[test]
fn test_value_columns_accept_integer_json_numbers() {
    let records = vec![json!({"Rpm.value": 2400})];
    let df = records_to_dataframe(&records).unwrap();
    assert_eq!(df.column("Rpm.value").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn test_metadata_keeps_numeric_and_string_types() {
    let records = vec![json!({
        "track.id": "t1",
        "track.length": 5417.0,
        "sensor.type": "car",
    })];
    let df = records_to_dataframe(&records).unwrap();
    assert_eq!(df.column("track.length").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("sensor.type").unwrap().dtype(), &DataType::String);
}

#[test]
fn test_conflicting_types_fail_fast() {
    let records = vec![
        json!({"sensor.type": "car"}),
        json!({"sensor.type": 7}),
    ];
    let err = records_to_dataframe(&records).unwrap_err();
    assert!(matches!(err, PrepError::ColumnType { column, .. } if column == "sensor.type"));
}

#[test]
fn test_malformed_geometry_fails_fast() {
    let records = vec![json!({"geometry": {"coordinates": "oops"}})];
    let err = records_to_dataframe(&records).unwrap_err();
    assert!(matches!(err, PrepError::Geometry { row: 0 }));
}

#[test]
fn test_non_object_record_fails_fast() {
    let err = points_from_json_str("[42]").unwrap_err();
    assert!(matches!(err, PrepError::Record { row: 0 }));
}

#[test]
fn test_from_json_str() {
    let json = r#"[
        {"id": "p1", "time": "2020-01-01T00:00:00",
         "geometry": {"coordinates": [7.0, 51.0]},
         "track.id": "t1", "Speed.value": 30.0, "Speed.unit": "km/h"},
        {"id": "p2", "time": "2020-01-01T00:00:05",
         "geometry": {"coordinates": [7.001, 51.001]},
         "track.id": "t1", "Speed.value": 32.0, "Speed.unit": "km/h"}
    ]"#;
    let df = points_from_json_str(json).unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), 7);
}
