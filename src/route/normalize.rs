use crate::domain::{Coordinate, RoutePoint};
use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};

const RECORD_ARRAY_KEYS: [&str; 3] = ["positions", "data", "route"];
const TIME_FIELDS: [&str; 4] = ["deviceTime", "fixTime", "serverTime", "time"];

/// Unwraps the record array from a telemetry payload. Traccar answers with a bare array, but
/// reports and proxies wrap it in an object.
pub fn records_from_payload(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(records) => records,
        Value::Object(mut object) => RECORD_ARRAY_KEYS
            .iter()
            .find_map(|key| match object.remove(*key) {
                Some(Value::Array(records)) => Some(records),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Turns raw telemetry records into route points sorted by timestamp, keeping the first record
/// for every timestamp. Records without coordinates or without a timestamp are skipped.
pub fn normalize_records(records: &[Value]) -> Vec<RoutePoint> {
    let points = records
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|record| {
            let coordinate = extract_coordinate(record)?;
            let timestamp = extract_timestamp(record)?;
            Some(RoutePoint::new(coordinate.lat, coordinate.lon, timestamp))
        })
        .collect();

    sort_and_dedup(points)
}

pub(crate) fn sort_and_dedup(mut points: Vec<RoutePoint>) -> Vec<RoutePoint> {
    // Stable sort, so the first occurrence of a timestamp survives the dedup
    points.sort_by_key(|point| point.timestamp);
    points.dedup_by_key(|point| point.timestamp);
    points
}

pub fn extract_coordinate(record: &Map<String, Value>) -> Option<Coordinate> {
    let lat = first_number(record, &["latitude", "lat"])?;
    let lon = first_number(record, &["longitude", "lon"])?;
    Some(Coordinate::new(lat, lon))
}

/// Epoch milliseconds from the first parseable time field, falling back to a numeric `timestamp`.
pub fn extract_timestamp(record: &Map<String, Value>) -> Option<i64> {
    TIME_FIELDS
        .iter()
        .filter_map(|field| record.get(*field).and_then(Value::as_str))
        .filter(|value| !value.is_empty())
        .find_map(parse_time)
        .or_else(|| match record.get("timestamp") {
            Some(Value::Number(number)) => number.as_i64().or_else(|| number.as_f64().map(|millis| millis as i64)),
            _ => None,
        })
}

fn parse_time(value: &str) -> Option<i64> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.timestamp_millis());
    }

    // Some Traccar versions omit the offset, those are UTC
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|datetime| datetime.and_utc().timestamp_millis())
}

fn first_number(record: &Map<String, Value>, fields: &[&str]) -> Option<f64> {
    let value = fields.iter().find_map(|field| record.get(*field).filter(|value| !value.is_null()))?;
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}
