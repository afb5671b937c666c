use crate::domain::Coordinate;
use crate::extensions::reading_ext::PathLookup;
use crate::sensor::descriptor::SourceDescriptor;
use crate::sensor::reading_path::ReadingPath;
use crate::source::Reading;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;

const OFFSET_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z"];
const NAIVE_TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub fn extract_coordinate(reading: &Reading, descriptor: &SourceDescriptor) -> Result<Coordinate, ExtractionError> {
    let latitude = extract_number(reading, descriptor.latitude())?;
    if !Coordinate::is_valid_latitude(latitude) {
        return Err(out_of_range("latitude", descriptor.latitude(), latitude, 90.0));
    }

    let longitude = extract_number(reading, descriptor.longitude())?;
    if !Coordinate::is_valid_longitude(longitude) {
        return Err(out_of_range("longitude", descriptor.longitude(), longitude, 180.0));
    }

    Ok(Coordinate::new(latitude, longitude))
}

/// Extracts a finite number. Numeric strings are accepted and an object carrying a `value` key is unwrapped.
pub fn extract_number(reading: &Reading, path: &ReadingPath) -> Result<f64, ExtractionError> {
    let found = reading.lookup(path)?;
    let value = match found {
        Value::Object(object) => object.get("value"),
        value => Some(value),
    };

    let number = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(string)) => string.trim().parse::<f64>().ok(),
        _ => None,
    };

    number.filter(|n| n.is_finite()).ok_or_else(|| ExtractionError::NotANumber {
        path: path.to_string(),
        found: found.to_string(),
    })
}

pub fn extract_timestamp(reading: &Reading, path: &ReadingPath) -> Result<DateTime<Utc>, ExtractionError> {
    let value = reading.lookup(path)?;
    value.as_str().and_then(parse_timestamp).ok_or_else(|| ExtractionError::InvalidTimestamp {
        path: path.to_string(),
        found: value.to_string(),
    })
}

/// Parses an ISO-8601 timestamp. Seconds are optional, offsets may be written as `Z`, `+02`, `+0200` or `+02:00`,
/// and timestamps without an offset are taken to be UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let with_offset = DateTime::parse_from_rfc3339(value)
        .ok()
        .or_else(|| OFFSET_TIMESTAMP_FORMATS.iter().find_map(|format| DateTime::parse_from_str(value, format).ok()));
    if let Some(timestamp) = with_offset {
        return Some(timestamp.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|timestamp| timestamp.and_utc())
}

fn out_of_range(field: &'static str, path: &ReadingPath, value: f64, limit: f64) -> ExtractionError {
    ExtractionError::OutOfRange {
        field,
        path: path.to_string(),
        value,
        limit,
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ExtractionError {
    #[error("key '{key}' not found in path {path}")]
    MissingKey { key: String, path: String },
    #[error("cannot access '{key}' in path {path}, it is not an object: {found}")]
    NotAnObject { key: String, path: String, found: String },
    #[error("could not convert value to a number at path {path}: {found}")]
    NotANumber { path: String, found: String },
    #[error("{field} {value} at path {path} must be between -{limit} and {limit}")]
    OutOfRange { field: &'static str, path: String, value: f64, limit: f64 },
    #[error("could not parse value at path {path} as an ISO-8601 timestamp: {found}")]
    InvalidTimestamp { path: String, found: String },
}
