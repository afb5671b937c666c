use crate::domain::Coordinate;
use serde_json::{Map, Value};
use thiserror::Error;

const LOCATION_1: &str = "location_1";
const LOCATION_2: &str = "location_2";

/// Reads the two coordinates of a direct distance command.
pub fn parse_locations(command: &Value) -> Result<(Coordinate, Coordinate), CommandError> {
    let Some(command) = command.as_object() else {
        return Err(UnsupportedCommandError.into());
    };

    match (command.get(LOCATION_1), command.get(LOCATION_2)) {
        (None, None) => Err(UnsupportedCommandError.into()),
        (Some(_), None) => Err(ValidationError::MissingLocation { location: LOCATION_2 }.into()),
        (None, Some(_)) => Err(ValidationError::MissingLocation { location: LOCATION_1 }.into()),
        (Some(location_1), Some(location_2)) => Ok((parse_location(LOCATION_1, location_1)?, parse_location(LOCATION_2, location_2)?)),
    }
}

fn parse_location(location: &'static str, value: &Value) -> Result<Coordinate, ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject { location })?;

    let latitude = parse_field(location, "latitude", object)?;
    if !Coordinate::is_valid_latitude(latitude) {
        return Err(ValidationError::OutOfRange {
            location,
            field: "latitude",
            value: latitude,
            limit: 90.0,
        });
    }

    let longitude = parse_field(location, "longitude", object)?;
    if !Coordinate::is_valid_longitude(longitude) {
        return Err(ValidationError::OutOfRange {
            location,
            field: "longitude",
            value: longitude,
            limit: 180.0,
        });
    }

    Ok(Coordinate::new(latitude, longitude))
}

fn parse_field(location: &'static str, field: &'static str, object: &Map<String, Value>) -> Result<f64, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { location, field }),
        Some(Value::Number(number)) => number.as_f64().ok_or_else(|| ValidationError::NotANumber {
            location,
            field,
            found: number.to_string(),
        }),
        Some(other) => Err(ValidationError::NotANumber {
            location,
            field,
            found: other.to_string(),
        }),
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("both location_1 and location_2 must be provided, {location} is missing")]
    MissingLocation { location: &'static str },
    #[error("{location} must be an object with latitude and longitude fields")]
    NotAnObject { location: &'static str },
    #[error("{location} is missing '{field}'")]
    MissingField { location: &'static str, field: &'static str },
    #[error("{location} '{field}' must be a number, got {found}")]
    NotANumber { location: &'static str, field: &'static str, found: String },
    #[error("{location} '{field}' {value} must be between -{limit} and {limit}")]
    OutOfRange { location: &'static str, field: &'static str, value: f64, limit: f64 },
}

#[derive(Error, Debug, PartialEq)]
#[error("unsupported command, location_1 and location_2 must be provided in the format: {{\"latitude\": float, \"longitude\": float}}")]
pub struct UnsupportedCommandError;

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Unsupported(#[from] UnsupportedCommandError),
}
