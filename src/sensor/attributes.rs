use crate::sensor::descriptor::{SensorKey, SourceDescriptor};
use crate::sensor::reading_path::ReadingPath;
use crate::sensor::serialized_attributes::SerializedSourceDescriptor;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// The validated `sensor_1` and `sensor_2` attributes of a haversine sensor.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct HaversineAttributes {
    sensor_1: Option<SourceDescriptor>,
    sensor_2: Option<SourceDescriptor>,
}

impl HaversineAttributes {
    #[cfg(test)]
    pub fn new(sensor_1: Option<SourceDescriptor>, sensor_2: Option<SourceDescriptor>) -> Self {
        HaversineAttributes { sensor_1, sensor_2 }
    }

    pub fn from_value(attributes: &Value) -> Result<Self, ConfigurationError> {
        let attributes = match attributes {
            Value::Null => return Ok(HaversineAttributes::default()),
            Value::Object(attributes) => attributes,
            _ => return Err(ConfigurationError::InvalidAttributes),
        };

        let mut parsed = HaversineAttributes::default();
        for key in SensorKey::all() {
            let descriptor = match attributes.get(key.as_str()) {
                None | Some(Value::Null) => None,
                Some(value) => Some(parse_descriptor(key, value)?),
            };
            match key {
                SensorKey::Sensor1 => parsed.sensor_1 = descriptor,
                SensorKey::Sensor2 => parsed.sensor_2 = descriptor,
            }
        }

        Ok(parsed)
    }

    pub fn sensor(&self, key: SensorKey) -> Option<&SourceDescriptor> {
        match key {
            SensorKey::Sensor1 => self.sensor_1.as_ref(),
            SensorKey::Sensor2 => self.sensor_2.as_ref(),
        }
    }

    /// Names of the sources the configured sensors read from.
    pub fn dependencies(&self) -> Vec<&str> {
        SensorKey::all().into_iter().filter_map(|key| self.sensor(key)).map(SourceDescriptor::name).collect()
    }
}

fn parse_descriptor(key: SensorKey, value: &Value) -> Result<SourceDescriptor, ConfigurationError> {
    if !value.is_object() {
        return Err(ConfigurationError::NotAnObject { sensor: key });
    }

    let serialized = SerializedSourceDescriptor::deserialize(value).map_err(|source| ConfigurationError::Invalid { sensor: key, source })?;

    let name = required(key, "name", serialized.name)?;
    let latitude = parse_path(key, "latitude", &required(key, "latitude", serialized.latitude)?)?;
    let longitude = parse_path(key, "longitude", &required(key, "longitude", serialized.longitude)?)?;
    let updated = serialized.updated.map(|path| parse_path(key, "updated", &path)).transpose()?;

    match (&updated, serialized.expire) {
        (Some(_), None) => warn!("⚠️ {} sets 'updated' without 'expire', freshness checking is disabled", key),
        (None, Some(_)) => warn!("⚠️ {} sets 'expire' without 'updated', freshness checking is disabled", key),
        _ => {}
    }

    Ok(SourceDescriptor::new(name, latitude, longitude, updated, serialized.expire))
}

fn required(key: SensorKey, field: &'static str, value: String) -> Result<String, ConfigurationError> {
    if value.is_empty() {
        return Err(ConfigurationError::MissingField { sensor: key, field });
    }
    Ok(value)
}

fn parse_path(key: SensorKey, field: &'static str, path: &str) -> Result<ReadingPath, ConfigurationError> {
    ReadingPath::parse(path).ok_or_else(|| ConfigurationError::InvalidPath {
        sensor: key,
        field,
        path: path.to_owned(),
    })
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("attributes must be an object")]
    InvalidAttributes,
    #[error("{sensor} if configured must be an object with name, latitude, and longitude fields")]
    NotAnObject { sensor: SensorKey },
    #[error("{sensor} if configured must have a non-empty '{field}' field")]
    MissingField { sensor: SensorKey, field: &'static str },
    #[error("{sensor} has an invalid '{field}' path '{path}'")]
    InvalidPath { sensor: SensorKey, field: &'static str, path: String },
    #[error("{sensor} is invalid: {source}")]
    Invalid { sensor: SensorKey, source: serde_json::Error },
}
