use crate::sensor::expiry::Expiry;
use crate::sensor::reading_path::ReadingPath;
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SensorKey {
    Sensor1,
    Sensor2,
}

impl SensorKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKey::Sensor1 => "sensor_1",
            SensorKey::Sensor2 => "sensor_2",
        }
    }

    pub fn all() -> [SensorKey; 2] {
        [SensorKey::Sensor1, SensorKey::Sensor2]
    }
}

impl Display for SensorKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to find a location inside the readings of a named source.
#[derive(Clone, PartialEq, Debug)]
pub struct SourceDescriptor {
    name: String,
    latitude: ReadingPath,
    longitude: ReadingPath,
    updated: Option<ReadingPath>,
    expire: Option<Expiry>,
}

impl SourceDescriptor {
    pub fn new(name: String, latitude: ReadingPath, longitude: ReadingPath, updated: Option<ReadingPath>, expire: Option<Expiry>) -> Self {
        SourceDescriptor {
            name,
            latitude,
            longitude,
            updated,
            expire,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitude(&self) -> &ReadingPath {
        &self.latitude
    }

    pub fn longitude(&self) -> &ReadingPath {
        &self.longitude
    }

    pub fn expire(&self) -> Option<Expiry> {
        self.expire
    }

    /// The timestamp path and expiry window, only when both are configured.
    pub fn freshness(&self) -> Option<(&ReadingPath, Expiry)> {
        match (&self.updated, self.expire) {
            (Some(updated), Some(expire)) => Some((updated, expire)),
            _ => None,
        }
    }
}
