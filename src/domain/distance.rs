use crate::domain::Coordinate;
use crate::domain::haversine::{KM_TO_MILES, KM_TO_NAUTICAL_MILES, haversine_km};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// The distance between two coordinates in several units, derived from a single kilometer figure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DistanceResult {
    #[serde(serialize_with = "two_decimals")]
    distance_km: f64,
    #[serde(serialize_with = "two_decimals")]
    distance_miles: f64,
    #[serde(serialize_with = "two_decimals")]
    distance_nautical_miles: f64,
    location_1: Coordinate,
    location_2: Coordinate,
}

impl DistanceResult {
    pub fn between(location_1: Coordinate, location_2: Coordinate) -> Self {
        let distance_km = haversine_km(location_1, location_2);
        DistanceResult {
            distance_km,
            distance_miles: distance_km * KM_TO_MILES,
            distance_nautical_miles: distance_km * KM_TO_NAUTICAL_MILES,
            location_1,
            location_2,
        }
    }

    pub fn km(&self) -> f64 {
        self.distance_km
    }

    pub fn miles(&self) -> f64 {
        self.distance_miles
    }

    pub fn nautical_miles(&self) -> f64 {
        self.distance_nautical_miles
    }
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to_two_decimals(*value))
}

fn round_to_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Outcome of a polling call. Serializes to `{}` when there is nothing to report.
#[derive(Clone, Debug, PartialEq)]
pub enum Readings {
    Empty,
    Distance(DistanceResult),
}

impl Readings {
    pub fn is_empty(&self) -> bool {
        matches!(self, Readings::Empty)
    }

    pub fn distance(&self) -> Option<&DistanceResult> {
        match self {
            Readings::Empty => None,
            Readings::Distance(result) => Some(result),
        }
    }
}

impl Serialize for Readings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Readings::Empty => serializer.serialize_map(Some(0))?.end(),
            Readings::Distance(result) => result.serialize(serializer),
        }
    }
}
