mod coordinate;
mod distance;
pub mod haversine;

pub use coordinate::Coordinate;
pub use distance::{DistanceResult, Readings};
