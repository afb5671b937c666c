mod attributes;
mod command;
mod descriptor;
mod expiry;
mod expiry_deserializer;
mod extract;
mod haversine_sensor;
mod reading_path;
mod sensors;
pub(in crate::sensor) mod serialized_attributes;

pub use extract::ExtractionError;
pub use haversine_sensor::HaversineSensor;
pub use reading_path::ReadingPath;
