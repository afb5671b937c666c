pub mod fixed_source;
pub mod http_source;
mod reading_source;
mod registry;

pub use reading_source::{Reading, ReadingSource, SourceError};
pub use registry::SourceRegistry;
