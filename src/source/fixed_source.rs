use crate::source::reading_source::{Reading, ReadingSource, SourceError};
use async_trait::async_trait;

/// A source that always returns the same reading, e.g. for a stationary location.
#[derive(Debug, Clone, Default)]
pub struct FixedSource {
    reading: Reading,
}

impl FixedSource {
    pub fn new(reading: Reading) -> Self {
        FixedSource { reading }
    }
}

#[async_trait]
impl ReadingSource for FixedSource {
    fn kind(&self) -> &'static str {
        "fixed"
    }

    async fn readings(&self) -> Result<Reading, SourceError> {
        Ok(self.reading.clone())
    }
}
