use crate::app_config::SourceConfig;
use crate::source::fixed_source::FixedSource;
use crate::source::http_source::HttpSource;
use crate::source::reading_source::{ReadingSource, SourceError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Named reading sources that sensors can depend on.
#[derive(Debug, Default, Clone)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn ReadingSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        SourceRegistry::default()
    }

    pub fn from_config(sources: &HashMap<String, SourceConfig>) -> Result<Self, SourceError> {
        let mut registry = SourceRegistry::new();
        for (name, config) in sources {
            let source: Arc<dyn ReadingSource> = match config {
                SourceConfig::Http { url, timeout_ms } => Arc::new(HttpSource::new(url.clone(), timeout_ms.map(Duration::from_millis))?),
                SourceConfig::Fixed { reading } => Arc::new(FixedSource::new(reading.clone())),
            };
            info!("🔌 Registered {} source '{}'", source.kind(), name);
            registry.register(name.clone(), source);
        }

        Ok(registry)
    }

    pub fn register(&mut self, name: String, source: Arc<dyn ReadingSource>) {
        self.sources.insert(name, source);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ReadingSource>> {
        self.sources.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }
}
