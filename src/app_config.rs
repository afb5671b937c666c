use config::{Config, ConfigError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    core: Core,
    #[serde(default)]
    sources: HashMap<String, SourceConfig>,
    sensor: Sensor,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("HAVERSINE").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn sources(&self) -> &HashMap<String, SourceConfig> {
        &self.sources
    }

    pub fn sensor(&self) -> &Sensor {
        &self.sensor
    }
}

#[derive(Debug, Deserialize)]
pub struct Core {
    poll_interval_ms: u64,
}

impl Core {
    pub fn poll_interval(&self) -> Duration {
        // A zero period would make the poll interval panic
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SourceConfig {
    Http { url: String, timeout_ms: Option<u64> },
    Fixed { reading: Map<String, Value> },
}

#[derive(Debug, Deserialize)]
pub struct Sensor {
    name: String,
    #[serde(default)]
    attributes: Value,
}

impl Sensor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw `sensor_1` / `sensor_2` attributes, validated when the sensor is configured.
    pub fn attributes(&self) -> &Value {
        &self.attributes
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core { poll_interval_ms: 1000 },
                sources: HashMap::new(),
                sensor: Sensor {
                    name: "haversine".to_string(),
                    attributes: Value::Null,
                },
            },
        }
    }

    pub fn source(mut self, name: &str, source: SourceConfig) -> Self {
        self.config.sources.insert(name.to_string(), source);
        self
    }

    pub fn attributes(mut self, attributes: Value) -> Self {
        self.config.sensor.attributes = attributes;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
