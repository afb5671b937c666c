use crate::sensor::attributes::HaversineAttributes;
use crate::sensor::descriptor::{SensorKey, SourceDescriptor};
use crate::source::{ReadingSource, SourceRegistry};
use std::sync::Arc;
use tracing::warn;

/// A configured sensor whose source has been resolved.
#[derive(Debug, Clone)]
pub struct ConfiguredSensor {
    key: SensorKey,
    descriptor: SourceDescriptor,
    source: Arc<dyn ReadingSource>,
}

impl ConfiguredSensor {
    pub fn new(key: SensorKey, descriptor: SourceDescriptor, source: Arc<dyn ReadingSource>) -> Self {
        ConfiguredSensor { key, descriptor, source }
    }

    pub fn key(&self) -> SensorKey {
        self.key
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    pub fn source(&self) -> &dyn ReadingSource {
        self.source.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub enum Sensors {
    #[default]
    None,
    One(ConfiguredSensor),
    Both(ConfiguredSensor, ConfiguredSensor),
}

impl Sensors {
    /// Resolves the configured sensors against the registry. A sensor whose source is not registered is left out.
    pub fn resolve(attributes: &HaversineAttributes, registry: &SourceRegistry) -> Sensors {
        let mut resolved = SensorKey::all().into_iter().filter_map(|key| {
            let descriptor = attributes.sensor(key)?;
            match registry.get(descriptor.name()) {
                Some(source) => Some(ConfiguredSensor::new(key, descriptor.clone(), source)),
                None => {
                    warn!("⚠️ Configured {} '{}' not found in the registered sources", key, descriptor.name());
                    None
                }
            }
        });

        let sensors = match (resolved.next(), resolved.next()) {
            (Some(first), Some(second)) => Sensors::Both(first, second),
            (Some(sensor), None) => Sensors::One(sensor),
            _ => Sensors::None,
        };

        if !matches!(sensors, Sensors::Both(..)) {
            warn!("⚠️ One or both sensors not configured, readings will be empty and only commands are fully functional");
        }

        sensors
    }
}
