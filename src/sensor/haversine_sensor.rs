use crate::domain::{Coordinate, DistanceResult, Readings};
use crate::sensor::attributes::{ConfigurationError, HaversineAttributes};
use crate::sensor::command::{CommandError, UnsupportedCommandError, ValidationError, parse_locations};
use crate::sensor::descriptor::SensorKey;
use crate::sensor::extract::{ExtractionError, extract_coordinate, extract_timestamp};
use crate::sensor::sensors::{ConfiguredSensor, Sensors};
use crate::source::{Reading, SourceError, SourceRegistry};
use arc_swap::ArcSwap;
use chrono::{DateTime, TimeDelta, Utc};
use futures::future;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Reports the great-circle distance between the locations of two sensors.
#[derive(Debug)]
pub struct HaversineSensor {
    name: String,
    sensors: ArcSwap<Sensors>,
}

impl HaversineSensor {
    pub fn new(name: String, attributes: &Value, registry: &SourceRegistry) -> Result<Self, ConfigurationError> {
        let attributes = HaversineAttributes::from_value(attributes)?;
        Ok(HaversineSensor {
            name,
            sensors: ArcSwap::from_pointee(Sensors::resolve(&attributes, registry)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the configured sensors. Calls in flight keep the sensors they started with.
    #[instrument(fields(sensor = %self.name), skip_all)]
    pub fn reconfigure(&self, attributes: &Value, registry: &SourceRegistry) -> Result<(), ConfigurationError> {
        let attributes = HaversineAttributes::from_value(attributes)?;
        self.sensors.store(Arc::new(Sensors::resolve(&attributes, registry)));
        info!("🔧 Reconfigured sensors: {}", attributes.dependencies().join(", "));
        Ok(())
    }

    pub async fn get_readings(&self) -> Result<Readings, DistanceError> {
        self.get_readings_at(Utc::now()).await
    }

    #[instrument(fields(sensor = %self.name), skip(self))]
    pub async fn get_readings_at(&self, now: DateTime<Utc>) -> Result<Readings, DistanceError> {
        let sensors = self.sensors.load_full();
        match sensors.as_ref() {
            Sensors::None => {
                warn!("⚠️ No sensors configured, returning empty readings");
                Ok(Readings::Empty)
            }
            Sensors::One(sensor) => {
                warn!("⚠️ Only {} is configured, returning empty readings", sensor.key());
                Ok(Readings::Empty)
            }
            Sensors::Both(first, second) => distance_between(first, second, now).await,
        }
    }

    #[instrument(fields(sensor = %self.name), skip_all)]
    pub fn do_command(&self, command: &Value) -> Result<DistanceResult, DistanceError> {
        let (location_1, location_2) = parse_locations(command)?;
        debug!("📍 Calculating distance between {:?} and {:?}", location_1, location_2);
        Ok(DistanceResult::between(location_1, location_2))
    }
}

async fn distance_between(first: &ConfiguredSensor, second: &ConfiguredSensor, now: DateTime<Utc>) -> Result<Readings, DistanceError> {
    let mut checked = [None, None];
    for (slot, sensor) in checked.iter_mut().zip([first, second]) {
        match check_freshness(sensor, now).await? {
            Freshness::Stale => return Ok(Readings::Empty),
            Freshness::Fresh(reading) => *slot = Some(reading),
            Freshness::Unchecked => {}
        }
    }

    let [first_checked, second_checked] = checked;
    let (first_reading, second_reading) = future::try_join(reading_of(first, first_checked), reading_of(second, second_checked)).await?;
    debug!("🛰️ {} reading: {:?}", first.key(), first_reading);
    debug!("🛰️ {} reading: {:?}", second.key(), second_reading);

    let location_1 = coordinate_of(first, &first_reading)?;
    let location_2 = coordinate_of(second, &second_reading)?;
    debug!("📍 Extracted coordinates {:?} and {:?}", location_1, location_2);

    Ok(Readings::Distance(DistanceResult::between(location_1, location_2)))
}

enum Freshness {
    Fresh(Reading),
    Stale,
    Unchecked,
}

async fn check_freshness(sensor: &ConfiguredSensor, now: DateTime<Utc>) -> Result<Freshness, DistanceError> {
    let Some((updated, expire)) = sensor.descriptor().freshness() else {
        return Ok(Freshness::Unchecked);
    };

    let reading = pull(sensor).await?;
    let updated_at = extract_timestamp(&reading, updated).map_err(|e| extraction_error(sensor, e))?;

    let age = now - updated_at;
    let max_age = TimeDelta::from_std(expire.duration()).unwrap_or(TimeDelta::MAX);
    if age > max_age {
        warn!(
            sensor = %sensor.key(),
            "⚠️ Reading of '{}' is stale, updated at {} which is more than {} ago",
            sensor.descriptor().name(),
            updated_at.to_rfc3339(),
            expire
        );
        return Ok(Freshness::Stale);
    }

    Ok(Freshness::Fresh(reading))
}

async fn reading_of(sensor: &ConfiguredSensor, checked: Option<Reading>) -> Result<Reading, DistanceError> {
    match checked {
        Some(reading) => Ok(reading),
        None => pull(sensor).await,
    }
}

async fn pull(sensor: &ConfiguredSensor) -> Result<Reading, DistanceError> {
    sensor.source().readings().await.map_err(|error| {
        error!("❌ Could not get readings of {} '{}': {}", sensor.key(), sensor.descriptor().name(), error);
        DistanceError::Source {
            sensor: sensor.key(),
            source_name: sensor.descriptor().name().to_owned(),
            error,
        }
    })
}

fn coordinate_of(sensor: &ConfiguredSensor, reading: &Reading) -> Result<Coordinate, DistanceError> {
    extract_coordinate(reading, sensor.descriptor()).map_err(|e| extraction_error(sensor, e))
}

fn extraction_error(sensor: &ConfiguredSensor, error: ExtractionError) -> DistanceError {
    error!("❌ Error extracting from {} '{}': {}", sensor.key(), sensor.descriptor().name(), error);
    DistanceError::Extraction {
        sensor: sensor.key(),
        source_name: sensor.descriptor().name().to_owned(),
        error,
    }
}

#[derive(Error, Debug)]
pub enum DistanceError {
    #[error("{sensor} ('{source_name}'): {error}")]
    Extraction {
        sensor: SensorKey,
        source_name: String,
        #[source]
        error: ExtractionError,
    },
    #[error("{sensor} ('{source_name}'): {error}")]
    Source {
        sensor: SensorKey,
        source_name: String,
        #[source]
        error: SourceError,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    UnsupportedCommand(#[from] UnsupportedCommandError),
}

impl From<CommandError> for DistanceError {
    fn from(error: CommandError) -> Self {
        match error {
            CommandError::Validation(error) => DistanceError::Validation(error),
            CommandError::Unsupported(error) => DistanceError::UnsupportedCommand(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ReadingSource;
    use crate::source::fixed_source::FixedSource;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_log::test;
    use tokio::sync::Notify;
    use tracing::subscriber::DefaultGuard;

    /// Collects formatted log lines while the guard returned by `capture` is alive.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn capture(&self) -> DefaultGuard {
            let logs = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .with_writer(move || logs.clone())
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        fn contains(&self, text: &str) -> bool {
            String::from_utf8_lossy(&self.0.lock().unwrap()).contains(text)
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct CountingSource {
        reading: Reading,
        pulls: AtomicUsize,
    }

    impl CountingSource {
        fn new(reading: Reading) -> Arc<Self> {
            Arc::new(CountingSource {
                reading,
                pulls: AtomicUsize::new(0),
            })
        }

        fn pulls(&self) -> usize {
            self.pulls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReadingSource for CountingSource {
        fn kind(&self) -> &'static str {
            "counting"
        }

        async fn readings(&self) -> Result<Reading, SourceError> {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reading.clone())
        }
    }

    #[derive(Debug)]
    struct GatedSource {
        reading: Reading,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl ReadingSource for GatedSource {
        fn kind(&self) -> &'static str {
            "gated"
        }

        async fn readings(&self) -> Result<Reading, SourceError> {
            self.gate.notified().await;
            Ok(self.reading.clone())
        }
    }

    #[derive(Debug)]
    struct BrokenSource;

    #[async_trait]
    impl ReadingSource for BrokenSource {
        fn kind(&self) -> &'static str {
            "broken"
        }

        async fn readings(&self) -> Result<Reading, SourceError> {
            Err(SourceError::NotAnObject {
                url: "http://gps.local/readings".to_string(),
                found: "a string",
            })
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn reading(latitude: f64, longitude: f64, updated_at: &str) -> Reading {
        json!({ "position": { "lat": latitude, "lng": longitude, "updated_at": updated_at } })
            .as_object()
            .cloned()
            .unwrap()
    }

    fn lyon(updated_at: &str) -> Reading {
        reading(45.7597, 4.8422, updated_at)
    }

    fn paris(updated_at: &str) -> Reading {
        reading(48.8567, 2.3508, updated_at)
    }

    fn sensor_attributes(name: &str, expire: Option<&str>) -> Value {
        let mut attributes = json!({ "name": name, "latitude": "position.lat", "longitude": "position.lng" });
        if let Some(expire) = expire {
            attributes["updated"] = json!("position.updated_at");
            attributes["expire"] = json!(expire);
        }
        attributes
    }

    fn both(expire_1: Option<&str>, expire_2: Option<&str>) -> Value {
        json!({
            "sensor_1": sensor_attributes("gps", expire_1),
            "sensor_2": sensor_attributes("home", expire_2),
        })
    }

    fn registry(gps: Arc<dyn ReadingSource>, home: Arc<dyn ReadingSource>) -> SourceRegistry {
        let mut registry = SourceRegistry::new();
        registry.register("gps".to_string(), gps);
        registry.register("home".to_string(), home);
        registry
    }

    fn fixed(reading: Reading) -> Arc<dyn ReadingSource> {
        Arc::new(FixedSource::new(reading))
    }

    fn sensor(attributes: Value, registry: &SourceRegistry) -> HaversineSensor {
        HaversineSensor::new("haversine".to_string(), &attributes, registry).unwrap()
    }

    const FRESH: &str = "2026-10-19T11:55:00Z";
    const STALE: &str = "2026-10-19T11:00:00Z";

    #[tokio::test]
    async fn get_readings_is_empty_without_sensors() -> Result<(), DistanceError> {
        let logs = CapturedLogs::default();
        let _guard = logs.capture();
        let registry = registry(fixed(lyon(FRESH)), fixed(paris(FRESH)));
        let sensor = sensor(json!({}), &registry);

        let readings = sensor.get_readings_at(now()).await?;

        assert_eq!(readings, Readings::Empty);
        assert_eq!(serde_json::to_value(&readings).unwrap(), json!({}));
        assert!(logs.contains("No sensors configured, returning empty readings"));
        Ok(())
    }

    #[tokio::test]
    async fn get_readings_is_empty_with_only_sensor_1() -> Result<(), DistanceError> {
        let logs = CapturedLogs::default();
        let _guard = logs.capture();
        let registry = registry(fixed(lyon(FRESH)), fixed(paris(FRESH)));
        let sensor = sensor(json!({ "sensor_1": sensor_attributes("gps", None) }), &registry);

        assert_eq!(sensor.get_readings_at(now()).await?, Readings::Empty);
        assert!(logs.contains("Only sensor_1 is configured, returning empty readings"));
        Ok(())
    }

    #[test(tokio::test)]
    async fn get_readings_is_empty_when_a_source_is_not_registered() -> Result<(), DistanceError> {
        let mut registry = SourceRegistry::new();
        registry.register("gps".to_string(), fixed(lyon(FRESH)));
        let sensor = sensor(both(None, None), &registry);

        assert_eq!(sensor.get_readings_at(now()).await?, Readings::Empty);
        Ok(())
    }

    #[test(tokio::test)]
    async fn get_readings_matches_the_direct_command_for_fresh_readings() -> Result<(), DistanceError> {
        let registry = registry(fixed(lyon(FRESH)), fixed(paris(FRESH)));
        let sensor = sensor(both(Some("10m"), Some("10m")), &registry);

        let readings = sensor.get_readings_at(now()).await?;
        let command = sensor.do_command(&json!({
            "location_1": { "latitude": 45.7597, "longitude": 4.8422 },
            "location_2": { "latitude": 48.8567, "longitude": 2.3508 }
        }))?;

        assert_eq!(readings, Readings::Distance(command));
        assert_eq!(
            serde_json::to_value(&readings).unwrap(),
            json!({
                "distance_km": 392.22,
                "distance_miles": 243.71,
                "distance_nautical_miles": 211.78,
                "location_1": { "latitude": 45.7597, "longitude": 4.8422 },
                "location_2": { "latitude": 48.8567, "longitude": 2.3508 },
            })
        );
        Ok(())
    }

    #[test(tokio::test)]
    async fn get_readings_skips_freshness_without_expiry_fields() -> Result<(), DistanceError> {
        let registry = registry(fixed(lyon(STALE)), fixed(paris("not a timestamp")));
        let sensor = sensor(both(None, None), &registry);

        let readings = sensor.get_readings_at(now()).await?;

        assert!(!readings.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn get_readings_is_empty_when_sensor_1_is_stale() -> Result<(), DistanceError> {
        let logs = CapturedLogs::default();
        let _guard = logs.capture();
        let home = CountingSource::new(paris(FRESH));
        let registry = registry(fixed(lyon(STALE)), home.clone());
        let sensor = sensor(both(Some("10m"), None), &registry);

        assert_eq!(sensor.get_readings_at(now()).await?, Readings::Empty);
        assert_eq!(home.pulls(), 0);
        assert!(logs.contains("Reading of 'gps' is stale, updated at 2026-10-19T11:00:00+00:00 which is more than 10m ago"));
        assert!(!logs.contains("Reading of 'home' is stale"));
        Ok(())
    }

    #[tokio::test]
    async fn get_readings_is_empty_when_sensor_2_is_stale() -> Result<(), DistanceError> {
        let logs = CapturedLogs::default();
        let _guard = logs.capture();
        let registry = registry(fixed(lyon(FRESH)), fixed(paris(STALE)));
        let sensor = sensor(both(Some("10m"), Some("30m")), &registry);

        assert_eq!(sensor.get_readings_at(now()).await?, Readings::Empty);
        assert!(logs.contains("Reading of 'home' is stale"));
        assert!(!logs.contains("Reading of 'gps' is stale"));
        Ok(())
    }

    #[rstest::rstest]
    #[case::exactly_at_expiry("2026-10-19T11:50:00Z")]
    #[case::in_the_future("2026-10-19T12:30:00Z")]
    #[case::with_offset("2026-10-19T13:55:00+02:00")]
    #[tokio::test]
    async fn get_readings_treats_readings_within_expiry_as_fresh(#[case] updated_at: &str) -> Result<(), DistanceError> {
        let registry = registry(fixed(lyon(updated_at)), fixed(paris(FRESH)));
        let sensor = sensor(both(Some("10m"), None), &registry);

        assert!(!sensor.get_readings_at(now()).await?.is_empty());
        Ok(())
    }

    #[test(tokio::test)]
    async fn get_readings_pulls_each_source_once() -> Result<(), DistanceError> {
        let gps = CountingSource::new(lyon(FRESH));
        let home = CountingSource::new(paris(FRESH));
        let registry = registry(gps.clone(), home.clone());
        let sensor = sensor(both(Some("1h"), None), &registry);

        sensor.get_readings_at(now()).await?;

        assert_eq!(gps.pulls(), 1);
        assert_eq!(home.pulls(), 1);
        Ok(())
    }

    #[test(tokio::test)]
    async fn get_readings_fails_for_a_missing_coordinate() {
        let broken = json!({ "position": { "lat": 45.7597 } }).as_object().cloned().unwrap();
        let registry = registry(fixed(lyon(FRESH)), fixed(broken));
        let sensor = sensor(both(None, None), &registry);

        let result = sensor.get_readings_at(now()).await;

        match result {
            Err(DistanceError::Extraction { sensor, source_name, error }) => {
                assert_eq!(sensor, SensorKey::Sensor2);
                assert_eq!(source_name, "home");
                assert!(matches!(error, ExtractionError::MissingKey { key, .. } if key == "lng"));
            }
            other => panic!("expected an extraction error, got {other:?}"),
        }
    }

    #[test(tokio::test)]
    async fn get_readings_fails_for_an_invalid_timestamp() {
        let registry = registry(fixed(lyon("last tuesday")), fixed(paris(FRESH)));
        let sensor = sensor(both(Some("10m"), None), &registry);

        let result = sensor.get_readings_at(now()).await;

        assert!(matches!(
            result,
            Err(DistanceError::Extraction {
                sensor: SensorKey::Sensor1,
                error: ExtractionError::InvalidTimestamp { .. },
                ..
            })
        ));
    }

    #[test(tokio::test)]
    async fn get_readings_fails_when_a_source_fails() {
        let registry = registry(fixed(lyon(FRESH)), Arc::new(BrokenSource));
        let sensor = sensor(both(None, None), &registry);

        let result = sensor.get_readings_at(now()).await;

        assert!(matches!(result, Err(DistanceError::Source { sensor: SensorKey::Sensor2, .. })));
    }

    #[test]
    fn do_command_calculates_the_distance() -> Result<(), DistanceError> {
        let sensor = sensor(json!({}), &SourceRegistry::new());

        let result = sensor.do_command(&json!({
            "location_1": { "latitude": 45.7597, "longitude": 4.8422 },
            "location_2": { "latitude": 48.8567, "longitude": 2.3508 }
        }))?;

        assert!((result.km() - 392.21).abs() < 0.02);
        assert!((result.miles() - 243.71).abs() < 0.01);
        assert!((result.nautical_miles() - 211.78).abs() < 0.01);
        Ok(())
    }

    #[test]
    fn do_command_fails_for_an_out_of_range_latitude() {
        let sensor = sensor(json!({}), &SourceRegistry::new());

        let result = sensor.do_command(&json!({
            "location_1": { "latitude": 200, "longitude": 4.8422 },
            "location_2": { "latitude": 48.8567, "longitude": 2.3508 }
        }));

        assert!(matches!(
            result,
            Err(DistanceError::Validation(ValidationError::OutOfRange {
                location: "location_1",
                field: "latitude",
                ..
            }))
        ));
    }

    #[test]
    fn do_command_fails_for_an_unsupported_command() {
        let sensor = sensor(json!({}), &SourceRegistry::new());

        let result = sensor.do_command(&json!({ "command": "reset" }));

        assert!(matches!(result, Err(DistanceError::UnsupportedCommand(_))));
    }

    #[test]
    fn new_fails_for_an_incomplete_sensor() {
        let result = HaversineSensor::new(
            "haversine".to_string(),
            &json!({ "sensor_1": { "name": "gps", "latitude": "lat" } }),
            &SourceRegistry::new(),
        );

        assert!(matches!(result, Err(ConfigurationError::MissingField { field: "longitude", .. })));
    }

    #[test(tokio::test)]
    async fn reconfigure_replaces_the_sensors() -> Result<(), Box<dyn std::error::Error>> {
        let registry = registry(fixed(lyon(FRESH)), fixed(paris(FRESH)));
        let sensor = sensor(json!({}), &registry);
        assert!(sensor.get_readings_at(now()).await?.is_empty());

        sensor.reconfigure(&both(None, None), &registry)?;
        assert!(!sensor.get_readings_at(now()).await?.is_empty());

        Ok(())
    }

    #[test(tokio::test)]
    async fn reconfigure_keeps_the_sensors_when_the_attributes_are_invalid() -> Result<(), DistanceError> {
        let registry = registry(fixed(lyon(FRESH)), fixed(paris(FRESH)));
        let sensor = sensor(both(None, None), &registry);

        let result = sensor.reconfigure(&json!({ "sensor_1": { "name": "gps" } }), &registry);

        assert!(result.is_err());
        assert!(!sensor.get_readings_at(now()).await?.is_empty());
        Ok(())
    }

    #[test(tokio::test)]
    async fn calls_in_flight_keep_the_sensors_they_started_with() -> Result<(), Box<dyn std::error::Error>> {
        let gate = Arc::new(Notify::new());
        let gps = Arc::new(GatedSource {
            reading: lyon(FRESH),
            gate: gate.clone(),
        });
        let registry = registry(gps, fixed(paris(FRESH)));
        let sensor = Arc::new(sensor(both(None, None), &registry));

        let in_flight = tokio::spawn({
            let sensor = sensor.clone();
            async move { sensor.get_readings_at(now()).await }
        });
        tokio::task::yield_now().await;

        sensor.reconfigure(&json!({}), &registry)?;
        gate.notify_one();

        assert!(!in_flight.await??.is_empty());
        assert!(sensor.get_readings_at(now()).await?.is_empty());
        Ok(())
    }
}
