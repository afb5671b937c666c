use crate::app_config::AppConfig;
use crate::sensor::HaversineSensor;
use crate::source::SourceRegistry;
use std::error::Error;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, instrument, warn};

mod app_config;
mod domain;
mod extensions;
mod sensor;
mod source;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!("✅  Loaded configuration");

    let (registry, sensor) = configure(&config)?;
    info!("✅  Configured sensor '{}' with {} source(s)", sensor.name(), registry.len());
    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));

    let reload = reload_signal()?;
    run(&sensor, config.core().poll_interval(), reload, tokio::signal::ctrl_c()).await;

    info!("👋 Stopped {}", env!("CARGO_PKG_NAME"));
    Ok(())
}

/// Polls the sensor on every tick and reloads on request until `shutdown` completes.
async fn run<F: Future>(sensor: &HaversineSensor, poll_interval: Duration, mut reload: Receiver<()>, shutdown: F) {
    let mut interval = time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => poll(sensor).await,
            Some(()) = reload.recv() => reload_config(sensor).await,
            _ = &mut shutdown => break,
        }
    }
}

fn configure(config: &AppConfig) -> Result<(SourceRegistry, HaversineSensor), Box<dyn Error>> {
    let registry = SourceRegistry::from_config(config.sources())?;
    let sensor = HaversineSensor::new(config.sensor().name().to_string(), config.sensor().attributes(), &registry)?;
    Ok((registry, sensor))
}

#[instrument(skip_all)]
async fn poll(sensor: &HaversineSensor) {
    let readings = match sensor.get_readings().await {
        Ok(readings) => readings,
        Err(e) => {
            error!("❌ Could not get readings: {}", e);
            return;
        }
    };

    let Some(distance) = readings.distance() else {
        info!("📏 No distance available");
        return;
    };

    match serde_json::to_string(&readings) {
        Ok(json) => info!(km = distance.km(), miles = distance.miles(), nautical_miles = distance.nautical_miles(), "📏 {}", json),
        Err(e) => error!("❌ Could not serialize readings: {}", e),
    }
}

/// Reloads the configuration and applies the new sources and attributes. The current sensors are kept on failure.
#[instrument(skip_all)]
async fn reload_config(sensor: &HaversineSensor) {
    info!("🔄 Reloading configuration...");
    let result = load_config().await.and_then(|config| apply_config(sensor, &config));

    match result {
        Ok(()) => info!("🔄 Reloading configuration... OK"),
        Err(e) => warn!("⚠️ Reloading configuration... failed, keeping the current sensors: {}", e),
    }
}

// Reading the config files blocks, keep it off the runtime threads
async fn load_config() -> Result<AppConfig, Box<dyn Error>> {
    Ok(tokio::task::spawn_blocking(AppConfig::load).await??)
}

fn apply_config(sensor: &HaversineSensor, config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let registry = SourceRegistry::from_config(config.sources())?;
    sensor.reconfigure(config.sensor().attributes(), &registry)?;
    Ok(())
}

#[cfg(unix)]
fn reload_signal() -> std::io::Result<tokio::sync::mpsc::Receiver<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    let (tx, rx) = tokio::sync::mpsc::channel(1);
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            if tx.send(()).await.is_err() {
                break;
            }
        }
    });
    Ok(rx)
}

// Hangup is unix only, the closed channel disables the reload branch
#[cfg(not(unix))]
fn reload_signal() -> std::io::Result<tokio::sync::mpsc::Receiver<()>> {
    let (_, rx) = tokio::sync::mpsc::channel(1);
    Ok(rx)
}
