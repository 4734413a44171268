//! Desktop replay harness for the AimSense level-calibration engine.
//!
//! Feeds synthetic gravity scenarios through `aimsense-core`'s level monitor
//! and logs the readings a calibration screen would show.
//!
//! # Usage
//!
//! ```text
//! aimsense-simulator [SCENARIO | all | calibrate] [--fast]
//! ```
//!
//! | Scenario  | Motion                                   |
//! |-----------|------------------------------------------|
//! | flat      | Lying flat with sensor jitter            |
//! | tilted    | Resting on a 10° slope                   |
//! | settle    | Adjusted from 6° down to level           |
//! | upright   | Held vertical with a slight wobble       |
//! | knock     | Level, bumped for 200 ms, level again    |
//! | all       | Every scenario in sequence (default)     |
//! | calibrate | Full calibration flow, saved to disk     |
//!
//! `--fast` replays on a synthetic clock instead of sleeping between ticks.
//!
//! # Environment
//!
//! | Variable                              | Default     |
//! |---------------------------------------|-------------|
//! | `AIMSENSE_MOUNT`                      | `portrait`  |
//! | `AIMSENSE_STORE_DIR`                  | `.aimsense` |
//! | `AIMSENSE_DROP_EVERY`                 | off         |
//! | `AIMSENSE_TOLERANCE_DEG`              | 0.5         |
//! | `AIMSENSE_HOLD_MS`                    | 600         |
//! | `AIMSENSE_ZERO_ENTER_DEG`             | 0.12        |
//! | `AIMSENSE_ZERO_EXIT_DEG`              | 0.6         |
//! | `AIMSENSE_SMOOTHING_ALPHA`            | 0.18        |
//! | `AIMSENSE_FLAT_ENTER_GZ`              | 0.85        |
//! | `AIMSENSE_FLAT_EXIT_GZ`               | 0.75        |
//! | `AIMSENSE_UPDATE_INTERVAL_MS`         | 60          |
//! | `AIMSENSE_RESET_ON_ORIENTATION_CHANGE`| false       |
//!
//! A `.env` file in the working directory is loaded first.

mod file_store;
mod scenario;

use std::convert::Infallible;
use std::env;
use std::process;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use embassy_futures::select::{Either, select};
use embassy_sync::pubsub::WaitResult;
use log::{error, info, warn};
use thiserror::Error;

use aimsense_core::calibration::{CalibrationError, CalibrationFlow, CalibrationRepository};
use aimsense_core::monitor::{LevelChannel, LevelEvent, LevelMonitor, LevelSubscriber, MountSetting};
use aimsense_core::sensors::SensorError;
use aimsense_core::{LevelConfig, LevelReading, MountOrientation};

use file_store::FileStore;
use scenario::{Scenario, SimulatedMotionSource};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const DEFAULT_STORE_DIR: &str = ".aimsense";

struct Settings {
    config: LevelConfig,
    mount: MountOrientation,
    store_dir: String,
    drop_every: Option<u64>,
    realtime: bool,
}

/// Overwrite `target` with `name` from the environment when it parses.
fn env_override<T: FromStr>(name: &str, target: &mut T) {
    let Ok(raw) = env::var(name) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!("Ignoring {}={:?}: not a valid value", name, raw),
    }
}

fn load_config() -> LevelConfig {
    let mut config = LevelConfig::default();
    env_override("AIMSENSE_TOLERANCE_DEG", &mut config.tolerance_deg);
    env_override("AIMSENSE_HOLD_MS", &mut config.hold_ms);
    env_override("AIMSENSE_ZERO_ENTER_DEG", &mut config.zero_enter_deg);
    env_override("AIMSENSE_ZERO_EXIT_DEG", &mut config.zero_exit_deg);
    env_override("AIMSENSE_SMOOTHING_ALPHA", &mut config.smoothing_alpha);
    env_override("AIMSENSE_FLAT_ENTER_GZ", &mut config.flat_enter_gz);
    env_override("AIMSENSE_FLAT_EXIT_GZ", &mut config.flat_exit_gz);
    env_override("AIMSENSE_UPDATE_INTERVAL_MS", &mut config.update_interval_ms);
    env_override(
        "AIMSENSE_RESET_ON_ORIENTATION_CHANGE",
        &mut config.reset_on_orientation_change,
    );
    config
}

fn load_settings(realtime: bool) -> Settings {
    let mount = env::var("AIMSENSE_MOUNT")
        .map(|s| MountOrientation::from_str_lossy(s.trim()))
        .unwrap_or_default();

    let mut drop_every = 0u64;
    env_override("AIMSENSE_DROP_EVERY", &mut drop_every);

    Settings {
        config: load_config(),
        mount,
        store_dir: env::var("AIMSENSE_STORE_DIR").unwrap_or_else(|_| DEFAULT_STORE_DIR.into()),
        drop_every: (drop_every > 0).then_some(drop_every),
        realtime,
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
enum RunError {
    #[error("motion feed failed: {0}")]
    Sensor(SensorError),
    #[error("level channel unavailable: {0:?}")]
    Channel(embassy_sync::pubsub::Error),
    #[error("calibration failed: {0}")]
    Calibration(CalibrationError),
}

impl From<SensorError> for RunError {
    fn from(value: SensorError) -> Self {
        Self::Sensor(value)
    }
}

impl From<embassy_sync::pubsub::Error> for RunError {
    fn from(value: embassy_sync::pubsub::Error) -> Self {
        Self::Channel(value)
    }
}

impl From<CalibrationError> for RunError {
    fn from(value: CalibrationError) -> Self {
        Self::Calibration(value)
    }
}

// ---------------------------------------------------------------------------
// Scenario replay
// ---------------------------------------------------------------------------

/// What the diagnostics subscriber saw during one replay.
#[derive(Default)]
struct ReadingLog {
    received: usize,
    lagged: u64,
    last: Option<LevelReading>,
    level_transitions: usize,
}

impl ReadingLog {
    fn record(&mut self, reading: LevelReading) {
        self.received += 1;
        let changed = self
            .last
            .is_none_or(|prev| prev.level_deg != reading.level_deg || prev.is_level != reading.is_level);
        if changed {
            info!(
                "  {:>4}°  {:<7}  {}  (smoothed {:+.2}°)",
                reading.level_deg,
                reading.mode.label(),
                if reading.is_level { "LEVEL" } else { "-----" },
                reading.smoothed_deg
            );
        }
        if self.last.is_some_and(|prev| prev.is_level != reading.is_level) {
            self.level_transitions += 1;
        }
        self.last = Some(reading);
    }

    fn handle(&mut self, result: WaitResult<LevelEvent>) {
        match result {
            WaitResult::Message(LevelEvent::Reading(reading)) => self.record(reading),
            WaitResult::Lagged(n) => {
                warn!("Diagnostics subscriber lagged by {} readings", n);
                self.lagged += n;
            }
        }
    }
}

/// Log readings as they are published; never finishes on its own.
async fn follow_readings(
    subscriber: &mut LevelSubscriber<'_>,
    seen: &mut ReadingLog,
) -> Infallible {
    loop {
        let result = subscriber.next_message().await;
        seen.handle(result);
    }
}

/// Replay `scenario` through a fresh monitor and return its final reading.
fn replay(
    scenario: Scenario,
    settings: &Settings,
    mount: &MountSetting,
) -> Result<LevelReading, RunError> {
    info!(
        "Scenario '{}' ({} s, mount {})",
        scenario.name(),
        scenario.duration().as_secs(),
        mount.get().label()
    );

    let channel = LevelChannel::new();
    let publisher = channel.publisher()?;
    let mut subscriber = channel.subscriber()?;

    let mut source = SimulatedMotionSource::new(scenario, mount.get(), settings.realtime);
    if let Some(n) = settings.drop_every {
        source = source.drop_every(n);
    }

    let mut monitor = LevelMonitor::new(settings.config, mount);
    let mut seen = ReadingLog::default();

    let outcome = embassy_futures::block_on(select(
        monitor.run(&mut source, &publisher),
        follow_readings(&mut subscriber, &mut seen),
    ));
    let processed = match outcome {
        Either::First(result) => result?,
        Either::Second(never) => match never {},
    };

    // Readings published after the subscriber's last poll
    while let Some(result) = subscriber.try_next_message() {
        seen.handle(result);
    }

    let reading = monitor.reading();
    info!(
        "Scenario '{}' done: {} samples, {} received, {} lagged, {} level changes, final {}° {}",
        scenario.name(),
        processed,
        seen.received,
        seen.lagged,
        seen.level_transitions,
        reading.level_deg,
        if reading.is_level { "level" } else { "not level" }
    );
    Ok(reading)
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

fn calibrate(settings: &Settings) -> Result<(), RunError> {
    let mut repo = CalibrationRepository::new(FileStore::new(&settings.store_dir));
    let mut flow = CalibrationFlow::load(&repo)?;

    match flow.result() {
        Some(saved) => info!(
            "Recalibrating (saved: {} at {})",
            saved.mount_orientation.label(),
            saved.calibrated_at_iso
        ),
        None => info!("No saved calibration in {}", settings.store_dir),
    }

    let mount = MountSetting::new(flow.mount_orientation());
    flow.begin()?;
    flow.select_orientation(settings.mount)?;
    mount.set(flow.confirm_orientation()?);
    info!("Mount set to {}, hold the phone level", mount.get().description());

    let reading = replay(Scenario::Settle, settings, &mount)?;
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    match flow.finish(reading, &now, &mut repo) {
        Ok(result) => {
            info!(
                "Calibrated {} at {} (zero {:?})",
                result.mount_orientation.label(),
                result.calibrated_at_iso,
                result.level_zero_roll_deg
            );
            Ok(())
        }
        Err(CalibrationError::NotLevel) => {
            warn!("Phone never settled level; calibration cancelled");
            flow.cancel();
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let mut command = String::from("all");
    let mut realtime = true;
    for arg in env::args().skip(1) {
        if arg == "--fast" {
            realtime = false;
        } else {
            command = arg;
        }
    }

    let settings = load_settings(realtime);
    if let Err(e) = settings.config.validate() {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    info!("Starting AimSense simulator");
    info!(
        "Mount {}, tolerance ±{}°, hold {} ms, {} ms ticks{}",
        settings.mount,
        settings.config.tolerance_deg,
        settings.config.hold_ms,
        settings.config.update_interval_ms,
        if settings.realtime { "" } else { " (fast)" }
    );

    let result = match command.as_str() {
        "calibrate" => calibrate(&settings),
        "all" => {
            let mount = MountSetting::new(settings.mount);
            Scenario::ALL
                .into_iter()
                .try_for_each(|scenario| replay(scenario, &settings, &mount).map(|_| ()))
        }
        name => match Scenario::from_name(name) {
            Some(scenario) => {
                let mount = MountSetting::new(settings.mount);
                replay(scenario, &settings, &mount).map(|_| ())
            }
            None => {
                error!(
                    "Unknown scenario '{}'; expected one of: {}, all, calibrate",
                    name,
                    Scenario::ALL.map(Scenario::name).join(", ")
                );
                process::exit(2);
            }
        },
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
    info!("Simulator exiting");
}
