//! Synthetic gravity scenarios and the motion source that replays them.

use std::time::Duration as StdDuration;

use aimsense_core::MountOrientation;
use aimsense_core::sensors::{MotionEvent, MotionSource, RawAcceleration, SensorError};
use embassy_time::{Duration, Instant};
use log::debug;

/// Standard gravity (m/s²)
const G: f64 = 9.81;

/// Scripted movements of the phone, expressed as canonical roll over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Lying flat, tiny sensor noise
    Flat,
    /// Lying on a 10° slope
    Tilted,
    /// User adjusting from 6° down to level
    Settle,
    /// Held vertical with a slight wobble
    Upright,
    /// Level, knocked for 200 ms, level again
    Knock,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Self::Flat,
        Self::Tilted,
        Self::Settle,
        Self::Upright,
        Self::Knock,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Tilted => "tilted",
            Self::Settle => "settle",
            Self::Upright => "upright",
            Self::Knock => "knock",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// How long the scenario runs
    pub const fn duration(self) -> StdDuration {
        match self {
            Self::Flat | Self::Tilted | Self::Upright => StdDuration::from_secs(2),
            Self::Settle | Self::Knock => StdDuration::from_secs(4),
        }
    }

    /// Canonical roll (degrees) at `t` seconds into the scenario
    fn roll_deg(self, t: f64) -> f64 {
        // Sensor jitter: two incommensurate sines stay well under 0.1°
        let jitter = 0.04 * (t * 37.0).sin() + 0.02 * (t * 91.0).cos();
        match self {
            Self::Flat => jitter,
            Self::Tilted => 10.0 + jitter,
            Self::Settle => 6.0 * (1.0 - t / 2.0).max(0.0) + jitter,
            Self::Upright => 90.0 + 0.2 * (t * 3.0).sin() + jitter,
            Self::Knock => {
                if (1.5..1.7).contains(&t) {
                    3.0 + jitter
                } else {
                    jitter
                }
            }
        }
    }

    /// Gravity in canonical portrait axes at `t` seconds
    fn canonical_gravity(self, t: f64) -> (f64, f64, f64) {
        let roll = self.roll_deg(t).to_radians();
        (0.0, G * roll.sin(), G * roll.cos())
    }
}

/// Inverse of the core remap: canonical axes back to device-native axes.
fn to_device((x, y, z): (f64, f64, f64), mount: MountOrientation) -> (f64, f64, f64) {
    match mount {
        MountOrientation::Portrait => (x, y, z),
        MountOrientation::PortraitUpsideDown => (-x, -y, z),
        MountOrientation::LandscapeLeft => (-y, x, z),
        MountOrientation::LandscapeRight => (y, -x, z),
    }
}

/// Replays a [`Scenario`] as a device-motion feed.
///
/// In real-time mode each tick sleeps for the requested interval and is
/// stamped with the wall clock; otherwise a synthetic clock advances by the
/// interval and the feed runs as fast as it can be consumed.
pub struct SimulatedMotionSource {
    scenario: Scenario,
    mount: MountOrientation,
    realtime: bool,
    interval: Option<Duration>,
    elapsed: Duration,
    started_at: Option<Instant>,
    /// Drop every Nth tick's payload to exercise the skip path
    drop_every: Option<u64>,
    ticks: u64,
}

impl SimulatedMotionSource {
    pub fn new(scenario: Scenario, mount: MountOrientation, realtime: bool) -> Self {
        Self {
            scenario,
            mount,
            realtime,
            interval: None,
            elapsed: Duration::from_ticks(0),
            started_at: None,
            drop_every: None,
            ticks: 0,
        }
    }

    pub fn drop_every(mut self, n: u64) -> Self {
        self.drop_every = (n > 0).then_some(n);
        self
    }
}

impl MotionSource for SimulatedMotionSource {
    fn start(&mut self, interval: Duration) -> Result<(), SensorError> {
        self.interval = Some(interval);
        self.elapsed = Duration::from_ticks(0);
        self.started_at = Some(if self.realtime {
            Instant::now()
        } else {
            Instant::from_ticks(0)
        });
        self.ticks = 0;
        Ok(())
    }

    fn stop(&mut self) {
        if self.interval.take().is_some() {
            debug!("Simulated feed '{}' stopped", self.scenario.name());
        }
    }

    async fn next_event(&mut self) -> Result<MotionEvent, SensorError> {
        let (Some(interval), Some(started_at)) = (self.interval, self.started_at) else {
            return Err(SensorError::Closed);
        };

        if self.elapsed.as_millis() >= self.scenario.duration().as_millis() as u64 {
            return Err(SensorError::Closed);
        }

        // Let the reading logger run between ticks
        embassy_futures::yield_now().await;

        if self.realtime && self.ticks > 0 {
            std::thread::sleep(StdDuration::from_micros(interval.as_micros()));
        }
        let offset = self.elapsed;
        self.elapsed += interval;
        self.ticks += 1;

        let timestamp = if self.realtime {
            Instant::now()
        } else {
            started_at + offset
        };

        if self.drop_every.is_some_and(|n| self.ticks % n == 0) {
            return Ok(MotionEvent::empty(timestamp));
        }

        let t = offset.as_micros() as f64 / 1_000_000.0;
        let (x, y, z) = to_device(self.scenario.canonical_gravity(t), self.mount);
        Ok(MotionEvent::new(
            RawAcceleration::new(x as f32, y as f32, z as f32),
            timestamp,
        ))
    }
}
