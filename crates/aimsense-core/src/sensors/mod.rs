//! Motion feeds: the platform source trait, its scoped subscription and the
//! raw payload types.

mod scripted;

use embassy_time::{Duration, Instant};
use log::info;
use thiserror_no_std::Error;

use crate::gravity::GravitySample;

pub use scripted::ScriptedMotionSource;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("Motion sensor is not available on this device")]
    Unavailable,
    #[error("Permission to read motion data was denied")]
    PermissionDenied,
    #[error("Failed to read motion data: {details}")]
    ReadFailed { details: &'static str },
    #[error("Motion feed closed")]
    Closed,
}

/// Acceleration-including-gravity payload as the platform hands it over.
///
/// Platform feeds may leave individual components out.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawAcceleration {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl RawAcceleration {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// Missing components read as 0. Returns `None` if any component is not
    /// finite.
    pub fn to_sample(&self) -> Option<GravitySample> {
        let sample = GravitySample::new(
            self.x.unwrap_or(0.0),
            self.y.unwrap_or(0.0),
            self.z.unwrap_or(0.0),
        );
        sample.is_finite().then_some(sample)
    }
}

/// One tick from a motion feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEvent {
    /// `None` when the platform delivered a tick without gravity data
    pub acceleration_including_gravity: Option<RawAcceleration>,
    /// When the tick was observed
    pub timestamp: Instant,
}

impl MotionEvent {
    pub const fn new(acceleration: RawAcceleration, timestamp: Instant) -> Self {
        Self {
            acceleration_including_gravity: Some(acceleration),
            timestamp,
        }
    }

    /// A tick that carried no gravity payload
    pub const fn empty(timestamp: Instant) -> Self {
        Self {
            acceleration_including_gravity: None,
            timestamp,
        }
    }

    /// The usable gravity sample, if this tick has one
    pub fn gravity(&self) -> Option<GravitySample> {
        self.acceleration_including_gravity
            .as_ref()
            .and_then(RawAcceleration::to_sample)
    }
}

/// Trait for platform motion feeds (device-motion, IMU drivers, replays).
pub trait MotionSource {
    /// Begin delivering events at roughly `interval`.
    fn start(&mut self, interval: Duration) -> Result<(), SensorError>;

    /// Stop delivering events. Must be safe to call more than once.
    fn stop(&mut self);

    /// Wait for the next event. [`SensorError::Closed`] ends the feed.
    fn next_event(&mut self) -> impl Future<Output = Result<MotionEvent, SensorError>>;
}

/// Scoped subscription to a [`MotionSource`].
///
/// Acquiring starts the source; dropping the guard stops it, whichever way
/// the owner exits (including its future being dropped mid-await).
pub struct MotionSubscription<'a, S: MotionSource> {
    source: &'a mut S,
}

impl<'a, S: MotionSource> MotionSubscription<'a, S> {
    pub fn acquire(source: &'a mut S, interval: Duration) -> Result<Self, SensorError> {
        source.start(interval)?;
        info!("Motion subscription started ({} ms)", interval.as_millis());
        Ok(Self { source })
    }

    pub async fn next_event(&mut self) -> Result<MotionEvent, SensorError> {
        self.source.next_event().await
    }
}

impl<S: MotionSource> Drop for MotionSubscription<'_, S> {
    fn drop(&mut self) {
        self.source.stop();
        info!("Motion subscription released");
    }
}
