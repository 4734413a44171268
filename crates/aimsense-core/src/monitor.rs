//! Async level monitor
//!
//! Drives a [`TiltEstimator`] from a [`MotionSource`] and publishes every
//! processed reading on a pub-sub channel, so the calibration screen and any
//! other consumer can follow the live angle.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};
use log::{debug, info, warn};

use crate::config::LevelConfig;
use crate::estimator::{LevelReading, TiltEstimator};
use crate::orientation::MountOrientation;
use crate::sensors::{MotionSource, MotionSubscription, SensorError};

/// Channel capacity for pub-sub events
/// Set to 8 to absorb a UI frame's worth of readings at 60 ms
pub const LEVEL_CHANNEL_CAPACITY: usize = 8;

/// Number of subscribers that can listen to level events
/// - Subscriber 0: calibration screen
/// - Subscriber 1: diagnostics / logging
pub const LEVEL_SUBSCRIBERS: usize = 2;

/// Number of publishers (just the monitor)
pub const LEVEL_PUBLISHERS: usize = 1;

/// Events published by the monitor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelEvent {
    /// A sample was processed
    Reading(LevelReading),
}

pub type LevelChannel = PubSubChannel<
    CriticalSectionRawMutex,
    LevelEvent,
    LEVEL_CHANNEL_CAPACITY,
    LEVEL_SUBSCRIBERS,
    LEVEL_PUBLISHERS,
>;

pub type LevelPublisher<'a> = Publisher<
    'a,
    CriticalSectionRawMutex,
    LevelEvent,
    LEVEL_CHANNEL_CAPACITY,
    LEVEL_SUBSCRIBERS,
    LEVEL_PUBLISHERS,
>;

pub type LevelSubscriber<'a> = Subscriber<
    'a,
    CriticalSectionRawMutex,
    LevelEvent,
    LEVEL_CHANNEL_CAPACITY,
    LEVEL_SUBSCRIBERS,
    LEVEL_PUBLISHERS,
>;

/// Mount orientation shared between the calibration flow (writer) and the
/// monitor (reader).
///
/// Changing it takes effect on the next sample without resetting the
/// estimator (unless the config asks for that).
pub struct MountSetting {
    inner: BlockingMutex<CriticalSectionRawMutex, Cell<MountOrientation>>,
}

impl MountSetting {
    pub const fn new(orientation: MountOrientation) -> Self {
        Self {
            inner: BlockingMutex::new(Cell::new(orientation)),
        }
    }

    pub fn get(&self) -> MountOrientation {
        self.inner.lock(|cell| cell.get())
    }

    pub fn set(&self, orientation: MountOrientation) {
        self.inner.lock(|cell| cell.set(orientation));
    }
}

impl Default for MountSetting {
    fn default() -> Self {
        Self::new(MountOrientation::Portrait)
    }
}

pub struct LevelMonitor<'a> {
    estimator: TiltEstimator,
    mount: &'a MountSetting,
}

impl<'a> LevelMonitor<'a> {
    pub fn new(config: LevelConfig, mount: &'a MountSetting) -> Self {
        Self {
            estimator: TiltEstimator::new(config),
            mount,
        }
    }

    pub fn estimator(&self) -> &TiltEstimator {
        &self.estimator
    }

    pub fn reading(&self) -> LevelReading {
        self.estimator.reading()
    }

    pub fn mount_orientation(&self) -> MountOrientation {
        self.mount.get()
    }

    /// Swap the mount orientation; state carries over to the next sample
    pub fn set_mount_orientation(&self, orientation: MountOrientation) {
        self.mount.set(orientation);
    }

    /// Subscribe to `source` and process events until the feed closes.
    ///
    /// Returns the number of samples processed. Read failures and ticks
    /// without gravity data are skipped. The subscription is released on
    /// return and when this future is dropped.
    pub async fn run<S: MotionSource>(
        &mut self,
        source: &mut S,
        publisher: &LevelPublisher<'_>,
    ) -> Result<usize, SensorError> {
        let interval = self.estimator.config().update_interval();
        let mut subscription = MotionSubscription::acquire(source, interval)?;
        let mut processed = 0;

        loop {
            match subscription.next_event().await {
                Ok(event) => {
                    let orientation = self.mount.get();
                    if let Some(reading) = self.estimator.on_motion(&event, orientation) {
                        // Never blocks; lagging subscribers lose the oldest readings
                        publisher.publish_immediate(LevelEvent::Reading(reading));
                        processed += 1;
                    }
                }
                Err(SensorError::Closed) => {
                    debug!("Motion feed closed");
                    break;
                }
                Err(e) => {
                    warn!("Skipping motion tick: {}", e);
                }
            }
        }

        info!("Level monitor stopped after {} samples", processed);
        Ok(processed)
    }
}
