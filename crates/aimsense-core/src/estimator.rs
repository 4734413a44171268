//! Tilt/level estimator
//!
//! One sample flows through: remap(orientation) → mode classification →
//! signed cant → EMA → display quantization → level gate. The estimator owns
//! every piece of state those stages carry between samples.

use embassy_time::Instant;
use log::debug;

use crate::angle::{Attitude, signed_cant};
use crate::config::{ConfigError, LevelConfig};
use crate::display::DisplayQuantizer;
use crate::filter::Ema;
use crate::gravity::GravitySample;
use crate::mode::{ModeClassifier, TiltMode};
use crate::orientation::{MountOrientation, remap};
use crate::sensors::MotionEvent;
use crate::stability::LevelGate;

/// Output published after every processed sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelReading {
    /// Integer degrees to display (hysteresis-quantized)
    pub level_deg: i32,
    /// Smoothed angle has been within tolerance for the hold period
    pub is_level: bool,
    /// Regime the angle was derived in
    pub mode: TiltMode,
    /// Unquantized smoothed angle in degrees
    pub smoothed_deg: f32,
}

pub struct TiltEstimator {
    config: LevelConfig,
    classifier: ModeClassifier,
    smoother: Ema,
    quantizer: DisplayQuantizer,
    gate: LevelGate,
    last_orientation: Option<MountOrientation>,
    reading: LevelReading,
}

impl TiltEstimator {
    /// Build an estimator without checking the config.
    ///
    /// Use [`TiltEstimator::try_new`] for configs that come from outside.
    pub fn new(config: LevelConfig) -> Self {
        Self {
            config,
            classifier: ModeClassifier::new(config.flat_enter_gz, config.flat_exit_gz),
            smoother: Ema::new(config.smoothing_alpha),
            quantizer: DisplayQuantizer::new(config.zero_enter_deg, config.zero_exit_deg),
            gate: LevelGate::new(config.tolerance_deg, config.hold()),
            last_orientation: None,
            reading: LevelReading::default(),
        }
    }

    pub fn try_new(config: LevelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// The most recently published reading; `{0, false}` before any sample
    pub fn reading(&self) -> LevelReading {
        self.reading
    }

    /// Run one gravity sample observed at `now` through every stage.
    pub fn process_sample(
        &mut self,
        raw: GravitySample,
        orientation: MountOrientation,
        now: Instant,
    ) -> LevelReading {
        if self.config.reset_on_orientation_change
            && self.last_orientation.is_some_and(|prev| prev != orientation)
        {
            debug!("Mount orientation changed to {}, resetting", orientation);
            self.reset();
        }
        self.last_orientation = Some(orientation);

        let g = remap(raw, orientation);
        let mode = self.classifier.update(g.gz_fraction());
        let attitude = Attitude::from_gravity(g);
        let cant = signed_cant(attitude.roll_deg, mode);

        let smoothed = self.smoother.update(cant);
        let level_deg = self.quantizer.update(smoothed);
        let is_level = self.gate.update(smoothed, now);

        self.reading = LevelReading {
            level_deg,
            is_level,
            mode,
            smoothed_deg: smoothed,
        };
        self.reading
    }

    /// Process one platform tick.
    ///
    /// Ticks without a usable gravity payload are skipped: state is left
    /// untouched and `None` is returned, so [`TiltEstimator::reading`] keeps
    /// the last valid reading.
    pub fn on_motion(
        &mut self,
        event: &MotionEvent,
        orientation: MountOrientation,
    ) -> Option<LevelReading> {
        let Some(raw) = event.gravity() else {
            debug!("Skipping motion tick without usable gravity data");
            return None;
        };
        Some(self.process_sample(raw, orientation, event.timestamp))
    }

    /// Return every stage to its initial state
    pub fn reset(&mut self) {
        self.classifier.reset();
        self.smoother.reset();
        self.quantizer.reset();
        self.gate.reset();
        self.reading = LevelReading::default();
    }
}

impl Default for TiltEstimator {
    fn default() -> Self {
        Self::new(LevelConfig::default())
    }
}
