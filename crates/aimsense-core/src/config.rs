//! Tunables for the level estimator

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Configuration bundle for [`TiltEstimator`](crate::estimator::TiltEstimator)
/// and [`LevelMonitor`](crate::monitor::LevelMonitor).
///
/// Every field has a default, so a partial document deserializes into a
/// complete config.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct LevelConfig {
    /// Half-width of the level gate (degrees)
    pub tolerance_deg: f32,
    /// How long the angle must stay within tolerance before it counts as level
    pub hold_ms: u64,
    /// Displayed value snaps back to 0 at or below this magnitude (degrees)
    pub zero_enter_deg: f32,
    /// Displayed value leaves 0 at or above this magnitude (degrees)
    pub zero_exit_deg: f32,
    /// EMA weight given to each new sample
    pub smoothing_alpha: f32,
    /// Gravity-z fraction at or above which the device counts as flat
    pub flat_enter_gz: f32,
    /// Gravity-z fraction at or below which a flat device counts as upright
    pub flat_exit_gz: f32,
    /// Sensor update interval requested from the motion source
    pub update_interval_ms: u64,
    /// Clear smoothing, display and stability state when the mount
    /// orientation changes between samples
    pub reset_on_orientation_change: bool,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            tolerance_deg: 0.5,
            hold_ms: 600,
            zero_enter_deg: 0.12,
            zero_exit_deg: 0.6,
            smoothing_alpha: 0.18,
            flat_enter_gz: 0.85,
            flat_exit_gz: 0.75,
            update_interval_ms: 60,
            reset_on_orientation_change: false,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("smoothing_alpha must be in (0, 1], got {0}")]
    SmoothingAlpha(f32),
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("zero_enter_deg ({enter}) must be below zero_exit_deg ({exit})")]
    ZeroBand { enter: f32, exit: f32 },
    #[error("{field} must be within [0, 1]")]
    GzOutOfRange { field: &'static str },
    #[error("flat_enter_gz ({enter}) must be above flat_exit_gz ({exit})")]
    FlatBand { enter: f32, exit: f32 },
    #[error("update_interval_ms must be greater than zero")]
    ZeroInterval,
}

impl LevelConfig {
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    /// Check the bundle for values that would break the hysteresis bands
    pub fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            ("tolerance_deg", self.tolerance_deg),
            ("zero_enter_deg", self.zero_enter_deg),
            ("zero_exit_deg", self.zero_exit_deg),
            ("smoothing_alpha", self.smoothing_alpha),
            ("flat_enter_gz", self.flat_enter_gz),
            ("flat_exit_gz", self.flat_exit_gz),
        ];
        for (field, value) in floats {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }

        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(ConfigError::SmoothingAlpha(self.smoothing_alpha));
        }

        for (field, value) in [
            ("tolerance_deg", self.tolerance_deg),
            ("zero_enter_deg", self.zero_enter_deg),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field });
            }
        }

        if self.zero_enter_deg >= self.zero_exit_deg {
            return Err(ConfigError::ZeroBand {
                enter: self.zero_enter_deg,
                exit: self.zero_exit_deg,
            });
        }

        for (field, value) in [
            ("flat_enter_gz", self.flat_enter_gz),
            ("flat_exit_gz", self.flat_exit_gz),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::GzOutOfRange { field });
            }
        }

        if self.flat_enter_gz <= self.flat_exit_gz {
            return Err(ConfigError::FlatBand {
                enter: self.flat_enter_gz,
                exit: self.flat_exit_gz,
            });
        }

        if self.update_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(LevelConfig::default().validate(), Ok(()));
        assert_eq!(LevelConfig::default().hold(), Duration::from_millis(600));
    }

    #[test]
    fn test_rejects_inverted_flat_band() {
        let config = LevelConfig {
            flat_enter_gz: 0.7,
            flat_exit_gz: 0.8,
            ..LevelConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::FlatBand {
                enter: 0.7,
                exit: 0.8
            })
        );
    }

    #[test]
    fn test_rejects_equal_thresholds() {
        let config = LevelConfig {
            zero_enter_deg: 0.6,
            ..LevelConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroBand { .. })));

        let config = LevelConfig {
            flat_exit_gz: 0.85,
            ..LevelConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::FlatBand { .. })));
    }

    #[test]
    fn test_rejects_bad_alpha_and_nan() {
        let config = LevelConfig {
            smoothing_alpha: 0.0,
            ..LevelConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::SmoothingAlpha(0.0)));

        let config = LevelConfig {
            tolerance_deg: f32::NAN,
            ..LevelConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotFinite {
                field: "tolerance_deg"
            })
        );
    }

    #[test]
    fn test_rejects_gz_out_of_range_and_zero_interval() {
        let config = LevelConfig {
            flat_enter_gz: 1.2,
            ..LevelConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::GzOutOfRange {
                field: "flat_enter_gz"
            })
        );

        let config = LevelConfig {
            update_interval_ms: 0,
            ..LevelConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroInterval));
    }
}
