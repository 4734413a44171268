//! Hardware-independent core library for AimSense
//!
//! This crate contains the platform-agnostic level-calibration engine: gravity
//! remapping per mount orientation, FLAT/UPRIGHT mode classification, signed
//! cant derivation, smoothing, display quantization and the level gate. It
//! also carries the motion-source trait, the async level monitor, and the
//! calibration flow with its persistence.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded/mobile targets and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod angle;
pub mod calibration;
pub mod config;
pub mod display;
pub mod estimator;
pub mod filter;
pub mod gravity;
pub mod mode;
pub mod monitor;
pub mod orientation;
pub mod sensors;
pub mod stability;

pub use config::{ConfigError, LevelConfig};
pub use estimator::{LevelReading, TiltEstimator};
pub use gravity::GravitySample;
pub use mode::TiltMode;
pub use orientation::MountOrientation;
