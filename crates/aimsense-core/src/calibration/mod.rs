//! Calibration flow and its persisted result

pub mod flow;
pub mod store;

use alloc::string::String;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::orientation::MountOrientation;

pub use flow::{CalibrationFlow, CalibrationStep};
pub use store::{CalibrationRepository, KeyValueStore, MemoryStore, StoreError};

/// Outcome of a completed calibration flow.
///
/// Saved once when the user finishes, loaded once at start-up.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CalibrationResult {
    pub mount_orientation: MountOrientation,
    /// Displayed angle at the moment the user confirmed level
    pub level_zero_roll_deg: Option<i32>,
    /// When the flow finished, as an ISO-8601 timestamp
    pub calibrated_at_iso: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("Device is not level yet")]
    NotLevel,
    #[error("Action not available in the {0} step")]
    InvalidStep(&'static str),
    #[error("Calibration storage failed: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CalibrationError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
