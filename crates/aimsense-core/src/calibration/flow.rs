//! Calibration flow state machine
//!
//! start → orientation → level → finish, with back/cancel at every step.
//! The orientation picked in the orientation step stays *pending* until the
//! user confirms it; only the applied orientation feeds the estimator.

use alloc::string::String;

use log::info;

use super::store::{CalibrationRepository, KeyValueStore};
use super::{CalibrationError, CalibrationResult};
use crate::estimator::LevelReading;
use crate::orientation::MountOrientation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    /// Calibrated; normal operation
    Dashboard,
    /// Never calibrated; prompt to start
    Start,
    /// Choosing the mount orientation
    Orientation,
    /// Holding the phone level to confirm
    Level,
}

impl CalibrationStep {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Start => "start",
            Self::Orientation => "orientation",
            Self::Level => "level",
        }
    }
}

pub struct CalibrationFlow {
    step: CalibrationStep,
    applied: MountOrientation,
    pending: MountOrientation,
    result: Option<CalibrationResult>,
}

impl CalibrationFlow {
    /// Resume from whatever was saved: a stored result goes straight to the
    /// dashboard with its orientation applied.
    pub fn from_saved(saved: Option<CalibrationResult>) -> Self {
        match saved {
            Some(result) => Self {
                step: CalibrationStep::Dashboard,
                applied: result.mount_orientation,
                pending: result.mount_orientation,
                result: Some(result),
            },
            None => Self {
                step: CalibrationStep::Start,
                applied: MountOrientation::Portrait,
                pending: MountOrientation::Portrait,
                result: None,
            },
        }
    }

    /// Load the saved calibration from `repo` and resume from it
    pub fn load<S: KeyValueStore>(
        repo: &CalibrationRepository<S>,
    ) -> Result<Self, CalibrationError> {
        Ok(Self::from_saved(repo.load()?))
    }

    pub fn step(&self) -> CalibrationStep {
        self.step
    }

    /// Orientation the estimator should use right now
    pub fn mount_orientation(&self) -> MountOrientation {
        self.applied
    }

    /// Orientation highlighted in the orientation step
    pub fn pending_orientation(&self) -> MountOrientation {
        self.pending
    }

    pub fn result(&self) -> Option<&CalibrationResult> {
        self.result.as_ref()
    }

    /// Enter the orientation step (first calibration or recalibration)
    pub fn begin(&mut self) -> Result<(), CalibrationError> {
        match self.step {
            CalibrationStep::Start | CalibrationStep::Dashboard | CalibrationStep::Level => {
                self.pending = self.applied;
                self.step = CalibrationStep::Orientation;
                Ok(())
            }
            CalibrationStep::Orientation => Ok(()),
        }
    }

    pub fn select_orientation(
        &mut self,
        orientation: MountOrientation,
    ) -> Result<(), CalibrationError> {
        self.expect_step(CalibrationStep::Orientation)?;
        self.pending = orientation;
        Ok(())
    }

    /// Apply the pending orientation and move on to the level step
    pub fn confirm_orientation(&mut self) -> Result<MountOrientation, CalibrationError> {
        self.expect_step(CalibrationStep::Orientation)?;
        self.applied = self.pending;
        self.step = CalibrationStep::Level;
        Ok(self.applied)
    }

    /// Go back from the level step to the orientation step
    pub fn back(&mut self) -> Result<(), CalibrationError> {
        self.expect_step(CalibrationStep::Level)?;
        self.begin()
    }

    /// Finish calibration with the live reading.
    ///
    /// Only allowed in the level step while the reading says level. The
    /// result is saved to `repo` before the flow returns to the dashboard.
    pub fn finish<S: KeyValueStore>(
        &mut self,
        reading: LevelReading,
        calibrated_at_iso: &str,
        repo: &mut CalibrationRepository<S>,
    ) -> Result<&CalibrationResult, CalibrationError> {
        self.expect_step(CalibrationStep::Level)?;
        if !reading.is_level {
            return Err(CalibrationError::NotLevel);
        }

        let result = CalibrationResult {
            mount_orientation: self.applied,
            level_zero_roll_deg: Some(reading.level_deg),
            calibrated_at_iso: String::from(calibrated_at_iso),
        };
        repo.save(&result)?;

        info!(
            "Calibration finished: {} at {}°",
            result.mount_orientation, reading.level_deg
        );
        self.step = CalibrationStep::Dashboard;
        Ok(&*self.result.insert(result))
    }

    /// Abandon the flow, discarding any pending orientation
    pub fn cancel(&mut self) {
        self.pending = self.applied;
        self.step = if self.result.is_some() {
            CalibrationStep::Dashboard
        } else {
            CalibrationStep::Start
        };
    }

    fn expect_step(&self, step: CalibrationStep) -> Result<(), CalibrationError> {
        if self.step == step {
            Ok(())
        } else {
            Err(CalibrationError::InvalidStep(self.step.label()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::MemoryStore;
    use crate::mode::TiltMode;

    const ISO: &str = "2026-10-14T09:30:00.000Z";

    fn level(deg: i32) -> LevelReading {
        LevelReading {
            level_deg: deg,
            is_level: true,
            mode: TiltMode::Flat,
            smoothed_deg: 0.0,
        }
    }

    #[test]
    fn test_fresh_install_starts_at_start() {
        let flow = CalibrationFlow::from_saved(None);
        assert_eq!(flow.step(), CalibrationStep::Start);
        assert_eq!(flow.mount_orientation(), MountOrientation::Portrait);
    }

    #[test]
    fn test_full_flow_saves_result() {
        let mut repo = CalibrationRepository::new(MemoryStore::new());
        let mut flow = CalibrationFlow::load(&repo).unwrap();

        flow.begin().unwrap();
        flow.select_orientation(MountOrientation::LandscapeRight).unwrap();
        // Not applied until confirmed
        assert_eq!(flow.mount_orientation(), MountOrientation::Portrait);
        assert_eq!(
            flow.confirm_orientation(),
            Ok(MountOrientation::LandscapeRight)
        );
        assert_eq!(flow.step(), CalibrationStep::Level);

        let result = flow.finish(level(1), ISO, &mut repo).unwrap().clone();
        assert_eq!(result.mount_orientation, MountOrientation::LandscapeRight);
        assert_eq!(result.level_zero_roll_deg, Some(1));
        assert_eq!(flow.step(), CalibrationStep::Dashboard);

        // Next launch resumes on the dashboard with the saved mount
        let resumed = CalibrationFlow::load(&repo).unwrap();
        assert_eq!(resumed.step(), CalibrationStep::Dashboard);
        assert_eq!(resumed.mount_orientation(), MountOrientation::LandscapeRight);
        assert_eq!(resumed.result(), Some(&result));
    }

    #[test]
    fn test_finish_refused_while_not_level() {
        let mut repo = CalibrationRepository::new(MemoryStore::new());
        let mut flow = CalibrationFlow::from_saved(None);
        flow.begin().unwrap();
        flow.confirm_orientation().unwrap();

        let reading = LevelReading {
            is_level: false,
            ..level(0)
        };
        assert_eq!(
            flow.finish(reading, ISO, &mut repo).err(),
            Some(CalibrationError::NotLevel)
        );
        assert_eq!(flow.step(), CalibrationStep::Level);
        assert_eq!(repo.load(), Ok(None));
    }

    #[test]
    fn test_actions_outside_their_step_are_rejected() {
        let mut repo = CalibrationRepository::new(MemoryStore::new());
        let mut flow = CalibrationFlow::from_saved(None);
        assert_eq!(
            flow.select_orientation(MountOrientation::LandscapeLeft),
            Err(CalibrationError::InvalidStep("start"))
        );
        assert_eq!(
            flow.finish(level(0), ISO, &mut repo).err(),
            Some(CalibrationError::InvalidStep("start"))
        );
        assert_eq!(flow.back(), Err(CalibrationError::InvalidStep("start")));
    }

    #[test]
    fn test_cancel_restores_applied_orientation() {
        let saved = CalibrationResult {
            mount_orientation: MountOrientation::PortraitUpsideDown,
            level_zero_roll_deg: Some(0),
            calibrated_at_iso: String::from(ISO),
        };
        let mut flow = CalibrationFlow::from_saved(Some(saved));
        flow.begin().unwrap();
        flow.select_orientation(MountOrientation::LandscapeLeft).unwrap();
        flow.cancel();

        assert_eq!(flow.step(), CalibrationStep::Dashboard);
        assert_eq!(flow.pending_orientation(), MountOrientation::PortraitUpsideDown);
        assert_eq!(flow.mount_orientation(), MountOrientation::PortraitUpsideDown);
    }

    #[test]
    fn test_cancel_without_result_returns_to_start() {
        let mut flow = CalibrationFlow::from_saved(None);
        flow.begin().unwrap();
        flow.confirm_orientation().unwrap();
        flow.cancel();
        assert_eq!(flow.step(), CalibrationStep::Start);
    }

    #[test]
    fn test_back_resets_pending_to_applied() {
        let mut flow = CalibrationFlow::from_saved(None);
        flow.begin().unwrap();
        flow.select_orientation(MountOrientation::LandscapeLeft).unwrap();
        flow.confirm_orientation().unwrap();
        flow.back().unwrap();

        assert_eq!(flow.step(), CalibrationStep::Orientation);
        assert_eq!(flow.pending_orientation(), MountOrientation::LandscapeLeft);
    }
}
