//! Roll/pitch extraction and the signed cant reading

use libm::{atan2f, fabsf, fmodf, sqrtf};

use crate::gravity::GravitySample;
use crate::mode::TiltMode;

/// Roll and pitch of a canonical-frame gravity vector, in degrees.
///
/// Only roll feeds the cant reading; pitch is carried for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Attitude {
    /// `atan2(y, z)`
    pub roll_deg: f32,
    /// `atan2(-x, sqrt(y² + z²))`
    pub pitch_deg: f32,
}

impl Attitude {
    pub fn from_gravity(g: GravitySample) -> Self {
        let roll = atan2f(g.y, g.z);
        let pitch = atan2f(-g.x, sqrtf(g.y * g.y + g.z * g.z));
        Self {
            roll_deg: roll.to_degrees(),
            pitch_deg: pitch.to_degrees(),
        }
    }
}

/// Wrap an angle into `(-180, 180]`.
pub fn wrap_degrees(deg: f32) -> f32 {
    let offset = fmodf(180.0 - deg, 360.0);
    let offset = if offset < 0.0 { offset + 360.0 } else { offset };
    180.0 - offset
}

/// Convert roll into the signed cant shown by a carpenter's level.
///
/// - `Flat`: roll wrapped and folded into `[-90, 90]`, so a phone turned
///   face-down reads the same slope instead of flipping by 180°.
/// - `Upright`: a vertical phone reads roll ≈ ±90°, so the cant is the
///   deviation from 90° carrying the sign of roll. Zero roll counts as
///   positive.
pub fn signed_cant(roll_deg: f32, mode: TiltMode) -> f32 {
    match mode {
        TiltMode::Flat => {
            let mut r = wrap_degrees(roll_deg);
            if r > 90.0 {
                r -= 180.0;
            }
            if r < -90.0 {
                r += 180.0;
            }
            r
        }
        TiltMode::Upright => {
            let sign = if roll_deg < 0.0 { -1.0 } else { 1.0 };
            sign * (fabsf(roll_deg) - 90.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn close(a: f32, b: f32) -> bool {
        fabsf(a - b) < EPS
    }

    #[test]
    fn test_attitude_of_flat_phone() {
        let a = Attitude::from_gravity(GravitySample::new(0.0, 0.0, 9.8));
        assert_eq!(a.roll_deg, 0.0);
        assert_eq!(a.pitch_deg, 0.0);
    }

    #[test]
    fn test_attitude_roll_and_pitch_axes() {
        let roll = Attitude::from_gravity(GravitySample::new(0.0, 9.8, 9.8));
        assert!(close(roll.roll_deg, 45.0));

        let pitch = Attitude::from_gravity(GravitySample::new(-9.8, 0.0, 9.8));
        assert!(close(pitch.pitch_deg, 45.0));
        assert_eq!(pitch.roll_deg, 0.0);
    }

    #[test]
    fn test_wrap_degrees() {
        assert!(close(wrap_degrees(180.0), 180.0));
        assert!(close(wrap_degrees(-180.0), 180.0));
        assert!(close(wrap_degrees(540.0), 180.0));
        assert!(close(wrap_degrees(190.0), -170.0));
        assert!(close(wrap_degrees(-190.0), 170.0));
        assert!(close(wrap_degrees(45.0), 45.0));
    }

    #[test]
    fn test_flat_folds_into_quarter_range() {
        assert!(close(signed_cant(10.0, TiltMode::Flat), 10.0));
        assert!(close(signed_cant(-10.0, TiltMode::Flat), -10.0));
        // Face down, tilted: 170° reads as -10°
        assert!(close(signed_cant(170.0, TiltMode::Flat), -10.0));
        assert!(close(signed_cant(-170.0, TiltMode::Flat), 10.0));
        assert!(close(signed_cant(180.0, TiltMode::Flat), 0.0));
        assert!(close(signed_cant(-180.0, TiltMode::Flat), 0.0));
    }

    #[test]
    fn test_upright_measures_deviation_from_vertical() {
        assert!(close(signed_cant(90.0, TiltMode::Upright), 0.0));
        assert!(close(signed_cant(-90.0, TiltMode::Upright), 0.0));
        assert!(close(signed_cant(93.0, TiltMode::Upright), 3.0));
        assert!(close(signed_cant(87.0, TiltMode::Upright), -3.0));
        assert!(close(signed_cant(-93.0, TiltMode::Upright), -3.0));
    }

    #[test]
    fn test_upright_zero_roll_is_positive() {
        assert!(close(signed_cant(0.0, TiltMode::Upright), -90.0));
        assert!(close(signed_cant(-0.0, TiltMode::Upright), -90.0));
    }
}
