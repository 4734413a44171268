//! Mount orientation and gravity remapping
//!
//! The user declares how the phone sits in its mount. Every downstream stage
//! works in a canonical "upright portrait" frame, so the raw gravity vector is
//! rotated about the screen normal (z) before anything else looks at it.

use core::fmt::Display;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::gravity::GravitySample;

/// How the phone is mounted on the rifle.
///
/// Set once per calibration session; the estimator only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MountOrientation {
    /// Normal upright
    #[default]
    Portrait,
    /// Phone flipped
    PortraitUpsideDown,
    /// Rotated left
    LandscapeLeft,
    /// Rotated right
    LandscapeRight,
}

impl MountOrientation {
    /// All orientations, in the order the orientation step presents them
    pub const ALL: [MountOrientation; 4] = [
        Self::Portrait,
        Self::PortraitUpsideDown,
        Self::LandscapeLeft,
        Self::LandscapeRight,
    ];

    /// Stable identifier, also used as the serialized name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::PortraitUpsideDown => "portrait-upside-down",
            Self::LandscapeLeft => "landscape-left",
            Self::LandscapeRight => "landscape-right",
        }
    }

    /// Get a short label for display
    pub const fn label(self) -> &'static str {
        match self {
            Self::Portrait => "Portrait",
            Self::PortraitUpsideDown => "Portrait (Upside Down)",
            Self::LandscapeLeft => "Landscape (Left)",
            Self::LandscapeRight => "Landscape (Right)",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Portrait => "Normal upright",
            Self::PortraitUpsideDown => "Phone flipped",
            Self::LandscapeLeft => "Rotated left",
            Self::LandscapeRight => "Rotated right",
        }
    }

    pub const fn is_landscape(self) -> bool {
        matches!(self, Self::LandscapeLeft | Self::LandscapeRight)
    }

    /// Screen rotation (degrees) the UI locks to while levelling in this mount
    pub const fn screen_rotation_deg(self) -> i16 {
        match self {
            Self::Portrait => 0,
            Self::LandscapeLeft => 90,
            Self::LandscapeRight => -90,
            Self::PortraitUpsideDown => 180,
        }
    }

    /// Parse an identifier, falling back to [`MountOrientation::Portrait`]
    /// (the identity remap) for anything unrecognized.
    pub fn from_str_lossy(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl Display for MountOrientation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`MountOrientation::from_str`] for unknown identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownOrientation;

impl FromStr for MountOrientation {
    type Err = UnknownOrientation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or(UnknownOrientation)
    }
}

/// Rotate a device-native gravity vector into the canonical portrait frame.
///
/// Each mapping is a fixed rotation about z, so the magnitude is preserved
/// and z is never touched.
pub fn remap(raw: GravitySample, orientation: MountOrientation) -> GravitySample {
    let GravitySample { x, y, z } = raw;
    match orientation {
        MountOrientation::Portrait => raw,
        // 180° about z
        MountOrientation::PortraitUpsideDown => GravitySample::new(-x, -y, z),
        // -90° about z
        MountOrientation::LandscapeLeft => GravitySample::new(y, -x, z),
        // +90° about z
        MountOrientation::LandscapeRight => GravitySample::new(-y, x, z),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libm::fabsf;

    const EPS: f32 = 1e-5;

    fn assert_close(a: GravitySample, b: GravitySample) {
        assert!(
            fabsf(a.x - b.x) < EPS && fabsf(a.y - b.y) < EPS && fabsf(a.z - b.z) < EPS,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_remap_preserves_magnitude() {
        let raw = GravitySample::new(1.3, -4.2, 8.7);
        for o in MountOrientation::ALL {
            let mapped = remap(raw, o);
            assert!(
                fabsf(mapped.magnitude() - raw.magnitude()) < EPS,
                "{o} changed magnitude"
            );
            assert_eq!(mapped.z, raw.z);
        }
    }

    #[test]
    fn test_remap_table() {
        let raw = GravitySample::new(1.0, 2.0, 3.0);
        assert_eq!(remap(raw, MountOrientation::Portrait), raw);
        assert_eq!(
            remap(raw, MountOrientation::PortraitUpsideDown),
            GravitySample::new(-1.0, -2.0, 3.0)
        );
        assert_eq!(
            remap(raw, MountOrientation::LandscapeLeft),
            GravitySample::new(2.0, -1.0, 3.0)
        );
        assert_eq!(
            remap(raw, MountOrientation::LandscapeRight),
            GravitySample::new(-2.0, 1.0, 3.0)
        );
    }

    #[test]
    fn test_landscape_left_then_right_is_identity() {
        let raw = GravitySample::new(0.7, -3.1, 9.2);
        let there = remap(raw, MountOrientation::LandscapeLeft);
        let back = remap(there, MountOrientation::LandscapeRight);
        assert_close(back, raw);
    }

    #[test]
    fn test_upside_down_is_its_own_inverse() {
        let raw = GravitySample::new(0.7, -3.1, 9.2);
        let twice = remap(
            remap(raw, MountOrientation::PortraitUpsideDown),
            MountOrientation::PortraitUpsideDown,
        );
        assert_close(twice, raw);
    }

    #[test]
    fn test_parse_and_fallback() {
        assert_eq!(
            "landscape-left".parse::<MountOrientation>(),
            Ok(MountOrientation::LandscapeLeft)
        );
        assert_eq!("sideways".parse::<MountOrientation>(), Err(UnknownOrientation));
        assert_eq!(
            MountOrientation::from_str_lossy("sideways"),
            MountOrientation::Portrait
        );
    }

    #[test]
    fn test_screen_rotation() {
        assert_eq!(MountOrientation::LandscapeLeft.screen_rotation_deg(), 90);
        assert_eq!(MountOrientation::LandscapeRight.screen_rotation_deg(), -90);
        assert!(MountOrientation::LandscapeRight.is_landscape());
        assert!(!MountOrientation::PortraitUpsideDown.is_landscape());
    }
}
