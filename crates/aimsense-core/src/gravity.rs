//! Gravity vector in device axes

use libm::{fabsf, sqrtf};

/// One acceleration-including-gravity sample (m/s²).
///
/// Axes are whatever frame the producer used: device-native when it comes off
/// the sensor, canonical portrait once it has been through
/// [`remap`](crate::orientation::remap).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GravitySample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl GravitySample {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length of the vector
    pub fn magnitude(&self) -> f32 {
        sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Share of the vector carried by the z axis, `|z| / |v|`.
    ///
    /// A zero-length vector divides by 1 instead, giving 0.
    pub fn gz_fraction(&self) -> f32 {
        let norm = self.magnitude();
        let norm = if norm > 0.0 { norm } else { 1.0 };
        fabsf(self.z) / norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gz_fraction_flat_and_upright() {
        assert_eq!(GravitySample::new(0.0, 0.0, 9.8).gz_fraction(), 1.0);
        assert_eq!(GravitySample::new(0.0, 0.0, -9.8).gz_fraction(), 1.0);
        assert_eq!(GravitySample::new(0.0, 9.8, 0.0).gz_fraction(), 0.0);
    }

    #[test]
    fn test_gz_fraction_zero_vector() {
        assert_eq!(GravitySample::default().gz_fraction(), 0.0);
    }

    #[test]
    fn test_non_finite_detected() {
        assert!(!GravitySample::new(f32::NAN, 0.0, 9.8).is_finite());
        assert!(!GravitySample::new(0.0, f32::INFINITY, 9.8).is_finite());
        assert!(GravitySample::new(0.1, -0.2, 9.8).is_finite());
    }
}
