//! Integer display quantization with a dead zone around zero

use libm::{ceilf, fabsf};

/// Turns the smoothed angle into the integer shown to the user.
///
/// Leaving zero needs `|v| >= zero_exit_deg`; returning to zero needs
/// `|v| <= zero_enter_deg`. Non-zero values are the ceiling of the
/// magnitude, so any shown tilt rounds away from zero.
#[derive(Debug, Clone)]
pub struct DisplayQuantizer {
    displayed: i32,
    zero_enter_deg: f32,
    zero_exit_deg: f32,
}

impl DisplayQuantizer {
    pub const fn new(zero_enter_deg: f32, zero_exit_deg: f32) -> Self {
        Self {
            displayed: 0,
            zero_enter_deg,
            zero_exit_deg,
        }
    }

    pub const fn displayed(&self) -> i32 {
        self.displayed
    }

    /// Feed one smoothed value and return the integer to display
    pub fn update(&mut self, smoothed_deg: f32) -> i32 {
        let magnitude = fabsf(smoothed_deg);

        self.displayed = if self.displayed == 0 {
            if magnitude >= self.zero_exit_deg {
                Self::round_away(smoothed_deg)
            } else {
                0
            }
        } else if magnitude <= self.zero_enter_deg {
            0
        } else {
            Self::round_away(smoothed_deg)
        };

        self.displayed
    }

    pub fn reset(&mut self) {
        self.displayed = 0;
    }

    fn round_away(v: f32) -> i32 {
        let magnitude = ceilf(fabsf(v)) as i32;
        if v < 0.0 { -magnitude } else { magnitude }
    }
}
