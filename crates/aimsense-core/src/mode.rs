//! FLAT vs UPRIGHT classification with hysteresis

use log::debug;

/// Geometric regime of the device.
///
/// The cant formula differs between a phone lying on its back and one held
/// up in front of the shooter, so the estimator has to know which applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiltMode {
    /// Screen facing up or down, gravity mostly along z
    Flat,
    /// Held upright, gravity mostly in the screen plane
    #[default]
    Upright,
}

impl TiltMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Flat => "FLAT",
            Self::Upright => "UPRIGHT",
        }
    }
}

/// Persistent mode flag with an enter/exit band on the gravity-z fraction.
///
/// `Upright -> Flat` once the fraction reaches `flat_enter_gz`;
/// `Flat -> Upright` once it drops to `flat_exit_gz`. Anything strictly
/// between the two keeps the current mode.
#[derive(Debug, Clone)]
pub struct ModeClassifier {
    mode: TiltMode,
    flat_enter_gz: f32,
    flat_exit_gz: f32,
}

impl ModeClassifier {
    pub const fn new(flat_enter_gz: f32, flat_exit_gz: f32) -> Self {
        Self {
            mode: TiltMode::Upright,
            flat_enter_gz,
            flat_exit_gz,
        }
    }

    pub const fn mode(&self) -> TiltMode {
        self.mode
    }

    /// Feed one gz fraction and return the (possibly new) mode
    pub fn update(&mut self, gz_fraction: f32) -> TiltMode {
        let next = match self.mode {
            TiltMode::Upright if gz_fraction >= self.flat_enter_gz => TiltMode::Flat,
            TiltMode::Flat if gz_fraction <= self.flat_exit_gz => TiltMode::Upright,
            current => current,
        };

        if next != self.mode {
            debug!(
                "Tilt mode {} -> {} (gz fraction {:.3})",
                self.mode.label(),
                next.label(),
                gz_fraction
            );
            self.mode = next;
        }

        next
    }

    pub fn reset(&mut self) {
        self.mode = TiltMode::Upright;
    }
}
