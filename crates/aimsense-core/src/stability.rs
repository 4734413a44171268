//! Debounced "is level" gate

use embassy_time::{Duration, Instant};
use libm::fabsf;

/// Declares level once the smoothed angle has stayed within tolerance for
/// the hold duration.
///
/// Any sample outside tolerance clears the gate and the hold timer at once.
/// The gate works on the unquantized angle, never on the displayed integer.
#[derive(Debug, Clone)]
pub struct LevelGate {
    tolerance_deg: f32,
    hold: Duration,
    stable_since: Option<Instant>,
    is_level: bool,
}

impl LevelGate {
    pub const fn new(tolerance_deg: f32, hold: Duration) -> Self {
        Self {
            tolerance_deg,
            hold,
            stable_since: None,
            is_level: false,
        }
    }

    /// Feed one smoothed value observed at `now` and return the level state
    pub fn update(&mut self, smoothed_deg: f32, now: Instant) -> bool {
        if fabsf(smoothed_deg) <= self.tolerance_deg {
            let since = *self.stable_since.get_or_insert(now);
            // A clock that steps backwards counts as no time elapsed
            if now.saturating_duration_since(since) >= self.hold {
                self.is_level = true;
            }
        } else {
            self.stable_since = None;
            self.is_level = false;
        }

        self.is_level
    }

    pub const fn is_level(&self) -> bool {
        self.is_level
    }

    /// When the current in-tolerance run started, if one is underway
    pub const fn stable_since(&self) -> Option<Instant> {
        self.stable_since
    }

    pub fn reset(&mut self) {
        self.stable_since = None;
        self.is_level = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> LevelGate {
        LevelGate::new(0.5, Duration::from_millis(600))
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_level_exactly_after_hold() {
        let mut g = gate();
        for ms in (0..600).step_by(60) {
            assert!(!g.update(0.1, at(ms)), "level too early at {ms} ms");
        }
        assert!(g.update(0.1, at(600)));
        assert_eq!(g.stable_since(), Some(at(0)));
    }

    #[test]
    fn test_hold_measured_from_first_in_tolerance_sample() {
        let mut g = gate();
        assert!(!g.update(3.0, at(0)));
        assert!(!g.update(0.2, at(100)));
        assert!(!g.update(0.2, at(650)));
        assert!(g.update(0.2, at(700)));
    }

    #[test]
    fn test_excursion_resets_immediately() {
        let mut g = gate();
        g.update(0.0, at(0));
        assert!(g.update(0.0, at(600)));
        assert!(!g.update(0.51, at(660)));
        assert_eq!(g.stable_since(), None);

        // Timer restarts from the next in-tolerance sample
        assert!(!g.update(0.0, at(720)));
        assert!(!g.update(0.0, at(1260)));
        assert!(g.update(0.0, at(1320)));
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let mut g = gate();
        g.update(-0.5, at(0));
        assert!(g.update(0.5, at(600)));
    }

    #[test]
    fn test_backwards_clock_does_not_declare_level() {
        let mut g = gate();
        g.update(0.0, at(5_000));
        assert!(!g.update(0.0, at(1_000)));
    }
}
