//! Exponential moving average

/// EMA over signed degrees.
///
/// Starts unset; the first update passes the raw value through unblended.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f32,
    value: Option<f32>,
}

impl Ema {
    pub const fn new(alpha: f32) -> Self {
        Self { alpha, value: None }
    }

    /// Blend `raw` into the running value and return the result
    pub fn update(&mut self, raw: f32) -> f32 {
        let next = match self.value {
            None => raw,
            Some(prev) => prev * (1.0 - self.alpha) + raw * self.alpha,
        };
        self.value = Some(next);
        next
    }

    pub const fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}
