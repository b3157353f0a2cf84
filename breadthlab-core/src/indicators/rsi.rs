//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Seed: simple mean of the first `period` gains/losses.
//! Then: avg = (prev_avg × (period − 1) + current) / period.
//! Edge cases: avg_loss == 0 → RSI = 100; both zero → RSI = 50.
//!
//! An undefined input resets the state, so RSI needs `period` fresh deltas
//! (i.e. `period + 1` consecutive defined inputs) before it is defined again.

/// Wilder smoothing state for a single oscillator instance.
#[derive(Debug, Clone)]
pub struct WilderState {
    period: usize,
    avg_gain: f64,
    avg_loss: f64,
    initialized: bool,
    seed_gain: f64,
    seed_loss: f64,
    seed_count: usize,
}

impl WilderState {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            avg_gain: 0.0,
            avg_loss: 0.0,
            initialized: false,
            seed_gain: 0.0,
            seed_loss: 0.0,
            seed_count: 0,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn avg_gain(&self) -> f64 {
        self.avg_gain
    }

    pub fn avg_loss(&self) -> f64 {
        self.avg_loss
    }

    /// Advance one delta. Returns the RSI once the seed window is complete.
    pub fn step(&mut self, delta: f64) -> Option<f64> {
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        if self.initialized {
            let n = self.period as f64;
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
            return Some(rsi_value(self.avg_gain, self.avg_loss));
        }

        self.seed_gain += gain;
        self.seed_loss += loss;
        self.seed_count += 1;
        if self.seed_count < self.period {
            return None;
        }

        self.avg_gain = self.seed_gain / self.period as f64;
        self.avg_loss = self.seed_loss / self.period as f64;
        self.initialized = true;
        Some(rsi_value(self.avg_gain, self.avg_loss))
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.period);
    }
}

/// RSI over an `Option` series with a fixed period.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of leading inputs before the first defined output.
    pub fn lookback(&self) -> usize {
        self.period
    }

    /// Compute RSI for the entire series. Output has the same length.
    pub fn compute(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        let mut state = WilderState::new(self.period);
        let mut prev: Option<f64> = None;
        let mut result = Vec::with_capacity(values.len());

        for value in values {
            let curr = value.filter(|v| v.is_finite());
            let out = match (prev, curr) {
                (Some(p), Some(c)) => state.step(c - p),
                (None, Some(_)) => None,
                (_, None) => {
                    state.reset();
                    None
                }
            };
            result.push(out);
            prev = curr;
        }

        result
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
