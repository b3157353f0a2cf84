//! Rolling windows over per-date series.
//!
//! `RollingWindow` keeps a running sum and a bounded queue of the last
//! `window` values, so each step is amortized O(1) and values are always
//! accumulated in arrival order. An undefined input clears the window: a
//! result is only produced once `window` consecutive defined values exist.
//!
//! The running sum is Neumaier-compensated on both the add and the subtract
//! side, so it does not drift over long series. A window holding one repeated
//! value returns that value exactly (mean) or `value × window` (sum).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// How a full window is reduced to a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Mean,
}

/// Sliding sum/mean state machine.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    window: usize,
    aggregation: Aggregation,
    values: VecDeque<f64>,
    sum: f64,
    compensation: f64,
    /// Length of the trailing run of identical values.
    run: usize,
}

impl RollingWindow {
    pub fn new(window: usize, aggregation: Aggregation) -> Self {
        assert!(window >= 1, "rolling window must be >= 1");
        Self {
            window,
            aggregation,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
            compensation: 0.0,
            run: 0,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    fn accumulate(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    /// Feed the next value; returns the aggregate of the window ending here.
    pub fn push(&mut self, value: Option<f64>) -> Option<f64> {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            self.reset();
            return None;
        };

        self.run = match self.values.back() {
            Some(&last) if last == v => self.run + 1,
            _ => 1,
        };
        if self.values.len() == self.window {
            if let Some(leaving) = self.values.pop_front() {
                self.accumulate(-leaving);
            }
        }
        self.values.push_back(v);
        self.accumulate(v);

        if self.values.len() < self.window {
            return None;
        }
        let n = self.window as f64;
        if self.run >= self.window {
            return Some(match self.aggregation {
                Aggregation::Sum => v * n,
                Aggregation::Mean => v,
            });
        }
        let total = self.sum + self.compensation;
        Some(match self.aggregation {
            Aggregation::Sum => total,
            Aggregation::Mean => total / n,
        })
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
        self.compensation = 0.0;
        self.run = 0;
    }
}

/// Apply a rolling window over a whole series.
///
/// Output has the same length as `values`.
pub fn rolling(values: &[Option<f64>], window: usize, aggregation: Aggregation) -> Vec<Option<f64>> {
    let mut state = RollingWindow::new(window, aggregation);
    values.iter().map(|v| state.push(*v)).collect()
}

/// Trailing max and min of a dense series (one ticker's own closes).
///
/// `result[i]` covers `values[i + 1 - window..=i]` and is `None` for the
/// first `window - 1` positions or when the window holds a non-finite value.
pub fn trailing_extrema(values: &[f64], window: usize) -> Vec<Option<(f64, f64)>> {
    assert!(window >= 1, "extrema window must be >= 1");
    let n = values.len();
    let mut result = vec![None; n];
    if n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let mut max_val = f64::NEG_INFINITY;
        let mut min_val = f64::INFINITY;
        for &v in slice {
            if v > max_val {
                max_val = v;
            }
            if v < min_val {
                min_val = v;
            }
        }
        result[i] = Some((max_val, min_val));
    }

    result
}
