//! Series indicators used by the engine.
//!
//! Every function here is a pure transform of an input series into an
//! output series of the same length, with `None` marking positions that
//! cannot be computed (warmup or undefined input inside the window).

pub mod rolling;
pub mod rsi;

pub use rolling::{rolling, trailing_extrema, Aggregation, RollingWindow};
pub use rsi::{Rsi, WilderState};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
