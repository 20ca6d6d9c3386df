//! Phase Accumulator
//!
//! Integrates a per-sample angular frequency into an oscillator phase and
//! keeps that phase in the canonical range [-π, π] after every step, so the
//! accumulator stays precise no matter how long the stream runs.
//!
//! ## Example
//!
//! ```rust
//! use satdop_core::phase::{wrap_angle, PhaseAccumulator};
//! use std::f64::consts::PI;
//!
//! let wrapped = wrap_angle(3.5);
//! assert!((wrapped - (3.5 - 2.0 * PI)).abs() < 1e-10);
//!
//! let mut acc = PhaseAccumulator::new();
//! for _ in 0..1000 {
//!     acc.advance(0.1);
//! }
//! assert!(acc.phase().abs() <= PI);
//! assert!((acc.oscillator().norm() - 1.0).abs() < 1e-12);
//! ```

use num_complex::Complex64;
use std::f64::consts::PI;

const TWO_PI: f64 = 2.0 * PI;

/// Wrap a single angle to [-π, π].
#[inline]
pub fn wrap_angle(x: f64) -> f64 {
    let mut y = x % TWO_PI;
    if y > PI {
        y -= TWO_PI;
    } else if y < -PI {
        y += TWO_PI;
    }
    y
}

/// Wrapped phase accumulator driving the correction oscillator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseAccumulator {
    /// Current phase (radians), always within [-π, π]
    phase: f64,
}

impl PhaseAccumulator {
    /// Create an accumulator at zero phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator starting at `phase` (wrapped).
    pub fn with_phase(phase: f64) -> Self {
        Self {
            phase: wrap_angle(phase),
        }
    }

    /// Add `freq` radians and wrap. Returns the new phase.
    #[inline]
    pub fn advance(&mut self, freq: f64) -> f64 {
        self.phase = wrap_angle(self.phase + freq);
        self.phase
    }

    /// Unit-magnitude counter-rotating oscillator sample, `exp(-j·phase)`.
    #[inline]
    pub fn oscillator(&self) -> Complex64 {
        Complex64::cis(-self.phase)
    }

    /// Current phase (radians).
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Reset to zero phase.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
