//! First-order lag with rate limiting.

use crate::error::{SimError, SimResult};

/// First-order lag with rate limiting.
///
/// Dynamics: `dx/dt = (target - x) / tau`, clamped to `[-rate_limit, rate_limit]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FirstOrderLag {
    /// Time constant (seconds)
    pub tau: f64,
    /// Rate limit (units/second), must be positive
    pub rate_limit: f64,
}

impl FirstOrderLag {
    /// Create a new first-order lag.
    pub fn new(tau: f64, rate_limit: f64) -> SimResult<Self> {
        if tau.is_nan() || tau <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "tau must be positive",
            });
        }
        if rate_limit.is_nan() || rate_limit <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "rate_limit must be positive",
            });
        }
        Ok(Self { tau, rate_limit })
    }

    /// Compute derivative given current value and target.
    pub fn dxdt(&self, x: f64, target: f64) -> f64 {
        let raw = (target - x) / self.tau;
        raw.clamp(-self.rate_limit, self.rate_limit)
    }

    /// Advance by `dt` with explicit Euler, sub-stepping so each step stays
    /// well inside the time constant.
    pub fn advance(&self, x: f64, dt: f64, target: impl Fn(f64) -> f64) -> f64 {
        let max_step = self.tau / 10.0;
        let mut x = x;
        let mut remaining = dt;
        while remaining > 0.0 {
            let h = remaining.min(max_step);
            x += self.dxdt(x, target(x)) * h;
            remaining -= h;
        }
        x
    }
}
