use crate::{HpError, HpResult};

/// Floating point type used for derived physical quantities
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> HpResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(HpError::NonFinite { what, value: v })
    }
}

/// Scale `value` by `num / den` in a 64-bit domain, truncating toward zero.
///
/// Returns `None` when `den` is zero.
pub fn mul_div_floor(value: u32, num: u32, den: u32) -> Option<u32> {
    if den == 0 {
        return None;
    }
    let wide = u64::from(value) * u64::from(num) / u64::from(den);
    Some(u32::try_from(wide).unwrap_or(u32::MAX))
}
