use crate::dvh::Dvh;
use crate::error::{EngineError, Result};
use crate::math::stats::power_mean;

/// Generalized equivalent uniform dose `(Σ vᵢ Dᵢᵃ)^(1/a)`.
///
/// `a = 1` is the mean dose, `a = +∞` the maximum and `a = -∞` the minimum.
/// With `a < 0` any zero-dose volume drives the EUD to 0.
pub fn eud(dvh: &Dvh, a: f64) -> Result<f64> {
    if a.is_nan() {
        return Err(EngineError::InvalidParameter {
            name: "a",
            value: a,
            reason: "EUD exponent must be a number",
        });
    }
    if a == 0.0 {
        return Err(EngineError::InvalidExponent);
    }
    if a == f64::INFINITY {
        return Ok(dvh.max_dose());
    }
    if a == f64::NEG_INFINITY {
        return Ok(dvh.min_dose());
    }
    let samples: Vec<(f64, f64)> = dvh.differential().collect();
    Ok(power_mean(&samples, a))
}

/// EUD for an organ volume-effect parameter `n` (`a = 1/n`); `n = 0` is the
/// fully serial limit and yields the maximum dose.
pub fn eud_from_n(dvh: &Dvh, n: f64) -> Result<f64> {
    if !(n.is_finite() && n >= 0.0) {
        return Err(EngineError::InvalidParameter {
            name: "n",
            value: n,
            reason: "volume-effect parameter must be finite and >= 0",
        });
    }
    if n == 0.0 {
        return Ok(dvh.max_dose());
    }
    eud(dvh, 1.0 / n)
}
