use crate::dvh::Dvh;
use crate::error::{EngineError, Result};

/// Dose (Gy) covering `x` percent of the structure volume, `0 < x <= 100`.
pub fn dx(dvh: &Dvh, x: f64) -> Result<f64> {
    if !(x.is_finite() && x > 0.0 && x <= 100.0) {
        return Err(EngineError::OutOfRange {
            quantity: "Dx percent",
            value: x,
            allowed: "0 < x <= 100",
        });
    }
    Ok(dvh.dose_at_fraction(x / 100.0))
}

pub fn vx(dvh: &Dvh, dose: f64) -> Result<f64> {
    if !(dose.is_finite() && dose >= 0.0) {
        return Err(EngineError::OutOfRange {
            quantity: "Vx dose",
            value: dose,
            allowed: "finite, >= 0 Gy",
        });
    }
    Ok(dvh.cumulative_at(dose))
}

pub fn vx_cc(dvh: &Dvh, dose: f64) -> Result<f64> {
    Ok(vx(dvh, dose)? * dvh.total_volume_cc())
}
