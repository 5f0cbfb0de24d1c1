use serde::Serialize;

use crate::dvh::Dvh;
use crate::error::{EngineError, Result};
use crate::metrics::dose_volume::{dx, vx};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Homogeneity {
    pub index: f64,
    pub d5: f64,
    pub d95: f64,
    pub mean_dose: f64,
}

/// `(D5 - D95) / mean dose`; 0 when the mean dose is 0.
pub fn homogeneity_index(dvh: &Dvh) -> Result<Homogeneity> {
    let d5 = dx(dvh, 5.0)?;
    let d95 = dx(dvh, 95.0)?;
    let mean = dvh.mean_dose();
    let index = if mean > 0.0 { (d5 - d95) / mean } else { 0.0 };
    Ok(Homogeneity {
        index,
        d5,
        d95,
        mean_dose: mean,
    })
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Coverage {
    pub prescription_dose: f64,
    pub tolerance: f64,
    /// Volume fraction with dose inside `prescription * (1 ± tolerance)`.
    pub fraction: f64,
    pub volume_cc: f64,
}

pub fn prescription_coverage(dvh: &Dvh, prescription: f64, tolerance: f64) -> Result<Coverage> {
    if !(prescription.is_finite() && prescription > 0.0) {
        return Err(EngineError::InvalidParameter {
            name: "prescription",
            value: prescription,
            reason: "must be positive",
        });
    }
    if !(tolerance.is_finite() && (0.0..1.0).contains(&tolerance)) {
        return Err(EngineError::InvalidParameter {
            name: "tolerance",
            value: tolerance,
            reason: "must be in [0, 1)",
        });
    }
    let lo = prescription * (1.0 - tolerance);
    let hi = prescription * (1.0 + tolerance);
    let fraction = (vx(dvh, lo)? - vx(dvh, hi)?).max(0.0);
    Ok(Coverage {
        prescription_dose: prescription,
        tolerance,
        fraction,
        volume_cc: fraction * dvh.total_volume_cc(),
    })
}
