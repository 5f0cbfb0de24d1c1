//! Biologically effective dose.
//!
//! Convention: the LQ correction is applied per differential bin using that
//! bin's dose per fraction, then volume-weighted. Every caller in the crate
//! goes through [`bed`] so the convention cannot drift.

use serde::Serialize;

use crate::dvh::Dvh;
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BedSummary {
    pub alpha_beta: f64,
    pub fractions: u32,
    pub bed: f64,
    pub eqd2: f64,
}

/// Continuous delivery at a finite dose rate with mono-exponential repair.
#[derive(Debug, Clone, Copy)]
pub struct IncompleteRepair {
    /// Gy per minute.
    pub dose_rate: f64,
    /// Minutes.
    pub repair_half_time: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UniformBed {
    pub dose_per_fraction: f64,
    pub bed_basic: f64,
    pub bed_corrected: f64,
    pub g_factor: f64,
}

fn check_inputs(alpha_beta: f64, fractions: u32) -> Result<()> {
    if !(alpha_beta.is_finite() && alpha_beta > 0.0) {
        return Err(EngineError::InvalidParameter {
            name: "alpha_beta",
            value: alpha_beta,
            reason: "must be positive",
        });
    }
    if fractions == 0 {
        return Err(EngineError::InvalidParameter {
            name: "fractions",
            value: 0.0,
            reason: "must be at least 1",
        });
    }
    Ok(())
}

pub fn bed(dvh: &Dvh, alpha_beta: f64, fractions: u32) -> Result<BedSummary> {
    check_inputs(alpha_beta, fractions)?;
    let n = fractions as f64;
    let bed: f64 = dvh
        .differential()
        .map(|(d, v)| v * d * (1.0 + (d / n) / alpha_beta))
        .sum();
    Ok(BedSummary {
        alpha_beta,
        fractions,
        bed,
        eqd2: bed / (1.0 + 2.0 / alpha_beta),
    })
}

/// BED of a uniform total dose, optionally corrected for incomplete repair
/// during each fraction (Lea–Catcheside G factor).
pub fn bed_uniform(
    dose: f64,
    alpha_beta: f64,
    fractions: u32,
    repair: Option<IncompleteRepair>,
) -> Result<UniformBed> {
    check_inputs(alpha_beta, fractions)?;
    if !(dose.is_finite() && dose >= 0.0) {
        return Err(EngineError::OutOfRange {
            quantity: "dose",
            value: dose,
            allowed: "finite, >= 0 Gy",
        });
    }
    let d = dose / fractions as f64;
    let bed_basic = dose * (1.0 + d / alpha_beta);
    let g_factor = match repair {
        Some(r) => {
            if !(r.dose_rate > 0.0 && r.repair_half_time > 0.0) {
                return Err(EngineError::InvalidParameter {
                    name: "dose_rate",
                    value: r.dose_rate,
                    reason: "dose rate and repair half-time must be positive",
                });
            }
            let t = d / r.dose_rate;
            let mu = std::f64::consts::LN_2 / r.repair_half_time;
            let x = mu * t;
            if x > 0.0 {
                (2.0 / x) * (1.0 - (1.0 - (-x).exp()) / x)
            } else {
                1.0
            }
        }
        None => 1.0,
    };
    Ok(UniformBed {
        dose_per_fraction: d,
        bed_basic,
        bed_corrected: dose * (1.0 + g_factor * d / alpha_beta),
        g_factor,
    })
}
