pub mod ntcp;
pub mod outcome;
pub mod tcp;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::error::{EngineError, Result};

pub use ntcp::NtcpModel;
pub use outcome::{OutcomeSummary, complication_free_probability, summarize_outcome};
pub use tcp::TcpModel;

/// Deviation outside [0, 1] tolerated without a warning.
pub const CLAMP_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Tcp,
    Ntcp,
}

/// A probability had to be clamped back into [0, 1] by more than
/// [`CLAMP_TOLERANCE`]. The clamped value is still returned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericInstabilityWarning {
    pub raw: f64,
    pub clamped: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelResult {
    pub kind: ModelKind,
    pub model: &'static str,
    pub structure: String,
    pub tissue: String,
    pub probability: f64,
    /// Single dose the model was evaluated at (EUD), or the mean dose for
    /// models integrated bin by bin.
    pub representative_dose: f64,
    pub parameters: BTreeMap<String, f64>,
    pub warning: Option<NumericInstabilityWarning>,
}

/// Clamps `raw` into [0, 1], logging when the correction exceeds the
/// tolerance. NaN collapses to 0 and is always reported.
pub fn clamp_probability(
    model: &'static str,
    structure: &str,
    raw: f64,
) -> (f64, Option<NumericInstabilityWarning>) {
    let clamped = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
    let deviation = (raw - clamped).abs();
    if raw.is_nan() || deviation > CLAMP_TOLERANCE {
        warn!(
            model,
            structure,
            raw,
            clamped,
            "probability outside [0, 1]; clamped"
        );
        return (clamped, Some(NumericInstabilityWarning { raw, clamped }));
    }
    (clamped, None)
}

pub(crate) fn require(
    value: Option<f64>,
    model: &'static str,
    parameter: &'static str,
    tissue: &str,
) -> Result<f64> {
    value.ok_or_else(|| EngineError::MissingParameter {
        model,
        parameter,
        tissue: tissue.to_string(),
    })
}

pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(EngineError::InvalidParameter {
            name,
            value,
            reason: "must be positive",
        })
    }
}

pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(EngineError::InvalidParameter {
            name,
            value,
            reason: "must be non-negative",
        })
    }
}

/// `1 / (1 + (d50 / dose)^(4 gamma))`, 0 at zero dose.
pub(crate) fn logistic_response(dose: f64, d50: f64, gamma: f64) -> f64 {
    if dose <= 0.0 {
        return 0.0;
    }
    1.0 / (1.0 + (d50 / dose).powf(4.0 * gamma))
}
