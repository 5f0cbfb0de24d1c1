//! Tumor control probability.
//!
//! Sigmoid models (`Poisson`, `Logistic`) are evaluated once at the EUD.
//! `LinearQuadratic` and `WebbNahum` integrate cell survival bin by bin over
//! the differential DVH.

use std::fmt;
use std::str::FromStr;

use crate::dvh::Dvh;
use crate::error::{EngineError, Result};
use crate::metrics::eud;
use crate::models::{
    ModelKind, ModelResult, clamp_probability, logistic_response, non_negative, positive, require,
};
use crate::params::TumorParameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TcpModel {
    Poisson,
    LinearQuadratic,
    WebbNahum,
    Logistic,
}

impl TcpModel {
    pub const ALL: [TcpModel; 4] = [
        TcpModel::Poisson,
        TcpModel::LinearQuadratic,
        TcpModel::WebbNahum,
        TcpModel::Logistic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TcpModel::Poisson => "poisson",
            TcpModel::LinearQuadratic => "lq",
            TcpModel::WebbNahum => "webb_nahum",
            TcpModel::Logistic => "logistic",
        }
    }

    pub fn evaluate(&self, dvh: &Dvh, params: &TumorParameters, tissue: &str) -> Result<ModelResult> {
        let model = self.name();
        let (raw, representative_dose) = match self {
            TcpModel::Poisson => {
                let td50 = positive("td50", require(params.td50, model, "td50", tissue)?)?;
                let gamma50 = positive("gamma50", require(params.gamma50, model, "gamma50", tissue)?)?;
                let a = require(params.eud_a, model, "eud_a", tissue)?;
                let d = eud(dvh, a)?;
                (poisson_sigmoid(d, td50, gamma50), d)
            }
            TcpModel::Logistic => {
                let td50 = positive("td50", require(params.td50, model, "td50", tissue)?)?;
                let gamma50 = positive("gamma50", require(params.gamma50, model, "gamma50", tissue)?)?;
                let a = require(params.eud_a, model, "eud_a", tissue)?;
                let d = eud(dvh, a)?;
                (logistic_response(d, td50, gamma50), d)
            }
            TcpModel::LinearQuadratic => {
                let alpha = non_negative("alpha", require(params.alpha, model, "alpha", tissue)?)?;
                let beta = non_negative("beta", require(params.beta, model, "beta", tissue)?)?;
                let tcp: f64 = dvh
                    .differential()
                    .map(|(d, v)| v * -(-(alpha * d + beta * d * d)).exp_m1())
                    .sum();
                (tcp, dvh.mean_dose())
            }
            TcpModel::WebbNahum => {
                let alpha = non_negative("alpha", require(params.alpha, model, "alpha", tissue)?)?;
                let beta = non_negative("beta", require(params.beta, model, "beta", tissue)?)?;
                let rho = non_negative(
                    "clonogen_density",
                    require(params.clonogen_density, model, "clonogen_density", tissue)?,
                )?;
                let mean_survival: f64 = dvh
                    .differential()
                    .map(|(d, v)| v * lq_survival(d, alpha, beta))
                    .sum();
                let expected_clonogens = rho * dvh.total_volume_cc() * mean_survival;
                ((-expected_clonogens).exp(), dvh.mean_dose())
            }
        };

        let (probability, warning) = clamp_probability(model, dvh.structure(), raw);
        Ok(ModelResult {
            kind: ModelKind::Tcp,
            model,
            structure: dvh.structure().to_string(),
            tissue: tissue.to_string(),
            probability,
            representative_dose,
            parameters: params.snapshot(),
            warning,
        })
    }
}

impl fmt::Display for TcpModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TcpModel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poisson" => Ok(TcpModel::Poisson),
            "lq" | "linear_quadratic" => Ok(TcpModel::LinearQuadratic),
            "webb_nahum" => Ok(TcpModel::WebbNahum),
            "logistic" => Ok(TcpModel::Logistic),
            other => Err(EngineError::UnknownModel {
                kind: "tcp",
                name: other.to_string(),
            }),
        }
    }
}

/// Cell surviving fraction under the LQ law for total dose `d`.
pub fn lq_survival(d: f64, alpha: f64, beta: f64) -> f64 {
    (-(alpha * d + beta * d * d)).exp()
}

fn poisson_sigmoid(dose: f64, td50: f64, gamma50: f64) -> f64 {
    1.0 / (1.0 + (-4.0 * gamma50 * (dose - td50) / td50).exp())
}
