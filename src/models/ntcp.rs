//! Normal tissue complication probability.
//!
//! `Lkb`, `Logistic` and `Poisson` reduce the DVH to an EUD with the organ's
//! volume-effect parameter `n`. `CriticalVolume` and `RelativeSeriality`
//! work on per-bin subunit response over the differential DVH.

use std::fmt;
use std::str::FromStr;

use crate::dvh::Dvh;
use crate::error::{EngineError, Result};
use crate::math::normal::normal_cdf;
use crate::metrics::eud_from_n;
use crate::models::{
    ModelKind, ModelResult, clamp_probability, logistic_response, non_negative, positive, require,
};
use crate::params::OrganParameters;

/// Seriality below which the parallel-organ limit is used.
const PARALLEL_LIMIT: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NtcpModel {
    Lkb,
    CriticalVolume,
    RelativeSeriality,
    Logistic,
    Poisson,
}

impl NtcpModel {
    pub const ALL: [NtcpModel; 5] = [
        NtcpModel::Lkb,
        NtcpModel::CriticalVolume,
        NtcpModel::RelativeSeriality,
        NtcpModel::Logistic,
        NtcpModel::Poisson,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NtcpModel::Lkb => "lkb",
            NtcpModel::CriticalVolume => "critical_volume",
            NtcpModel::RelativeSeriality => "relative_seriality",
            NtcpModel::Logistic => "logistic",
            NtcpModel::Poisson => "poisson",
        }
    }

    pub fn evaluate(&self, dvh: &Dvh, params: &OrganParameters, tissue: &str) -> Result<ModelResult> {
        let model = self.name();
        let (raw, representative_dose) = match self {
            NtcpModel::Lkb => {
                let td50 = positive("td50", require(params.td50, model, "td50", tissue)?)?;
                let m = positive("m", require(params.m, model, "m", tissue)?)?;
                let n = require(params.n, model, "n", tissue)?;
                let d = eud_from_n(dvh, n)?;
                (normal_cdf((d - td50) / (m * td50)), d)
            }
            NtcpModel::Logistic => {
                let td50 = positive("td50", require(params.td50, model, "td50", tissue)?)?;
                let gamma = positive("gamma", require(params.gamma, model, "gamma", tissue)?)?;
                let n = require(params.n, model, "n", tissue)?;
                let d = eud_from_n(dvh, n)?;
                (logistic_response(d, td50, gamma), d)
            }
            NtcpModel::Poisson => {
                let d50 = positive("d50", require(params.d50, model, "d50", tissue)?)?;
                let gamma = positive("gamma", require(params.gamma, model, "gamma", tissue)?)?;
                let n = require(params.n, model, "n", tissue)?;
                let d = eud_from_n(dvh, n)?;
                (subunit_response(d, d50, gamma), d)
            }
            NtcpModel::CriticalVolume => {
                let d50 = positive("d50", require(params.d50, model, "d50", tissue)?)?;
                let gamma = positive("gamma", require(params.gamma, model, "gamma", tissue)?)?;
                let mu_cr = require(params.critical_fraction, model, "critical_fraction", tissue)?;
                if !(mu_cr > 0.0 && mu_cr < 1.0) {
                    return Err(EngineError::InvalidParameter {
                        name: "critical_fraction",
                        value: mu_cr,
                        reason: "must lie strictly between 0 and 1",
                    });
                }
                let sigma = positive("cv_sigma", require(params.cv_sigma, model, "cv_sigma", tissue)?)?;
                let damaged: f64 = dvh
                    .differential()
                    .map(|(d, v)| v * logistic_response(d, d50, gamma))
                    .sum();
                (critical_volume(damaged, mu_cr, sigma), dvh.mean_dose())
            }
            NtcpModel::RelativeSeriality => {
                let d50 = positive("d50", require(params.d50, model, "d50", tissue)?)?;
                let gamma = positive("gamma", require(params.gamma, model, "gamma", tissue)?)?;
                let s = non_negative("seriality", require(params.seriality, model, "seriality", tissue)?)?;
                (relative_seriality(dvh, d50, gamma, s), dvh.mean_dose())
            }
        };

        let (probability, warning) = clamp_probability(model, dvh.structure(), raw);
        Ok(ModelResult {
            kind: ModelKind::Ntcp,
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

impl fmt::Display for NtcpModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NtcpModel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lkb" | "lyman" => Ok(NtcpModel::Lkb),
            "critical_volume" | "cv" => Ok(NtcpModel::CriticalVolume),
            "relative_seriality" | "rs" => Ok(NtcpModel::RelativeSeriality),
            "logistic" => Ok(NtcpModel::Logistic),
            "poisson" => Ok(NtcpModel::Poisson),
            other => Err(EngineError::UnknownModel {
                kind: "ntcp",
                name: other.to_string(),
            }),
        }
    }
}

/// Poisson subunit response `2^(-exp(e·γ·(1 - D/D50)))`; 0.5 at `D50`.
pub fn subunit_response(dose: f64, d50: f64, gamma: f64) -> f64 {
    let e = std::f64::consts::E;
    (-(e * gamma * (1.0 - dose / d50)).exp() * std::f64::consts::LN_2).exp()
}

/// Probit in `-ln(-ln μ)` of the damaged subunit fraction `μ`.
fn critical_volume(damaged: f64, mu_cr: f64, sigma: f64) -> f64 {
    if damaged <= 0.0 {
        return 0.0;
    }
    if damaged >= 1.0 {
        return 1.0;
    }
    let t = (-(-damaged.ln()).ln() + (-mu_cr.ln()).ln()) / sigma;
    normal_cdf(t)
}

/// `[1 - Π (1 - p(Dᵢ)^s)^vᵢ]^(1/s)`, accumulated in log space.
/// Under uniform dose D this reduces to `p(D)` for every `s`.
fn relative_seriality(dvh: &Dvh, d50: f64, gamma: f64, s: f64) -> f64 {
    let responses: Vec<(f64, f64)> = dvh
        .differential()
        .map(|(d, v)| (subunit_response(d, d50, gamma), v))
        .collect();
    if responses.iter().any(|&(p, _)| p >= 1.0) {
        return 1.0;
    }

    if s < PARALLEL_LIMIT {
        let log_hazard: f64 = responses.iter().map(|&(p, v)| v * (-p.ln()).ln()).sum();
        return (-log_hazard.exp()).exp();
    }

    let log_survival: f64 = responses
        .iter()
        .map(|&(p, v)| v * (-p.powf(s)).ln_1p())
        .sum();
    let ln_inner = (-log_survival.exp()).ln_1p();
    (ln_inner / s).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(dose: f64) -> Dvh {
        Dvh::from_doses("oar", vec![dose; 10], 0.5, 0.027).unwrap()
    }

    fn organ() -> OrganParameters {
        OrganParameters {
            td50: Some(24.5),
            m: Some(0.18),
            n: Some(0.87),
            d50: Some(24.5),
            gamma: Some(2.0),
            seriality: Some(0.1),
            critical_fraction: Some(0.5),
            cv_sigma: Some(0.1),
        }
    }

    #[test]
    fn subunit_response_is_half_at_d50() {
        assert!((subunit_response(30.0, 30.0, 1.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn every_model_is_half_at_d50_for_uniform_dose() {
        let dvh = uniform(24.5);
        for model in [
            NtcpModel::Lkb,
            NtcpModel::Logistic,
            NtcpModel::Poisson,
            NtcpModel::CriticalVolume,
        ] {
            let r = model.evaluate(&dvh, &organ(), "lung").unwrap();
            assert!((r.probability - 0.5).abs() < 1e-6, "{}", model);
        }
        let r = NtcpModel::RelativeSeriality
            .evaluate(&dvh, &organ(), "lung")
            .unwrap();
        assert!((r.probability - 0.5).abs() < 1e-9);
    }

    #[test]
    fn seriality_parallel_limit_is_continuous() {
        let dvh = Dvh::from_differential("oar", &[(10.0, 0.5), (40.0, 0.5)], 0.5, 100.0).unwrap();
        let mut p = organ();
        p.seriality = Some(1e-4);
        let near = NtcpModel::RelativeSeriality.evaluate(&dvh, &p, "lung").unwrap();
        p.seriality = Some(0.0);
        let limit = NtcpModel::RelativeSeriality.evaluate(&dvh, &p, "lung").unwrap();
        assert!((near.probability - limit.probability).abs() < 1e-3);
    }

    #[test]
    fn critical_volume_rejects_bad_fraction() {
        let mut p = organ();
        p.critical_fraction = Some(1.0);
        let err = NtcpModel::CriticalVolume
            .evaluate(&uniform(20.0), &p, "lung")
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidParameter {
                name: "critical_fraction",
                ..
            }
        ));
    }

    #[test]
    fn lkb_missing_m_is_reported() {
        let mut p = organ();
        p.m = None;
        let err = NtcpModel::Lkb.evaluate(&uniform(20.0), &p, "custom").unwrap_err();
        assert_eq!(
            err,
            EngineError::MissingParameter {
                model: "lkb",
                parameter: "m",
                tissue: "custom".to_string(),
            }
        );
    }
}
