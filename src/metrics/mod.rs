pub mod bed;
pub mod dose_volume;
pub mod eud;
pub mod indices;

use serde::Serialize;

use crate::dvh::Dvh;
use crate::error::{EngineError, Result};
use crate::math::stats::weighted_std;

pub use bed::{BedSummary, IncompleteRepair, UniformBed, bed, bed_uniform};
pub use dose_volume::{dx, vx, vx_cc};
pub use eud::{eud, eud_from_n};
pub use indices::{Coverage, Homogeneity, homogeneity_index, prescription_coverage};

pub const DEFAULT_DX_PERCENTS: [f64; 4] = [95.0, 50.0, 5.0, 2.0];
pub const DEFAULT_VX_DOSES: [f64; 6] = [20.0, 30.0, 40.0, 50.0, 60.0, 70.0];
pub const DEFAULT_COVERAGE_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct MetricRequest {
    pub dx_percents: Vec<f64>,
    pub vx_doses: Vec<f64>,
    pub eud_a: Option<f64>,
    pub alpha_beta: Option<f64>,
    pub fractions: u32,
    pub prescription: Option<f64>,
    pub coverage_tolerance: f64,
}

impl Default for MetricRequest {
    fn default() -> Self {
        Self {
            dx_percents: DEFAULT_DX_PERCENTS.to_vec(),
            vx_doses: DEFAULT_VX_DOSES.to_vec(),
            eud_a: None,
            alpha_beta: None,
            fractions: 1,
            prescription: None,
            coverage_tolerance: DEFAULT_COVERAGE_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DxValue {
    pub percent: f64,
    pub dose: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct VxValue {
    pub dose: f64,
    pub fraction: f64,
    pub volume_cc: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EudValue {
    pub a: f64,
    pub eud: f64,
}

/// An optional metric that could not be derived. The rest of the snapshot
/// is still reported.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFailure {
    pub metric: &'static str,
    pub error: EngineError,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoseVolumeMetrics {
    pub structure: String,
    pub volume_cc: f64,
    pub mean_dose: f64,
    pub min_dose: f64,
    pub max_dose: f64,
    pub median_dose: f64,
    pub std_dose: f64,
    pub dx: Vec<DxValue>,
    pub vx: Vec<VxValue>,
    pub eud: Option<EudValue>,
    pub bed: Option<BedSummary>,
    pub homogeneity: Homogeneity,
    pub coverage: Option<Coverage>,
    pub out_of_grid_voxels: usize,
    #[serde(skip)]
    pub failed: Vec<MetricFailure>,
}

/// Dose statistics, Dx and Vx are always derived; a bad request for them is
/// the only error. EUD, BED and coverage fail individually into `failed`.
pub fn compute_metrics(dvh: &Dvh, request: &MetricRequest) -> Result<DoseVolumeMetrics> {
    let samples: Vec<(f64, f64)> = dvh.differential().collect();

    let mut dx_values = Vec::with_capacity(request.dx_percents.len());
    for &p in &request.dx_percents {
        dx_values.push(DxValue {
            percent: p,
            dose: dx(dvh, p)?,
        });
    }

    let mut vx_values = Vec::with_capacity(request.vx_doses.len());
    for &d in &request.vx_doses {
        let fraction = vx(dvh, d)?;
        vx_values.push(VxValue {
            dose: d,
            fraction,
            volume_cc: fraction * dvh.total_volume_cc(),
        });
    }

    let mut failed = Vec::new();
    let eud_value = request
        .eud_a
        .and_then(|a| optional(&mut failed, "eud", eud(dvh, a).map(|eud| EudValue { a, eud })));
    let bed_value = request
        .alpha_beta
        .and_then(|ab| optional(&mut failed, "bed", bed(dvh, ab, request.fractions)));
    let coverage = request.prescription.and_then(|p| {
        optional(
            &mut failed,
            "coverage",
            prescription_coverage(dvh, p, request.coverage_tolerance),
        )
    });

    Ok(DoseVolumeMetrics {
        structure: dvh.structure().to_string(),
        volume_cc: dvh.total_volume_cc(),
        mean_dose: dvh.mean_dose(),
        min_dose: dvh.min_dose(),
        max_dose: dvh.max_dose(),
        median_dose: dx(dvh, 50.0)?,
        std_dose: weighted_std(&samples),
        dx: dx_values,
        vx: vx_values,
        eud: eud_value,
        bed: bed_value,
        homogeneity: homogeneity_index(dvh)?,
        coverage,
        out_of_grid_voxels: dvh.out_of_grid_voxels(),
        failed,
    })
}

fn optional<T>(failed: &mut Vec<MetricFailure>, metric: &'static str, value: Result<T>) -> Option<T> {
    match value {
        Ok(v) => Some(v),
        Err(error) => {
            failed.push(MetricFailure { metric, error });
            None
        }
    }
}
