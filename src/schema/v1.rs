use serde::Serialize;

use crate::metrics::DoseVolumeMetrics;
use crate::models::{ModelResult, OutcomeSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Target,
    Organ,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseMeta {
    pub patient_id: Option<String>,
    pub dims: [usize; 3],
    pub spacing: [f64; 3],
    pub origin: [f64; 3],
    pub voxel_volume_cc: f64,
    pub max_dose: f64,
    pub structures: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub bin_width: f64,
    pub fill_rule: String,
    pub fractions: u32,
    pub prescription: Option<f64>,
    pub tcp_models: Vec<String>,
    pub ntcp_models: Vec<String>,
    pub params_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureReport {
    pub name: String,
    pub role: Option<Role>,
    pub tissue: Option<String>,
    pub metrics: DoseVolumeMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub structure: String,
    pub stage: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoseRespV1 {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub case: Option<CaseMeta>,
    pub settings: Settings,
    pub structures: Vec<StructureReport>,
    pub tcp: Vec<ModelResult>,
    pub ntcp: Vec<ModelResult>,
    pub outcome: Option<OutcomeSummary>,
    pub dvh_tsv_path: Option<String>,
    pub failures: Vec<FailureRecord>,
    pub warnings: Vec<String>,
}
