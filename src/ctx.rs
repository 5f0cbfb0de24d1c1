use std::path::PathBuf;
use std::sync::Arc;

use crate::dvh::{DEFAULT_BIN_WIDTH, Dvh};
use crate::io::case::Case;
use crate::mask::FillRule;
use crate::metrics::{DEFAULT_DX_PERCENTS, DEFAULT_VX_DOSES, DoseVolumeMetrics};
use crate::models::{ModelResult, NtcpModel, OutcomeSummary, TcpModel};
use crate::params::{ParameterTables, ResolvedOrgan, ResolvedTumor};
use crate::schema::v1::{CaseMeta, DoseRespV1, FailureRecord, Role};
use crate::session::{CancelToken, Session};

/// α/β (Gy) assumed for organs at risk when none is given.
pub const DEFAULT_OAR_ALPHA_BETA: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub structure: String,
    pub tissue: String,
}

/// `STRUCTURE.parameter=value`, applied on top of the table entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamOverride {
    pub structure: String,
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub json_path: PathBuf,
    pub tsv_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TargetPlan {
    pub structure: String,
    pub resolved: ResolvedTumor,
}

#[derive(Debug, Clone)]
pub struct OrganPlan {
    pub structure: String,
    pub resolved: ResolvedOrgan,
}

pub struct Ctx {
    pub case_path: PathBuf,
    pub params_path: Option<PathBuf>,
    pub targets: Vec<Assignment>,
    pub organs: Vec<Assignment>,
    pub tcp_models: Vec<TcpModel>,
    pub ntcp_models: Vec<NtcpModel>,
    pub overrides: Vec<ParamOverride>,
    pub bin_width: f64,
    pub fill_rule: FillRule,
    pub fractions: u32,
    pub prescription: Option<f64>,
    pub oar_alpha_beta: f64,
    pub dx_percents: Vec<f64>,
    pub vx_doses: Vec<f64>,
    pub write_json: bool,
    pub write_tsv: bool,
    pub threads: usize,
    pub cancel: CancelToken,
    pub warnings: Vec<String>,
    pub case_meta: Option<CaseMeta>,
    pub session: Option<Session>,
    pub tables: Option<ParameterTables>,
    pub target_plans: Vec<TargetPlan>,
    pub organ_plans: Vec<OrganPlan>,
    pub dvhs: Vec<Arc<Dvh>>,
    pub metrics: Vec<DoseVolumeMetrics>,
    pub tcp_results: Vec<ModelResult>,
    pub ntcp_results: Vec<ModelResult>,
    pub outcome: Option<OutcomeSummary>,
    pub failures: Vec<FailureRecord>,
    pub output: OutputPaths,
    pub report: Option<DoseRespV1>,
}

impl Ctx {
    pub fn new(case_path: PathBuf, out_dir: PathBuf, write_json: bool, write_tsv: bool) -> Self {
        let json_path = out_dir.join("doseresp.json");
        let tsv_path = out_dir.join("dvh.tsv");
        Self {
            case_path,
            params_path: None,
            targets: Vec::new(),
            organs: Vec::new(),
            tcp_models: vec![TcpModel::Poisson],
            ntcp_models: vec![NtcpModel::Lkb],
            overrides: Vec::new(),
            bin_width: DEFAULT_BIN_WIDTH,
            fill_rule: FillRule::default(),
            fractions: 1,
            prescription: None,
            oar_alpha_beta: DEFAULT_OAR_ALPHA_BETA,
            dx_percents: DEFAULT_DX_PERCENTS.to_vec(),
            vx_doses: DEFAULT_VX_DOSES.to_vec(),
            write_json,
            write_tsv,
            threads: 0,
            cancel: CancelToken::new(),
            warnings: Vec::new(),
            case_meta: None,
            session: None,
            tables: None,
            target_plans: Vec::new(),
            organ_plans: Vec::new(),
            dvhs: Vec::new(),
            metrics: Vec::new(),
            tcp_results: Vec::new(),
            ntcp_results: Vec::new(),
            outcome: None,
            failures: Vec::new(),
            output: OutputPaths {
                out_dir,
                json_path,
                tsv_path,
            },
            report: None,
        }
    }

    pub fn set_case(&mut self, case: Case) -> anyhow::Result<()> {
        let grid = &case.grid;
        self.case_meta = Some(CaseMeta {
            patient_id: case.patient_id.clone(),
            dims: grid.dims(),
            spacing: grid.spacing(),
            origin: grid.origin(),
            voxel_volume_cc: grid.voxel_volume_cc(),
            max_dose: grid.max_dose() as f64,
            structures: case.structures.len(),
        });
        let session = Session::new(case.grid, case.structures)?
            .with_fill_rule(self.fill_rule)
            .with_dvh_config(crate::dvh::DvhConfig {
                bin_width: self.bin_width,
            });
        self.session = Some(session);
        Ok(())
    }

    pub fn role_of(&self, structure: &str) -> Option<(Role, &str)> {
        if let Some(a) = self.targets.iter().find(|a| a.structure == structure) {
            return Some((Role::Target, a.tissue.as_str()));
        }
        self.organs
            .iter()
            .find(|a| a.structure == structure)
            .map(|a| (Role::Organ, a.tissue.as_str()))
    }

    pub fn dvh(&self, structure: &str) -> Option<&Arc<Dvh>> {
        self.dvhs.iter().find(|d| d.structure() == structure)
    }

    pub fn record_failure(&mut self, structure: &str, stage: &str, error: impl ToString) {
        let error = error.to_string();
        tracing::warn!(structure, stage, error = %error, "structure step failed");
        self.warnings.push(format!("{} [{}]: {}", structure, stage, error));
        self.failures.push(FailureRecord {
            structure: structure.to_string(),
            stage: stage.to_string(),
            error,
        });
    }
}
