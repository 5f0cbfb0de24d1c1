//! JSON case documents: an already-decoded RT dose grid plus structure set.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EngineError, Result};
use crate::grid::{Contour, DoseGrid, Structure};

pub const DOSE_MODALITY: &str = "RTDOSE";
pub const STRUCT_MODALITY: &str = "RTSTRUCT";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseDoc {
    #[serde(default)]
    pub patient_id: Option<String>,
    pub dose: DoseDoc,
    pub structure_set: StructureSetDoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseDoc {
    pub modality: String,
    pub dims: [usize; 3],
    pub spacing: [f64; 3],
    pub origin: [f64; 3],
    /// Multiplier turning stored values into Gy.
    #[serde(default)]
    pub scaling: Option<f64>,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureSetDoc {
    pub modality: String,
    pub rois: Vec<RoiDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiDoc {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub contours: Vec<Contour>,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub patient_id: Option<String>,
    pub grid: DoseGrid,
    pub structures: Vec<Structure>,
}

pub fn parse_case(json: &str) -> Result<Case> {
    let doc: CaseDoc = serde_json::from_str(json)
        .map_err(|e| EngineError::InvalidInput(format!("case JSON: {}", e)))?;
    case_from_doc(doc)
}

pub fn case_from_doc(doc: CaseDoc) -> Result<Case> {
    check_modality(DOSE_MODALITY, &doc.dose.modality)?;
    check_modality(STRUCT_MODALITY, &doc.structure_set.modality)?;

    let DoseDoc {
        dims,
        spacing,
        origin,
        scaling,
        mut values,
        ..
    } = doc.dose;
    if let Some(scale) = scaling {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(EngineError::InvalidParameter {
                name: "scaling",
                value: scale,
                reason: "dose grid scaling must be positive",
            });
        }
        for v in values.iter_mut() {
            *v = (*v as f64 * scale) as f32;
        }
    }
    let grid = DoseGrid::new(dims, spacing, origin, values)?;

    let structures = doc
        .structure_set
        .rois
        .into_iter()
        .map(|roi| Structure::new(roi.number, roi.name, roi.contours))
        .collect();

    Ok(Case {
        patient_id: doc.patient_id,
        grid,
        structures,
    })
}

pub fn read_case(path: &Path) -> anyhow::Result<Case> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read case {}", path.display()))?;
    let case = parse_case(&content).with_context(|| format!("invalid case {}", path.display()))?;
    info!(
        path = %path.display(),
        dims = ?case.grid.dims(),
        structures = case.structures.len(),
        "case loaded"
    );
    Ok(case)
}

fn check_modality(expected: &'static str, found: &str) -> Result<()> {
    if found.trim().eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(EngineError::MissingModality {
            expected,
            found: found.to_string(),
        })
    }
}
