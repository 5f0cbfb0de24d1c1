use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dvh::Dvh;
use crate::error::{EngineError, Result};
use crate::grid::DoseGrid;
use crate::mask::StructureMask;

pub const DEFAULT_BIN_WIDTH: f64 = 0.1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DvhConfig {
    /// Histogram bin width (Gy).
    pub bin_width: f64,
}

impl Default for DvhConfig {
    fn default() -> Self {
        Self {
            bin_width: DEFAULT_BIN_WIDTH,
        }
    }
}

/// Histograms the dose of every masked voxel.
pub fn build_dvh(grid: &DoseGrid, mask: &StructureMask, config: &DvhConfig) -> Result<Dvh> {
    if mask.grid_version != grid.version() {
        return Err(EngineError::GridMismatch {
            structure: mask.structure.clone(),
            reason: format!(
                "mask built for grid version {}, current version {}",
                mask.grid_version,
                grid.version()
            ),
        });
    }
    if mask.grid_dims != grid.dims() {
        return Err(EngineError::GridMismatch {
            structure: mask.structure.clone(),
            reason: format!("mask dims {:?} != grid dims {:?}", mask.grid_dims, grid.dims()),
        });
    }
    if mask.is_empty() {
        return Err(EngineError::EmptyStructure(mask.structure.clone()));
    }

    let mut doses = Vec::with_capacity(mask.len());
    for &idx in &mask.indices {
        let dose = grid
            .dose_at_flat(idx)
            .ok_or_else(|| EngineError::GridMismatch {
                structure: mask.structure.clone(),
                reason: format!("voxel index {} outside grid", idx),
            })?;
        doses.push(dose as f64);
    }

    if mask.out_of_grid > 0 {
        warn!(
            structure = %mask.structure,
            out_of_grid = mask.out_of_grid,
            in_grid = mask.len(),
            "structure extends beyond the dose grid; out-of-grid voxels excluded from DVH"
        );
    }

    let dvh = Dvh::from_doses(
        mask.structure.clone(),
        doses,
        config.bin_width,
        grid.voxel_volume_cc(),
    )?
    .with_out_of_grid(mask.out_of_grid);

    debug!(
        structure = %mask.structure,
        bins = dvh.bins().len(),
        max_dose = dvh.max_dose(),
        "dvh built"
    );
    Ok(dvh)
}
