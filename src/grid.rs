use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

static NEXT_GRID_VERSION: AtomicU64 = AtomicU64::new(1);

/// Regular 3D lattice of absolute dose values (Gy).
///
/// `origin` is the physical position (mm) of the centre of voxel `(0, 0, 0)`.
/// Values are stored x-fastest: `z * ny * nx + y * nx + x`.
#[derive(Debug, Clone)]
pub struct DoseGrid {
    dims: [usize; 3],
    spacing: [f64; 3],
    origin: [f64; 3],
    values: Vec<f32>,
    version: u64,
}

impl DoseGrid {
    pub fn new(
        dims: [usize; 3],
        spacing: [f64; 3],
        origin: [f64; 3],
        values: Vec<f32>,
    ) -> Result<Self> {
        let expected = dims[0]
            .checked_mul(dims[1])
            .and_then(|v| v.checked_mul(dims[2]))
            .ok_or_else(|| EngineError::InvalidInput("dose grid dims overflow".to_string()))?;
        if expected == 0 {
            return Err(EngineError::InvalidInput(
                "dose grid has a zero dimension".to_string(),
            ));
        }
        if values.len() != expected {
            return Err(EngineError::InvalidInput(format!(
                "dose grid expects {} values, got {}",
                expected,
                values.len()
            )));
        }
        for (axis, &s) in ["dx", "dy", "dz"].iter().zip(spacing.iter()) {
            if !(s.is_finite() && s > 0.0) {
                return Err(EngineError::InvalidInput(format!(
                    "voxel spacing {} must be positive, got {}",
                    axis, s
                )));
            }
        }
        if origin.iter().any(|o| !o.is_finite()) {
            return Err(EngineError::InvalidInput(
                "dose grid origin must be finite".to_string(),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(EngineError::InvalidInput(format!(
                "dose values must be finite and non-negative, found {}",
                bad
            )));
        }
        Ok(Self {
            dims,
            spacing,
            origin,
            values,
            version: NEXT_GRID_VERSION.fetch_add(1, Ordering::Relaxed),
        })
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Voxel volume in cm³.
    pub fn voxel_volume_cc(&self) -> f64 {
        self.spacing[0] * self.spacing[1] * self.spacing[2] / 1000.0
    }

    pub fn flat_index(&self, x: usize, y: usize, z: usize) -> usize {
        z * self.dims[1] * self.dims[0] + y * self.dims[0] + x
    }

    pub fn dose_at_flat(&self, idx: usize) -> Option<f32> {
        self.values.get(idx).copied()
    }

    pub fn max_dose(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }

    /// Physical centre (mm) of lattice position `i` along `axis`. Accepts
    /// positions outside the grid.
    pub fn axis_position(&self, axis: usize, i: i64) -> f64 {
        self.origin[axis] + i as f64 * self.spacing[axis]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contour {
    pub z: f64,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub number: u32,
    pub name: String,
    pub contours: Vec<Contour>,
}

impl Structure {
    pub fn new(number: u32, name: impl Into<String>, contours: Vec<Contour>) -> Self {
        Self {
            number,
            name: name.into(),
            contours,
        }
    }
}
