//! Voxel membership: structure contours rasterized onto the dose grid.

pub mod polygon;

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::grid::{DoseGrid, Structure};

pub use polygon::FillRule;

#[derive(Debug, Clone)]
pub struct StructureMask {
    pub structure: String,
    pub grid_dims: [usize; 3],
    pub grid_version: u64,
    /// Sorted, unique flat indices into the dose grid.
    pub indices: Vec<usize>,
    /// Voxels inside the contours but outside the dose grid's extent.
    pub out_of_grid: usize,
}

impl StructureMask {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

struct Plane<'a> {
    z: f64,
    polys: Vec<&'a [[f64; 2]]>,
}

/// Rasterizes `structure` at the dose grid's resolution.
///
/// Every dose-grid slice between the first and last contour plane takes the
/// polygons of its nearest plane; the end planes also claim slices within
/// half a grid spacing. A voxel is a member when its centre lies inside
/// those polygons under `rule`.
pub fn resolve_mask(grid: &DoseGrid, structure: &Structure, rule: FillRule) -> Result<StructureMask> {
    let planes = group_planes(structure);
    let (Some(first), Some(last)) = (planes.first(), planes.last()) else {
        return Err(EngineError::EmptyStructure(structure.name.clone()));
    };

    let dims = grid.dims();
    let spacing = grid.spacing();
    let origin = grid.origin();
    let margin = spacing[2] / 2.0 + 1e-6;
    let k_lo = ((first.z - margin - origin[2]) / spacing[2]).ceil() as i64;
    let k_hi = ((last.z + margin - origin[2]) / spacing[2]).floor() as i64;

    let mut indices = Vec::new();
    let mut out_of_grid = 0usize;

    for k in k_lo..=k_hi {
        let zk = grid.axis_position(2, k);
        let plane = nearest_plane(&planes, zk);
        let Some((_, _, ymin, ymax)) = polygon::bounds(&plane.polys) else {
            continue;
        };
        let j_lo = ((ymin - origin[1]) / spacing[1]).ceil() as i64;
        let j_hi = ((ymax - origin[1]) / spacing[1]).floor() as i64;
        let slice_in_grid = k >= 0 && (k as usize) < dims[2];

        for j in j_lo..=j_hi {
            let py = grid.axis_position(1, j);
            let row_in_grid = slice_in_grid && j >= 0 && (j as usize) < dims[1];
            for (lo, hi) in polygon::row_spans(&plane.polys, py, origin[0], spacing[0], rule) {
                let total = (hi - lo) as usize;
                if !row_in_grid {
                    out_of_grid += total;
                    continue;
                }
                let (a, b) = (lo.max(0), hi.min(dims[0] as i64));
                let kept = if a < b { (b - a) as usize } else { 0 };
                for i in a..b {
                    indices.push(grid.flat_index(i as usize, j as usize, k as usize));
                }
                out_of_grid += total - kept;
            }
        }
    }

    indices.sort_unstable();
    indices.dedup();
    if indices.is_empty() {
        return Err(EngineError::EmptyStructure(structure.name.clone()));
    }

    debug!(
        structure = %structure.name,
        voxels = indices.len(),
        out_of_grid,
        "mask resolved"
    );

    Ok(StructureMask {
        structure: structure.name.clone(),
        grid_dims: dims,
        grid_version: grid.version(),
        indices,
        out_of_grid,
    })
}

fn group_planes(structure: &Structure) -> Vec<Plane<'_>> {
    let mut by_z: BTreeMap<i64, Plane<'_>> = BTreeMap::new();
    for contour in &structure.contours {
        if contour.points.len() < 3 || !contour.z.is_finite() {
            continue;
        }
        // contour heights are grouped at micrometre resolution
        let key = (contour.z * 1000.0).round() as i64;
        by_z.entry(key)
            .or_insert_with(|| Plane {
                z: contour.z,
                polys: Vec::new(),
            })
            .polys
            .push(contour.points.as_slice());
    }
    by_z.into_values().collect()
}

/// Ties go to the lower plane. `planes` is non-empty and sorted by z.
fn nearest_plane<'p, 'a>(planes: &'p [Plane<'a>], z: f64) -> &'p Plane<'a> {
    let idx = planes.partition_point(|p| p.z < z);
    match (idx.checked_sub(1).map(|i| &planes[i]), planes.get(idx)) {
        (Some(below), Some(above)) if above.z - z < z - below.z => above,
        (Some(below), _) => below,
        (None, _) => &planes[0],
    }
}
