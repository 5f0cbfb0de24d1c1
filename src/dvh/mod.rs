//! Dose-volume histograms.
//!
//! Bin `k` covers `[k*w, (k+1)*w)`: a dose exactly on an edge belongs to the
//! bin above it. The cumulative curve is anchored at the exact minimum and
//! maximum dose and interpolates linearly through the interior bin edges, so
//! `cumulative_at(d) == 1` for `d <= min` and `0` for `d > max`.

pub mod builder;

use serde::Serialize;

use crate::error::{EngineError, Result};

pub use builder::{DEFAULT_BIN_WIDTH, DvhConfig, build_dvh};

#[derive(Debug, Clone, Serialize)]
pub struct DvhBin {
    pub lower: f64,
    /// Mean dose of the samples in the bin, or the bin centre when empty.
    pub dose: f64,
    pub count: u64,
    pub volume: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dvh {
    structure: String,
    bin_width: f64,
    bins: Vec<DvhBin>,
    /// Fraction of volume with dose >= `k * bin_width`, one entry per edge
    /// including the terminal edge above the last bin.
    cumulative: Vec<f64>,
    #[serde(skip)]
    curve: Vec<(f64, f64)>,
    min_dose: f64,
    max_dose: f64,
    mean_dose: f64,
    sample_count: usize,
    total_volume_cc: f64,
    out_of_grid_voxels: usize,
}

impl Dvh {
    pub fn from_doses(
        structure: impl Into<String>,
        doses: Vec<f64>,
        bin_width: f64,
        voxel_volume_cc: f64,
    ) -> Result<Self> {
        let total = doses.len() as f64 * voxel_volume_cc;
        let samples = doses.into_iter().map(|d| (d, 1.0)).collect();
        Self::from_samples(structure.into(), samples, bin_width, total)
    }

    /// DVH from `(dose, relative volume)` pairs. Weights are normalised;
    /// `total_volume_cc` is the absolute structure volume they describe.
    pub fn from_differential(
        structure: impl Into<String>,
        pairs: &[(f64, f64)],
        bin_width: f64,
        total_volume_cc: f64,
    ) -> Result<Self> {
        Self::from_samples(structure.into(), pairs.to_vec(), bin_width, total_volume_cc)
    }

    fn from_samples(
        structure: String,
        mut samples: Vec<(f64, f64)>,
        bin_width: f64,
        total_volume_cc: f64,
    ) -> Result<Self> {
        if !(bin_width.is_finite() && bin_width > 0.0) {
            return Err(EngineError::InvalidParameter {
                name: "bin_width",
                value: bin_width,
                reason: "must be positive and finite",
            });
        }
        if !(total_volume_cc.is_finite() && total_volume_cc >= 0.0) {
            return Err(EngineError::InvalidParameter {
                name: "total_volume_cc",
                value: total_volume_cc,
                reason: "must be non-negative and finite",
            });
        }
        for &(d, w) in &samples {
            if !(d.is_finite() && d >= 0.0) {
                return Err(EngineError::InvalidInput(format!(
                    "{}: dose {} must be finite and non-negative",
                    structure, d
                )));
            }
            if !(w.is_finite() && w >= 0.0) {
                return Err(EngineError::InvalidInput(format!(
                    "{}: volume weight {} must be finite and non-negative",
                    structure, w
                )));
            }
        }
        samples.retain(|&(_, w)| w > 0.0);
        if samples.is_empty() {
            return Err(EngineError::EmptyStructure(structure));
        }
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));

        let min_dose = samples[0].0;
        let max_dose = samples[samples.len() - 1].0;
        let total_weight: f64 = samples.iter().map(|s| s.1).sum();
        let n_bins = bin_index(max_dose, bin_width) + 1;

        let mut bins: Vec<DvhBin> = (0..n_bins)
            .map(|k| DvhBin {
                lower: edge(k, bin_width),
                dose: edge(k, bin_width) + bin_width / 2.0,
                count: 0,
                volume: 0.0,
            })
            .collect();
        let mut dose_weight = vec![0.0f64; n_bins];

        // samples are sorted, so the bin index only moves forward
        let mut k = 0usize;
        for &(d, w) in &samples {
            while edge(k + 1, bin_width) <= d {
                k += 1;
            }
            bins[k].volume += w;
            bins[k].count += 1;
            dose_weight[k] += d * w;
        }
        for (bin, dw) in bins.iter_mut().zip(dose_weight) {
            if bin.volume > 0.0 {
                bin.dose = dw / bin.volume;
                bin.volume /= total_weight;
            }
        }

        let mut cumulative = vec![0.0f64; n_bins + 1];
        for k in (0..n_bins).rev() {
            cumulative[k] = (cumulative[k + 1] + bins[k].volume).min(1.0);
        }
        cumulative[0] = 1.0;

        let mean_dose = bins.iter().map(|b| b.volume * b.dose).sum();
        let curve = build_curve(&cumulative, bin_width, min_dose, max_dose);

        Ok(Self {
            structure,
            bin_width,
            bins,
            cumulative,
            curve,
            min_dose,
            max_dose,
            mean_dose,
            sample_count: samples.len(),
            total_volume_cc,
            out_of_grid_voxels: 0,
        })
    }

    pub fn with_out_of_grid(mut self, voxels: usize) -> Self {
        self.out_of_grid_voxels = voxels;
        self
    }

    pub fn structure(&self) -> &str {
        &self.structure
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn bins(&self) -> &[DvhBin] {
        &self.bins
    }

    /// Non-empty bins as `(dose, volume fraction)`, the form radiobiological
    /// models integrate over.
    pub fn differential(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bins
            .iter()
            .filter(|b| b.volume > 0.0)
            .map(|b| (b.dose, b.volume))
    }

    pub fn min_dose(&self) -> f64 {
        self.min_dose
    }

    pub fn max_dose(&self) -> f64 {
        self.max_dose
    }

    pub fn mean_dose(&self) -> f64 {
        self.mean_dose
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn total_volume_cc(&self) -> f64 {
        self.total_volume_cc
    }

    pub fn out_of_grid_voxels(&self) -> usize {
        self.out_of_grid_voxels
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.cumulative
            .iter()
            .enumerate()
            .map(|(k, &c)| (edge(k, self.bin_width), c))
            .collect()
    }

    pub fn cumulative_at(&self, dose: f64) -> f64 {
        if dose <= self.min_dose {
            return 1.0;
        }
        if dose > self.max_dose {
            return 0.0;
        }
        let j = self.curve.partition_point(|&(x, _)| x < dose);
        let Some(&(x1, c1)) = self.curve.get(j) else {
            return 0.0;
        };
        if x1 == dose || j == 0 {
            return c1;
        }
        let (x0, c0) = self.curve[j - 1];
        c0 + (c1 - c0) * (dose - x0) / (x1 - x0)
    }

    /// Lowest dose at which the cumulative fraction has fallen to `fraction`.
    pub fn dose_at_fraction(&self, fraction: f64) -> f64 {
        if fraction >= 1.0 || self.curve.len() < 2 {
            return self.min_dose;
        }
        if fraction <= 0.0 {
            return self.max_dose;
        }
        let j = self.curve.partition_point(|&(_, c)| c > fraction);
        let Some(&(x1, c1)) = self.curve.get(j) else {
            return self.max_dose;
        };
        if j == 0 {
            return x1;
        }
        let (x0, c0) = self.curve[j - 1];
        if c0 == c1 {
            return x0;
        }
        x0 + (x1 - x0) * (c0 - fraction) / (c0 - c1)
    }
}

fn edge(k: usize, width: f64) -> f64 {
    k as f64 * width
}

/// Bin holding `dose` under the lower-edge-inclusive rule, consistent with
/// edges computed as `k * width`.
pub(crate) fn bin_index(dose: f64, width: f64) -> usize {
    let mut k = (dose / width).floor().max(0.0) as usize;
    while k > 0 && edge(k, width) > dose {
        k -= 1;
    }
    while edge(k + 1, width) <= dose {
        k += 1;
    }
    k
}

fn build_curve(cumulative: &[f64], width: f64, min_dose: f64, max_dose: f64) -> Vec<(f64, f64)> {
    if min_dose == max_dose {
        return vec![(min_dose, 1.0)];
    }
    let mut curve = vec![(min_dose, 1.0)];
    let k_lo = bin_index(min_dose, width) + 1;
    let k_hi = bin_index(max_dose, width);
    for k in k_lo..=k_hi {
        let e = edge(k, width);
        if e > min_dose && e < max_dose {
            curve.push((e, cumulative[k]));
        }
    }
    curve.push((max_dose, 0.0));
    curve
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_index_edges_go_up() {
        assert_eq!(bin_index(0.0, 0.5), 0);
        assert_eq!(bin_index(0.49, 0.5), 0);
        assert_eq!(bin_index(0.5, 0.5), 1);
        assert_eq!(bin_index(70.0, 0.1), bin_index(70.0, 0.1));
        let k = bin_index(70.0, 0.1);
        assert!(edge(k, 0.1) <= 70.0 && 70.0 < edge(k + 1, 0.1));
    }

    #[test]
    fn curve_is_monotone() {
        let doses = vec![1.0, 2.0, 2.5, 3.0, 7.25, 9.0];
        let dvh = Dvh::from_doses("s", doses, 1.0, 0.001).unwrap();
        for w in dvh.curve.windows(2) {
            assert!(w[0].0 < w[1].0);
            assert!(w[0].1 >= w[1].1);
        }
    }
}
