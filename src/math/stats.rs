//! Volume-weighted statistics over `(value, weight)` samples.
//!
//! Weights need not be normalised. Empty or zero-weight input yields 0.

pub fn weighted_mean(samples: &[(f64, f64)]) -> f64 {
    let total: f64 = samples.iter().map(|s| s.1).sum();
    if total <= 0.0 {
        return 0.0;
    }
    samples.iter().map(|(v, w)| v * w).sum::<f64>() / total
}

pub fn weighted_std(samples: &[(f64, f64)]) -> f64 {
    let total: f64 = samples.iter().map(|s| s.1).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mean = weighted_mean(samples);
    let var = samples
        .iter()
        .map(|(v, w)| w * (v - mean) * (v - mean))
        .sum::<f64>()
        / total;
    var.max(0.0).sqrt()
}

/// Generalized mean `(sum w v^p / sum w)^(1/p)` for finite non-zero `p`.
///
/// Values are scaled by the extreme relevant to the sign of `p` before
/// exponentiation so large `|p|` neither overflows nor underflows.
pub fn power_mean(samples: &[(f64, f64)], p: f64) -> f64 {
    let total: f64 = samples.iter().map(|s| s.1).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let live = samples.iter().filter(|s| s.1 > 0.0);
    let scale = if p > 0.0 {
        live.map(|s| s.0).fold(0.0, f64::max)
    } else {
        live.map(|s| s.0).fold(f64::INFINITY, f64::min)
    };
    if scale <= 0.0 {
        return 0.0;
    }
    let acc: f64 = samples
        .iter()
        .filter(|s| s.1 > 0.0)
        .map(|(v, w)| w * (v / scale).powf(p))
        .sum::<f64>()
        / total;
    scale * acc.powf(1.0 / p)
}
