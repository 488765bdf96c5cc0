//! ═══════════════════════════════════════════════════════════════════════════════
//! STATS — Statistical Primitives for Trajectory Analysis
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Building blocks shared by the detector, adapter, and diagnostics:
//! - mean / variance over trajectory windows
//! - successive differences (convergence rate estimation)
//! - Shannon entropy of discrete choice counts (strategy diversity)
//! ═══════════════════════════════════════════════════════════════════════════════

use std::cmp::Ordering;

/// Total ordering for f64 sorting (NaN sorts last)
pub fn float_cmp(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Arithmetic mean; 0.0 for an empty slice
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Sample variance (n - 1 denominator); 0.0 for fewer than two samples
pub fn variance(samples: &[f64]) -> f64 {
    let n = samples.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(samples);
    samples.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Signed successive differences: [x1-x0, x2-x1, ...]
pub fn successive_differences(samples: &[f64]) -> Vec<f64> {
    samples.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Mean signed successive difference; 0.0 for fewer than two samples
pub fn mean_successive_difference(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let diffs = successive_differences(samples);
    mean(&diffs)
}

/// Mean absolute successive difference; 0.0 for fewer than two samples
pub fn mean_absolute_difference(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let total: f64 = samples.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    total / (samples.len() - 1) as f64
}

/// Shannon entropy (bits) of a discrete distribution given raw counts.
/// Zero counts contribute nothing; an empty or all-zero slice yields 0.
pub fn shannon_entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let mut entropy = 0.0;
    for &c in counts {
        if c == 0 {
            continue;
        }
        let p = c as f64 / total as f64;
        entropy -= p * (p + 1e-10).log2();
    }
    entropy
}
