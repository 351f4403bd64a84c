use serde::{Deserialize, Serialize};

/// Summary statistics of a vector of per-trial estimates.
///
/// A pure function of the estimate vector: computing it twice over the same
/// values yields identical results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateStats {
    pub mean: f64,
    pub median: f64,
    /// 0th, 25th, 50th, 75th and 100th percentiles (linear interpolation).
    pub quartiles: [f64; 5],
    /// Fisher-Pearson adjusted skewness coefficient.
    pub skewness: f64,
}

impl EstimateStats {
    pub fn from_values(vals: &[f64]) -> Self {
        let mut sorted = vals.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let quartiles = [
            quantile(&sorted, 0.0),
            quantile(&sorted, 0.25),
            quantile(&sorted, 0.5),
            quantile(&sorted, 0.75),
            quantile(&sorted, 1.0),
        ];

        Self {
            mean: compute_mean(vals),
            median: quartiles[2],
            quartiles,
            skewness: compute_skewness(vals),
        }
    }
}

pub fn compute_mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// Compute the `q`-quantile of a sorted slice by linear interpolation.
///
/// Uses the `q * (n - 1)` positioning convention, so `q = 0.0` and `q = 1.0`
/// return the minimum and maximum exactly.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n_vals = sorted.len();
    if n_vals == 0 {
        return f64::NAN;
    }
    if n_vals == 1 {
        return sorted[0];
    }

    let pos = q.clamp(0.0, 1.0) * (n_vals - 1) as f64;
    let idx = pos.floor() as usize;
    let frac = pos - idx as f64;

    if idx + 1 >= n_vals {
        return sorted[n_vals - 1];
    }
    sorted[idx] + frac * (sorted[idx + 1] - sorted[idx])
}

/// Compute the Fisher-Pearson adjusted skewness coefficient.
///
/// Returns NaN for fewer than three values or a degenerate (zero-variance)
/// distribution.
pub fn compute_skewness(vals: &[f64]) -> f64 {
    let n_vals = vals.len();
    if n_vals < 3 {
        return f64::NAN;
    }
    let n = n_vals as f64;
    let mean = compute_mean(vals);

    let m_2 = vals.iter().map(|&val| (val - mean).powi(2)).sum::<f64>() / n;
    let m_3 = vals.iter().map(|&val| (val - mean).powi(3)).sum::<f64>() / n;
    if m_2 == 0.0 {
        return f64::NAN;
    }

    let g_1 = m_3 / m_2.powf(1.5);
    (n * (n - 1.0)).sqrt() / (n - 2.0) * g_1
}
