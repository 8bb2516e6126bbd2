use crate::analytics::error::AnalyticsError;
use crate::domain::stock::{ScoredAsset, StockRecord};
use serde::{Deserialize, Serialize};

/// Trailing window for the rolling-volatility beta proxy.
pub const BETA_WINDOW: usize = 3;

pub const DEFAULT_ALPHA_MIN: f64 = 0.5;
pub const DEFAULT_BETA_MAX: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaBetaThresholds {
    pub alpha_min: f64,
    pub beta_max: f64,
}

impl Default for AlphaBetaThresholds {
    fn default() -> Self {
        Self {
            alpha_min: DEFAULT_ALPHA_MIN,
            beta_max: DEFAULT_BETA_MAX,
        }
    }
}

impl AlphaBetaThresholds {
    /// Both bounds are strict.
    pub fn admits(&self, asset: &ScoredAsset) -> bool {
        asset.alpha > self.alpha_min && asset.beta < self.beta_max
    }
}

/// Attaches predicted return, alpha and beta to each record.
///
/// `predicted_returns[i]` belongs to `records[i]`. Beta is a rolling statistic over the caller's
/// ordering, so reordering the input changes it.
pub fn score_alpha_beta(
    records: &[StockRecord],
    predicted_returns: &[f64],
) -> Result<Vec<ScoredAsset>, AnalyticsError> {
    if records.len() != predicted_returns.len() {
        return Err(AnalyticsError::AlignmentError {
            expected: records.len(),
            actual: predicted_returns.len(),
        });
    }

    let performances: Vec<f64> = records.iter().map(|r| r.performance).collect();
    let betas = rolling_std(&performances, BETA_WINDOW);

    Ok(records
        .iter()
        .zip(predicted_returns)
        .zip(betas)
        .map(|((record, &predicted_return), beta)| ScoredAsset {
            record: record.clone(),
            predicted_return,
            alpha: predicted_return - record.performance,
            beta,
        })
        .collect())
}

pub fn filter_top_assets(
    scored: &[ScoredAsset],
    thresholds: AlphaBetaThresholds,
) -> Vec<ScoredAsset> {
    scored
        .iter()
        .filter(|a| thresholds.admits(a))
        .cloned()
        .collect()
}

/// Sample standard deviation over a trailing window of up to `window` points.
///
/// A window holding a single point has no spread and yields 0.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            sample_std(&values[start..=i])
        })
        .collect()
}

fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let ss: f64 = xs.iter().map(|x| (x - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}
