use crate::analytics::alpha_beta::{score_alpha_beta, AlphaBetaThresholds};
use crate::analytics::classifier::{classify_sharpe, SharpeLabel};
use crate::analytics::error::AnalyticsError;
use crate::analytics::predict::Predictor;
use crate::analytics::round_to;
use crate::analytics::sharpe::compute_sharpe_from_predicted;
use crate::domain::stock::{ScoredAsset, StockRecord};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetReport {
    #[serde(flatten)]
    pub asset: ScoredAsset,
    pub predicted_price: f64,
    pub sharpe_ratio: f64,
    pub label: SharpeLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlphaBetaReport {
    pub predictor: &'static str,
    pub sentiment_score: f64,
    /// Records dropped because a zero price leaves no return to compute.
    pub skipped: Vec<String>,
    pub scored: Vec<AssetReport>,
    pub top: Vec<AssetReport>,
}

impl AssetReport {
    fn rounded(mut self, decimals: u32) -> Self {
        self.asset.predicted_return = round_to(self.asset.predicted_return, decimals);
        self.asset.alpha = round_to(self.asset.alpha, decimals);
        self.asset.beta = round_to(self.asset.beta, decimals);
        self.sharpe_ratio = round_to(self.sharpe_ratio, decimals);
        self
    }
}

impl AlphaBetaReport {
    /// Presentation copy with every derived figure rounded. Labels and the top subset are
    /// already decided on full precision and are left as they are.
    pub fn rounded(self, decimals: u32) -> Self {
        Self {
            scored: self.scored.into_iter().map(|r| r.rounded(decimals)).collect(),
            top: self.top.into_iter().map(|r| r.rounded(decimals)).collect(),
            ..self
        }
    }
}

/// Predict, score alpha/beta, attach a per-asset Sharpe label, then keep the assets passing
/// `thresholds`.
///
/// The predictor yields a price level. Alpha is taken on the implied return
/// (`predicted / price - 1`) so it is in the same units as `performance`.
pub fn run_alpha_beta_pipeline(
    records: &[StockRecord],
    predictor: &dyn Predictor,
    sentiment_score: f64,
    risk_free_rate: f64,
    thresholds: AlphaBetaThresholds,
) -> Result<AlphaBetaReport, AnalyticsError> {
    let (priced, unpriced): (Vec<StockRecord>, Vec<StockRecord>) =
        records.iter().cloned().partition(|r| r.price > 0.0);
    let skipped: Vec<String> = unpriced.into_iter().map(|r| r.id).collect();
    if !skipped.is_empty() {
        tracing::debug!(count = skipped.len(), "skipping zero-priced records");
    }

    let predicted_prices: Vec<f64> = priced
        .iter()
        .map(|r| predictor.predict(r, sentiment_score))
        .collect();
    let predicted_returns: Vec<f64> = priced
        .iter()
        .zip(&predicted_prices)
        .map(|(r, p)| p / r.price - 1.0)
        .collect();

    let scored = score_alpha_beta(&priced, &predicted_returns)?;

    let prices: Vec<f64> = priced.iter().map(|r| r.price).collect();
    let performances: Vec<f64> = priced.iter().map(|r| r.performance).collect();
    let sharpe = compute_sharpe_from_predicted(
        &predicted_prices,
        &prices,
        &performances,
        risk_free_rate,
    )?;

    let mut reports = Vec::with_capacity(scored.len());
    for ((asset, predicted_price), sharpe_ratio) in
        scored.into_iter().zip(predicted_prices).zip(sharpe)
    {
        reports.push(AssetReport {
            label: classify_sharpe(sharpe_ratio)?,
            asset,
            predicted_price,
            sharpe_ratio,
        });
    }

    let top: Vec<AssetReport> = reports
        .iter()
        .filter(|r| thresholds.admits(&r.asset))
        .cloned()
        .collect();

    tracing::info!(
        predictor = predictor.name(),
        scored = reports.len(),
        top = top.len(),
        "alpha/beta pipeline complete"
    );

    Ok(AlphaBetaReport {
        predictor: predictor.name(),
        sentiment_score,
        skipped,
        scored: reports,
        top,
    })
}
