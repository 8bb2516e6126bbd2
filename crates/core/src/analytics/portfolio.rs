use crate::analytics::classifier::{classify_sharpe, SharpeLabel};
use crate::analytics::error::AnalyticsError;
use crate::analytics::sharpe::{weighted_performance, SharpeParams};
use crate::domain::stock::{Portfolio, StockRecord};
use serde::Serialize;

/// Portfolio summary served by the metrics route. Values are unrounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub average_performance: f64,
    pub sharpe_ratio: f64,
    pub label: SharpeLabel,
    pub volatility_used: f64,
    pub risk_free_rate: f64,
    pub matched_symbols: Vec<String>,
    pub missing_symbols: Vec<String>,
}

pub fn portfolio_metrics(
    portfolio: &Portfolio,
    records: &[StockRecord],
    params: SharpeParams,
) -> Result<PortfolioMetrics, AnalyticsError> {
    let average_performance = weighted_performance(portfolio, records)?;
    let sharpe_ratio = params.excess_return_ratio(average_performance)?;
    let label = classify_sharpe(sharpe_ratio)?;

    let (matched_symbols, missing_symbols): (Vec<String>, Vec<String>) = portfolio
        .symbols()
        .map(str::to_string)
        .partition(|s| records.iter().any(|r| &r.id == s));

    Ok(PortfolioMetrics {
        average_performance,
        sharpe_ratio,
        label,
        volatility_used: params.volatility,
        risk_free_rate: params.risk_free_rate,
        matched_symbols,
        missing_symbols,
    })
}
