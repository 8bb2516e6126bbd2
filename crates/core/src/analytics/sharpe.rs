use crate::analytics::error::AnalyticsError;
use crate::domain::stock::{Portfolio, StockRecord};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;
pub const DEFAULT_VOLATILITY: f64 = 0.2;

/// Added to `|performance|` when it stands in for volatility, so a flat asset never divides by 0.
pub const VOLATILITY_EPSILON: f64 = 1e-6;

/// Named inputs for the portfolio-level Sharpe ratio.
///
/// `volatility` is the fixed risk denominator for a portfolio. It is unrelated to the rolling
/// `beta` computed by [`crate::analytics::alpha_beta`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharpeParams {
    pub risk_free_rate: f64,
    pub volatility: f64,
}

impl Default for SharpeParams {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            volatility: DEFAULT_VOLATILITY,
        }
    }
}

impl SharpeParams {
    /// `(ret - risk_free_rate) / volatility`. Never yields NaN or an infinity.
    pub fn excess_return_ratio(&self, ret: f64) -> Result<f64, AnalyticsError> {
        if self.volatility == 0.0 || !self.volatility.is_finite() {
            return Err(AnalyticsError::DivisionByZero("volatility"));
        }
        finite("sharpe ratio", (ret - self.risk_free_rate) / self.volatility)
    }
}

/// Quantity-weighted mean performance of the records held in `portfolio`.
///
/// Records whose id is not in the portfolio are ignored.
pub fn weighted_performance(
    portfolio: &Portfolio,
    records: &[StockRecord],
) -> Result<f64, AnalyticsError> {
    portfolio.validate()?;
    if portfolio.is_empty() {
        return Err(AnalyticsError::EmptyPortfolio);
    }

    let mut matched = 0usize;
    let mut weighted_sum = 0.0;
    let mut total_quantity = 0.0;
    for record in records {
        let Some(quantity) = portfolio.quantity(&record.id) else {
            continue;
        };
        matched += 1;
        weighted_sum += record.performance * quantity;
        total_quantity += quantity;
    }

    if matched == 0 {
        return Err(AnalyticsError::EmptyPortfolio);
    }
    if total_quantity == 0.0 {
        return Err(AnalyticsError::DivisionByZero("total portfolio quantity"));
    }
    finite("total portfolio quantity", total_quantity)?;
    finite("weighted performance sum", weighted_sum)?;

    finite("weighted performance", weighted_sum / total_quantity)
}

pub fn compute_sharpe_from_weights(
    portfolio: &Portfolio,
    records: &[StockRecord],
    params: SharpeParams,
) -> Result<f64, AnalyticsError> {
    let weighted = weighted_performance(portfolio, records)?;
    params.excess_return_ratio(weighted)
}

/// Per-asset Sharpe ratio from predicted price levels.
///
/// All three slices are aligned by position. Each asset's own `|performance|` (plus
/// [`VOLATILITY_EPSILON`]) stands in for its volatility.
pub fn compute_sharpe_from_predicted(
    predicted: &[f64],
    prices: &[f64],
    performances: &[f64],
    risk_free_rate: f64,
) -> Result<Vec<f64>, AnalyticsError> {
    for other in [prices.len(), performances.len()] {
        if other != predicted.len() {
            return Err(AnalyticsError::AlignmentError {
                expected: predicted.len(),
                actual: other,
            });
        }
    }

    predicted
        .iter()
        .zip(prices)
        .zip(performances)
        .map(|((&predicted, &price), &performance)| {
            finite("predicted price", predicted)?;
            finite("price", price)?;
            finite("performance", performance)?;
            if price == 0.0 {
                return Err(AnalyticsError::DivisionByZero("price"));
            }
            let ret = predicted / price - 1.0;
            let volatility = performance.abs() + VOLATILITY_EPSILON;
            finite("sharpe ratio", (ret - risk_free_rate) / volatility)
        })
        .collect()
}

fn finite(what: &'static str, value: f64) -> Result<f64, AnalyticsError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalyticsError::NonFinite(what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::round_to;

    fn record(id: &str, performance: f64) -> StockRecord {
        StockRecord {
            id: id.to_string(),
            price: 100.0,
            volume: 1_000,
            market_cap: None,
            performance,
        }
    }

    fn portfolio(entries: &[(&str, f64)]) -> Portfolio {
        entries.iter().map(|(s, q)| (*s, *q)).collect()
    }

    #[test]
    fn single_holding_matches_closed_form() {
        let ratio = compute_sharpe_from_weights(
            &portfolio(&[("AAPL", 10.0)]),
            &[record("AAPL", 0.1)],
            SharpeParams {
                risk_free_rate: 0.02,
                volatility: 0.2,
            },
        )
        .unwrap();
        assert!((ratio - 0.4).abs() < 1e-12);
        assert_eq!(round_to(ratio, 4), 0.4);
    }

    #[test]
    fn weights_by_quantity_and_ignores_unheld_records() {
        let records = [record("AAPL", 0.10), record("TSLA", -0.05), record("NVDA", 0.5)];
        let weighted =
            weighted_performance(&portfolio(&[("AAPL", 3.0), ("TSLA", 1.0)]), &records).unwrap();
        // (0.10 * 3 - 0.05 * 1) / 4
        assert!((weighted - 0.0625).abs() < 1e-12);
    }

    #[test]
    fn zero_quantity_contributes_no_weight() {
        let records = [record("AAPL", 0.10), record("TSLA", -0.90)];
        let weighted =
            weighted_performance(&portfolio(&[("AAPL", 2.0), ("TSLA", 0.0)]), &records).unwrap();
        assert!((weighted - 0.10).abs() < 1e-12);
    }

    #[test]
    fn empty_portfolio_is_rejected() {
        let err = compute_sharpe_from_weights(
            &Portfolio::new(),
            &[record("AAPL", 0.1)],
            SharpeParams::default(),
        )
        .unwrap_err();
        assert_eq!(err, AnalyticsError::EmptyPortfolio);
    }

    #[test]
    fn unmatched_portfolio_is_rejected() {
        let err = compute_sharpe_from_weights(
            &portfolio(&[("MSFT", 1.0)]),
            &[record("AAPL", 0.1)],
            SharpeParams::default(),
        )
        .unwrap_err();
        assert_eq!(err, AnalyticsError::EmptyPortfolio);
    }

    #[test]
    fn all_zero_quantities_is_division_by_zero() {
        let err = compute_sharpe_from_weights(
            &portfolio(&[("AAPL", 0.0)]),
            &[record("AAPL", 0.1)],
            SharpeParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::DivisionByZero(_)));
    }

    #[test]
    fn overflowing_quantities_are_rejected() {
        let err = compute_sharpe_from_weights(
            &portfolio(&[("AAPL", 1e308)]),
            &[record("AAPL", 10.0)],
            SharpeParams::default(),
        )
        .unwrap_err();
        assert_eq!(err, AnalyticsError::NonFinite("weighted performance sum"));

        let err = compute_sharpe_from_weights(
            &portfolio(&[("AAPL", 1e308), ("TSLA", 1e308)]),
            &[record("AAPL", 10.0), record("TSLA", 10.0)],
            SharpeParams::default(),
        )
        .unwrap_err();
        assert_eq!(err, AnalyticsError::NonFinite("total portfolio quantity"));
    }

    #[test]
    fn tiny_volatility_overflow_is_rejected() {
        let params = SharpeParams {
            risk_free_rate: 0.0,
            volatility: 1e-308,
        };
        assert_eq!(
            params.excess_return_ratio(1e10),
            Err(AnalyticsError::NonFinite("sharpe ratio"))
        );
    }

    #[test]
    fn zero_volatility_is_division_by_zero() {
        let params = SharpeParams {
            risk_free_rate: 0.02,
            volatility: 0.0,
        };
        assert_eq!(
            params.excess_return_ratio(0.1),
            Err(AnalyticsError::DivisionByZero("volatility"))
        );
    }

    #[test]
    fn predicted_sharpe_is_elementwise() {
        let out = compute_sharpe_from_predicted(
            &[110.0, 95.0, 100.0],
            &[100.0, 100.0, 50.0],
            &[0.5, -0.25, 0.0],
            0.02,
        )
        .unwrap();
        assert_eq!(out.len(), 3);
        assert!((out[0] - (0.1 - 0.02) / (0.5 + VOLATILITY_EPSILON)).abs() < 1e-9);
        assert!((out[1] - (-0.05 - 0.02) / (0.25 + VOLATILITY_EPSILON)).abs() < 1e-9);
        // Flat performance falls back to epsilon volatility instead of dividing by zero.
        assert!((out[2] - (1.0 - 0.02) / VOLATILITY_EPSILON).abs() < 1e-3);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn predicted_sharpe_requires_aligned_inputs() {
        let err = compute_sharpe_from_predicted(&[1.0, 2.0], &[1.0], &[0.1, 0.2], 0.02).unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::AlignmentError {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn predicted_sharpe_rejects_zero_price() {
        let err = compute_sharpe_from_predicted(&[1.0], &[0.0], &[0.1], 0.02).unwrap_err();
        assert_eq!(err, AnalyticsError::DivisionByZero("price"));
    }

    #[test]
    fn predicted_sharpe_rejects_non_finite_inputs() {
        assert_eq!(
            compute_sharpe_from_predicted(&[f64::NAN], &[100.0], &[0.1], 0.02),
            Err(AnalyticsError::NonFinite("predicted price"))
        );
        assert_eq!(
            compute_sharpe_from_predicted(&[101.0], &[f64::INFINITY], &[0.1], 0.02),
            Err(AnalyticsError::NonFinite("price"))
        );
        assert_eq!(
            compute_sharpe_from_predicted(&[101.0], &[100.0], &[f64::NAN], 0.02),
            Err(AnalyticsError::NonFinite("performance"))
        );
    }

    #[test]
    fn repeated_predicted_calls_are_bit_identical() {
        let run = || {
            compute_sharpe_from_predicted(
                &[101.37, 48.2, 7.0],
                &[99.99, 50.0, 7.0],
                &[0.033, -0.117, 0.0],
                0.02,
            )
            .unwrap()
        };
        let a: Vec<u64> = run().iter().map(|v| v.to_bits()).collect();
        let b: Vec<u64> = run().iter().map(|v| v.to_bits()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let p = portfolio(&[("AAPL", 1.5), ("TSLA", 2.25)]);
        let records = [record("AAPL", 0.031), record("TSLA", -0.017)];
        let a = compute_sharpe_from_weights(&p, &records, SharpeParams::default()).unwrap();
        let b = compute_sharpe_from_weights(&p, &records, SharpeParams::default()).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
