use crate::analytics::error::AnalyticsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical per-symbol snapshot consumed by the analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: String,
    pub price: f64,
    pub volume: u64,
    pub market_cap: Option<f64>,
    /// Fractional return over the observed period (0.05 = +5%).
    pub performance: f64,
}

/// A [`StockRecord`] once a predicted return has been attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAsset {
    #[serde(flatten)]
    pub record: StockRecord,
    pub predicted_return: f64,
    pub alpha: f64,
    pub beta: f64,
}

/// Ticker -> quantity holdings supplied by the caller.
///
/// Tickers are trimmed and upper-cased on the way in so they line up with loaded record ids.
/// Repeated tickers accumulate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct Portfolio {
    holdings: BTreeMap<String, f64>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, quantity: f64) {
        let key = normalize_symbol(symbol);
        if key.is_empty() {
            return;
        }
        *self.holdings.entry(key).or_insert(0.0) += quantity;
    }

    pub fn quantity(&self, symbol: &str) -> Option<f64> {
        self.holdings.get(symbol).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.holdings.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.holdings.keys().map(String::as_str)
    }

    /// Rejects negative or non-finite quantities.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        for (symbol, quantity) in self.iter() {
            if !quantity.is_finite() || quantity < 0.0 {
                return Err(AnalyticsError::InvalidQuantity {
                    symbol: symbol.to_string(),
                    quantity,
                });
            }
        }
        Ok(())
    }
}

impl<S: AsRef<str>> FromIterator<(S, f64)> for Portfolio {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (symbol, quantity) in iter {
            out.insert(symbol.as_ref(), quantity);
        }
        out
    }
}

impl From<BTreeMap<String, f64>> for Portfolio {
    fn from(map: BTreeMap<String, f64>) -> Self {
        map.into_iter().collect()
    }
}

impl From<Portfolio> for BTreeMap<String, f64> {
    fn from(portfolio: Portfolio) -> Self {
        portfolio.holdings
    }
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}
