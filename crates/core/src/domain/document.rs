use crate::domain::stock::{normalize_symbol, StockRecord};
use anyhow::{ensure, Context};
use serde_json::Value;

// Scrapers have written the same fields under different names over time.
const ID_KEYS: &[&str] = &["_id", "id", "symbol", "ticker"];
const PERFORMANCE_KEYS: &[&str] = &["performance", "change"];
const MARKET_CAP_KEYS: &[&str] = &["market_cap", "marketCap"];

/// A stored document as handed over by a [`crate::loader::RecordSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Key the store filed the document under, used when the body carries no id.
    pub symbol: Option<String>,
    pub body: Value,
}

impl RawDocument {
    pub fn new(symbol: impl Into<String>, body: Value) -> Self {
        Self {
            symbol: Some(symbol.into()),
            body,
        }
    }

    /// Coerces the document into the canonical record shape.
    pub fn normalize(&self) -> anyhow::Result<StockRecord> {
        let obj = self
            .body
            .as_object()
            .context("document is not a JSON object")?;

        let id = ID_KEYS
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .or(self.symbol.as_deref())
            .map(normalize_symbol)
            .filter(|s| !s.is_empty())
            .context("document has no ticker id")?;

        let price = obj
            .get("price")
            .and_then(coerce_f64)
            .with_context(|| format!("{id}: missing or non-numeric price"))?;
        ensure!(price >= 0.0, "{id}: negative price {price}");

        let volume = obj
            .get("volume")
            .and_then(coerce_f64)
            .with_context(|| format!("{id}: missing or non-numeric volume"))?;
        ensure!(volume >= 0.0, "{id}: negative volume {volume}");

        let performance = first_f64(obj, PERFORMANCE_KEYS)
            .with_context(|| format!("{id}: missing or non-numeric performance"))?;

        // Optional: an unusable market cap is dropped instead of rejecting the record.
        let market_cap = first_f64(obj, MARKET_CAP_KEYS).filter(|v| *v >= 0.0);

        Ok(StockRecord {
            id,
            price,
            volume: volume.round() as u64,
            market_cap,
            performance,
        })
    }
}

fn first_f64(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(coerce_f64))
}

/// Numbers pass through; strings such as `"1,234.5"`, `"+0.12"` or `"3.2B"` are parsed.
/// Anything that does not yield a finite value is `None`.
pub fn coerce_f64(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_numeric_str(s)?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn parse_numeric_str(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '+')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (digits, scale) = match cleaned.chars().last()? {
        'K' | 'k' => (&cleaned[..cleaned.len() - 1], 1e3),
        'M' | 'm' => (&cleaned[..cleaned.len() - 1], 1e6),
        'B' | 'b' => (&cleaned[..cleaned.len() - 1], 1e9),
        'T' | 't' => (&cleaned[..cleaned.len() - 1], 1e12),
        _ => (cleaned.as_str(), 1.0),
    };

    digits.trim().parse::<f64>().ok().map(|n| n * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_gainers_shape() {
        let doc = RawDocument::new(
            "nvda",
            json!({
                "_id": "nvda",
                "price": 120.5,
                "volume": 1_000_000,
                "change": 0.034,
                "percent_change": 3.4,
            }),
        );
        let record = doc.normalize().unwrap();
        assert_eq!(record.id, "NVDA");
        assert_eq!(record.price, 120.5);
        assert_eq!(record.volume, 1_000_000);
        assert_eq!(record.market_cap, None);
        assert_eq!(record.performance, 0.034);
    }

    #[test]
    fn coerces_string_fields() {
        let doc = RawDocument {
            symbol: None,
            body: json!({
                "symbol": "AAPL",
                "price": "1,234.50",
                "volume": "12.5M",
                "marketCap": "2.5T",
                "performance": "-0.02",
            }),
        };
        let record = doc.normalize().unwrap();
        assert_eq!(record.id, "AAPL");
        assert_eq!(record.price, 1234.5);
        assert_eq!(record.volume, 12_500_000);
        assert_eq!(record.market_cap, Some(2.5e12));
        assert_eq!(record.performance, -0.02);
    }

    #[test]
    fn falls_back_to_store_key_for_id() {
        let doc = RawDocument::new("MSFT", json!({"price": 400.0, "volume": 10, "performance": 0.01}));
        assert_eq!(doc.normalize().unwrap().id, "MSFT");
    }

    #[test]
    fn prefers_performance_over_change() {
        let doc = RawDocument::new(
            "AMD",
            json!({"price": 1.0, "volume": 1, "performance": 0.5, "change": 9.0}),
        );
        assert_eq!(doc.normalize().unwrap().performance, 0.5);
    }

    #[test]
    fn rejects_missing_required_fields() {
        let missing_perf = RawDocument::new("A", json!({"price": 1.0, "volume": 1}));
        assert!(missing_perf.normalize().is_err());

        let null_perf = RawDocument::new("A", json!({"price": 1.0, "volume": 1, "change": null}));
        assert!(null_perf.normalize().is_err());

        let bad_price = RawDocument::new("A", json!({"price": "n/a", "volume": 1, "change": 0.1}));
        assert!(bad_price.normalize().is_err());

        let negative = RawDocument::new("A", json!({"price": -1.0, "volume": 1, "change": 0.1}));
        assert!(negative.normalize().is_err());

        let no_id = RawDocument {
            symbol: None,
            body: json!({"price": 1.0, "volume": 1, "change": 0.1}),
        };
        assert!(no_id.normalize().is_err());
    }

    #[test]
    fn drops_unusable_market_cap() {
        let doc = RawDocument::new(
            "A",
            json!({"price": 1.0, "volume": 1, "change": 0.1, "market_cap": "unknown"}),
        );
        assert_eq!(doc.normalize().unwrap().market_cap, None);
    }

    #[test]
    fn coerce_rejects_non_finite_and_non_numeric() {
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!("inf")), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&json!("")), None);
        assert_eq!(coerce_f64(&json!("2.5k")), Some(2500.0));
    }
}
