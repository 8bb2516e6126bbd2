pub mod memory;

use crate::analytics::error::AnalyticsError;
use crate::domain::document::RawDocument;
use crate::domain::stock::{normalize_symbol, StockRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Logical document collections in the backing store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    #[default]
    AllStocks,
    Gainers,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::AllStocks => "all_stocks",
            Collection::Gainers => "gainers",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub collection: Collection,
    /// Restrict to these tickers. `None` loads the whole collection.
    pub symbols: Option<Vec<String>>,
}

impl RecordFilter {
    pub fn collection(collection: Collection) -> Self {
        Self {
            collection,
            symbols: None,
        }
    }

    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.symbols = Some(
            symbols
                .into_iter()
                .map(|s| normalize_symbol(s.as_ref()))
                .collect(),
        );
        self
    }

    pub fn matches(&self, record: &StockRecord) -> bool {
        match &self.symbols {
            Some(symbols) => symbols.iter().any(|s| *s == record.id),
            None => true,
        }
    }
}

/// Backing store of per-symbol documents.
///
/// Implementations may return more documents than the filter selects; [`load_records`]
/// re-applies it after normalization.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_documents(&self, filter: &RecordFilter) -> anyhow::Result<Vec<RawDocument>>;
}

/// Fetches and normalizes records.
///
/// Documents that cannot be coerced are skipped with a warning, and only the first record per
/// ticker is kept. A store error or a fetch exceeding `timeout` becomes
/// [`AnalyticsError::DataSourceUnavailable`].
pub async fn load_records(
    source: &dyn RecordSource,
    filter: &RecordFilter,
    timeout: Duration,
) -> Result<Vec<StockRecord>, AnalyticsError> {
    let t0 = std::time::Instant::now();
    let documents = match tokio::time::timeout(timeout, source.fetch_documents(filter)).await {
        Ok(Ok(documents)) => documents,
        Ok(Err(err)) => {
            tracing::error!(source = source.source_name(), error = %err, "record fetch failed");
            return Err(AnalyticsError::DataSourceUnavailable(format!("{err:#}")));
        }
        Err(_) => {
            tracing::error!(source = source.source_name(), ?timeout, "record fetch timed out");
            return Err(AnalyticsError::DataSourceUnavailable(format!(
                "{} did not respond within {timeout:?}",
                source.source_name()
            )));
        }
    };

    let fetched = documents.len();
    let mut seen = HashSet::new();
    let mut skipped: usize = 0;
    let mut out = Vec::with_capacity(fetched);
    for doc in documents {
        let record = match doc.normalize() {
            Ok(record) => record,
            Err(err) => {
                skipped += 1;
                tracing::warn!(symbol = ?doc.symbol, error = %err, "skipping malformed document");
                continue;
            }
        };
        if !filter.matches(&record) {
            continue;
        }
        if !seen.insert(record.id.clone()) {
            tracing::warn!(symbol = %record.id, "duplicate ticker in source; keeping first");
            continue;
        }
        out.push(record);
    }

    tracing::debug!(
        source = source.source_name(),
        collection = filter.collection.as_str(),
        fetched,
        skipped,
        loaded = out.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "records loaded"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryRecordSource;
    use super::*;
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn fixture() -> InMemoryRecordSource {
        InMemoryRecordSource::new()
            .with_document(
                Collection::AllStocks,
                RawDocument::new("AAPL", json!({"price": 190.0, "volume": 10, "change": 0.02})),
            )
            .with_document(
                Collection::AllStocks,
                RawDocument::new("BROKEN", json!({"price": "??", "volume": 10, "change": 0.02})),
            )
            .with_document(
                Collection::AllStocks,
                RawDocument::new("TSLA", json!({"price": 250.0, "volume": 5, "performance": -0.01})),
            )
            .with_document(
                Collection::AllStocks,
                RawDocument::new("aapl", json!({"price": 1.0, "volume": 1, "change": 0.9})),
            )
            .with_document(
                Collection::Gainers,
                RawDocument::new("NVDA", json!({"price": 120.0, "volume": 7, "change": 0.08})),
            )
    }

    #[tokio::test]
    async fn skips_malformed_and_duplicate_documents() {
        let records = load_records(&fixture(), &RecordFilter::default(), TIMEOUT)
            .await
            .unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["AAPL", "TSLA"]);
        assert_eq!(records[0].price, 190.0);
    }

    #[tokio::test]
    async fn filters_by_collection_and_symbols() {
        let gainers = load_records(
            &fixture(),
            &RecordFilter::collection(Collection::Gainers),
            TIMEOUT,
        )
        .await
        .unwrap();
        assert_eq!(gainers.len(), 1);
        assert_eq!(gainers[0].id, "NVDA");

        let only_tsla = load_records(
            &fixture(),
            &RecordFilter::default().with_symbols(["tsla"]),
            TIMEOUT,
        )
        .await
        .unwrap();
        assert_eq!(only_tsla.len(), 1);
        assert_eq!(only_tsla[0].id, "TSLA");
    }

    #[tokio::test]
    async fn unreachable_source_is_unavailable() {
        let err = load_records(
            &InMemoryRecordSource::unavailable(),
            &RecordFilter::default(),
            TIMEOUT,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::DataSourceUnavailable(_)));
    }

    #[tokio::test]
    async fn slow_source_times_out_as_unavailable() {
        let source = fixture().with_delay(Duration::from_millis(200));
        let err = load_records(&source, &RecordFilter::default(), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::DataSourceUnavailable(_)));
    }
}
