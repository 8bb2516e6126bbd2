use anyhow::Context;
use serde_json::json;
use stockpulse_core::domain::document::RawDocument;
use stockpulse_core::loader::Collection;
use stockpulse_core::storage::documents::upsert_documents;

pub const MAX_SEED_SIZE: usize = 5000;

/// Deterministic fixture documents for the `all_stocks` collection.
///
/// Alternates `performance`/`change` and numeric/string encodings so the loader's
/// coercion paths see realistic variety.
pub fn stub_documents(size: usize) -> anyhow::Result<Vec<RawDocument>> {
    anyhow::ensure!(
        (1..=MAX_SEED_SIZE).contains(&size),
        "seed size must be 1..={MAX_SEED_SIZE} (got {size})"
    );

    Ok((1..=size)
        .map(|i| {
            let symbol = format!("STB{i:04}");
            let price = 10.0 + ((i * 7) % 90) as f64 * 1.5;
            let change = (((i * 37) % 200) as f64 - 100.0) / 1000.0;
            let volume = ((size - i + 1) * 1_000) as u64;

            let body = if i % 2 == 0 {
                json!({
                    "name": format!("Stub Holdings {i:04}"),
                    "price": price,
                    "volume": volume,
                    "performance": change,
                    "market_cap": price * volume as f64,
                })
            } else {
                json!({
                    "name": format!("Stub Holdings {i:04}"),
                    "price": format!("{price:.2}"),
                    "volume": format!("{:.1}K", volume as f64 / 1_000.0),
                    "change": format!("{change:+.3}"),
                })
            };
            RawDocument::new(symbol, body)
        })
        .collect())
}

/// Documents with a positive daily change, for the `gainers` collection.
pub fn stub_gainers(docs: &[RawDocument]) -> Vec<RawDocument> {
    docs.iter()
        .filter(|doc| doc.normalize().is_ok_and(|r| r.performance > 0.0))
        .cloned()
        .collect()
}

/// Writes both collections. Returns `(all_stocks, gainers)` row counts.
pub async fn seed_documents(pool: &sqlx::PgPool, size: usize) -> anyhow::Result<(u64, u64)> {
    let docs = stub_documents(size)?;
    let gainers = stub_gainers(&docs);

    let all = upsert_documents(pool, Collection::AllStocks, &docs)
        .await
        .context("seed all_stocks failed")?;
    let gained = if gainers.is_empty() {
        0
    } else {
        upsert_documents(pool, Collection::Gainers, &gainers)
            .await
            .context("seed gainers failed")?
    };
    Ok((all, gained))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_size() {
        assert!(stub_documents(0).is_err());
        assert!(stub_documents(MAX_SEED_SIZE + 1).is_err());
    }

    #[test]
    fn every_document_normalizes() {
        let docs = stub_documents(40).unwrap();
        assert_eq!(docs.len(), 40);
        for doc in &docs {
            let record = doc.normalize().unwrap();
            assert!(record.price > 0.0);
            assert!(record.volume > 0);
        }
        assert_eq!(docs[0].normalize().unwrap().id, "STB0001");
    }

    #[test]
    fn seeding_is_deterministic() {
        assert_eq!(stub_documents(25).unwrap(), stub_documents(25).unwrap());
    }

    #[test]
    fn gainers_are_the_positive_movers() {
        let docs = stub_documents(60).unwrap();
        let gainers = stub_gainers(&docs);
        assert!(!gainers.is_empty());
        assert!(gainers.len() < docs.len());
        for doc in &gainers {
            assert!(doc.normalize().unwrap().performance > 0.0);
        }
    }
}
