use crate::domain::document::RawDocument;
use crate::domain::stock::normalize_symbol;
use crate::loader::{Collection, RecordFilter, RecordSource};
use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

const AUTOCOMPLETE_LIMIT: i64 = 5;

/// [`RecordSource`] over the `stock_documents` table.
#[derive(Debug, Clone)]
pub struct PgRecordSource {
    pool: sqlx::PgPool,
}

impl PgRecordSource {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecordSource for PgRecordSource {
    fn source_name(&self) -> &'static str {
        "postgres"
    }

    async fn fetch_documents(&self, filter: &RecordFilter) -> anyhow::Result<Vec<RawDocument>> {
        let rows = sqlx::query_as::<_, (String, Value)>(
            "SELECT symbol, document \
             FROM stock_documents \
             WHERE collection = $1 AND ($2::text[] IS NULL OR upper(symbol) = ANY($2)) \
             ORDER BY scraped_at ASC, symbol ASC",
        )
        .persistent(false)
        .bind(filter.collection.as_str())
        .bind(filter.symbols.clone())
        .fetch_all(&self.pool)
        .await
        .with_context(|| {
            format!(
                "select stock_documents failed (collection={})",
                filter.collection.as_str()
            )
        })?;

        Ok(rows
            .into_iter()
            .map(|(symbol, body)| RawDocument::new(symbol, body))
            .collect())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub document: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolMatch {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

/// Exact ticker match first, otherwise the first document whose name contains `query`.
pub async fn search_symbol(
    pool: &sqlx::PgPool,
    query: &str,
) -> anyhow::Result<Option<SymbolDocument>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(None);
    }

    let row = sqlx::query_as::<_, (String, Value)>(
        "SELECT symbol, document \
         FROM stock_documents \
         WHERE collection = $1 \
           AND (upper(symbol) = $2 OR document->>'name' ILIKE $3 ESCAPE '\\') \
         ORDER BY (upper(symbol) = $2) DESC, symbol ASC \
         LIMIT 1",
    )
    .persistent(false)
    .bind(Collection::AllStocks.as_str())
    .bind(normalize_symbol(query))
    .bind(format!("%{}%", escape_like(query)))
    .fetch_optional(pool)
    .await
    .context("search stock_documents failed")?;

    Ok(row.map(|(id, document)| SymbolDocument {
        id,
        document: strip_id(document),
    }))
}

/// Up to five tickers starting with `query`, or whose name contains it.
pub async fn autocomplete_symbols(
    pool: &sqlx::PgPool,
    query: &str,
) -> anyhow::Result<Vec<SymbolMatch>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let escaped = escape_like(query);

    let rows = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT symbol, document->>'name' \
         FROM stock_documents \
         WHERE collection = $1 \
           AND (symbol ILIKE $2 ESCAPE '\\' OR document->>'name' ILIKE $3 ESCAPE '\\') \
         ORDER BY symbol ASC \
         LIMIT $4",
    )
    .persistent(false)
    .bind(Collection::AllStocks.as_str())
    .bind(format!("{escaped}%"))
    .bind(format!("%{escaped}%"))
    .bind(AUTOCOMPLETE_LIMIT)
    .fetch_all(pool)
    .await
    .context("autocomplete stock_documents failed")?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| SymbolMatch {
            id,
            name: name.unwrap_or_default(),
        })
        .collect())
}

/// Inserts or replaces documents in one transaction. Every document must carry a symbol.
pub async fn upsert_documents(
    pool: &sqlx::PgPool,
    collection: Collection,
    docs: &[RawDocument],
) -> anyhow::Result<u64> {
    anyhow::ensure!(!docs.is_empty(), "docs must be non-empty");
    for doc in docs {
        anyhow::ensure!(
            doc.symbol.as_deref().is_some_and(|s| !s.trim().is_empty()),
            "document without symbol cannot be stored"
        );
    }

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let chunk_size: usize = std::env::var("STOCK_DOCUMENTS_UPSERT_BATCH")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(200);
    anyhow::ensure!(chunk_size >= 1, "STOCK_DOCUMENTS_UPSERT_BATCH must be >= 1");

    let mut affected: u64 = 0;
    for (batch_idx, chunk) in docs.chunks(chunk_size).enumerate() {
        let t0 = std::time::Instant::now();
        let mut qb = sqlx::QueryBuilder::new(
            "INSERT INTO stock_documents (collection, symbol, document, scraped_at) ",
        );
        qb.push_values(chunk, |mut b, doc| {
            b.push_bind(collection.as_str())
                .push_bind(normalize_symbol(doc.symbol.as_deref().unwrap_or_default()))
                .push_bind(doc.body.clone())
                .push_bind(chrono::Utc::now());
        });
        qb.push(
            " ON CONFLICT (collection, symbol) DO UPDATE \
               SET document = EXCLUDED.document, scraped_at = EXCLUDED.scraped_at",
        );

        let res = qb
            .build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .context("batch upsert stock_documents failed")?;
        affected += res.rows_affected();

        tracing::debug!(
            collection = collection.as_str(),
            batch_idx,
            batch_size = chunk.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "stock_documents batch upsert"
        );
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(affected)
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// The row key is authoritative; a stale `_id` inside the body would shadow it when flattened.
fn strip_id(mut document: Value) -> Value {
    if let Value::Object(obj) = &mut document {
        obj.remove("_id");
    }
    document
}
