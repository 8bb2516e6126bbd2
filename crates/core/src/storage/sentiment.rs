use crate::sentiment::{average_sentiment, SentimentLabel};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct NewsHeadline {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentimentStats {
    pub id: Uuid,
    pub avg_sentiment_score: f64,
    pub article_count: i32,
    pub computed_at: DateTime<Utc>,
}

/// Most recently computed average, if any run has been recorded.
pub async fn latest_avg_sentiment(pool: &sqlx::PgPool) -> anyhow::Result<Option<f64>> {
    let row: Option<(f64,)> = sqlx::query_as(
        "SELECT avg_sentiment_score FROM sentiment_stats ORDER BY computed_at DESC LIMIT 1",
    )
    .persistent(false)
    .fetch_optional(pool)
    .await
    .context("select sentiment_stats failed")?;
    Ok(row.map(|(v,)| v))
}

pub async fn recent_news(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<Vec<NewsHeadline>> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT title, url FROM news_articles ORDER BY scraped_at DESC LIMIT $1",
    )
    .persistent(false)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("select news_articles failed")?;

    Ok(rows
        .into_iter()
        .map(|(title, url)| NewsHeadline { title, url })
        .collect())
}

/// Derives `sentiment_score` from the textual `sentiment` label where the two disagree.
/// Unrecognized labels are left untouched.
pub async fn backfill_sentiment_scores(pool: &sqlx::PgPool, dry_run: bool) -> anyhow::Result<u64> {
    let rows = sqlx::query_as::<_, (Uuid, String, Option<f64>)>(
        "SELECT id, sentiment, sentiment_score FROM news_articles WHERE sentiment IS NOT NULL",
    )
    .persistent(false)
    .fetch_all(pool)
    .await
    .context("select labelled news_articles failed")?;

    let mut updates = Vec::new();
    for (id, label, current) in rows {
        match label.parse::<SentimentLabel>() {
            Ok(parsed) if current != Some(parsed.score()) => updates.push((id, parsed.score())),
            Ok(_) => {}
            Err(err) => tracing::debug!(%id, error = %err, "skipping article"),
        }
    }

    if dry_run || updates.is_empty() {
        return Ok(updates.len() as u64);
    }

    let mut tx = pool.begin().await.context("begin transaction failed")?;
    let mut updated: u64 = 0;
    for (id, score) in updates {
        let res = sqlx::query("UPDATE news_articles SET sentiment_score = $1 WHERE id = $2")
            .persistent(false)
            .bind(score)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("update news_articles.sentiment_score failed")?;
        updated += res.rows_affected();
    }
    tx.commit().await.context("commit transaction failed")?;
    Ok(updated)
}

/// Averages every scored article and records the result. `None` when no article is scored.
pub async fn record_sentiment_stats(
    pool: &sqlx::PgPool,
    dry_run: bool,
) -> anyhow::Result<Option<SentimentStats>> {
    let scores: Vec<f64> = sqlx::query_scalar(
        "SELECT sentiment_score FROM news_articles WHERE sentiment_score IS NOT NULL",
    )
    .persistent(false)
    .fetch_all(pool)
    .await
    .context("select news_articles scores failed")?;

    let Some(avg_sentiment_score) = average_sentiment(&scores) else {
        return Ok(None);
    };

    let stats = SentimentStats {
        id: Uuid::new_v4(),
        avg_sentiment_score,
        article_count: i32::try_from(scores.len()).context("article count overflows i32")?,
        computed_at: Utc::now(),
    };

    if dry_run {
        return Ok(Some(stats));
    }

    sqlx::query(
        "INSERT INTO sentiment_stats (id, avg_sentiment_score, article_count, computed_at) \
         VALUES ($1, $2, $3, $4)",
    )
    .persistent(false)
    .bind(stats.id)
    .bind(stats.avg_sentiment_score)
    .bind(stats.article_count)
    .bind(stats.computed_at)
    .execute(pool)
    .await
    .context("insert sentiment_stats failed")?;

    Ok(Some(stats))
}
