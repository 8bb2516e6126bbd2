use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockpulse_core::analytics::alpha_beta::AlphaBetaThresholds;
use stockpulse_core::analytics::pipeline::run_alpha_beta_pipeline;
use stockpulse_core::analytics::predict::SentimentStubPredictor;
use stockpulse_core::config::Settings;
use stockpulse_core::loader::{load_records, RecordFilter};
use stockpulse_core::storage;
use stockpulse_core::storage::documents::PgRecordSource;

mod seed;

#[derive(Debug, Parser)]
#[command(name = "stockpulse_worker")]
struct Args {
    /// Do everything except writing to the database.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load deterministic fixture documents into `all_stocks` and `gainers`.
    Seed {
        #[arg(long, default_value_t = 50)]
        size: usize,
    },
    /// Run the alpha/beta pipeline over `all_stocks` and print the report as JSON.
    AlphaBeta {
        #[arg(long)]
        alpha_min: Option<f64>,
        #[arg(long)]
        beta_max: Option<f64>,
    },
    /// Derive numeric sentiment scores from article labels.
    SentimentBackfill,
    /// Record the current average sentiment score.
    SentimentStats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(&settings, args).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "worker run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(settings: &Settings, args: Args) -> anyhow::Result<()> {
    if let Command::Seed { size } = args.command {
        if args.dry_run {
            let docs = seed::stub_documents(size)?;
            let gainers = seed::stub_gainers(&docs);
            tracing::info!(
                dry_run = true,
                all_stocks = docs.len(),
                gainers = gainers.len(),
                "seed (dry-run)"
            );
            return Ok(());
        }
    }

    let pool = connect(settings).await?;

    match args.command {
        Command::Seed { size } => {
            let (all_stocks, gainers) = seed::seed_documents(&pool, size).await?;
            tracing::info!(all_stocks, gainers, "seeded stock documents");
        }
        Command::AlphaBeta {
            alpha_min,
            beta_max,
        } => {
            let defaults = AlphaBetaThresholds::default();
            let thresholds = AlphaBetaThresholds {
                alpha_min: alpha_min.unwrap_or(defaults.alpha_min),
                beta_max: beta_max.unwrap_or(defaults.beta_max),
            };

            let source = PgRecordSource::new(pool.clone());
            let records = load_records(
                &source,
                &RecordFilter::default(),
                settings.record_load_timeout,
            )
            .await?;
            let sentiment = match storage::sentiment::latest_avg_sentiment(&pool).await? {
                Some(score) => score,
                None => {
                    tracing::warn!("no average sentiment recorded; using 0.0");
                    0.0
                }
            };

            let report = run_alpha_beta_pipeline(
                &records,
                &SentimentStubPredictor,
                sentiment,
                settings.sharpe.risk_free_rate,
                thresholds,
            )?;
            println!("{}", serde_json::to_string_pretty(&report.rounded(4))?);
        }
        Command::SentimentBackfill => {
            let updated = storage::sentiment::backfill_sentiment_scores(&pool, args.dry_run).await?;
            tracing::info!(updated, dry_run = args.dry_run, "sentiment scores backfilled");
        }
        Command::SentimentStats => {
            match storage::sentiment::record_sentiment_stats(&pool, args.dry_run).await? {
                Some(stats) => tracing::info!(
                    avg_sentiment_score = stats.avg_sentiment_score,
                    article_count = stats.article_count,
                    dry_run = args.dry_run,
                    "sentiment stats recorded"
                ),
                None => tracing::warn!("no scored articles; sentiment stats not recorded"),
            }
        }
    }

    Ok(())
}

async fn connect(settings: &Settings) -> anyhow::Result<sqlx::PgPool> {
    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    storage::migrate(&pool).await?;
    Ok(pool)
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands_and_global_dry_run() {
        let args = Args::try_parse_from(["stockpulse_worker", "seed", "--size", "10", "--dry-run"])
            .unwrap();
        assert!(args.dry_run);
        assert!(matches!(args.command, Command::Seed { size: 10 }));

        let args = Args::try_parse_from(["stockpulse_worker", "alpha-beta", "--beta-max", "1.5"])
            .unwrap();
        assert!(!args.dry_run);
        assert!(matches!(
            args.command,
            Command::AlphaBeta {
                alpha_min: None,
                beta_max: Some(b),
            } if b == 1.5
        ));

        assert!(Args::try_parse_from(["stockpulse_worker", "sentiment-stats"]).is_ok());
    }
}
