pub mod analytics;
pub mod domain;
pub mod llm;
pub mod loader;
pub mod sentiment;
pub mod storage;

pub mod config {
    use crate::analytics::sharpe::SharpeParams;
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_RECORD_LOAD_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_ADVICE_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub record_load_timeout: Duration,
        pub advice_timeout: Duration,
        pub sharpe: SharpeParams,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = SharpeParams::default();
            let risk_free_rate = parse_env::<f64>("RISK_FREE_RATE")?
                .unwrap_or(defaults.risk_free_rate);
            let volatility =
                parse_env::<f64>("SHARPE_VOLATILITY")?.unwrap_or(defaults.volatility);
            anyhow::ensure!(
                volatility.is_finite() && volatility > 0.0,
                "SHARPE_VOLATILITY must be a positive number (got {volatility})"
            );

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                record_load_timeout: Duration::from_secs(
                    parse_env::<u64>("RECORD_LOAD_TIMEOUT_SECS")?
                        .unwrap_or(DEFAULT_RECORD_LOAD_TIMEOUT_SECS),
                ),
                advice_timeout: Duration::from_secs(
                    parse_env::<u64>("ADVICE_TIMEOUT_SECS")?.unwrap_or(DEFAULT_ADVICE_TIMEOUT_SECS),
                ),
                sharpe: SharpeParams {
                    risk_free_rate,
                    volatility,
                },
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }
    }

    // Unset or blank variables fall back to defaults; a present but unparsable value is an error.
    fn parse_env<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match std::env::var(key) {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .with_context(|| format!("{key} is not valid: {raw}")),
            _ => Ok(None),
        }
    }
}
