use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use stockpulse_core::analytics::alpha_beta::AlphaBetaThresholds;
use stockpulse_core::analytics::classifier::{classify_sharpe, SharpeLabel};
use stockpulse_core::analytics::error::AnalyticsError;
use stockpulse_core::analytics::pipeline::{run_alpha_beta_pipeline, AlphaBetaReport};
use stockpulse_core::analytics::portfolio::portfolio_metrics;
use stockpulse_core::analytics::predict::{predict_performance, SentimentStubPredictor};
use stockpulse_core::analytics::ranking::top_performers;
use stockpulse_core::analytics::round_to;
use stockpulse_core::analytics::sharpe::SharpeParams;
use stockpulse_core::domain::stock::Portfolio;
use stockpulse_core::llm::prompt::AdviceRequest;
use stockpulse_core::llm::AdviceGenerator;
use stockpulse_core::loader::{load_records, Collection, RecordFilter, RecordSource};
use stockpulse_core::storage;

const ADVICE_UNAVAILABLE: &str =
    "Advice is temporarily unavailable. Please try again in a few minutes.";
const ADVICE_NOT_CONFIGURED: &str = "Advice service is not configured.";
const DEFAULT_ASK_PRICE: f64 = 100.0;
const MAX_PAGE_SIZE: usize = 100;
const RECENT_NEWS_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct AppState {
    pub records: Option<Arc<dyn RecordSource>>,
    pub pool: Option<PgPool>,
    pub advisor: Option<Arc<dyn AdviceGenerator>>,
    pub record_timeout: Duration,
    pub advice_timeout: Duration,
    pub sharpe: SharpeParams,
}

impl AppState {
    fn records(&self) -> Result<&dyn RecordSource, ApiError> {
        self.records
            .as_deref()
            .ok_or_else(|| ApiError::unavailable("record store is not configured"))
    }

    fn pool(&self) -> Result<&PgPool, ApiError> {
        self.pool
            .as_ref()
            .ok_or_else(|| ApiError::unavailable("database is not configured"))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/portfolio-metrics", post(get_portfolio_metrics))
        .route("/ask-llm", post(ask_llm))
        .route("/top-gainers", get(top_gainers))
        .route("/search-symbol", post(search_symbol))
        .route("/autocomplete-symbols", post(autocomplete_symbols))
        .route("/analyze-sentiment", get(analyze_sentiment))
        .route("/alpha-beta", get(alpha_beta))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }

    fn internal(err: anyhow::Error) -> Self {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        let status = match &err {
            AnalyticsError::DataSourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AnalyticsError::EmptyPortfolio
            | AnalyticsError::DivisionByZero(_)
            | AnalyticsError::InvalidRatio(_)
            | AnalyticsError::InvalidQuantity { .. }
            | AnalyticsError::NonFinite(_) => StatusCode::BAD_REQUEST,
            AnalyticsError::AlignmentError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "analytics request failed");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "status": "error",
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct PortfolioMetricsRequest {
    #[serde(default)]
    pub portfolio: Portfolio,
}

#[derive(Debug, Serialize)]
pub struct PortfolioMetricsResponse {
    status: &'static str,
    average_performance: f64,
    sharpe_ratio: f64,
    label: SharpeLabel,
    label_description: &'static str,
    volatility_used: f64,
    risk_free_rate: f64,
    matched_symbols: Vec<String>,
    missing_symbols: Vec<String>,
}

async fn get_portfolio_metrics(
    State(state): State<AppState>,
    Json(req): Json<PortfolioMetricsRequest>,
) -> Result<Json<PortfolioMetricsResponse>, ApiError> {
    if req.portfolio.is_empty() {
        return Err(ApiError::bad_request("Empty portfolio"));
    }

    let filter = RecordFilter::default().with_symbols(req.portfolio.symbols());
    let records = load_records(state.records()?, &filter, state.record_timeout).await?;
    let metrics = portfolio_metrics(&req.portfolio, &records, state.sharpe)?;

    Ok(Json(PortfolioMetricsResponse {
        status: "success",
        average_performance: round_to(metrics.average_performance, 4),
        sharpe_ratio: round_to(metrics.sharpe_ratio, 4),
        label: metrics.label,
        label_description: metrics.label.description(),
        volatility_used: metrics.volatility_used,
        risk_free_rate: metrics.risk_free_rate,
        matched_symbols: metrics.matched_symbols,
        missing_symbols: metrics.missing_symbols,
    }))
}

fn default_ask_price() -> f64 {
    DEFAULT_ASK_PRICE
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(flatten)]
    pub advice: AdviceRequest,
    #[serde(default = "default_ask_price")]
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    status: &'static str,
    answer: String,
    prediction: f64,
    sharpe: f64,
    classification: SharpeLabel,
    classification_description: &'static str,
}

async fn ask_llm(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let prompt = req
        .advice
        .build_prompt()
        .map_err(|_| ApiError::bad_request("No question provided"))?;
    if !req.price.is_finite() || req.price <= 0.0 {
        return Err(ApiError::bad_request("price must be a positive number"));
    }

    let sentiment = req.advice.sentiment_score.unwrap_or(0.0);
    let prediction = predict_performance(req.price, sentiment);
    let sharpe = state
        .sharpe
        .excess_return_ratio(prediction / req.price - 1.0)?;
    let classification = classify_sharpe(sharpe)?;

    let answer = generate_with_fallback(&state, &prompt).await;

    Ok(Json(AskResponse {
        status: "success",
        answer,
        prediction,
        sharpe: round_to(sharpe, 4),
        classification,
        classification_description: classification.description(),
    }))
}

async fn generate_with_fallback(state: &AppState, prompt: &str) -> String {
    let Some(advisor) = &state.advisor else {
        return ADVICE_NOT_CONFIGURED.to_string();
    };

    match tokio::time::timeout(state.advice_timeout, advisor.generate_advice(prompt)).await {
        Ok(Ok(answer)) => answer,
        Ok(Err(err)) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::warn!(provider = advisor.provider().as_str(), error = %err, "advice generation failed");
            ADVICE_UNAVAILABLE.to_string()
        }
        Err(_) => {
            tracing::warn!(
                provider = advisor.provider().as_str(),
                timeout = ?state.advice_timeout,
                "advice generation timed out"
            );
            ADVICE_UNAVAILABLE.to_string()
        }
    }
}

fn default_limit() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct GainerRow {
    #[serde(rename = "_id")]
    id: String,
    price: f64,
    change: f64,
}

async fn top_gainers(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<GainerRow>>, ApiError> {
    let filter = RecordFilter::collection(Collection::Gainers);
    let records = load_records(state.records()?, &filter, state.record_timeout).await?;

    let rows = top_performers(&records, page.offset, page.limit.min(MAX_PAGE_SIZE))
        .into_iter()
        .map(|r| GainerRow {
            id: r.id,
            price: r.price,
            change: r.performance,
        })
        .collect();
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    #[serde(default)]
    pub query: String,
}

async fn search_symbol(
    State(state): State<AppState>,
    Json(req): Json<SymbolQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("Empty search input"));
    }

    let found = storage::documents::search_symbol(state.pool()?, query)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(match found {
        Some(doc) => serde_json::json!({"status": "found", "data": [doc]}),
        None => serde_json::json!({
            "status": "not_found",
            "message": format!("No stock found for '{query}'"),
        }),
    }))
}

async fn autocomplete_symbols(
    State(state): State<AppState>,
    Json(req): Json<SymbolQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("Empty search input"));
    }

    let matches = storage::documents::autocomplete_symbols(state.pool()?, query)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(serde_json::json!({"status": "success", "matches": matches})))
}

async fn analyze_sentiment(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool()?;
    let news = storage::sentiment::recent_news(pool, RECENT_NEWS_LIMIT)
        .await
        .map_err(ApiError::internal)?;
    let avg_score = storage::sentiment::latest_avg_sentiment(pool)
        .await
        .map_err(ApiError::internal)?
        .unwrap_or(0.0);

    Ok(Json(serde_json::json!({"news": news, "avg_score": avg_score})))
}

#[derive(Debug, Default, Deserialize)]
pub struct ThresholdQuery {
    pub alpha_min: Option<f64>,
    pub beta_max: Option<f64>,
}

async fn alpha_beta(
    State(state): State<AppState>,
    Query(q): Query<ThresholdQuery>,
) -> Result<Json<AlphaBetaReport>, ApiError> {
    let defaults = AlphaBetaThresholds::default();
    let thresholds = AlphaBetaThresholds {
        alpha_min: q.alpha_min.unwrap_or(defaults.alpha_min),
        beta_max: q.beta_max.unwrap_or(defaults.beta_max),
    };

    let records = load_records(state.records()?, &RecordFilter::default(), state.record_timeout)
        .await?;
    let sentiment = current_sentiment(&state).await;

    let report = run_alpha_beta_pipeline(
        &records,
        &SentimentStubPredictor,
        sentiment,
        state.sharpe.risk_free_rate,
        thresholds,
    )?;
    Ok(Json(report.rounded(4)))
}

// Sentiment only tilts the forecast, so a missing or unreadable value degrades to neutral.
async fn current_sentiment(state: &AppState) -> f64 {
    let Some(pool) = &state.pool else {
        return 0.0;
    };
    match storage::sentiment::latest_avg_sentiment(pool).await {
        Ok(Some(score)) => score,
        Ok(None) => {
            tracing::warn!("no average sentiment recorded; using 0.0");
            0.0
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to read average sentiment; using 0.0");
            0.0
        }
    }
}
