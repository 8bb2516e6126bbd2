use crate::analytics::round_to;
use crate::domain::stock::StockRecord;

/// Fractional price move per unit of sentiment score.
pub const SENTIMENT_SENSITIVITY: f64 = 0.01;

/// Placeholder forecast: `price * (1 + 0.01 * sentiment_score)`, rounded to 2 places.
///
/// `price` is expected finite and non-negative. Sentiment outside `[-1, 1]` is extrapolated
/// linearly rather than rejected.
pub fn predict_performance(price: f64, sentiment_score: f64) -> f64 {
    round_to(price * (1.0 + SENTIMENT_SENSITIVITY * sentiment_score), 2)
}

/// Produces a predicted price level for a record.
pub trait Predictor: Send + Sync {
    fn name(&self) -> &'static str;

    fn predict(&self, record: &StockRecord, sentiment_score: f64) -> f64;
}

/// [`Predictor`] backed by [`predict_performance`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentStubPredictor;

impl Predictor for SentimentStubPredictor {
    fn name(&self) -> &'static str {
        "sentiment_stub"
    }

    fn predict(&self, record: &StockRecord, sentiment_score: f64) -> f64 {
        predict_performance(record.price, sentiment_score)
    }
}
