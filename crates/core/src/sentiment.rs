use crate::analytics::round_to;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tone assigned to a news article by the upstream classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn score(self) -> f64 {
        match self {
            SentimentLabel::Positive => 1.0,
            SentimentLabel::Neutral => 0.0,
            SentimentLabel::Negative => -1.0,
        }
    }
}

impl FromStr for SentimentLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "neutral" => Ok(SentimentLabel::Neutral),
            "negative" => Ok(SentimentLabel::Negative),
            other => anyhow::bail!("unknown sentiment label: {other:?}"),
        }
    }
}

/// Mean of the finite scores, rounded to 4 places. `None` when nothing usable remains.
pub fn average_sentiment(scores: &[f64]) -> Option<f64> {
    let usable: Vec<f64> = scores.iter().copied().filter(|s| s.is_finite()).collect();
    if usable.is_empty() {
        return None;
    }
    Some(round_to(
        usable.iter().sum::<f64>() / usable.len() as f64,
        4,
    ))
}
