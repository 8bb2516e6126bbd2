use crate::domain::stock::Portfolio;
use serde::{Deserialize, Serialize};

/// Marks where the model's answer starts; text-completion models echo the prompt back.
pub const ANSWER_MARKER: &str = "Strategist's answer:";

const MAX_GAINERS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdviceRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub gainers_list: Vec<String>,
    #[serde(default)]
    pub portfolio: Portfolio,
    #[serde(default)]
    pub sharpe_value: Option<f64>,
    #[serde(default)]
    pub transactions: String,
}

impl AdviceRequest {
    pub fn build_prompt(&self) -> anyhow::Result<String> {
        let question = self.question.trim();
        anyhow::ensure!(!question.is_empty(), "question must be non-empty");

        let gainers = if self.gainers_list.is_empty() {
            "Not provided".to_string()
        } else {
            self.gainers_list
                .iter()
                .take(MAX_GAINERS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let portfolio = if self.portfolio.is_empty() {
            "No current holdings".to_string()
        } else {
            self.portfolio
                .iter()
                .map(|(symbol, qty)| format!("{symbol}: {qty}"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let sentiment = match self.sentiment_score {
            Some(s) => {
                let tone = if s > 0.0 {
                    "positive"
                } else if s < 0.0 {
                    "negative"
                } else {
                    "neutral"
                };
                format!("{s:.2} ({tone})")
            }
            None => "Not provided".to_string(),
        };

        let sharpe = self
            .sharpe_value
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "Not provided".to_string());

        let transactions = match self.transactions.trim() {
            "" => "None",
            t => t,
        };

        Ok([
            "You are a senior portfolio strategist at a private bank. Give concise, professional advice based on the data below.".to_string(),
            String::new(),
            "Client's question:".to_string(),
            question.to_string(),
            String::new(),
            "Data available:".to_string(),
            format!("- Market sentiment score: {sentiment}"),
            format!("- Top gainers: {gainers}"),
            format!("- Client portfolio: {portfolio}"),
            format!("- Recent transactions: {transactions}"),
            format!("- Sharpe ratio: {sharpe}"),
            String::new(),
            "Respond in 2 to 4 sentences. Stay professional, helpful, and focused on the client's goal.".to_string(),
            String::new(),
            ANSWER_MARKER.to_string(),
        ]
        .join("\n"))
    }
}

/// Text following the last [`ANSWER_MARKER`], or the whole output when the marker is absent.
pub fn extract_answer(generated: &str) -> String {
    match generated.rfind(ANSWER_MARKER) {
        Some(idx) => generated[idx + ANSWER_MARKER.len()..].trim().to_string(),
        None => generated.trim().to_string(),
    }
}
