use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("portfolio is empty or matches no known records")]
    EmptyPortfolio,

    #[error("division by zero: {0} is zero")]
    DivisionByZero(&'static str),

    #[error("inputs are not aligned: expected {expected} values, got {actual}")]
    AlignmentError { expected: usize, actual: usize },

    #[error("invalid Sharpe ratio: {0}")]
    InvalidRatio(f64),

    #[error("invalid quantity {quantity} for {symbol}")]
    InvalidQuantity { symbol: String, quantity: f64 },

    #[error("{0} is not a finite number")]
    NonFinite(&'static str),
}
