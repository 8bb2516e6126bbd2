use crate::analytics::error::AnalyticsError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative Sharpe bucket, declared in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SharpeLabel {
    Negative,
    Low,
    Moderate,
    Good,
    Excellent,
}

impl SharpeLabel {
    pub const ALL: [SharpeLabel; 5] = [
        SharpeLabel::Negative,
        SharpeLabel::Low,
        SharpeLabel::Moderate,
        SharpeLabel::Good,
        SharpeLabel::Excellent,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SharpeLabel::Negative => "Negative",
            SharpeLabel::Low => "Low",
            SharpeLabel::Moderate => "Moderate",
            SharpeLabel::Good => "Good",
            SharpeLabel::Excellent => "Excellent",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SharpeLabel::Negative => "Excessive risk for a negative return",
            SharpeLabel::Low => "Return too low for the level of risk",
            SharpeLabel::Moderate => "Acceptable but not optimal",
            SharpeLabel::Good => "Good return for the risk taken",
            SharpeLabel::Excellent => "Very strong risk-adjusted performance",
        }
    }
}

impl fmt::Display for SharpeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buckets are left-closed: `[0, 0.5)` is Low, `[0.5, 1.0)` Moderate, `[1.0, 1.5)` Good.
/// Infinities land in the end buckets; NaN is rejected.
pub fn classify_sharpe(ratio: f64) -> Result<SharpeLabel, AnalyticsError> {
    if ratio.is_nan() {
        return Err(AnalyticsError::InvalidRatio(ratio));
    }

    let label = if ratio < 0.0 {
        SharpeLabel::Negative
    } else if ratio < 0.5 {
        SharpeLabel::Low
    } else if ratio < 1.0 {
        SharpeLabel::Moderate
    } else if ratio < 1.5 {
        SharpeLabel::Good
    } else {
        SharpeLabel::Excellent
    };
    Ok(label)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SharpeResult {
    pub ratio: f64,
    pub label: SharpeLabel,
}

impl SharpeResult {
    pub fn from_ratio(ratio: f64) -> Result<Self, AnalyticsError> {
        Ok(Self {
            ratio,
            label: classify_sharpe(ratio)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_left_closed() {
        assert_eq!(classify_sharpe(-0.0001).unwrap(), SharpeLabel::Negative);
        assert_eq!(classify_sharpe(0.0).unwrap(), SharpeLabel::Low);
        assert_eq!(classify_sharpe(-0.0).unwrap(), SharpeLabel::Low);
        assert_eq!(classify_sharpe(0.5).unwrap(), SharpeLabel::Moderate);
        assert_eq!(classify_sharpe(1.0).unwrap(), SharpeLabel::Good);
        assert_eq!(classify_sharpe(1.5).unwrap(), SharpeLabel::Excellent);
    }

    #[test]
    fn interior_values() {
        assert_eq!(classify_sharpe(-0.5).unwrap(), SharpeLabel::Negative);
        assert_eq!(classify_sharpe(0.2).unwrap(), SharpeLabel::Low);
        assert_eq!(classify_sharpe(0.8).unwrap(), SharpeLabel::Moderate);
        assert_eq!(classify_sharpe(1.2).unwrap(), SharpeLabel::Good);
        assert_eq!(classify_sharpe(1.8).unwrap(), SharpeLabel::Excellent);
    }

    #[test]
    fn infinities_route_to_end_buckets() {
        assert_eq!(
            classify_sharpe(f64::NEG_INFINITY).unwrap(),
            SharpeLabel::Negative
        );
        assert_eq!(classify_sharpe(f64::INFINITY).unwrap(), SharpeLabel::Excellent);
    }

    #[test]
    fn nan_is_invalid() {
        assert!(matches!(
            classify_sharpe(f64::NAN),
            Err(AnalyticsError::InvalidRatio(_))
        ));
        assert!(SharpeResult::from_ratio(f64::NAN).is_err());
    }

    #[test]
    fn monotonic_over_a_sweep() {
        let mut prev = classify_sharpe(f64::NEG_INFINITY).unwrap();
        let mut x = -3.0;
        while x <= 3.0 {
            let label = classify_sharpe(x).unwrap();
            assert!(prev.rank() <= label.rank(), "non-monotonic at {x}");
            prev = label;
            x += 0.01;
        }
        assert!(prev.rank() <= classify_sharpe(f64::INFINITY).unwrap().rank());
    }

    #[test]
    fn ranks_follow_declaration_order() {
        let ranks: Vec<u8> = SharpeLabel::ALL.iter().map(|l| l.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
        assert!(SharpeLabel::Negative < SharpeLabel::Excellent);
    }

    #[test]
    fn serializes_as_name() {
        let result = SharpeResult::from_ratio(1.1).unwrap();
        let v = serde_json::to_value(result).unwrap();
        assert_eq!(v["label"], "Good");
        assert_eq!(SharpeLabel::Good.to_string(), "Good");
    }
}
