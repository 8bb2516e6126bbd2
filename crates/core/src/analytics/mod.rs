pub mod alpha_beta;
pub mod classifier;
pub mod error;
pub mod pipeline;
pub mod portfolio;
pub mod predict;
pub mod ranking;
pub mod sharpe;

/// Rounds half away from zero to `decimals` places. Only used when presenting results.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_requested_places() {
        assert_eq!(round_to(0.399_999_999_999_999_97, 4), 0.4);
        assert_eq!(round_to(110.000_000_000_000_01, 2), 110.0);
        assert_eq!(round_to(-1.234_56, 2), -1.23);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
