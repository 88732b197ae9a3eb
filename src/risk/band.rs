use serde::{Deserialize, Serialize};

use crate::models::AlertThreshold;

/// Colour band a dashboard gauge uses for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    pub fn classify(score: i64) -> Self {
        match score {
            s if s <= 40 => RiskBand::Low,
            s if s <= 70 => RiskBand::Moderate,
            _ => RiskBand::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Moderate => "moderate",
            RiskBand::High => "high",
        }
    }
}

/// Alert fires only when the index is strictly above the threshold.
pub fn exceeds_threshold(score: i64, threshold: AlertThreshold) -> bool {
    score > i64::from(threshold.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(RiskBand::classify(0), RiskBand::Low);
        assert_eq!(RiskBand::classify(40), RiskBand::Low);
        assert_eq!(RiskBand::classify(41), RiskBand::Moderate);
        assert_eq!(RiskBand::classify(70), RiskBand::Moderate);
        assert_eq!(RiskBand::classify(71), RiskBand::High);
    }

    #[test]
    fn test_threshold_is_strict() {
        let threshold = AlertThreshold::new(75).unwrap();
        assert!(!exceeds_threshold(75, threshold));
        assert!(exceeds_threshold(76, threshold));
    }
}
