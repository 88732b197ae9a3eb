use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::protocol::ProtocolIdentifier;
use super::weights::{FusionWeights, PerSource, SourceFlags};

/// `GET /api/risk/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRisk {
    pub score: i64,
    pub metrics: FinancialMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub tvl: f64,
    pub collateral_ratio: f64,
    pub liquidations: u32,
    pub oracle_spread: f64,
}

/// Normalized `[0,1]` signal per social channel.
pub type SentimentMetrics = PerSource<f64>;

/// `GET /api/sentiment/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRisk {
    pub score: i64,
    pub metrics: SentimentMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub t: String,
    pub v: i64,
}

/// `GET /api/fusion/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    pub score: i64,
    pub weights: FusionWeights,
    pub confidence: i64,
    pub notes: String,
    pub trend: Vec<TrendPoint>,
}

/// One entry of `GET /api/oracle/feed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleUpdate {
    pub protocol: ProtocolIdentifier,
    pub fusion_risk_index: i64,
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
}

/// `GET /api/admin/settings`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdminSettings {
    pub weights: FusionWeights,
    pub sources: SourceFlags,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fusion_result_decodes_wire_shape() {
        let body = json!({
            "score": 72,
            "weights": {"financial_pct": 70, "sentiment_pct": 30},
            "confidence": 88,
            "notes": "consensus",
            "trend": [{"t": "0", "v": 51}, {"t": "1", "v": 53}]
        });

        let fusion: FusionResult = serde_json::from_value(body).unwrap();
        assert_eq!(fusion.score, 72);
        assert_eq!(fusion.weights.sentiment_pct(), 30);
        assert_eq!(fusion.trend.len(), 2);
    }

    #[test]
    fn test_oracle_update_decodes_rfc3339_timestamp() {
        let body = json!([{
            "protocol": "aegis",
            "fusion_risk_index": 61,
            "tx_hash": "0xabc",
            "timestamp": "2024-05-01T12:00:00.000Z"
        }]);

        let feed: Vec<OracleUpdate> = serde_json::from_value(body).unwrap();
        assert_eq!(feed[0].protocol.as_str(), "aegis");
        assert_eq!(feed[0].timestamp.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn test_admin_settings_default() {
        let settings = AdminSettings::default();
        assert_eq!(settings.weights.financial_pct(), 70);
        assert!(settings.sources.iter().all(|(_, enabled)| enabled));
    }
}
