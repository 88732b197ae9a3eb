// Weighted aggregation of sub-scores into 0-100 risk scores

pub mod aggregator;
pub mod band;

pub use aggregator::*;
pub use band::*;

pub const MAX_RISK_SCORE: i64 = 100;
pub const MIN_RISK_SCORE: i64 = 0;

/// Illustrative sub-scores combined by the simulated oracle publish.
pub const PUBLISH_FINANCIAL_SCORE: i64 = 75;
pub const PUBLISH_SENTIMENT_SCORE: i64 = 65;
