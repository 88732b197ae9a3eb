use std::collections::HashMap;

use crate::models::{FusionWeights, PreferenceSnapshot, SentimentMetrics, SourceFlags, SourceWeights};
use crate::utils::math::{round_half_away_from_zero, weighted_mean};

/// Weighted mean of the enabled metrics, rounded half away from zero.
///
/// A metric counts only when its `enabled` flag is present and true; a missing
/// weight counts as zero. With nothing enabled the score is exactly 0. Inputs
/// are not clamped, so values outside `[0,100]` can produce a score outside it.
pub fn aggregate(
    metrics: &HashMap<String, f64>,
    weights: &HashMap<String, f64>,
    enabled: &HashMap<String, bool>,
) -> i64 {
    let mut names: Vec<&String> = metrics
        .keys()
        .filter(|name| enabled.get(*name).copied().unwrap_or(false))
        .collect();
    // fixed summation order keeps float results reproducible
    names.sort();

    let pairs: Vec<(f64, f64)> = names
        .into_iter()
        .map(|name| (metrics[name], weights.get(name).copied().unwrap_or(0.0)))
        .collect();

    weighted_mean(&pairs).map(round_half_away_from_zero).unwrap_or(0)
}

/// Combine an already aggregated financial and sentiment score.
pub fn fuse(financial_score: i64, sentiment_score: i64, weights: FusionWeights) -> i64 {
    let financial = financial_score as f64 * f64::from(weights.financial_pct()) / 100.0;
    let sentiment = sentiment_score as f64 * f64::from(weights.sentiment_pct()) / 100.0;
    round_half_away_from_zero(financial + sentiment)
}

/// Aggregate per-source sentiment scores (already on a 0-100 scale).
pub fn aggregate_sentiment(
    scores: &SentimentMetrics,
    weights: &SourceWeights,
    enabled: &SourceFlags,
) -> i64 {
    aggregate(
        &scores.to_map(),
        &weights.as_per_source().to_map(),
        &enabled.to_map(),
    )
}

/// Re-score normalized `[0,1]` sentiment signals with the user's own source
/// weights and toggles.
pub fn personalized_sentiment(metrics: &SentimentMetrics, preferences: &PreferenceSnapshot) -> i64 {
    let scaled = metrics.map(|signal| signal * 100.0);
    aggregate_sentiment(&scaled, &preferences.source_weights, &preferences.sources)
}
