use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Social channels feeding the sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentSource {
    Twitter,
    Reddit,
    Telegram,
    News,
}

impl SentimentSource {
    pub const ALL: [SentimentSource; 4] = [
        SentimentSource::Twitter,
        SentimentSource::Reddit,
        SentimentSource::Telegram,
        SentimentSource::News,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentSource::Twitter => "twitter",
            SentimentSource::Reddit => "reddit",
            SentimentSource::Telegram => "telegram",
            SentimentSource::News => "news",
        }
    }
}

impl fmt::Display for SentimentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per sentiment source, serialized as `{twitter, reddit, telegram, news}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerSource<T> {
    pub twitter: T,
    pub reddit: T,
    pub telegram: T,
    pub news: T,
}

impl<T: Copy> PerSource<T> {
    pub fn splat(value: T) -> Self {
        Self {
            twitter: value,
            reddit: value,
            telegram: value,
            news: value,
        }
    }

    pub fn get(&self, source: SentimentSource) -> T {
        match source {
            SentimentSource::Twitter => self.twitter,
            SentimentSource::Reddit => self.reddit,
            SentimentSource::Telegram => self.telegram,
            SentimentSource::News => self.news,
        }
    }

    pub fn set(&mut self, source: SentimentSource, value: T) {
        match source {
            SentimentSource::Twitter => self.twitter = value,
            SentimentSource::Reddit => self.reddit = value,
            SentimentSource::Telegram => self.telegram = value,
            SentimentSource::News => self.news = value,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SentimentSource, T)> + '_ {
        SentimentSource::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> PerSource<U> {
        PerSource {
            twitter: f(self.twitter),
            reddit: f(self.reddit),
            telegram: f(self.telegram),
            news: f(self.news),
        }
    }

    /// Keyed by metric name, the shape the weighted aggregator consumes.
    pub fn to_map(&self) -> HashMap<String, T> {
        self.iter().map(|(s, v)| (s.as_str().to_string(), v)).collect()
    }
}

/// Per-source enable/disable toggles.
pub type SourceFlags = PerSource<bool>;

impl Default for SourceFlags {
    fn default() -> Self {
        PerSource::splat(true)
    }
}

/// Per-source relative importance, each weight within `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PerSource<f64>", into = "PerSource<f64>")]
pub struct SourceWeights(PerSource<f64>);

impl SourceWeights {
    pub fn get(&self, source: SentimentSource) -> f64 {
        self.0.get(source)
    }

    /// Slider semantics: the value is clamped into `[0,1]`.
    pub fn set(&mut self, source: SentimentSource, weight: f64) {
        let weight = if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) };
        self.0.set(source, weight);
    }

    pub fn as_per_source(&self) -> &PerSource<f64> {
        &self.0
    }
}

impl Default for SourceWeights {
    fn default() -> Self {
        SourceWeights(PerSource {
            twitter: 0.6,
            reddit: 0.4,
            telegram: 0.5,
            news: 0.7,
        })
    }
}

impl TryFrom<PerSource<f64>> for SourceWeights {
    type Error = String;

    fn try_from(weights: PerSource<f64>) -> Result<Self, Self::Error> {
        for (source, weight) in weights.iter() {
            if !(0.0..=1.0).contains(&weight) {
                return Err(format!("weight for {} must be within [0,1], got {}", source, weight));
            }
        }
        Ok(SourceWeights(weights))
    }
}

impl From<SourceWeights> for PerSource<f64> {
    fn from(weights: SourceWeights) -> Self {
        weights.0
    }
}

/// Financial/sentiment split of the Fusion Risk Index.
///
/// Only the financial share is stored; the sentiment share is its complement,
/// so the pair always sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FusionWeightsWire", into = "FusionWeightsWire")]
pub struct FusionWeights {
    financial_pct: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct FusionWeightsWire {
    financial_pct: i64,
    sentiment_pct: i64,
}

impl FusionWeights {
    pub fn new(financial_pct: u8) -> Option<Self> {
        (financial_pct <= 100).then_some(Self { financial_pct })
    }

    /// Slider semantics: anything above 100 becomes 100.
    pub fn saturating(financial_pct: u8) -> Self {
        Self {
            financial_pct: financial_pct.min(100),
        }
    }

    pub fn financial_pct(&self) -> u8 {
        self.financial_pct
    }

    pub fn sentiment_pct(&self) -> u8 {
        100 - self.financial_pct
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { financial_pct: 70 }
    }
}

impl TryFrom<FusionWeightsWire> for FusionWeights {
    type Error = String;

    fn try_from(wire: FusionWeightsWire) -> Result<Self, Self::Error> {
        let percent = |value: i64, name: &str| {
            u8::try_from(value)
                .ok()
                .filter(|pct| *pct <= 100)
                .ok_or_else(|| format!("{} out of range: {}", name, value))
        };
        let financial_pct = percent(wire.financial_pct, "financial_pct")?;
        let sentiment_pct = percent(wire.sentiment_pct, "sentiment_pct")?;

        if u16::from(financial_pct) + u16::from(sentiment_pct) != 100 {
            return Err(format!(
                "fusion weights must sum to 100, got {} + {}",
                financial_pct, sentiment_pct
            ));
        }
        Ok(Self { financial_pct })
    }
}

impl From<FusionWeights> for FusionWeightsWire {
    fn from(weights: FusionWeights) -> Self {
        FusionWeightsWire {
            financial_pct: i64::from(weights.financial_pct()),
            sentiment_pct: i64::from(weights.sentiment_pct()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fusion_weights_complement() {
        let weights = FusionWeights::new(70).unwrap();
        assert_eq!(weights.sentiment_pct(), 30);
        assert!(FusionWeights::new(101).is_none());
        assert_eq!(FusionWeights::saturating(250).sentiment_pct(), 0);
    }

    #[test]
    fn test_fusion_weights_wire_format() {
        let value = serde_json::to_value(FusionWeights::new(40).unwrap()).unwrap();
        assert_eq!(value, json!({"financial_pct": 40, "sentiment_pct": 60}));

        let parsed: FusionWeights =
            serde_json::from_value(json!({"financial_pct": 55, "sentiment_pct": 45})).unwrap();
        assert_eq!(parsed.financial_pct(), 55);
    }

    #[test]
    fn test_fusion_weights_reject_broken_pair() {
        let broken = serde_json::from_value::<FusionWeights>(
            json!({"financial_pct": 70, "sentiment_pct": 70}),
        );
        assert!(broken.is_err());

        let negative = serde_json::from_value::<FusionWeights>(
            json!({"financial_pct": -10, "sentiment_pct": 110}),
        );
        assert!(negative.is_err());
    }

    #[test]
    fn test_fusion_weights_reject_overflowing_pair() {
        let overflowing = serde_json::from_value::<FusionWeights>(
            json!({"financial_pct": i64::MAX, "sentiment_pct": 1}),
        );
        assert!(overflowing.is_err());

        let wrapped = serde_json::from_value::<FusionWeights>(
            json!({"financial_pct": i64::MIN, "sentiment_pct": -1}),
        );
        assert!(wrapped.is_err());
    }

    #[test]
    fn test_source_weights_range_checked() {
        let bad = serde_json::from_value::<SourceWeights>(
            json!({"twitter": 1.5, "reddit": 0.4, "telegram": 0.5, "news": 0.7}),
        );
        assert!(bad.is_err());

        let mut weights = SourceWeights::default();
        weights.set(SentimentSource::Reddit, 3.0);
        assert_eq!(weights.get(SentimentSource::Reddit), 1.0);
        weights.set(SentimentSource::Reddit, -1.0);
        assert_eq!(weights.get(SentimentSource::Reddit), 0.0);
    }

    #[test]
    fn test_per_source_to_map() {
        let flags = SourceFlags::default();
        let map = flags.to_map();
        assert_eq!(map.len(), 4);
        assert_eq!(map.get("telegram"), Some(&true));
    }
}
