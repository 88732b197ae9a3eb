use std::sync::{Mutex, PoisonError};

use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::models::{
    seed_protocols, AdminSettings, FinancialMetrics, FinancialRisk, FusionResult, FusionWeights,
    OracleUpdate, PerSource, ProtocolIdentifier, SentimentRisk, SourceFlags, SourceWeights,
    TrendPoint,
};
use crate::risk::{aggregate_sentiment, fuse};
use crate::utils::math::{round_half_away_from_zero, round_to};
use crate::utils::time::{descending_series, now_utc};

pub const TREND_LENGTH: usize = 30;
pub const FUSION_TREND_AMPLITUDE: f64 = 20.0;
pub const SENTIMENT_TREND_AMPLITUDE: f64 = 10.0;
pub const FEED_LENGTH: usize = 8;
pub const FEED_SPACING_MINUTES: i64 = 7;

const TREND_BASE: f64 = 50.0;
const TREND_NOISE: f64 = 3.0;
const SYNTHETIC_NOTE: &str = "Synthetic estimate: live fusion model unavailable.";

/// Plausible mock metrics for fallbacks and demo widgets.
///
/// The default generator draws from an OS-seeded CSPRNG, so every call differs.
/// `seeded` gives a reproducible stream for tests.
pub struct SyntheticDataGenerator {
    rng: Mutex<StdRng>,
}

impl SyntheticDataGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    pub fn financial_risk(&self) -> FinancialRisk {
        self.with_rng(|rng| FinancialRisk {
            score: rng.gen_range(55..=90),
            metrics: FinancialMetrics {
                tvl: round_to(rng.gen_range(50_000_000.0..250_000_000.0), 0),
                collateral_ratio: round_to(rng.gen_range(120.0..200.0), 0),
                liquidations: rng.gen_range(0..=25),
                oracle_spread: round_to(rng.gen_range(0.1..1.5), 2),
            },
        })
    }

    pub fn sentiment_risk(&self) -> SentimentRisk {
        let metrics = self.with_rng(|rng| PerSource {
            twitter: round_to(rng.gen_range(0.35..0.85), 2),
            reddit: round_to(rng.gen_range(0.35..0.85), 2),
            telegram: round_to(rng.gen_range(0.35..0.85), 2),
            news: round_to(rng.gen_range(0.35..0.85), 2),
        });

        let score = aggregate_sentiment(
            &metrics.map(|signal| signal * 100.0),
            &SourceWeights::default(),
            &SourceFlags::default(),
        );

        SentimentRisk { score, metrics }
    }

    pub fn fusion_result(&self) -> FusionResult {
        let weights = FusionWeights::default();
        let (financial, sentiment, confidence): (i64, i64, i64) =
            self.with_rng(|rng| (rng.gen_range(55..=90), rng.gen_range(40..=80), rng.gen_range(75..=95)));

        FusionResult {
            score: fuse(financial, sentiment, weights),
            weights,
            confidence,
            notes: SYNTHETIC_NOTE.to_string(),
            trend: self.trend(TREND_LENGTH, FUSION_TREND_AMPLITUDE),
        }
    }

    /// `v_i = round(50 + amplitude * sin(i / 4) + noise)`, noise uniform in `[-3, 3)`.
    pub fn trend(&self, length: usize, amplitude: f64) -> Vec<TrendPoint> {
        self.with_rng(|rng| {
            (0..length)
                .map(|i| {
                    let wave = amplitude * (i as f64 / 4.0).sin();
                    let noise = rng.gen_range(-TREND_NOISE..TREND_NOISE);
                    TrendPoint {
                        t: i.to_string(),
                        v: round_half_away_from_zero(TREND_BASE + wave + noise),
                    }
                })
                .collect()
        })
    }

    /// Eight most recent oracle publishes, newest first, seven minutes apart.
    pub fn oracle_feed(&self) -> Vec<OracleUpdate> {
        let protocols: Vec<ProtocolIdentifier> = seed_protocols().into_iter().map(|p| p.id).collect();
        let timestamps = descending_series(
            now_utc(),
            FEED_LENGTH,
            Duration::minutes(FEED_SPACING_MINUTES),
        );

        timestamps
            .into_iter()
            .map(|timestamp| {
                let (protocol, fusion_risk_index) = self.with_rng(|rng| {
                    let protocol = protocols[rng.gen_range(0..protocols.len())].clone();
                    let index = round_half_away_from_zero(55.0 + rng.gen_range(0.0..30.0));
                    (protocol, index)
                });
                OracleUpdate {
                    protocol,
                    fusion_risk_index,
                    tx_hash: self.tx_hash(),
                    timestamp,
                }
            })
            .collect()
    }

    /// `0x` followed by 64 lowercase hex characters (32 random bytes).
    pub fn tx_hash(&self) -> String {
        let mut bytes = [0u8; 32];
        self.with_rng(|rng| rng.fill_bytes(&mut bytes));
        format!("0x{}", hex::encode(bytes))
    }

    pub fn admin_settings(&self) -> AdminSettings {
        AdminSettings::default()
    }
}

impl Default for SyntheticDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}
