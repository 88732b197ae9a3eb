use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::AppError;
use crate::models::{
    seed_protocols, AdminSettings, CreateProtocol, FinancialRisk, FusionResult, FusionWeights,
    OracleUpdate, PreferenceSnapshot, Protocol, ProtocolIdentifier, ProtocolSort, PublishRecord,
    SentimentRisk, SourceFlags, TrendPoint, UpdateProtocol,
};
use crate::risk::{
    exceeds_threshold, fuse, personalized_sentiment, RiskBand, PUBLISH_FINANCIAL_SCORE,
    PUBLISH_SENTIMENT_SCORE,
};
use crate::services::fetch_client::{endpoints, Fetched, ResilientFetchClient};
use crate::services::preference_store::{PreferenceKey, PreferenceStore};
use crate::services::synthetic_data::{SyntheticDataGenerator, SENTIMENT_TREND_AMPLITUDE, TREND_LENGTH};
use crate::utils::time::now_utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBands {
    pub financial: RiskBand,
    pub sentiment: RiskBand,
    pub fusion: RiskBand,
}

/// Everything the dashboard view renders for one protocol, applied as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub protocol: ProtocolIdentifier,
    pub financial: Fetched<FinancialRisk>,
    pub sentiment: Fetched<SentimentRisk>,
    pub fusion: Fetched<FusionResult>,
    pub feed: Fetched<Vec<OracleUpdate>>,
    pub bands: ScoreBands,
    pub alert_triggered: bool,
    pub loaded_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// True when any of the four results came from the synthetic fallback.
    pub fn is_partially_synthetic(&self) -> bool {
        !(self.financial.is_live() && self.sentiment.is_live() && self.fusion.is_live() && self.feed.is_live())
    }
}

/// Sentiment view: the fetched breakdown re-scored with the user's own weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentView {
    pub sentiment: Fetched<SentimentRisk>,
    pub personalized_score: i64,
    pub band: RiskBand,
}

#[derive(Debug, Default)]
struct SessionState {
    selected: Option<ProtocolIdentifier>,
    snapshot: Option<DashboardSnapshot>,
    last_publish: Option<PublishRecord>,
}

/// Coordinates fetches, preferences and local protocol records for the
/// dashboard views.
///
/// Only the most recently started dashboard load may apply its results. Each
/// load takes a new batch generation; a batch that finishes after a newer one
/// started is dropped.
pub struct DashboardOrchestrator {
    client: ResilientFetchClient,
    generator: Arc<SyntheticDataGenerator>,
    preferences: PreferenceStore,
    protocols: RwLock<Vec<Protocol>>,
    session: RwLock<SessionState>,
    batch_generation: AtomicU64,
    explorer_base_url: String,
}

impl DashboardOrchestrator {
    pub fn new(
        client: ResilientFetchClient,
        generator: Arc<SyntheticDataGenerator>,
        preferences: PreferenceStore,
        explorer_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            generator,
            preferences,
            protocols: RwLock::new(seed_protocols()),
            session: RwLock::new(SessionState::default()),
            batch_generation: AtomicU64::new(0),
            explorer_base_url: explorer_base_url.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let client = ResilientFetchClient::http(&settings.api)?;
        let preferences = PreferenceStore::from_settings(&settings.storage);

        Ok(Self::new(
            client,
            Arc::new(SyntheticDataGenerator::new()),
            preferences,
            settings.dashboard.explorer_base_url.clone(),
        ))
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// Load the dashboard for `protocol_id`.
    ///
    /// Returns `None` when a newer load (or a deactivation) superseded this one
    /// before its results arrived.
    pub async fn load_dashboard(&self, protocol_id: &ProtocolIdentifier) -> Option<DashboardSnapshot> {
        let generation = self.batch_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.session.write().await.selected = Some(protocol_id.clone());

        let preferences = self.preferences.snapshot();
        debug!(protocol = %protocol_id, generation, "Starting dashboard batch");

        let financial_path = endpoints::financial_risk(protocol_id);
        let sentiment_path = endpoints::sentiment_risk(protocol_id);
        let fusion_path = endpoints::fusion_result(protocol_id);
        let generator = &self.generator;

        let (financial, sentiment, fusion, feed) = tokio::join!(
            self.client
                .fetch_tagged(&financial_path, || generator.financial_risk()),
            self.client
                .fetch_tagged(&sentiment_path, || generator.sentiment_risk()),
            self.client
                .fetch_tagged(&fusion_path, || generator.fusion_result()),
            self.client
                .fetch_tagged(endpoints::ORACLE_FEED, || generator.oracle_feed()),
        );

        let bands = ScoreBands {
            financial: RiskBand::classify(financial.value.score),
            sentiment: RiskBand::classify(sentiment.value.score),
            fusion: RiskBand::classify(fusion.value.score),
        };
        let alert_triggered = exceeds_threshold(fusion.value.score, preferences.alert_threshold);

        let snapshot = DashboardSnapshot {
            protocol: protocol_id.clone(),
            financial,
            sentiment,
            fusion,
            feed,
            bands,
            alert_triggered,
            loaded_at: now_utc(),
        };

        let mut session = self.session.write().await;
        if self.batch_generation.load(Ordering::SeqCst) != generation {
            debug!(protocol = %protocol_id, generation, "Discarding stale dashboard batch");
            metrics::increment_counter!("fusion_stale_batch_total");
            return None;
        }

        if alert_triggered {
            warn!(
                protocol = %protocol_id,
                score = snapshot.fusion.value.score,
                threshold = preferences.alert_threshold.value(),
                "Fusion Risk Index above alert threshold"
            );
        }

        info!(
            protocol = %protocol_id,
            fusion_score = snapshot.fusion.value.score,
            synthetic = snapshot.is_partially_synthetic(),
            "Dashboard loaded"
        );

        session.snapshot = Some(snapshot.clone());
        Some(snapshot)
    }

    pub async fn current_snapshot(&self) -> Option<DashboardSnapshot> {
        self.session.read().await.snapshot.clone()
    }

    pub async fn selected_protocol(&self) -> Option<ProtocolIdentifier> {
        self.session.read().await.selected.clone()
    }

    /// Leave the view: in-flight batches become stale and session state is dropped.
    pub async fn deactivate(&self) {
        self.batch_generation.fetch_add(1, Ordering::SeqCst);
        let mut session = self.session.write().await;
        *session = SessionState::default();
        debug!("Dashboard session discarded");
    }

    pub async fn personalized_sentiment(&self, protocol_id: &ProtocolIdentifier) -> SentimentView {
        let preferences = self.preferences.snapshot();
        let path = endpoints::sentiment_risk(protocol_id);
        let sentiment = self
            .client
            .fetch_tagged(&path, || self.generator.sentiment_risk())
            .await;

        let personalized_score = personalized_sentiment(&sentiment.value.metrics, &preferences);
        SentimentView {
            sentiment,
            personalized_score,
            band: RiskBand::classify(personalized_score),
        }
    }

    pub fn sentiment_trend(&self) -> Vec<TrendPoint> {
        self.generator.trend(TREND_LENGTH, SENTIMENT_TREND_AMPLITUDE)
    }

    pub async fn list_protocols(&self, query: &str, sort: Option<ProtocolSort>) -> Vec<Protocol> {
        let protocols = self.protocols.read().await;
        let mut matching: Vec<Protocol> = protocols
            .iter()
            .filter(|p| p.matches(query))
            .cloned()
            .collect();

        match sort {
            Some(ProtocolSort::Tvl) => matching.sort_by(|a, b| b.tvl_usd.total_cmp(&a.tvl_usd)),
            Some(ProtocolSort::Collateral) => {
                matching.sort_by(|a, b| b.collateral_ratio.total_cmp(&a.collateral_ratio))
            }
            None => {}
        }
        matching
    }

    pub async fn get_protocol(&self, protocol_id: &ProtocolIdentifier) -> Option<Protocol> {
        let protocols = self.protocols.read().await;
        protocols.iter().find(|p| &p.id == protocol_id).cloned()
    }

    pub async fn create_protocol(&self, create_protocol: CreateProtocol) -> Result<Protocol, AppError> {
        let protocol = Protocol::new(create_protocol);
        validate_protocol(&protocol)?;

        let mut protocols = self.protocols.write().await;
        protocols.insert(0, protocol.clone());
        info!(protocol = %protocol.id, name = %protocol.name, "Protocol created");
        Ok(protocol)
    }

    pub async fn update_protocol(
        &self,
        protocol_id: &ProtocolIdentifier,
        update: UpdateProtocol,
    ) -> Result<Protocol, AppError> {
        let mut protocols = self.protocols.write().await;
        let existing = protocols
            .iter_mut()
            .find(|p| &p.id == protocol_id)
            .ok_or_else(|| AppError::NotFound(format!("protocol {}", protocol_id)))?;

        let mut updated = existing.clone();
        updated.apply(update);
        validate_protocol(&updated)?;

        *existing = updated.clone();
        info!(protocol = %protocol_id, "Protocol updated");
        Ok(updated)
    }

    pub async fn delete_protocol(&self, protocol_id: &ProtocolIdentifier) -> bool {
        let mut protocols = self.protocols.write().await;
        let before = protocols.len();
        protocols.retain(|p| &p.id != protocol_id);

        let removed = protocols.len() != before;
        if removed {
            info!(protocol = %protocol_id, "Protocol deleted");
        }
        removed
    }

    pub async fn total_tvl(&self) -> f64 {
        self.protocols.read().await.iter().map(|p| p.tvl_usd).sum()
    }

    /// Add or remove `protocol_id`; returns whether it is watched afterwards.
    pub fn toggle_watchlist(&self, protocol_id: &ProtocolIdentifier) -> bool {
        let watchlist = self
            .preferences
            .update(PreferenceKey::Watchlist, Vec::new(), |list: &mut Vec<ProtocolIdentifier>| {
                if list.contains(protocol_id) {
                    list.retain(|id| id != protocol_id);
                } else {
                    list.push(protocol_id.clone());
                }
            });

        let watched = watchlist.contains(protocol_id);
        debug!(protocol = %protocol_id, watched, "Watchlist toggled");
        watched
    }

    pub fn watchlist(&self) -> Vec<ProtocolIdentifier> {
        self.preferences.watchlist()
    }

    pub fn is_watched(&self, protocol_id: &ProtocolIdentifier) -> bool {
        self.watchlist().contains(protocol_id)
    }

    /// Simulated oracle publish of the current fusion weights over fixed sub-scores.
    pub async fn publish(&self) -> PublishRecord {
        let weights = self.preferences.snapshot().fusion_weights;
        let record = PublishRecord {
            index: fuse(PUBLISH_FINANCIAL_SCORE, PUBLISH_SENTIMENT_SCORE, weights),
            tx_hash: self.generator.tx_hash(),
            timestamp: now_utc(),
        };

        info!(
            index = record.index,
            tx_hash = %record.tx_hash,
            explorer = %record.explorer_url(&self.explorer_base_url),
            "Published Fusion Risk Index"
        );

        self.session.write().await.last_publish = Some(record.clone());
        record
    }

    pub async fn last_publish(&self) -> Option<PublishRecord> {
        self.session.read().await.last_publish.clone()
    }

    pub fn explorer_url(&self, record: &PublishRecord) -> String {
        record.explorer_url(&self.explorer_base_url)
    }

    /// Fetch the server's admin settings. Live values replace the local fusion
    /// weights and source toggles so later publishes and aggregations use them.
    pub async fn load_admin_settings(&self) -> Fetched<AdminSettings> {
        let settings = self
            .client
            .fetch_tagged(endpoints::ADMIN_SETTINGS, || self.generator.admin_settings())
            .await;

        if settings.is_live() {
            self.preferences
                .set(PreferenceKey::FusionWeights, &settings.value.weights);
            self.preferences
                .set(PreferenceKey::SentimentSources, &settings.value.sources);
            debug!(
                financial_pct = settings.value.weights.financial_pct(),
                "Admin settings applied to preferences"
            );
        }
        settings
    }

    /// Persist locally, then push to the admin API. Returns the server acknowledgement.
    pub async fn save_fusion_weights(&self, weights: FusionWeights) -> bool {
        self.preferences.set(PreferenceKey::FusionWeights, &weights);
        let acknowledged = self.client.post_acknowledged(endpoints::UPDATE_WEIGHTS, &weights).await;
        info!(
            financial_pct = weights.financial_pct(),
            sentiment_pct = weights.sentiment_pct(),
            acknowledged,
            "Fusion weights saved"
        );
        acknowledged
    }

    pub async fn save_sources(&self, sources: SourceFlags) -> bool {
        self.preferences.set(PreferenceKey::SentimentSources, &sources);
        let acknowledged = self.client.post_acknowledged(endpoints::UPDATE_SOURCES, &sources).await;
        info!(acknowledged, "Sentiment sources saved");
        acknowledged
    }

    pub fn preference_snapshot(&self) -> PreferenceSnapshot {
        self.preferences.snapshot()
    }
}

fn validate_protocol(protocol: &Protocol) -> Result<(), AppError> {
    if protocol.name.trim().is_empty() {
        return Err(AppError::ValidationError("protocol name must not be empty".to_string()));
    }
    if !protocol.tvl_usd.is_finite() || protocol.tvl_usd < 0.0 {
        return Err(AppError::ValidationError(format!(
            "tvl must be a non-negative amount, got {}",
            protocol.tvl_usd
        )));
    }
    if !protocol.collateral_ratio.is_finite() || protocol.collateral_ratio < 0.0 {
        return Err(AppError::ValidationError(format!(
            "collateral ratio must be non-negative, got {}",
            protocol.collateral_ratio
        )));
    }
    Ok(())
}
