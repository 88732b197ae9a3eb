use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use fusion_risk_monitor::{
    error::FetchError,
    models::{CreateProtocol, ProtocolIdentifier, UpdateProtocol},
    services::{
        DashboardOrchestrator, DataOrigin, PreferenceStore, ResilientFetchClient,
        SyntheticDataGenerator, Transport,
    },
};

/// Serves fixed payloads, delaying every request that mentions `slow_protocol`.
struct LatencyTransport {
    slow_protocol: &'static str,
    delay: Duration,
}

#[async_trait]
impl Transport for LatencyTransport {
    async fn get_json(&self, resource: &str) -> Result<Value, FetchError> {
        if resource.ends_with(self.slow_protocol) {
            tokio::time::sleep(self.delay).await;
        }

        if resource.starts_with("/api/risk/") {
            Ok(json!({
                "score": 81,
                "metrics": {"tvl": 1.0e8, "collateral_ratio": 160.0, "liquidations": 3, "oracle_spread": 0.4}
            }))
        } else if resource.starts_with("/api/sentiment/") {
            Ok(json!({
                "score": 58,
                "metrics": {"twitter": 0.6, "reddit": 0.5, "telegram": 0.55, "news": 0.62}
            }))
        } else if resource.starts_with("/api/fusion/") {
            Ok(json!({
                "score": 74,
                "weights": {"financial_pct": 70, "sentiment_pct": 30},
                "confidence": 90,
                "notes": "live",
                "trend": []
            }))
        } else {
            Err(FetchError::Status {
                resource: resource.to_string(),
                status: 503,
            })
        }
    }

    async fn post_json(&self, _resource: &str, _body: &Value) -> Result<(), FetchError> {
        Ok(())
    }
}

fn orchestrator(transport: Arc<dyn Transport>) -> DashboardOrchestrator {
    DashboardOrchestrator::new(
        ResilientFetchClient::new(transport),
        Arc::new(SyntheticDataGenerator::seeded(42)),
        PreferenceStore::in_memory(),
        "https://explorer.blockdag.network/tx/",
    )
}

#[tokio::test]
async fn test_stale_batch_is_discarded() {
    let orchestrator = orchestrator(Arc::new(LatencyTransport {
        slow_protocol: "aegis",
        delay: Duration::from_millis(200),
    }));
    let aegis = ProtocolIdentifier::new("aegis");
    let orbitx = ProtocolIdentifier::new("orbitx");

    let (first, second) = tokio::join!(orchestrator.load_dashboard(&aegis), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        orchestrator.load_dashboard(&orbitx).await
    });

    assert!(first.is_none(), "slower, older batch must not apply");
    let second = second.expect("newest batch applies");
    assert_eq!(second.protocol, orbitx);

    let current = orchestrator.current_snapshot().await.unwrap();
    assert_eq!(current.protocol, orbitx);
    assert_eq!(orchestrator.selected_protocol().await, Some(orbitx));
}

#[tokio::test]
async fn test_mixed_live_and_synthetic_results() {
    let orchestrator = orchestrator(Arc::new(LatencyTransport {
        slow_protocol: "none",
        delay: Duration::ZERO,
    }));

    let snapshot = orchestrator
        .load_dashboard(&ProtocolIdentifier::new("novalend"))
        .await
        .unwrap();

    assert!(snapshot.financial.is_live());
    assert_eq!(snapshot.financial.value.score, 81);
    assert_eq!(snapshot.fusion.value.score, 74);
    // the feed endpoint answers 503
    assert_eq!(snapshot.feed.origin, DataOrigin::Synthetic);
    assert_eq!(snapshot.feed.value.len(), 8);
    assert!(snapshot.is_partially_synthetic());
    assert!(!snapshot.alert_triggered);
}

#[tokio::test]
async fn test_watchlist_double_toggle_restores_state() {
    let orchestrator = orchestrator(Arc::new(LatencyTransport {
        slow_protocol: "none",
        delay: Duration::ZERO,
    }));
    let synthia = ProtocolIdentifier::new("synthia");
    let before = orchestrator.watchlist();

    assert!(orchestrator.toggle_watchlist(&synthia));
    assert!(orchestrator.is_watched(&synthia));
    assert!(!orchestrator.toggle_watchlist(&synthia));

    assert_eq!(orchestrator.watchlist(), before);
}

#[tokio::test]
async fn test_protocol_crud_round() {
    let orchestrator = orchestrator(Arc::new(LatencyTransport {
        slow_protocol: "none",
        delay: Duration::ZERO,
    }));

    let created = orchestrator
        .create_protocol(CreateProtocol {
            name: "Helios".to_string(),
            symbol: "HEL".to_string(),
            tvl_usd: 10_000_000.0,
            collateral_ratio: Some(140.0),
        })
        .await
        .unwrap();

    let listed = orchestrator.list_protocols("", None).await;
    assert_eq!(listed[0].id, created.id, "new protocols go first");
    assert_eq!(listed.len(), 5);

    let updated = orchestrator
        .update_protocol(
            &created.id,
            UpdateProtocol {
                tvl_usd: Some(12_000_000.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Helios");

    assert!(orchestrator.delete_protocol(&created.id).await);
    assert!(!orchestrator.delete_protocol(&created.id).await);
    assert!(orchestrator.get_protocol(&created.id).await.is_none());
}

#[tokio::test]
async fn test_publish_and_explorer_link() {
    let orchestrator = orchestrator(Arc::new(LatencyTransport {
        slow_protocol: "none",
        delay: Duration::ZERO,
    }));

    let record = orchestrator.publish().await;

    assert_eq!(record.index, 72);
    assert!(record.tx_hash.starts_with("0x"));
    assert_eq!(
        orchestrator.explorer_url(&record),
        format!("https://explorer.blockdag.network/tx/{}", record.tx_hash)
    );
    assert_eq!(orchestrator.last_publish().await, Some(record));
}
