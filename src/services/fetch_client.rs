use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiSettings;
use crate::error::{AppError, FetchError};
use crate::models::ProtocolIdentifier;

/// Request paths of the dashboard data API.
pub mod endpoints {
    use super::ProtocolIdentifier;

    pub const ORACLE_FEED: &str = "/api/oracle/feed";
    pub const ADMIN_SETTINGS: &str = "/api/admin/settings";
    pub const UPDATE_WEIGHTS: &str = "/api/admin/updateWeights";
    pub const UPDATE_SOURCES: &str = "/api/admin/updateSources";

    pub fn financial_risk(protocol: &ProtocolIdentifier) -> String {
        format!("/api/risk/{}", urlencoding::encode(protocol.as_str()))
    }

    pub fn sentiment_risk(protocol: &ProtocolIdentifier) -> String {
        format!("/api/sentiment/{}", urlencoding::encode(protocol.as_str()))
    }

    pub fn fusion_result(protocol: &ProtocolIdentifier) -> String {
        format!("/api/fusion/{}", urlencoding::encode(protocol.as_str()))
    }
}

/// Where a value handed to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Live,
    Synthetic,
}

/// A fetched value tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetched<T> {
    pub value: T,
    pub origin: DataOrigin,
}

impl<T> Fetched<T> {
    pub fn live(value: T) -> Self {
        Self {
            value,
            origin: DataOrigin::Live,
        }
    }

    pub fn synthetic(value: T) -> Self {
        Self {
            value,
            origin: DataOrigin::Synthetic,
        }
    }

    pub fn is_live(&self) -> bool {
        self.origin == DataOrigin::Live
    }
}

/// Remote side of the fetch boundary.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, resource: &str) -> Result<serde_json::Value, FetchError>;

    async fn post_json(&self, resource: &str, body: &serde_json::Value) -> Result<(), FetchError>;
}

/// `reqwest` transport rooted at the configured API base URL.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(settings: &ApiSettings) -> Result<Self, AppError> {
        let mut base_url = Url::parse(&settings.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, resource: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(resource.trim_start_matches('/'))
            .map_err(|e| FetchError::Transport(format!("invalid resource {}: {}", resource, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, resource: &str) -> Result<serde_json::Value, FetchError> {
        let url = self.endpoint(resource)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                resource: resource.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| FetchError::Decode {
                resource: resource.to_string(),
                message: e.to_string(),
            })
    }

    async fn post_json(&self, resource: &str, body: &serde_json::Value) -> Result<(), FetchError> {
        let url = self.endpoint(resource)?;
        let response = self.client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                resource: resource.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

/// Single-attempt fetches that always resolve.
///
/// Transport and decode failures are swallowed here and replaced by the
/// caller's fallback. There is no retry and no backoff.
#[derive(Clone)]
pub struct ResilientFetchClient {
    transport: Arc<dyn Transport>,
}

impl ResilientFetchClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn http(settings: &ApiSettings) -> Result<Self, AppError> {
        Ok(Self::new(Arc::new(HttpTransport::new(settings)?)))
    }

    pub async fn fetch_with_fallback<T, F>(&self, resource: &str, fallback: F) -> T
    where
        T: DeserializeOwned + Send,
        F: FnOnce() -> T + Send,
    {
        self.fetch_tagged(resource, fallback).await.value
    }

    pub async fn fetch_tagged<T, F>(&self, resource: &str, fallback: F) -> Fetched<T>
    where
        T: DeserializeOwned + Send,
        F: FnOnce() -> T + Send,
    {
        match self.try_fetch::<T>(resource).await {
            Ok(value) => {
                debug!(resource = %resource, "Fetched live data");
                Fetched::live(value)
            }
            Err(e) => {
                warn!(
                    resource = %resource,
                    failure = e.kind(),
                    error = %e,
                    "Fetch failed, serving synthetic fallback"
                );
                metrics::increment_counter!(
                    "fusion_fetch_fallback_total",
                    "resource" => resource.to_string()
                );
                Fetched::synthetic(fallback())
            }
        }
    }

    /// Fire a write request. The outcome is reported as a flag and never retried.
    pub async fn post_acknowledged<B: Serialize + Sync>(&self, resource: &str, body: &B) -> bool {
        let body = match serde_json::to_value(body) {
            Ok(body) => body,
            Err(e) => {
                warn!(resource = %resource, error = %e, "Could not encode request body");
                return false;
            }
        };

        match self.transport.post_json(resource, &body).await {
            Ok(()) => true,
            Err(e) => {
                warn!(resource = %resource, failure = e.kind(), error = %e, "Write request failed");
                false
            }
        }
    }

    async fn try_fetch<T: DeserializeOwned>(&self, resource: &str) -> Result<T, FetchError> {
        let body = self.transport.get_json(resource).await?;
        serde_json::from_value(body).map_err(|e| FetchError::Decode {
            resource: resource.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for FailingTransport {
        async fn get_json(&self, _resource: &str) -> Result<serde_json::Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Transport("connection refused".to_string()))
        }

        async fn post_json(&self, _resource: &str, _body: &serde_json::Value) -> Result<(), FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Status {
                resource: "/x".to_string(),
                status: 503,
            })
        }
    }

    struct FixedTransport(serde_json::Value);

    #[async_trait]
    impl Transport for FixedTransport {
        async fn get_json(&self, _resource: &str) -> Result<serde_json::Value, FetchError> {
            Ok(self.0.clone())
        }

        async fn post_json(&self, _resource: &str, _body: &serde_json::Value) -> Result<(), FetchError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_transport_failure_yields_fallback_once() {
        let transport = Arc::new(FailingTransport {
            calls: AtomicUsize::new(0),
        });
        let client = ResilientFetchClient::new(transport.clone());

        let value: Vec<i64> = client.fetch_with_fallback("/api/oracle/feed", || vec![7, 7, 7]).await;

        assert_eq!(value, vec![7, 7, 7]);
        // no retry
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_yields_fallback() {
        let client = ResilientFetchClient::new(Arc::new(FixedTransport(json!({"unexpected": true}))));

        let fetched = client.fetch_tagged::<Vec<i64>, _>("/api/oracle/feed", || vec![1]).await;

        assert_eq!(fetched.value, vec![1]);
        assert_eq!(fetched.origin, DataOrigin::Synthetic);
    }

    #[tokio::test]
    async fn test_success_is_tagged_live_and_skips_fallback() {
        let client = ResilientFetchClient::new(Arc::new(FixedTransport(json!([3, 4]))));

        let fetched = client
            .fetch_tagged::<Vec<i64>, _>("/api/oracle/feed", || panic!("fallback must not run"))
            .await;

        assert!(fetched.is_live());
        assert_eq!(fetched.value, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_overflowing_fusion_weights_yield_fallback() {
        let body = json!({
            "score": 72,
            "weights": {"financial_pct": i64::MAX, "sentiment_pct": 1},
            "confidence": 88,
            "notes": "consensus",
            "trend": []
        });
        let client = ResilientFetchClient::new(Arc::new(FixedTransport(body)));
        let generator = crate::services::SyntheticDataGenerator::seeded(5);

        let fetched = client
            .fetch_tagged::<crate::models::FusionResult, _>("/api/fusion/aegis", || {
                generator.fusion_result()
            })
            .await;

        assert_eq!(fetched.origin, DataOrigin::Synthetic);
        assert_eq!(fetched.value.weights.financial_pct(), 70);
    }

    #[tokio::test]
    async fn test_post_failure_is_reported_as_false() {
        let transport = Arc::new(FailingTransport {
            calls: AtomicUsize::new(0),
        });
        let client = ResilientFetchClient::new(transport.clone());

        assert!(!client.post_acknowledged(endpoints::UPDATE_WEIGHTS, &json!({"a": 1})).await);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        let ok_client = ResilientFetchClient::new(Arc::new(FixedTransport(json!(null))));
        assert!(ok_client.post_acknowledged(endpoints::UPDATE_WEIGHTS, &json!({"a": 1})).await);
    }

    #[test]
    fn test_protocol_id_stays_one_path_segment() {
        let odd = ProtocolIdentifier::new("../admin/settings?x=1#frag");
        let path = endpoints::financial_risk(&odd);
        assert_eq!(path, "/api/risk/..%2Fadmin%2Fsettings%3Fx%3D1%23frag");

        let transport = HttpTransport::new(&ApiSettings {
            base_url: "http://localhost:9000".to_string(),
            timeout_seconds: 5,
        })
        .unwrap();
        let url = transport.endpoint(&path).unwrap();
        assert_eq!(url.path(), "/api/risk/..%2Fadmin%2Fsettings%3Fx%3D1%23frag");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());

        assert_eq!(
            endpoints::sentiment_risk(&ProtocolIdentifier::new("aegis")),
            "/api/sentiment/aegis"
        );
    }

    #[test]
    fn test_http_transport_joins_base_path() {
        let transport = HttpTransport::new(&ApiSettings {
            base_url: "http://localhost:9000/v2".to_string(),
            timeout_seconds: 5,
        })
        .unwrap();

        let url = transport.endpoint("/api/risk/aegis").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/v2/api/risk/aegis");
    }
}
