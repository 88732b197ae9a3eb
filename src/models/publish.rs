use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the last simulated oracle publish. Lives in session memory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub index: i64,
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
}

impl PublishRecord {
    pub fn explorer_url(&self, explorer_base_url: &str) -> String {
        format!("{}/{}", explorer_base_url.trim_end_matches('/'), self.tx_hash)
    }
}
