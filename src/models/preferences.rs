use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::protocol::ProtocolIdentifier;
use super::weights::{FusionWeights, SourceFlags, SourceWeights};

/// Fusion Risk Index above which the user wants to be alerted (0–100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct AlertThreshold(u8);

impl AlertThreshold {
    pub fn new(value: u8) -> Option<Self> {
        (value <= 100).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for AlertThreshold {
    fn default() -> Self {
        Self(75)
    }
}

impl TryFrom<i64> for AlertThreshold {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(AlertThreshold::new)
            .ok_or_else(|| format!("alert threshold must be within 0-100, got {}", value))
    }
}

impl From<AlertThreshold> for i64 {
    fn from(threshold: AlertThreshold) -> Self {
        i64::from(threshold.0)
    }
}

/// Poll interval for dashboard refreshes, 5–120 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RefreshInterval(u32);

impl RefreshInterval {
    pub const MIN_SECONDS: u32 = 5;
    pub const MAX_SECONDS: u32 = 120;

    pub fn new(seconds: u32) -> Option<Self> {
        (Self::MIN_SECONDS..=Self::MAX_SECONDS)
            .contains(&seconds)
            .then_some(Self(seconds))
    }

    pub fn seconds(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl Default for RefreshInterval {
    fn default() -> Self {
        Self(30)
    }
}

impl TryFrom<i64> for RefreshInterval {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(RefreshInterval::new)
            .ok_or_else(|| format!("refresh interval must be within 5-120 seconds, got {}", value))
    }
}

impl From<RefreshInterval> for i64 {
    fn from(interval: RefreshInterval) -> Self {
        i64::from(interval.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub price: bool,
    #[serde(rename = "riskDelta")]
    pub risk_delta: bool,
    pub onchain: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            price: true,
            risk_delta: true,
            onchain: false,
        }
    }
}

/// Immutable view of every user preference, read once from the store and
/// handed to aggregation and orchestration explicitly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreferenceSnapshot {
    pub sources: SourceFlags,
    pub source_weights: SourceWeights,
    pub fusion_weights: FusionWeights,
    pub watchlist: Vec<ProtocolIdentifier>,
    pub notifications: NotificationPreferences,
    pub alert_threshold: AlertThreshold,
    pub refresh_interval: RefreshInterval,
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_threshold_bounds() {
        assert!(AlertThreshold::new(100).is_some());
        assert!(AlertThreshold::new(101).is_none());
        assert!(serde_json::from_str::<AlertThreshold>("150").is_err());
        assert!(serde_json::from_str::<AlertThreshold>("-1").is_err());
        assert_eq!(serde_json::from_str::<AlertThreshold>("80").unwrap().value(), 80);
    }

    #[test]
    fn test_refresh_interval_bounds() {
        assert!(RefreshInterval::new(4).is_none());
        assert!(RefreshInterval::new(121).is_none());
        assert_eq!(RefreshInterval::new(60).unwrap().as_duration(), Duration::from_secs(60));
        assert!(serde_json::from_str::<RefreshInterval>("3").is_err());
    }

    #[test]
    fn test_notification_wire_names() {
        let json = serde_json::to_value(NotificationPreferences::default()).unwrap();
        assert_eq!(json["riskDelta"], true);
        assert_eq!(json["onchain"], false);
    }

    #[test]
    fn test_theme_wire_names() {
        assert_eq!(serde_json::to_string(&Theme::Light).unwrap(), "\"light\"");
        assert!(serde_json::from_str::<Theme>("\"sepia\"").is_err());
    }
}
