use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::StorageSettings;
use crate::error::AppError;
use crate::models::{
    AlertThreshold, FusionWeights, NotificationPreferences, PreferenceSnapshot, ProtocolIdentifier,
    RefreshInterval, SourceFlags, SourceWeights, Theme,
};

/// Logical setting keys, each stored as an independent entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    SentimentSources,
    SentimentWeights,
    FusionWeights,
    Watchlist,
    Notifications,
    RiskThreshold,
    RefreshInterval,
    Theme,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 8] = [
        PreferenceKey::SentimentSources,
        PreferenceKey::SentimentWeights,
        PreferenceKey::FusionWeights,
        PreferenceKey::Watchlist,
        PreferenceKey::Notifications,
        PreferenceKey::RiskThreshold,
        PreferenceKey::RefreshInterval,
        PreferenceKey::Theme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceKey::SentimentSources => "sx.sent.sources",
            PreferenceKey::SentimentWeights => "sx.sent.weights",
            PreferenceKey::FusionWeights => "sx.fusion.weights",
            PreferenceKey::Watchlist => "sx.watchlist",
            PreferenceKey::Notifications => "sx.settings.notif",
            PreferenceKey::RiskThreshold => "sx.settings.risk",
            PreferenceKey::RefreshInterval => "sx.settings.refresh",
            PreferenceKey::Theme => "sx.settings.theme",
        }
    }
}

/// Durable key/value substrate under the preference store.
pub trait StorageBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Value>, AppError>;

    fn write(&self, key: &str, value: Value) -> Result<(), AppError>;
}

/// Process-local storage.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<Value>, AppError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: Value) -> Result<(), AppError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// A single JSON object on disk, one member per key.
///
/// Writes rewrite the whole object but keep every member they did not touch,
/// including keys this crate does not know about. A file that no longer parses
/// is moved aside to `<path>.corrupt` on the next write and replaced by a
/// fresh object.
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

enum FileContents {
    Entries(Map<String, Value>),
    Corrupt(String),
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable file is kept once a write replaces it.
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    fn load(&self) -> Result<FileContents, AppError> {
        if !self.path.exists() {
            return Ok(FileContents::Entries(Map::new()));
        }

        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(FileContents::Entries(Map::new()));
        }

        Ok(match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(entries)) => FileContents::Entries(entries),
            Ok(_) => FileContents::Corrupt("does not hold a JSON object".to_string()),
            Err(e) => FileContents::Corrupt(format!("is not valid JSON: {}", e)),
        })
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> Result<Option<Value>, AppError> {
        match self.load()? {
            FileContents::Entries(entries) => Ok(entries.get(key).cloned()),
            FileContents::Corrupt(reason) => Err(AppError::StorageError(format!(
                "{} {}",
                self.path.display(),
                reason
            ))),
        }
    }

    fn write(&self, key: &str, value: Value) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = match self.load()? {
            FileContents::Entries(entries) => entries,
            FileContents::Corrupt(reason) => {
                let corrupt_path = self.corrupt_path();
                fs::rename(&self.path, &corrupt_path)?;
                warn!(
                    path = %self.path.display(),
                    moved_to = %corrupt_path.display(),
                    reason = %reason,
                    "Preference file unreadable, starting a fresh one"
                );
                Map::new()
            }
        };
        entries.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(&Value::Object(entries))?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Typed access to user preferences.
///
/// Reads never fail: a missing key, an undecodable value or an unavailable
/// backend all yield the caller's default. Writes are synchronous and
/// fire-and-forget; failures are logged and dropped.
#[derive(Clone)]
pub struct PreferenceStore {
    backend: Arc<dyn StorageBackend>,
}

impl PreferenceStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn from_settings(settings: &StorageSettings) -> Self {
        match &settings.preferences_path {
            Some(path) => Self::new(Arc::new(FileStorage::new(path))),
            None => Self::in_memory(),
        }
    }

    /// Read any key of the flat namespace.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.backend.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                warn!(key = %key, error = %e, "Preference storage unavailable, using default");
                return default;
            }
        };

        match serde_json::from_value(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Stored preference is invalid, using default");
                default
            }
        }
    }

    /// Write any key of the flat namespace.
    pub fn set_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key = %key, error = %e, "Could not encode preference");
                return;
            }
        };

        match self.backend.write(key, encoded) {
            Ok(()) => debug!(key = %key, "Preference saved"),
            Err(e) => warn!(key = %key, error = %e, "Failed to persist preference"),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: PreferenceKey, default: T) -> T {
        self.get_value(key.as_str(), default)
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: PreferenceKey, value: &T) {
        self.set_value(key.as_str(), value)
    }

    /// Read-modify-write of a single key; returns the value written.
    pub fn update<T, F>(&self, key: PreferenceKey, default: T, f: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T),
    {
        let mut value = self.get(key, default);
        f(&mut value);
        self.set(key, &value);
        value
    }

    pub fn snapshot(&self) -> PreferenceSnapshot {
        PreferenceSnapshot {
            sources: self.get(PreferenceKey::SentimentSources, SourceFlags::default()),
            source_weights: self.get(PreferenceKey::SentimentWeights, SourceWeights::default()),
            fusion_weights: self.get(PreferenceKey::FusionWeights, FusionWeights::default()),
            watchlist: self.watchlist(),
            notifications: self.get(PreferenceKey::Notifications, NotificationPreferences::default()),
            alert_threshold: self.get(PreferenceKey::RiskThreshold, AlertThreshold::default()),
            refresh_interval: self.get(PreferenceKey::RefreshInterval, RefreshInterval::default()),
            theme: self.get(PreferenceKey::Theme, Theme::default()),
        }
    }

    pub fn watchlist(&self) -> Vec<ProtocolIdentifier> {
        self.get(PreferenceKey::Watchlist, Vec::new())
    }

    /// Sentiment view save: source toggles and weights only.
    pub fn save_sentiment_preferences(&self, sources: &SourceFlags, weights: &SourceWeights) {
        self.set(PreferenceKey::SentimentSources, sources);
        self.set(PreferenceKey::SentimentWeights, weights);
    }

    /// Account settings view save: notifications, threshold, refresh and theme only.
    pub fn save_account_settings(
        &self,
        notifications: &NotificationPreferences,
        alert_threshold: AlertThreshold,
        refresh_interval: RefreshInterval,
        theme: Theme,
    ) {
        self.set(PreferenceKey::Notifications, notifications);
        self.set(PreferenceKey::RiskThreshold, &alert_threshold);
        self.set(PreferenceKey::RefreshInterval, &refresh_interval);
        self.set(PreferenceKey::Theme, &theme);
    }
}
