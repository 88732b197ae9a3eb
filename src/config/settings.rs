use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub dashboard: DashboardSettings,
    pub logging: LoggingSettings,
}

/// Remote data API that backs the live side of every fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// JSON file holding user preferences. `None` keeps them in memory.
    pub preferences_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSettings {
    pub default_protocol: String,
    pub explorer_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api: ApiSettings::default(),
            storage: StorageSettings::default(),
            dashboard: DashboardSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            preferences_path: None,
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings {
            default_protocol: "aegis".to_string(),
            explorer_base_url: "https://explorer.blockdag.network/tx/".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Settings {
    /// Layer built-in defaults, an optional `config/default` file and
    /// `FUSION_`-prefixed environment variables (`FUSION_API__BASE_URL`, ...).
    pub fn new() -> Result<Self, AppError> {
        let settings: Settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("FUSION")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        url::Url::parse(&self.api.base_url)?;

        if self.api.timeout_seconds == 0 {
            return Err(AppError::ConfigError(
                "api.timeout_seconds must be greater than zero".to_string(),
            ));
        }

        if self.dashboard.default_protocol.trim().is_empty() {
            return Err(AppError::ConfigError(
                "dashboard.default_protocol must not be empty".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "compact" | "pretty" | "full") {
            return Err(AppError::ConfigError(format!(
                "logging.format must be compact, pretty or full, got {}",
                self.logging.format
            )));
        }

        Ok(())
    }
}
