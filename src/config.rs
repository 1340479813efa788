use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote CRM settings handed to the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    /// Bearer credential for the CRM API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sub-account that owns newly created contacts
    pub location_id: String,
    /// Base URL of the contacts API
    pub base_url: String,
    /// Base URL of the CRM web app, used for deep links
    pub app_url: String,
    /// Value of the `Version` header
    pub api_version: String,
    /// City sent when a visit has none
    pub default_city: String,
    /// State sent with every contact
    pub state: String,
    /// Tag applied to every contact
    pub prospect_tag: String,
    /// Upper bound on a single remote call, in seconds
    pub timeout_secs: u64,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            location_id: String::new(),
            base_url: "https://services.leadconnectorhq.com".to_string(),
            app_url: "https://app.gohighlevel.com".to_string(),
            api_version: "2021-07-28".to_string(),
            default_city: "Tacoma".to_string(),
            state: "WA".to_string(),
            prospect_tag: "comcast-prospect".to_string(),
            timeout_secs: 30,
        }
    }
}

impl CrmConfig {
    /// Returns true once a location is set; creates are scoped to it.
    pub fn is_configured(&self) -> bool {
        !self.location_id.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// API key shortened for display.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| {
            let prefix: String = key.chars().take(8).collect();
            format!("{}...", prefix)
        })
    }
}

/// HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Remote CRM settings
    pub crm: CrmConfig,
    /// HTTP API settings
    pub server: ServerConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    crm: Option<CrmConfig>,
    server: Option<ServerConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let default_db_path = Self::default_data_dir().join("canvass.db");

        let mut database_path = ConfigValue::new(default_db_path, ConfigSource::Default);
        let mut config_file = None;
        let mut crm = CrmConfig::default();
        let mut server = ServerConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(crm_config) = file_config.crm {
                crm = crm_config;
            }
            if let Some(server_config) = file_config.server {
                server = server_config;
            }
        }

        if let Ok(db_path) = std::env::var("CANVASS_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(token) = std::env::var("CANVASS_GHL_TOKEN") {
            crm.api_key = Some(token);
        }
        if let Ok(location_id) = std::env::var("CANVASS_GHL_LOCATION_ID") {
            crm.location_id = location_id;
        }
        if let Ok(base_url) = std::env::var("CANVASS_GHL_BASE_URL") {
            crm.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("CANVASS_SYNC_TIMEOUT") {
            crm.timeout_secs = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidEnv("CANVASS_SYNC_TIMEOUT", timeout))?;
        }
        if let Ok(host) = std::env::var("CANVASS_HOST") {
            server.host = host;
        }
        if let Ok(port) = std::env::var("CANVASS_PORT") {
            server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidEnv("CANVASS_PORT", port))?;
        }

        Ok(Self {
            database_path,
            config_file,
            crm,
            server,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/canvass/
    /// - macOS: ~/Library/Application Support/canvass/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("canvass")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/canvass/
    /// - macOS: ~/Library/Application Support/canvass/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("canvass")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    ReadError(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),
    #[error("Invalid value for {0}: '{1}'")]
    InvalidEnv(&'static str, String),
}
