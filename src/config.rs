//! Configuration file parser for ~/.config/instafeed/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// Config path names a directory or other non-regular file.
    #[error("Config path is not a regular file: {0}")]
    NotAFile(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Settings for the Instagram client.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Custom Debug impl masks `client_secret`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Instagram app client id.
    pub client_id: String,

    /// Instagram app client secret.
    pub client_secret: String,

    /// Path of the OAuth callback route, relative to the base URL.
    pub auth_callback_route: String,

    /// Public base URL for building the callback. Falls back to `app_url`.
    pub base_url: Option<String>,

    /// Application URL used when `base_url` is unset.
    pub app_url: String,

    /// Drop VIDEO records from fetched feeds.
    pub ignore_video: bool,

    /// OAuth API host (override for testing).
    pub api_base_url: String,

    /// Graph API host (override for testing).
    pub graph_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            auth_callback_route: "instagram/auth/callback".to_string(),
            base_url: None,
            app_url: "http://localhost".to_string(),
            ignore_video: false,
            api_base_url: "https://api.instagram.com".to_string(),
            graph_base_url: "https://graph.instagram.com".to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &(!self.client_secret.is_empty()).then_some("[REDACTED]"),
            )
            .field("auth_callback_route", &self.auth_callback_route)
            .field("base_url", &self.base_url)
            .field("app_url", &self.app_url)
            .field("ignore_video", &self.ignore_video)
            .field("api_base_url", &self.api_base_url)
            .field("graph_base_url", &self.graph_base_url)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "client_id",
        "client_secret",
        "auth_callback_route",
        "base_url",
        "app_url",
        "ignore_video",
        "api_base_url",
        "graph_base_url",
    ];

    /// Load configuration from a TOML file.
    ///
    /// A missing or blank file yields the defaults. Anything that is not a
    /// regular file, or is larger than `MAX_FILE_SIZE`, is rejected. Unknown
    /// keys are accepted and logged.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        // Size and kind come from the open handle, not a second path lookup.
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(ConfigError::NotAFile(path.display().to_string()));
        }
        if meta.len() > Self::MAX_FILE_SIZE {
            return Err(Self::too_large(meta.len()));
        }

        // The file may grow after the metadata call.
        let mut content = String::new();
        file.take(Self::MAX_FILE_SIZE + 1)
            .read_to_string(&mut content)?;
        if content.len() as u64 > Self::MAX_FILE_SIZE {
            return Err(Self::too_large(content.len() as u64));
        }

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        Self::warn_unknown_keys(&content);

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            ignore_video = config.ignore_video,
            has_client_id = !config.client_id.is_empty(),
            "Loaded configuration"
        );
        Ok(config)
    }

    fn too_large(len: u64) -> ConfigError {
        ConfigError::TooLarge(format!(
            "{} bytes exceeds the {} byte limit",
            len,
            Self::MAX_FILE_SIZE
        ))
    }

    /// Typos still parse (every field has a default), so flag them here.
    fn warn_unknown_keys(content: &str) {
        let Ok(table) = content.parse::<toml::Table>() else {
            return;
        };
        table
            .keys()
            .filter(|key| !Self::KNOWN_KEYS.contains(&key.as_str()))
            .for_each(|key| tracing::warn!(key = %key, "Unknown key in config file, ignoring"));
    }

    /// Overrides client credentials from `INSTAGRAM_CLIENT_ID` / `INSTAGRAM_CLIENT_SECRET`.
    /// Env vars take precedence over the config file.
    pub fn apply_env(mut self) -> Self {
        self.apply_overrides(
            std::env::var("INSTAGRAM_CLIENT_ID").ok(),
            std::env::var("INSTAGRAM_CLIENT_SECRET").ok(),
        );
        self
    }

    fn apply_overrides(&mut self, client_id: Option<String>, client_secret: Option<String>) {
        if let Some(id) = client_id.filter(|v| !v.is_empty()) {
            self.client_id = id;
        }
        if let Some(secret) = client_secret.filter(|v| !v.is_empty()) {
            self.client_secret = secret;
        }
    }

    /// Base URL the OAuth callback is served under.
    pub fn callback_base(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(self.app_url.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
