//! Dashboard Configuration Settings
//!
//! Configuration types for the dashboard core, loaded from environment
//! variables. Credentials normally come from the credential store at the
//! login boundary; the environment variables exist for headless runs.

use std::path::PathBuf;
use std::time::Duration;

/// Default public stream endpoint (testnet).
const DEFAULT_WS_URL: &str = "wss://stream.testnet.binance.vision/ws";

/// Default REST endpoint (testnet).
const DEFAULT_REST_URL: &str = "https://testnet.binance.vision";

/// Default account snapshot poll interval.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default asset allow-list surfaced in the balance view.
const DEFAULT_ASSETS: [&str; 4] = ["USDT", "ETH", "BTC", "SOL"];

/// Exchange API credentials.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    /// Create new credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if either half of the pair is empty.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        if api_key.is_empty() {
            return Err(ConfigError::EmptyValue("api key".to_string()));
        }
        if api_secret.is_empty() {
            return Err(ConfigError::EmptyValue("api secret".to_string()));
        }

        Ok(Self {
            api_key,
            api_secret,
        })
    }

    /// Get the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the API secret.
    #[must_use]
    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Complete dashboard configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Public stream WebSocket endpoint.
    pub ws_url: String,
    /// REST API base URL.
    pub rest_url: String,
    /// Account snapshot poll interval.
    pub poll_interval: Duration,
    /// Assets surfaced in the balance view.
    pub allowed_assets: Vec<String>,
    /// Directory for the trade mirror and credential store files.
    pub store_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            rest_url: DEFAULT_REST_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            allowed_assets: DEFAULT_ASSETS.iter().map(ToString::to_string).collect(),
            store_dir: PathBuf::from(".dashboard"),
        }
    }
}

impl Settings {
    /// Create settings from environment variables, falling back to defaults
    /// field by field.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ws_url: env_string("DASHBOARD_WS_URL", defaults.ws_url),
            rest_url: env_string("DASHBOARD_REST_URL", defaults.rest_url),
            poll_interval: env_duration_secs("DASHBOARD_POLL_INTERVAL_SECS", defaults.poll_interval),
            allowed_assets: env_list("DASHBOARD_ASSETS", defaults.allowed_assets),
            store_dir: std::env::var("DASHBOARD_STORE_DIR")
                .map_or(defaults.store_dir, PathBuf::from),
        }
    }

    /// Read credentials from `DASHBOARD_API_KEY` / `DASHBOARD_API_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns an error when either variable is missing or empty.
    pub fn credentials_from_env() -> Result<Credentials, ConfigError> {
        let api_key = std::env::var("DASHBOARD_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("DASHBOARD_API_KEY".to_string()))?;
        let api_secret = std::env::var("DASHBOARD_API_SECRET")
            .map_err(|_| ConfigError::MissingEnvVar("DASHBOARD_API_SECRET".to_string()))?;
        Credentials::new(api_key, api_secret)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// A required value was empty.
    #[error("{0} cannot be empty")]
    EmptyValue(String),
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

fn env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn env_list(key: &str, default: Vec<String>) -> Vec<String> {
    std::env::var(key)
        .ok()
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|list| !list.is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_testnet() {
        let settings = Settings::default();
        assert!(settings.ws_url.contains("testnet"));
        assert!(settings.rest_url.contains("testnet"));
        assert_eq!(settings.poll_interval, Duration::from_secs(30));
        assert_eq!(settings.allowed_assets.len(), 4);
    }

    #[test]
    fn credentials_reject_empty_halves() {
        assert!(Credentials::new("", "secret").is_err());
        assert!(Credentials::new("key", "").is_err());
        assert!(Credentials::new("key", "secret").is_ok());
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials::new("key123", "secret456").unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("key123"));
        assert!(!debug.contains("secret456"));
        assert!(debug.contains("[REDACTED]"));
    }
}
