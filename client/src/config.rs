//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use songjam_types::VoteLimits;
use songjam_utils::{LogFormat, RetryPolicy};

use crate::award_show::AwardShow;
use crate::SessionError;

/// Configuration for the voting client.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Remote table store and auth provider.
    #[serde(default)]
    pub store: StoreConfig,

    /// Ballot limits and whether voting is still open.
    #[serde(default)]
    pub voting: VotingConfig,

    /// Backoff for every remote call.
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Shown once voting has closed.
    #[serde(default)]
    pub award_show: AwardShow,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the hosted store, without a trailing slash.
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Public (anonymous) API key sent with every request.
    #[serde(default)]
    pub anon_key: String,

    /// Where the OAuth provider sends the user back after sign-in.
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,

    #[serde(default = "default_oauth_provider")]
    pub oauth_provider: String,

    #[serde(default = "default_votes_table")]
    pub votes_table: String,

    #[serde(default = "default_entries_table")]
    pub entries_table: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VotingConfig {
    #[serde(flatten)]
    pub limits: VoteLimits,

    /// Once set, ballots are read-only and the award show screen is shown.
    #[serde(default)]
    pub closed: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_url() -> String {
    "http://127.0.0.1:54321".to_string()
}

fn default_redirect_url() -> String {
    "http://127.0.0.1:8080/".to_string()
}

fn default_oauth_provider() -> String {
    "twitch".to_string()
}

fn default_votes_table() -> String {
    "votes".to_string()
}

fn default_entries_table() -> String {
    "songs".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SessionError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, SessionError> {
        let config: Self = toml::from_str(s).map_err(|e| SessionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, SessionError> {
        toml::to_string_pretty(self).map_err(|e| SessionError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        self.voting.limits.validate()?;
        if self.store.url.trim().is_empty() {
            return Err(SessionError::Config("store.url must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            store: StoreConfig::default(),
            voting: VotingConfig::default(),
            retry: RetryPolicy::default(),
            award_show: AwardShow::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            anon_key: String::new(),
            redirect_url: default_redirect_url(),
            oauth_provider: default_oauth_provider(),
            votes_table: default_votes_table(),
            entries_table: default_entries_table(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
