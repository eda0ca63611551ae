//! Configuration module for flarewatch.
//!
//! Runtime settings come from environment variables; monitors and
//! notification channels are loaded once at startup from a JSON file and are
//! never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::{env, fs};
use thiserror::Error;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Runtime settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the JSON watch configuration (default: "flarewatch.json")
    pub config_path: String,
    /// Path to the SQLite state database (default: "flarewatch.db")
    pub db_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_path: "flarewatch.json".to_string(),
            db_path: "flarewatch.db".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load settings from environment variables.
    ///
    /// Environment variables:
    /// - `FLAREWATCH_CONFIG`: watch config file path (default: "flarewatch.json")
    /// - `FLAREWATCH_DB_PATH`: database file path (default: "flarewatch.db")
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(path) = env::var("FLAREWATCH_CONFIG") {
            cfg.config_path = path;
        }
        if let Ok(path) = env::var("FLAREWATCH_DB_PATH") {
            cfg.db_path = path;
        }

        cfg
    }
}

/// A monitored target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorTarget {
    pub id: String,
    pub name: String,
    /// `"TCP_PING"` or an HTTP method such as `GET` or `POST`.
    pub method: String,
    /// URL for HTTP monitors, `host:port` for TCP monitors.
    pub target: String,
    /// Accepted HTTP status codes; any 2xx when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_codes: Option<Vec<u16>>,
    /// Probe timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// The response body must contain this string for the check to pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_keyword: Option<String>,
    /// The response body must not contain this string for the check to pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_forbidden_keyword: Option<String>,
    /// Channel IDs to notify for this monitor; all configured channels when
    /// unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<String>>,
}

/// A notification channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationChannel {
    pub id: String,
    /// IANA time zone used in rendered messages (default: "Etc/GMT").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    /// Minutes a target must be down before this channel is notified;
    /// immediate notification when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<u32>,
    #[serde(flatten)]
    pub kind: ChannelKind,
}

/// Transport-specific channel parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelKind {
    #[serde(rename_all = "camelCase")]
    Apprise {
        apprise_api_server: String,
        recipient_url: String,
    },
    #[serde(rename_all = "camelCase")]
    Webhook {
        url: String,
        /// HTTP method, defaults to POST.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<HashMap<String, String>>,
    },
}

/// The full watch configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchConfig {
    /// Seconds between check cycles (default: 60).
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Label recorded as the `loc` of every latency sample (default: "local").
    #[serde(default = "default_location")]
    pub location: String,
    pub monitors: Vec<MonitorTarget>,
    #[serde(default)]
    pub notifications: Vec<NotificationChannel>,
}

fn default_check_interval() -> u64 {
    60
}

fn default_location() -> String {
    "local".to_string()
}

impl WatchConfig {
    /// Load the watch configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().display().to_string();
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path_str.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path_str,
            source,
        })
    }
}
