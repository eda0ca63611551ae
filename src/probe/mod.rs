//! Probe module: issues the HTTP/TCP check for a monitor.

mod http;
mod tcp;

pub use http::*;
pub use tcp::*;

use std::time::Duration;
use thiserror::Error;

use crate::config::MonitorTarget;
use crate::state::CheckResult;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Probe error types. Error display strings become the incident reason.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),
    #[error("response does not contain expected keyword")]
    KeywordMissing,
    #[error("response contains forbidden keyword")]
    ForbiddenKeyword,
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Run one check for a monitor.
///
/// Never fails: probe errors become a down result carrying the error text as
/// the reason. Latency is reported in milliseconds.
pub async fn check_monitor(monitor: &MonitorTarget, loc: &str) -> CheckResult {
    // Jitter to avoid thundering herd
    let jitter = rand::random::<u64>() % 100;
    tokio::time::sleep(Duration::from_millis(jitter)).await;

    let timeout = Duration::from_millis(monitor.timeout.unwrap_or(DEFAULT_TIMEOUT_MS));
    let result = if monitor.method == "TCP_PING" {
        run_tcp_probe(&monitor.target, timeout).await
    } else {
        run_http_probe(monitor, timeout).await
    };

    match result {
        Ok(ping) => CheckResult {
            is_up: true,
            ping: Some(ping),
            loc: loc.to_string(),
            reason: None,
        },
        Err(e) => {
            tracing::warn!("Probe failed for {}: {}", monitor.name, e);
            CheckResult {
                is_up: false,
                ping: None,
                loc: loc.to_string(),
                reason: Some(e.to_string()),
            }
        }
    }
}
