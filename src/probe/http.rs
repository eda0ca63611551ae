//! HTTP probe implementation.

use std::time::{Duration, Instant};

use crate::config::MonitorTarget;

use super::ProbeError;

/// Run an HTTP probe for a monitor.
///
/// Returns latency in milliseconds. The clock stops after the full body has
/// been read so slow transfers count against the measurement. The status code
/// must be listed in `expected_codes`, or be any 2xx when unset; keyword
/// checks run against the body text.
pub async fn run_http_probe(
    monitor: &MonitorTarget,
    timeout: Duration,
) -> Result<f64, ProbeError> {
    let method = reqwest::Method::from_bytes(monitor.method.as_bytes())
        .map_err(|_| ProbeError::Config(format!("unknown HTTP method: {}", monitor.method)))?;

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProbeError::Network(e.to_string()))?;

    let mut request = client.request(method, &monitor.target);
    if let Some(headers) = &monitor.headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    if let Some(body) = &monitor.body {
        request = request.body(body.clone());
    }

    let start = Instant::now();

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProbeError::Timeout(timeout)
        } else {
            ProbeError::Network(e.to_string())
        }
    })?;

    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            ProbeError::Timeout(timeout)
        } else {
            ProbeError::Network(e.to_string())
        }
    })?;

    let elapsed = start.elapsed().as_secs_f64() * 1000.0;

    let status_ok = match &monitor.expected_codes {
        Some(codes) => codes.contains(&status),
        None => (200..300).contains(&status),
    };
    if !status_ok {
        return Err(ProbeError::UnexpectedStatus(status));
    }

    if let Some(keyword) = &monitor.response_keyword {
        if !body.contains(keyword) {
            return Err(ProbeError::KeywordMissing);
        }
    }
    if let Some(keyword) = &monitor.response_forbidden_keyword {
        if body.contains(keyword) {
            return Err(ProbeError::ForbiddenKeyword);
        }
    }

    Ok(elapsed)
}
