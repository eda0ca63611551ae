//! TCP connect probe implementation.

use std::time::{Duration, Instant};

use tokio::net::TcpStream;

use super::ProbeError;

/// Connect to `host:port` and report the connect latency in milliseconds.
pub async fn run_tcp_probe(address: &str, timeout: Duration) -> Result<f64, ProbeError> {
    let start = Instant::now();

    match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
        Ok(Ok(_stream)) => Ok(start.elapsed().as_secs_f64() * 1000.0),
        Ok(Err(e)) => Err(ProbeError::Network(e.to_string())),
        Err(_) => Err(ProbeError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_probe_success() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let ping = run_tcp_probe(&addr.to_string(), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(ping >= 0.0);
    }

    #[tokio::test]
    async fn test_tcp_probe_refused() {
        let result = run_tcp_probe("127.0.0.1:1", Duration::from_secs(1)).await;
        assert!(result.is_err());
    }
}
