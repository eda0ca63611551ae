//! Check-cycle scheduler.
//!
//! On a fixed cadence: load the persisted state, probe every monitor
//! sequentially, fold the results into the state, decide and deliver
//! notifications, then persist the state once.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::config::WatchConfig;
use crate::db::{DbError, Store};
use crate::notify::{decide, deliver};
use crate::probe::check_monitor;
use crate::state::StateAggregator;

/// Runs check cycles in the background.
pub struct Scheduler {
    config: Arc<WatchConfig>,
    store: Arc<Store>,
    client: reqwest::Client,
    stop: Arc<Mutex<Option<tokio::sync::broadcast::Sender<()>>>>,
}

impl Scheduler {
    pub fn new(config: Arc<WatchConfig>, store: Arc<Store>) -> Self {
        Self {
            config,
            store,
            client: reqwest::Client::new(),
            stop: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the background check loop.
    pub fn start(&self) {
        let config = self.config.clone();
        let store = self.store.clone();
        let client = self.client.clone();
        let stop = self.stop.clone();

        tokio::spawn(async move {
            let (tx, _) = tokio::sync::broadcast::channel(1);
            {
                let mut stop_guard = stop.lock().await;
                *stop_guard = Some(tx.clone());
            }

            let mut rx = tx.subscribe();
            let mut interval =
                tokio::time::interval(Duration::from_secs(config.check_interval_secs.max(1)));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = rx.recv() => break,
                    _ = interval.tick() => {
                        if let Err(e) = run_check_cycle(&config, &store, &client).await {
                            tracing::error!("Scheduler: check cycle failed: {}", e);
                        }
                    }
                }
            }
        });
    }

    /// Stop the background check loop.
    pub async fn stop(&self) {
        let stop = self.stop.lock().await;
        if let Some(tx) = stop.as_ref() {
            let _ = tx.send(());
        }
    }
}

/// Run one full check cycle over every configured monitor.
pub async fn run_check_cycle(
    config: &WatchConfig,
    store: &Store,
    client: &reqwest::Client,
) -> Result<(), DbError> {
    let state = store.load_state()?.unwrap_or_default();
    let mut aggregator = StateAggregator::new(state);

    for monitor in &config.monitors {
        let now = Utc::now().timestamp();
        let result = check_monitor(monitor, &config.location).await;
        let outcome = aggregator.record_check(&monitor.id, &result, now);

        tracing::debug!(
            "Scheduler: checked {} (up={}, transition={:?})",
            monitor.name,
            result.is_up,
            outcome.transition
        );

        for request in decide(monitor, &outcome, &config.notifications) {
            let Some(channel) = config
                .notifications
                .iter()
                .find(|c| c.id == request.channel_id)
            else {
                continue;
            };

            if let Err(e) = deliver(client, channel, &request).await {
                tracing::error!(
                    "Scheduler: delivery to channel {} failed for {}: {}",
                    channel.id,
                    monitor.name,
                    e
                );
            }
        }
    }

    store.save_state(aggregator.state())?;

    let state = aggregator.state();
    let total = state.overall_up + state.overall_down;
    if total > 0 {
        tracing::info!(
            "Scheduler: cycle complete, {}/{} checks up overall ({:.2}%)",
            state.overall_up,
            total,
            state.overall_up as f64 * 100.0 / total as f64
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_empty_cycle_persists_state() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();
        let config = WatchConfig {
            check_interval_secs: 60,
            location: "local".to_string(),
            monitors: Vec::new(),
            notifications: Vec::new(),
        };

        run_check_cycle(&config, &store, &reqwest::Client::new())
            .await
            .unwrap();

        let state = store.load_state().unwrap().unwrap();
        assert_eq!(state.overall_up, 0);
        assert_eq!(state.overall_down, 0);
    }

    #[tokio::test]
    async fn test_cycle_records_down_monitor() {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();
        let config = WatchConfig {
            check_interval_secs: 60,
            location: "local".to_string(),
            monitors: vec![crate::config::MonitorTarget {
                id: "db".to_string(),
                name: "db".to_string(),
                method: "TCP_PING".to_string(),
                target: "127.0.0.1:1".to_string(),
                expected_codes: None,
                timeout: Some(500),
                headers: None,
                body: None,
                response_keyword: None,
                response_forbidden_keyword: None,
                notifications: None,
            }],
            notifications: Vec::new(),
        };

        run_check_cycle(&config, &store, &reqwest::Client::new())
            .await
            .unwrap();

        let state = store.load_state().unwrap().unwrap();
        assert_eq!(state.overall_down, 1);
        assert!(state.incidents.current_incident("db").is_some());

        // A second cycle extends the same incident.
        run_check_cycle(&config, &store, &reqwest::Client::new())
            .await
            .unwrap();

        let state = store.load_state().unwrap().unwrap();
        assert_eq!(state.overall_down, 2);
        assert_eq!(state.incidents.incidents("db").len(), 1);
    }
}
