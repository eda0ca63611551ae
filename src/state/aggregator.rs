//! State aggregation: folds probe results into the monitor state and reports
//! up/down transitions.

use serde::{Deserialize, Serialize};

use super::{IncidentLedger, Sample, TimeSeriesStore};

/// The full mutable state of the monitoring deployment.
///
/// Serializes to the same JSON shape the upstream worker stores in KV
/// (camelCase keys, `incident` and `latency` maps keyed by target ID), so an
/// existing snapshot can be imported as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorState {
    /// Timestamp of the last successful state mutation.
    pub last_update: i64,
    /// Total up check outcomes across all targets.
    pub overall_up: u64,
    /// Total down check outcomes across all targets.
    pub overall_down: u64,
    #[serde(rename = "incident")]
    pub incidents: IncidentLedger,
    pub latency: TimeSeriesStore,
}

/// Per-check observation supplied by the probe collaborator.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub is_up: bool,
    /// Measured latency in milliseconds; unset when the probe failed before
    /// anything could be timed.
    pub ping: Option<f64>,
    /// Location label of the prober.
    pub loc: String,
    pub reason: Option<String>,
}

/// Direction of the up/down state change observed by a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    UnchangedUp,
    UnchangedDown,
    BecameDown,
    BecameUp,
}

/// Result of folding one check into the state.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub transition: Transition,
    /// First down-probe timestamp of the relevant incident; equal to `now`
    /// when no incident applies.
    pub incident_start: i64,
    pub now: i64,
    pub reason: String,
}

/// Owns the monitor state and exposes the single mutation entry point.
pub struct StateAggregator {
    state: MonitorState,
}

impl StateAggregator {
    pub fn new(state: MonitorState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn into_state(self) -> MonitorState {
        self.state
    }

    /// Fold one probe result into the state.
    ///
    /// Updates the latency series (when a latency was measured), the overall
    /// counters and the incident ledger, and reports which transition the
    /// check represents. A target with no open incident is considered UP,
    /// including on first observation.
    pub fn record_check(
        &mut self,
        target_id: &str,
        result: &CheckResult,
        now: i64,
    ) -> TransitionOutcome {
        if let Some(ping) = result.ping {
            self.state.latency.append(
                target_id,
                Sample {
                    loc: result.loc.clone(),
                    ping,
                    time: now,
                },
            );
        }

        if result.is_up {
            self.state.overall_up += 1;
        } else {
            self.state.overall_down += 1;
        }

        let reason = result.reason.clone().unwrap_or_default();
        let open_start = self
            .state
            .incidents
            .current_incident(target_id)
            .map(|i| i.started_at());

        let outcome = match (result.is_up, open_start) {
            (true, None) => TransitionOutcome {
                transition: Transition::UnchangedUp,
                incident_start: now,
                now,
                reason,
            },
            (true, Some(started)) => {
                // Guarded by open_start, so this cannot fail.
                if let Err(e) = self.state.incidents.close_incident(target_id, now) {
                    tracing::error!("StateAggregator: {}", e);
                }
                TransitionOutcome {
                    transition: Transition::BecameUp,
                    incident_start: started,
                    now,
                    reason,
                }
            }
            (false, None) => {
                let started = self.state.incidents.open_incident(target_id, now, &reason);
                TransitionOutcome {
                    transition: Transition::BecameDown,
                    incident_start: started,
                    now,
                    reason,
                }
            }
            (false, Some(_)) => {
                let started = self.state.incidents.open_incident(target_id, now, &reason);
                TransitionOutcome {
                    transition: Transition::UnchangedDown,
                    incident_start: started,
                    now,
                    reason,
                }
            }
        };

        self.state.last_update = now;
        outcome
    }
}
