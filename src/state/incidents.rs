//! Per-target ledger of downtime windows.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Ledger error types.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("no open incident for target {0}")]
    NoOpenIncident(String),
}

/// One downtime window for a target.
///
/// `start` and `error` are parallel sequences: one entry per down-probe
/// observed while the window was open. `end` is unset exactly while the
/// incident is the open one for its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub start: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    pub error: Vec<String>,
}

impl Incident {
    /// Timestamp of the first down-probe of this window.
    pub fn started_at(&self) -> i64 {
        self.start.first().copied().unwrap_or_default()
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// Ordered downtime windows per target. Incidents are never merged or
/// deleted; at most one is open per target, and the open one is always the
/// last element of its target's list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentLedger {
    by_target: HashMap<String, Vec<Incident>>,
}

impl IncidentLedger {
    /// Record a down observation at `time`.
    ///
    /// Extends the open incident when one exists (a repeated down-probe is a
    /// continuation, not a new incident), otherwise opens a fresh one.
    /// Returns the incident's first down timestamp.
    pub fn open_incident(&mut self, target_id: &str, time: i64, reason: &str) -> i64 {
        let list = self.by_target.entry(target_id.to_string()).or_default();
        match list.last_mut().filter(|i| i.is_open()) {
            Some(open) => {
                open.start.push(time);
                open.error.push(reason.to_string());
                open.started_at()
            }
            None => {
                list.push(Incident {
                    start: vec![time],
                    end: None,
                    error: vec![reason.to_string()],
                });
                time
            }
        }
    }

    /// Close the open incident at `time`.
    pub fn close_incident(&mut self, target_id: &str, time: i64) -> Result<(), LedgerError> {
        let open = self
            .by_target
            .get_mut(target_id)
            .and_then(|list| list.last_mut())
            .filter(|i| i.is_open())
            .ok_or_else(|| LedgerError::NoOpenIncident(target_id.to_string()))?;
        open.end = Some(time);
        Ok(())
    }

    /// The currently open incident, if any. The open incident is always the
    /// last element of its target's list, so this is a constant-time lookup.
    pub fn current_incident(&self, target_id: &str) -> Option<&Incident> {
        self.by_target
            .get(target_id)
            .and_then(|list| list.last())
            .filter(|i| i.is_open())
    }

    /// All recorded incidents for a target, oldest first.
    pub fn incidents(&self, target_id: &str) -> &[Incident] {
        self.by_target
            .get(target_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close() {
        let mut ledger = IncidentLedger::default();

        let started = ledger.open_incident("api", 100, "timeout");
        assert_eq!(started, 100);
        assert!(ledger.current_incident("api").is_some());

        ledger.close_incident("api", 400).unwrap();
        assert!(ledger.current_incident("api").is_none());

        let incidents = ledger.incidents("api");
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].end, Some(400));
    }

    #[test]
    fn test_repeated_down_extends_open_incident() {
        let mut ledger = IncidentLedger::default();

        assert_eq!(ledger.open_incident("api", 100, "timeout"), 100);
        assert_eq!(ledger.open_incident("api", 160, "refused"), 100);
        assert_eq!(ledger.open_incident("api", 220, "timeout"), 100);

        let incidents = ledger.incidents("api");
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].start, vec![100, 160, 220]);
        assert_eq!(incidents[0].error, vec!["timeout", "refused", "timeout"]);
        assert!(incidents[0].is_open());
    }

    #[test]
    fn test_at_most_one_open_incident() {
        let mut ledger = IncidentLedger::default();

        for t in [100, 200, 300] {
            ledger.open_incident("api", t, "down");
            let open: Vec<_> = ledger
                .incidents("api")
                .iter()
                .filter(|i| i.is_open())
                .collect();
            assert_eq!(open.len(), 1);
        }

        ledger.close_incident("api", 400).unwrap();
        ledger.open_incident("api", 500, "down again");

        let incidents = ledger.incidents("api");
        assert_eq!(incidents.len(), 2);
        assert!(incidents.last().unwrap().is_open());
    }

    #[test]
    fn test_close_without_open_fails() {
        let mut ledger = IncidentLedger::default();
        assert_eq!(
            ledger.close_incident("api", 100),
            Err(LedgerError::NoOpenIncident("api".to_string()))
        );

        ledger.open_incident("api", 100, "down");
        ledger.close_incident("api", 200).unwrap();
        assert!(ledger.close_incident("api", 300).is_err());
    }

    #[test]
    fn test_targets_are_independent() {
        let mut ledger = IncidentLedger::default();
        ledger.open_incident("api", 100, "down");

        assert!(ledger.current_incident("web").is_none());
        assert!(ledger.close_incident("web", 200).is_err());
        assert!(ledger.current_incident("api").is_some());
    }
}
