//! Decides which channels are notified for a transition outcome.

use crate::config::{MonitorTarget, NotificationChannel};
use crate::state::{Transition, TransitionOutcome};

use super::format::format_status_change;

/// Slack subtracted from grace boundaries so a check that lands just short of
/// the boundary due to scheduler jitter still fires.
const GRACE_SLACK_SECS: i64 = 30;

const DEFAULT_TIME_ZONE: &str = "Etc/GMT";

/// A notification ready for delivery to one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub channel_id: String,
    pub title: String,
    pub body: String,
}

/// Decide which notifications to dispatch for `outcome`.
///
/// The channel set is the monitor's explicit `notifications` list, or every
/// configured channel when unset. Channels referencing unknown IDs are
/// skipped with a warning; a skipped channel never blocks the others.
///
/// Down-direction dispatches (`BecameDown` and `UnchangedDown`) are
/// suppressed while `downtime < grace*60 - 30`; the decision is re-evaluated
/// on every still-down tick, so a notification whose grace period elapses
/// between checks fires on the next one. An up-direction dispatch is
/// suppressed while `downtime < (grace+1)*60 - 30`: a recovery message is
/// only worth sending if a down message would plausibly have gone out.
/// `UnchangedUp` never dispatches.
pub fn decide(
    monitor: &MonitorTarget,
    outcome: &TransitionOutcome,
    channels: &[NotificationChannel],
) -> Vec<DispatchRequest> {
    if outcome.transition == Transition::UnchangedUp {
        return Vec::new();
    }

    let channel_ids: Vec<&str> = match &monitor.notifications {
        Some(ids) => ids.iter().map(String::as_str).collect(),
        None => channels.iter().map(|c| c.id.as_str()).collect(),
    };
    if channel_ids.is_empty() {
        tracing::debug!("Decider: no channels configured for monitor {}", monitor.name);
        return Vec::new();
    }

    let downtime = outcome.now - outcome.incident_start;
    let mut requests = Vec::new();

    for id in channel_ids {
        let Some(channel) = channels.iter().find(|c| c.id == id) else {
            tracing::warn!(
                "Decider: channel {:?} referenced by monitor {} is not configured, skipping",
                id,
                monitor.name
            );
            continue;
        };

        if let Some(grace) = channel.grace_period {
            let grace = i64::from(grace);
            let suppressed = match outcome.transition {
                Transition::BecameDown | Transition::UnchangedDown => {
                    downtime < grace * 60 - GRACE_SLACK_SECS
                }
                Transition::BecameUp => downtime < (grace + 1) * 60 - GRACE_SLACK_SECS,
                Transition::UnchangedUp => true,
            };
            if suppressed {
                tracing::info!(
                    "Decider: grace period ({}m) not met for {} on channel {}, skipping",
                    grace,
                    monitor.name,
                    channel.id
                );
                continue;
            }
        }

        let time_zone = channel.time_zone.as_deref().unwrap_or(DEFAULT_TIME_ZONE);
        let message = format_status_change(&monitor.name, outcome, time_zone);
        requests.push(DispatchRequest {
            channel_id: channel.id.clone(),
            title: message.title,
            body: message.body,
        });
    }

    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelKind;
    use crate::state::{CheckResult, MonitorState, StateAggregator};

    fn monitor(notifications: Option<Vec<String>>) -> MonitorTarget {
        MonitorTarget {
            id: "api".to_string(),
            name: "api".to_string(),
            method: "GET".to_string(),
            target: "https://api.example.com".to_string(),
            expected_codes: None,
            timeout: None,
            headers: None,
            body: None,
            response_keyword: None,
            response_forbidden_keyword: None,
            notifications,
        }
    }

    fn channel(id: &str, grace_period: Option<u32>) -> NotificationChannel {
        NotificationChannel {
            id: id.to_string(),
            time_zone: None,
            grace_period,
            kind: ChannelKind::Webhook {
                url: "https://hooks.example.com/x".to_string(),
                method: None,
                headers: None,
            },
        }
    }

    fn outcome(transition: Transition, start: i64, now: i64) -> TransitionOutcome {
        TransitionOutcome {
            transition,
            incident_start: start,
            now,
            reason: "timeout".to_string(),
        }
    }

    fn down(reason: &str) -> CheckResult {
        CheckResult {
            is_up: false,
            ping: None,
            loc: "local".to_string(),
            reason: Some(reason.to_string()),
        }
    }

    #[test]
    fn test_unchanged_up_never_dispatches() {
        let requests = decide(
            &monitor(None),
            &outcome(Transition::UnchangedUp, 100, 100),
            &[channel("ops", None)],
        );
        assert!(requests.is_empty());
    }

    #[test]
    fn test_no_grace_period_dispatches_immediately() {
        let requests = decide(
            &monitor(None),
            &outcome(Transition::BecameDown, 100, 100),
            &[channel("ops", None)],
        );
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].channel_id, "ops");
        assert_eq!(requests[0].title, "🔴 api is currently down.");
    }

    #[test]
    fn test_down_grace_boundary() {
        let channels = [channel("ops", Some(5))];
        let monitor = monitor(None);

        // 5*60 - 30 = 270s boundary.
        let suppressed = decide(
            &monitor,
            &outcome(Transition::UnchangedDown, 0, 269),
            &channels,
        );
        assert!(suppressed.is_empty());

        let fired = decide(
            &monitor,
            &outcome(Transition::UnchangedDown, 0, 270),
            &channels,
        );
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn test_grace_period_reevaluated_on_still_down_ticks() {
        let channels = [channel("ops", Some(10))];
        let monitor = monitor(None);

        // 10*60 - 30 = 570s boundary.
        assert!(decide(
            &monitor,
            &outcome(Transition::UnchangedDown, 0, 500),
            &channels
        )
        .is_empty());
        assert_eq!(
            decide(
                &monitor,
                &outcome(Transition::UnchangedDown, 0, 601),
                &channels
            )
            .len(),
            1
        );
    }

    #[test]
    fn test_up_grace_boundary_has_extra_margin() {
        let channels = [channel("ops", Some(5))];
        let monitor = monitor(None);

        // Up boundary is (5+1)*60 - 30 = 330s.
        assert!(decide(&monitor, &outcome(Transition::BecameUp, 0, 329), &channels).is_empty());
        assert_eq!(
            decide(&monitor, &outcome(Transition::BecameUp, 0, 330), &channels).len(),
            1
        );
    }

    #[test]
    fn test_unknown_channel_skipped_others_processed() {
        let requests = decide(
            &monitor(Some(vec!["missing".to_string(), "ops".to_string()])),
            &outcome(Transition::BecameDown, 100, 100),
            &[channel("ops", None)],
        );
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].channel_id, "ops");
    }

    #[test]
    fn test_monitor_channel_list_limits_dispatch() {
        let channels = [channel("ops", None), channel("page", None)];

        let all = decide(
            &monitor(None),
            &outcome(Transition::BecameDown, 100, 100),
            &channels,
        );
        assert_eq!(all.len(), 2);

        let limited = decide(
            &monitor(Some(vec!["page".to_string()])),
            &outcome(Transition::BecameDown, 100, 100),
            &channels,
        );
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].channel_id, "page");
    }

    #[test]
    fn test_first_down_then_recovery_scenario() {
        let monitor = monitor(None);
        let channels = [channel("ops", None)];
        let mut agg = StateAggregator::new(MonitorState::default());

        let down_outcome = agg.record_check("api", &down("timeout"), 100);
        let requests = decide(&monitor, &down_outcome, &channels);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].title, "🔴 api is currently down.");

        let up_outcome = agg.record_check(
            "api",
            &CheckResult {
                is_up: true,
                ping: Some(20.0),
                loc: "local".to_string(),
                reason: None,
            },
            400,
        );
        let requests = decide(&monitor, &up_outcome, &channels);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].title, "✅ api is up!");
        assert!(requests[0].body.contains("5 minutes"));
    }
}
