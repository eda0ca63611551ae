//! Human-readable status-change messages.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::state::{Transition, TransitionOutcome};

/// A rendered notification message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub body: String,
}

/// Render the title and body for a status-change event.
///
/// Three shapes: recovered, newly down (the incident started with this
/// check), and still down. Timestamps are formatted as `month/day
/// hour:minute` in 24-hour form, localized to `time_zone`.
pub fn format_status_change(
    monitor_name: &str,
    outcome: &TransitionOutcome,
    time_zone: &str,
) -> Message {
    let tz: Tz = time_zone.parse().unwrap_or_else(|_| {
        tracing::warn!(
            "Formatter: unknown time zone {:?}, falling back to Etc/GMT",
            time_zone
        );
        chrono_tz::Etc::GMT
    });

    let downtime_minutes = ((outcome.now - outcome.incident_start) as f64 / 60.0).round() as i64;

    match outcome.transition {
        Transition::BecameUp => Message {
            title: format!("✅ {} is up!", monitor_name),
            body: format!(
                "The service is up again after being down for {} minutes.",
                downtime_minutes
            ),
        },
        _ if outcome.now == outcome.incident_start => Message {
            title: format!("🔴 {} is currently down.", monitor_name),
            body: format!(
                "Service is unavailable at {}. Issue: {}",
                format_time(outcome.now, tz),
                reason_or_default(&outcome.reason)
            ),
        },
        _ => Message {
            title: format!("🔴 {} is still down.", monitor_name),
            body: format!(
                "Service is unavailable since {} ({} minutes). Issue: {}",
                format_time(outcome.incident_start, tz),
                downtime_minutes,
                reason_or_default(&outcome.reason)
            ),
        },
    }
}

fn reason_or_default(reason: &str) -> &str {
    if reason.is_empty() {
        "unspecified"
    } else {
        reason
    }
}

fn format_time(ts: i64, tz: Tz) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.with_timezone(&tz).format("%-m/%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
