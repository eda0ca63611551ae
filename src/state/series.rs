//! Dual-resolution latency history per monitored target.
//!
//! Every target keeps two bounded series: a high-resolution window covering
//! the last 12 hours and a downsampled long-term window covering 90 days.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// High-resolution window length: 12 hours.
const RECENT_WINDOW_SECS: i64 = 12 * 3600;
/// High-resolution bucket width: ~2 minutes.
const RECENT_BUCKET_SECS: i64 = 120;
/// Hard cap on `recent`, applied before the time window.
const RECENT_CAP: usize = 360;

/// Long-term window length: 90 days.
const ALL_WINDOW_SECS: i64 = 90 * 86400;
/// Long-term bucket width: 1 hour.
const ALL_BUCKET_SECS: i64 = 3600;
/// Hard cap on `all`, applied before the time window.
const ALL_CAP: usize = 2160;

/// A single latency measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Location label of the prober that took the measurement.
    pub loc: String,
    /// Latency in milliseconds.
    pub ping: f64,
    /// Unix timestamp (seconds) of the probe.
    pub time: i64,
}

/// The two retention windows for one target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatencySeries {
    /// Last 12 hours at ~2-minute granularity.
    pub recent: Vec<Sample>,
    /// Last 90 days at 1-hour granularity.
    pub all: Vec<Sample>,
}

/// Bounded latency history for all targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeriesStore {
    by_target: HashMap<String, LatencySeries>,
}

impl TimeSeriesStore {
    /// Record a sample for a target.
    ///
    /// Malformed samples (non-finite or negative ping) are silently dropped;
    /// the check itself is still counted by the caller. Each series accepts
    /// at most one sample per time bucket and evicts from the front once its
    /// capacity or time window is exceeded.
    pub fn append(&mut self, target_id: &str, sample: Sample) {
        if !sample.ping.is_finite() || sample.ping < 0.0 {
            tracing::debug!(
                "TimeSeriesStore: dropping malformed sample for {} (ping={})",
                target_id,
                sample.ping
            );
            return;
        }

        let series = self.by_target.entry(target_id.to_string()).or_default();
        push_bucketed(
            &mut series.recent,
            &sample,
            RECENT_BUCKET_SECS,
            RECENT_CAP,
            RECENT_WINDOW_SECS,
        );
        push_bucketed(
            &mut series.all,
            &sample,
            ALL_BUCKET_SECS,
            ALL_CAP,
            ALL_WINDOW_SECS,
        );
    }

    /// An immutable copy of a target's series, empty for unknown targets.
    pub fn snapshot(&self, target_id: &str) -> LatencySeries {
        self.by_target.get(target_id).cloned().unwrap_or_default()
    }
}

/// Append `sample` if it opens a new bucket relative to the series tail, then
/// evict from the front. A sample exactly on a bucket boundary belongs to the
/// new bucket. Capacity eviction runs before window eviction so memory stays
/// bounded even when the clock jumps.
fn push_bucketed(
    series: &mut Vec<Sample>,
    sample: &Sample,
    bucket_secs: i64,
    cap: usize,
    window_secs: i64,
) {
    if let Some(last) = series.last() {
        if bucket_of(last.time, bucket_secs) == bucket_of(sample.time, bucket_secs) {
            return;
        }
    }
    series.push(sample.clone());

    while series.len() > cap {
        series.remove(0);
    }

    let cutoff = sample.time - window_secs;
    while series.first().map_or(false, |s| s.time < cutoff) {
        series.remove(0);
    }
}

fn bucket_of(time: i64, bucket_secs: i64) -> i64 {
    time.div_euclid(bucket_secs)
}
