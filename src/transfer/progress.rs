use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::trace;

/// How throughput is estimated from the polled byte counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedPolicy {
    /// Bytes copied so far over time since the batch started.
    #[default]
    Cumulative,
    /// Bytes between the last two samples over the time between them.
    Windowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteUnit {
    KB,
    MB,
    GB,
}

impl ByteUnit {
    pub fn divisor(self) -> f64 {
        match self {
            ByteUnit::KB => 1024.0,
            ByteUnit::MB => 1024.0 * 1024.0,
            ByteUnit::GB => 1024.0 * 1024.0 * 1024.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ByteUnit::KB => "KB",
            ByteUnit::MB => "MB",
            ByteUnit::GB => "GB",
        }
    }
}

/// One unit for the whole batch, so "copied" and "total" read alike.
pub fn unit_for_total_bytes(total: u64) -> ByteUnit {
    if total < 1 << 20 {
        ByteUnit::KB
    } else if total < 1 << 30 {
        ByteUnit::MB
    } else {
        ByteUnit::GB
    }
}

pub fn format_bytes(bytes: u64, unit: ByteUnit) -> String {
    format!("{:.2} {}", bytes as f64 / unit.divisor(), unit.label())
}

pub fn format_rate(bytes_per_second: f64) -> String {
    let abs = bytes_per_second.abs();
    if abs < (1u64 << 20) as f64 {
        format!("{:.1} KB/sec", bytes_per_second / 1024.0)
    } else if abs < (1u64 << 30) as f64 {
        format!("{:.1} MB/sec", bytes_per_second / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB/sec", bytes_per_second / (1024.0 * 1024.0 * 1024.0))
    }
}

pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub total_bytes: u64,
    pub copied_bytes: u64,
    pub elapsed: Duration,
    pub rate_bytes_per_second: f64,
    pub eta_seconds: f64,
    pub unit: ByteUnit,
}

impl ProgressSnapshot {
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            (self.copied_bytes as f64 / self.total_bytes as f64).clamp(0.0, 1.0)
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Copied {} of {} at {}, ETA {}",
            format_bytes(self.copied_bytes, self.unit),
            format_bytes(self.total_bytes, self.unit),
            format_rate(self.rate_bytes_per_second),
            format_clock(self.eta_seconds)
        )
    }
}

/// Turns periodic "bytes at the destination" samples into rate and ETA.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_bytes: u64,
    unit: ByteUnit,
    policy: SpeedPolicy,
    started: Instant,
    copied_bytes: u64,
    last_sample: Option<(u64, Instant)>,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64, policy: SpeedPolicy, started: Instant) -> Self {
        Self {
            total_bytes,
            unit: unit_for_total_bytes(total_bytes),
            policy,
            started,
            copied_bytes: 0,
            last_sample: None,
        }
    }

    /// Record a sample. Copied bytes never go backwards.
    pub fn sample(&mut self, copied_bytes: u64, now: Instant) -> ProgressSnapshot {
        let copied = copied_bytes.max(self.copied_bytes);
        let elapsed = now.saturating_duration_since(self.started);

        let rate = match self.policy {
            SpeedPolicy::Cumulative => {
                let secs = elapsed.as_secs_f64();
                if secs > 0.0 {
                    copied as f64 / secs
                } else {
                    0.0
                }
            }
            SpeedPolicy::Windowed => {
                let (prev_bytes, prev_time) = self.last_sample.unwrap_or((0, self.started));
                let delta_bytes = copied.saturating_sub(prev_bytes);
                let delta_time = now
                    .saturating_duration_since(prev_time)
                    .as_secs_f64()
                    .max(0.001);
                delta_bytes as f64 / delta_time
            }
        };

        let remaining = self.total_bytes.saturating_sub(copied);
        let eta = if rate > 0.0 {
            remaining as f64 / rate
        } else {
            0.0
        };

        self.copied_bytes = copied;
        self.last_sample = Some((copied, now));
        trace!("progress: {} / {} bytes, {:.1} B/s", copied, self.total_bytes, rate);

        ProgressSnapshot {
            total_bytes: self.total_bytes,
            copied_bytes: copied,
            elapsed,
            rate_bytes_per_second: rate,
            eta_seconds: eta,
            unit: self.unit,
        }
    }
}
