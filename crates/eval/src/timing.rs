use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

/// Current time as an RFC 3339 timestamp.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Latency distribution over a set of evaluations, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencySummary {
    pub count: usize,
    pub total_ms: f64,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
}

impl LatencySummary {
    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = samples.into_iter().collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);

        let total: f64 = sorted.iter().sum();
        Self {
            count: sorted.len(),
            total_ms: total,
            avg_ms: total / sorted.len() as f64,
            p50_ms: percentile(&sorted, 50),
            p95_ms: percentile(&sorted, 95),
            max_ms: sorted[sorted.len() - 1],
        }
    }
}

/// Nearest-rank percentile of already sorted, non-empty data.
fn percentile(sorted_data: &[f64], p: usize) -> f64 {
    let index = (p as f64 / 100.0 * sorted_data.len() as f64) as usize;
    sorted_data[index.min(sorted_data.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_summary() {
        let summary = LatencySummary::from_samples((1..=100).map(|v| v as f64));
        assert_eq!(summary.count, 100);
        assert_eq!(summary.avg_ms, 50.5);
        assert_eq!(summary.p50_ms, 51.0);
        assert_eq!(summary.p95_ms, 96.0);
        assert_eq!(summary.max_ms, 100.0);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(LatencySummary::from_samples(Vec::new()), LatencySummary::default());
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let ts = timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_timer_is_monotonic() {
        let timer = TimedOperation::start();
        assert!(timer.elapsed_ms() >= 0.0);
    }
}
