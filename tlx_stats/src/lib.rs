mod config;
use log::debug;

pub use crate::config::*;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Arithmetic mean. The mean of an empty slice is zero.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median, averaging the two middle values for an even number of elements.
/// The median of an empty slice is zero.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Computes the descriptive statistics of a group of sessions.
///
/// Sessions that do not carry all six sub-scales as numbers are ignored.
/// Returns None when no session is left.
///
/// ```
/// use tlx_stats::{compute_stats, Session, TlxScores};
///
/// let sessions = vec![Session {
///     duration_ms: 120_000.0,
///     scores: TlxScores::filled([50.0, 10.0, 40.0, 70.0, 55.0, 20.0]),
/// }];
/// let stats = compute_stats(&sessions).unwrap();
/// assert_eq!(stats.count, 1);
/// assert_eq!(stats.avg_duration, 2.0);
/// ```
pub fn compute_stats(sessions: &[Session]) -> Option<GroupStats> {
    let valid: Vec<(f64, [f64; 6])> = sessions
        .iter()
        .filter_map(|s| s.scores.complete().map(|sc| (s.duration_ms, sc)))
        .collect();
    debug!(
        "compute_stats: {} sessions, {} with complete scores",
        sessions.len(),
        valid.len()
    );
    if valid.is_empty() {
        return None;
    }

    let durations: Vec<f64> = valid.iter().map(|(d, _)| d / MS_PER_MINUTE).collect();
    let mut subscale_means = [0.0; 6];
    for (idx, m) in subscale_means.iter_mut().enumerate() {
        let column: Vec<f64> = valid.iter().map(|(_, sc)| sc[idx]).collect();
        *m = mean(&column);
    }

    Some(GroupStats {
        count: valid.len(),
        avg_duration: mean(&durations),
        median_duration: median(&durations),
        min_duration: durations.iter().cloned().fold(f64::INFINITY, f64::min),
        max_duration: durations.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        subscale_means,
    })
}

/// Builds the comparison table between two groups, one row per metric.
///
/// The first group is reported as the optimized variant, the second one as the
/// feature variant. The difference is always `optimized - feature`.
pub fn compute_comparison(optimized: &GroupStats, feature: &GroupStats) -> Vec<ComparisonRow> {
    Metric::ALL
        .iter()
        .map(|&metric| {
            let a = optimized.metric(metric);
            let b = feature.metric(metric);
            let percentage_diff = match metric {
                Metric::Duration if b != 0.0 => (a - b) / b * 100.0,
                _ => 0.0,
            };
            ComparisonRow {
                metric,
                optimized: a,
                feature: b,
                difference: a - b,
                percentage_diff,
            }
        })
        .collect()
}
