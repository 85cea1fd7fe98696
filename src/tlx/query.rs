use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use tlx_stats::{compute_comparison, compute_stats, ComparisonRow, GroupStats, Session, Subscale};

use crate::tlx::document::StoredResult;
use crate::tlx::*;

/// The message returned by the API on any failure.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch experiment results";

/// The statistics of one group and the results it was computed from.
#[derive(PartialEq, Debug, Clone)]
pub struct GroupReport {
    pub count: usize,
    pub stats: Option<GroupStats>,
    pub records: Vec<StoredResult>,
}

/// How many documents are left after each filtering step.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FilterCounts {
    pub total_documents: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    pub optimized_records: usize,
    pub feature_records: usize,
    /// Valid results whose version is neither of the two variants.
    pub unversioned_records: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ResultsReport {
    pub total: GroupReport,
    pub optimized: GroupReport,
    pub feature: GroupReport,
    /// Only present when both variants have results.
    pub comparison: Option<Vec<ComparisonRow>>,
    pub debug: FilterCounts,
}

fn group_report(records: Vec<StoredResult>) -> GroupReport {
    let sessions: Vec<Session> = records.iter().map(|r| r.session()).collect();
    GroupReport {
        count: records.len(),
        stats: compute_stats(&sessions),
        records,
    }
}

/// Filters, partitions and aggregates the stored results (expected newest first).
pub fn build_report(documents: &[StoredResult]) -> ResultsReport {
    let valid: Vec<StoredResult> = documents.iter().filter(|r| r.is_valid()).cloned().collect();
    debug!(
        "build_report: {} documents, {} valid",
        documents.len(),
        valid.len()
    );

    let by_version = |v: Version| -> Vec<StoredResult> {
        valid
            .iter()
            .filter(|r| r.version == Some(v))
            .cloned()
            .collect()
    };
    let optimized = group_report(by_version(Version::Optimized));
    let feature = group_report(by_version(Version::Feature));

    let debug = FilterCounts {
        total_documents: documents.len(),
        valid_records: valid.len(),
        invalid_records: documents.len() - valid.len(),
        optimized_records: optimized.count,
        feature_records: feature.count,
        unversioned_records: valid.len() - optimized.count - feature.count,
    };
    if debug.unversioned_records > 0 {
        warn!(
            "build_report: {} valid results without a known version",
            debug.unversioned_records
        );
    }

    let comparison = match (&optimized.stats, &feature.stats) {
        (Some(a), Some(b)) => Some(compute_comparison(a, b)),
        _ => None,
    };

    ResultsReport {
        total: group_report(valid),
        optimized,
        feature,
        comparison,
        debug,
    }
}

pub fn stats_to_json(stats: &Option<GroupStats>) -> JSValue {
    let stats = match stats {
        Some(s) => s,
        None => return JSValue::Null,
    };
    let mut m: JSMap<String, JSValue> = JSMap::new();
    m.insert("count".to_string(), json!(stats.count));
    m.insert("avgDuration".to_string(), json!(stats.avg_duration));
    m.insert("medianDuration".to_string(), json!(stats.median_duration));
    m.insert("minDuration".to_string(), json!(stats.min_duration));
    m.insert("maxDuration".to_string(), json!(stats.max_duration));
    for subscale in Subscale::ALL {
        m.insert(avg_key(subscale), json!(stats.subscale_mean(subscale)));
    }
    JSValue::Object(m)
}

/// "mentalDemand" -> "avgMentalDemand"
fn avg_key(subscale: Subscale) -> String {
    let name = subscale.name();
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => format!("avg{}{}", c.to_uppercase(), chars.as_str()),
        None => "avg".to_string(),
    }
}

/// Durations stored as integers are given back as integers.
fn duration_to_json(duration_ms: Option<f64>) -> JSValue {
    match duration_ms {
        Some(ms) if ms.fract() == 0.0 && ms.abs() < 9e15 => json!(ms as i64),
        other => json!(other),
    }
}

fn record_to_json(r: &StoredResult) -> JSValue {
    let mut tlx: JSMap<String, JSValue> = JSMap::new();
    for subscale in Subscale::ALL {
        tlx.insert(subscale.name().to_string(), json!(r.scores.get(subscale)));
    }
    json!({
        "id": r.id,
        "version": r.version.map(|v| v.as_str()),
        "startTime": r.start_time,
        "endTime": r.end_time,
        "duration": duration_to_json(r.duration_ms),
        "confirmationCode": r.confirmation_code,
        "nasatlx": tlx,
        "createdAt": r.created_at,
    })
}

fn comparison_to_json(rows: &[ComparisonRow]) -> JSValue {
    let l: Vec<JSValue> = rows
        .iter()
        .map(|row| {
            json!({
                "metric": row.metric.name(),
                "optimized": row.optimized,
                "feature": row.feature,
                "difference": row.difference,
                "percentageDiff": row.percentage_diff,
            })
        })
        .collect();
    JSValue::Array(l)
}

fn group_to_json(g: &GroupReport) -> JSValue {
    let records: Vec<JSValue> = g.records.iter().map(record_to_json).collect();
    json!({"count": g.count, "stats": stats_to_json(&g.stats), "records": records})
}

/// The successful API response.
pub fn report_envelope(report: &ResultsReport) -> JSValue {
    let d = &report.debug;
    json!({
        "success": true,
        "data": {
            "total": {"count": report.total.count, "stats": stats_to_json(&report.total.stats)},
            "optimized": group_to_json(&report.optimized),
            "feature": group_to_json(&report.feature),
            "comparison": report.comparison.as_deref().map(comparison_to_json),
        },
        "debug": {
            "totalDocuments": d.total_documents,
            "validRecords": d.valid_records,
            "invalidRecords": d.invalid_records,
            "optimizedRecords": d.optimized_records,
            "featureRecords": d.feature_records,
            "unversionedRecords": d.unversioned_records,
        }
    })
}

/// The API response on failure. The details only go to the log.
pub fn error_envelope() -> JSValue {
    json!({"success": false, "error": FETCH_ERROR_MESSAGE})
}
