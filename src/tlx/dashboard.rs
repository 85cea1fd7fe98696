// Server-side rendering of the dashboard page.

use html_escape::encode_safe;
use tlx_stats::{ComparisonRow, GroupStats, Metric, Subscale};

use crate::tlx::document::StoredResult;
use crate::tlx::query::{GroupReport, ResultsReport};
use crate::tlx::Version;

const NO_DATA: &str = "No data available";

const STYLE: &str = "body{font-family:sans-serif;margin:2em;color:#222}\
.cards{display:flex;gap:1.5em;flex-wrap:wrap}\
.card{border:1px solid #ccc;border-radius:6px;padding:1em;min-width:16em}\
table{border-collapse:collapse;margin:1em 0}\
th,td{border:1px solid #ddd;padding:.3em .6em;text-align:right}\
th:first-child,td:first-child{text-align:left}\
.placeholder{color:#888;font-style:italic}";

fn placeholder(message: &str) -> String {
    format!("<p class=\"placeholder\">{}</p>", message)
}

pub fn version_label(version: Version) -> &'static str {
    match version {
        Version::Optimized => "Optimized",
        Version::Feature => "Feature (control)",
    }
}

pub fn metric_label(metric: Metric) -> &'static str {
    match metric {
        Metric::Duration => "Duration (min)",
        Metric::Subscale(Subscale::MentalDemand) => "Mental demand",
        Metric::Subscale(Subscale::PhysicalDemand) => "Physical demand",
        Metric::Subscale(Subscale::TemporalDemand) => "Temporal demand",
        Metric::Subscale(Subscale::Performance) => "Performance",
        Metric::Subscale(Subscale::Effort) => "Effort",
        Metric::Subscale(Subscale::Frustration) => "Frustration",
    }
}

/// Durations are shown with two decimals, the workload scores with one.
pub fn format_metric(metric: Metric, value: f64) -> String {
    match metric {
        Metric::Duration => format!("{:.2}", value),
        Metric::Subscale(_) => format!("{:.1}", value),
    }
}

fn format_optional(metric: Metric, value: Option<f64>) -> String {
    match value {
        Some(v) => format_metric(metric, v),
        None => "-".to_string(),
    }
}

fn render_stats(stats: &GroupStats) -> String {
    let mut out = String::new();
    let d = Metric::Duration;
    out.push_str(&format!(
        "<dl><dt>Sessions</dt><dd>{}</dd>\
         <dt>Average duration (min)</dt><dd>{}</dd>\
         <dt>Median duration (min)</dt><dd>{}</dd>\
         <dt>Min / max duration (min)</dt><dd>{} / {}</dd>",
        stats.count,
        format_metric(d, stats.avg_duration),
        format_metric(d, stats.median_duration),
        format_metric(d, stats.min_duration),
        format_metric(d, stats.max_duration),
    ));
    for subscale in Subscale::ALL {
        let m = Metric::Subscale(subscale);
        out.push_str(&format!(
            "<dt>{}</dt><dd>{}</dd>",
            metric_label(m),
            format_metric(m, stats.subscale_mean(subscale))
        ));
    }
    out.push_str("</dl>");
    out
}

fn render_card(version: Version, group: &GroupReport) -> String {
    let body = match &group.stats {
        Some(stats) => render_stats(stats),
        None => placeholder(NO_DATA),
    };
    format!(
        "<div class=\"card\"><h2>{} ({} sessions)</h2>{}</div>",
        version_label(version),
        group.count,
        body
    )
}

fn render_comparison(comparison: Option<&[ComparisonRow]>) -> String {
    let rows = match comparison {
        Some(rows) if !rows.is_empty() => rows,
        _ => return placeholder("Both versions need results for a comparison"),
    };
    let mut out = String::from(
        "<table><thead><tr><th>Metric</th><th>Optimized</th><th>Feature</th>\
         <th>Difference</th><th>Difference (%)</th></tr></thead><tbody>",
    );
    for row in rows {
        let pct = match row.metric {
            Metric::Duration => format!("{:.2}%", row.percentage_diff),
            Metric::Subscale(_) => "-".to_string(),
        };
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            metric_label(row.metric),
            format_metric(row.metric, row.optimized),
            format_metric(row.metric, row.feature),
            format_metric(row.metric, row.difference),
            pct
        ));
    }
    out.push_str("</tbody></table>");
    out
}

fn render_record(r: &StoredResult) -> String {
    let text = |s: &Option<String>| encode_safe(s.as_deref().unwrap_or("-")).into_owned();
    let mut out = format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
        r.version.map(version_label).unwrap_or("-"),
        text(&r.confirmation_code),
        text(&r.start_time),
        text(&r.end_time),
        format_optional(Metric::Duration, r.duration_ms.map(|ms| ms / 60_000.0)),
    );
    for subscale in Subscale::ALL {
        out.push_str(&format!(
            "<td>{}</td>",
            format_optional(Metric::Subscale(subscale), r.scores.get(subscale))
        ));
    }
    out.push_str("</tr>");
    out
}

fn render_records(report: &ResultsReport) -> String {
    let records: Vec<&StoredResult> = report
        .optimized
        .records
        .iter()
        .chain(report.feature.records.iter())
        .collect();
    if records.is_empty() {
        return placeholder(NO_DATA);
    }
    let mut out = String::from(
        "<table><thead><tr><th>Version</th><th>Confirmation code</th><th>Start</th>\
         <th>End</th><th>Duration (min)</th>",
    );
    for subscale in Subscale::ALL {
        out.push_str(&format!(
            "<th>{}</th>",
            metric_label(Metric::Subscale(subscale))
        ));
    }
    out.push_str("</tr></thead><tbody>");
    for r in records {
        out.push_str(&render_record(r));
    }
    out.push_str("</tbody></table>");
    out
}

/// Renders the whole page. Without a report, only placeholders are shown.
pub fn render_dashboard(report: Option<&ResultsReport>) -> String {
    let content = match report {
        Some(report) => format!(
            "<section class=\"cards\">{}{}</section>\
             <h2>Comparison</h2>{}\
             <h2>Results ({} valid of {} stored)</h2>{}",
            render_card(Version::Optimized, &report.optimized),
            render_card(Version::Feature, &report.feature),
            render_comparison(report.comparison.as_deref()),
            report.debug.valid_records,
            report.debug.total_documents,
            render_records(report)
        ),
        None => placeholder(NO_DATA),
    };
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <title>NASA-TLX usability results</title><style>{}</style></head><body>\
         <h1>NASA-TLX usability results</h1>\
         <form method=\"get\" action=\"/\"><button type=\"submit\">Refresh</button></form>\
         {}</body></html>",
        STYLE, content
    )
}
