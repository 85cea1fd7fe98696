use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use text_diff::print_diff;

pub mod config_reader;
pub mod dashboard;
pub mod document;
pub mod importer;
pub mod io_common;
pub mod io_excel;
pub mod query;
pub mod server;
pub mod store;

use crate::tlx::config_reader::read_reference;
use crate::tlx::store::ResultStore;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TlxError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} does not contain any worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The workbook {path} does not contain a worksheet named {name}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("The worksheet does not have a header row"))]
    MissingHeader {},
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Database error"))]
    Database { source: rusqlite::Error },
    #[snafu(display("Invalid listening address {address}"))]
    InvalidAddress {
        source: std::net::AddrParseError,
        address: String,
    },
    #[snafu(display("Could not start the runtime"))]
    Runtime { source: std::io::Error },
    #[snafu(display("Background task failed"))]
    BlockingTask { source: tokio::task::JoinError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type TlxResult<T> = Result<T, TlxError>;

/// The UI variant used during a session.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Version {
    Optimized,
    Feature,
}

impl Version {
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Optimized => "optimized",
            Version::Feature => "feature",
        }
    }

    pub fn from_stored(s: &str) -> Option<Version> {
        match s {
            "optimized" => Some(Version::Optimized),
            "feature" => Some(Version::Feature),
            _ => None,
        }
    }
}

/// The six workload scores, in the canonical stored shape.
#[derive(PartialEq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NasaTlx {
    pub mental_demand: f64,
    pub physical_demand: f64,
    pub temporal_demand: f64,
    pub performance: f64,
    pub effort: f64,
    pub frustration: f64,
}

/// One completed study session, as written by the importer.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentResult {
    pub version: Version,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// In milliseconds.
    pub duration: i64,
    pub confirmation_code: String,
    pub nasatlx: NasaTlx,
    pub created_at: DateTime<Utc>,
}

/// Computes the results report offline, prints it and optionally checks it against
/// a reference report.
pub fn run_report(
    database_url: &str,
    out: Option<String>,
    check_reference_path: Option<String>,
) -> TlxResult<()> {
    let store = ResultStore::open(database_url)?;
    let documents = store.load_all()?;
    let report = query::build_report(&documents);
    let report_js = query::report_envelope(&report);

    let pretty_js_report = serde_json::to_string_pretty(&report_js).context(ParsingJsonSnafu {})?;
    match out.as_deref() {
        None | Some("stdout") | Some("") => println!("{}", pretty_js_report),
        Some(path) => {
            info!("Writing report to {:?}", path);
            fs::write(path, &pretty_js_report).context(WritingOutputSnafu { path })?;
        }
    }

    // The reference report, if provided for comparison
    if let Some(reference_p) = check_reference_path {
        let reference = read_reference(&reference_p)?;
        debug!("reference: {:?}", reference);
        let pretty_js_reference =
            serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
        if pretty_js_reference != pretty_js_report {
            warn!("Found differences with the reference report");
            print_diff(
                pretty_js_reference.as_str(),
                pretty_js_report.as_ref(),
                "\n",
            );
            whatever!("Difference detected between computed report and reference report")
        }
        info!("The report matches the reference {:?}", reference_p);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_round_trip_names() {
        assert_eq!(Version::from_stored("optimized"), Some(Version::Optimized));
        assert_eq!(Version::from_stored("feature"), Some(Version::Feature));
        assert_eq!(Version::from_stored("control"), None);
        assert_eq!(
            serde_json::to_value(Version::Optimized).unwrap(),
            serde_json::json!("optimized")
        );
    }

    #[test]
    fn experiment_result_is_camel_case() {
        let r = ExperimentResult {
            version: Version::Feature,
            start_time: "2024-03-05T14:00:00Z".parse().unwrap(),
            end_time: "2024-03-05T14:05:00Z".parse().unwrap(),
            duration: 300_000,
            confirmation_code: "ABC".to_string(),
            nasatlx: NasaTlx {
                mental_demand: 1.0,
                ..Default::default()
            },
            created_at: "2024-03-06T00:00:00Z".parse().unwrap(),
        };
        let js = serde_json::to_value(&r).unwrap();
        assert_eq!(js["version"], "feature");
        assert_eq!(js["confirmationCode"], "ABC");
        assert_eq!(js["nasatlx"]["mentalDemand"], 1.0);
        assert_eq!(js["duration"], 300_000);
        assert!(js["startTime"].is_string());
    }

    #[test]
    fn report_against_reference() {
        let dir = std::env::temp_dir().join(format!("tlxdash-report-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let db = dir.join("results.sqlite");
        let db_url = db.display().to_string();
        let out = dir.join("report.json").display().to_string();
        {
            let store = ResultStore::open(&db_url).unwrap();
            store
                .insert_document(&serde_json::json!({
                    "version": "optimized",
                    "startTime": "2024-03-05T14:00:00Z",
                    "endTime": "2024-03-05T14:05:00Z",
                    "duration": 300000,
                    "confirmationCode": "X1",
                    "nasatlx": {"mentalDemand": 10, "physicalDemand": 5, "temporalDemand": 20,
                                "performance": 80, "effort": 30, "frustration": 10},
                    "createdAt": "2024-03-06T00:00:00Z"
                }))
                .unwrap();
        }
        run_report(&db_url, Some(out.clone()), None).unwrap();
        // The written report is its own reference.
        run_report(&db_url, Some(out.clone()), Some(out.clone())).unwrap();

        fs::write(&out, "{\"success\": false}").unwrap();
        let res = run_report(&db_url, None, Some(out));
        assert!(res.is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
