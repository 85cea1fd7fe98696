use chrono::{DateTime, Utc};
use tlx_stats::Subscale;

use crate::tlx::config_reader::{
    read_import_config, Column, ColumnMapping, ImportConfig, DEFAULT_SPREADSHEET_PATH,
};
use crate::tlx::io_common::{parse_date, parse_number, parse_version_label, VersionLabel};
use crate::tlx::io_excel::{read_excel_rows, RawRow};
use crate::tlx::*;

/// What happened during an import.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ImportReport {
    pub rows_read: usize,
    /// Rows without a version, a start time or an end time.
    pub rows_skipped: usize,
    pub records_written: usize,
    /// Rows whose version label was not understood and counted as the control variant.
    pub defaulted_versions: usize,
    /// Dates that could not be read and were replaced by the import time.
    pub defaulted_dates: usize,
}

/// Imports the spreadsheet into the result store, in a single batch.
pub fn run_import(
    database_url: &str,
    config_path: Option<String>,
    input: Option<String>,
    excel_worksheet_name: Option<String>,
) -> TlxResult<ImportReport> {
    let config = match config_path {
        Some(p) => read_import_config(&p)?,
        None => ImportConfig::default(),
    };
    let path = input
        .or_else(|| config.file_path.clone())
        .unwrap_or_else(|| DEFAULT_SPREADSHEET_PATH.to_string());
    let worksheet = excel_worksheet_name.or_else(|| config.excel_worksheet_name.clone());
    info!("Attempting to read result file {:?}", path);

    let rows = read_excel_rows(&path, worksheet.as_deref())?;
    let (records, mut report) = convert_rows(&rows, &config.columns, Utc::now());

    let mut store = store::ResultStore::open(database_url)?;
    if records.is_empty() {
        warn!("run_import: no usable row in {:?}, nothing written", path);
    } else {
        report.records_written = store.insert_many(&records)?;
    }
    info!("Import finished: {:?}", report);
    Ok(report)
}

/// Converts the spreadsheet rows into results, all stamped with the same ingestion time.
pub fn convert_rows(
    rows: &[RawRow],
    columns: &ColumnMapping,
    now: DateTime<Utc>,
) -> (Vec<ExperimentResult>, ImportReport) {
    let mut report = ImportReport {
        rows_read: rows.len(),
        ..Default::default()
    };
    let mut records: Vec<ExperimentResult> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        match convert_row(row, columns, now, &mut report) {
            Some(r) => records.push(r),
            None => {
                debug!("convert_rows: skipping row {}: {:?}", idx + 2, row);
                report.rows_skipped += 1;
            }
        }
    }
    (records, report)
}

fn cell<'a>(row: &'a RawRow, columns: &ColumnMapping, column: Column) -> Option<&'a str> {
    columns
        .header_names(column)
        .iter()
        .find_map(|name| row.get(name).and_then(|v| v.as_deref()))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn convert_row(
    row: &RawRow,
    columns: &ColumnMapping,
    now: DateTime<Utc>,
    report: &mut ImportReport,
) -> Option<ExperimentResult> {
    let version_label = cell(row, columns, Column::Version)?;
    let start_s = cell(row, columns, Column::StartTime)?;
    let end_s = cell(row, columns, Column::EndTime)?;

    let label = parse_version_label(version_label);
    if let VersionLabel::Defaulted(v) = label {
        warn!(
            "convert_row: unknown version label {:?}, counted as {}",
            version_label,
            v.as_str()
        );
        report.defaulted_versions += 1;
    }
    let version = label.version();

    let mut read_date = |s: &str| match parse_date(s) {
        Some(d) => d,
        None => {
            warn!("convert_row: could not read date {:?}, using the import time", s);
            report.defaulted_dates += 1;
            now
        }
    };
    let start_time = read_date(start_s);
    let end_time = read_date(end_s);

    let duration = match parse_number(cell(row, columns, Column::Minutes)) {
        Some(minutes) => (minutes * 60_000.0).round() as i64,
        None => (end_time - start_time).num_milliseconds(),
    };

    let score = |s: Subscale| parse_number(cell(row, columns, Column::Score(s))).unwrap_or(0.0);

    Some(ExperimentResult {
        version,
        start_time,
        end_time,
        duration,
        confirmation_code: cell(row, columns, Column::ConfirmationCode)
            .unwrap_or_default()
            .to_string(),
        nasatlx: NasaTlx {
            mental_demand: score(Subscale::MentalDemand),
            physical_demand: score(Subscale::PhysicalDemand),
            temporal_demand: score(Subscale::TemporalDemand),
            performance: score(Subscale::Performance),
            effort: score(Subscale::Effort),
            frustration: score(Subscale::Frustration),
        },
        created_at: now,
    })
}
