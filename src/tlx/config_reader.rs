use crate::tlx::*;

use log::debug;
use serde_json::Value as JSValue;
use tlx_stats::Subscale;

/// The spreadsheet read when nothing else is specified.
pub const DEFAULT_SPREADSHEET_PATH: &str = "data/experiment_results.xlsx";

/// Description of the spreadsheet to import.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(default)]
    pub columns: ColumnMapping,
}

/// Overrides for the header names of the spreadsheet columns.
/// A missing entry falls back to the usual header names of the survey export.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub version: Option<String>,
    #[serde(rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(rename = "endTime")]
    pub end_time: Option<String>,
    pub minutes: Option<String>,
    #[serde(rename = "confirmationCode")]
    pub confirmation_code: Option<String>,
    #[serde(rename = "mentalDemand")]
    pub mental_demand: Option<String>,
    #[serde(rename = "physicalDemand")]
    pub physical_demand: Option<String>,
    #[serde(rename = "temporalDemand")]
    pub temporal_demand: Option<String>,
    pub performance: Option<String>,
    pub effort: Option<String>,
    pub frustration: Option<String>,
}

/// The columns read by the importer.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Column {
    Version,
    StartTime,
    EndTime,
    Minutes,
    ConfirmationCode,
    Score(Subscale),
}

impl ColumnMapping {
    /// The accepted header names for a column, the configured one first.
    pub fn header_names(&self, column: Column) -> Vec<String> {
        let (custom, defaults): (&Option<String>, &[&str]) = match column {
            Column::Version => (&self.version, &["version", "版本"]),
            Column::StartTime => (&self.start_time, &["startTime", "开始时间"]),
            Column::EndTime => (&self.end_time, &["endTime", "结束时间"]),
            Column::Minutes => (&self.minutes, &["minutes", "用时(分钟)", "时长(分钟)"]),
            Column::ConfirmationCode => (&self.confirmation_code, &["confirmationCode", "确认码"]),
            Column::Score(Subscale::MentalDemand) => {
                (&self.mental_demand, &["mentalDemand", "脑力需求"])
            }
            Column::Score(Subscale::PhysicalDemand) => {
                (&self.physical_demand, &["physicalDemand", "体力需求"])
            }
            Column::Score(Subscale::TemporalDemand) => {
                (&self.temporal_demand, &["temporalDemand", "时间需求"])
            }
            Column::Score(Subscale::Performance) => {
                (&self.performance, &["performance", "绩效水平"])
            }
            Column::Score(Subscale::Effort) => (&self.effort, &["effort", "努力程度"]),
            Column::Score(Subscale::Frustration) => {
                (&self.frustration, &["frustration", "挫败感"])
            }
        };
        match custom {
            Some(name) => vec![name.clone()],
            None => defaults.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub fn read_import_config(path: &str) -> TlxResult<ImportConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ImportConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_import_config: {:?}", config);
    Ok(config)
}

pub fn read_reference(path: &str) -> TlxResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
