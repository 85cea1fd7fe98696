// Primitives shared by the spreadsheet readers: cell conversions and the tolerant
// parsing of labels, numbers and dates.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::debug;

use crate::tlx::Version;

/// How a version label was understood.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum VersionLabel {
    Recognized(Version),
    /// The label is unknown, the session is counted as the control variant.
    Defaulted(Version),
}

impl VersionLabel {
    pub fn version(&self) -> Version {
        match self {
            VersionLabel::Recognized(v) | VersionLabel::Defaulted(v) => *v,
        }
    }
}

pub fn parse_version_label(label: &str) -> VersionLabel {
    let l = label.trim();
    match l.to_lowercase().as_str() {
        "优化版" | "optimized" => VersionLabel::Recognized(Version::Optimized),
        "对照版" | "feature" | "control" => VersionLabel::Recognized(Version::Feature),
        _ if l.contains("优化") => VersionLabel::Recognized(Version::Optimized),
        _ => VersionLabel::Defaulted(Version::Feature),
    }
}

/// Reads a number from a cell. Blank or unreadable cells give None.
pub fn parse_number(cell: Option<&str>) -> Option<f64> {
    let s = cell?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|x| x.is_finite())
}

const NATIVE_DATETIME_FORMATS: [&str; 13] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M",
    // Month first, as in US exports.
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    // Browser date strings, without their zone.
    "%a %b %d %Y %H:%M:%S",
    "%a %b %d %Y %H:%M",
    "%b %d %Y %H:%M:%S",
];

const NATIVE_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Browser date strings with their zone: `Tue Mar 05 2024 14:00:00 GMT+0800 (CST)`.
const BROWSER_ZONED_FORMAT: &str = "%a %b %d %Y %H:%M:%S GMT%z";

const DATE_SEPARATORS: [char; 11] = ['/', '-', ':', '.', 'T', '年', '月', '日', '时', '分', '秒'];

/// Parses a date as written in the spreadsheet. Naive times are taken as UTC.
///
/// The usual formats are tried first, then the components are read one by one.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // Short years are left to the manual parser.
    let native = parse_date_native(s).filter(|d| d.year() >= 1000);
    native.or_else(|| {
        let res = parse_date_manual(s);
        debug!("parse_date: manual parsing of {:?}: {:?}", s, res);
        res
    })
}

fn parse_date_native(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let without_zone_name = s.split(" (").next().unwrap_or(s).trim_end();
    if let Ok(dt) = DateTime::parse_from_str(without_zone_name, BROWSER_ZONED_FORMAT) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NATIVE_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    for fmt in NATIVE_DATE_FORMATS {
        if let Ok(nd) = NaiveDate::parse_from_str(s, fmt) {
            return nd.and_hms_opt(0, 0, 0).map(|ndt| Utc.from_utc_datetime(&ndt));
        }
    }
    None
}

/// Splits the text into year, month, day, hour, minute and second.
/// Two-digit years are in the 2000s.
fn parse_date_manual(s: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<u32> = s
        .split(|c: char| c.is_whitespace() || DATE_SEPARATORS.contains(&c))
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u32>())
        .collect::<Result<Vec<u32>, _>>()
        .ok()?;
    if parts.len() < 3 || parts.len() > 6 {
        return None;
    }
    let year = match parts[0] {
        y if y < 100 => 2000 + y,
        y => y,
    };
    let time = |idx: usize| parts.get(idx).cloned().unwrap_or(0);
    NaiveDate::from_ymd_opt(year as i32, parts[1], parts[2])?
        .and_hms_opt(time(3), time(4), time(5))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Converts an Excel serial date (days since 1899-12-30) to the text form used by
/// the other cells.
pub fn excel_serial_to_string(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let ms = (serial * 86_400_000.0).round() as i64;
    let ndt = epoch.checked_add_signed(Duration::milliseconds(ms))?;
    Some(ndt.format("%Y/%m/%d %H:%M:%S").to_string())
}

/// Renders a float cell without a trailing ".0" for integral values.
pub fn float_to_string(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn version_labels() {
        assert_eq!(
            parse_version_label("对照版"),
            VersionLabel::Recognized(Version::Feature)
        );
        assert_eq!(
            parse_version_label("优化版"),
            VersionLabel::Recognized(Version::Optimized)
        );
        assert_eq!(
            parse_version_label(" Optimized "),
            VersionLabel::Recognized(Version::Optimized)
        );
        assert_eq!(
            parse_version_label("优化版本B"),
            VersionLabel::Recognized(Version::Optimized)
        );
        assert_eq!(
            parse_version_label("beta"),
            VersionLabel::Defaulted(Version::Feature)
        );
        assert_eq!(parse_version_label("beta").version(), Version::Feature);
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number(Some(" 42 ")), Some(42.0));
        assert_eq!(parse_number(Some("7.5")), Some(7.5));
        assert_eq!(parse_number(Some("")), None);
        assert_eq!(parse_number(Some("n/a")), None);
        assert_eq!(parse_number(Some("NaN")), None);
        assert_eq!(parse_number(None), None);
    }

    #[test]
    fn native_dates() {
        let d = parse_date("2024-03-05 14:30:10").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2024, 3, 5));
        assert_eq!((d.hour(), d.minute(), d.second()), (14, 30, 10));
        let d = parse_date("2024/03/05 14:30").unwrap();
        assert_eq!(d.minute(), 30);
        let d = parse_date("2024-03-05T06:00:00+08:00").unwrap();
        assert_eq!((d.day(), d.hour()), (4, 22));
    }

    #[test]
    fn fractional_seconds() {
        let d = parse_date("2024-03-05 14:30:10.500").unwrap();
        assert_eq!((d.second(), d.timestamp_subsec_millis()), (10, 500));
        let d = parse_date("2024/03/05 14:30:10.25").unwrap();
        assert_eq!(d.timestamp_subsec_millis(), 250);
        let d = parse_date("2024-03-05T14:30:10.125").unwrap();
        assert_eq!((d.minute(), d.timestamp_subsec_millis()), (30, 125));
    }

    #[test]
    fn month_first_dates() {
        let d = parse_date("3/5/2024 14:00:00").unwrap();
        assert_eq!((d.year(), d.month(), d.day(), d.hour()), (2024, 3, 5, 14));
        let d = parse_date("12/31/2023 9:15").unwrap();
        assert_eq!((d.month(), d.day(), d.minute()), (12, 31, 15));
        let d = parse_date("3/5/2024 2:05:00 PM").unwrap();
        assert_eq!((d.hour(), d.minute()), (14, 5));
        let d = parse_date("3/5/2024").unwrap();
        assert_eq!((d.month(), d.day(), d.hour()), (3, 5, 0));
    }

    #[test]
    fn browser_dates() {
        let d = parse_date("Tue Mar 05 2024 14:00:00").unwrap();
        assert_eq!((d.year(), d.month(), d.day(), d.hour()), (2024, 3, 5, 14));
        let d = parse_date("Tue Mar 05 2024 14:00:00 GMT+0800 (China Standard Time)").unwrap();
        assert_eq!((d.day(), d.hour()), (5, 6));
        let d = parse_date("Tue Mar 05 2024 14:00:00 GMT+0000").unwrap();
        assert_eq!(d.hour(), 14);
    }

    #[test]
    fn manual_dates() {
        let d = parse_date("24/3/5 9:07").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2024, 3, 5));
        assert_eq!((d.hour(), d.minute(), d.second()), (9, 7, 0));
        let d = parse_date("2024年3月5日 9时7分3秒").unwrap();
        assert_eq!((d.year(), d.second()), (2024, 3));
        let d = parse_date("2024.3.5").unwrap();
        assert_eq!(d.hour(), 0);
    }

    #[test]
    fn unparseable_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("24/13/5 10:00"), None);
        assert_eq!(parse_date("5/3"), None);
    }

    #[test]
    fn excel_serial_dates() {
        assert_eq!(
            excel_serial_to_string(45356.5),
            Some("2024/03/05 12:00:00".to_string())
        );
        assert_eq!(excel_serial_to_string(f64::NAN), None);
    }

    #[test]
    fn float_cells() {
        assert_eq!(float_to_string(12.0), "12");
        assert_eq!(float_to_string(2.5), "2.5");
    }
}
