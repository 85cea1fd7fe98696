// Primitives for reading Excel files.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use std::collections::HashMap;

use crate::tlx::io_common::{excel_serial_to_string, float_to_string};
use crate::tlx::*;

/// A spreadsheet row, keyed by the header of each column.
/// Blank cells are None.
pub type RawRow = HashMap<String, Option<String>>;

pub fn read_excel_rows(path: &str, worksheet_name: Option<&str>) -> TlxResult<Vec<RawRow>> {
    let wrange = get_range(path, worksheet_name)?;
    let rows = rows_from_range(&wrange)?;
    info!("read_excel_rows: {:?}: {} data rows", path, rows.len());
    Ok(rows)
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> TlxResult<Range<DataType>> {
    debug!("get_range: path: {:?} worksheet: {:?}", path, worksheet_name);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    let wrange = if let Some(name) = worksheet_name {
        workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
    };
    wrange.context(OpeningExcelSnafu { path })
}

/// Turns the sheet into header-keyed rows. The first row is the header.
pub fn rows_from_range(wrange: &Range<DataType>) -> TlxResult<Vec<RawRow>> {
    let mut iter = wrange.rows();
    let header: Vec<Option<String>> = iter
        .next()
        .context(MissingHeaderSnafu {})?
        .iter()
        .map(|c| cell_to_string(c).map(|s| s.trim().to_string()))
        .collect();
    debug!("rows_from_range: header: {:?}", header);

    let mut res: Vec<RawRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        debug!("rows_from_range: idx: {:?} row: {:?}", idx, row);
        let mut raw = RawRow::new();
        for (col_idx, col_name) in header.iter().enumerate() {
            if let Some(name) = col_name {
                // The first column wins when two columns share a header.
                if !raw.contains_key(name) {
                    raw.insert(name.clone(), row.get(col_idx).and_then(cell_to_string));
                }
            }
        }
        res.push(raw);
    }
    Ok(res)
}

/// The text content of a cell, None for blank or error cells.
pub fn cell_to_string(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) if s.trim().is_empty() => None,
        DataType::String(s) => Some(s.clone()),
        DataType::Float(f) => Some(float_to_string(*f)),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        DataType::DateTime(serial) => excel_serial_to_string(*serial),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(cells: &[&[DataType]]) -> Range<DataType> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(x: &str) -> DataType {
        DataType::String(x.to_string())
    }

    #[test]
    fn rows_are_keyed_by_header() {
        let range = sheet(&[
            &[s(" 版本 "), s("开始时间"), s("脑力需求"), DataType::Empty],
            &[s("优化版"), DataType::DateTime(45356.5), DataType::Float(55.0), s("x")],
            &[s("对照版"), s("  "), DataType::Int(3), DataType::Empty],
        ]);
        let rows = rows_from_range(&range).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["版本"], Some("优化版".to_string()));
        assert_eq!(rows[0]["开始时间"], Some("2024/03/05 12:00:00".to_string()));
        assert_eq!(rows[0]["脑力需求"], Some("55".to_string()));
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1]["开始时间"], None);
        assert_eq!(rows[1]["脑力需求"], Some("3".to_string()));
    }

    #[test]
    fn duplicated_header_keeps_first_column() {
        let range = sheet(&[&[s("effort"), s("effort")], &[DataType::Int(1), DataType::Int(2)]]);
        let rows = rows_from_range(&range).unwrap();
        assert_eq!(rows[0]["effort"], Some("1".to_string()));
    }

    #[test]
    fn empty_sheet_has_no_header() {
        let range: Range<DataType> = Range::empty();
        assert!(rows_from_range(&range).is_err());
    }

    #[test]
    fn missing_file() {
        assert!(read_excel_rows("does/not/exist.xlsx", None).is_err());
    }
}
