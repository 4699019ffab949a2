//! Single-sheet spreadsheet export.
//!
//! Takes pre-rendered cell text: amounts arrive already formatted with
//! their separators and the writer never reformats them. Multi-level
//! headers are expressed as extra header rows plus merge regions.

use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, Workbook};

use crate::error::Result;

/// An inclusive rectangular merge, in zero-based cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRegion {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl MergeRegion {
    fn contains(&self, row: u32, col: u16) -> bool {
        row >= self.first_row && row <= self.last_row && col >= self.first_col && col <= self.last_col
    }
}

/// Everything needed to build one worksheet.
pub struct SheetSpec {
    pub sheet_name: String,
    /// One or more header rows; more than one supports grouped headers.
    pub header_rows: Vec<Vec<String>>,
    /// Data matrix, already formatted as display text.
    pub rows: Vec<Vec<String>>,
    /// Merge regions within the header rows. The anchor cell's text labels
    /// the merged range.
    pub merges: Vec<MergeRegion>,
    /// Width hints per column, in characters.
    pub col_widths: Vec<f64>,
}

/// Write the sheet to a workbook file. An empty data matrix still produces
/// a valid header-only file.
pub fn write_workbook(spec: &SheetSpec, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(&spec.sheet_name)?;

    let header_format = Format::new().set_bold().set_align(FormatAlign::Center);

    // Merged ranges carry their own text; regular header cells must skip
    // the covered cells or the writer rejects the overlap.
    for merge in &spec.merges {
        let text = spec
            .header_rows
            .get(merge.first_row as usize)
            .and_then(|row| row.get(merge.first_col as usize))
            .map(String::as_str)
            .unwrap_or("");
        sheet.merge_range(
            merge.first_row,
            merge.first_col,
            merge.last_row,
            merge.last_col,
            text,
            &header_format,
        )?;
    }

    for (r, row) in spec.header_rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (row_idx, col_idx) = (r as u32, c as u16);
            if spec.merges.iter().any(|m| m.contains(row_idx, col_idx)) {
                continue;
            }
            sheet.write_string_with_format(row_idx, col_idx, cell, &header_format)?;
        }
    }

    let data_start = spec.header_rows.len() as u32;
    for (r, row) in spec.rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            sheet.write_string(data_start + r as u32, c as u16, cell)?;
        }
    }

    for (c, width) in spec.col_widths.iter().enumerate() {
        sheet.set_column_width(c as u16, *width)?;
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::TempDir;

    fn read_cell(range: &calamine::Range<Data>, row: u32, col: u32) -> String {
        match range.get_value((row, col)) {
            Some(Data::String(s)) => s.clone(),
            Some(Data::Empty) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    #[test]
    fn header_row_round_trips_exactly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");

        let headers = vec![
            "วันที่".to_string(),
            "เลขที่เอกสาร".to_string(),
            "ฐานภาษี".to_string(),
        ];
        let spec = SheetSpec {
            sheet_name: "รายงาน".to_string(),
            header_rows: vec![headers.clone()],
            rows: vec![vec![
                "15/03/2567".to_string(),
                "JV-001".to_string(),
                "1,500.00".to_string(),
            ]],
            merges: Vec::new(),
            col_widths: vec![12.0, 16.0, 14.0],
        };
        write_workbook(&spec, &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range("รายงาน").unwrap();

        assert_eq!(range.width(), headers.len());
        for (c, header) in headers.iter().enumerate() {
            assert_eq!(&read_cell(&range, 0, c as u32), header);
        }
        assert_eq!(read_cell(&range, 1, 2), "1,500.00");
    }

    #[test]
    fn merged_group_headers_keep_their_anchor_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grouped.xlsx");

        let spec = SheetSpec {
            sheet_name: "ภาษีหัก".to_string(),
            header_rows: vec![
                vec![
                    "เอกสาร".to_string(),
                    String::new(),
                    "จำนวนเงิน".to_string(),
                    String::new(),
                ],
                vec![
                    "วันที่".to_string(),
                    "เลขที่".to_string(),
                    "ฐานภาษี".to_string(),
                    "ภาษีที่หัก".to_string(),
                ],
            ],
            rows: Vec::new(),
            merges: vec![
                MergeRegion {
                    first_row: 0,
                    first_col: 0,
                    last_row: 0,
                    last_col: 1,
                },
                MergeRegion {
                    first_row: 0,
                    first_col: 2,
                    last_row: 0,
                    last_col: 3,
                },
            ],
            col_widths: vec![12.0, 16.0, 14.0, 14.0],
        };
        write_workbook(&spec, &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range("ภาษีหัก").unwrap();

        // anchor cells carry the group titles, second row the column headers
        assert_eq!(read_cell(&range, 0, 0), "เอกสาร");
        assert_eq!(read_cell(&range, 0, 2), "จำนวนเงิน");
        assert_eq!(read_cell(&range, 1, 0), "วันที่");
        assert_eq!(read_cell(&range, 1, 3), "ภาษีที่หัก");
        assert_eq!(range.width(), 4);

        // covered cells stay empty; only the anchors carry text
        assert_eq!(read_cell(&range, 0, 1), "");
        assert_eq!(read_cell(&range, 0, 3), "");
    }

    #[test]
    fn empty_report_still_writes_a_header_only_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.xlsx");

        let spec = SheetSpec {
            sheet_name: "ว่าง".to_string(),
            header_rows: vec![vec!["ก".to_string(), "ข".to_string()]],
            rows: Vec::new(),
            merges: Vec::new(),
            col_widths: Vec::new(),
        };
        write_workbook(&spec, &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range("ว่าง").unwrap();
        assert_eq!(range.height(), 1);
        assert_eq!(read_cell(&range, 0, 1), "ข");
    }
}
