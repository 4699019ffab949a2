//! Wiring from loaded report state to the export engine: turns a family's
//! column table plus the fetched rows into a worksheet or a PDF table.

use crate::export::{MergeRegion, PdfAlign, PdfColumn, SheetSpec, TableDocument};
use crate::numfmt;
use crate::report::dates;
use crate::report::family::{Align, CellKind, ColumnSpec, FamilySpec};
use crate::report::row::ReportRow;

/// Render one cell as display text. Amounts and dates are formatted here,
/// once, so the spreadsheet and the PDF show identical values.
pub fn render_cell(column: &ColumnSpec, row: &ReportRow) -> String {
    match column.kind {
        CellKind::Amount => numfmt::format_number(row.number(column.field), 2),
        CellKind::Date => dates::format_date_thai(&row.text(column.field)),
        CellKind::Text => row.text(column.field),
    }
}

/// Totals row matching the column layout: a label up front, sums under
/// their own columns, everything else blank.
fn totals_row(spec: &FamilySpec, rows: &[ReportRow]) -> Vec<String> {
    spec.columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            if index == 0 {
                return "รวม".to_string();
            }
            match spec.totals.iter().find(|t| t.field == column.field) {
                Some(total) => {
                    let sum: f64 = rows.iter().map(|r| r.number(total.field)).sum();
                    numfmt::format_number(sum, 2)
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Build the single-sheet workbook spec, including the grouped header row
/// and its merge regions when the family defines one.
pub fn sheet(spec: &FamilySpec, rows: &[ReportRow]) -> SheetSpec {
    let mut header_rows = Vec::new();
    let mut merges = Vec::new();

    if !spec.groups.is_empty() {
        let mut group_row = vec![String::new(); spec.columns.len()];
        let mut col: u16 = 0;
        for group in spec.groups {
            group_row[col as usize] = group.title.to_string();
            if group.span > 1 {
                merges.push(MergeRegion {
                    first_row: 0,
                    first_col: col,
                    last_row: 0,
                    last_col: col + group.span - 1,
                });
            }
            col += group.span;
        }
        header_rows.push(group_row);
    }
    header_rows.push(spec.columns.iter().map(|c| c.header.to_string()).collect());

    let mut data: Vec<Vec<String>> = rows
        .iter()
        .map(|row| spec.columns.iter().map(|c| render_cell(c, row)).collect())
        .collect();
    if !rows.is_empty() {
        data.push(totals_row(spec, rows));
    }

    SheetSpec {
        // worksheet names are length-limited, so the family title goes in
        // the document, not the tab
        sheet_name: "รายงาน".to_string(),
        header_rows,
        rows: data,
        merges,
        col_widths: spec.columns.iter().map(|c| c.width).collect(),
    }
}

/// Build the PDF table document for the family.
pub fn table(spec: &FamilySpec, rows: &[ReportRow], subtitle: String) -> TableDocument {
    TableDocument {
        title: spec.title.to_string(),
        subtitle,
        landscape: spec.landscape,
        columns: spec
            .columns
            .iter()
            .map(|c| PdfColumn {
                header: c.header.to_string(),
                width: c.width as f32,
                align: match c.align {
                    Align::Left => PdfAlign::Left,
                    Align::Center => PdfAlign::Center,
                    Align::Right => PdfAlign::Right,
                },
            })
            .collect(),
        rows: rows
            .iter()
            .map(|row| spec.columns.iter().map(|c| render_cell(c, row)).collect())
            .collect(),
        totals_row: if rows.is_empty() {
            None
        } else {
            Some(totals_row(spec, rows))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::family::ReportKind;
    use serde_json::{json, Value};

    fn vat_row(docno: &str, vatbase: f64) -> ReportRow {
        let Value::Object(map) = json!({
            "docno": docno,
            "docdate": "2024-03-05",
            "custname": "บริษัท ตัวอย่าง จำกัด",
            "taxid": "0105500000001",
            "exceptvat": 0.0,
            "vatbase": vatbase,
            "vatamount": vatbase * 0.07,
            "total": vatbase * 1.07,
        }) else {
            unreachable!()
        };
        ReportRow::new("vat-sale", 0, map)
    }

    #[test]
    fn vat_sheet_has_one_header_row_and_a_totals_row() {
        let spec = ReportKind::VatSale.spec();
        let rows = vec![vat_row("JV-001", 1000.0), vat_row("JV-002", 500.0)];
        let sheet = sheet(spec, &rows);

        assert_eq!(sheet.header_rows.len(), 1);
        assert_eq!(sheet.header_rows[0].len(), spec.columns.len());
        assert!(sheet.merges.is_empty());

        // two data rows plus totals
        assert_eq!(sheet.rows.len(), 3);
        let totals = sheet.rows.last().unwrap();
        assert_eq!(totals[0], "รวม");
        assert_eq!(totals[5], "1,500.00"); // vatbase column
        assert_eq!(totals[1], ""); // docno column has no total
    }

    #[test]
    fn grouped_family_gets_two_header_rows_with_merges() {
        let spec = ReportKind::WithholdingPnd3.spec();
        let sheet = sheet(spec, &[]);

        assert_eq!(sheet.header_rows.len(), 2);
        assert_eq!(sheet.merges.len(), 3);
        assert_eq!(sheet.merges[0].first_col, 0);
        assert_eq!(sheet.merges[0].last_col, 1);
        // empty report still renders headers, no totals row
        assert_eq!(sheet.rows.len(), 0);
    }

    #[test]
    fn cells_format_dates_thai_and_amounts_grouped() {
        let spec = ReportKind::VatSale.spec();
        let rows = vec![vat_row("JV-001", 1234.5)];
        let table = table(spec, &rows, "ประจำเดือน มีนาคม 2567".to_string());

        assert_eq!(table.rows[0][0], "05/03/2567");
        assert_eq!(table.rows[0][5], "1,234.50");
        assert!(table.landscape);
        assert_eq!(table.totals_row.as_ref().unwrap()[5], "1,234.50");
    }
}
