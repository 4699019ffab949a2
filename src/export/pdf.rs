//! Client-side tabular PDF rendering.
//!
//! Report text is Thai, which the built-in PDF fonts cannot shape, so the
//! renderer embeds the Sarabun family from the configured font directory.
//! Layout is a simple top-down table: centered title block, a restated
//! header row on every page, automatic row pagination and a page-number
//! footer. Cell text arrives pre-formatted; nothing is reformatted here.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};

use crate::error::{AcctError, Result};

const MARGIN_H: f32 = 8.0;
const TITLE_Y_FROM_TOP: f32 = 14.0;
const SUBTITLE_Y_FROM_TOP: f32 = 21.0;
const TABLE_Y_FROM_TOP: f32 = 26.0;
const FOLLOW_PAGE_Y_FROM_TOP: f32 = 10.0;
const BOTTOM_LIMIT: f32 = 12.0;
const ROW_HEIGHT: f32 = 5.0;
const HEADER_HEIGHT: f32 = 6.0;
const BODY_SIZE: f32 = 7.0;
const TITLE_SIZE: f32 = 14.0;
const SUBTITLE_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;
const PT_TO_MM: f32 = 0.3528;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfAlign {
    Left,
    Center,
    Right,
}

pub struct PdfColumn {
    pub header: String,
    /// Relative width weight; actual widths fill the printable area
    /// proportionally.
    pub width: f32,
    pub align: PdfAlign,
}

/// A report ready to render: title block, column layout and pre-formatted
/// cell text, with an optional bold totals row at the end.
pub struct TableDocument {
    pub title: String,
    pub subtitle: String,
    pub landscape: bool,
    pub columns: Vec<PdfColumn>,
    pub rows: Vec<Vec<String>>,
    pub totals_row: Option<Vec<String>>,
}

/// Rough average glyph advance for Sarabun at a given size. Good enough to
/// place right-aligned numerals and centered titles.
fn estimate_width_mm(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5 * PT_TO_MM
}

/// Truncate to the column width, marking the cut with an ellipsis.
fn fit_text(text: &str, max_width_mm: f32, font_size: f32) -> String {
    if estimate_width_mm(text, font_size) <= max_width_mm {
        return text.to_string();
    }
    let mut out: String = text.to_string();
    while !out.is_empty() && estimate_width_mm(&out, font_size) + 2.0 > max_width_mm {
        out.pop();
    }
    out.push('…');
    out
}

/// Absolute x offsets and widths for each column across the printable area.
fn column_layout(columns: &[PdfColumn], page_width: f32) -> Vec<(f32, f32)> {
    let printable = page_width - 2.0 * MARGIN_H;
    let total_weight: f32 = columns.iter().map(|c| c.width).sum();
    let mut x = MARGIN_H;
    columns
        .iter()
        .map(|c| {
            let w = if total_weight > 0.0 {
                printable * c.width / total_weight
            } else {
                printable / columns.len() as f32
            };
            let offset = x;
            x += w;
            (offset, w)
        })
        .collect()
}

fn cell_x(text: &str, align: PdfAlign, col_x: f32, col_w: f32, font_size: f32) -> f32 {
    match align {
        PdfAlign::Left => col_x + 1.0,
        PdfAlign::Center => col_x + (col_w - estimate_width_mm(text, font_size)) / 2.0,
        PdfAlign::Right => col_x + col_w - 1.0 - estimate_width_mm(text, font_size),
    }
}

fn rule(layer: &PdfLayerReference, y: f32, x_from: f32, x_to: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x_from), Mm(y)), false),
            (Point::new(Mm(x_to), Mm(y)), false),
        ],
        is_closed: false,
    });
}

struct FontPair {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Render the table into an A4 PDF at `out_path`, loading the Sarabun
/// typefaces from `font_dir`.
pub fn render(doc: &TableDocument, font_dir: &Path, out_path: &Path) -> Result<()> {
    let regular_path = font_dir.join("Sarabun-Regular.ttf");
    if !regular_path.exists() {
        return Err(AcctError::FontNotFound(regular_path));
    }
    let bold_path = font_dir.join("Sarabun-Bold.ttf");
    if !bold_path.exists() {
        return Err(AcctError::FontNotFound(bold_path));
    }

    let (page_w, page_h) = if doc.landscape {
        (297.0, 210.0)
    } else {
        (210.0, 297.0)
    };

    let (pdf, first_page, first_layer) =
        PdfDocument::new(&doc.title, Mm(page_w), Mm(page_h), "Layer 1");

    let fonts = FontPair {
        regular: pdf
            .add_external_font(File::open(&regular_path)?)
            .map_err(|e| AcctError::Pdf(e.to_string()))?,
        bold: pdf
            .add_external_font(File::open(&bold_path)?)
            .map_err(|e| AcctError::Pdf(e.to_string()))?,
    };

    let layout = column_layout(&doc.columns, page_w);
    let mut pages = vec![(first_page, first_layer)];
    let mut layer = pdf.get_page(first_page).get_layer(first_layer);

    // Title block, first page only
    let center = page_w / 2.0;
    layer.use_text(
        &doc.title,
        TITLE_SIZE,
        Mm(center - estimate_width_mm(&doc.title, TITLE_SIZE) / 2.0),
        Mm(page_h - TITLE_Y_FROM_TOP),
        &fonts.bold,
    );
    if !doc.subtitle.is_empty() {
        layer.use_text(
            &doc.subtitle,
            SUBTITLE_SIZE,
            Mm(center - estimate_width_mm(&doc.subtitle, SUBTITLE_SIZE) / 2.0),
            Mm(page_h - SUBTITLE_Y_FROM_TOP),
            &fonts.regular,
        );
    }

    let mut y = page_h - TABLE_Y_FROM_TOP;
    y = draw_header(&layer, doc, &fonts, &layout, y, page_w);

    let totals = doc.totals_row.iter();
    let body = doc.rows.iter().map(|r| (r, false));
    let all_rows = body.chain(totals.map(|r| (r, true)));

    for (row, is_totals) in all_rows {
        if y < BOTTOM_LIMIT + ROW_HEIGHT {
            let (next_page, next_layer) = pdf.add_page(Mm(page_w), Mm(page_h), "Layer 1");
            pages.push((next_page, next_layer));
            layer = pdf.get_page(next_page).get_layer(next_layer);
            y = page_h - FOLLOW_PAGE_Y_FROM_TOP;
            y = draw_header(&layer, doc, &fonts, &layout, y, page_w);
        }

        let font = if is_totals { &fonts.bold } else { &fonts.regular };
        if is_totals {
            rule(&layer, y + ROW_HEIGHT - 1.0, MARGIN_H, page_w - MARGIN_H);
        }
        for (cell, (column, (col_x, col_w))) in
            row.iter().zip(doc.columns.iter().zip(layout.iter()))
        {
            let text = fit_text(cell, *col_w - 2.0, BODY_SIZE);
            let x = cell_x(&text, column.align, *col_x, *col_w, BODY_SIZE);
            layer.use_text(&text, BODY_SIZE, Mm(x), Mm(y), font);
        }
        y -= ROW_HEIGHT;
    }

    // Footer on every page, now that the page count is known
    let total_pages = pages.len();
    for (number, (page, layer_index)) in pages.iter().enumerate() {
        let footer = format!("หน้า {} / {}", number + 1, total_pages);
        let footer_layer = pdf.get_page(*page).get_layer(*layer_index);
        footer_layer.use_text(
            &footer,
            FOOTER_SIZE,
            Mm(page_w - MARGIN_H - estimate_width_mm(&footer, FOOTER_SIZE)),
            Mm(5.0),
            &fonts.regular,
        );
    }

    let file = File::create(out_path)?;
    pdf.save(&mut BufWriter::new(file))
        .map_err(|e| AcctError::Pdf(e.to_string()))?;
    Ok(())
}

/// Draw the column header band and the rules around it; returns the y of
/// the first body row.
fn draw_header(
    layer: &PdfLayerReference,
    doc: &TableDocument,
    fonts: &FontPair,
    layout: &[(f32, f32)],
    y: f32,
    page_w: f32,
) -> f32 {
    rule(layer, y + 2.0, MARGIN_H, page_w - MARGIN_H);
    for (column, (col_x, col_w)) in doc.columns.iter().zip(layout.iter()) {
        let text = fit_text(&column.header, *col_w - 2.0, BODY_SIZE);
        let x = cell_x(&text, PdfAlign::Center, *col_x, *col_w, BODY_SIZE);
        layer.use_text(&text, BODY_SIZE, Mm(x), Mm(y - 3.0), &fonts.bold);
    }
    let below = y - HEADER_HEIGHT + 1.0;
    rule(layer, below, MARGIN_H, page_w - MARGIN_H);
    below - ROW_HEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_font_is_reported_with_the_expected_path() {
        let dir = TempDir::new().unwrap();
        let doc = TableDocument {
            title: "รายงาน".to_string(),
            subtitle: String::new(),
            landscape: true,
            columns: Vec::new(),
            rows: Vec::new(),
            totals_row: None,
        };

        let result = render(&doc, dir.path(), &dir.path().join("out.pdf"));
        match result {
            Err(AcctError::FontNotFound(path)) => {
                assert!(path.ends_with("Sarabun-Regular.ttf"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn column_layout_fills_the_printable_width() {
        let columns = vec![
            PdfColumn {
                header: "ก".to_string(),
                width: 1.0,
                align: PdfAlign::Left,
            },
            PdfColumn {
                header: "ข".to_string(),
                width: 3.0,
                align: PdfAlign::Right,
            },
        ];
        let layout = column_layout(&columns, 210.0);
        let printable = 210.0 - 2.0 * MARGIN_H;

        assert_eq!(layout[0].0, MARGIN_H);
        assert!((layout[0].1 - printable / 4.0).abs() < 0.01);
        assert!((layout[1].1 - printable * 3.0 / 4.0).abs() < 0.01);
        assert!((layout[1].0 + layout[1].1 - (210.0 - MARGIN_H)).abs() < 0.01);
    }

    #[test]
    fn long_cells_are_truncated_with_an_ellipsis() {
        let text = "ชื่อบริษัทที่ยาวมากเกินความกว้างของคอลัมน์จริง ๆ";
        let fitted = fit_text(text, 20.0, BODY_SIZE);
        assert!(fitted.ends_with('…'));
        assert!(fitted.chars().count() < text.chars().count());
        assert_eq!(fit_text("สั้น", 20.0, BODY_SIZE), "สั้น");
    }
}
