use log::{debug, warn};
use printpdf::image_crate::{self, GenericImageView};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    Actions, BuiltinFont, Color, Greyscale, Image, ImageTransform, IndirectFontRef,
    LinkAnnotation, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Polygon,
    Rect,
};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_LOGO_LINK;
use crate::error::{ReportError, Result};
use crate::table::{ReportTable, COLUMN_COUNT};

// Landscape A4, millimetres, measured from the top-left corner.
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 10.0;

const LOGO_TOP: f32 = 5.0;
const LOGO_WIDTH: f32 = 80.0;

const INFO_TOP: f32 = 40.0;
const INFO_FONT_SIZE: f32 = 10.0;
const INFO_LINE_HEIGHT: f32 = 5.0;
const INFO_GAP: f32 = 5.0;

const TABLE_FONT_SIZE: f32 = 12.0;
const TABLE_LINE_HEIGHT: f32 = 6.0;
const CELL_PADDING: f32 = 1.0;
const STRIPE_GREY: f32 = 237.0 / 255.0;
const RULE_THICKNESS: f32 = 0.2;

const TEXT_FONT_SIZE: f32 = 10.0;
const TEXT_LINE_HEIGHT: f32 = 5.0;

const FOOTER_FONT_SIZE: f32 = 9.0;
const FOOTER_HEIGHT: f32 = 6.0;

const MM_PER_PT: f32 = 0.3528;
// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Files the renderer embeds. Unset paths fall back to built-in fonts and a
/// header without a logo; set paths must be readable.
#[derive(Debug, Clone)]
pub struct ReportAssets {
    pub logo: Option<PathBuf>,
    /// Target of the clickable logo
    pub logo_link: String,
    /// TrueType font for regular text
    pub font: Option<PathBuf>,
    /// TrueType font for the table header
    pub bold_font: Option<PathBuf>,
}

impl Default for ReportAssets {
    fn default() -> Self {
        Self {
            logo: None,
            logo_link: DEFAULT_LOGO_LINK.to_string(),
            font: None,
            bold_font: None,
        }
    }
}

/// Body of the report page.
#[derive(Debug, Clone, Copy)]
pub enum ReportContent<'a> {
    Table(&'a ReportTable),
    Text(&'a str),
}

/// Header metadata printed under the logo.
#[derive(Debug, Clone, Copy)]
pub struct ReportHeader<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub timestamp: Option<&'a str>,
}

impl ReportHeader<'_> {
    fn lines(&self) -> [String; 3] {
        [
            format!("Source: {}", self.source),
            format!("Target: {}", self.target),
            format!("Time: {}", self.timestamp.unwrap_or("None")),
        ]
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Renders a single landscape page and returns the PDF bytes.
///
/// # Errors
///
/// Returns [`ReportError::Render`] when an asset cannot be read or decoded or
/// the document cannot be serialised.
pub fn render_report(
    header: &ReportHeader<'_>,
    content: ReportContent<'_>,
    assets: &ReportAssets,
) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        "Deployment report",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Report",
    );
    let layer = doc.get_page(page).get_layer(layer);
    let fonts = load_fonts(&doc, assets)?;

    if let Some(logo) = &assets.logo {
        draw_logo(&layer, logo, &assets.logo_link)?;
    }

    let mut cursor = INFO_TOP;
    for line in header.lines() {
        cursor += INFO_LINE_HEIGHT;
        layer.use_text(line, INFO_FONT_SIZE, Mm(MARGIN), from_top(cursor), &fonts.regular);
    }
    cursor += INFO_GAP;

    match content {
        ReportContent::Table(table) => draw_table(&layer, &fonts, table, cursor),
        ReportContent::Text(text) => draw_text_block(&layer, &fonts.regular, text, cursor),
    }

    doc.save_to_bytes().map_err(ReportError::render)
}

fn load_fonts(doc: &PdfDocumentReference, assets: &ReportAssets) -> Result<Fonts> {
    let regular = match &assets.font {
        Some(path) => load_external_font(doc, path)?,
        None => doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(ReportError::render)?,
    };

    let bold = match (&assets.bold_font, &assets.font) {
        (Some(path), _) => load_external_font(doc, path)?,
        (None, Some(_)) => regular.clone(),
        (None, None) => doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(ReportError::render)?,
    };

    Ok(Fonts { regular, bold })
}

fn load_external_font(doc: &PdfDocumentReference, path: &Path) -> Result<IndirectFontRef> {
    let file = File::open(path)
        .map_err(|e| ReportError::Render(format!("Cannot open font {}: {e}", path.display())))?;
    doc.add_external_font(file)
        .map_err(|e| ReportError::Render(format!("Cannot load font {}: {e}", path.display())))
}

fn draw_logo(layer: &PdfLayerReference, path: &Path, link: &str) -> Result<()> {
    let bytes = std::fs::read(path)
        .map_err(|e| ReportError::Render(format!("Cannot open logo {}: {e}", path.display())))?;
    let decoded = image_crate::load_from_memory(&bytes)
        .map_err(|e| ReportError::Render(format!("Cannot decode logo {}: {e}", path.display())))?;

    let (width_px, height_px) = decoded.dimensions();
    #[allow(clippy::cast_precision_loss)]
    let dpi = width_px as f32 * 25.4 / LOGO_WIDTH;
    #[allow(clippy::cast_precision_loss)]
    let height = height_px as f32 * 25.4 / dpi;
    let bottom = LOGO_TOP + height;
    debug!("Placing {width_px}x{height_px} logo at {dpi:.0} dpi");

    Image::from_dynamic_image(&decoded).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(MARGIN)),
            translate_y: Some(from_top(bottom)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );

    layer.add_link_annotation(LinkAnnotation::new(
        Rect::new(
            Mm(MARGIN),
            from_top(bottom),
            Mm(MARGIN + LOGO_WIDTH),
            from_top(LOGO_TOP),
        ),
        None,
        None,
        Actions::uri(link.to_string()),
        None,
    ));

    Ok(())
}

fn draw_table(layer: &PdfLayerReference, fonts: &Fonts, table: &ReportTable, top: f32) {
    #[allow(clippy::cast_precision_loss)]
    let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / COLUMN_COUNT as f32;
    let max_chars = chars_per_width(column_width - 2.0 * CELL_PADDING, TABLE_FONT_SIZE);

    let wrapped: Vec<Vec<Vec<String>>> = table
        .rows()
        .iter()
        .map(|row| {
            row.cells()
                .iter()
                .map(|cell| wrap_text(cell, max_chars))
                .collect()
        })
        .collect();
    let heights: Vec<f32> = wrapped
        .iter()
        .map(|cells| {
            let line_count = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
            #[allow(clippy::cast_precision_loss)]
            let height = line_count as f32 * TABLE_LINE_HEIGHT + 2.0 * CELL_PADDING;
            height
        })
        .collect();

    let fitting = rows_that_fit(&heights, top);

    layer.set_outline_color(black());
    layer.set_outline_thickness(RULE_THICKNESS);

    let mut cursor = top;
    for (index, (cells, row_height)) in wrapped.iter().zip(&heights).take(fitting).enumerate() {
        let striped = index % 2 == 1;
        let font = if index == 0 { &fonts.bold } else { &fonts.regular };

        for (column, lines) in cells.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let left = MARGIN + column as f32 * column_width;
            let mode = if striped {
                layer.set_fill_color(Color::Greyscale(Greyscale::new(STRIPE_GREY, None)));
                PaintMode::FillStroke
            } else {
                PaintMode::Stroke
            };
            layer.add_polygon(rectangle(left, cursor, column_width, *row_height, mode));

            layer.set_fill_color(black());
            for (line_index, line) in lines.iter().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let baseline = cursor
                    + CELL_PADDING
                    + line_index as f32 * TABLE_LINE_HEIGHT
                    + ascent(TABLE_FONT_SIZE);
                layer.use_text(
                    line.as_str(),
                    TABLE_FONT_SIZE,
                    Mm(left + CELL_PADDING),
                    from_top(baseline),
                    font,
                );
            }
        }

        cursor += row_height;
    }

    if fitting < table.len() {
        let total = table.data_rows().len();
        let omitted = (table.len() - fitting).min(total);
        warn!("Report page is full, {omitted} of {total} rows not rendered");
        draw_footer(layer, &fonts.regular, &omitted_notice(omitted, total, "rows"));
    }
}

fn draw_text_block(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, top: f32) {
    let max_chars = chars_per_width(PAGE_WIDTH - 2.0 * MARGIN, TEXT_FONT_SIZE);
    let lines: Vec<String> = text
        .lines()
        .flat_map(|line| wrap_text(line, max_chars))
        .collect();
    let fitting = rows_that_fit(&vec![TEXT_LINE_HEIGHT; lines.len()], top);

    layer.set_fill_color(black());
    let mut cursor = top;
    for line in lines.iter().take(fitting) {
        cursor += TEXT_LINE_HEIGHT;
        layer.use_text(line.as_str(), TEXT_FONT_SIZE, Mm(MARGIN), from_top(cursor), font);
    }

    if fitting < lines.len() {
        let omitted = lines.len() - fitting;
        warn!(
            "Report page is full, {omitted} of {} text lines not rendered",
            lines.len()
        );
        draw_footer(layer, font, &omitted_notice(omitted, lines.len(), "lines"));
    }
}

/// Counts the leading rows that fit between `top` and the bottom margin.
/// When some rows do not fit, the footer band is kept free as well.
fn rows_that_fit(heights: &[f32], top: f32) -> usize {
    let bottom = PAGE_HEIGHT - MARGIN;
    if top + heights.iter().sum::<f32>() <= bottom {
        return heights.len();
    }

    let mut cursor = top;
    heights
        .iter()
        .take_while(|height| {
            cursor += **height;
            cursor <= bottom - FOOTER_HEIGHT
        })
        .count()
}

fn omitted_notice(omitted: usize, total: usize, unit: &str) -> String {
    format!("{omitted} of {total} {unit} omitted: the report page is full")
}

fn draw_footer(layer: &PdfLayerReference, font: &IndirectFontRef, notice: &str) {
    layer.set_fill_color(black());
    layer.use_text(
        notice,
        FOOTER_FONT_SIZE,
        Mm(MARGIN),
        from_top(PAGE_HEIGHT - MARGIN - CELL_PADDING),
        font,
    );
}

/// Breaks text into lines of at most `max_chars` characters, preferring
/// whitespace and splitting words that are longer than a line.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..max_chars).collect());
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.len()
        } else {
            current.chars().count() + 1 + word.len()
        };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn chars_per_width(width: f32, font_size: f32) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let chars = (width / (font_size * MM_PER_PT * AVG_GLYPH_WIDTH)).floor() as usize;
    chars.max(1)
}

fn ascent(font_size: f32) -> f32 {
    font_size * MM_PER_PT * 0.8
}

fn from_top(offset: f32) -> Mm {
    Mm(PAGE_HEIGHT - offset)
}

fn black() -> Color {
    Color::Greyscale(Greyscale::new(0.0, None))
}

fn rectangle(left: f32, top: f32, width: f32, height: f32, mode: PaintMode) -> Polygon {
    let (x0, x1) = (Mm(left), Mm(left + width));
    let (y0, y1) = (from_top(top), from_top(top + height));
    Polygon {
        rings: vec![vec![
            (Point::new(x0, y0), false),
            (Point::new(x1, y0), false),
            (Point::new(x1, y1), false),
            (Point::new(x0, y1), false),
        ]],
        mode,
        winding_order: WindingOrder::NonZero,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ReportRow;

    fn header() -> ReportHeader<'static> {
        ReportHeader {
            source: "main",
            target: "test-target",
            timestamp: None,
        }
    }

    fn sample_table(rows: usize) -> ReportTable {
        let mut table = ReportTable::new();
        for i in 0..rows {
            table.push(ReportRow([
                "Unchanged".to_string(),
                format!("MyApexClass{i}"),
                "ApexClass".to_string(),
                format!(".../classes/MyApexClass{i}.cls"),
            ]));
        }
        table
    }

    mod wrap_text {
        use super::*;

        #[test]
        fn keeps_short_text_on_one_line() {
            assert_eq!(wrap_text("Unchanged", 20), ["Unchanged"]);
        }

        #[test]
        fn breaks_on_whitespace() {
            assert_eq!(wrap_text("aaa bbb ccc", 7), ["aaa bbb", "ccc"]);
        }

        #[test]
        fn splits_words_longer_than_a_line() {
            assert_eq!(
                wrap_text("force-app/main/default", 8),
                ["force-ap", "p/main/d", "efault"]
            );
        }

        #[test]
        fn empty_text_is_one_empty_line() {
            assert_eq!(wrap_text("", 10), [""]);
        }
    }

    #[test]
    fn renders_table_to_pdf_bytes() {
        let table = sample_table(2);
        let bytes =
            render_report(&header(), ReportContent::Table(&table), &ReportAssets::default())
                .unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
        assert!(bytes.len() > 100);
    }

    #[test]
    fn renders_free_text_to_pdf_bytes() {
        let bytes = render_report(
            &ReportHeader {
                timestamp: Some("2024.01.15 13:30 CET (UTC+0100)"),
                ..header()
            },
            ReportContent::Text("data"),
            &ReportAssets::default(),
        )
        .unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn overflowing_table_still_renders_one_page() {
        let table = sample_table(200);
        let bytes =
            render_report(&header(), ReportContent::Table(&table), &ReportAssets::default())
                .unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    mod rows_that_fit {
        use super::*;

        #[test]
        fn everything_fits_without_a_footer() {
            let heights = [10.0; 5];
            assert_eq!(rows_that_fit(&heights, 50.0), 5);
        }

        #[test]
        fn exact_fill_needs_no_footer() {
            // 50 + 15 * 10 lands on the bottom margin.
            let heights = [10.0; 15];
            assert_eq!(rows_that_fit(&heights, 50.0), 15);
        }

        #[test]
        fn overflow_keeps_room_for_the_footer() {
            // Without the footer band 15 rows would fit.
            let heights = [10.0; 16];
            assert_eq!(rows_that_fit(&heights, 50.0), 14);
        }
    }

    #[test]
    fn omitted_notice_names_the_shortfall() {
        assert_eq!(
            omitted_notice(3, 40, "rows"),
            "3 of 40 rows omitted: the report page is full"
        );
    }

    #[test]
    fn missing_logo_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let assets = ReportAssets {
            logo: Some(dir.path().join("missing.png")),
            ..ReportAssets::default()
        };
        let err = render_report(&header(), ReportContent::Text("data"), &assets).unwrap_err();
        assert!(matches!(err, ReportError::Render(message) if message.contains("missing.png")));
    }

    #[test]
    fn undecodable_logo_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("logo.png");
        std::fs::write(&logo, b"not an image").unwrap();
        let assets = ReportAssets {
            logo: Some(logo),
            ..ReportAssets::default()
        };
        assert!(render_report(&header(), ReportContent::Text("data"), &assets).is_err());
    }

    #[test]
    fn missing_font_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let assets = ReportAssets {
            font: Some(dir.path().join("DejaVuSansCondensed.ttf")),
            ..ReportAssets::default()
        };
        let err = render_report(&header(), ReportContent::Text("data"), &assets).unwrap_err();
        assert!(err.to_string().contains("DejaVuSansCondensed.ttf"));
    }

    #[test]
    fn header_prints_none_without_timestamp() {
        assert_eq!(header().lines()[2], "Time: None");
    }
}
