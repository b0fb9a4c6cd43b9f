//! PDF rendering
//!
//! The case report and the bulk summary are laid out on a [`canvas::Canvas`]
//! and serialized with lopdf using the standard Helvetica fonts, so no font
//! files are embedded.

mod canvas;
mod case_report;
mod summary;

pub use case_report::render_case_pdf;
pub use summary::render_all_cases_pdf;

use lopdf::Object;

use canvas::{Canvas, Font, RasterImage};
use crate::config::{DEFAULT_REPORT_SUBTITLE, DEFAULT_REPORT_TITLE, PAGE_HEIGHT, PAGE_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
    pub const NAVY: Rgb = Rgb(0.12, 0.31, 0.47);
    pub(crate) const GRID: Rgb = Rgb(0.6, 0.6, 0.6);
    pub(crate) const STRIPE: Rgb = Rgb(0.94, 0.95, 0.97);
    pub(crate) const SECTION: Rgb = Rgb(0.86, 0.90, 0.95);
    pub(crate) const MUTED: Rgb = Rgb(0.35, 0.35, 0.35);

    /// Parse `#rrggbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .ok()
                .map(|value| f32::from(value) / 255.0)
        };
        Some(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    fn operands(self) -> Vec<Object> {
        vec![
            Object::Real(self.0),
            Object::Real(self.1),
            Object::Real(self.2),
        ]
    }
}

/// Presentation options for the case report.
#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub title: String,
    pub subtitle: String,
    /// Encoded PNG or JPEG shown at the left of the header band.
    pub logo: Option<Vec<u8>>,
    /// Encoded PNG or JPEG shown at the right of the header band.
    pub photo: Option<Vec<u8>>,
    pub header_color: Rgb,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE.to_string(),
            subtitle: DEFAULT_REPORT_SUBTITLE.to_string(),
            logo: None,
            photo: None,
            header_color: Rgb::NAVY,
        }
    }
}

/// Decode an embedded image. Bad data is logged and skipped so the region
/// stays blank.
fn decode_image(bytes: &[u8], what: &str) -> Option<RasterImage> {
    match image::load_from_memory(bytes) {
        Ok(decoded) => {
            let rgb = decoded.to_rgb8();
            Some(RasterImage {
                width: rgb.width(),
                height: rgb.height(),
                rgb: rgb.into_raw(),
            })
        }
        Err(e) => {
            tracing::warn!("Skipping {} image: {}", what, e);
            None
        }
    }
}

/// "Page i of n" centered in the bottom margin of every page.
fn stamp_page_numbers(canvas: &mut Canvas, footer_left: &str) {
    let footer_left = footer_left.to_string();
    canvas.stamp_pages(|page, index, total| {
        let baseline = PAGE_HEIGHT - 25.0;
        page.text(
            crate::config::PAGE_MARGIN_X,
            baseline,
            7.0,
            Font::Regular,
            Rgb::MUTED,
            &footer_left,
        );
        page.text_centered(
            0.0,
            PAGE_WIDTH,
            baseline,
            8.0,
            Font::Regular,
            Rgb::MUTED,
            &format!("Page {} of {}", index, total),
        );
    });
}

/// Gridded table with a repeated header row after page breaks.
struct TableLayout<'a> {
    x: f32,
    width: f32,
    columns: &'a [&'a str],
    font_size: f32,
    max_lines: usize,
    header_color: Rgb,
}

impl TableLayout<'_> {
    const LINE_HEIGHT: f32 = 10.0;
    const PADDING: f32 = 3.0;

    fn column_width(&self) -> f32 {
        self.width / self.columns.len().max(1) as f32
    }

    fn draw_header(&self, canvas: &mut Canvas) {
        let height = Self::LINE_HEIGHT + 2.0 * Self::PADDING + 2.0;
        let top = canvas.y();
        canvas.fill_rect(self.x, top, self.width, height, self.header_color);
        let column_width = self.column_width();
        for (index, column) in self.columns.iter().enumerate() {
            let x = self.x + index as f32 * column_width;
            let label = canvas::truncate(
                column,
                column_width - 2.0 * Self::PADDING,
                self.font_size,
                Font::Bold,
            );
            canvas.text(
                x + Self::PADDING,
                top + Self::PADDING + self.font_size,
                self.font_size,
                Font::Bold,
                Rgb::WHITE,
                &label,
            );
            canvas.stroke_rect(x, top, column_width, height, Rgb::GRID);
        }
        canvas.advance(height);
    }

    /// Blank cells are shown as `N/A`; long cells wrap up to `max_lines`.
    fn draw(&self, canvas: &mut Canvas, rows: &[Vec<String>], threshold: f32) {
        let column_width = self.column_width();
        let text_width = column_width - 2.0 * Self::PADDING;

        canvas.ensure(threshold + 2.0 * Self::LINE_HEIGHT);
        self.draw_header(canvas);

        for (row_index, row) in rows.iter().enumerate() {
            let cells: Vec<Vec<String>> = row
                .iter()
                .map(|value| {
                    let value = if value.trim().is_empty() { "N/A" } else { value.as_str() };
                    let mut lines = canvas::wrap(value, text_width, self.font_size, Font::Regular);
                    if lines.len() > self.max_lines {
                        lines.truncate(self.max_lines);
                        if let Some(last) = lines.last_mut() {
                            *last = canvas::truncate(
                                &format!("{} ...", last),
                                text_width,
                                self.font_size,
                                Font::Regular,
                            );
                        }
                    }
                    lines
                })
                .collect();

            let line_count = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
            let height = line_count as f32 * Self::LINE_HEIGHT + 2.0 * Self::PADDING;

            if canvas.remaining() < height + threshold {
                canvas.new_page();
                self.draw_header(canvas);
            }

            let top = canvas.y();
            if row_index % 2 == 1 {
                canvas.fill_rect(self.x, top, self.width, height, Rgb::STRIPE);
            }
            for (column, lines) in cells.iter().enumerate() {
                let x = self.x + column as f32 * column_width;
                for (line_index, line) in lines.iter().enumerate() {
                    canvas.text(
                        x + Self::PADDING,
                        top + Self::PADDING + self.font_size + line_index as f32 * Self::LINE_HEIGHT,
                        self.font_size,
                        Font::Regular,
                        Rgb::BLACK,
                        line,
                    );
                }
                canvas.stroke_rect(x, top, column_width, height, Rgb::GRID);
            }
            canvas.advance(height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_from_hex() {
        assert_eq!(Rgb::from_hex("#ffffff"), Some(Rgb::WHITE));
        assert_eq!(Rgb::from_hex("000000"), Some(Rgb::BLACK));
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("#gg0000"), None);
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(decode_image(b"definitely not an image", "logo").is_none());
    }
}
