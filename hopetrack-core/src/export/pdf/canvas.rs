//! Page canvas over lopdf content streams.
//!
//! Callers work top-down in points from the top-left corner of the page;
//! the canvas flips coordinates when emitting operators. A vertical cursor
//! tracks the next free line and moves to a fresh page on demand.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use super::Rgb;
use crate::config::{PAGE_HEIGHT, PAGE_MARGIN_BOTTOM, PAGE_MARGIN_TOP, PAGE_WIDTH};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Decoded RGB image ready to embed.
pub(crate) struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

pub(crate) struct Canvas {
    pages: Vec<Vec<Operation>>,
    images: Vec<(String, RasterImage)>,
    y: f32,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            images: Vec::new(),
            y: PAGE_MARGIN_TOP,
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_MARGIN_TOP;
    }

    /// Space left above the bottom margin.
    pub fn remaining(&self) -> f32 {
        PAGE_HEIGHT - PAGE_MARGIN_BOTTOM - self.y
    }

    /// Start a new page when less than `needed` points remain.
    /// Returns whether a break happened.
    pub fn ensure(&mut self, needed: f32) -> bool {
        if self.remaining() < needed {
            self.new_page();
            true
        } else {
            false
        }
    }

    /// Strings shown so far, in drawing order.
    #[cfg(test)]
    pub fn drawn_text(&self) -> Vec<String> {
        self.pages
            .iter()
            .flatten()
            .filter(|operation| operation.operator == "Tj")
            .filter_map(|operation| operation.operands.first())
            .filter_map(|operand| operand.as_str().ok())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    fn push(&mut self, operation: Operation) {
        if let Some(page) = self.pages.last_mut() {
            page.push(operation);
        }
    }

    fn flip(y: f32) -> f32 {
        PAGE_HEIGHT - y
    }

    pub fn fill_rect(&mut self, x: f32, top: f32, width: f32, height: f32, color: Rgb) {
        self.push(Operation::new("q", vec![]));
        self.push(Operation::new("rg", color.operands()));
        self.push(Operation::new(
            "re",
            reals(&[x, Self::flip(top + height), width, height]),
        ));
        self.push(Operation::new("f", vec![]));
        self.push(Operation::new("Q", vec![]));
    }

    pub fn stroke_rect(&mut self, x: f32, top: f32, width: f32, height: f32, color: Rgb) {
        self.push(Operation::new("q", vec![]));
        self.push(Operation::new("RG", color.operands()));
        self.push(Operation::new("w", reals(&[0.5])));
        self.push(Operation::new(
            "re",
            reals(&[x, Self::flip(top + height), width, height]),
        ));
        self.push(Operation::new("S", vec![]));
        self.push(Operation::new("Q", vec![]));
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb) {
        self.push(Operation::new("q", vec![]));
        self.push(Operation::new("RG", color.operands()));
        self.push(Operation::new("w", reals(&[0.5])));
        self.push(Operation::new("m", reals(&[x1, Self::flip(y1)])));
        self.push(Operation::new("l", reals(&[x2, Self::flip(y2)])));
        self.push(Operation::new("S", vec![]));
        self.push(Operation::new("Q", vec![]));
    }

    /// Draw one line of text with its baseline at `baseline`.
    pub fn text(&mut self, x: f32, baseline: f32, size: f32, font: Font, color: Rgb, text: &str) {
        if text.is_empty() {
            return;
        }
        self.push(Operation::new("BT", vec![]));
        self.push(Operation::new("rg", color.operands()));
        self.push(Operation::new(
            "Tf",
            vec![
                Object::Name(font.resource_name().as_bytes().to_vec()),
                Object::Real(size),
            ],
        ));
        self.push(Operation::new("Td", reals(&[x, Self::flip(baseline)])));
        self.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi(text), StringFormat::Literal)],
        ));
        self.push(Operation::new("ET", vec![]));
    }

    /// Text centered horizontally between `left` and `left + width`.
    #[allow(clippy::too_many_arguments)]
    pub fn text_centered(
        &mut self,
        left: f32,
        width: f32,
        baseline: f32,
        size: f32,
        font: Font,
        color: Rgb,
        text: &str,
    ) {
        let x = left + (width - text_width(text, size, font)).max(0.0) / 2.0;
        self.text(x, baseline, size, font, color, text);
    }

    /// Place an image scaled to fit the box, keeping its aspect ratio.
    pub fn image(&mut self, image: RasterImage, x: f32, top: f32, max_width: f32, max_height: f32) {
        if image.width == 0 || image.height == 0 {
            return;
        }
        let scale = (max_width / image.width as f32).min(max_height / image.height as f32);
        let (width, height) = (image.width as f32 * scale, image.height as f32 * scale);
        let x = x + (max_width - width) / 2.0;
        let top = top + (max_height - height) / 2.0;

        let name = format!("Im{}", self.images.len() + 1);
        self.push(Operation::new("q", vec![]));
        self.push(Operation::new(
            "cm",
            reals(&[width, 0.0, 0.0, height, x, Self::flip(top + height)]),
        ));
        self.push(Operation::new(
            "Do",
            vec![Object::Name(name.as_bytes().to_vec())],
        ));
        self.push(Operation::new("Q", vec![]));
        self.images.push((name, image));
    }

    /// Draw on every page after layout; used for "Page i of n" footers.
    pub fn stamp_pages(&mut self, mut stamp: impl FnMut(&mut Canvas, usize, usize)) {
        let total = self.pages.len();
        let pages = std::mem::take(&mut self.pages);
        let mut stamped = Vec::with_capacity(total);
        for (index, operations) in pages.into_iter().enumerate() {
            self.pages = vec![operations];
            stamp(self, index + 1, total);
            stamped.extend(self.pages.drain(..));
        }
        self.pages = stamped;
    }

    /// Serialize every page into a PDF document.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(font_dictionary("Helvetica"));
        let bold = doc.add_object(font_dictionary("Helvetica-Bold"));

        let mut xobjects = Dictionary::new();
        for (name, image) in self.images {
            let stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => Object::Integer(i64::from(image.width)),
                    "Height" => Object::Integer(i64::from(image.height)),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => Object::Integer(8),
                },
                image.rgb,
            );
            let image_id = doc.add_object(stream);
            xobjects.set(name.into_bytes(), image_id);
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
            "XObject" => xobjects,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(count),
                "Resources" => resources_id,
                "MediaBox" => reals(&[0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT]),
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

fn font_dictionary(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn reals(values: &[f32]) -> Vec<Object> {
    values.iter().map(|value| Object::Real(*value)).collect()
}

/// Encode text for a WinAnsi (cp1252) font; unmappable characters become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2026}' => 0x85,
            '\u{20ac}' => 0x80,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

/// Approximate Helvetica advance width of `text` at `size` points.
pub(crate) fn text_width(text: &str, size: f32, font: Font) -> f32 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | '!' | ':' | ';' => 0.25,
            'f' | 't' | 'r' | 'I' | ' ' | '(' | ')' | '-' | '/' => 0.32,
            'm' | 'w' | 'M' | 'W' => 0.85,
            '0'..='9' => 0.556,
            c if c.is_uppercase() => 0.68,
            _ => 0.53,
        })
        .sum();
    let factor = match font {
        Font::Regular => 1.0,
        Font::Bold => 1.07,
    };
    em * size * factor
}

/// Greedy word wrap to `width`. Explicit newlines start a new line; words
/// wider than a line are split.
pub(crate) fn wrap(text: &str, width: f32, size: f32, font: Font) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width(&candidate, size, font) <= width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut piece = String::new();
            for c in word.chars() {
                piece.push(c);
                if text_width(&piece, size, font) > width && piece.chars().count() > 1 {
                    piece.pop();
                    lines.push(std::mem::take(&mut piece));
                    piece.push(c);
                }
            }
            current = piece;
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Cut `text` to fit `width`, ending with an ellipsis when shortened.
pub(crate) fn truncate(text: &str, width: f32, size: f32, font: Font) -> String {
    if text_width(text, size, font) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        out.push(c);
        if text_width(&out, size, font) + text_width("...", size, font) > width {
            out.pop();
            break;
        }
    }
    format!("{}...", out.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width_and_newlines() {
        let lines = wrap("alpha beta gamma\ndelta", 60.0, 10.0, Font::Regular);
        assert!(lines.len() >= 3);
        assert_eq!(lines.last().map(String::as_str), Some("delta"));
        for line in &lines {
            assert!(text_width(line, 10.0, Font::Regular) <= 60.0);
        }
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap(&"x".repeat(200), 50.0, 10.0, Font::Regular);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "x".repeat(200));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 100.0, 10.0, Font::Regular), "short");
        let cut = truncate(&"word ".repeat(40), 80.0, 10.0, Font::Regular);
        assert!(cut.ends_with("..."));
        assert!(text_width(&cut, 10.0, Font::Regular) <= 80.0);
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("Ñino “ok”"), vec![0xd1, b'i', b'n', b'o', b' ', 0x93, b'o', b'k', 0x94]);
        assert_eq!(win_ansi("日"), vec![b'?']);
    }

    #[test]
    fn test_page_breaks() {
        let mut canvas = Canvas::new();
        assert!(!canvas.ensure(100.0));
        canvas.advance(PAGE_HEIGHT);
        assert!(canvas.ensure(100.0));
        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.y(), PAGE_MARGIN_TOP);
    }

    #[test]
    fn test_finish_produces_pdf() {
        let mut canvas = Canvas::new();
        canvas.text(40.0, 60.0, 12.0, Font::Bold, Rgb::BLACK, "Hello (world)");
        canvas.new_page();
        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
