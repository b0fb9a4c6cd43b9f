//! One-table summary across many cases.

use chrono::NaiveDate;

use super::canvas::{Canvas, Font};
use super::{stamp_page_numbers, Rgb, TableLayout};
use crate::config::{
    DEFAULT_REPORT_TITLE, PAGE_WIDTH, SUMMARY_TABLE_WIDTH_RATIO, TABLE_BREAK_THRESHOLD,
};
use crate::error::Result;
use crate::export::CaseSummary;
use crate::normalize::long_date;

pub fn render_all_cases_pdf(cases: &[CaseSummary], today: NaiveDate) -> Result<Vec<u8>> {
    let mut canvas = Canvas::new();
    let width = PAGE_WIDTH * SUMMARY_TABLE_WIDTH_RATIO;
    let x = (PAGE_WIDTH - width) / 2.0;

    let top = canvas.y();
    canvas.text_centered(
        0.0,
        PAGE_WIDTH,
        top + 18.0,
        18.0,
        Font::Bold,
        Rgb::NAVY,
        DEFAULT_REPORT_TITLE,
    );
    canvas.text_centered(
        0.0,
        PAGE_WIDTH,
        top + 36.0,
        11.0,
        Font::Regular,
        Rgb::BLACK,
        "All Cases Summary",
    );
    let generated = format!(
        "Generated {} | {} cases",
        long_date(&today.to_string()),
        cases.len()
    );
    canvas.text_centered(
        0.0,
        PAGE_WIDTH,
        top + 50.0,
        8.0,
        Font::Regular,
        Rgb::MUTED,
        &generated,
    );
    canvas.advance(64.0);

    let rows: Vec<Vec<String>> = cases
        .iter()
        .map(|case| case.cells().iter().map(|cell| cell.to_string()).collect())
        .collect();
    let layout = TableLayout {
        x,
        width,
        columns: &CaseSummary::COLUMNS,
        font_size: 9.0,
        max_lines: 2,
        header_color: Rgb::NAVY,
    };
    layout.draw(&mut canvas, &rows, TABLE_BREAK_THRESHOLD);

    tracing::debug!(
        "Summary of {} cases laid out on {} pages",
        cases.len(),
        canvas.page_count()
    );
    stamp_page_numbers(&mut canvas, DEFAULT_REPORT_TITLE);
    canvas.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Document;

    fn summaries(count: usize) -> Vec<CaseSummary> {
        (0..count)
            .map(|i| CaseSummary {
                name: format!("Client {}", i),
                age: "12".into(),
                program: "Youth".into(),
                last_updated: "2024-06-01".into(),
            })
            .collect()
    }

    #[test]
    fn test_summary_paginates_with_footer_on_every_page() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let bytes = render_all_cases_pdf(&summaries(150), today).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert!(pages.len() > 1);
        for (number, page_id) in pages {
            let content = doc.get_page_content(page_id).unwrap();
            let expected = format!("Page {} of {}", number, doc.get_pages().len());
            let content = String::from_utf8_lossy(&content);
            assert!(content.contains(&expected), "missing footer on page {}", number);
        }
    }

    #[test]
    fn test_empty_summary_renders_one_page() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let bytes = render_all_cases_pdf(&[], today).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
