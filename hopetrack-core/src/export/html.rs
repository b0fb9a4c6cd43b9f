//! HTML documents in Office envelopes
//!
//! Excel and Word both open an HTML document that declares their `ProgId`
//! and carries the `mso` conditional XML block. The rich spreadsheet and the
//! Word export share one section model and differ only in the envelope.

use chrono::NaiveDate;
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{case_sections, CaseSummary, ReportSection, ReportTable};
use crate::config::{DEFAULT_REPORT_SUBTITLE, DEFAULT_REPORT_TITLE};
use crate::error::{AppError, Result};
use crate::normalize::{long_date, NormalizedCase};

const STYLE: &str = "body{font-family:Calibri,Arial,sans-serif;font-size:11pt}\
h1{font-size:16pt;margin:0}\
h2{font-size:13pt;background:#1f4e79;color:#ffffff;padding:4px}\
table{border-collapse:collapse;margin-bottom:12px}\
th,td{border:1px solid #999999;padding:3px 6px;vertical-align:top}\
th{background:#dce6f1;text-align:left}\
td.label{font-weight:bold;background:#f2f2f2;width:220px}";

const OFFICE_NS: &str = "urn:schemas-microsoft-com:office:office";
const HTML_NS: &str = "http://www.w3.org/TR/REC-html40";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Envelope {
    Excel,
    Word,
}

impl Envelope {
    fn prog_id(self) -> &'static str {
        match self {
            Envelope::Excel => "Excel.Sheet",
            Envelope::Word => "Word.Document",
        }
    }

    /// Body of the `[if gte mso 9]` conditional comment.
    fn office_block(self, name: &str) -> String {
        match self {
            Envelope::Excel => format!(
                "[if gte mso 9]><xml><x:ExcelWorkbook><x:ExcelWorksheets>\
                 <x:ExcelWorksheet><x:Name>{}</x:Name><x:WorksheetOptions>\
                 <x:DisplayGridlines/></x:WorksheetOptions></x:ExcelWorksheet>\
                 </x:ExcelWorksheets></x:ExcelWorkbook></xml><![endif]",
                escape(name)
            ),
            Envelope::Word => "[if gte mso 9]><xml><w:WordDocument><w:View>Print</w:View>\
                 <w:Zoom>100</w:Zoom></w:WordDocument></xml><![endif]"
                .to_string(),
        }
    }
}

fn xml_error(e: impl std::fmt::Display) -> AppError {
    AppError::Export(format!("HTML write failed: {}", e))
}

/// Thin layer over `quick_xml::Writer` for the handful of HTML shapes used here.
struct HtmlWriter {
    xml: Writer<Vec<u8>>,
}

impl HtmlWriter {
    fn new() -> Self {
        Self {
            xml: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.xml.write_event(event).map_err(xml_error)
    }

    fn start(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.event(Event::Start(element))
    }

    fn end(&mut self, tag: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(tag)))
    }

    fn text(&mut self, value: &str) -> Result<()> {
        self.event(Event::Text(BytesText::new(value)))
    }

    fn newline(&mut self) -> Result<()> {
        self.event(Event::Text(BytesText::from_escaped("\n")))
    }

    /// `<tag>value</tag>`
    fn element(&mut self, tag: &str, value: &str) -> Result<()> {
        self.start(BytesStart::new(tag))?;
        self.text(value)?;
        self.end(tag)
    }

    fn open(&mut self, envelope: Envelope, name: &str) -> Result<()> {
        let office_prefix = match envelope {
            Envelope::Excel => ("xmlns:x", "urn:schemas-microsoft-com:office:excel"),
            Envelope::Word => ("xmlns:w", "urn:schemas-microsoft-com:office:word"),
        };
        self.start(BytesStart::new("html").with_attributes([
            ("xmlns:o", OFFICE_NS),
            office_prefix,
            ("xmlns", HTML_NS),
        ]))?;
        self.newline()?;
        self.start(BytesStart::new("head"))?;
        self.newline()?;
        self.event(Event::Empty(BytesStart::new("meta").with_attributes([
            ("http-equiv", "Content-Type"),
            ("content", "text/html; charset=utf-8"),
        ])))?;
        self.newline()?;
        self.event(Event::Empty(
            BytesStart::new("meta").with_attributes([("name", "ProgId"), ("content", envelope.prog_id())]),
        ))?;
        self.newline()?;
        if envelope == Envelope::Word {
            self.element("title", name)?;
            self.newline()?;
        }
        let block = envelope.office_block(name);
        self.event(Event::Comment(BytesText::from_escaped(block.as_str())))?;
        self.newline()?;
        self.start(BytesStart::new("style"))?;
        self.event(Event::Text(BytesText::from_escaped(STYLE)))?;
        self.end("style")?;
        self.newline()?;
        self.end("head")?;
        self.newline()?;
        self.start(BytesStart::new("body"))?;
        self.newline()
    }

    fn close(mut self) -> Result<String> {
        self.end("body")?;
        self.newline()?;
        self.end("html")?;
        self.newline()?;
        String::from_utf8(self.xml.into_inner()).map_err(xml_error)
    }

    fn table(&mut self, table: &ReportTable) -> Result<()> {
        self.start(BytesStart::new("table"))?;
        self.newline()?;
        self.start(BytesStart::new("tr"))?;
        for column in table.columns {
            self.element("th", column)?;
        }
        self.end("tr")?;
        self.newline()?;

        if table.rows.is_empty() {
            let span = table.columns.len().to_string();
            self.start(BytesStart::new("tr"))?;
            self.start(BytesStart::new("td").with_attributes([("colspan", span.as_str())]))?;
            self.text("No records")?;
            self.end("td")?;
            self.end("tr")?;
            self.newline()?;
        }
        for row in &table.rows {
            self.start(BytesStart::new("tr"))?;
            for value in row {
                self.element("td", value)?;
            }
            self.end("tr")?;
            self.newline()?;
        }
        self.end("table")?;
        self.newline()
    }

    fn section(&mut self, section: &ReportSection) -> Result<()> {
        self.element("h2", section.title)?;
        self.newline()?;

        if !section.fields.is_empty() {
            self.start(BytesStart::new("table"))?;
            self.newline()?;
            for (label, value) in &section.fields {
                self.start(BytesStart::new("tr"))?;
                self.start(BytesStart::new("td").with_attributes([("class", "label")]))?;
                self.text(label)?;
                self.end("td")?;
                self.element("td", value)?;
                self.end("tr")?;
                self.newline()?;
            }
            self.end("table")?;
            self.newline()?;
        }

        if let Some(table) = &section.table {
            self.table(table)?;
        }
        Ok(())
    }

    /// `<p>` with lines separated by `<br/>`.
    fn lines(&mut self, lines: &[&str]) -> Result<()> {
        self.start(BytesStart::new("p"))?;
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                self.event(Event::Empty(BytesStart::new("br")))?;
            }
            self.text(line)?;
        }
        self.end("p")?;
        self.newline()
    }
}

fn case_document(envelope: Envelope, case: &NormalizedCase, today: NaiveDate) -> Result<String> {
    let name = case.full_name();
    let mut out = HtmlWriter::new();
    out.open(envelope, if name.is_empty() { "Case" } else { name.as_str() })?;

    out.element("h1", DEFAULT_REPORT_TITLE)?;
    out.newline()?;
    let generated = format!("Generated {}", long_date(&today.to_string()));
    out.lines(&[DEFAULT_REPORT_SUBTITLE, name.as_str(), generated.as_str()])?;

    for section in case_sections(case, today) {
        out.section(&section)?;
    }

    out.close()
}

/// Single case as a sectioned spreadsheet (`.xls`).
pub fn render_case_spreadsheet(case: &NormalizedCase, today: NaiveDate) -> Result<String> {
    tracing::debug!("Rendering case spreadsheet");
    case_document(Envelope::Excel, case, today)
}

/// Single case as a Word document (`.doc`).
pub fn render_case_word(case: &NormalizedCase, today: NaiveDate) -> Result<String> {
    tracing::debug!("Rendering case Word document");
    case_document(Envelope::Word, case, today)
}

/// Bulk summary as a spreadsheet.
pub fn render_all_cases_spreadsheet(cases: &[CaseSummary], today: NaiveDate) -> Result<String> {
    let mut out = HtmlWriter::new();
    out.open(Envelope::Excel, "All Cases")?;
    out.element("h1", DEFAULT_REPORT_TITLE)?;
    out.newline()?;
    let heading = format!(
        "All Cases Summary ({} cases), generated {}",
        cases.len(),
        long_date(&today.to_string())
    );
    out.lines(&[heading.as_str()])?;

    let table = ReportTable {
        columns: &CaseSummary::COLUMNS,
        rows: cases
            .iter()
            .map(|case| case.cells().iter().map(|c| c.to_string()).collect())
            .collect(),
    };
    out.table(&table)?;

    out.close()
}
