use std::fmt::Write as _;
use std::io::{Cursor, Write};

use chrono::NaiveDate;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const SHEET_NAME_LIMIT: usize = 31;
const MAX_COLUMN_WIDTH: usize = 60;

#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("workbook has no sheets")]
    Empty,
    #[error("zip write failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Text as shown in print output and used for column widths.
    pub fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(value) if value.is_finite() => value.to_string(),
            Self::Number(_) | Self::Empty => String::new(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Empty)
    }
}

/// One tabular sheet: a header row, body rows, and an optional footer row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub footer: Option<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows: Vec::new(),
            footer: None,
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn with_footer(mut self, footer: Vec<Cell>) -> Self {
        self.footer = Some(footer);
        self
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths = self
            .columns
            .iter()
            .map(|column| column.chars().count())
            .collect::<Vec<_>>();
        for row in self.rows.iter().chain(self.footer.iter()) {
            for (index, cell) in row.iter().enumerate() {
                let width = cell.display().chars().count();
                match widths.get_mut(index) {
                    Some(current) => *current = (*current).max(width),
                    None => widths.push(width),
                }
            }
        }
        widths
            .into_iter()
            .map(|width| (width + 2).min(MAX_COLUMN_WIDTH))
            .collect()
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
             <sheetViews><sheetView rightToLeft=\"1\" workbookViewId=\"0\"/></sheetViews>",
        );

        let widths = self.column_widths();
        if !widths.is_empty() {
            xml.push_str("<cols>");
            for (index, width) in widths.iter().enumerate() {
                let _ = write!(
                    xml,
                    "<col min=\"{n}\" max=\"{n}\" width=\"{width}\" customWidth=\"1\"/>",
                    n = index + 1
                );
            }
            xml.push_str("</cols>");
        }

        xml.push_str("<sheetData>");
        let header = self
            .columns
            .iter()
            .map(|column| Cell::Text(column.clone()))
            .collect::<Vec<_>>();
        let body = std::iter::once((&header, true))
            .chain(self.rows.iter().map(|row| (row, false)))
            .chain(self.footer.iter().map(|row| (row, true)));
        for (index, (row, bold)) in body.enumerate() {
            write_row(&mut xml, index + 1, row, bold);
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

fn write_row(xml: &mut String, row_number: usize, cells: &[Cell], bold: bool) {
    let _ = write!(xml, "<row r=\"{row_number}\">");
    let style = if bold { " s=\"1\"" } else { "" };
    for (index, cell) in cells.iter().enumerate() {
        let reference = format!("{}{row_number}", column_name(index));
        match cell {
            Cell::Text(text) => {
                let _ = write!(
                    xml,
                    "<c r=\"{reference}\" t=\"inlineStr\"{style}><is><t xml:space=\"preserve\">{}</t></is></c>",
                    escape_xml(text)
                );
            }
            Cell::Number(value) if value.is_finite() => {
                let _ = write!(xml, "<c r=\"{reference}\"{style}><v>{value}</v></c>");
            }
            Cell::Number(_) | Cell::Empty => {}
        }
    }
    xml.push_str("</row>");
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Unique, Excel-safe names in sheet order.
    fn sheet_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.sheets.len());
        for (index, sheet) in self.sheets.iter().enumerate() {
            let base = sanitize_sheet_name(&sheet.name, index + 1);
            let mut candidate = base.clone();
            let mut suffix = 2;
            while names.iter().any(|name| name.eq_ignore_ascii_case(&candidate)) {
                let tail = format!(" ({suffix})");
                let keep = SHEET_NAME_LIMIT.saturating_sub(tail.chars().count());
                candidate = format!("{}{tail}", base.chars().take(keep).collect::<String>());
                suffix += 1;
            }
            names.push(candidate);
        }
        names
    }

    pub fn to_xlsx(&self) -> Result<Vec<u8>, SpreadsheetError> {
        if self.sheets.is_empty() {
            return Err(SpreadsheetError::Empty);
        }
        let names = self.sheet_names();
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types(self.sheets.len()).as_bytes())?;
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS.as_bytes())?;
        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(workbook_xml(&names).as_bytes())?;
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(workbook_rels(self.sheets.len()).as_bytes())?;
        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(STYLES.as_bytes())?;
        for (index, sheet) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)?;
            zip.write_all(sheet.to_xml().as_bytes())?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

/// `Dues report` on 2026-02-15 becomes `Dues_report_2026-02-15.xlsx`.
pub fn export_filename(title: &str, today: NaiveDate) -> String {
    let stem = title.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{stem}_{}.xlsx", today.format("%Y-%m-%d"))
}

fn sanitize_sheet_name(raw: &str, position: usize) -> String {
    let cleaned = raw
        .chars()
        .map(|ch| match ch {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => ' ',
            other => other,
        })
        .collect::<String>();
    let trimmed = cleaned.trim().trim_matches('\'');
    if trimmed.is_empty() {
        return format!("Sheet{position}");
    }
    trimmed.chars().take(SHEET_NAME_LIMIT).collect()
}

fn column_name(index: usize) -> String {
    let mut name = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let offset = (remaining - 1) % 26;
        name.push(b'A' + offset as u8);
        remaining = (remaining - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(ch),
            ch if (ch as u32) < 0x20 => {}
            ch => escaped.push(ch),
        }
    }
    escaped
}

fn content_types(sheet_count: usize) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
         <Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>",
    );
    for index in 1..=sheet_count {
        let _ = write!(
            xml,
            "<Override PartName=\"/xl/worksheets/sheet{index}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>"
        );
    }
    xml.push_str("</Types>");
    xml
}

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
</Relationships>";

const STYLES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
<fonts count=\"2\"><font><sz val=\"11\"/><name val=\"Calibri\"/></font><font><b/><sz val=\"11\"/><name val=\"Calibri\"/></font></fonts>\
<fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill><fill><patternFill patternType=\"gray125\"/></fill></fills>\
<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>\
<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\
<cellXfs count=\"2\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/><xf numFmtId=\"0\" fontId=\"1\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyFont=\"1\"/></cellXfs>\
</styleSheet>";

fn workbook_xml(names: &[String]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
         <workbookPr/><bookViews><workbookView rightToLeft=\"1\"/></bookViews><sheets>",
    );
    for (index, name) in names.iter().enumerate() {
        let _ = write!(
            xml,
            "<sheet name=\"{}\" sheetId=\"{id}\" r:id=\"rId{id}\"/>",
            escape_xml(name),
            id = index + 1
        );
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    );
    for index in 1..=sheet_count {
        let _ = write!(
            xml,
            "<Relationship Id=\"rId{index}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{index}.xml\"/>"
        );
    }
    let _ = write!(
        xml,
        "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
        sheet_count + 1
    );
    xml.push_str("</Relationships>");
    xml
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::{column_name, export_filename, Cell, Sheet, Workbook};
    use chrono::NaiveDate;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
        let mut part = archive.by_name(name).expect("part present");
        let mut content = String::new();
        part.read_to_string(&mut content).expect("utf-8 part");
        content
    }

    #[test]
    fn writes_right_to_left_sheet_with_escaped_text() {
        let mut sheet = Sheet::new("تقرير المطالبات", &["المبنى/الغرفة", "المبلغ المتبقي"]);
        sheet.push_row(vec![Cell::from("1 / 12"), Cell::from(850.0)]);
        sheet.push_row(vec![Cell::from("<A & B>"), Cell::Empty]);
        let sheet = sheet.with_footer(vec![Cell::from("الإجمالي"), Cell::from(850.0)]);
        let bytes = Workbook::new().with_sheet(sheet).to_xlsx().expect("xlsx");

        let xml = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(xml.contains("rightToLeft=\"1\""));
        assert!(xml.contains("&lt;A &amp; B&gt;"));
        assert!(xml.contains("<c r=\"B2\"><v>850</v></c>"));
        assert!(xml.contains("<row r=\"4\">"));

        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains("name=\"تقرير المطالبات\""));
    }

    #[test]
    fn sheet_names_are_sanitized_truncated_and_unique() {
        let long = "x".repeat(40);
        let workbook = Workbook::new()
            .with_sheet(Sheet::new("a/b:c", &["x"]))
            .with_sheet(Sheet::new(long.clone(), &["x"]))
            .with_sheet(Sheet::new(long, &["x"]))
            .with_sheet(Sheet::new("  ", &["x"]));
        let names = workbook.sheet_names();
        assert_eq!(names[0], "a b c");
        assert_eq!(names[1].chars().count(), 31);
        assert!(names[2].ends_with(" (2)"));
        assert_eq!(names[2].chars().count(), 31);
        assert_eq!(names[3], "Sheet4");
    }

    #[test]
    fn empty_workbook_is_rejected() {
        assert!(Workbook::new().to_xlsx().is_err());
    }

    #[test]
    fn names_columns_and_files() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        let today = NaiveDate::from_ymd_opt(2026, 2, 15).expect("date");
        assert_eq!(
            export_filename("المستحقات المالية القادمة", today),
            "المستحقات_المالية_القادمة_2026-02-15.xlsx"
        );
    }
}
