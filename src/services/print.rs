use std::fmt::Write as _;

use super::spreadsheet::{Cell, Sheet};

const BASE_STYLE: &str = "body{font-family:Arial,sans-serif;margin:24px;direction:rtl}\
pre{white-space:pre-wrap;font-family:inherit;font-size:16px;line-height:1.8}\
table{width:100%;border-collapse:collapse}\
th,td{border:1px solid #999;padding:6px;text-align:center}\
th{background:#f0f0f0}tfoot td{font-weight:bold}";

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            ch => escaped.push(ch),
        }
    }
    escaped
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"ar\" dir=\"rtl\"><head><meta charset=\"utf-8\">\
         <title>{}</title><style>{BASE_STYLE}</style></head>\
         <body>{body}<script>window.onload=function(){{window.print();}}</script></body></html>",
        escape_html(title)
    )
}

/// Printable claim letter; the text keeps its line breaks.
pub fn letter_document(title: &str, letter: &str) -> String {
    document(title, &format!("<pre>{}</pre>", escape_html(letter)))
}

pub fn table_document(sheet: &Sheet) -> String {
    let mut body = format!("<h2>{}</h2><table><thead><tr>", escape_html(&sheet.name));
    for column in &sheet.columns {
        let _ = write!(body, "<th>{}</th>", escape_html(column));
    }
    body.push_str("</tr></thead><tbody>");
    for row in &sheet.rows {
        push_cells(&mut body, row);
    }
    body.push_str("</tbody>");
    if let Some(footer) = &sheet.footer {
        body.push_str("<tfoot>");
        push_cells(&mut body, footer);
        body.push_str("</tfoot>");
    }
    body.push_str("</table>");
    document(&sheet.name, &body)
}

fn push_cells(body: &mut String, cells: &[Cell]) {
    body.push_str("<tr>");
    for cell in cells {
        let _ = write!(body, "<td>{}</td>", escape_html(&cell.display()));
    }
    body.push_str("</tr>");
}
