//! HTML rendering of dashboards and comparison documents.
//!
//! Output is a single self-contained file with inline CSS so it can be
//! served from a flat static directory with no asset pipeline.
//!
//! Pages are Handlebars templates. Every value goes through `{{...}}`, which
//! HTML-escapes by default; cell content comes straight from untrusted PDFs,
//! so no template uses the raw `{{{...}}}` form.

use crate::pipeline::table::{CellValue, ExtractedTable};
use handlebars::Handlebars;
use once_cell::sync::Lazy;
use serde::Serialize;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{title}}</title>
<style>body{font-family:system-ui,-apple-system,'Segoe UI',sans-serif;margin:2rem;color:#1f2933;background:#f7f9fb}h1{font-size:1.5rem;margin-bottom:1rem}table{border-collapse:collapse;background:#fff;box-shadow:0 1px 3px rgba(0,0,0,.12)}th,td{border:1px solid #d9e2ec;padding:.45rem .8rem;text-align:left}th{background:#334e68;color:#fff}tr:nth-child(even) td{background:#f0f4f8}td.num{text-align:right;font-variant-numeric:tabular-nums}pre{white-space:pre-wrap;background:#fff;padding:1rem;border:1px solid #d9e2ec}</style>
</head>
<body>
<h1>{{title}}</h1>
"#;

const TABLE_PAGE: &str = r#"{{> page_head}}
<table>
<thead><tr>{{#each headers}}<th>{{this}}</th>{{/each}}</tr></thead>
<tbody>
{{#each rows}}<tr>{{#each this}}<td{{#if numeric}} class="num"{{/if}}>{{text}}</td>{{/each}}</tr>
{{/each}}</tbody>
</table>
</body>
</html>
"#;

const TEXT_PAGE: &str = r#"{{> page_head}}
<pre>{{text}}</pre>
</body>
</html>
"#;

static TEMPLATES: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut hb = Handlebars::new();
    hb.register_partial("page_head", PAGE_HEAD).unwrap();
    hb.register_template_string("table", TABLE_PAGE).unwrap();
    hb.register_template_string("text", TEXT_PAGE).unwrap();
    hb
});

/// A rendered, self-contained HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    html: String,
}

impl Document {
    pub fn as_str(&self) -> &str {
        &self.html
    }
}

#[derive(Serialize)]
struct TableView<'a> {
    title: &'a str,
    headers: &'a [String],
    rows: Vec<Vec<CellView>>,
}

#[derive(Serialize)]
struct CellView {
    text: String,
    numeric: bool,
}

impl From<&CellValue> for CellView {
    fn from(cell: &CellValue) -> Self {
        CellView {
            text: cell.to_string(),
            numeric: cell.is_number(),
        }
    }
}

#[derive(Serialize)]
struct TextView<'a> {
    title: &'a str,
    text: &'a str,
}

/// Render an extracted table as a dashboard page.
pub fn render_table(table: &ExtractedTable, title: &str) -> Document {
    let view = TableView {
        title,
        headers: &table.headers,
        rows: table
            .rows
            .iter()
            .map(|row| row.iter().map(CellView::from).collect())
            .collect(),
    };
    render("table", &view)
}

/// Render a pre-assembled text block verbatim under `title`.
///
/// The text is not parsed or summarised, only escaped and wrapped in `<pre>`.
pub fn render_comparison(text: &str, title: &str) -> Document {
    render("text", &TextView { title, text })
}

// The templates are constants and every view field is a string, bool or
// list of those, so rendering can only fail on a template bug.
fn render<T: Serialize>(template: &str, view: &T) -> Document {
    let html = TEMPLATES
        .render(template, view)
        .unwrap_or_else(|e| panic!("built-in template '{template}' failed to render: {e}"));
    Document { html }
}
