//! Heuristic table extraction from plain PDF text.
//!
//! There is no layout information left by the time text reaches this stage,
//! so "is this a table?" is answered per line: a line whose words are
//! separated by a tab or by a wide gap of whitespace probably came from a
//! table column layout. Ordinary prose uses single spaces and is discarded.
//!
//! The first tabular line is the header. Every later tabular line with
//! exactly as many cells as the header becomes a row; the rest are dropped.
//! Documents whose tables do not survive extraction with wide gaps simply
//! yield [`NoTableReason::TooFewTabularLines`].
//!
//! The line test and the cell splitter sit behind [`LineHeuristic`] so a
//! different signal can be plugged in without touching parsing, rendering, or
//! file naming.

use crate::error::{DashboardError, NoTableReason};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ── Data model ───────────────────────────────────────────────────────────────

/// One table cell: a number when the text is strictly numeric, else text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

static RE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)$").unwrap());

impl CellValue {
    /// Coerce a raw cell into a value.
    ///
    /// Accepted numeric grammar: optional `+`/`-`, then digits with an
    /// optional single `.` and fraction, or `.` followed by digits. At least
    /// one digit is required; exponents, thousands separators and locale
    /// decimal commas are text. `"-"`, `"."`, `""` stay text, and so do
    /// digit runs too long to fit a finite `f64`.
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        if RE_NUMBER.is_match(trimmed) {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return CellValue::Number(n);
                }
            }
        }
        CellValue::Text(trimmed.to_string())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// A table recovered from document text.
///
/// Every row has exactly `headers.len()` cells; [`TableParser`] drops rows
/// that do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ExtractedTable {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// ── Line heuristic ───────────────────────────────────────────────────────────

/// Decides which lines look tabular and how to cut them into cells.
pub trait LineHeuristic: Send + Sync {
    /// True when `line` should be treated as a table line.
    fn is_tabular(&self, line: &str) -> bool;

    /// Cells of a tabular line, trimmed, with empty cells removed.
    fn split_cells(&self, line: &str) -> Vec<String>;
}

/// Column gap: a tab, or two or more whitespace characters in a row.
static RE_COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t|\s{2,}").unwrap());

/// Default heuristic: columns are separated by a tab or a run of 2+
/// whitespace characters. A single space is part of a cell ("New York").
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceHeuristic;

impl LineHeuristic for WhitespaceHeuristic {
    fn is_tabular(&self, line: &str) -> bool {
        RE_COLUMN_GAP.is_match(line)
    }

    fn split_cells(&self, line: &str) -> Vec<String> {
        RE_COLUMN_GAP
            .split(line)
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// ── Parser ───────────────────────────────────────────────────────────────────

/// Turns text into an [`ExtractedTable`] using a [`LineHeuristic`].
#[derive(Debug, Clone, Default)]
pub struct TableParser<H = WhitespaceHeuristic> {
    heuristic: H,
}

impl<H: LineHeuristic> TableParser<H> {
    pub fn new(heuristic: H) -> Self {
        Self { heuristic }
    }

    /// Parse `text` into a table.
    ///
    /// # Errors
    /// [`DashboardError::NoTableFound`] when fewer than two lines look
    /// tabular, or when no row matches the header's column count.
    pub fn parse(&self, text: &str) -> Result<ExtractedTable, DashboardError> {
        let tabular: Vec<&str> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter(|line| self.heuristic.is_tabular(line))
            .collect();

        if tabular.len() < 2 {
            debug!("Only {} tabular line(s); no table", tabular.len());
            return Err(DashboardError::NoTableFound(
                NoTableReason::TooFewTabularLines {
                    found: tabular.len(),
                },
            ));
        }

        let headers = self.heuristic.split_cells(tabular[0]);
        let columns = headers.len();

        let rows: Vec<Vec<CellValue>> = tabular[1..]
            .iter()
            .map(|line| self.heuristic.split_cells(line))
            .filter(|cells| cells.len() == columns)
            .map(|cells| cells.iter().map(|c| CellValue::coerce(c)).collect())
            .collect();

        debug!(
            "Header has {} columns; kept {}/{} candidate rows",
            columns,
            rows.len(),
            tabular.len() - 1
        );

        if rows.is_empty() {
            return Err(DashboardError::NoTableFound(
                NoTableReason::NoValidDataRows { columns },
            ));
        }

        Ok(ExtractedTable { headers, rows })
    }
}

/// Parse `text` with the default [`WhitespaceHeuristic`].
pub fn parse_table(text: &str) -> Result<ExtractedTable, DashboardError> {
    TableParser::<WhitespaceHeuristic>::default().parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn reason(err: DashboardError) -> NoTableReason {
        match err {
            DashboardError::NoTableFound(r) => r,
            other => panic!("expected NoTableFound, got {other:?}"),
        }
    }

    // ── Heuristic ────────────────────────────────────────────────────────

    #[test]
    fn heuristic_accepts_tabs_and_wide_gaps() {
        let h = WhitespaceHeuristic;
        assert!(h.is_tabular("Name\tScore"));
        assert!(h.is_tabular("Name  Score"));
        assert!(h.is_tabular("Name      Score"));
        assert!(h.is_tabular("\tindented"));
    }

    #[test]
    fn heuristic_rejects_prose() {
        let h = WhitespaceHeuristic;
        assert!(!h.is_tabular("not a table line"));
        assert!(!h.is_tabular("single"));
        assert!(!h.is_tabular(""));
    }

    #[test]
    fn heuristic_keeps_single_spaces_inside_cells() {
        let cells = WhitespaceHeuristic.split_cells("  New York   8.3\tUnited States  ");
        assert_eq!(cells, vec!["New York", "8.3", "United States"]);
    }

    #[test]
    fn heuristic_collapses_repeated_tabs() {
        let cells = WhitespaceHeuristic.split_cells("a\t\tb");
        assert_eq!(cells, vec!["a", "b"]);
    }

    // ── Numeric coercion ─────────────────────────────────────────────────

    #[test]
    fn coerce_numbers() {
        assert_eq!(CellValue::coerce("90"), num(90.0));
        assert_eq!(CellValue::coerce("-3"), num(-3.0));
        assert_eq!(CellValue::coerce("+2.5"), num(2.5));
        assert_eq!(CellValue::coerce("1."), num(1.0));
        assert_eq!(CellValue::coerce(".5"), num(0.5));
        assert_eq!(CellValue::coerce(" 42 "), num(42.0));
    }

    #[test]
    fn coerce_rejects_non_numbers() {
        for raw in ["", "-", ".", "+", "1e5", "1,000", "1.2.3", "12abc", "inf", "NaN", "3,5"] {
            assert!(
                !CellValue::coerce(raw).is_number(),
                "{raw:?} should stay text"
            );
        }
    }

    #[test]
    fn coercion_is_idempotent() {
        for raw in ["90", "-3", "85.5", "0.001", "+7", ".25", "123456789"] {
            let first = CellValue::coerce(raw);
            let again = CellValue::coerce(&first.to_string());
            assert_eq!(first, again, "re-coercing {raw:?}");
        }
    }

    #[test]
    fn overflowing_digit_runs_stay_text() {
        let huge = "9".repeat(400);
        assert_eq!(CellValue::coerce(&huge), text(&huge));
        assert_eq!(CellValue::coerce(&format!("-{huge}")), text(&format!("-{huge}")));

        let table = parse_table(&format!("A  B\nx  {huge}")).unwrap();
        assert_eq!(table.rows[0][1], text(&huge));
        let json = serde_json::to_string(&table.rows).unwrap();
        assert!(!json.contains("null"), "{json}");

        let first = CellValue::coerce(&huge);
        assert_eq!(CellValue::coerce(&first.to_string()), first);
    }

    #[test]
    fn large_finite_numbers_round_trip_through_display() {
        let raw = format!("1{}", "0".repeat(30));
        let first = CellValue::coerce(&raw);
        assert!(first.is_number());
        assert_eq!(CellValue::coerce(&first.to_string()), first);
    }

    #[test]
    fn cell_serialises_untagged() {
        let row = vec![text("Alice"), num(90.0)];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"["Alice",90.0]"#);
    }

    // ── Parser ───────────────────────────────────────────────────────────

    #[test]
    fn tab_separated_table_drops_prose() {
        let table = parse_table("Name\tScore\nAlice\t90\nBob\t85\nnot a table line").unwrap();
        assert_eq!(table.headers, vec!["Name", "Score"]);
        assert_eq!(
            table.rows,
            vec![vec![text("Alice"), num(90.0)], vec![text("Bob"), num(85.0)]]
        );
    }

    #[test]
    fn single_tabular_line_is_not_a_table() {
        let err = parse_table("Heading\nName\tScore\njust prose here").unwrap_err();
        assert_eq!(reason(err), NoTableReason::TooFewTabularLines { found: 1 });
    }

    #[test]
    fn empty_text_is_not_a_table() {
        let err = parse_table("").unwrap_err();
        assert_eq!(reason(err), NoTableReason::TooFewTabularLines { found: 0 });
    }

    #[test]
    fn rows_with_wrong_width_are_dropped() {
        let table = parse_table("A  B\n1  2\n3  4  5").unwrap();
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows, vec![vec![num(1.0), num(2.0)]]);
    }

    #[test]
    fn no_matching_rows_is_distinct_failure() {
        let err = parse_table("A  B  C\n1  2\n3  4").unwrap_err();
        assert_eq!(reason(err), NoTableReason::NoValidDataRows { columns: 3 });
    }

    #[test]
    fn blank_lines_are_ignored() {
        let table = parse_table("\n   \nCity  Pop\n\n\t\nOslo  0.7\n").unwrap();
        assert_eq!(table.headers, vec!["City", "Pop"]);
        assert_eq!(table.rows, vec![vec![text("Oslo"), num(0.7)]]);
    }

    #[test]
    fn every_row_matches_header_width() {
        let input = "Q  Revenue  Cost\nQ1  10  4\nQ2  12\nQ3  11  5  extra\nQ4  13  6\nnotes follow";
        let table = parse_table(input).unwrap();
        assert_eq!(table.row_count(), 2);
        assert!(table.rows.iter().all(|r| r.len() == table.column_count()));
    }

    #[test]
    fn duplicate_headers_are_kept() {
        let table = parse_table("x  x\n1  2").unwrap();
        assert_eq!(table.headers, vec!["x", "x"]);
    }

    #[test]
    fn custom_heuristic_is_used() {
        struct Pipes;
        impl LineHeuristic for Pipes {
            fn is_tabular(&self, line: &str) -> bool {
                line.contains('|')
            }
            fn split_cells(&self, line: &str) -> Vec<String> {
                line.split('|')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            }
        }

        let table = TableParser::new(Pipes).parse("a | b\n1 | x\nA  B").unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec![num(1.0), text("x")]]);
    }
}
