//! Text normalisation between extraction and table parsing.
//!
//! Only characters that would confuse line splitting are touched. Runs of
//! spaces and tabs are left exactly as extracted since they are the table
//! signal.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all normalisation rules, in order:
///
/// 1. CRLF / lone CR → LF
/// 2. Form feed (page break) → LF
/// 3. Strip invisible Unicode (zero-width characters, BOM, soft hyphen)
pub fn normalise_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = page_breaks_to_newlines(&s);
    remove_invisible_chars(&s)
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn page_breaks_to_newlines(input: &str) -> String {
    input.replace('\u{000C}', "\n")
}

static RE_INVISIBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{200B}\u{200C}\u{200D}\u{2060}\u{FEFF}\u{00AD}]").unwrap());

fn remove_invisible_chars(input: &str) -> String {
    RE_INVISIBLE.replace_all(input, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_form_feed_splits_pages() {
        assert_eq!(page_breaks_to_newlines("end\u{000C}Name\tAge"), "end\nName\tAge");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "Na\u{200B}me\u{FEFF}\tSc\u{00AD}ore";
        assert_eq!(remove_invisible_chars(input), "Name\tScore");
    }

    #[test]
    fn test_whitespace_runs_preserved() {
        let input = "A    B\t\tC\r\n1  2  3";
        assert_eq!(normalise_text(input), "A    B\t\tC\n1  2  3");
    }
}
