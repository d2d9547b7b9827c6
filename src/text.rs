//! OCR text cleanup and block identifier matching.

use regex::Regex;
use std::sync::OnceLock;

/// Letters OCR commonly returns in place of digits.
const CONFUSABLES: [(char, char); 6] = [
    ('O', '0'),
    ('I', '1'),
    ('S', '5'),
    ('G', '6'),
    ('Z', '2'),
    ('B', '8'),
];

/// Characters the OCR engine is allowed to return.
pub const OCR_ALLOWLIST: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Strip everything but letters and digits, uppercase, then map confusable
/// letters to the digits they are usually misread from.
///
/// Non-ASCII letters and digits are kept so they still fail the identifier grammar.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        // Some uppercase expansions carry combining marks.
        .filter(|c| c.is_alphanumeric())
        .map(|c| {
            CONFUSABLES
                .iter()
                .find(|(from, _)| *from == c)
                .map_or(c, |(_, to)| *to)
        })
        .collect()
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 1-3 digits, optionally followed by one letter (e.g. "7", "105", "123A").
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{1,3}[A-Z]?$").expect("static identifier pattern"))
}

/// True when cleaned text looks like a building or block identifier.
pub fn matches_identifier(cleaned: &str) -> bool {
    if cleaned.is_empty() || cleaned.len() > 4 {
        return false;
    }
    identifier_pattern().is_match(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_fixes_common_misreads() {
        assert_eq!(normalize("1O5"), "105");
        assert_eq!(normalize(" blk 12-b "), "8LK128");
        assert_eq!(normalize("s.i.g"), "516");
        assert_eq!(normalize("#23a"), "23A");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("é_ü!"), "ÉÜ");
        assert_eq!(normalize("straße"), "5TRA55E");
    }

    #[test]
    fn non_ascii_alphanumerics_are_not_identifiers() {
        assert_eq!(normalize("1é"), "1É");
        assert!(!matches_identifier(&normalize("1é")));
        assert!(!matches_identifier(&normalize("1\u{0661}")));
        assert!(!matches_identifier(&normalize("\u{0967}2")));
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in [
            "1O5",
            "Blk 123A",
            "  zz9 ",
            "ÄÖÜ ßẞ ﬁ",
            "O0oIiLlSsGgZzBb",
            "__--**",
            "123456789",
            "1é",
            "\u{0390}1",
            "ǅ 7",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input {:?}", raw);
        }
    }

    #[test]
    fn identifier_grammar_boundaries() {
        assert!(matches_identifier("7"));
        assert!(matches_identifier("105"));
        assert!(matches_identifier("123A"));
        assert!(matches_identifier("9Z"));
        assert!(!matches_identifier(""));
        assert!(!matches_identifier("1234"));
        assert!(!matches_identifier("12AB"));
        assert!(!matches_identifier("A12"));
        assert!(!matches_identifier("1234A"));
        assert!(!matches_identifier("12a"));
    }

    #[test]
    fn normalized_ocr_output_feeds_matcher() {
        assert!(matches_identifier(&normalize("1O5")));
        assert!(matches_identifier(&normalize("#4o7c")));
        assert!(!matches_identifier(&normalize("STOP")));
    }
}
