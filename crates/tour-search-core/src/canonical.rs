//! Text normalization shared by the filter pipeline (§4.C) and the query
//! engine's field comparisons. Every stage is "normalization-aware": strings
//! are NFKD-normalized, lowercased, quote/dash-stripped, bracket-stripped,
//! and whitespace-collapsed before comparison.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\[\]\(\)\{\}]").unwrap());

const QUOTE_CHARS: &[char] = &['"', '\'', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '`'];
const DASH_CHARS: &[char] = &['-', '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}'];

/// Normalizes a string for comparison: NFKD fold, lowercase, strip quote and
/// dash variants, strip bracket characters, collapse whitespace, trim.
///
/// Idempotent: `norm(norm(x)) == norm(x)` for all `x` (§8 round-trip law).
#[must_use]
pub fn norm(input: &str) -> String {
    let folded: String = input.nfkd().collect();
    let lowered = folded.to_lowercase();
    let no_brackets = BRACKETED.replace_all(&lowered, "");
    let stripped: String = no_brackets
        .chars()
        .filter(|c| !QUOTE_CHARS.contains(c) && !DASH_CHARS.contains(c))
        .collect();
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

/// Whether `haystack` contains `needle` after normalizing both sides.
#[must_use]
pub fn norm_contains(haystack: &str, needle: &str) -> bool {
    norm(haystack).contains(&norm(needle))
}

/// Whether `haystack` equals `needle` after normalizing both sides.
#[must_use]
pub fn norm_eq(haystack: &str, needle: &str) -> bool {
    norm(haystack) == norm(needle)
}

/// Whether `haystack` starts with `needle` after normalizing both sides.
#[must_use]
pub fn norm_starts_with(haystack: &str, needle: &str) -> bool {
    norm(haystack).starts_with(&norm(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_on_plain_text() {
        let x = "  Café  de  Paris!! ";
        assert_eq!(norm(&norm(x)), norm(x));
    }

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(norm("  Rooftop   Terrace  "), "rooftop terrace");
    }

    #[test]
    fn strips_quotes_and_dashes() {
        assert_eq!(norm("\u{201C}Lobby\u{201D} - Main"), "lobby main");
    }

    #[test]
    fn strips_bracket_characters_only() {
        assert_eq!(norm("[Gallery] (East)"), "gallery east");
    }

    #[test]
    fn nfkd_folds_compatibility_forms() {
        // U+FB01 LATIN SMALL LIGATURE FI decomposes under NFKD to "fi".
        let ligature = "\u{FB01}rst floor";
        assert_eq!(norm(ligature), "first floor");
    }

    #[test]
    fn contains_starts_with_eq_helpers() {
        assert!(norm_contains("Conference Room", "room"));
        assert!(norm_starts_with("Conference Room", "conference"));
        assert!(norm_eq("  ROOFTOP  ", "rooftop"));
        assert!(!norm_contains("Lobby", "gallery"));
    }

    proptest::proptest! {
        #[test]
        fn idempotence_holds_for_arbitrary_strings(s in ".*") {
            let once = norm(&s);
            let twice = norm(&once);
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
