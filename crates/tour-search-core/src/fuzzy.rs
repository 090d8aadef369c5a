//! Approximate (fuzzy) string matching, parameterized the way Fuse.js is
//! (§4.G): `threshold`, `distance`, `minMatchCharLength`, `ignoreLocation`,
//! `location`. No crate in the retrieval pack implements this exact
//! parameter set, so this module is hand-written rather than borrowed — the
//! one piece of domain logic in this crate with no corpus counterpart
//! (see `DESIGN.md`).
//!
//! The matcher itself is a bounded free-start edit-distance search (Sellers'
//! algorithm): it finds the substring of `text` with the smallest edit
//! distance to `pattern`, independent of where in `text` the match starts.
//! That distance is then folded into a single score the same way Fuse.js
//! does: an accuracy term (`errors / pattern.len()`) plus, unless
//! `ignore_location` is set, a proximity term based on how far the match
//! fell from `location`.

/// Matcher configuration (§4.G).
#[derive(Debug, Clone, Copy)]
pub struct FuzzyOptions {
    pub threshold: f64,
    pub distance: usize,
    pub min_match_char_length: usize,
    pub ignore_location: bool,
    pub location: usize,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self { threshold: 0.4, distance: 100, min_match_char_length: 1, ignore_location: false, location: 0 }
    }
}

/// A successful match: a score in `0.0..=1.0` (0 is a perfect match, higher
/// is worse — `includeScore`'s wire shape) plus the character range it
/// matched, for optional result highlighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch {
    pub score: f64,
    pub start: usize,
    pub end: usize,
}

/// Runs the matcher. Returns `None` when the pattern is empty, shorter than
/// `min_match_char_length`, or no alignment scores within `threshold`.
#[must_use]
pub fn fuzzy_match(text: &str, pattern: &str, opts: &FuzzyOptions) -> Option<FuzzyMatch> {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    if pattern_chars.is_empty() || pattern_chars.len() < opts.min_match_char_length {
        return None;
    }
    let text_chars: Vec<char> = text.chars().collect();
    if text_chars.is_empty() {
        return None;
    }

    let (best_end, best_distance) = free_start_edit_distance(&text_chars, &pattern_chars);
    let best_start = best_end.saturating_sub(pattern_chars.len());

    let accuracy = best_distance as f64 / pattern_chars.len() as f64;
    let score = if opts.ignore_location {
        accuracy
    } else {
        let proximity = best_start.abs_diff(opts.location) as f64;
        if opts.distance == 0 {
            if proximity > 0.0 {
                1.0
            } else {
                accuracy
            }
        } else {
            (accuracy + proximity / opts.distance as f64).min(1.0)
        }
    };

    if score > opts.threshold {
        return None;
    }

    Some(FuzzyMatch { score, start: best_start, end: best_end })
}

/// Free-start bounded edit distance (Sellers' algorithm): finds the text
/// end-position minimizing the edit distance between `pattern` and the text
/// substring ending there, allowing the match to start anywhere in `text`.
fn free_start_edit_distance(text: &[char], pattern: &[char]) -> (usize, usize) {
    let m = pattern.len();
    let n = text.len();
    let mut prev: Vec<usize> = vec![0; n + 1];
    let mut curr: Vec<usize> = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(pattern[i - 1] != text[j - 1]);
            let deletion = prev[j] + 1;
            let insertion = curr[j - 1] + 1;
            let substitution = prev[j - 1] + cost;
            curr[j] = deletion.min(insertion).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    // after the loop, `prev` holds the final row (d[m][*]) because of the swap.
    let mut best_j = 0;
    let mut best_distance = prev[0];
    for (j, &distance) in prev.iter().enumerate() {
        if distance < best_distance {
            best_distance = distance;
            best_j = j;
        }
    }
    (best_j, best_distance)
}
