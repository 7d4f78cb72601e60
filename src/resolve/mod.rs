//! # Entity resolution for historical ship names
//!
//! Links records that refer to the same ship across archives where the
//! name varies in spelling, casing, and use of articles ("De Batavia" vs
//! "BATAVIA" vs "Battavia"). Everything is implemented from first
//! principles; the matching primitives are deliberately simple and fully
//! pinned down by tests:
//!
//! - [`normalize_ship_name`] — canonical matching form.
//! - [`levenshtein_distance`] / [`levenshtein_similarity`] — edit-based
//!   string similarity.
//! - [`soundex`] — American Soundex phonetic code.
//! - [`date_proximity_score`] — year-distance decay.
//! - [`score_ship_match`] — the weighted composite of the above.
//!
//! The pre-built lookup index lives in [`index`].

pub mod index;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use std::fmt;

// -------------------------------------------------------------------------------------------------
// Ship name normalization
// -------------------------------------------------------------------------------------------------

/// Leading articles and prefixes dropped during normalization: Dutch,
/// French, Spanish and Portuguese articles, naval prefixes, and the bare
/// `S`/`T` left behind by possessives. `SAN`/`SANTA`/`SAO` are *not* here:
/// they are integral to names like "San Pablo" and "Sao Gabriel".
const STRIP_PREFIXES: [&str; 21] = [
    "de", "het", "'t", "den", "der", "a", "o", "la", "el", "los", "las", "le", "les", "hms",
    "voc", "ss", "uss", "css", "rms", "s", "t",
];

static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Z0-9 ]").unwrap());

/// Canonical matching form of a ship name.
///
/// Pipeline: uppercase and collapse whitespace, drop leading prefix words
/// while more than one word remains (apostrophes are trimmed before the
/// prefix test so `'T` strips), then remove everything but letters, digits
/// and spaces, and collapse once more.
///
/// ```
/// use tradewind::resolve::normalize_ship_name;
///
/// assert_eq!(normalize_ship_name("De Batavia"), "BATAVIA");
/// assert_eq!(normalize_ship_name("'T Wapen van Hoorn"), "WAPEN VAN HOORN");
/// assert_eq!(normalize_ship_name("HMS Victory"), "VICTORY");
/// assert_eq!(normalize_ship_name("Santa Ana"), "SANTA ANA");
/// assert_eq!(normalize_ship_name(""), "");
/// ```
pub fn normalize_ship_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let upper = name.to_uppercase();
    let collapsed = SPACE_RE.replace_all(upper.trim(), " ");

    // Prefix words are stripped before punctuation removal so the
    // apostrophe forms survive long enough to be recognized.
    let mut words: Vec<&str> = collapsed.split(' ').collect();
    while words.len() > 1 {
        let head = words[0].trim_matches('\'').to_lowercase();
        if STRIP_PREFIXES.contains(&head.as_str()) {
            words.remove(0);
        } else {
            break;
        }
    }
    let joined = words.join(" ");

    let alnum = NON_ALNUM_RE.replace_all(&joined, "");
    SPACE_RE.replace_all(&alnum, " ").trim().to_string()
}

// -------------------------------------------------------------------------------------------------
// Levenshtein distance
// -------------------------------------------------------------------------------------------------

/// Levenshtein edit distance between two strings, computed over Unicode
/// scalar values with the two-row dynamic program. Ship names run 5-25
/// characters, so the quadratic scan is nowhere near a bottleneck.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    if s1 == s2 {
        return 0;
    }

    let mut a: Vec<char> = s1.chars().collect();
    let mut b: Vec<char> = s2.chars().collect();
    // Shorter string as the row keeps the working set minimal.
    if a.len() > b.len() {
        std::mem::swap(&mut a, &mut b);
    }
    if a.is_empty() {
        return b.len();
    }

    let mut prev: Vec<usize> = (0..=a.len()).collect();
    let mut curr = vec![0; a.len() + 1];
    for (j, &cb) in b.iter().enumerate() {
        curr[0] = j + 1;
        for (i, &ca) in a.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[i + 1] = (curr[i] + 1).min(prev[i + 1] + 1).min(prev[i] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[a.len()]
}

/// Normalized Levenshtein similarity in [0, 1]; 1 for an exact match, and
/// by convention 1 for two empty strings.
pub fn levenshtein_similarity(s1: &str, s2: &str) -> f64 {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();
    let max_len = len1.max(len2);
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(s1, s2) as f64 / max_len as f64
}

// -------------------------------------------------------------------------------------------------
// Soundex
// -------------------------------------------------------------------------------------------------

fn soundex_digit(c: char) -> u8 {
    match c {
        'B' | 'F' | 'P' | 'V' => b'1',
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => b'2',
        'D' | 'T' => b'3',
        'L' => b'4',
        'M' | 'N' => b'5',
        'R' => b'6',
        _ => b'0',
    }
}

/// American Soundex code: the first letter followed by three digits.
///
/// Vowels and `H`/`W`/`Y` reset the repeat-digit suppression but encode
/// nothing themselves; input with no letters yields an empty string.
///
/// ```
/// use tradewind::resolve::soundex;
///
/// assert_eq!(soundex("BATAVIA"), "B310");
/// assert_eq!(soundex("HOLLANDIA"), "H453");
/// assert_eq!(soundex("AMSTERDAM"), "A523");
/// assert_eq!(soundex(""), "");
/// ```
pub fn soundex(name: &str) -> String {
    let letters: Vec<char> = name
        .to_uppercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();
    let Some(&first) = letters.first() else {
        return String::new();
    };

    let mut code = String::with_capacity(4);
    code.push(first);
    let mut prev = soundex_digit(first);
    for &c in &letters[1..] {
        let digit = soundex_digit(c);
        if digit != b'0' && digit != prev {
            code.push(digit as char);
            if code.len() == 4 {
                break;
            }
        }
        prev = digit;
    }
    while code.len() < 4 {
        code.push('0');
    }
    code
}

// -------------------------------------------------------------------------------------------------
// Date proximity
// -------------------------------------------------------------------------------------------------

/// Leading 4-digit year of a date string, if present.
fn extract_year(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.get(0..4)).and_then(|y| y.parse().ok())
}

/// Year-distance proximity score in [0, 1].
///
/// Step decay by the distance to the *closer* of the candidate's start and
/// end years: 0 years scores 1.0, then 0.8 / 0.5 / 0.2, and 0 from four
/// years out. A missing year on either side scores a neutral 0.5 — absence
/// of evidence is not evidence of mismatch.
pub fn date_proximity_score(
    query_date: Option<&str>,
    candidate_start: Option<&str>,
    candidate_end: Option<&str>,
) -> f64 {
    let Some(q_year) = extract_year(query_date) else {
        return 0.5;
    };
    let distances = [extract_year(candidate_start), extract_year(candidate_end)];
    let Some(min_dist) = distances
        .iter()
        .flatten()
        .map(|y| (q_year - y).abs())
        .min()
    else {
        return 0.5;
    };

    match min_dist {
        0 => 1.0,
        1 => 0.8,
        2 => 0.5,
        3 => 0.2,
        _ => 0.0,
    }
}

// -------------------------------------------------------------------------------------------------
// Composite scoring
// -------------------------------------------------------------------------------------------------

/// How a match was established, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Names identical up to casing.
    Exact,
    /// Names identical after normalization.
    NormalizedExact,
    /// Same Soundex code with high string similarity.
    Phonetic,
    /// String similarity alone.
    Fuzzy,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::NormalizedExact => "normalized_exact",
            MatchType::Phonetic => "phonetic",
            MatchType::Fuzzy => "fuzzy",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scored candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub candidate_id: String,
    /// Composite confidence in [0, 1].
    pub confidence: f64,
    pub match_type: MatchType,
    pub name_similarity: f64,
    pub date_proximity: f64,
    pub nationality_match: bool,
    pub phonetic_match: bool,
}

const W_NAME: f64 = 0.50;
const W_DATE: f64 = 0.30;
const W_NATIONALITY: f64 = 0.10;
const W_PHONETIC: f64 = 0.10;

/// Score one candidate record against a query.
///
/// Weights: name similarity 0.50 (Levenshtein on normalized names), date
/// proximity 0.30, nationality agreement 0.10 (two unknowns agree), Soundex
/// agreement 0.10. The composite is clamped into [0, 1].
#[allow(clippy::too_many_arguments)]
pub fn score_ship_match(
    query_name: &str,
    query_date: Option<&str>,
    query_nationality: Option<&str>,
    candidate_name: &str,
    candidate_id: &str,
    candidate_date_start: Option<&str>,
    candidate_date_end: Option<&str>,
    candidate_nationality: Option<&str>,
) -> MatchResult {
    let q_norm = normalize_ship_name(query_name);
    let c_norm = normalize_ship_name(candidate_name);

    let name_similarity = levenshtein_similarity(&q_norm, &c_norm);
    let date_proximity =
        date_proximity_score(query_date, candidate_date_start, candidate_date_end);

    let nationality_match = match (query_nationality, candidate_nationality) {
        (Some(q), Some(c)) => q.eq_ignore_ascii_case(c),
        // Both unknown is neutral agreement; one-sided knowledge is not.
        (None, None) => true,
        _ => false,
    };

    let q_soundex = soundex(&q_norm);
    let c_soundex = soundex(&c_norm);
    let phonetic_match = !q_soundex.is_empty() && q_soundex == c_soundex;

    let nationality_score = if nationality_match { 1.0 } else { 0.0 };
    let phonetic_score = if phonetic_match { 1.0 } else { 0.0 };
    let confidence = (W_NAME * name_similarity
        + W_DATE * date_proximity
        + W_NATIONALITY * nationality_score
        + W_PHONETIC * phonetic_score)
        .clamp(0.0, 1.0);

    let match_type = if q_norm == c_norm {
        if query_name.to_uppercase() == candidate_name.to_uppercase() {
            MatchType::Exact
        } else {
            MatchType::NormalizedExact
        }
    } else if phonetic_match && name_similarity >= 0.7 {
        MatchType::Phonetic
    } else {
        MatchType::Fuzzy
    };

    MatchResult {
        candidate_id: candidate_id.to_string(),
        confidence,
        match_type,
        name_similarity,
        date_proximity,
        nationality_match,
        phonetic_match,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_table() {
        assert_eq!(normalize_ship_name("De Batavia"), "BATAVIA");
        assert_eq!(normalize_ship_name("'T Wapen van Hoorn"), "WAPEN VAN HOORN");
        assert_eq!(normalize_ship_name("HMS   Victory"), "VICTORY");
        assert_eq!(normalize_ship_name("  batavia  "), "BATAVIA");
        assert_eq!(normalize_ship_name("San Pablo"), "SAN PABLO");
        assert_eq!(normalize_ship_name("Santa Ana"), "SANTA ANA");
        // Prefix stripping stops at the last word.
        assert_eq!(normalize_ship_name("De"), "DE");
        assert_eq!(normalize_ship_name("De La S"), "S");
        assert_eq!(normalize_ship_name("St. George"), "ST GEORGE");
        assert_eq!(normalize_ship_name(""), "");
    }

    #[test]
    fn levenshtein_metric_properties() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("", "ABC"), 3);
        assert_eq!(levenshtein_distance("BATAVIA", "BATAVIA"), 0);
        assert_eq!(levenshtein_distance("BATAVIA", "BATTAVIA"), 1);
        assert_eq!(levenshtein_distance("KITTEN", "SITTING"), 3);
        // Symmetry.
        assert_eq!(
            levenshtein_distance("HOLLANDIA", "HOLANDIA"),
            levenshtein_distance("HOLANDIA", "HOLLANDIA"),
        );
    }

    #[test]
    fn similarity_bounds_and_empties() {
        assert_eq!(levenshtein_similarity("", ""), 1.0);
        assert_eq!(levenshtein_similarity("ABC", ""), 0.0);
        let s = levenshtein_similarity("BATAVIA", "BATTAVIA");
        assert!(s > 0.85 && s < 1.0);
    }

    #[test]
    fn soundex_reference_codes() {
        assert_eq!(soundex("BATAVIA"), "B310");
        assert_eq!(soundex("HOLLANDIA"), "H453");
        assert_eq!(soundex("AMSTERDAM"), "A523");
        // Adjacent same-class letters collapse; a vowel between them resets.
        assert_eq!(soundex("PFISTER"), "P236");
        assert_eq!(soundex("TYMCZAK"), "T522");
        assert_eq!(soundex(""), "");
        assert_eq!(soundex("123"), "");
    }

    #[test]
    fn soundex_is_stable_under_spelling_variants() {
        assert_eq!(soundex("BATAVIA"), soundex("BATTAVIA"));
        assert_eq!(soundex("HOLLANDIA"), soundex("HOLANDIA"));
    }

    #[test]
    fn date_decay_steps() {
        assert_eq!(date_proximity_score(Some("1720-05-01"), Some("1720-01-01"), None), 1.0);
        assert_eq!(date_proximity_score(Some("1720"), Some("1721"), None), 0.8);
        assert_eq!(date_proximity_score(Some("1720"), Some("1722"), None), 0.5);
        assert_eq!(date_proximity_score(Some("1720"), Some("1723"), None), 0.2);
        assert_eq!(date_proximity_score(Some("1720"), Some("1730"), None), 0.0);
        // Closer of start and end wins.
        assert_eq!(
            date_proximity_score(Some("1722"), Some("1715"), Some("1722")),
            1.0
        );
        // Missing either side is neutral.
        assert_eq!(date_proximity_score(None, Some("1720"), None), 0.5);
        assert_eq!(date_proximity_score(Some("1720"), None, None), 0.5);
        assert_eq!(date_proximity_score(Some("17"), Some("1720"), None), 0.5);
    }

    #[test]
    fn article_variant_is_normalized_exact_with_high_confidence() {
        let m = score_ship_match(
            "DE BATAVIA",
            Some("1720-03-01"),
            Some("NL"),
            "Batavia",
            "das:0001",
            Some("1720-01-15"),
            None,
            Some("NL"),
        );
        assert_eq!(m.match_type, MatchType::NormalizedExact);
        assert!(m.confidence > 0.9, "confidence {}", m.confidence);
        assert!(m.nationality_match);
        assert!(m.phonetic_match);
    }

    #[test]
    fn casing_only_variant_is_exact() {
        let m = score_ship_match(
            "BATAVIA", None, None, "batavia", "x", None, None, None,
        );
        assert_eq!(m.match_type, MatchType::Exact);
    }

    #[test]
    fn spelling_variant_is_phonetic() {
        let m = score_ship_match(
            "BATAVIA", None, None, "BATTAVIA", "x", None, None, None,
        );
        assert_eq!(m.match_type, MatchType::Phonetic);
        assert!(m.name_similarity >= 0.7);
    }

    #[test]
    fn unrelated_name_is_low_confidence_fuzzy() {
        let m = score_ship_match(
            "BATAVIA", Some("1720"), Some("NL"), "Endeavour", "x", Some("1768"), None, Some("UK"),
        );
        assert_eq!(m.match_type, MatchType::Fuzzy);
        assert!(m.confidence < 0.5, "confidence {}", m.confidence);
    }

    #[test]
    fn confidence_is_monotone_in_the_components() {
        let base = score_ship_match(
            "BATAVIA", Some("1720"), Some("NL"), "BATAVIA", "x", Some("1725"), None, Some("NL"),
        );
        let closer_date = score_ship_match(
            "BATAVIA", Some("1720"), Some("NL"), "BATAVIA", "x", Some("1720"), None, Some("NL"),
        );
        assert!(closer_date.confidence > base.confidence);

        let wrong_nat = score_ship_match(
            "BATAVIA", Some("1720"), Some("NL"), "BATAVIA", "x", Some("1725"), None, Some("ES"),
        );
        assert!(wrong_nat.confidence < base.confidence);
    }
}
