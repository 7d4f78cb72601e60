//! # Pre-built ship-name index
//!
//! Builds the three lookup levels once over a candidate archive, then
//! answers queries without rescanning it:
//!
//! 1. exact normalized name,
//! 2. Soundex code,
//! 3. bounded Levenshtein scan over every normalized entry.
//!
//! Lookup short-circuits: the scan level only runs while the cheaper
//! levels have produced fewer candidates than the caller wants back.

use std::collections::{HashMap, HashSet};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_MATCHES, DEFAULT_MIN_CONFIDENCE};
use crate::resolve::{normalize_ship_name, score_ship_match, soundex, MatchResult};
use crate::tracks::Track;

/// One record of the archive being matched against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub date_start: Option<String>,
    #[serde(default)]
    pub date_end: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
}

/// Confidence floor and result cap of one lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub min_confidence: f64,
    pub max_results: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_results: DEFAULT_MAX_MATCHES,
        }
    }
}

/// Fuzzy ship-name index over a candidate archive.
///
/// Records with an empty name (or a name that normalizes to nothing) are
/// skipped at build time; they can never match.
pub struct ShipNameIndex {
    records: Vec<CandidateRecord>,
    exact: HashMap<String, Vec<usize>, RandomState>,
    phonetic: HashMap<String, Vec<usize>, RandomState>,
    /// Every indexed entry as (normalized name, char length, record index).
    normalized: Vec<(String, usize, usize)>,
}

impl ShipNameIndex {
    pub fn new(records: Vec<CandidateRecord>) -> Self {
        let mut exact: HashMap<String, Vec<usize>, RandomState> = HashMap::default();
        let mut phonetic: HashMap<String, Vec<usize>, RandomState> = HashMap::default();
        let mut normalized = Vec::with_capacity(records.len());

        for (i, rec) in records.iter().enumerate() {
            let norm = normalize_ship_name(&rec.name);
            if norm.is_empty() {
                continue;
            }
            let code = soundex(&norm);
            if !code.is_empty() {
                phonetic.entry(code).or_default().push(i);
            }
            let char_len = norm.chars().count();
            exact.entry(norm.clone()).or_default().push(i);
            normalized.push((norm, char_len, i));
        }

        Self {
            records,
            exact,
            phonetic,
            normalized,
        }
    }

    /// Indexed records (those with a usable name).
    pub fn len(&self) -> usize {
        self.normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Find candidate records matching a queried ship name.
    ///
    /// Arguments
    /// -----------------
    /// * `query_name`: Raw ship name; normalized internally. A name that
    ///   normalizes to nothing matches nothing.
    /// * `query_date` / `query_nationality`: Optional context feeding the
    ///   date-proximity and nationality components of the score.
    /// * `options`: Confidence floor (default 0.50) and result cap
    ///   (default 5).
    ///
    /// Return
    /// ----------
    /// * Scored matches above the floor, sorted by descending confidence,
    ///   at most `max_results` of them.
    pub fn find_matches(
        &self,
        query_name: &str,
        query_date: Option<&str>,
        query_nationality: Option<&str>,
        options: &MatchOptions,
    ) -> Vec<MatchResult> {
        let q_norm = normalize_ship_name(query_name);
        if q_norm.is_empty() {
            return Vec::new();
        }

        let mut seen: HashSet<usize, RandomState> = HashSet::default();
        let mut candidates: Vec<usize> = Vec::new();
        let extend = |ids: &[usize], seen: &mut HashSet<usize, RandomState>,
                          candidates: &mut Vec<usize>| {
            for &i in ids {
                if seen.insert(i) {
                    candidates.push(i);
                }
            }
        };

        // Level 1: exact normalized name.
        if let Some(ids) = self.exact.get(&q_norm) {
            extend(ids, &mut seen, &mut candidates);
        }

        // Level 2: shared Soundex code.
        let q_code = soundex(&q_norm);
        if let Some(ids) = self.phonetic.get(&q_code) {
            extend(ids, &mut seen, &mut candidates);
        }

        // Level 3: bounded scan, only when the cheap levels came up short.
        // A length gap above three already caps similarity well below the
        // useful range.
        if candidates.len() < options.max_results {
            let q_len = q_norm.chars().count() as isize;
            for (_, char_len, i) in &self.normalized {
                if (*char_len as isize - q_len).abs() > 3 {
                    continue;
                }
                if seen.insert(*i) {
                    candidates.push(*i);
                }
            }
        }

        let mut results: Vec<MatchResult> = candidates
            .into_iter()
            .map(|i| {
                let rec = &self.records[i];
                score_ship_match(
                    query_name,
                    query_date,
                    query_nationality,
                    &rec.name,
                    &rec.id,
                    rec.date_start.as_deref(),
                    rec.date_end.as_deref(),
                    rec.nationality.as_deref(),
                )
            })
            .filter(|m| m.confidence >= options.min_confidence)
            .collect();

        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        results.truncate(options.max_results);
        results
    }

    /// Resolve a track's ship identity against the index.
    ///
    /// Uses the track's ship name, departure date, and nationality as the
    /// query. A track without a ship name matches nothing.
    pub fn match_track(&self, track: &Track, options: &MatchOptions) -> Vec<MatchResult> {
        let Some(name) = track.ship_name.as_deref() else {
            return Vec::new();
        };
        self.find_matches(
            name,
            track.start_date.as_deref(),
            track.nationality.as_deref(),
            options,
        )
    }
}
