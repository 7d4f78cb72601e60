//! # Grouped speed aggregation
//!
//! Turns the per-segment observations of many voyages into grouped summary
//! statistics: mean speed by decade, by sailing direction, by Beaufort
//! force, and so on.
//!
//! Two analysis granularities are supported:
//!
//! * **Observation** — every qualifying segment contributes one sample.
//! * **Voyage** — each voyage is first reduced to its mean speed per group,
//!   so a single long, well-logged voyage cannot dominate a group it shares
//!   with sparsely logged ones.
//!
//! Group labels keep insertion order internally and are sorted for output:
//! numeric labels ascending first (decades, years, months, Beaufort forces),
//! then the remaining labels lexically.

use std::fmt;
use std::str::FromStr;

use ahash::RandomState;
use chrono::Datelike;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;

use crate::geo::{month_in_range, Direction};
use crate::speed::{SpeedFilter, SpeedObservation};
use crate::stats::{summarize, SummaryStats};
use crate::tracks::{Track, TrackFilter, TrackStore};
use crate::tradewind_errors::TradewindError;

// -------------------------------------------------------------------------------------------------
// Grouping dimensions
// -------------------------------------------------------------------------------------------------

/// Dimension along which speed observations are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Decade,
    Year,
    Month,
    Direction,
    Nationality,
    Beaufort,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Decade => "decade",
            GroupBy::Year => "year",
            GroupBy::Month => "month",
            GroupBy::Direction => "direction",
            GroupBy::Nationality => "nationality",
            GroupBy::Beaufort => "beaufort",
        }
    }

    /// Group label of one observation, or `None` when the observation
    /// cannot be assigned (e.g. Beaufort grouping without a recorded wind
    /// force).
    pub fn key_for(&self, track: &Track, obs: &SpeedObservation) -> Option<String> {
        match self {
            GroupBy::Decade => Some(format!("{}", obs.date.year().div_euclid(10) * 10)),
            GroupBy::Year => Some(format!("{}", obs.date.year())),
            GroupBy::Month => Some(format!("{}", obs.date.month())),
            GroupBy::Direction => Some(obs.direction.as_str().to_string()),
            GroupBy::Nationality => Some(
                track
                    .nationality
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
            GroupBy::Beaufort => obs.wind_force.map(|f| f.to_string()),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = TradewindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "decade" => Ok(GroupBy::Decade),
            "year" => Ok(GroupBy::Year),
            "month" => Ok(GroupBy::Month),
            "direction" => Ok(GroupBy::Direction),
            "nationality" => Ok(GroupBy::Nationality),
            "beaufort" | "wind_force" => Ok(GroupBy::Beaufort),
            other => Err(TradewindError::UnknownGroupDimension(other.to_string())),
        }
    }
}

/// Sampling unit of an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Observation,
    Voyage,
}

impl FromStr for Granularity {
    type Err = TradewindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "observation" | "obs" => Ok(Granularity::Observation),
            "voyage" => Ok(Granularity::Voyage),
            other => Err(TradewindError::UnknownGranularity(other.to_string())),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Observation-level filtering
// -------------------------------------------------------------------------------------------------

/// Per-observation selection applied after speed derivation.
///
/// Month bounds wrap the calendar (`11..2` is November through February).
/// A wind-force bound excludes observations with no recorded wind force.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationFilter {
    pub direction: Option<Direction>,
    pub month_start: Option<u32>,
    pub month_end: Option<u32>,
    pub wind_force_min: Option<u8>,
    pub wind_force_max: Option<u8>,
}

impl ObservationFilter {
    pub fn matches(&self, obs: &SpeedObservation) -> bool {
        if let Some(dir) = self.direction {
            if obs.direction != dir {
                return false;
            }
        }
        if !month_in_range(obs.date.month(), self.month_start, self.month_end) {
            return false;
        }
        if self.wind_force_min.is_some() || self.wind_force_max.is_some() {
            let Some(force) = obs.wind_force else {
                return false;
            };
            if self.wind_force_min.is_some_and(|min| force < min) {
                return false;
            }
            if self.wind_force_max.is_some_and(|max| force > max) {
                return false;
            }
        }
        true
    }
}

// -------------------------------------------------------------------------------------------------
// Grouped sample accumulator
// -------------------------------------------------------------------------------------------------

/// Insertion-ordered label → sample accumulator.
///
/// Labels are registered in first-seen order; samples only ever append, so
/// accumulation over a large archive stays allocation-friendly. Output
/// ordering is produced once at the end by [`GroupedSamples::into_sorted`].
#[derive(Debug, Default)]
pub struct GroupedSamples {
    order: Vec<String>,
    index: HashMap<String, usize, RandomState>,
    samples: Vec<Vec<f64>>,
}

impl GroupedSamples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: f64) {
        let i = match self.index.get(key) {
            Some(&i) => i,
            None => {
                let i = self.samples.len();
                self.order.push(key.to_string());
                self.index.insert(key.to_string(), i);
                self.samples.push(Vec::new());
                i
            }
        };
        self.samples[i].push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate label/sample pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.order
            .iter()
            .zip(&self.samples)
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Consume into output order: numeric labels ascending, then the rest
    /// lexically.
    pub fn into_sorted(self) -> Vec<(String, Vec<f64>)> {
        self.order
            .into_iter()
            .zip(self.samples)
            .sorted_by(|(a, _), (b, _)| {
                match (a.parse::<i64>(), b.parse::<i64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => a.cmp(b),
                }
            })
            .collect()
    }
}

// -------------------------------------------------------------------------------------------------
// Aggregation pipeline
// -------------------------------------------------------------------------------------------------

/// Summary statistics of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub key: String,
    #[serde(flatten)]
    pub stats: SummaryStats,
}

/// Result of [`aggregate_speeds`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedAggregation {
    pub group_by: GroupBy,
    pub granularity: Granularity,
    /// Qualifying segment observations, before any voyage-level reduction.
    pub total_observations: usize,
    /// Voyages contributing at least one qualifying observation.
    pub total_voyages: usize,
    pub groups: Vec<GroupStats>,
}

/// Aggregate sailing speeds across the archive.
///
/// Arguments
/// -----------------
/// * `store`: The loaded track context.
/// * `track_filter`: Nationality / year selection at the track level.
/// * `speed_filter`: Region, plausibility, and anchoring parameters for the
///   per-segment derivation.
/// * `obs_filter`: Direction / month / wind-force selection on the derived
///   observations.
/// * `group_by`: Grouping dimension.
/// * `granularity`: Observation- or voyage-level sampling.
///
/// Return
/// ----------
/// * [`SpeedAggregation`] with one [`GroupStats`] per non-empty group, in
///   numeric-then-lexical key order. No qualifying data yields an empty
///   group list, not an error.
///
/// See also
/// ------------
/// * [`crate::compare::compare_speed_periods`] — two-period hypothesis test
///   on the same pipeline.
pub fn aggregate_speeds(
    store: &TrackStore,
    track_filter: &TrackFilter,
    speed_filter: &SpeedFilter,
    obs_filter: &ObservationFilter,
    group_by: GroupBy,
    granularity: Granularity,
) -> Result<SpeedAggregation, TradewindError> {
    speed_filter.validate()?;

    let mut grouped = GroupedSamples::new();
    let mut total_observations = 0;
    let mut total_voyages = 0;

    for track in store.tracks()? {
        if !track_filter.matches(track) || !track.passes_region(&speed_filter.bounds) {
            continue;
        }

        // Collected per track so voyage granularity can reduce each voyage
        // to one mean per group before it joins the pooled sample.
        let mut per_voyage: Vec<(String, Vec<f64>)> = Vec::new();
        let mut contributed = false;

        for obs in track.segment_speeds(speed_filter) {
            if !obs_filter.matches(&obs) {
                continue;
            }
            let Some(key) = group_by.key_for(track, &obs) else {
                continue;
            };
            total_observations += 1;
            contributed = true;
            match granularity {
                Granularity::Observation => grouped.push(&key, obs.km_day),
                Granularity::Voyage => {
                    match per_voyage.iter().position(|(k, _)| *k == key) {
                        Some(i) => per_voyage[i].1.push(obs.km_day),
                        None => per_voyage.push((key, vec![obs.km_day])),
                    }
                }
            }
        }

        if contributed {
            total_voyages += 1;
        }
        for (key, values) in per_voyage {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            grouped.push(&key, mean);
        }
    }

    let groups = grouped
        .into_sorted()
        .into_iter()
        .map(|(key, values)| GroupStats {
            key,
            stats: summarize(&values),
        })
        .collect();

    Ok(SpeedAggregation {
        group_by,
        granularity,
        total_observations,
        total_voyages,
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_dimension_parses_and_rejects() {
        assert_eq!("decade".parse::<GroupBy>().unwrap(), GroupBy::Decade);
        assert_eq!("Beaufort".parse::<GroupBy>().unwrap(), GroupBy::Beaufort);
        assert!(matches!(
            "fleet".parse::<GroupBy>(),
            Err(TradewindError::UnknownGroupDimension(_))
        ));
        assert!(matches!(
            "daily".parse::<Granularity>(),
            Err(TradewindError::UnknownGranularity(_))
        ));
    }

    #[test]
    fn grouped_samples_sort_numeric_then_lexical() {
        let mut g = GroupedSamples::new();
        g.push("westbound", 1.0);
        g.push("1750", 2.0);
        g.push("eastbound", 3.0);
        g.push("1690", 4.0);
        g.push("1750", 5.0);

        let sorted = g.into_sorted();
        let keys: Vec<&str> = sorted.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["1690", "1750", "eastbound", "westbound"]);
        assert_eq!(sorted[1].1, vec![2.0, 5.0]);
    }

    #[test]
    fn grouped_samples_keep_insertion_order_internally() {
        let mut g = GroupedSamples::new();
        g.push("b", 1.0);
        g.push("a", 2.0);
        g.push("b", 3.0);
        let keys: Vec<&str> = g.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn wind_force_bounds_exclude_unrecorded_wind() {
        let obs = SpeedObservation {
            voyage_id: 1,
            date: chrono::NaiveDate::from_ymd_opt(1750, 6, 1).unwrap(),
            lat: 0.0,
            lon: 0.0,
            km_day: 100.0,
            direction: Direction::Eastbound,
            wind_force: None,
            wind_direction: None,
        };
        let unfiltered = ObservationFilter::default();
        assert!(unfiltered.matches(&obs));

        let windy = ObservationFilter {
            wind_force_min: Some(4),
            ..ObservationFilter::default()
        };
        assert!(!windy.matches(&obs));
    }
}
