//! # Route tortuosity
//!
//! Tortuosity measures how far a voyage's sailed path exceeds the direct
//! great-circle line between its endpoints: `ratio = path_km / net_km`.
//! A ratio near 1 is a clean downwind run; a high ratio is beating upwind,
//! storm avoidance, or coastal working. Comparing ratios across decades
//! gives an independent line of evidence on circulation change: stronger,
//! steadier westerlies straighten the eastbound passages.
//!
//! The per-voyage computation reuses the speed pipeline's filters: only
//! in-region, non-anchored positions participate, and legs whose implied
//! speed is implausible are bridged over rather than counted. The legs
//! that *are* counted always form one connected chain, so the ratio can
//! never fall below 1.

use serde::Serialize;

use crate::aggregate::{GroupBy, GroupedSamples, GroupStats};
use crate::constants::{Kilometer, VoyageId, DEFAULT_MIN_POSITIONS};
use crate::geo::{haversine_km, infer_direction, Direction};
use crate::speed::SpeedFilter;
use crate::stats::{bootstrap_mean_diff, mean, summarize, Bootstrap};
use crate::tracks::{PeriodSpec, Track, TrackFilter, TrackStore};
use crate::tradewind_errors::TradewindError;

/// Route-efficiency figures of one voyage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tortuosity {
    pub voyage_id: VoyageId,
    /// Accumulated great-circle length of the accepted legs.
    pub path_km: Kilometer,
    /// Direct great-circle distance from the first to the last accepted
    /// waypoint.
    pub net_km: Kilometer,
    /// `path_km / net_km`, always >= 1.
    pub ratio: f64,
    /// Overall direction, inferred from the accepted endpoints.
    pub direction: Direction,
    /// Positions that survived the region/anchoring filter.
    pub n_in_box: usize,
    /// Accepted legs contributing to `path_km`.
    pub n_segments: usize,
}

/// Tortuosity of one track under the given filter.
///
/// In-region, non-anchored positions form the candidate chain. Each leg is
/// accepted only when both dates parse, elapsed days are positive, and the
/// implied speed is plausible; a rejected later waypoint is bridged over so
/// the accepted legs stay connected (an unparsable date at the chain head
/// advances the head instead). Returns `None` — excluded, not zero — when
/// fewer than two candidates remain, no leg is accepted, or the net
/// displacement is zero (a voyage that returns to its anchorage has no
/// meaningful ratio).
pub fn track_tortuosity(track: &Track, filter: &SpeedFilter) -> Option<Tortuosity> {
    let survivors: Vec<_> = track
        .positions
        .iter()
        .filter(|p| {
            (!filter.exclude_anchored || !p.anchored) && filter.bounds.contains(p.lat, p.lon)
        })
        .collect();
    if survivors.len() < 2 {
        return None;
    }

    let mut path_km = 0.0;
    let mut n_segments = 0;
    let mut chain_start = None;
    let mut chain_end = None;

    let mut head = survivors[0];
    for &p in &survivors[1..] {
        let Some(head_date) = head.parsed_date() else {
            // Undated chain head can never anchor a leg.
            head = p;
            continue;
        };
        let Some(date) = p.parsed_date() else {
            continue;
        };
        let days = (date - head_date).num_days();
        if days <= 0 {
            continue;
        }
        let km = haversine_km(head.lat, head.lon, p.lat, p.lon);
        let km_day = km / days as f64;
        if km_day < filter.min_speed || km_day > filter.max_speed {
            continue;
        }

        path_km += km;
        n_segments += 1;
        if chain_start.is_none() {
            chain_start = Some(head);
        }
        chain_end = Some(p);
        head = p;
    }

    let (start, end) = (chain_start?, chain_end?);
    let net_km = haversine_km(start.lat, start.lon, end.lat, end.lon);
    if net_km <= 0.0 {
        return None;
    }

    Some(Tortuosity {
        voyage_id: track.voyage_id,
        path_km,
        net_km,
        ratio: path_km / net_km,
        direction: infer_direction(start.lon, end.lon),
        n_in_box: survivors.len(),
        n_segments,
    })
}

/// Tortuosity of one voyage in the store.
///
/// Return
/// ----------
/// * `Ok(None)` when the voyage id is unknown or the track has no
///   computable ratio under `filter`.
pub fn compute_track_tortuosity(
    store: &TrackStore,
    voyage_id: VoyageId,
    filter: &SpeedFilter,
) -> Result<Option<Tortuosity>, TradewindError> {
    filter.validate()?;
    let Some(track) = store.get_track(voyage_id)? else {
        return Ok(None);
    };
    Ok(track_tortuosity(track, filter))
}

/// Voyage-level selection for [`aggregate_tortuosity`].
#[derive(Debug, Clone, PartialEq)]
pub struct TortuosityFilter {
    /// Minimum in-region positions for a voyage to count; short tracks
    /// produce noisy ratios.
    pub min_positions: usize,
    pub r_min: Option<f64>,
    pub r_max: Option<f64>,
}

impl Default for TortuosityFilter {
    fn default() -> Self {
        Self {
            min_positions: DEFAULT_MIN_POSITIONS,
            r_min: None,
            r_max: None,
        }
    }
}

impl TortuosityFilter {
    fn accepts(&self, t: &Tortuosity) -> bool {
        t.n_in_box >= self.min_positions
            && !self.r_min.is_some_and(|r| t.ratio < r)
            && !self.r_max.is_some_and(|r| t.ratio > r)
    }
}

/// Two-period bootstrap comparison of mean ratios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TortuosityComparison {
    pub period1_label: String,
    pub period2_label: String,
    pub n1: usize,
    pub n2: usize,
    pub mean1: f64,
    pub mean2: f64,
    /// `mean2 − mean1` with bootstrap CI and p-value.
    pub diff: Bootstrap,
    pub significant: bool,
}

/// Result of [`aggregate_tortuosity`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TortuosityAggregation {
    pub group_by: GroupBy,
    /// Voyages passing every filter and contributing a ratio.
    pub total_voyages: usize,
    pub groups: Vec<GroupStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<TortuosityComparison>,
}

/// Group key of one voyage's ratio. Tortuosity is a per-voyage figure, so
/// only track-level dimensions apply.
fn tortuosity_key(
    group_by: GroupBy,
    track: &Track,
    t: &Tortuosity,
) -> Result<Option<String>, TradewindError> {
    match group_by {
        GroupBy::Decade => Ok(track
            .start_year()
            .map(|y| format!("{}", y.div_euclid(10) * 10))),
        GroupBy::Year => Ok(track.start_year().map(|y| format!("{y}"))),
        GroupBy::Direction => Ok(Some(t.direction.as_str().to_string())),
        GroupBy::Nationality => Ok(Some(
            track
                .nationality
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        )),
        GroupBy::Month | GroupBy::Beaufort => Err(
            TradewindError::UnsupportedTortuosityGrouping(group_by.as_str().to_string()),
        ),
    }
}

/// Aggregate route tortuosity across the archive.
///
/// Arguments
/// -----------------
/// * `group_by`: Track-level dimension (decade, year, direction,
///   nationality). Observation-level dimensions are a caller error.
/// * `periods`: When given, additionally splits the ratios into two
///   departure-year sets and bootstrap-tests the mean difference.
/// * `n_bootstrap`, `seed`: Resampling parameters for the period
///   comparison.
///
/// Return
/// ----------
/// * [`TortuosityAggregation`] with per-group ratio statistics in
///   numeric-then-lexical key order.
#[allow(clippy::too_many_arguments)]
pub fn aggregate_tortuosity(
    store: &TrackStore,
    track_filter: &TrackFilter,
    speed_filter: &SpeedFilter,
    tortuosity_filter: &TortuosityFilter,
    group_by: GroupBy,
    periods: Option<(&PeriodSpec, &PeriodSpec)>,
    n_bootstrap: usize,
    seed: u64,
) -> Result<TortuosityAggregation, TradewindError> {
    speed_filter.validate()?;
    // Reject an unusable grouping before touching the archive.
    if matches!(group_by, GroupBy::Month | GroupBy::Beaufort) {
        return Err(TradewindError::UnsupportedTortuosityGrouping(
            group_by.as_str().to_string(),
        ));
    }

    let mut grouped = GroupedSamples::new();
    let mut total_voyages = 0;
    let mut period1_ratios = Vec::new();
    let mut period2_ratios = Vec::new();

    for track in store.tracks()? {
        if !track_filter.matches(track) {
            continue;
        }
        let Some(t) = track_tortuosity(track, speed_filter) else {
            continue;
        };
        if !tortuosity_filter.accepts(&t) {
            continue;
        }

        total_voyages += 1;
        if let Some(key) = tortuosity_key(group_by, track, &t)? {
            grouped.push(&key, t.ratio);
        }
        if let Some((p1, p2)) = periods {
            if p1.contains_track(track) {
                period1_ratios.push(t.ratio);
            }
            if p2.contains_track(track) {
                period2_ratios.push(t.ratio);
            }
        }
    }

    let comparison = periods.map(|(p1, p2)| {
        let diff = bootstrap_mean_diff(&period1_ratios, &period2_ratios, n_bootstrap, seed);
        TortuosityComparison {
            period1_label: p1.label().to_string(),
            period2_label: p2.label().to_string(),
            n1: period1_ratios.len(),
            n2: period2_ratios.len(),
            mean1: mean(&period1_ratios),
            mean2: mean(&period2_ratios),
            significant: diff.p_value < 0.05,
            diff,
        }
    });

    let groups = grouped
        .into_sorted()
        .into_iter()
        .map(|(key, values)| GroupStats {
            key,
            stats: summarize(&values),
        })
        .collect();

    Ok(TortuosityAggregation {
        group_by,
        total_voyages,
        groups,
        comparison,
    })
}
