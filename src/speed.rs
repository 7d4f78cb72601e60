//! # Speed derivation
//!
//! Converts the chronological position sequence of one [`Track`] into
//! per-segment sailing-speed records.
//!
//! ## Algorithm
//!
//! Consecutive position pairs are walked in order. A pair contributes one
//! [`SpeedObservation`] when:
//!
//! * neither endpoint is anchored (when anchored exclusion is on),
//! * both endpoint dates parse and the elapsed whole days are positive,
//! * the segment *midpoint* lies inside the requested region — midpoint
//!   filtering keeps a boundary-crossing leg attributable to one side,
//! * the derived speed (haversine km / elapsed days) falls inside the
//!   plausible range.
//!
//! Everything else is silently dropped: historical logbooks are expected to
//! have gaps, so a malformed date or missing fix excludes that one segment
//! and nothing more.
//!
//! The walk is exposed as [`SegmentSpeeds`], a lazy, finite iterator;
//! calling [`Track::segment_speeds`] again re-derives the same observations
//! deterministically.

use chrono::NaiveDate;
use serde::Serialize;

use crate::constants::{
    Degree, KmPerDay, VoyageId, DEFAULT_MAX_SPEED_KM_DAY, DEFAULT_MIN_SPEED_KM_DAY,
};
use crate::geo::{haversine_km, infer_direction, Direction, GeoBounds};
use crate::tracks::{Track, TrackStore};
use crate::tradewind_errors::TradewindError;

/// Segment-level filter parameters for speed derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedFilter {
    /// Region test applied at each segment's midpoint.
    pub bounds: GeoBounds,
    /// Minimum plausible speed (km/day); slower segments are anchoring or
    /// drifting artifacts.
    pub min_speed: KmPerDay,
    /// Maximum plausible speed (km/day); faster segments are data errors.
    pub max_speed: KmPerDay,
    /// Drop segments with an anchored endpoint.
    pub exclude_anchored: bool,
}

impl Default for SpeedFilter {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::default(),
            min_speed: DEFAULT_MIN_SPEED_KM_DAY,
            max_speed: DEFAULT_MAX_SPEED_KM_DAY,
            exclude_anchored: true,
        }
    }
}

impl SpeedFilter {
    /// Same filter restricted to `bounds`.
    pub fn with_bounds(mut self, bounds: GeoBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Caller-error check for inverted bounds; the derivation itself never
    /// fails.
    pub fn validate(&self) -> Result<(), TradewindError> {
        if self.min_speed > self.max_speed {
            return Err(TradewindError::InvalidSpeedBounds {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        Ok(())
    }
}

/// One derived sailing-speed record for a consecutive position pair.
///
/// Carries the *later* endpoint's date and wind metadata, and the segment
/// midpoint as its representative coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedObservation {
    pub voyage_id: VoyageId,
    pub date: NaiveDate,
    pub lat: Degree,
    pub lon: Degree,
    pub km_day: KmPerDay,
    pub direction: Direction,
    pub wind_force: Option<u8>,
    pub wind_direction: Option<Degree>,
}

/// Lazy walk over the qualifying segments of one track.
///
/// Finite and restartable: the iterator borrows the track and filter, so a
/// fresh call to [`Track::segment_speeds`] with the same filter re-derives
/// an identical sequence.
#[derive(Debug, Clone)]
pub struct SegmentSpeeds<'a> {
    track: &'a Track,
    filter: &'a SpeedFilter,
    next_pair: usize,
}

impl Iterator for SegmentSpeeds<'_> {
    type Item = SpeedObservation;

    fn next(&mut self) -> Option<Self::Item> {
        let positions = &self.track.positions;
        while self.next_pair + 1 < positions.len() {
            let a = &positions[self.next_pair];
            let b = &positions[self.next_pair + 1];
            self.next_pair += 1;

            if self.filter.exclude_anchored && (a.anchored || b.anchored) {
                continue;
            }
            let (Some(date_a), Some(date_b)) = (a.parsed_date(), b.parsed_date()) else {
                continue;
            };
            let days = (date_b - date_a).num_days();
            if days <= 0 {
                continue;
            }

            let mid_lat = (a.lat + b.lat) / 2.0;
            let mid_lon = (a.lon + b.lon) / 2.0;
            if !self.filter.bounds.contains(mid_lat, mid_lon) {
                continue;
            }

            let km_day = haversine_km(a.lat, a.lon, b.lat, b.lon) / days as f64;
            if km_day < self.filter.min_speed || km_day > self.filter.max_speed {
                continue;
            }

            return Some(SpeedObservation {
                voyage_id: self.track.voyage_id,
                date: date_b,
                lat: mid_lat,
                lon: mid_lon,
                km_day,
                direction: infer_direction(a.lon, b.lon),
                wind_force: b.wind_force,
                wind_direction: b.wind_direction,
            });
        }
        None
    }
}

impl Track {
    /// Derive per-segment sailing speeds under `filter`.
    ///
    /// Return
    /// ----------
    /// * A lazy, finite, restartable iterator of [`SpeedObservation`]s in
    ///   chronological order.
    pub fn segment_speeds<'a>(&'a self, filter: &'a SpeedFilter) -> SegmentSpeeds<'a> {
        SegmentSpeeds {
            track: self,
            filter,
            next_pair: 0,
        }
    }
}

/// Daily speeds and their mean for a single voyage.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSpeeds {
    pub voyage_id: VoyageId,
    pub ship_name: Option<String>,
    pub nationality: Option<String>,
    pub observations: Vec<SpeedObservation>,
    pub mean_km_day: KmPerDay,
}

/// Compute daily sailing speeds for one voyage in the store.
///
/// Arguments
/// -----------------
/// * `store`: The loaded track context.
/// * `voyage_id`: Which voyage to derive.
/// * `filter`: Region, plausibility, and anchoring parameters.
///
/// Return
/// ----------
/// * `Ok(None)` when the voyage id is unknown (not-found is absence, not an
///   error).
/// * `Ok(Some(TrackSpeeds))` otherwise; a voyage whose every segment was
///   filtered out reports zero observations and a zero mean.
pub fn compute_track_speeds(
    store: &TrackStore,
    voyage_id: VoyageId,
    filter: &SpeedFilter,
) -> Result<Option<TrackSpeeds>, TradewindError> {
    filter.validate()?;
    let Some(track) = store.get_track(voyage_id)? else {
        return Ok(None);
    };

    let observations: Vec<SpeedObservation> = track.segment_speeds(filter).collect();
    let mean_km_day = if observations.is_empty() {
        0.0
    } else {
        observations.iter().map(|o| o.km_day).sum::<f64>() / observations.len() as f64
    };

    Ok(Some(TrackSpeeds {
        voyage_id,
        ship_name: track.ship_name.clone(),
        nationality: track.nationality.clone(),
        observations,
        mean_km_day,
    }))
}
