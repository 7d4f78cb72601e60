//! # Geospatial and temporal primitives
//!
//! Leaf utilities shared by every analytics module:
//!
//! - Great-circle (haversine) distance on the mean-radius sphere
//! - Inclusive bounding-box membership ([`GeoBounds`])
//! - Calendar-wraparound month-range test
//! - East/west direction inference across the antimeridian
//! - Tolerant logbook date parsing
//!
//! Historical logbook coordinates are plain latitude/longitude degrees;
//! nothing here depends on the rest of the crate.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, Kilometer, EARTH_RADIUS_KM};
use crate::tradewind_errors::TradewindError;

/// Great-circle distance between two points in kilometres.
///
/// Haversine formula on a sphere of mean radius 6371 km — the same
/// convention the CLIWOC digitization project uses, so derived speeds stay
/// comparable with published figures.
///
/// Arguments
/// -----------------
/// * `lat1`, `lon1`: First point, in degrees.
/// * `lat2`, `lon2`: Second point, in degrees.
///
/// Return
/// ----------
/// * Distance in kilometres. Symmetric in its arguments; exactly 0.0 for
///   identical points.
pub fn haversine_km(lat1: Degree, lon1: Degree, lat2: Degree, lon2: Degree) -> Kilometer {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Inclusive geographic bounding box, with every edge optional.
///
/// An unset edge is unbounded, so the default value contains every
/// coordinate. Used both for position-level filtering (speed segments are
/// tested at their midpoint) and as a cheap track-level prefilter (a track
/// passes if *any* of its positions is inside).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub lat_min: Option<Degree>,
    pub lat_max: Option<Degree>,
    pub lon_min: Option<Degree>,
    pub lon_max: Option<Degree>,
}

impl GeoBounds {
    /// Box spanning the four given edges.
    pub fn new(lat_min: Degree, lat_max: Degree, lon_min: Degree, lon_max: Degree) -> Self {
        Self {
            lat_min: Some(lat_min),
            lat_max: Some(lat_max),
            lon_min: Some(lon_min),
            lon_max: Some(lon_max),
        }
    }

    /// True when no edge is set (the box contains everything).
    pub fn is_unbounded(&self) -> bool {
        self.lat_min.is_none()
            && self.lat_max.is_none()
            && self.lon_min.is_none()
            && self.lon_max.is_none()
    }

    /// Inclusive membership test.
    pub fn contains(&self, lat: Degree, lon: Degree) -> bool {
        if let Some(min) = self.lat_min {
            if lat < min {
                return false;
            }
        }
        if let Some(max) = self.lat_max {
            if lat > max {
                return false;
            }
        }
        if let Some(min) = self.lon_min {
            if lon < min {
                return false;
            }
        }
        if let Some(max) = self.lon_max {
            if lon > max {
                return false;
            }
        }
        true
    }
}

/// Month-range membership with calendar wraparound.
///
/// `start=11, end=2` selects November through February. A single set bound
/// degenerates to a one-sided test against that bound's range; both bounds
/// absent means every month qualifies.
pub fn month_in_range(month: u32, start: Option<u32>, end: Option<u32>) -> bool {
    match (start, end) {
        (None, None) => true,
        (Some(s), None) => month >= s,
        (None, Some(e)) => month <= e,
        (Some(s), Some(e)) => {
            if s <= e {
                month >= s && month <= e
            } else {
                // Wraps the year boundary, e.g. Nov-Feb.
                month >= s || month <= e
            }
        }
    }
}

/// Cardinal sailing direction of a track segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Eastbound,
    Westbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Eastbound => "eastbound",
            Direction::Westbound => "westbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = TradewindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eastbound" | "east" | "e" => Ok(Direction::Eastbound),
            "westbound" | "west" | "w" => Ok(Direction::Westbound),
            other => Err(TradewindError::UnknownDirection(other.to_string())),
        }
    }
}

/// Infer east/west travel from two longitudes.
///
/// The signed delta is normalized into [-180, 180] so that a crossing of
/// the antimeridian (e.g. 179°E → -179°E) reads as a short eastbound hop
/// rather than a near-360° westbound sweep. A delta of exactly 0 counts as
/// eastbound.
pub fn infer_direction(lon1: Degree, lon2: Degree) -> Direction {
    let mut delta = lon2 - lon1;
    while delta > 180.0 {
        delta -= 360.0;
    }
    while delta < -180.0 {
        delta += 360.0;
    }
    if delta >= 0.0 {
        Direction::Eastbound
    } else {
        Direction::Westbound
    }
}

/// Parse a logbook date of the form `Y-M-D`.
///
/// Components need not be zero-padded (`1720-3-5` parses the same as
/// `1720-03-05`); anything else — missing pieces, non-numeric text,
/// out-of-range day/month — yields `None`. Logbook archives are full of
/// gaps and transcription slips, so an unparsable date is a data gap, not
/// an error.
pub fn parse_log_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().splitn(3, '-');
    let year: i32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
