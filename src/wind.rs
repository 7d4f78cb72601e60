//! # Wind statistics
//!
//! Distribution views over the wind observations that ride along with the
//! speed pipeline: Beaufort-force histograms, eight-sector wind roses, and
//! per-year sector distributions for circulation-shift analysis.
//!
//! Wind data in the archives is sparse — force is recorded far less often
//! than direction — so every view reports how many observations actually
//! carried the datum and flags empty distributions instead of erroring.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::aggregate::ObservationFilter;
use crate::constants::{Degree, COMPASS_SECTORS};
use crate::speed::SpeedFilter;
use crate::tracks::{PeriodSpec, TrackFilter, TrackStore};
use crate::tradewind_errors::TradewindError;

/// Compass sector index (0 = N, 1 = NE, ... 7 = NW) of a wind direction in
/// degrees clockwise from north. Any real input normalizes into one of the
/// eight sectors; 337.5° and above wraps back to north.
pub fn sector_index(direction: Degree) -> usize {
    let normalized = direction.rem_euclid(360.0);
    ((normalized / 45.0).round() as usize) % 8
}

/// One Beaufort-force bucket of a wind rose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BeaufortCount {
    pub force: u8,
    pub count: usize,
    /// Share of force-recorded observations, in percent.
    pub percent: f64,
    /// Mean derived sailing speed under this force.
    pub mean_speed_km_day: f64,
}

/// One compass-sector bucket of a wind rose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectorCount {
    pub sector: &'static str,
    pub count: usize,
    /// Share of direction-recorded observations, in percent.
    pub percent: f64,
    pub mean_speed_km_day: f64,
}

/// Wind-force and wind-direction distributions over one observation set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindRose {
    /// Qualifying speed observations, whether or not wind was recorded.
    pub n_observations: usize,
    pub has_wind_force: bool,
    pub has_wind_direction: bool,
    /// Non-empty Beaufort buckets in ascending force order.
    pub forces: Vec<BeaufortCount>,
    /// All eight sectors in compass order (N, NE, ... NW).
    pub sectors: Vec<SectorCount>,
}

#[derive(Default, Clone, Copy)]
struct Bucket {
    count: usize,
    speed_sum: f64,
}

impl Bucket {
    fn add(&mut self, speed: f64) {
        self.count += 1;
        self.speed_sum += speed;
    }

    fn mean_speed(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.speed_sum / self.count as f64
        }
    }
}

/// Build a wind rose over the qualifying speed observations.
///
/// Arguments
/// -----------------
/// * `track_filter` / `speed_filter` / `obs_filter`: The usual pipeline
///   filters; anchored positions are excluded through `speed_filter` as in
///   every other view.
/// * `period`: When given, restricts to voyages departing in that year set.
///
/// Return
/// ----------
/// * [`WindRose`] with force buckets (non-empty only) and all eight
///   direction sectors. No wind data at all yields empty/zeroed
///   distributions with the `has_*` flags down, not an error.
pub fn wind_rose(
    store: &TrackStore,
    track_filter: &TrackFilter,
    speed_filter: &SpeedFilter,
    obs_filter: &ObservationFilter,
    period: Option<&PeriodSpec>,
) -> Result<WindRose, TradewindError> {
    speed_filter.validate()?;

    let mut n_observations = 0;
    let mut force_buckets = [Bucket::default(); 13];
    let mut n_forced = 0;
    let mut sector_buckets = [Bucket::default(); 8];
    let mut n_directed = 0;

    for track in store.tracks()? {
        if !track_filter.matches(track)
            || !track.passes_region(&speed_filter.bounds)
            || period.is_some_and(|p| !p.contains_track(track))
        {
            continue;
        }
        for obs in track.segment_speeds(speed_filter) {
            if !obs_filter.matches(&obs) {
                continue;
            }
            n_observations += 1;
            if let Some(force) = obs.wind_force {
                if force <= 12 {
                    force_buckets[force as usize].add(obs.km_day);
                    n_forced += 1;
                }
            }
            if let Some(direction) = obs.wind_direction {
                sector_buckets[sector_index(direction)].add(obs.km_day);
                n_directed += 1;
            }
        }
    }

    let forces = force_buckets
        .iter()
        .enumerate()
        .filter(|(_, b)| b.count > 0)
        .map(|(force, b)| BeaufortCount {
            force: force as u8,
            count: b.count,
            percent: 100.0 * b.count as f64 / n_forced as f64,
            mean_speed_km_day: b.mean_speed(),
        })
        .collect();

    let sectors = sector_buckets
        .iter()
        .zip(COMPASS_SECTORS)
        .map(|(b, sector)| SectorCount {
            sector,
            count: b.count,
            percent: if n_directed == 0 {
                0.0
            } else {
                100.0 * b.count as f64 / n_directed as f64
            },
            mean_speed_km_day: b.mean_speed(),
        })
        .collect();

    Ok(WindRose {
        n_observations,
        has_wind_force: n_forced > 0,
        has_wind_direction: n_directed > 0,
        forces,
        sectors,
    })
}

/// Side-by-side wind roses for two departure-year sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindRoseSplit {
    pub period1_label: String,
    pub period2_label: String,
    pub period1: WindRose,
    pub period2: WindRose,
}

/// Two-period wind-rose comparison over identical filters.
pub fn wind_rose_split(
    store: &TrackStore,
    track_filter: &TrackFilter,
    speed_filter: &SpeedFilter,
    obs_filter: &ObservationFilter,
    period1: &PeriodSpec,
    period2: &PeriodSpec,
) -> Result<WindRoseSplit, TradewindError> {
    Ok(WindRoseSplit {
        period1_label: period1.label().to_string(),
        period2_label: period2.label().to_string(),
        period1: wind_rose(store, track_filter, speed_filter, obs_filter, Some(period1))?,
        period2: wind_rose(store, track_filter, speed_filter, obs_filter, Some(period2))?,
    })
}

/// Wind-direction distribution of one observation year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearWind {
    pub year: i32,
    /// Direction-recorded observations in this year.
    pub n: usize,
    /// Counts per compass sector, N through NW.
    pub sector_counts: [usize; 8],
    /// Most frequent sector (first wins a tie).
    pub dominant_sector: &'static str,
}

/// Per-year wind-direction distributions, ascending by observation year.
///
/// The year is the observation's own date, not the voyage departure year,
/// so multi-year voyages contribute to each year they sailed through.
pub fn wind_direction_by_year(
    store: &TrackStore,
    track_filter: &TrackFilter,
    speed_filter: &SpeedFilter,
    obs_filter: &ObservationFilter,
) -> Result<Vec<YearWind>, TradewindError> {
    speed_filter.validate()?;

    let mut by_year: BTreeMap<i32, [usize; 8]> = BTreeMap::new();
    for track in store.tracks()? {
        if !track_filter.matches(track) || !track.passes_region(&speed_filter.bounds) {
            continue;
        }
        for obs in track.segment_speeds(speed_filter) {
            if !obs_filter.matches(&obs) {
                continue;
            }
            let Some(direction) = obs.wind_direction else {
                continue;
            };
            by_year.entry(obs.date.year()).or_default()[sector_index(direction)] += 1;
        }
    }

    Ok(by_year
        .into_iter()
        .map(|(year, sector_counts)| {
            let dominant = sector_counts
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
                .map(|(i, _)| COMPASS_SECTORS[i])
                .unwrap_or(COMPASS_SECTORS[0]);
            YearWind {
                year,
                n: sector_counts.iter().sum(),
                sector_counts,
                dominant_sector: dominant,
            }
        })
        .collect())
}
