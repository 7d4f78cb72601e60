//! Shared fixture builders for the integration suites.
//!
//! All fixtures are synthetic tracks with exactly known geometry: daily
//! positions along the equator (1° of longitude ≈ 111.19 km), so every
//! derived speed and distance can be predicted in closed form.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use tradewind::tracks::{Position, Track, TrackStore};

pub fn position(date: &str, lat: f64, lon: f64) -> Position {
    Position {
        lat,
        lon,
        date: Some(date.to_string()),
        wind_force: None,
        wind_direction: None,
        anchored: false,
    }
}

pub fn windy_position(date: &str, lat: f64, lon: f64, force: u8, wind_dir: f64) -> Position {
    Position {
        wind_force: Some(force),
        wind_direction: Some(wind_dir),
        ..position(date, lat, lon)
    }
}

fn date_string(year: i32, day_offset: i64) -> String {
    let base = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
    (base + Duration::days(day_offset)).format("%Y-%m-%d").to_string()
}

/// A voyage sailing a constant daily longitude step along the equator,
/// departing January 1 of `year`. `lon_step` of 1.0 gives ~111 km/day
/// eastbound; negative steps sail west.
pub fn steady_track(
    voyage_id: u64,
    nationality: &str,
    year: i32,
    start_lon: f64,
    lon_step: f64,
    days: i64,
) -> Track {
    let positions = (0..=days)
        .map(|d| position(&date_string(year, d), 0.0, start_lon + lon_step * d as f64))
        .collect();
    Track {
        voyage_id,
        nationality: Some(nationality.to_string()),
        ship_name: None,
        archive_ref: None,
        start_date: Some(date_string(year, 0)),
        end_date: Some(date_string(year, days)),
        year_start: Some(year),
        year_end: Some(year),
        positions,
    }
}

/// A voyage tacking north and south while working east: latitude alternates
/// between 0 and 1 each day while longitude advances `lon_step` daily.
pub fn tacking_track(voyage_id: u64, year: i32, lon_step: f64, days: i64) -> Track {
    let positions = (0..=days)
        .map(|d| {
            position(
                &date_string(year, d),
                (d % 2) as f64,
                lon_step * d as f64,
            )
        })
        .collect();
    Track {
        voyage_id,
        nationality: Some("NL".to_string()),
        ship_name: None,
        archive_ref: None,
        start_date: Some(date_string(year, 0)),
        end_date: Some(date_string(year, days)),
        year_start: Some(year),
        year_end: Some(year),
        positions,
    }
}

/// A two-period fleet for the comparison tests.
///
/// Period one (departures 1700-1704) sails ~55.6 km/day east and west;
/// period two (departures 1750-1754) sails ~167 km/day eastbound while the
/// westbound passages stay at period-one pace. Small per-voyage offsets
/// keep the samples from being degenerate constants.
pub fn two_period_fleet() -> TrackStore {
    let mut tracks = Vec::new();
    let mut id = 0;
    for i in 0..5i64 {
        let jitter = 0.01 * i as f64;

        // Period one, both directions at the slow pace.
        id += 1;
        tracks.push(steady_track(id, "NL", 1700 + i as i32, 0.0, 0.5 + jitter, 10));
        id += 1;
        tracks.push(steady_track(id, "NL", 1700 + i as i32, 20.0, -(0.5 + jitter), 10));

        // Period two: eastbound much faster, westbound unchanged.
        id += 1;
        tracks.push(steady_track(id, "NL", 1750 + i as i32, 0.0, 1.5 + jitter, 10));
        id += 1;
        tracks.push(steady_track(id, "NL", 1750 + i as i32, 20.0, -(0.5 + jitter), 10));
    }
    TrackStore::from_tracks(tracks)
}
