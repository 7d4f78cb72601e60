//! Wind-rose and per-year wind-direction statistics.

mod common;

use common::{steady_track, windy_position};
use tradewind::aggregate::ObservationFilter;
use tradewind::speed::SpeedFilter;
use tradewind::tracks::{PeriodSpec, Track, TrackFilter, TrackStore};
use tradewind::wind::{wind_direction_by_year, wind_rose, wind_rose_split};

/// A 1720 voyage whose later endpoints all carry force-4 westerlies (wind
/// from 270°), and a 1750 voyage with force-6 southerlies (180°).
fn windy_store() -> TrackStore {
    let mut early = steady_track(1, "NL", 1720, 0.0, 1.0, 6);
    let mut late = steady_track(2, "NL", 1750, 0.0, 1.0, 6);
    for (d, p) in early.positions.iter_mut().enumerate().skip(1) {
        *p = windy_position(p.date.clone().unwrap().as_str(), 0.0, d as f64, 4, 270.0);
    }
    for (d, p) in late.positions.iter_mut().enumerate().skip(1) {
        *p = windy_position(p.date.clone().unwrap().as_str(), 0.0, d as f64, 6, 180.0);
    }
    TrackStore::from_tracks(vec![early, late])
}

#[test]
fn rose_counts_forces_and_sectors() {
    let store = windy_store();
    let rose = wind_rose(
        &store,
        &TrackFilter::default(),
        &SpeedFilter::default(),
        &ObservationFilter::default(),
        None,
    )
    .unwrap();

    assert_eq!(rose.n_observations, 12);
    assert!(rose.has_wind_force && rose.has_wind_direction);

    let forces: Vec<(u8, usize)> = rose.forces.iter().map(|b| (b.force, b.count)).collect();
    assert_eq!(forces, [(4, 6), (6, 6)]);
    assert!((rose.forces[0].percent - 50.0).abs() < 1e-9);
    assert!((rose.forces[0].mean_speed_km_day - 111.19).abs() < 0.5);

    // All eight sectors present, only W and S populated.
    assert_eq!(rose.sectors.len(), 8);
    let west = rose.sectors.iter().find(|s| s.sector == "W").unwrap();
    let south = rose.sectors.iter().find(|s| s.sector == "S").unwrap();
    assert_eq!(west.count, 6);
    assert_eq!(south.count, 6);
    assert_eq!(
        rose.sectors.iter().map(|s| s.count).sum::<usize>(),
        12
    );
}

#[test]
fn rose_without_wind_data_reports_flags_down() {
    let store = TrackStore::from_tracks(vec![steady_track(1, "NL", 1720, 0.0, 1.0, 6)]);
    let rose = wind_rose(
        &store,
        &TrackFilter::default(),
        &SpeedFilter::default(),
        &ObservationFilter::default(),
        None,
    )
    .unwrap();
    assert_eq!(rose.n_observations, 6);
    assert!(!rose.has_wind_force);
    assert!(!rose.has_wind_direction);
    assert!(rose.forces.is_empty());
    assert!(rose.sectors.iter().all(|s| s.count == 0));
}

#[test]
fn period_split_separates_the_regimes() {
    let store = windy_store();
    let split = wind_rose_split(
        &store,
        &TrackFilter::default(),
        &SpeedFilter::default(),
        &ObservationFilter::default(),
        &PeriodSpec::parse("1700/1729").unwrap(),
        &PeriodSpec::parse("1730/1759").unwrap(),
    )
    .unwrap();

    assert_eq!(split.period1_label, "1700/1729");
    assert_eq!(split.period1.forces.len(), 1);
    assert_eq!(split.period1.forces[0].force, 4);
    assert_eq!(split.period2.forces[0].force, 6);
}

#[test]
fn yearly_direction_distributions_are_sorted_and_dominated() {
    let store = windy_store();
    let years = wind_direction_by_year(
        &store,
        &TrackFilter::default(),
        &SpeedFilter::default(),
        &ObservationFilter::default(),
    )
    .unwrap();

    assert_eq!(years.len(), 2);
    assert!(years[0].year < years[1].year);
    assert_eq!(years[0].year, 1720);
    assert_eq!(years[0].dominant_sector, "W");
    assert_eq!(years[1].dominant_sector, "S");
    assert_eq!(years[0].n, 6);
}

#[test]
fn multi_year_voyages_contribute_to_each_year_sailed() {
    // Departs late December 1729, arrives January 1730.
    let positions = (0..=6)
        .map(|d| {
            let date = format!("17{}-{:02}-{:02}", if d < 3 { 29 } else { 30 },
                if d < 3 { 12 } else { 1 }, if d < 3 { 29 + d } else { d - 2 });
            windy_position(&date, 0.0, d as f64, 5, 90.0)
        })
        .collect();
    let track = Track {
        positions,
        ..steady_track(9, "NL", 1729, 0.0, 1.0, 1)
    };
    let store = TrackStore::from_tracks(vec![track]);

    let years = wind_direction_by_year(
        &store,
        &TrackFilter::default(),
        &SpeedFilter::default(),
        &ObservationFilter::default(),
    )
    .unwrap();
    let listed: Vec<i32> = years.iter().map(|y| y.year).collect();
    assert_eq!(listed, [1729, 1730]);
}
