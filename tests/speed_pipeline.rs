//! End-to-end coverage of the speed derivation and aggregation pipeline.

mod common;

use common::{position, steady_track, two_period_fleet, windy_position};
use tradewind::aggregate::{
    aggregate_speeds, GroupBy, Granularity, ObservationFilter,
};
use tradewind::geo::{Direction, GeoBounds};
use tradewind::speed::{compute_track_speeds, SpeedFilter};
use tradewind::tracks::{TrackFilter, TrackStore};
use tradewind::tradewind_errors::TradewindError;

#[test]
fn per_voyage_speeds_match_the_fixture_geometry() {
    let store = TrackStore::from_tracks(vec![steady_track(1, "NL", 1720, 0.0, 1.0, 10)]);
    let speeds = compute_track_speeds(&store, 1, &SpeedFilter::default())
        .unwrap()
        .unwrap();
    assert_eq!(speeds.observations.len(), 10);
    assert!((speeds.mean_km_day - 111.19).abs() < 0.5);
    assert!(speeds
        .observations
        .iter()
        .all(|o| o.direction == Direction::Eastbound));
    // Chronological order is preserved.
    assert!(speeds
        .observations
        .windows(2)
        .all(|w| w[0].date < w[1].date));
}

#[test]
fn decade_grouping_orders_numerically_and_counts_voyages() {
    let store = two_period_fleet();
    let agg = aggregate_speeds(
        &store,
        &TrackFilter::default(),
        &SpeedFilter::default(),
        &ObservationFilter::default(),
        GroupBy::Decade,
        Granularity::Observation,
    )
    .unwrap();

    let keys: Vec<&str> = agg.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, ["1700", "1750"]);
    assert_eq!(agg.total_voyages, 20);
    // 20 voyages, 10 qualifying segments each.
    assert_eq!(agg.total_observations, 200);
    // The 1750s include the fast eastbound passages.
    assert!(agg.groups[1].stats.mean > agg.groups[0].stats.mean);
}

#[test]
fn voyage_granularity_tames_a_chatty_voyage() {
    // One voyage with 30 fast observations, three with 5 slow ones each.
    let mut tracks = vec![steady_track(1, "NL", 1720, 0.0, 1.8, 30)];
    for id in 2..=4 {
        tracks.push(steady_track(id, "NL", 1720, 50.0, 0.5, 5));
    }
    let store = TrackStore::from_tracks(tracks);

    let run = |granularity| {
        aggregate_speeds(
            &store,
            &TrackFilter::default(),
            &SpeedFilter::default(),
            &ObservationFilter::default(),
            GroupBy::Decade,
            granularity,
        )
        .unwrap()
    };

    let by_obs = run(Granularity::Observation);
    let by_voyage = run(Granularity::Voyage);
    assert_eq!(by_obs.groups[0].stats.n, 45);
    // One mean per voyage per group.
    assert_eq!(by_voyage.groups[0].stats.n, 4);
    // Observation pooling is dominated by the chatty fast voyage; the
    // voyage mean sits much lower.
    assert!(by_voyage.groups[0].stats.mean < by_obs.groups[0].stats.mean);
}

#[test]
fn direction_grouping_splits_east_and_west() {
    let store = TrackStore::from_tracks(vec![
        steady_track(1, "NL", 1720, 0.0, 1.0, 8),
        steady_track(2, "NL", 1720, 30.0, -1.0, 8),
    ]);
    let agg = aggregate_speeds(
        &store,
        &TrackFilter::default(),
        &SpeedFilter::default(),
        &ObservationFilter::default(),
        GroupBy::Direction,
        Granularity::Observation,
    )
    .unwrap();
    let keys: Vec<&str> = agg.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, ["eastbound", "westbound"]);
    assert_eq!(agg.groups[0].stats.n, 8);
    assert_eq!(agg.groups[1].stats.n, 8);
}

#[test]
fn direction_filter_restricts_observations() {
    let store = TrackStore::from_tracks(vec![
        steady_track(1, "NL", 1720, 0.0, 1.0, 8),
        steady_track(2, "NL", 1720, 30.0, -1.0, 8),
    ]);
    let westbound_only = ObservationFilter {
        direction: Some(Direction::Westbound),
        ..ObservationFilter::default()
    };
    let agg = aggregate_speeds(
        &store,
        &TrackFilter::default(),
        &SpeedFilter::default(),
        &westbound_only,
        GroupBy::Direction,
        Granularity::Observation,
    )
    .unwrap();
    assert_eq!(agg.groups.len(), 1);
    assert_eq!(agg.groups[0].key, "westbound");
    assert_eq!(agg.total_voyages, 1);
}

#[test]
fn beaufort_grouping_skips_unrecorded_wind() {
    let mut track = steady_track(1, "NL", 1720, 0.0, 1.0, 4);
    // Wind force on the later endpoints of the first two segments only.
    track.positions[1] = windy_position("1720-01-02", 0.0, 1.0, 4, 270.0);
    track.positions[2] = windy_position("1720-01-03", 0.0, 2.0, 6, 270.0);
    let store = TrackStore::from_tracks(vec![track]);

    let agg = aggregate_speeds(
        &store,
        &TrackFilter::default(),
        &SpeedFilter::default(),
        &ObservationFilter::default(),
        GroupBy::Beaufort,
        Granularity::Observation,
    )
    .unwrap();
    let keys: Vec<&str> = agg.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, ["4", "6"]);
    assert_eq!(agg.groups[0].stats.n, 1);
}

#[test]
fn nationality_grouping_falls_back_to_unknown() {
    let mut anonymous = steady_track(2, "NL", 1720, 30.0, 1.0, 4);
    anonymous.nationality = None;
    let store = TrackStore::from_tracks(vec![
        steady_track(1, "NL", 1720, 0.0, 1.0, 4),
        anonymous,
    ]);
    let agg = aggregate_speeds(
        &store,
        &TrackFilter::default(),
        &SpeedFilter::default(),
        &ObservationFilter::default(),
        GroupBy::Nationality,
        Granularity::Observation,
    )
    .unwrap();
    let keys: Vec<&str> = agg.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, ["NL", "unknown"]);
}

#[test]
fn region_bounds_prefilter_tracks_and_segments() {
    let store = TrackStore::from_tracks(vec![
        steady_track(1, "NL", 1720, 0.0, 1.0, 8),
        // Entirely outside the box.
        steady_track(2, "NL", 1720, 100.0, 1.0, 8),
    ]);
    let filter = SpeedFilter::default().with_bounds(GeoBounds::new(-5.0, 5.0, 0.0, 4.0));
    let agg = aggregate_speeds(
        &store,
        &TrackFilter::default(),
        &filter,
        &ObservationFilter::default(),
        GroupBy::Decade,
        Granularity::Observation,
    )
    .unwrap();
    assert_eq!(agg.total_voyages, 1);
    // Segment midpoints at 0.5..3.5 are inside; 4.5 and beyond are not.
    assert_eq!(agg.total_observations, 4);
}

#[test]
fn track_filter_selects_by_nationality_and_years() {
    let store = TrackStore::from_tracks(vec![
        steady_track(1, "NL", 1700, 0.0, 1.0, 4),
        steady_track(2, "UK", 1700, 0.0, 1.0, 4),
        steady_track(3, "NL", 1790, 0.0, 1.0, 4),
    ]);
    let filter = TrackFilter {
        nationality: Some("NL".to_string()),
        year_start: Some(1690),
        year_end: Some(1750),
    };
    let agg = aggregate_speeds(
        &store,
        &filter,
        &SpeedFilter::default(),
        &ObservationFilter::default(),
        GroupBy::Year,
        Granularity::Observation,
    )
    .unwrap();
    assert_eq!(agg.total_voyages, 1);
    assert_eq!(agg.groups[0].key, "1700");
}

#[test]
fn empty_archive_aggregates_to_nothing() {
    let store = TrackStore::from_tracks(Vec::new());
    let agg = aggregate_speeds(
        &store,
        &TrackFilter::default(),
        &SpeedFilter::default(),
        &ObservationFilter::default(),
        GroupBy::Decade,
        Granularity::Observation,
    )
    .unwrap();
    assert!(agg.groups.is_empty());
    assert_eq!(agg.total_observations, 0);
}

#[test]
fn inverted_speed_bounds_are_a_caller_error() {
    let store = TrackStore::from_tracks(Vec::new());
    let bad = SpeedFilter {
        min_speed: 300.0,
        max_speed: 10.0,
        ..SpeedFilter::default()
    };
    assert!(matches!(
        aggregate_speeds(
            &store,
            &TrackFilter::default(),
            &bad,
            &ObservationFilter::default(),
            GroupBy::Decade,
            Granularity::Observation,
        ),
        Err(TradewindError::InvalidSpeedBounds { .. })
    ));
}

#[test]
fn anchored_legs_are_dropped_by_default() {
    let mut track = steady_track(1, "NL", 1720, 0.0, 1.0, 4);
    track.positions[2] = position("1720-01-03", 0.0, 2.0);
    track.positions[2].anchored = true;
    let store = TrackStore::from_tracks(vec![track]);
    let speeds = compute_track_speeds(&store, 1, &SpeedFilter::default())
        .unwrap()
        .unwrap();
    // Both legs touching the anchored fix are gone.
    assert_eq!(speeds.observations.len(), 2);
}
