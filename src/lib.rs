//! # Tradewind
//!
//! Analytics engine for historical ship-track archives: derives daily
//! sailing speeds from digitized logbook positions, aggregates and
//! hypothesis-tests them across periods, measures route tortuosity, builds
//! wind roses, and fuzzily links ship names across archives.
//!
//! ## Layout
//!
//! - [`tracks`] — data model and the lazily loaded [`tracks::TrackStore`].
//! - [`geo`] — haversine distance, bounds, direction inference.
//! - [`speed`] — per-segment speed derivation.
//! - [`stats`] — descriptive statistics, Mann-Whitney U, bootstrap.
//! - [`aggregate`] — grouped aggregation over the archive.
//! - [`compare`] — period comparison and difference-in-differences.
//! - [`tortuosity`] — route-efficiency ratios.
//! - [`wind`] — Beaufort and wind-direction distributions.
//! - [`resolve`] — ship-name normalization, matching, and indexing.
//!
//! ## Example
//!
//! ```rust, no_run
//! use tradewind::speed::{compute_track_speeds, SpeedFilter};
//! use tradewind::tracks::TrackStore;
//!
//! # fn demo() -> Result<(), tradewind::tradewind_errors::TradewindError> {
//! let store = TrackStore::from_archive("data/cliwoc_tracks.json");
//! if let Some(speeds) = compute_track_speeds(&store, 4242, &SpeedFilter::default())? {
//!     println!("{} km/day over {} legs", speeds.mean_km_day, speeds.observations.len());
//! }
//! # Ok(()) }
//! ```

pub mod aggregate;
pub mod compare;
pub mod constants;
pub mod geo;
pub mod resolve;
pub mod speed;
pub mod stats;
pub mod tortuosity;
pub mod tracks;
pub mod tradewind_errors;
pub mod wind;
