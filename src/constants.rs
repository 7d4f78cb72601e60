//! # Constants and type definitions for Tradewind
//!
//! This module centralizes the **physical constants**, **default filter
//! bounds**, and **common type aliases** used throughout the `tradewind`
//! library.
//!
//! ## Overview
//!
//! - Geophysical constants (mean Earth radius)
//! - Plausible-speed defaults for historical sailing vessels
//! - Bootstrap resampling defaults
//! - Core type aliases used across the crate
//!
//! These definitions are used by all main modules, including speed
//! derivation, aggregation, tortuosity, and the hypothesis-testing suite.

// -------------------------------------------------------------------------------------------------
// Physical constants
// -------------------------------------------------------------------------------------------------

/// Mean Earth radius in kilometres, used by the haversine distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// -------------------------------------------------------------------------------------------------
// Analytics defaults
// -------------------------------------------------------------------------------------------------

/// Default minimum plausible sailing speed (km/day).
///
/// Segments below this are anchoring or drifting artifacts: a ship logging
/// positions while riding at anchor produces near-zero daily displacements
/// that would drag every mean toward zero.
pub const DEFAULT_MIN_SPEED_KM_DAY: f64 = 5.0;

/// Default maximum plausible sailing speed (km/day).
///
/// Segments above this are almost always transcription or digitization
/// errors; the best day runs of the vessels covered by these archives sit
/// well under 400 km per 24 hours.
pub const DEFAULT_MAX_SPEED_KM_DAY: f64 = 400.0;

/// Default number of bootstrap resampling iterations.
pub const DEFAULT_N_BOOTSTRAP: usize = 10_000;

/// Default RNG seed for bootstrap resampling, so that repeated calls with
/// identical inputs reproduce the same confidence intervals.
pub const DEFAULT_BOOTSTRAP_SEED: u64 = 0x5EA_FA12;

/// z value of the two-sided 95% interval under the normal approximation.
pub const Z_95: f64 = 1.96;

/// Minimum number of in-region positions for a voyage to enter tortuosity
/// aggregation.
pub const DEFAULT_MIN_POSITIONS: usize = 5;

/// Default minimum composite confidence for entity-resolution matches.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.50;

/// Default maximum number of entity-resolution matches returned per query.
pub const DEFAULT_MAX_MATCHES: usize = 5;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;

/// Distance in kilometres
pub type Kilometer = f64;

/// Sailing speed in kilometres per day
pub type KmPerDay = f64;

/// Numeric voyage identifier of a logbook track
pub type VoyageId = u64;

/// Compass sector labels used by the wind-rose statistics, clockwise from
/// north in 45° steps.
pub const COMPASS_SECTORS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
