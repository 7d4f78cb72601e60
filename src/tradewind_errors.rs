use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced by the `tradewind` crate.
///
/// Only caller errors (invalid parameter combinations) and failures at the
/// archive-loading boundary appear here. Data-quality problems in the
/// historical records themselves — malformed dates, missing coordinates,
/// sparse samples — never produce an error: the affected segment or group
/// silently degrades to an absent or zero-valued result.
#[derive(Error, Debug)]
pub enum TradewindError {
    #[error("Track archive not found at: {0}")]
    TrackArchiveNotFound(Utf8PathBuf),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid track archive JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown grouping dimension: {0}")]
    UnknownGroupDimension(String),

    #[error("Grouping dimension not applicable to per-voyage tortuosity: {0}")]
    UnsupportedTortuosityGrouping(String),

    #[error("Unknown aggregation granularity: {0}")]
    UnknownGranularity(String),

    #[error("Unknown sailing direction: {0}")]
    UnknownDirection(String),

    #[error("Invalid period specification: {0}")]
    InvalidPeriodSpec(String),

    #[error("Invalid speed bounds: min {min} must not exceed max {max}")]
    InvalidSpeedBounds { min: f64, max: f64 },
}

impl PartialEq for TradewindError {
    fn eq(&self, other: &Self) -> bool {
        use TradewindError::*;
        match (self, other) {
            (TrackArchiveNotFound(a), TrackArchiveNotFound(b)) => a == b,
            (UnknownGroupDimension(a), UnknownGroupDimension(b)) => a == b,
            (UnsupportedTortuosityGrouping(a), UnsupportedTortuosityGrouping(b)) => a == b,
            (UnknownGranularity(a), UnknownGranularity(b)) => a == b,
            (UnknownDirection(a), UnknownDirection(b)) => a == b,
            (InvalidPeriodSpec(a), InvalidPeriodSpec(b)) => a == b,
            (InvalidSpeedBounds { min: a, max: b }, InvalidSpeedBounds { min: c, max: d }) => {
                a == c && b == d
            }

            // Wrapped errors are not comparable: equal if same variant.
            (IoError(_), IoError(_)) => true,
            (JsonError(_), JsonError(_)) => true,

            _ => false,
        }
    }
}
