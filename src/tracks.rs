//! # Track store: logbook positions and voyage tracks
//!
//! This module defines the read-only data context the whole engine works
//! from:
//!
//! 1. **Value types** — [`Position`] (one dated logbook fix) and [`Track`]
//!    (the chronological position history of one voyage).
//! 2. **[`TrackStore`]** — an explicit, passed-in container over a track
//!    archive, loaded from JSON exactly once and treated as immutable
//!    afterwards.
//! 3. **Filters** — [`TrackFilter`] for nationality/year selection and
//!    [`PeriodSpec`] for the year-range / year-list period arguments of the
//!    comparison tools.
//!
//! The design emphasizes *lazy initialization* and *idempotent caching*:
//! the archive file is opened on first use via [`OnceCell`], then reused.
//! Because the loaded data is never mutated, a `TrackStore` may be shared
//! freely across concurrent readers. Tests inject fixture data through
//! [`TrackStore::from_tracks`] instead of touching process-wide state.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::BufReader;

use ahash::RandomState;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::{Degree, VoyageId};
use crate::geo::{parse_log_date, GeoBounds};
use crate::tradewind_errors::TradewindError;

// -------------------------------------------------------------------------------------------------
// Value types
// -------------------------------------------------------------------------------------------------

/// One dated logbook fix. Immutable once loaded.
///
/// Wind observations are sparse in the source archives (Beaufort force is
/// recorded for roughly a sixth of positions, direction for most), so both
/// are optional; `anchored` marks fixes taken while riding at anchor, which
/// the speed pipeline excludes by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: Degree,
    pub lon: Degree,

    /// Raw `Y-M-D` date string as digitized; may be absent or malformed.
    #[serde(default)]
    pub date: Option<String>,

    /// Beaufort wind force, 0-12.
    #[serde(default)]
    pub wind_force: Option<u8>,

    /// Wind direction in degrees clockwise from north.
    #[serde(default)]
    pub wind_direction: Option<Degree>,

    #[serde(default)]
    pub anchored: bool,
}

impl Position {
    /// The fix date, if the raw string parses. Malformed dates are data
    /// gaps, not errors.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_log_date)
    }
}

/// The full chronological position history of one historical voyage.
///
/// Tagged with a nationality code, an optional ship name, and an optional
/// linkage key into an external voyage archive. Summary fields
/// (`start_date`, `year_start`, ...) come from the archive where present;
/// [`Track::start_year`] falls back to the first parsable position date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub voyage_id: VoyageId,

    #[serde(default)]
    pub nationality: Option<String>,

    #[serde(default)]
    pub ship_name: Option<String>,

    /// Linkage key to an external voyage record (e.g. `"das:0372.1"`).
    #[serde(default)]
    pub archive_ref: Option<String>,

    #[serde(default)]
    pub start_date: Option<String>,

    #[serde(default)]
    pub end_date: Option<String>,

    #[serde(default)]
    pub year_start: Option<i32>,

    #[serde(default)]
    pub year_end: Option<i32>,

    /// Positions in chronological order, as digitized.
    #[serde(default)]
    pub positions: Vec<Position>,
}

impl Track {
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Departure year of the voyage: the archive's `year_start` where
    /// present, otherwise the year of the first parsable position date.
    pub fn start_year(&self) -> Option<i32> {
        if let Some(y) = self.year_start {
            return Some(y);
        }
        if let Some(d) = self.start_date.as_deref().and_then(parse_log_date) {
            return Some(d.year());
        }
        self.positions.iter().find_map(|p| p.parsed_date()).map(|d| d.year())
    }

    /// A track passes a region filter if *any* of its positions is inside.
    pub fn passes_region(&self, bounds: &GeoBounds) -> bool {
        bounds.is_unbounded() || self.positions.iter().any(|p| bounds.contains(p.lat, p.lon))
    }
}

// -------------------------------------------------------------------------------------------------
// Track store
// -------------------------------------------------------------------------------------------------

/// On-disk archive layout: a `tracks` array plus ignored metadata keys.
#[derive(Deserialize)]
struct ArchiveFile {
    #[serde(default)]
    tracks: Vec<Track>,
}

/// Loaded, indexed track collection.
#[derive(Debug)]
pub struct TrackData {
    tracks: Vec<Track>,
    by_id: HashMap<VoyageId, usize, RandomState>,
}

impl TrackData {
    fn new(tracks: Vec<Track>) -> Self {
        let by_id = tracks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.voyage_id, i))
            .collect();
        Self { tracks, by_id }
    }
}

enum TrackSource {
    Archive(Utf8PathBuf),
    Preloaded,
}

/// Read-only context over one track archive.
///
/// Construct once, pass by reference everywhere. The archive file is read
/// and indexed on first access and cached for the lifetime of the store;
/// concurrent first accesses race benignly inside the [`OnceCell`] guard
/// and every caller sees the same loaded data.
///
/// Example
/// -----------------
/// ```rust, no_run
/// use tradewind::tracks::TrackStore;
///
/// # fn demo() -> Result<(), tradewind::tradewind_errors::TradewindError> {
/// let store = TrackStore::from_archive("data/cliwoc_tracks.json");
/// let track = store.get_track(4242)?;
/// assert!(track.is_none() || track.unwrap().voyage_id == 4242);
/// # Ok(()) }
/// ```
pub struct TrackStore {
    source: TrackSource,
    data: OnceCell<TrackData>,
}

impl TrackStore {
    /// Store backed by a JSON archive file. The file is not opened yet; it
    /// is read lazily on first access.
    pub fn from_archive(path: impl AsRef<Utf8Path>) -> Self {
        Self {
            source: TrackSource::Archive(path.as_ref().to_path_buf()),
            data: OnceCell::new(),
        }
    }

    /// Store over in-memory tracks, for tests and embedded callers.
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        debug!(tracks = tracks.len(), "track store built from memory");
        let cell = OnceCell::new();
        let _ = cell.set(TrackData::new(tracks));
        Self {
            source: TrackSource::Preloaded,
            data: cell,
        }
    }

    fn data(&self) -> Result<&TrackData, TradewindError> {
        self.data.get_or_try_init(|| match &self.source {
            TrackSource::Preloaded => unreachable!("preloaded store always has data"),
            TrackSource::Archive(path) => {
                if !path.exists() {
                    return Err(TradewindError::TrackArchiveNotFound(path.clone()));
                }
                let reader = BufReader::new(File::open(path)?);
                let archive: ArchiveFile = serde_json::from_reader(reader)?;
                let data = TrackData::new(archive.tracks);
                info!(
                    tracks = data.tracks.len(),
                    positions = data.tracks.iter().map(Track::position_count).sum::<usize>(),
                    path = %path,
                    "loaded track archive"
                );
                Ok(data)
            }
        })
    }

    /// Force the archive load now. Idempotent: a call that finds data
    /// already present returns immediately.
    pub fn load(&self) -> Result<(), TradewindError> {
        self.data().map(|_| ())
    }

    /// All loaded tracks, in archive order.
    pub fn tracks(&self) -> Result<&[Track], TradewindError> {
        Ok(&self.data()?.tracks)
    }

    /// Look up one voyage. An unknown id is an absent result, never an
    /// error.
    pub fn get_track(&self, voyage_id: VoyageId) -> Result<Option<&Track>, TradewindError> {
        let data = self.data()?;
        Ok(data.by_id.get(&voyage_id).map(|&i| &data.tracks[i]))
    }

    pub fn track_count(&self) -> Result<usize, TradewindError> {
        Ok(self.data()?.tracks.len())
    }

    pub fn position_count(&self) -> Result<usize, TradewindError> {
        Ok(self.data()?.tracks.iter().map(Track::position_count).sum())
    }
}

// -------------------------------------------------------------------------------------------------
// Track-level filters
// -------------------------------------------------------------------------------------------------

/// Track-level selection by nationality and year range.
///
/// Year semantics follow the source archive's search convention: a track
/// qualifies when it starts no earlier than `year_start` and ends no later
/// than `year_end`. A track with an unknown year passes a set bound — the
/// archives are full of undated voyages, and a year filter is meant to cut
/// the dated ones, not silently discard the rest.
#[derive(Debug, Clone, Default)]
pub struct TrackFilter {
    pub nationality: Option<String>,
    pub year_start: Option<i32>,
    pub year_end: Option<i32>,
}

impl TrackFilter {
    pub fn matches(&self, track: &Track) -> bool {
        if let Some(nat) = &self.nationality {
            match &track.nationality {
                Some(t) if t.eq_ignore_ascii_case(nat) => {}
                _ => return false,
            }
        }
        if let Some(ys) = self.year_start {
            if track.start_year().unwrap_or(9999) < ys {
                return false;
            }
        }
        if let Some(ye) = self.year_end {
            if track.year_end.unwrap_or(0) > ye {
                return false;
            }
        }
        true
    }
}

// -------------------------------------------------------------------------------------------------
// Period specifications
// -------------------------------------------------------------------------------------------------

/// A set of departure years, parsed from a `"YYYY/YYYY"` inclusive range or
/// a `"YYYY,YYYY,..."` list (single years allowed in either form).
///
/// Non-contiguous lists exist so callers can compare, say, El Niño years
/// against neutral years. An unparsable specification is a caller error and
/// fails fast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSpec {
    label: String,
    years: BTreeSet<i32>,
}

impl PeriodSpec {
    pub fn parse(spec: &str) -> Result<Self, TradewindError> {
        let label = spec.trim().to_string();
        let invalid = || TradewindError::InvalidPeriodSpec(spec.to_string());

        let mut years = BTreeSet::new();
        if label.contains('/') {
            let (a, b) = label.split_once('/').ok_or_else(invalid)?;
            let start: i32 = a.trim().parse().map_err(|_| invalid())?;
            let end: i32 = b.trim().parse().map_err(|_| invalid())?;
            if start > end {
                return Err(invalid());
            }
            years.extend(start..=end);
        } else {
            for part in label.split(',') {
                let year: i32 = part.trim().parse().map_err(|_| invalid())?;
                years.insert(year);
            }
        }
        if years.is_empty() {
            return Err(invalid());
        }
        Ok(Self { label, years })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.years.contains(&year)
    }

    /// Period membership of a voyage, by departure year.
    pub fn contains_track(&self, track: &Track) -> bool {
        track.start_year().is_some_and(|y| self.contains_year(y))
    }
}
