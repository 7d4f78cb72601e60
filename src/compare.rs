//! # Period comparison and difference-in-differences
//!
//! Hypothesis-testing surface over the speed pipeline:
//!
//! * [`compare_speed_periods`] — did the fleet sail faster in one set of
//!   years than another? Mann-Whitney rank test plus Cohen's d.
//! * [`did_speed_test`] — did one sailing *direction* gain more between two
//!   periods than the other? 2×2 direction × period design with a
//!   bootstrap difference-in-differences estimate. This is the test that
//!   separates a circulation shift (asymmetric gain) from across-the-board
//!   changes in ships or navigation (symmetric gain).
//!
//! Both default to voyage granularity so well-logged voyages do not
//! pseudo-replicate their way into significance.

use serde::Serialize;

use crate::aggregate::{Granularity, ObservationFilter};
use crate::geo::Direction;
use crate::speed::SpeedFilter;
use crate::stats::{bootstrap_did, cohens_d, mann_whitney_u, mean, sample_std, Bootstrap, RankTest};
use crate::tracks::{PeriodSpec, Track, TrackFilter, TrackStore};
use crate::tradewind_errors::TradewindError;

/// Significance threshold for the comparison tests.
const ALPHA: f64 = 0.05;

/// Options shared by the comparison entry points.
#[derive(Debug, Clone)]
pub struct ComparisonOptions {
    pub granularity: Granularity,
    /// Years removed from *both* periods (e.g. known wartime disruptions).
    pub exclude: Option<PeriodSpec>,
    /// Attach the raw per-sample values to the result for downstream
    /// plotting or re-testing.
    pub include_samples: bool,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::Voyage,
            exclude: None,
            include_samples: false,
        }
    }
}

impl ComparisonOptions {
    fn track_excluded(&self, track: &Track) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|ex| ex.contains_track(track))
    }
}

/// Per-period sample summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub label: String,
    pub n: usize,
    pub mean_km_day: f64,
    pub std_dev: f64,
}

/// Result of [`compare_speed_periods`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedComparison {
    pub period1: PeriodSummary,
    pub period2: PeriodSummary,
    /// `period2 − period1` mean difference in km/day.
    pub mean_diff: f64,
    pub rank_test: RankTest,
    /// Cohen's d of period1 against period2.
    pub effect_size: f64,
    pub significant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples1: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples2: Option<Vec<f64>>,
}

/// Collect one period's speed sample under the given granularity.
fn period_samples(
    store: &TrackStore,
    period: &PeriodSpec,
    track_filter: &TrackFilter,
    speed_filter: &SpeedFilter,
    obs_filter: &ObservationFilter,
    options: &ComparisonOptions,
) -> Result<Vec<f64>, TradewindError> {
    let mut samples = Vec::new();
    for track in store.tracks()? {
        if !period.contains_track(track)
            || options.track_excluded(track)
            || !track_filter.matches(track)
            || !track.passes_region(&speed_filter.bounds)
        {
            continue;
        }

        let mut voyage: Vec<f64> = Vec::new();
        for obs in track.segment_speeds(speed_filter) {
            if !obs_filter.matches(&obs) {
                continue;
            }
            match options.granularity {
                Granularity::Observation => samples.push(obs.km_day),
                Granularity::Voyage => voyage.push(obs.km_day),
            }
        }
        if !voyage.is_empty() {
            samples.push(voyage.iter().sum::<f64>() / voyage.len() as f64);
        }
    }
    Ok(samples)
}

/// Compare sailing speeds between two sets of departure years.
///
/// Arguments
/// -----------------
/// * `store`: The loaded track context.
/// * `period1`, `period2`: Year sets to compare (membership by voyage
///   departure year).
/// * `track_filter` / `speed_filter` / `obs_filter`: The usual pipeline
///   filters, applied identically to both periods.
/// * `options`: Granularity, excluded years, raw-sample attachment.
///
/// Return
/// ----------
/// * [`SpeedComparison`] with per-period summaries, the tie-corrected
///   Mann-Whitney test, and Cohen's d. An empty period degrades to the
///   no-signal test result (`p = 1`), never an error.
pub fn compare_speed_periods(
    store: &TrackStore,
    period1: &PeriodSpec,
    period2: &PeriodSpec,
    track_filter: &TrackFilter,
    speed_filter: &SpeedFilter,
    obs_filter: &ObservationFilter,
    options: &ComparisonOptions,
) -> Result<SpeedComparison, TradewindError> {
    speed_filter.validate()?;

    let s1 = period_samples(store, period1, track_filter, speed_filter, obs_filter, options)?;
    let s2 = period_samples(store, period2, track_filter, speed_filter, obs_filter, options)?;

    let rank_test = mann_whitney_u(&s1, &s2);
    let effect_size = cohens_d(&s1, &s2);

    let summary = |label: &str, sample: &[f64]| PeriodSummary {
        label: label.to_string(),
        n: sample.len(),
        mean_km_day: mean(sample),
        std_dev: sample_std(sample),
    };

    Ok(SpeedComparison {
        period1: summary(period1.label(), &s1),
        period2: summary(period2.label(), &s2),
        mean_diff: mean(&s2) - mean(&s1),
        significant: rank_test.p_value < ALPHA,
        effect_size,
        rank_test,
        samples1: options.include_samples.then(|| s1),
        samples2: options.include_samples.then(|| s2),
    })
}

/// One cell of the 2×2 direction × period design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DidCell {
    pub n: usize,
    pub mean_km_day: f64,
}

/// Result of [`did_speed_test`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DidTest {
    pub period1_label: String,
    pub period2_label: String,
    pub pre_east: DidCell,
    pub pre_west: DidCell,
    pub post_east: DidCell,
    pub post_west: DidCell,
    /// Eastbound change between the periods, km/day.
    pub east_diff: f64,
    /// Westbound change between the periods, km/day.
    pub west_diff: f64,
    /// `east_diff − west_diff` with bootstrap CI and p-value.
    pub did: Bootstrap,
    pub significant: bool,
}

/// Per-direction voyage-mean samples of one period.
fn direction_samples(
    store: &TrackStore,
    period: &PeriodSpec,
    track_filter: &TrackFilter,
    speed_filter: &SpeedFilter,
    obs_filter: &ObservationFilter,
    options: &ComparisonOptions,
) -> Result<(Vec<f64>, Vec<f64>), TradewindError> {
    let mut east = Vec::new();
    let mut west = Vec::new();
    for track in store.tracks()? {
        if !period.contains_track(track)
            || options.track_excluded(track)
            || !track_filter.matches(track)
            || !track.passes_region(&speed_filter.bounds)
        {
            continue;
        }

        let mut voyage_east: Vec<f64> = Vec::new();
        let mut voyage_west: Vec<f64> = Vec::new();
        for obs in track.segment_speeds(speed_filter) {
            if !obs_filter.matches(&obs) {
                continue;
            }
            match obs.direction {
                Direction::Eastbound => voyage_east.push(obs.km_day),
                Direction::Westbound => voyage_west.push(obs.km_day),
            }
        }
        // Voyage granularity: one mean per direction per voyage.
        if !voyage_east.is_empty() {
            east.push(voyage_east.iter().sum::<f64>() / voyage_east.len() as f64);
        }
        if !voyage_west.is_empty() {
            west.push(voyage_west.iter().sum::<f64>() / voyage_west.len() as f64);
        }
    }
    Ok((east, west))
}

/// Difference-in-differences test across direction and period.
///
/// Each voyage contributes at most one eastbound and one westbound mean per
/// period (voyage granularity is fixed here). The DiD estimate is
///
/// `(post_east − pre_east) − (post_west − pre_west)`
///
/// with a seeded bootstrap confidence interval: a significantly positive
/// value says the eastbound passage improved more than the westbound one,
/// the signature of a westerly-circulation strengthening rather than a
/// fleet-wide technology gain.
///
/// Return
/// ----------
/// * [`DidTest`]; any empty cell degrades to the no-signal bootstrap
///   result (`p = 1`), never an error.
#[allow(clippy::too_many_arguments)]
pub fn did_speed_test(
    store: &TrackStore,
    period1: &PeriodSpec,
    period2: &PeriodSpec,
    track_filter: &TrackFilter,
    speed_filter: &SpeedFilter,
    obs_filter: &ObservationFilter,
    options: &ComparisonOptions,
    n_bootstrap: usize,
    seed: u64,
) -> Result<DidTest, TradewindError> {
    speed_filter.validate()?;

    let (pre_east, pre_west) =
        direction_samples(store, period1, track_filter, speed_filter, obs_filter, options)?;
    let (post_east, post_west) =
        direction_samples(store, period2, track_filter, speed_filter, obs_filter, options)?;

    let cell = |sample: &[f64]| DidCell {
        n: sample.len(),
        mean_km_day: mean(sample),
    };

    let did = bootstrap_did(&pre_east, &pre_west, &post_east, &post_west, n_bootstrap, seed);

    Ok(DidTest {
        period1_label: period1.label().to_string(),
        period2_label: period2.label().to_string(),
        east_diff: mean(&post_east) - mean(&pre_east),
        west_diff: mean(&post_west) - mean(&pre_west),
        pre_east: cell(&pre_east),
        pre_west: cell(&pre_west),
        post_east: cell(&post_east),
        post_west: cell(&post_west),
        significant: did.p_value < ALPHA,
        did,
    })
}
