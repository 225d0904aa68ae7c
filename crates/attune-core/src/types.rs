//! Core data model for attune.
//!
//! Every type here is a plain value: construction fixes identity, and the
//! verification pipeline only ever produces new values from old ones. The
//! one sanctioned mutation is metadata enrichment (filling a missing field
//! from the fallback researcher), which happens on a clone owned by the
//! verifier; caller-held tracks are never touched.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cognitive-state session mode.
///
/// Closed enumeration, chosen once per request. Adding a mode is a
/// compile-time event: `compose` matches exhaustively on this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Focus,
    Relax,
    Sleep,
    Meditation,
}

impl Mode {
    /// Stable string form, used in logs and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Focus => "focus",
            Mode::Relax => "relax",
            Mode::Sleep => "sleep",
            Mode::Meditation => "meditation",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a track's metadata fields came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Structured features from the primary metadata resolver.
    PrimaryResolver,
    /// At least one field was filled by textual fallback research.
    FallbackResearch,
}

/// Machine-checkable constraints for one session mode.
///
/// Produced once per request by [`compose`](crate::compose); read-only
/// afterward. Identity is value equality: two requests for the same mode
/// and genre yield equal constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConstraints {
    pub mode: Mode,

    /// Minimum tempo in BPM, if the mode bounds tempo from below.
    pub tempo_min: Option<f64>,

    /// Maximum tempo in BPM, if the mode bounds tempo from above.
    pub tempo_max: Option<f64>,

    /// Minimum energy (0.0-1.0). Unused by every current mode.
    pub energy_min: Option<f64>,

    /// Maximum energy (0.0-1.0).
    pub energy_max: Option<f64>,

    /// Hard ban: reject any track with vocals.
    pub no_vocals: bool,

    /// Hard ban: reject live versions.
    pub avoid_live: bool,

    /// Hard ban: reject remastered versions.
    pub avoid_remaster: bool,

    /// Hard ban: reject tracks with featured artists.
    pub avoid_feat: bool,

    /// Preferred genres. A soft preference carried to the candidate
    /// supplier, never enforced as a constraint.
    pub genres: Vec<String>,

    /// Preferred key ("Major"/"Minor"), soft preference only.
    pub key_preference: Option<String>,
}

impl ProtocolConstraints {
    /// Whether any tempo bound is set.
    pub fn requires_tempo(&self) -> bool {
        self.tempo_min.is_some() || self.tempo_max.is_some()
    }

    /// Whether any energy bound is set.
    pub fn requires_energy(&self) -> bool {
        self.energy_min.is_some() || self.energy_max.is_some()
    }
}

/// One candidate track with best-effort metadata.
///
/// # Identity lock
/// `catalog_id` and `playback_uri` are fixed at resolution time and must
/// never be substituted downstream. Enrichment fills missing acoustic
/// fields; it never re-identifies the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Stable catalog identifier.
    pub catalog_id: String,

    /// Exact playable reference for this catalog entry.
    pub playback_uri: String,

    /// Display name.
    pub name: String,

    /// Primary artist.
    pub artist: String,

    /// Album name, when known.
    pub album: Option<String>,

    /// Duration in milliseconds, when known.
    pub duration_ms: Option<u64>,

    /// Tempo in BPM, when known.
    pub tempo_bpm: Option<f64>,

    /// Musical key, when known.
    pub key: Option<String>,

    /// Explicit instrumental flag. Authoritative over the
    /// speechiness/instrumentalness heuristic when present.
    pub is_instrumental: Option<bool>,

    /// Energy level (0.0-1.0), when known.
    pub energy: Option<f64>,

    /// Speechiness (0.0-1.0), when known.
    pub speechiness: Option<f64>,

    /// Instrumentalness (0.0-1.0), when known.
    pub instrumentalness: Option<f64>,

    /// Whether the track carries an explicit-content flag.
    pub explicit: bool,

    /// Whether the track is a live version.
    pub is_live: bool,

    /// Whether the track is a remaster.
    pub is_remaster: bool,

    /// Whether the track credits featured artists.
    pub has_feat: bool,

    /// Where the metadata fields came from.
    pub provenance: Provenance,
}

impl TrackMetadata {
    /// Create a bare track stub with identity and display fields only.
    ///
    /// All acoustic fields start unknown; flags default to false. This is
    /// the shape candidate suppliers return before feature enrichment.
    pub fn stub(
        catalog_id: impl Into<String>,
        playback_uri: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            playback_uri: playback_uri.into(),
            name: name.into(),
            artist: artist.into(),
            album: None,
            duration_ms: None,
            tempo_bpm: None,
            key: None,
            is_instrumental: None,
            energy: None,
            speechiness: None,
            instrumentalness: None,
            explicit: false,
            is_live: false,
            is_remaster: false,
            has_feat: false,
            provenance: Provenance::PrimaryResolver,
        }
    }

    /// Fill missing fields from a partial feature record.
    ///
    /// Only absent fields are filled. A field already present on the
    /// track is never overwritten, and identity fields are untouchable.
    pub fn apply_features(&mut self, features: &PartialFeatures) {
        if self.duration_ms.is_none() {
            self.duration_ms = features.duration_ms;
        }
        if self.tempo_bpm.is_none() {
            self.tempo_bpm = features.tempo_bpm;
        }
        if self.key.is_none() {
            self.key = features.key.clone();
        }
        if self.is_instrumental.is_none() {
            self.is_instrumental = features.is_instrumental;
        }
        if self.energy.is_none() {
            self.energy = features.energy;
        }
        if self.speechiness.is_none() {
            self.speechiness = features.speechiness;
        }
        if self.instrumentalness.is_none() {
            self.instrumentalness = features.instrumentalness;
        }
        if let Some(explicit) = features.explicit {
            self.explicit = explicit;
        }
        if let Some(live) = features.is_live {
            self.is_live = live;
        }
        if let Some(remaster) = features.is_remaster {
            self.is_remaster = remaster;
        }
        if let Some(feat) = features.has_feat {
            self.has_feat = feat;
        }
    }
}

/// Partial metadata record from the primary feature source.
///
/// Every field is optional so that "absent" stays distinguishable from a
/// false/zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialFeatures {
    pub duration_ms: Option<u64>,
    pub tempo_bpm: Option<f64>,
    pub key: Option<String>,
    pub is_instrumental: Option<bool>,
    pub energy: Option<f64>,
    pub speechiness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub explicit: Option<bool>,
    pub is_live: Option<bool>,
    pub is_remaster: Option<bool>,
    pub has_feat: Option<bool>,
}

/// Why a track was rejected (or that verification itself broke).
///
/// Closed set so summaries can histogram over it. `as_str` is the stable
/// wire/summary form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCategory {
    Vocals,
    LiveVersion,
    Remaster,
    FeaturedArtist,
    TempoOutOfRange,
    EnergyOutOfRange,
    InsufficientConfidence,
    DistractionThreshold,
    VerificationError,
}

impl RejectionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCategory::Vocals => "vocals",
            RejectionCategory::LiveVersion => "live_version",
            RejectionCategory::Remaster => "remaster",
            RejectionCategory::FeaturedArtist => "featured_artist",
            RejectionCategory::TempoOutOfRange => "tempo_out_of_range",
            RejectionCategory::EnergyOutOfRange => "energy_out_of_range",
            RejectionCategory::InsufficientConfidence => "insufficient_confidence",
            RejectionCategory::DistractionThreshold => "distraction_threshold",
            RejectionCategory::VerificationError => "verification_error",
        }
    }
}

impl fmt::Display for RejectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One feature's contribution to a distraction score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    /// Feature name ("speechiness", "instrumentalness", ...).
    pub feature: String,

    /// Contribution added to the score by this feature.
    pub contribution: f64,
}

/// A bounded [0,1] distraction estimate with its feature breakdown.
///
/// Lower is better. The breakdown makes every score auditable: the sum of
/// contributions equals the pre-clamp value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionScore {
    /// Final score, clamped to [0.0, 1.0].
    pub value: f64,

    /// Per-feature contributions, in evaluation order.
    pub components: Vec<ScoreComponent>,
}

/// Outcome of verifying one (track, constraints) pair.
///
/// Immutable once built. Every result, approved or rejected, carries at
/// least one human-readable reason; an approval with zero reasons is a bug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// The track as evaluated, including any enrichment performed.
    pub track: TrackMetadata,

    /// Whether the track satisfies every constraint.
    pub approved: bool,

    /// Confidence in the decision (0.0-1.0). Low confidence always means
    /// rejection, never a tentative approval.
    pub confidence: f64,

    /// Ordered human-readable reasons, for audit.
    pub reasons: Vec<String>,

    /// Rejection category, `None` for approvals.
    pub category: Option<RejectionCategory>,

    /// Distraction score. Present for every Focus-mode verification,
    /// regardless of outcome.
    pub distraction_score: Option<DistractionScore>,
}

/// Request for one curation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistRequest {
    pub mode: Mode,

    /// Optional genre preference, carried through to constraints.
    pub genre: Option<String>,

    /// Target playlist duration in minutes. Defaults to 60.
    pub duration_minutes: Option<u32>,
}

impl PlaylistRequest {
    /// Default target duration when the caller leaves it unset.
    pub const DEFAULT_DURATION_MINUTES: u32 = 60;

    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            genre: None,
            duration_minutes: None,
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Requested duration, falling back to the default.
    pub fn target_duration_minutes(&self) -> u32 {
        self.duration_minutes
            .unwrap_or(Self::DEFAULT_DURATION_MINUTES)
    }
}

/// Aggregate accept/reject counts for one run.
///
/// Invariants (checked by tests, not assumed): `approved + rejected ==
/// total_candidates`, and the rejection histogram sums to `rejected`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total_candidates: usize,
    pub approved: usize,
    pub rejected: usize,

    /// Rejection counts keyed by [`RejectionCategory::as_str`]. BTreeMap
    /// keeps serialized output deterministic.
    pub rejections: BTreeMap<String, usize>,
}

impl VerificationSummary {
    /// Tally a run's verification results.
    pub fn from_results(results: &[VerificationResult]) -> Self {
        let mut summary = Self {
            total_candidates: results.len(),
            ..Self::default()
        };

        for result in results {
            if result.approved {
                summary.approved += 1;
            } else {
                summary.rejected += 1;
                let key = result
                    .category
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_else(|| "uncategorized".to_string());
                *summary.rejections.entry(key).or_insert(0) += 1;
            }
        }

        summary
    }
}

/// Final approved set for one curation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistResult {
    pub mode: Mode,

    /// Approved tracks, in original candidate order.
    pub tracks: Vec<TrackMetadata>,

    /// Sum of known track durations, in milliseconds.
    pub total_duration_ms: u64,

    /// Accept/reject accounting across all candidates.
    pub verification_summary: VerificationSummary,

    /// When the run completed.
    pub generated_at: DateTime<Utc>,
}
