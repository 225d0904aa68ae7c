//! Pure verification checks: the vocal heuristic and range checks.
//!
//! These are the deterministic pieces of the verifier: given the same
//! track metadata they always answer the same way, with no I/O. The async
//! runtime layers fallback research on top when a required value is
//! missing.

use crate::types::TrackMetadata;

/// Speechiness above this reads as speech-like content.
pub const SPEECHINESS_THRESHOLD: f64 = 0.33;

/// Instrumentalness above this reads as instrumental.
pub const INSTRUMENTALNESS_THRESHOLD: f64 = 0.5;

/// Outcome of a single numeric range check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeCheck {
    /// Value inside every populated bound.
    Within,
    /// Value under the populated minimum.
    BelowMin(f64),
    /// Value over the populated maximum.
    AboveMax(f64),
}

/// Whether the track should be treated as carrying vocals.
///
/// The explicit `is_instrumental` flag is authoritative when present.
/// Otherwise instrumentalness decides, then speechiness. When nothing is
/// known the answer is "vocals": missing data never clears a hard ban.
pub fn has_vocals(track: &TrackMetadata) -> bool {
    if let Some(instrumental) = track.is_instrumental {
        return !instrumental;
    }

    if let Some(instrumentalness) = track.instrumentalness {
        return instrumentalness <= INSTRUMENTALNESS_THRESHOLD;
    }

    if let Some(speechiness) = track.speechiness {
        return speechiness >= SPEECHINESS_THRESHOLD;
    }

    true
}

/// Check a value against optional min/max bounds.
pub fn check_range(value: f64, min: Option<f64>, max: Option<f64>) -> RangeCheck {
    if let Some(min) = min {
        if value < min {
            return RangeCheck::BelowMin(min);
        }
    }
    if let Some(max) = max {
        if value > max {
            return RangeCheck::AboveMax(max);
        }
    }
    RangeCheck::Within
}
