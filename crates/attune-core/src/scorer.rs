//! Distraction scoring for Focus mode.
//!
//! Estimates how likely a track is to pull attention away from the target
//! cognitive state. Lower is better. The score is a fixed-weight sum over
//! available features, clamped to [0,1], and every contribution is
//! recorded so a rejection can be audited feature by feature.

use crate::types::{DistractionScore, ScoreComponent, TrackMetadata};

/// Weight on speechiness (speech pulls attention).
pub const SPEECHINESS_WEIGHT: f64 = 0.4;

/// Weight on (1 - instrumentalness).
pub const INSTRUMENTALNESS_WEIGHT: f64 = 0.3;

/// Weight on energy distance from the neutral midpoint.
pub const ENERGY_WEIGHT: f64 = 0.2;

/// Flat penalty for explicit content.
pub const EXPLICIT_PENALTY: f64 = 0.2;

/// Energy this far from ideal is neutral; deviation in either direction
/// is distracting.
pub const ENERGY_MIDPOINT: f64 = 0.5;

/// Scores above this reject the track in Focus mode.
pub const REJECTION_THRESHOLD: f64 = 0.7;

/// Compute the distraction score for a track.
///
/// Missing features contribute nothing; the surrounding verification
/// pipeline is responsible for rejecting tracks whose required features
/// are unknown; the scorer only judges what is present.
pub fn distraction_score(track: &TrackMetadata) -> DistractionScore {
    let mut components = Vec::new();
    let mut score = 0.0;

    if let Some(speechiness) = track.speechiness {
        let contribution = speechiness * SPEECHINESS_WEIGHT;
        components.push(ScoreComponent {
            feature: "speechiness".to_string(),
            contribution,
        });
        score += contribution;
    }

    if let Some(instrumentalness) = track.instrumentalness {
        let contribution = (1.0 - instrumentalness) * INSTRUMENTALNESS_WEIGHT;
        components.push(ScoreComponent {
            feature: "instrumentalness".to_string(),
            contribution,
        });
        score += contribution;
    }

    if let Some(energy) = track.energy {
        // Distance from the midpoint, scaled so the extremes weigh fully.
        let deviation = (energy - ENERGY_MIDPOINT).abs() * 2.0;
        let contribution = deviation * ENERGY_WEIGHT;
        components.push(ScoreComponent {
            feature: "energy".to_string(),
            contribution,
        });
        score += contribution;
    }

    if track.explicit {
        components.push(ScoreComponent {
            feature: "explicit".to_string(),
            contribution: EXPLICIT_PENALTY,
        });
        score += EXPLICIT_PENALTY;
    }

    DistractionScore {
        value: score.clamp(0.0, 1.0),
        components,
    }
}
