//! Constraint composition: maps a session mode to machine-checkable
//! constraints.
//!
//! Pure and total over [`Mode`]. Each mode has a fixed constants table; a
//! user-supplied genre replaces the default genre list, everything else is
//! non-negotiable. Exhaustive `match` means a new mode cannot silently
//! fall through.

use crate::types::{Mode, ProtocolConstraints};

// Focus: steady mid-tempo, instrumental only, no novelty triggers.
pub const FOCUS_TEMPO_MIN: f64 = 120.0;
pub const FOCUS_TEMPO_MAX: f64 = 140.0;
pub const FOCUS_MAX_ENERGY: f64 = 0.7;

// Relax: slow to moderate, vocals allowed, major key preferred.
pub const RELAX_TEMPO_MIN: f64 = 60.0;
pub const RELAX_TEMPO_MAX: f64 = 90.0;
pub const RELAX_MAX_ENERGY: f64 = 0.5;

// Sleep: at resting heart rate or below.
pub const SLEEP_TEMPO_MAX: f64 = 60.0;
pub const SLEEP_MAX_ENERGY: f64 = 0.3;

// Meditation: slightly above sleep, no guided speech.
pub const MEDITATION_TEMPO_MAX: f64 = 70.0;
pub const MEDITATION_MAX_ENERGY: f64 = 0.4;

/// Compose protocol constraints for a mode.
///
/// `genre` is carried through as a soft preference: when set it replaces
/// the mode's default genre list, when unset the defaults apply.
pub fn compose(mode: Mode, genre: Option<&str>) -> ProtocolConstraints {
    let genres = |defaults: &[&str]| -> Vec<String> {
        match genre {
            Some(g) => vec![g.to_string()],
            None => defaults.iter().map(|s| s.to_string()).collect(),
        }
    };

    match mode {
        Mode::Focus => ProtocolConstraints {
            mode,
            tempo_min: Some(FOCUS_TEMPO_MIN),
            tempo_max: Some(FOCUS_TEMPO_MAX),
            energy_min: None,
            energy_max: Some(FOCUS_MAX_ENERGY),
            no_vocals: true,
            avoid_live: true,
            avoid_remaster: true,
            avoid_feat: true,
            genres: genres(&["Techno", "Baroque", "Post-Rock"]),
            key_preference: None,
        },
        Mode::Relax => ProtocolConstraints {
            mode,
            tempo_min: Some(RELAX_TEMPO_MIN),
            tempo_max: Some(RELAX_TEMPO_MAX),
            energy_min: None,
            energy_max: Some(RELAX_MAX_ENERGY),
            no_vocals: false,
            avoid_live: false,
            avoid_remaster: false,
            avoid_feat: false,
            genres: genres(&["Acoustic", "Ambient", "Jazz"]),
            key_preference: Some("Major".to_string()),
        },
        Mode::Sleep => ProtocolConstraints {
            mode,
            tempo_min: None,
            tempo_max: Some(SLEEP_TEMPO_MAX),
            energy_min: None,
            energy_max: Some(SLEEP_MAX_ENERGY),
            no_vocals: false,
            avoid_live: true,
            avoid_remaster: false,
            avoid_feat: false,
            genres: genres(&["Ambient", "Drone", "Nature Sounds"]),
            key_preference: None,
        },
        Mode::Meditation => ProtocolConstraints {
            mode,
            tempo_min: None,
            tempo_max: Some(MEDITATION_TEMPO_MAX),
            energy_min: None,
            energy_max: Some(MEDITATION_MAX_ENERGY),
            no_vocals: true,
            avoid_live: true,
            avoid_remaster: false,
            avoid_feat: false,
            genres: genres(&["Ambient", "Drone", "Nature Sounds"]),
            key_preference: None,
        },
    }
}
