//! # attune-core
//!
//! Deterministic constraint composition and track verification engine.
//!
//! This crate holds everything about curation that can be answered without
//! leaving the process:
//! - mapping a session mode to machine-checkable constraints,
//! - the vocal heuristic and tempo/energy range checks,
//! - distraction scoring with a per-feature audit trail,
//! - BPM extraction from raw research text.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No I/O**: All network and lookup work lives in `attune-runtime`
//! 3. **Auditable**: Every score carries its feature breakdown; every
//!    verification result carries ordered reason strings
//! 4. **Conservative**: Missing data never satisfies a constraint;
//!    unknowns reject, they do not approve
//!
//! ## Example
//!
//! ```rust
//! use attune_core::{compose, Mode};
//!
//! let constraints = compose(Mode::Focus, None);
//! assert_eq!(constraints.tempo_min, Some(120.0));
//! assert!(constraints.no_vocals);
//! ```

pub mod checks;
pub mod composer;
pub mod scorer;
pub mod tempo;
pub mod types;

// Re-export main types at crate root
pub use composer::compose;
pub use scorer::distraction_score;
pub use tempo::extract_bpm;
pub use types::{
    DistractionScore, Mode, PartialFeatures, PlaylistRequest, PlaylistResult,
    ProtocolConstraints, Provenance, RejectionCategory, ScoreComponent, TrackMetadata,
    VerificationResult, VerificationSummary,
};
