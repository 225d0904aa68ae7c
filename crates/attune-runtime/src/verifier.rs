//! Hybrid track verification.
//!
//! Applies one constraint set to one track, in a fixed order that
//! short-circuits on the first rejection:
//!
//! 1. Hard bans (vocals, live, remaster, featured artists): metadata
//!    flags are authoritative; the fallback researcher is never consulted
//! 2. Tempo range: unknown tempo triggers fallback research; a lookup
//!    that yields nothing rejects on insufficient confidence
//! 3. Energy range: no research path exists for energy, so a required
//!    but unknown energy rejects on insufficient confidence
//! 4. Distraction gate (Focus mode only)
//!
//! For Focus mode the distraction score is computed up front and attached
//! to the result on every exit path, so an audit can see the score of a
//! track that was rejected for an unrelated reason.

use attune_core::{
    checks, scorer,
    types::{
        DistractionScore, Mode, ProtocolConstraints, Provenance, RejectionCategory, TrackMetadata,
        VerificationResult,
    },
};

use crate::researcher::FallbackResearcher;
use crate::resilience::ResearchBudget;

/// Confidence attached to distraction-threshold rejections. The score is
/// an estimate built from proxies, not a measured fact.
const DISTRACTION_REJECT_CONFIDENCE: f64 = 0.9;

/// Verifies tracks against protocol constraints, researching missing
/// tempo values through the fallback path when one is available.
pub struct Verifier {
    researcher: Option<FallbackResearcher>,
}

impl Verifier {
    /// Verifier with a fallback research path.
    pub fn new(researcher: FallbackResearcher) -> Self {
        Self {
            researcher: Some(researcher),
        }
    }

    /// Verifier without research: missing required fields reject outright.
    pub fn without_research() -> Self {
        Self { researcher: None }
    }

    /// Verify one track against one constraint set.
    ///
    /// Infallible by contract: every degradation (failed lookup, missing
    /// field, exhausted budget) becomes a rejection with reasons, never an
    /// error. The caller's track is taken by value; enrichment happens on
    /// this owned copy and rides back in the result.
    pub async fn verify(
        &self,
        track: TrackMetadata,
        constraints: &ProtocolConstraints,
        budget: &ResearchBudget,
    ) -> VerificationResult {
        let mut track = track;
        let mut reasons: Vec<String> = Vec::new();

        // Computed for every Focus verification, attached regardless of
        // outcome.
        let distraction = (constraints.mode == Mode::Focus)
            .then(|| scorer::distraction_score(&track));

        // 1. Hard bans. Flags are authoritative; no research.
        if constraints.no_vocals && checks::has_vocals(&track) {
            return rejected(
                track,
                1.0,
                "Contains vocals - violates protocol constraint",
                RejectionCategory::Vocals,
                distraction,
            );
        }

        if constraints.avoid_live && track.is_live {
            return rejected(
                track,
                1.0,
                "Live version - violates protocol constraint",
                RejectionCategory::LiveVersion,
                distraction,
            );
        }

        if constraints.avoid_remaster && track.is_remaster {
            return rejected(
                track,
                1.0,
                "Remastered version - violates protocol constraint",
                RejectionCategory::Remaster,
                distraction,
            );
        }

        if constraints.avoid_feat && track.has_feat {
            return rejected(
                track,
                1.0,
                "Featured artists - violates protocol constraint",
                RejectionCategory::FeaturedArtist,
                distraction,
            );
        }

        // 2. Tempo, with the fallback research path for unknown values.
        if constraints.requires_tempo() {
            let bpm = match track.tempo_bpm {
                Some(bpm) => Some(bpm),
                None => {
                    let estimate = self.research_tempo(&track, budget).await;
                    if let Some(bpm) = estimate {
                        track.tempo_bpm = Some(bpm);
                        track.provenance = Provenance::FallbackResearch;
                    }
                    estimate
                }
            };

            let Some(bpm) = bpm else {
                return rejected(
                    track,
                    0.0,
                    "Could not determine BPM - insufficient confidence",
                    RejectionCategory::InsufficientConfidence,
                    distraction,
                );
            };

            match checks::check_range(bpm, constraints.tempo_min, constraints.tempo_max) {
                checks::RangeCheck::BelowMin(min) => {
                    return rejected(
                        track,
                        1.0,
                        format!("BPM {bpm} below minimum {min}"),
                        RejectionCategory::TempoOutOfRange,
                        distraction,
                    );
                }
                checks::RangeCheck::AboveMax(max) => {
                    return rejected(
                        track,
                        1.0,
                        format!("BPM {bpm} above maximum {max}"),
                        RejectionCategory::TempoOutOfRange,
                        distraction,
                    );
                }
                checks::RangeCheck::Within => {
                    reasons.push(format!("BPM {bpm} within range"));
                }
            }
        }

        // 3. Energy. No research path exists for energy, so a required but
        // unknown value rejects on insufficient confidence.
        if constraints.requires_energy() {
            let Some(energy) = track.energy else {
                return rejected(
                    track,
                    0.0,
                    "Energy unknown - insufficient confidence",
                    RejectionCategory::InsufficientConfidence,
                    distraction,
                );
            };

            match checks::check_range(energy, constraints.energy_min, constraints.energy_max) {
                checks::RangeCheck::BelowMin(min) => {
                    return rejected(
                        track,
                        1.0,
                        format!("Energy {energy} below minimum {min}"),
                        RejectionCategory::EnergyOutOfRange,
                        distraction,
                    );
                }
                checks::RangeCheck::AboveMax(max) => {
                    return rejected(
                        track,
                        1.0,
                        format!("Energy {energy} above maximum {max}"),
                        RejectionCategory::EnergyOutOfRange,
                        distraction,
                    );
                }
                checks::RangeCheck::Within => {}
            }
        }

        // 4. Distraction gate, Focus mode only.
        if let Some(score) = &distraction {
            if score.value > scorer::REJECTION_THRESHOLD {
                return rejected(
                    track,
                    DISTRACTION_REJECT_CONFIDENCE,
                    format!("Distraction score {:.2} too high", score.value),
                    RejectionCategory::DistractionThreshold,
                    distraction,
                );
            }
        }

        reasons.push("All protocol constraints satisfied".to_string());

        VerificationResult {
            track,
            approved: true,
            confidence: 1.0,
            reasons,
            category: None,
            distraction_score: distraction,
        }
    }

    async fn research_tempo(&self, track: &TrackMetadata, budget: &ResearchBudget) -> Option<f64> {
        let researcher = self.researcher.as_ref()?;

        if !budget.try_acquire() {
            tracing::warn!(
                track = %track.catalog_id,
                max_lookups = budget.max_lookups(),
                "Research budget exhausted, treating tempo as unknown"
            );
            return None;
        }

        researcher.lookup_tempo(track).await
    }
}

fn rejected(
    track: TrackMetadata,
    confidence: f64,
    reason: impl Into<String>,
    category: RejectionCategory,
    distraction_score: Option<DistractionScore>,
) -> VerificationResult {
    VerificationResult {
        track,
        approved: false,
        confidence,
        reasons: vec![reason.into()],
        category: Some(category),
        distraction_score,
    }
}
