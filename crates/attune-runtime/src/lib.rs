//! # attune-runtime
//!
//! Async curation pipeline around the deterministic `attune-core` engine.
//!
//! This crate owns every concern that leaves the process:
//! - collaborator traits for candidate supply, feature lookup, text
//!   search, and taste hints,
//! - the orchestrator that runs a curation request end to end with
//!   bounded parallel verification,
//! - fallback tempo research over a text search backend,
//! - circuit breaking, per-run research budgets, and the verification
//!   store.
//!
//! ## Architecture
//!
//! ```text
//! PlaylistRequest
//!     │
//!     ▼
//! Orchestrator ──► CandidateSource (fatal on error)
//!     │
//!     ├─► FeatureSource (absorbed on error)
//!     │
//!     ▼
//! Verifier ×N (bounded fan-out, order preserved)
//!     │
//!     ├─► FallbackResearcher ──► SearchTool (budgeted, circuit-broken)
//!     │
//!     ▼
//! PlaylistResult
//! ```
//!
//! Candidate-level failures are absorbed into rejection reasons; only
//! candidate resolution can fail a run.

pub mod config;
pub mod orchestrator;
pub mod researcher;
pub mod resilience;
pub mod sources;
pub mod store;
pub mod verifier;

pub use config::{RuntimeConfig, StoreConfig};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, PlaylistError};
pub use researcher::FallbackResearcher;
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, ResearchBudget, SourceKind,
};
pub use sources::{CandidateSource, FeatureSource, HintProvider, SearchTool, SourceError};
pub use store::{MokaStore, NoopStore, StoreKey, VerificationStore};
pub use verifier::Verifier;
