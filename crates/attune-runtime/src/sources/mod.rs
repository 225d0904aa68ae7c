//! External collaborator abstractions.
//!
//! The pipeline consumes four external services, each behind a trait so
//! tests and deployments can swap implementations freely:
//!
//! - [`CandidateSource`] supplies identity-locked track stubs
//! - [`FeatureSource`] returns best-effort structured metadata per track
//! - [`SearchTool`] runs raw text lookups for the fallback researcher
//! - [`HintProvider`] offers optional decision-assistance suggestions
//!
//! ## Failure contract
//!
//! Source failures never cross `generate_playlist`: a failing
//! [`CandidateSource`] fails the run, everything else degrades to
//! "unknown" and surfaces only as reason strings on individual
//! verification results.

use std::time::Duration;

use async_trait::async_trait;
use attune_core::{Mode, PartialFeatures, TrackMetadata};
use thiserror::Error;

pub mod secrets;

#[cfg(feature = "http-search")]
mod http;

pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "http-search")]
pub use http::HttpSearchTool;

/// Errors from external sources.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Source not configured: {0}")]
    NotConfigured(String),
}

/// Supplies candidate track stubs for a session.
///
/// # Identity lock
/// Returned stubs must carry disambiguated, final catalog identifiers.
/// The pipeline never re-resolves or substitutes an identity after this
/// call.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Resolve candidate tracks for a mode, optionally steered by a genre
    /// preference and taste hints from the decision-assist collaborator.
    async fn resolve_candidates(
        &self,
        mode: Mode,
        genre: Option<&str>,
        taste_hints: &[String],
    ) -> Result<Vec<TrackMetadata>, SourceError>;

    /// Source name for logs.
    fn name(&self) -> &str;
}

/// Primary structured-metadata source.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Fetch best-effort features for one track.
    ///
    /// Any field may be absent; absence is distinguishable from a
    /// false/zero value (all fields on [`PartialFeatures`] are optional).
    async fn get_features(&self, catalog_id: &str) -> Result<PartialFeatures, SourceError>;

    /// Source name for logs.
    fn name(&self) -> &str;
}

/// Raw text search, used only by the fallback researcher.
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Run a text query and return the raw result text.
    async fn search(&self, query: &str) -> Result<String, SourceError>;

    /// Tool name for logs.
    fn name(&self) -> &str;
}

/// Optional decision-assistance collaborator.
///
/// Consulted for candidate-generation hints only. Suggestions steer the
/// candidate supplier; they carry no authority to approve or reject a
/// track, and a failing provider degrades to "no hints".
#[async_trait]
pub trait HintProvider: Send + Sync {
    /// Suggest taste hints (artists, subgenres, seed descriptions) for a
    /// session.
    async fn suggest(&self, mode: Mode, genre: Option<&str>) -> Result<Vec<String>, SourceError>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}
