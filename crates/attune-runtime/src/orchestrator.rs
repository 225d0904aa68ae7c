//! Playlist orchestrator: the end-to-end curation run.
//!
//! Drives the linear stages with one bounded fan-out:
//! compose constraints → gather hints → resolve candidates →
//! verify all (parallel) → filter approved → build result.
//!
//! Failure policy: anything touching a single candidate is absorbed into
//! that candidate's `VerificationResult`; only candidate resolution can
//! fail the whole run. An all-rejected run is a valid, empty result.
//!
//! Cancellation: dropping the `generate_playlist` future stops in-flight
//! verification tasks at their next await point. The result is only
//! assembled at the end of the same future, so a cancelled run can never
//! surface partial output.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use thiserror::Error;

use attune_core::{
    compose, scorer,
    types::{
        Mode, PlaylistRequest, PlaylistResult, ProtocolConstraints, RejectionCategory,
        TrackMetadata, VerificationResult, VerificationSummary,
    },
};

use crate::config::RuntimeConfig;
use crate::researcher::FallbackResearcher;
use crate::resilience::{CircuitBreaker, ResearchBudget, SourceKind};
use crate::sources::{CandidateSource, FeatureSource, HintProvider, SearchTool};
use crate::store::{MokaStore, StoreKey, VerificationStore};
use crate::verifier::Verifier;

/// Errors surfaced to callers of [`Orchestrator::generate_playlist`].
///
/// Per-candidate failures never appear here; they live inside the
/// verification summary as rejection reasons.
#[derive(Error, Debug)]
pub enum PlaylistError {
    /// The request could not be turned into constraints. The typed
    /// [`Mode`](attune_core::Mode) enum makes this unreachable from Rust
    /// callers; embedders deserializing untyped input surface their
    /// validation failures through this variant.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Candidate supply failed: {0}")]
    CandidateSupply(String),
}

/// A candidate after the lookup-and-enrich stage, awaiting verification.
enum PreparedCandidate {
    /// The store already holds a result for this (track, constraints)
    /// pair; verification is skipped.
    Cached(VerificationResult),
    /// Enriched and ready for the verifier.
    Pending { key: StoreKey, track: TrackMetadata },
}

/// The orchestrator owns one curation pipeline instance.
///
/// Collaborators are injected: the candidate supplier is mandatory, the
/// feature source, search tool, hint provider, and store are optional
/// degrees of capability. The pipeline itself holds no per-run state; a
/// fresh research budget is created for every run.
pub struct Orchestrator {
    candidates: Arc<dyn CandidateSource>,
    features: Option<Arc<dyn FeatureSource>>,
    search: Option<Arc<dyn SearchTool>>,
    hints: Option<Arc<dyn HintProvider>>,
    store: Arc<dyn VerificationStore>,
    circuit: Arc<CircuitBreaker>,
    config: RuntimeConfig,
}

impl Orchestrator {
    /// Start building an orchestrator around a candidate supplier.
    pub fn builder(candidates: Arc<dyn CandidateSource>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(candidates)
    }

    /// Run one curation request end to end.
    ///
    /// # Stages
    /// 1. Compose constraints (pure)
    /// 2. Gather taste hints from the decision-assist collaborator
    /// 3. Resolve candidates, the only fatal external call
    /// 4. Verify every candidate with bounded parallelism
    /// 5. Filter approved, preserving candidate order
    /// 6. Assemble the result and summary
    pub async fn generate_playlist(
        &self,
        request: PlaylistRequest,
    ) -> Result<PlaylistResult, PlaylistError> {
        let constraints = compose(request.mode, request.genre.as_deref());

        tracing::info!(
            mode = %request.mode,
            genre = request.genre.as_deref().unwrap_or("-"),
            target_minutes = request.target_duration_minutes(),
            "Starting curation run"
        );

        let taste_hints = self.gather_hints(&request).await;

        let candidates = self
            .candidates
            .resolve_candidates(request.mode, request.genre.as_deref(), &taste_hints)
            .await
            .map_err(|e| PlaylistError::CandidateSupply(e.to_string()))?;

        // An empty-but-successful resolution is a valid run: nothing
        // matched, nothing broke.
        let results = self.verify_all(candidates, &constraints).await;

        let summary = VerificationSummary::from_results(&results);
        let tracks: Vec<TrackMetadata> = results
            .into_iter()
            .filter(|r| r.approved)
            .map(|r| r.track)
            .collect();
        let total_duration_ms = tracks.iter().filter_map(|t| t.duration_ms).sum();

        tracing::info!(
            approved = summary.approved,
            rejected = summary.rejected,
            "Curation run complete"
        );

        Ok(PlaylistResult {
            mode: request.mode,
            tracks,
            total_duration_ms,
            verification_summary: summary,
            generated_at: Utc::now(),
        })
    }

    /// Verify all candidates with bounded parallelism.
    ///
    /// Results come back in candidate order regardless of completion
    /// order, so a fixed input yields a deterministic output. Tasks share
    /// no mutable state; each owns its candidate copy.
    ///
    /// Runs in two ordered stages so the research allowance is handed out
    /// in candidate order, not task-completion order: stage one does the
    /// store lookup and feature enrichment, then slots are assigned
    /// sequentially, then stage two runs the verifier. Pool width can
    /// never change which candidate gets researched.
    async fn verify_all(
        &self,
        candidates: Vec<TrackMetadata>,
        constraints: &ProtocolConstraints,
    ) -> Vec<VerificationResult> {
        let verifier = self.build_verifier();
        let width = self.config.verify_concurrency.max(1);

        let prepared: Vec<PreparedCandidate> = stream::iter(candidates)
            .map(|track| self.prepare_candidate(constraints, track))
            .buffered(width)
            .collect()
            .await;

        // Research slots go to the first still-tempo-less candidates in
        // list order.
        let budget = ResearchBudget::new(self.config.max_fallback_lookups);
        let jobs: Vec<(PreparedCandidate, bool)> = prepared
            .into_iter()
            .map(|candidate| {
                let allowed = match &candidate {
                    PreparedCandidate::Pending { track, .. } => {
                        constraints.requires_tempo()
                            && track.tempo_bpm.is_none()
                            && budget.try_acquire()
                    }
                    PreparedCandidate::Cached(_) => false,
                };
                (candidate, allowed)
            })
            .collect();

        stream::iter(jobs)
            .map(|(candidate, research_allowed)| {
                self.verify_candidate(&verifier, constraints, candidate, research_allowed)
            })
            .buffered(width)
            .collect()
            .await
    }

    /// Stage one for a single candidate: store lookup, then feature
    /// enrichment on a miss.
    async fn prepare_candidate(
        &self,
        constraints: &ProtocolConstraints,
        track: TrackMetadata,
    ) -> PreparedCandidate {
        let key = StoreKey::new(&track.catalog_id, constraints);
        if let Some(cached) = self.store.get(&key).await {
            tracing::debug!(track = %track.catalog_id, "Verification store hit");
            return PreparedCandidate::Cached(cached);
        }

        let mut track = track;
        self.enrich_features(&mut track).await;
        PreparedCandidate::Pending { key, track }
    }

    /// Stage two for a single candidate: the verifier pipeline and the
    /// store write-back. Cached results pass through untouched.
    async fn verify_candidate(
        &self,
        verifier: &Verifier,
        constraints: &ProtocolConstraints,
        candidate: PreparedCandidate,
        research_allowed: bool,
    ) -> VerificationResult {
        let (key, track) = match candidate {
            PreparedCandidate::Cached(result) => return result,
            PreparedCandidate::Pending { key, track } => (key, track),
        };

        let budget = ResearchBudget::new(u32::from(research_allowed));
        let timeout = self.config.verify_timeout;
        match tokio::time::timeout(timeout, verifier.verify(track.clone(), constraints, &budget))
            .await
        {
            Ok(result) => {
                tracing::debug!(
                    track = %result.track.catalog_id,
                    approved = result.approved,
                    "Verified candidate"
                );
                self.store.put(key, result.clone()).await;
                result
            }
            Err(_) => {
                tracing::warn!(
                    track = %track.catalog_id,
                    timeout = ?timeout,
                    "Verification timed out, recording as verification error"
                );
                // The Focus score guarantee holds even here: the scorer is
                // pure and the enriched track is in hand.
                let distraction = (constraints.mode == Mode::Focus)
                    .then(|| scorer::distraction_score(&track));
                VerificationResult {
                    track,
                    approved: false,
                    confidence: 0.0,
                    reasons: vec![format!("Verification error - timed out after {:?}", timeout)],
                    category: Some(RejectionCategory::VerificationError),
                    distraction_score: distraction,
                }
            }
        }
    }

    /// Fill missing metadata from the primary feature source.
    ///
    /// Failures are absorbed: the track proceeds with whatever fields it
    /// has and rejects later on insufficient confidence if a required
    /// field stayed unknown.
    async fn enrich_features(&self, track: &mut TrackMetadata) {
        let Some(features) = &self.features else {
            return;
        };

        if self.circuit.is_open(SourceKind::Features) {
            tracing::warn!(track = %track.catalog_id, "Features circuit open, skipping enrichment");
            return;
        }

        let call = features.get_features(&track.catalog_id);
        match tokio::time::timeout(self.config.features_timeout, call).await {
            Ok(Ok(record)) => {
                self.circuit.record_success(SourceKind::Features);
                track.apply_features(&record);
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    track = %track.catalog_id,
                    source = features.name(),
                    error = %e,
                    "Feature lookup failed"
                );
                self.circuit.record_failure(SourceKind::Features);
            }
            Err(_) => {
                tracing::warn!(
                    track = %track.catalog_id,
                    source = features.name(),
                    timeout = ?self.config.features_timeout,
                    "Feature lookup timed out"
                );
                self.circuit.record_failure(SourceKind::Features);
            }
        }
    }

    /// Consult the optional decision-assist collaborator for taste hints.
    ///
    /// Hints steer candidate generation only; a failing provider degrades
    /// to no hints and the run proceeds.
    async fn gather_hints(&self, request: &PlaylistRequest) -> Vec<String> {
        let Some(provider) = &self.hints else {
            return Vec::new();
        };

        let call = provider.suggest(request.mode, request.genre.as_deref());
        match tokio::time::timeout(self.config.hint_timeout, call).await {
            Ok(Ok(hints)) => hints,
            Ok(Err(e)) => {
                tracing::warn!(provider = provider.name(), error = %e, "Hint provider failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(provider = provider.name(), "Hint provider timed out");
                Vec::new()
            }
        }
    }

    fn build_verifier(&self) -> Verifier {
        match &self.search {
            Some(search) => Verifier::new(FallbackResearcher::new(
                search.clone(),
                self.circuit.clone(),
                self.config.search_timeout,
            )),
            None => Verifier::without_research(),
        }
    }
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    candidates: Arc<dyn CandidateSource>,
    features: Option<Arc<dyn FeatureSource>>,
    search: Option<Arc<dyn SearchTool>>,
    hints: Option<Arc<dyn HintProvider>>,
    store: Option<Arc<dyn VerificationStore>>,
    config: RuntimeConfig,
}

impl OrchestratorBuilder {
    /// Create a builder. The candidate supplier is the one mandatory
    /// collaborator.
    pub fn new(candidates: Arc<dyn CandidateSource>) -> Self {
        Self {
            candidates,
            features: None,
            search: None,
            hints: None,
            store: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the primary metadata source.
    pub fn features(mut self, features: Arc<dyn FeatureSource>) -> Self {
        self.features = Some(features);
        self
    }

    /// Set the text search tool used by the fallback researcher.
    pub fn search(mut self, search: Arc<dyn SearchTool>) -> Self {
        self.search = Some(search);
        self
    }

    /// Set the decision-assist hint provider.
    pub fn hints(mut self, hints: Arc<dyn HintProvider>) -> Self {
        self.hints = Some(hints);
        self
    }

    /// Set the verification store. Defaults to a moka-backed store sized
    /// by the config.
    pub fn store(mut self, store: Arc<dyn VerificationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the runtime configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Orchestrator {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MokaStore::from_config(&self.config.store)));
        let circuit = Arc::new(CircuitBreaker::new(self.config.circuit_breaker.clone()));

        Orchestrator {
            candidates: self.candidates,
            features: self.features,
            search: self.search,
            hints: self.hints,
            store,
            circuit,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    use attune_core::{Mode, PartialFeatures};

    use crate::sources::SourceError;
    use crate::store::NoopStore;

    // Mock candidate supplier: canned list or canned error, records the
    // taste hints it was handed.
    struct StaticCandidates {
        tracks: Result<Vec<TrackMetadata>, String>,
        seen_hints: Mutex<Vec<String>>,
    }

    impl StaticCandidates {
        fn ok(tracks: Vec<TrackMetadata>) -> Arc<Self> {
            Arc::new(Self {
                tracks: Ok(tracks),
                seen_hints: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                tracks: Err(message.to_string()),
                seen_hints: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CandidateSource for StaticCandidates {
        async fn resolve_candidates(
            &self,
            _mode: Mode,
            _genre: Option<&str>,
            taste_hints: &[String],
        ) -> Result<Vec<TrackMetadata>, SourceError> {
            *self.seen_hints.lock() = taste_hints.to_vec();
            match &self.tracks {
                Ok(tracks) => Ok(tracks.clone()),
                Err(message) => Err(SourceError::Unavailable(message.clone())),
            }
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    struct StaticFeatures(PartialFeatures);

    #[async_trait]
    impl FeatureSource for StaticFeatures {
        async fn get_features(&self, _catalog_id: &str) -> Result<PartialFeatures, SourceError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "static-features"
        }
    }

    struct StaticHints(Vec<String>);

    #[async_trait]
    impl HintProvider for StaticHints {
        async fn suggest(
            &self,
            _mode: Mode,
            _genre: Option<&str>,
        ) -> Result<Vec<String>, SourceError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "static-hints"
        }
    }

    struct FailingHints;

    #[async_trait]
    impl HintProvider for FailingHints {
        async fn suggest(
            &self,
            _mode: Mode,
            _genre: Option<&str>,
        ) -> Result<Vec<String>, SourceError> {
            Err(SourceError::Unavailable("assistant offline".to_string()))
        }

        fn name(&self) -> &str {
            "failing-hints"
        }
    }

    fn focus_ok_track(id: &str) -> TrackMetadata {
        let mut track = TrackMetadata::stub(id, format!("catalog:track:{id}"), id, "Artist");
        track.is_instrumental = Some(true);
        track.speechiness = Some(0.05);
        track.instrumentalness = Some(0.95);
        track.energy = Some(0.4);
        track.tempo_bpm = Some(130.0);
        track.duration_ms = Some(240_000);
        track
    }

    fn orchestrator(candidates: Arc<StaticCandidates>) -> Orchestrator {
        Orchestrator::builder(candidates)
            .store(Arc::new(NoopStore))
            .build()
    }

    #[tokio::test]
    async fn test_empty_candidate_list_is_successful_empty_result() {
        let orchestrator = orchestrator(StaticCandidates::ok(vec![]));

        let result = orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await
            .unwrap();

        assert!(result.tracks.is_empty());
        assert_eq!(result.total_duration_ms, 0);
        assert_eq!(result.verification_summary.total_candidates, 0);
    }

    #[tokio::test]
    async fn test_resolver_failure_is_fatal() {
        let orchestrator = orchestrator(StaticCandidates::failing("catalog offline"));

        let result = orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await;

        match result {
            Err(PlaylistError::CandidateSupply(message)) => {
                assert!(message.contains("catalog offline"));
            }
            other => panic!("expected CandidateSupply error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_all_rejected_run_is_success_not_error() {
        // Every candidate violates a hard ban; the run still succeeds.
        let mut live = focus_ok_track("live");
        live.is_live = true;
        let mut feat = focus_ok_track("feat");
        feat.has_feat = true;

        let orchestrator = orchestrator(StaticCandidates::ok(vec![live, feat]));
        let result = orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await
            .unwrap();

        assert!(result.tracks.is_empty());
        assert_eq!(result.verification_summary.rejected, 2);
    }

    #[tokio::test]
    async fn test_mixed_run_counts_and_histogram() {
        // 10 candidates: 3 hard-ban violations, 2 pass ranges but exceed
        // the distraction threshold, 5 approved.
        let mut candidates = Vec::new();

        let mut live = focus_ok_track("live");
        live.is_live = true;
        candidates.push(live);

        let mut remaster = focus_ok_track("remaster");
        remaster.is_remaster = true;
        candidates.push(remaster);

        let mut feat = focus_ok_track("feat");
        feat.has_feat = true;
        candidates.push(feat);

        for id in ["noisy1", "noisy2"] {
            let mut noisy = focus_ok_track(id);
            noisy.speechiness = Some(0.9);
            noisy.instrumentalness = Some(0.0);
            noisy.energy = Some(0.6);
            noisy.explicit = true;
            candidates.push(noisy);
        }

        for id in ["ok1", "ok2", "ok3", "ok4", "ok5"] {
            candidates.push(focus_ok_track(id));
        }

        let orchestrator = orchestrator(StaticCandidates::ok(candidates));
        let result = orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await
            .unwrap();

        let summary = &result.verification_summary;
        assert_eq!(result.tracks.len(), 5);
        assert_eq!(summary.total_candidates, 10);
        assert_eq!(summary.approved + summary.rejected, 10);
        assert_eq!(summary.rejections.values().sum::<usize>(), 5);
        assert_eq!(summary.rejections.get("distraction_threshold"), Some(&2));
        assert_eq!(result.total_duration_ms, 5 * 240_000);
    }

    #[tokio::test]
    async fn test_approved_order_follows_candidate_order() {
        let candidates: Vec<TrackMetadata> =
            (0..20).map(|i| focus_ok_track(&format!("t{i:02}"))).collect();
        let expected: Vec<String> = candidates.iter().map(|t| t.catalog_id.clone()).collect();

        let orchestrator = orchestrator(StaticCandidates::ok(candidates));
        let result = orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await
            .unwrap();

        let got: Vec<String> = result.tracks.iter().map(|t| t.catalog_id.clone()).collect();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn test_pool_width_does_not_change_results() {
        let mut candidates: Vec<TrackMetadata> =
            (0..12).map(|i| focus_ok_track(&format!("t{i:02}"))).collect();
        candidates[3].is_live = true;
        candidates[7].tempo_bpm = Some(90.0);

        let mut results = Vec::new();
        for width in [1usize, 8] {
            let config = RuntimeConfig {
                verify_concurrency: width,
                ..RuntimeConfig::default()
            };
            let orchestrator = Orchestrator::builder(StaticCandidates::ok(candidates.clone()))
                .store(Arc::new(NoopStore))
                .config(config)
                .build();

            let result = orchestrator
                .generate_playlist(PlaylistRequest::new(Mode::Focus))
                .await
                .unwrap();
            results.push((result.tracks, result.verification_summary));
        }

        assert_eq!(results[0], results[1]);
    }

    #[tokio::test]
    async fn test_feature_enrichment_fills_stub_candidates() {
        // Stub candidates carry no acoustic data; the feature source
        // supplies everything needed for approval.
        let candidates = vec![TrackMetadata::stub("t1", "uri1", "Awake", "Tycho")];
        let features = PartialFeatures {
            tempo_bpm: Some(130.0),
            energy: Some(0.4),
            speechiness: Some(0.05),
            instrumentalness: Some(0.95),
            is_instrumental: Some(true),
            ..PartialFeatures::default()
        };

        let orchestrator = Orchestrator::builder(StaticCandidates::ok(candidates))
            .features(Arc::new(StaticFeatures(features)))
            .store(Arc::new(NoopStore))
            .build();

        let result = orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await
            .unwrap();

        assert_eq!(result.tracks.len(), 1);
        assert_eq!(result.tracks[0].tempo_bpm, Some(130.0));
    }

    #[tokio::test]
    async fn test_without_features_stub_candidates_reject_not_error() {
        let candidates = vec![TrackMetadata::stub("t1", "uri1", "Awake", "Tycho")];

        let orchestrator = orchestrator(StaticCandidates::ok(candidates));
        let result = orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await
            .unwrap();

        assert!(result.tracks.is_empty());
        assert_eq!(result.verification_summary.rejected, 1);
    }

    #[tokio::test]
    async fn test_hints_are_passed_to_candidate_source() {
        let candidates = StaticCandidates::ok(vec![]);
        let orchestrator = Orchestrator::builder(candidates.clone())
            .hints(Arc::new(StaticHints(vec!["berlin techno".to_string()])))
            .store(Arc::new(NoopStore))
            .build();

        orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await
            .unwrap();

        assert_eq!(candidates.seen_hints.lock().as_slice(), ["berlin techno"]);
    }

    #[tokio::test]
    async fn test_failing_hint_provider_degrades_to_no_hints() {
        let candidates = StaticCandidates::ok(vec![focus_ok_track("t1")]);
        let orchestrator = Orchestrator::builder(candidates.clone())
            .hints(Arc::new(FailingHints))
            .store(Arc::new(NoopStore))
            .build();

        let result = orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await
            .unwrap();

        assert_eq!(result.tracks.len(), 1);
        assert!(candidates.seen_hints.lock().is_empty());
    }

    #[tokio::test]
    async fn test_store_serves_repeat_verifications() {
        let track = focus_ok_track("t1");
        let candidates = StaticCandidates::ok(vec![track]);
        let store = Arc::new(MokaStore::default());

        let orchestrator = Orchestrator::builder(candidates)
            .store(store.clone())
            .build();

        let first = orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await
            .unwrap();
        // The second run hits the store; the cached result must match.
        let second = orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await
            .unwrap();

        assert_eq!(first.tracks, second.tracks);
        assert_eq!(first.verification_summary, second.verification_summary);
    }

    #[tokio::test]
    async fn test_genre_flows_into_constraints_and_result() {
        let orchestrator = orchestrator(StaticCandidates::ok(vec![]));

        let request = PlaylistRequest::new(Mode::Relax).with_genre("Lo-Fi");
        let result = orchestrator.generate_playlist(request).await.unwrap();

        assert_eq!(result.mode, Mode::Relax);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_verification_recorded_as_verification_error() {
        struct HangingSearch;

        #[async_trait]
        impl SearchTool for HangingSearch {
            async fn search(&self, _query: &str) -> Result<String, SourceError> {
                tokio::time::sleep(Duration::from_secs(7200)).await;
                Ok(String::new())
            }

            fn name(&self) -> &str {
                "hanging"
            }
        }

        // Unknown tempo forces the researcher onto the hanging search;
        // the per-candidate ceiling converts the hang into a recorded
        // verification error. search_timeout is set above verify_timeout
        // so the outer ceiling is the one that fires.
        let mut track = focus_ok_track("t1");
        track.tempo_bpm = None;

        let config = RuntimeConfig {
            verify_timeout: Duration::from_secs(1),
            search_timeout: Duration::from_secs(3600),
            ..RuntimeConfig::default()
        };

        let orchestrator = Orchestrator::builder(StaticCandidates::ok(vec![track.clone()]))
            .search(Arc::new(HangingSearch))
            .store(Arc::new(NoopStore))
            .config(config)
            .build();

        let result = orchestrator
            .generate_playlist(PlaylistRequest::new(Mode::Focus))
            .await
            .unwrap();

        assert!(result.tracks.is_empty());
        assert_eq!(
            result.verification_summary.rejections.get("verification_error"),
            Some(&1)
        );

        // The timed-out result still honors the Focus score guarantee.
        let results = orchestrator
            .verify_all(vec![track], &compose(Mode::Focus, None))
            .await;
        assert_eq!(
            results[0].category,
            Some(RejectionCategory::VerificationError)
        );
        assert!(results[0].distraction_score.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_research_slots_assigned_in_candidate_order() {
        // Feature lookups finish out of order, but the single research
        // slot must still go to the first tempo-less candidate at every
        // pool width.
        struct SkewedFeatures;

        #[async_trait]
        impl FeatureSource for SkewedFeatures {
            async fn get_features(
                &self,
                catalog_id: &str,
            ) -> Result<PartialFeatures, SourceError> {
                let delay = if catalog_id == "slow" { 300 } else { 10 };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(PartialFeatures::default())
            }

            fn name(&self) -> &str {
                "skewed"
            }
        }

        struct FixedBpmSearch;

        #[async_trait]
        impl SearchTool for FixedBpmSearch {
            async fn search(&self, _query: &str) -> Result<String, SourceError> {
                Ok("130 BPM".to_string())
            }

            fn name(&self) -> &str {
                "fixed"
            }
        }

        let mut slow = focus_ok_track("slow");
        slow.tempo_bpm = None;
        let mut fast = focus_ok_track("fast");
        fast.tempo_bpm = None;

        for width in [1usize, 8] {
            let config = RuntimeConfig {
                verify_concurrency: width,
                max_fallback_lookups: 1,
                ..RuntimeConfig::default()
            };

            let orchestrator =
                Orchestrator::builder(StaticCandidates::ok(vec![slow.clone(), fast.clone()]))
                    .features(Arc::new(SkewedFeatures))
                    .search(Arc::new(FixedBpmSearch))
                    .store(Arc::new(NoopStore))
                    .config(config)
                    .build();

            let result = orchestrator
                .generate_playlist(PlaylistRequest::new(Mode::Focus))
                .await
                .unwrap();

            let approved: Vec<&str> =
                result.tracks.iter().map(|t| t.catalog_id.as_str()).collect();
            assert_eq!(approved, ["slow"], "pool width {width}");
            assert_eq!(
                result
                    .verification_summary
                    .rejections
                    .get("insufficient_confidence"),
                Some(&1),
                "pool width {width}"
            );
        }
    }
}
