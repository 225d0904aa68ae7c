//! Fallback researcher: best-effort textual lookup for missing metadata.
//!
//! When the primary feature source leaves tempo unknown, the researcher
//! runs a text search for `"{name} {artist} BPM tempo"` and extracts a
//! numeric estimate from the result text. Its contract is absorb-all:
//! timeouts, transport errors, open circuits, and unparseable text all
//! return "no estimate", never an error, so the verifier treats every
//! failure identically to an absent field.

use std::sync::Arc;
use std::time::Duration;

use attune_core::{tempo, TrackMetadata};

use crate::resilience::{CircuitBreaker, SourceKind};
use crate::sources::SearchTool;

/// Best-effort tempo lookup over a text search tool.
pub struct FallbackResearcher {
    search: Arc<dyn SearchTool>,
    circuit: Arc<CircuitBreaker>,
    timeout: Duration,
}

impl FallbackResearcher {
    pub fn new(search: Arc<dyn SearchTool>, circuit: Arc<CircuitBreaker>, timeout: Duration) -> Self {
        Self {
            search,
            circuit,
            timeout,
        }
    }

    /// Look up a tempo estimate for a track.
    ///
    /// Returns `None` on any failure; the caller decides what "unknown"
    /// means for its constraints.
    pub async fn lookup_tempo(&self, track: &TrackMetadata) -> Option<f64> {
        if self.circuit.is_open(SourceKind::Search) {
            tracing::warn!(
                track = %track.catalog_id,
                "Search circuit open, skipping tempo research"
            );
            return None;
        }

        let query = format!("{} {} BPM tempo", track.name, track.artist);

        let result = tokio::time::timeout(self.timeout, self.search.search(&query)).await;

        let text = match result {
            Ok(Ok(text)) => {
                self.circuit.record_success(SourceKind::Search);
                text
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    track = %track.catalog_id,
                    tool = self.search.name(),
                    error = %e,
                    "Tempo research failed"
                );
                self.circuit.record_failure(SourceKind::Search);
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    track = %track.catalog_id,
                    tool = self.search.name(),
                    timeout = ?self.timeout,
                    "Tempo research timed out"
                );
                self.circuit.record_failure(SourceKind::Search);
                return None;
            }
        };

        let bpm = tempo::extract_bpm(&text);
        if bpm.is_none() {
            tracing::debug!(
                track = %track.catalog_id,
                "Search succeeded but no valid BPM found in result text"
            );
        }
        bpm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::sources::SourceError;

    struct CannedSearch(Result<&'static str, ()>);

    #[async_trait]
    impl SearchTool for CannedSearch {
        async fn search(&self, _query: &str) -> Result<String, SourceError> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(SourceError::Unavailable("down".to_string())),
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    struct HangingSearch;

    #[async_trait]
    impl SearchTool for HangingSearch {
        async fn search(&self, _query: &str) -> Result<String, SourceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        fn name(&self) -> &str {
            "hanging"
        }
    }

    fn researcher(search: Arc<dyn SearchTool>) -> FallbackResearcher {
        FallbackResearcher::new(search, Arc::new(CircuitBreaker::default()), Duration::from_millis(100))
    }

    fn track() -> TrackMetadata {
        TrackMetadata::stub("id1", "uri1", "Sandstorm", "Darude")
    }

    #[tokio::test]
    async fn test_extracts_bpm_from_result_text() {
        let r = researcher(Arc::new(CannedSearch(Ok("Sandstorm by Darude is 136 BPM"))));
        assert_eq!(r.lookup_tempo(&track()).await, Some(136.0));
    }

    #[tokio::test]
    async fn test_unparseable_text_is_no_estimate() {
        let r = researcher(Arc::new(CannedSearch(Ok("a club anthem from 1999"))));
        assert_eq!(r.lookup_tempo(&track()).await, None);
    }

    #[tokio::test]
    async fn test_search_failure_is_no_estimate() {
        let r = researcher(Arc::new(CannedSearch(Err(()))));
        assert_eq!(r.lookup_tempo(&track()).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_no_estimate() {
        let r = researcher(Arc::new(HangingSearch));
        assert_eq!(r.lookup_tempo(&track()).await, None);
    }

    #[tokio::test]
    async fn test_recovered_circuit_resumes_research() {
        use crate::resilience::{CircuitBreakerConfig, CircuitState};

        let circuit = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::ZERO,
            success_threshold: 1,
        }));
        circuit.record_failure(SourceKind::Search);

        let r = FallbackResearcher::new(
            Arc::new(CannedSearch(Ok("136 BPM"))),
            circuit.clone(),
            Duration::from_millis(100),
        );

        // The recovery window has elapsed, so this lookup is the trial
        // call; its success closes the circuit again.
        assert_eq!(r.lookup_tempo(&track()).await, Some(136.0));
        assert!(matches!(
            circuit.state(SourceKind::Search),
            CircuitState::Closed { .. }
        ));
    }

    #[tokio::test]
    async fn test_open_circuit_skips_search() {
        let circuit = Arc::new(CircuitBreaker::default());
        for _ in 0..3 {
            circuit.record_failure(SourceKind::Search);
        }

        let r = FallbackResearcher::new(
            Arc::new(CannedSearch(Ok("136 BPM"))),
            circuit,
            Duration::from_millis(100),
        );
        // Search would succeed, but the open circuit short-circuits it.
        assert_eq!(r.lookup_tempo(&track()).await, None);
    }
}
