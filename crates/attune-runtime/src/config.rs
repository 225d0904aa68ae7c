//! Runtime configuration.
//!
//! Everything the orchestrator treats as a tunable lives here: fan-out
//! width, per-call timeouts, the fallback-research budget, and the
//! circuit-breaker and store settings. Durations (de)serialize as
//! humantime strings ("10s", "500ms") so config files stay readable.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::CircuitBreakerConfig;

/// Serde adapter for humantime duration strings.
pub(crate) mod human_duration {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        humantime::format_duration(*duration)
            .to_string()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Configuration for the verification runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum concurrent verification tasks in the fan-out stage.
    pub verify_concurrency: usize,

    /// Ceiling on one candidate's entire verification, including any
    /// fallback research it triggers.
    #[serde(with = "human_duration")]
    pub verify_timeout: Duration,

    /// Timeout for one text-search call by the fallback researcher.
    #[serde(with = "human_duration")]
    pub search_timeout: Duration,

    /// Timeout for one feature-source call during enrichment.
    #[serde(with = "human_duration")]
    pub features_timeout: Duration,

    /// Timeout for one decision-assist hint call.
    #[serde(with = "human_duration")]
    pub hint_timeout: Duration,

    /// Fallback research lookups allowed per run.
    pub max_fallback_lookups: u32,

    /// Circuit breaker settings for external sources.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Verification store settings.
    pub store: StoreConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            verify_concurrency: 4,
            verify_timeout: Duration::from_secs(30),
            search_timeout: Duration::from_secs(10),
            features_timeout: Duration::from_secs(10),
            hint_timeout: Duration::from_secs(5),
            max_fallback_lookups: 16,
            circuit_breaker: CircuitBreakerConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Settings for the moka-backed verification store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum cached verification results.
    pub max_entries: u64,

    /// Time-to-live for cached results.
    #[serde(with = "human_duration")]
    pub ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}
