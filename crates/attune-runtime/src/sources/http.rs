//! HTTP search tool backed by a JSON metasearch endpoint.
//!
//! Speaks the SearxNG-style `GET /search?q=...&format=json` protocol,
//! which self-hosted metasearch instances expose. The fallback researcher
//! only needs raw text, so the response's result titles and snippets are
//! concatenated into one blob for BPM extraction.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{ApiCredential, CredentialSource, SearchTool, SourceError};

/// Environment variable for the optional search endpoint API key.
pub const SEARCH_API_KEY_ENV: &str = "ATTUNE_SEARCH_API_KEY";

/// Search tool that queries a JSON metasearch endpoint.
pub struct HttpSearchTool {
    base_url: String,
    credential: Option<ApiCredential>,
}

impl std::fmt::Debug for HttpSearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSearchTool")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .finish()
    }
}

impl HttpSearchTool {
    /// Create a tool for an unauthenticated endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credential: None,
        }
    }

    /// Attach an API key (stored securely, never logged).
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.credential = Some(ApiCredential::new(
            api_key,
            CredentialSource::Programmatic,
            "search API key",
        ));
        self
    }

    /// Read the API key from `ATTUNE_SEARCH_API_KEY` if present.
    pub fn with_env_api_key(mut self) -> Self {
        self.credential = ApiCredential::from_env(SEARCH_API_KEY_ENV, "search API key").ok();
        self
    }

    fn client() -> &'static reqwest::Client {
        static CLIENT: std::sync::OnceLock<reqwest::Client> = std::sync::OnceLock::new();
        CLIENT.get_or_init(|| {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default()
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

#[async_trait]
impl SearchTool for HttpSearchTool {
    async fn search(&self, query: &str) -> Result<String, SourceError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        let mut request = Self::client()
            .get(&url)
            .query(&[("q", query), ("format", "json")]);

        if let Some(credential) = &self.credential {
            request = request.header("authorization", format!("Bearer {}", credential.expose()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "search endpoint returned {}",
                status
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let mut text = String::new();
        for result in parsed.results {
            text.push_str(&result.title);
            text.push('\n');
            text.push_str(&result.content);
            text.push('\n');
        }

        Ok(text)
    }

    fn name(&self) -> &str {
        "http-search"
    }
}
