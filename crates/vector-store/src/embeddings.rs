//! Embedding backend selection and the remote dense provider.
//!
//! The store picks exactly one backend at construction time: dense when a
//! provider credential is configured, lexical otherwise. A dense failure
//! during an index rebuild downgrades the store to lexical for the rest of
//! its lifetime; the dense path is never retried.

use crate::error::{Result, StoreError};
use crate::lexical::LexicalProvider;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// The active embedding variant. Transitions dense → lexical at most once,
/// never back.
pub enum EmbeddingBackend {
    Dense(DenseProvider),
    Lexical(LexicalProvider),
}

impl EmbeddingBackend {
    /// Select a backend from the environment: dense when `OPENAI_API_KEY`
    /// is set, lexical otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        match DenseProvider::from_env() {
            Some(provider) => {
                log::info!("Using dense embedding backend (model {})", provider.model());
                Self::Dense(provider)
            }
            None => {
                log::info!("No embedding credential found, using lexical backend");
                Self::Lexical(LexicalProvider::new())
            }
        }
    }

    /// Short identifier for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Dense(_) => "dense",
            Self::Lexical(_) => "lexical",
        }
    }
}

/// Remote dense-embedding provider for OpenAI-compatible `/embeddings`
/// endpoints.
pub struct DenseProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl DenseProvider {
    /// Create a provider for an explicit endpoint and credential
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Build from the environment.
    ///
    /// Returns `None` when `OPENAI_API_KEY` is absent or empty; callers must
    /// not invoke the dense path in that case. `OPENAI_BASE_URL` and
    /// `KB_EMBEDDING_MODEL` override the endpoint and model.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())?;
        let base_url = std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("KB_EMBEDDING_MODEL")
            .ok()
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Some(Self::new(api_key, base_url, model))
    }

    /// The model this provider embeds with
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed a batch of texts, one fixed-dimension vector per text, in
    /// input order.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.api_key.is_empty() {
            return Err(StoreError::BackendUnavailable);
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| StoreError::embedding(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::embedding(format!(
                "provider returned {status}: {body}"
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| StoreError::embedding(err.to_string()))?;

        if parsed.data.len() != texts.len() {
            return Err(StoreError::embedding(format!(
                "provider returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        // The provider tags each vector with its input index; order by it
        // rather than trusting response order.
        parsed.data.sort_unstable_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }

    /// Embed a single query text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| StoreError::embedding("provider returned no vector for query"))
    }
}

/// Cosine similarity between two dense vectors, in [-1, 1]. Zero vectors
/// score 0.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
