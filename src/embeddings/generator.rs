//! Embedding generation service with batching

use std::sync::Arc;

use super::client::EmbeddingClient;
use super::EmbeddingConfig;
use super::MAX_BATCH_SIZE;
use crate::errors::Result;
use crate::models::NOT_AVAILABLE;

/// Service for generating embeddings on top of a provider client.
///
/// Empty or whitespace-only texts never reach the API; they embed as the
/// "N/A" sentinel so every attribute of every contact has a vector.
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service from the application config
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        Self::from_config(EmbeddingConfig::from_app_config(config))
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model.clone(),
            config.endpoint.clone(),
            config.api_key.clone(),
        )?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Generate embedding for a single text
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        let text = normalize(text);
        self.client.generate(&text).await
    }

    /// Generate embeddings for multiple texts in one or more batched calls
    pub async fn generate_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let normalized: Vec<String> = texts.iter().map(|t| normalize(t)).collect();

        let mut embeddings = Vec::with_capacity(normalized.len());
        for chunk in normalized.chunks(MAX_BATCH_SIZE) {
            let chunk_embeddings = self
                .client
                .generate_batch(chunk.iter().map(String::as_str).collect())
                .await?;
            embeddings.extend(chunk_embeddings);
        }

        Ok(embeddings)
    }

    /// Get the embedding dimension
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Get the model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

fn normalize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        // Newlines degrade embedding quality on some providers.
        trimmed.replace('\n', " ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_empty_falls_back_to_sentinel() {
        assert_eq!(normalize(""), NOT_AVAILABLE);
        assert_eq!(normalize("   "), NOT_AVAILABLE);
    }

    #[test]
    fn test_normalize_flattens_newlines() {
        assert_eq!(normalize("a\nb"), "a b");
        assert_eq!(normalize("  hello  "), "hello");
    }
}
