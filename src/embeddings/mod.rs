//! Embedding generation and the per-attribute vector index
//!
//! Every enriched contact is embedded four times, once per semantic
//! attribute, into four independent collections. A contact counts as
//! vectorized only when all four collections hold an entry for it.

pub mod client;
pub mod generator;
pub mod index;

pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use generator::EmbeddingService;
pub use index::EmbeddingIndex;

/// Maximum batch size for a single embedding API call
pub const MAX_BATCH_SIZE: usize = 100;

/// The four semantic attributes each contact is indexed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactAttribute {
    Summary,
    Position,
    Location,
    Industry,
}

impl ContactAttribute {
    pub const ALL: [Self; 4] = [Self::Summary, Self::Position, Self::Location, Self::Industry];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Position => "position",
            Self::Location => "location",
            Self::Industry => "industry",
        }
    }
}

impl std::fmt::Display for ContactAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl EmbeddingConfig {
    #[must_use]
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        // An API key (or an OpenAI-looking endpoint) selects OpenAI,
        // anything else is assumed to be a local Ollama endpoint.
        let provider = if config.embeddings.api_key.is_some()
            || config.embeddings.endpoint.contains("api.openai.com")
        {
            EmbeddingProvider::OpenAI
        } else {
            EmbeddingProvider::Ollama
        };

        Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.embeddings.endpoint.clone(),
            api_key: config.embeddings.api_key.clone(),
        }
    }
}
