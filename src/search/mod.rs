//! Multi-attribute weighted semantic retrieval over the contact index

pub mod retriever;
pub mod suggestions;

pub use retriever::ScoreAccumulator;
pub use retriever::SemanticRetriever;
pub use suggestions::SuggestionComposer;

use serde::Deserialize;
use serde::Serialize;

/// One retrieved contact with its aggregated cross-attribute score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredContact {
    pub contact_key: String,
    pub similarity_score: f32,
    pub name: String,
    pub company: String,
    pub url: String,
}
