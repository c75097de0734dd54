//! Contact ingestion, enrichment, vectorization and mission-driven
//! semantic retrieval.
//!
//! The pipeline: uploaded connection exports are merged into a per-user
//! contact cache, enriched from an external profile data source, embedded
//! into four per-attribute vector collections, and retrieved by weighted
//! cross-attribute similarity against a free-text mission.

pub mod api;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod enrichment;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod search;
pub mod upload;

pub use config::AppConfig;
pub use errors::ConnRagError;
pub use errors::Result;
