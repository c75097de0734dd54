//! Contact enrichment pipeline
//!
//! Fetches a detailed profile document per contact, merges it into the
//! record, vectorizes the result, and tracks per-user progress while a
//! bounded number of fetches run concurrently.

pub mod fetcher;
pub mod formatter;
pub mod progress;
pub mod service;

pub use fetcher::ProfileFetcher;
pub use fetcher::ProfileSource;
pub use formatter::format_enriched;
pub use progress::ProgressRegistry;
pub use service::EnrichmentService;
