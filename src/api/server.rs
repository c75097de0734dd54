//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::auth::AuthService;
use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::EmbeddingIndex;
use crate::embeddings::EmbeddingService;
use crate::enrichment::EnrichmentService;
use crate::enrichment::ProfileFetcher;
use crate::enrichment::ProgressRegistry;
use crate::llm::LlmService;
use crate::search::SemanticRetriever;
use crate::search::SuggestionComposer;
use crate::Result;

/// Start the API server
pub async fn serve_api(config: &AppConfig, host: String, port: u16, enable_cors: bool) -> Result<()> {
    info!("Starting contact retrieval API server...");

    // Initialize services
    let database = Arc::new(Database::from_config(config).await?);
    database.init_schema().await?;

    let embedding_service = Arc::new(EmbeddingService::new(config)?);
    let index = Arc::new(EmbeddingIndex::new(
        database.clone(),
        embedding_service.clone(),
    ));
    let llm_service = Arc::new(LlmService::new(config)?);
    let fetcher = Arc::new(ProfileFetcher::new(config)?);
    let progress = Arc::new(ProgressRegistry::new());
    let enrichment = Arc::new(EnrichmentService::new(
        config,
        database.clone(),
        index.clone(),
        fetcher,
        progress.clone(),
    ));
    let retriever = Arc::new(SemanticRetriever::new(
        database.clone(),
        embedding_service.clone(),
        llm_service.clone(),
        config.search.clone(),
    ));
    let suggestions = Arc::new(SuggestionComposer::new(llm_service.clone()));
    let auth = Arc::new(AuthService::new(config)?);

    let state = AppState {
        database,
        index,
        llm_service,
        enrichment,
        progress,
        retriever,
        suggestions,
        auth,
    };

    let api_router = routes::api_routes(state);

    let mut app = Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /api/health               - Health check");
    info!("  GET  /api/enrichment-progress  - Enrichment progress");
    info!("  POST /api/upload-csv           - Upload connections CSV");
    info!("  POST /api/get-suggestions      - Mission-driven suggestions");
    info!("  POST /api/generate-message     - Outreach message generation");

    axum::serve(listener, app).await?;

    Ok(())
}
