//! API request handlers

use std::sync::Arc;

use axum::extract::Multipart;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::Json;
use tracing::error;
use tracing::info;

use crate::api::auth::AuthService;
use crate::api::auth::AuthUser;
use crate::api::types::*;
use crate::database::Database;
use crate::embeddings::EmbeddingIndex;
use crate::enrichment::EnrichmentService;
use crate::enrichment::ProgressRegistry;
use crate::errors::ConnRagError;
use crate::llm::prompts;
use crate::llm::LlmService;
use crate::models::EnrichmentProgress;
use crate::search::SemanticRetriever;
use crate::search::SuggestionComposer;
use crate::upload;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<Database>,
    pub index: Arc<EmbeddingIndex>,
    pub llm_service: Arc<LlmService>,
    pub enrichment: Arc<EnrichmentService>,
    pub progress: Arc<ProgressRegistry>,
    pub retriever: Arc<SemanticRetriever>,
    pub suggestions: Arc<SuggestionComposer>,
    pub auth: Arc<AuthService>,
}

type HandlerError = (StatusCode, String);

fn internal(e: impl std::fmt::Display) -> HandlerError {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn bad_request(message: impl Into<String>) -> HandlerError {
    (StatusCode::BAD_REQUEST, message.into())
}

async fn authenticate(auth: &AuthService, headers: &HeaderMap) -> Result<AuthUser, HandlerError> {
    auth.authenticate(headers)
        .await
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Current enrichment progress for the calling user
pub async fn enrichment_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<EnrichmentProgress>>, HandlerError> {
    let user = authenticate(&state.auth, &headers).await?;
    Ok(Json(ApiResponse::success(state.progress.get(user.user_id))))
}

/// Accept a connections CSV, merge it into the user's cache, and schedule
/// background enrichment and vectorization catch-up
pub async fn upload_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, HandlerError> {
    let user = authenticate(&state.auth, &headers).await?;
    let user_id = user.user_id;

    let (filename, content) = read_csv_part(&mut multipart).await?;
    info!("POST /api/upload-csv: {} for user {}", filename, user_id);

    let connections = match upload::parse_connections_csv(&content) {
        Ok(connections) => connections,
        Err(ConnRagError::Validation(message)) => return Err(bad_request(message)),
        Err(e) => return Err(internal(e)),
    };

    let mut cache = state.database.load_contacts(user_id).await.map_err(internal)?;

    let to_enrich = upload::identify_unenriched(&cache, &connections);
    info!(
        "Found {} new connections to enrich out of {} total connections",
        to_enrich.len(),
        connections.len()
    );

    upload::merge_basic(&mut cache, &connections);
    state
        .database
        .save_contacts(user_id, &cache)
        .await
        .map_err(internal)?;

    let total_enriched = cache.values().filter(|c| c.enriched).count();
    let unvectorized = state.index.get_unvectorized(user_id, &cache).await;
    info!(
        "Vectorization status: {} enriched, {} need vectorization",
        total_enriched,
        unvectorized.len()
    );

    let new_connections_found = to_enrich.len();
    let needs_vectorization = unvectorized.len();

    let enrichment_started = !to_enrich.is_empty();
    if enrichment_started {
        let enrichment = state.enrichment.clone();
        tokio::spawn(async move {
            if let Err(e) = enrichment.run(to_enrich, user_id).await {
                error!("Background enrichment failed for user {}: {}", user_id, e);
            }
        });
    }

    let vectorization_started = !unvectorized.is_empty();
    if vectorization_started {
        let enrichment = state.enrichment.clone();
        tokio::spawn(async move {
            enrichment.vectorization_catchup(unvectorized, user_id).await;
        });
    }

    Ok(Json(ApiResponse::success(UploadResponse {
        message: format!("Successfully processed {} connections", connections.len()),
        count: connections.len(),
        total_in_cache: cache.len(),
        total_enriched,
        needs_vectorization,
        new_connections_found,
        enrichment_started,
        vectorization_started,
        filename,
    })))
}

/// Rank the user's contacts against a mission and ask the oracle for
/// structured suggestions
pub async fn get_suggestions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<MissionRequest>,
) -> Result<Json<ApiResponse<SuggestionsResponse>>, HandlerError> {
    let user = authenticate(&state.auth, &headers).await?;
    let user_id = user.user_id;
    info!("POST /api/get-suggestions for user {}", user_id);

    let cache = state.database.load_contacts(user_id).await.map_err(internal)?;
    if cache.is_empty() {
        return Err(bad_request(
            "No connections found. Please upload a CSV file first.",
        ));
    }

    let attributes = state.retriever.extract_mission_attributes(&request.mission).await;
    info!("Extracted mission attributes: {:?}", attributes);

    let top = state
        .retriever
        .search(user_id, &attributes)
        .await
        .map_err(internal)?;
    if top.is_empty() {
        return Err(bad_request(
            "No relevant connections found for your mission.",
        ));
    }

    // Full records for the retrieved keys, in retrieval order.
    let matched: Vec<_> = top
        .iter()
        .filter_map(|scored| cache.get(&scored.url))
        .cloned()
        .collect();

    let suggestions = state
        .suggestions
        .compose(&request.mission, &matched)
        .await
        .map_err(internal)?;

    let enriched_connections = cache.values().filter(|c| c.enriched).count();

    Ok(Json(ApiResponse::success(SuggestionsResponse {
        mission: request.mission,
        mission_attributes: attributes,
        suggestions,
        semantic_matches_found: top.len(),
        total_connections: cache.len(),
        enriched_connections,
        user_id,
    })))
}

/// Generate a personalized reconnection message for one contact
pub async fn generate_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<MessageRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, HandlerError> {
    authenticate(&state.auth, &headers).await?;
    info!("POST /api/generate-message for {}", request.name);

    let prompt = prompts::outreach_message_prompt(
        &request.name,
        &request.company,
        &request.role,
        &request.mission,
        &request.profile_summary,
        &request.location,
    );

    let message = state
        .llm_service
        .chat(&prompt, 500, 0.7)
        .await
        .map_err(|e| {
            error!("Error generating message: {}", e);
            internal(e)
        })?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message,
        recipient: request.name,
        company: request.company,
    })))
}

/// Pull the uploaded CSV out of the multipart body as UTF-8 text.
async fn read_csv_part(multipart: &mut Multipart) -> Result<(String, String), HandlerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.csv").to_string();
        if !filename.ends_with(".csv") {
            return Err(bad_request("File must be a CSV"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("Failed to read upload: {e}")))?;
        let content = String::from_utf8(bytes.to_vec())
            .map_err(|_| bad_request("CSV must be UTF-8 encoded"))?;

        return Ok((filename, content));
    }

    Err(bad_request("Missing file field in upload"))
}
