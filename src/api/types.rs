//! API request and response types

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::MissionAttributes;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Upload outcome summary returned before background work finishes
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub count: usize,
    pub total_in_cache: usize,
    pub total_enriched: usize,
    pub needs_vectorization: usize,
    pub new_connections_found: usize,
    pub enrichment_started: bool,
    pub vectorization_started: bool,
    pub filename: String,
}

/// Mission-driven suggestion request
#[derive(Debug, Deserialize)]
pub struct MissionRequest {
    pub mission: String,
}

/// Suggestion response, carrying the extracted attributes alongside the
/// oracle output (a structured array or a raw string in degraded mode)
#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub mission: String,
    pub mission_attributes: MissionAttributes,
    pub suggestions: Value,
    pub semantic_matches_found: usize,
    pub total_connections: usize,
    pub enriched_connections: usize,
    pub user_id: Uuid,
}

/// Outreach message request
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub name: String,
    pub company: String,
    pub role: String,
    pub mission: String,
    #[serde(default)]
    pub profile_summary: String,
    #[serde(default)]
    pub location: String,
}

/// Outreach message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub recipient: String,
    pub company: String,
}
