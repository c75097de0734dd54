//! Bearer-token verification against the external auth service

use axum::http::HeaderMap;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ConnRagError;
use crate::Result;

/// Authenticated caller identity attached to every protected request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Verifies bearer tokens by asking the auth service who they belong to.
///
/// Every failure mode (missing header, bad token, unreachable service)
/// maps to the same auth error so callers uniformly answer 401.
pub struct AuthService {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl AuthService {
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ConnRagError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.auth_endpoint().trim_end_matches('/').to_string(),
            api_key: config.auth_key().to_string(),
        })
    }

    /// Authenticate a request from its headers.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser> {
        let token = bearer_token(headers)
            .ok_or_else(|| ConnRagError::Auth("Missing bearer token".to_string()))?;
        self.verify_token(token).await
    }

    /// Resolve a token to a user via the auth service.
    pub async fn verify_token(&self, token: &str) -> Result<AuthUser> {
        #[derive(Deserialize)]
        struct UserResponse {
            id: Uuid,
            #[serde(default)]
            email: String,
        }

        let url = format!("{}/auth/v1/user", self.endpoint);
        debug!("Verifying token against {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|_| ConnRagError::Auth("Invalid or expired token".to_string()))?;

        if !response.status().is_success() {
            return Err(ConnRagError::Auth("Invalid or expired token".to_string()));
        }

        let user: UserResponse = response
            .json()
            .await
            .map_err(|_| ConnRagError::Auth("Invalid or expired token".to_string()))?;

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
