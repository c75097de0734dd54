//! Profile data source adapter

use futures::future::BoxFuture;
use reqwest::Client;
use tracing::error;
use tracing::info;

use crate::errors::ConnRagError;
use crate::models::RawProfile;
use crate::models::PROFILE_URL_PREFIX;
use crate::Result;

/// Anything that resolves a contact URL to a raw profile document.
///
/// The enrichment orchestrator runs against this seam; failure is always
/// modeled as "no data", never as an error.
pub trait ProfileSource: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Option<RawProfile>>;
}

impl ProfileSource for ProfileFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Option<RawProfile>> {
        Box::pin(self.fetch(url))
    }
}

/// Fetches raw profile documents from the external enrichment data source.
///
/// Enrichment failure is modeled as "no data": network errors, timeouts and
/// non-success statuses all yield `None` and never propagate. One attempt
/// per profile, no retry.
pub struct ProfileFetcher {
    client: Client,
    endpoint: String,
    host: String,
    api_key: String,
}

impl ProfileFetcher {
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let endpoint = config.fetch_endpoint().trim_end_matches('/').to_string();

        let host = url::Url::parse(&endpoint)
            .map_err(|e| ConnRagError::Config(format!("Invalid fetch endpoint: {e}")))?
            .host_str()
            .ok_or_else(|| {
                ConnRagError::Config("Fetch endpoint has no host".to_string())
            })?
            .to_string();

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.fetch_timeout_secs()))
            .build()
            .map_err(|e| ConnRagError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            host,
            api_key: config.fetch_api_key().to_string(),
        })
    }

    /// Fetch the detailed profile document for one contact URL.
    ///
    /// URLs without the expected profile shape are rejected without any
    /// network I/O.
    pub async fn fetch(&self, url: &str) -> Option<RawProfile> {
        if !url.starts_with(PROFILE_URL_PREFIX) {
            return None;
        }

        let request_url = format!("{}/get-profile-data-by-url", self.endpoint);
        let response = self
            .client
            .get(&request_url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .query(&[("url", url)])
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                match response.json::<RawProfile>().await {
                    Ok(profile) => Some(profile),
                    Err(e) => {
                        error!("Malformed profile response for {}: {}", url, e);
                        None
                    }
                }
            }
            Ok(response) => {
                info!("Profile API error for {}: {}", url, response.status());
                None
            }
            Err(e) => {
                error!("Error enriching profile {}: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> ProfileFetcher {
        let mut config = crate::config::AppConfig::default();
        config.enrichment.fetch_api_key = "test-key".to_string();
        ProfileFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_wrong_url_shape_skips_network() {
        // These return before any network I/O, so they complete instantly.
        assert!(fetcher().fetch("https://example.com/in/someone").await.is_none());
        assert!(fetcher().fetch("").await.is_none());
    }

    #[test]
    fn test_host_derived_from_endpoint() {
        let fetcher = fetcher();
        assert_eq!(fetcher.host, "li-data-scraper.p.rapidapi.com");
    }
}
