//! Google Places Nearby Search HTTP client.

use futures::future::BoxFuture;
use tracing::debug;

use super::PlacesProvider;
use super::error::PlacesError;
use super::types::{UpstreamRequest, UpstreamResponse};

/// Default Nearby Search endpoint.
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Configuration for the places client.
#[derive(Debug, Clone)]
pub struct PlacesClientConfig {
    /// API key; without one every lookup fails with `NotConfigured`
    pub api_key: Option<String>,
    /// Endpoint URL (defaults to production Google)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl PlacesClientConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Nearby Search client.
#[derive(Debug, Clone)]
pub struct GooglePlacesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GooglePlacesClient {
    pub fn new(config: PlacesClientConfig) -> Result<Self, PlacesError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            api_key: config.api_key,
        })
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Perform one Nearby Search call. The upstream status is not
    /// interpreted here.
    pub async fn nearby_search(
        &self,
        request: &UpstreamRequest,
    ) -> Result<UpstreamResponse, PlacesError> {
        let key = self.api_key.as_deref().ok_or(PlacesError::NotConfigured)?;

        debug!(page = request.is_page(), "calling places nearby search");
        let response = self
            .http
            .get(&self.base_url)
            .query(&query_params(request, key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(200)
                .collect();
            return Err(PlacesError::Http {
                message: format!("status {}: {body}", status.as_u16()),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| PlacesError::Json {
            message: e.to_string(),
        })
    }
}

impl PlacesProvider for GooglePlacesClient {
    fn nearby<'a>(
        &'a self,
        request: &'a UpstreamRequest,
    ) -> BoxFuture<'a, Result<UpstreamResponse, PlacesError>> {
        Box::pin(self.nearby_search(request))
    }
}

/// Query string for a request. A page token is sent on its own.
fn query_params(request: &UpstreamRequest, key: &str) -> Vec<(&'static str, String)> {
    let mut params = match request {
        UpstreamRequest::Page { token } => vec![("pagetoken", token.clone())],
        UpstreamRequest::Location {
            coordinate,
            radius_m,
            place_type,
        } => vec![
            (
                "location",
                format!("{},{}", coordinate.latitude(), coordinate.longitude()),
            ),
            ("radius", radius_m.to_string()),
            ("type", place_type.clone()),
        ],
    };
    params.push(("key", key.to_string()));
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinate;

    #[test]
    fn location_params() {
        let request = UpstreamRequest::Location {
            coordinate: Coordinate::new(51.5074, -0.1278).unwrap(),
            radius_m: 5000,
            place_type: "mosque".into(),
        };
        assert_eq!(
            query_params(&request, "k"),
            vec![
                ("location", "51.5074,-0.1278".to_string()),
                ("radius", "5000".to_string()),
                ("type", "mosque".to_string()),
                ("key", "k".to_string()),
            ]
        );
    }

    #[test]
    fn page_params() {
        let request = UpstreamRequest::Page {
            token: "AelY_Cu".into(),
        };
        assert_eq!(
            query_params(&request, "k"),
            vec![
                ("pagetoken", "AelY_Cu".to_string()),
                ("key", "k".to_string()),
            ]
        );
    }

    #[test]
    fn config_defaults() {
        let config = PlacesClientConfig::new(Some("key".into()));
        assert_eq!(config.timeout_secs, 10);
        assert!(config.base_url.starts_with("https://maps.googleapis.com/"));

        let config = PlacesClientConfig::new(Some(String::new()));
        assert_eq!(config.api_key, None);
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let client = GooglePlacesClient::new(
            PlacesClientConfig::new(None).with_base_url("http://127.0.0.1:9"),
        )
        .unwrap();
        assert!(!client.is_configured());

        let request = UpstreamRequest::Page {
            token: "abc".into(),
        };
        assert_eq!(
            client.nearby_search(&request).await.unwrap_err(),
            PlacesError::NotConfigured
        );
    }
}
