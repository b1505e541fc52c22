//! Places client error types.

use std::fmt;

/// Errors from a nearby-places lookup.
///
/// Messages are stored as strings so the error can be cloned and handed
/// to every caller waiting on the same cache key.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacesError {
    /// Request failed (connection refused, TLS, non-2xx status)
    Http { message: String },

    /// No response within the client timeout
    Timeout,

    /// Response body was not the expected JSON
    Json { message: String },

    /// Upstream answered with a non-success status
    Upstream { status: String, message: String },

    /// No API key configured
    NotConfigured,
}

impl PlacesError {
    /// Whether the failure lies upstream rather than in our configuration.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, PlacesError::NotConfigured)
    }
}

impl fmt::Display for PlacesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacesError::Http { message } => write!(f, "HTTP error: {message}"),
            PlacesError::Timeout => write!(f, "places request timed out"),
            PlacesError::Json { message } => write!(f, "JSON parse error: {message}"),
            PlacesError::Upstream { message, .. } => write!(f, "{message}"),
            PlacesError::NotConfigured => write!(f, "Google Maps API key not configured"),
        }
    }
}

impl std::error::Error for PlacesError {}

impl From<reqwest::Error> for PlacesError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PlacesError::Timeout
        } else if err.is_decode() {
            PlacesError::Json {
                message: err.to_string(),
            }
        } else {
            PlacesError::Http {
                message: err.to_string(),
            }
        }
    }
}
