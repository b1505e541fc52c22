//! Places Nearby Search request and response types.
//!
//! Upstream records carry many more fields than we forward; only the ones
//! declared here survive deserialization. Optional fields are omitted from
//! our own JSON when the upstream left them out.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Coordinate;

use super::error::PlacesError;

/// Search radius used when the caller gives none, in metres.
pub const DEFAULT_RADIUS_M: u32 = 5000;

/// Largest radius the upstream accepts, in metres.
pub const MAX_RADIUS_M: u32 = 50_000;

/// Place type used when the caller gives none.
pub const DEFAULT_PLACE_TYPE: &str = "mosque";

/// A nearby-places lookup as seen by the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacesQuery {
    pub coordinate: Coordinate,
    pub radius_m: u32,
    pub place_type: String,
    /// Opaque continuation token from a previous page.
    pub page_token: Option<String>,
}

impl PlacesQuery {
    /// Mosques within the default radius.
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            radius_m: DEFAULT_RADIUS_M,
            place_type: DEFAULT_PLACE_TYPE.to_string(),
            page_token: None,
        }
    }

    pub fn with_radius(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_place_type(mut self, place_type: impl Into<String>) -> Self {
        self.place_type = place_type.into();
        self
    }

    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    /// The request sent upstream: a token alone replaces the location search.
    pub fn upstream_request(&self) -> UpstreamRequest {
        match &self.page_token {
            Some(token) => UpstreamRequest::Page {
                token: token.clone(),
            },
            None => UpstreamRequest::Location {
                coordinate: self.coordinate,
                radius_m: self.radius_m,
                place_type: self.place_type.clone(),
            },
        }
    }
}

/// One call to the Nearby Search endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamRequest {
    Location {
        coordinate: Coordinate,
        radius_m: u32,
        place_type: String,
    },
    Page {
        token: String,
    },
}

impl UpstreamRequest {
    pub fn is_page(&self) -> bool {
        matches!(self, UpstreamRequest::Page { .. })
    }
}

/// Status field of a Nearby Search response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlacesStatus {
    Ok,
    ZeroResults,
    /// Also returned when a page token is used before it becomes valid.
    InvalidRequest,
    OverQueryLimit,
    RequestDenied,
    UnknownError,
    /// A status this client does not know, kept verbatim.
    Unrecognized(String),
}

impl From<String> for PlacesStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "OK" => PlacesStatus::Ok,
            "ZERO_RESULTS" => PlacesStatus::ZeroResults,
            "INVALID_REQUEST" => PlacesStatus::InvalidRequest,
            "OVER_QUERY_LIMIT" => PlacesStatus::OverQueryLimit,
            "REQUEST_DENIED" => PlacesStatus::RequestDenied,
            "UNKNOWN_ERROR" => PlacesStatus::UnknownError,
            _ => PlacesStatus::Unrecognized(raw),
        }
    }
}

impl From<PlacesStatus> for String {
    fn from(status: PlacesStatus) -> Self {
        match status {
            PlacesStatus::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl PlacesStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PlacesStatus::Ok => "OK",
            PlacesStatus::ZeroResults => "ZERO_RESULTS",
            PlacesStatus::InvalidRequest => "INVALID_REQUEST",
            PlacesStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            PlacesStatus::RequestDenied => "REQUEST_DENIED",
            PlacesStatus::UnknownError => "UNKNOWN_ERROR",
            PlacesStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PlacesStatus::Ok | PlacesStatus::ZeroResults)
    }
}

impl fmt::Display for PlacesStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

/// A place, narrowed to the fields we forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vicinity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
}

/// Raw Nearby Search response body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpstreamResponse {
    /// A missing status is read as success.
    #[serde(default)]
    pub status: Option<PlacesStatus>,
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl UpstreamResponse {
    /// Map the upstream status onto success or [`PlacesError::Upstream`].
    ///
    /// `OK` and `ZERO_RESULTS` both succeed; the latter with no results.
    pub fn into_nearby(self) -> Result<NearbyResponse, PlacesError> {
        let status = self.status.unwrap_or(PlacesStatus::Ok);
        if !status.is_success() {
            return Err(PlacesError::Upstream {
                status: status.as_str().to_string(),
                message: self
                    .error_message
                    .unwrap_or_else(|| status.as_str().to_string()),
            });
        }

        Ok(NearbyResponse {
            status,
            results: self.results,
            next_page_token: self.next_page_token,
        })
    }
}

/// What the cache stores and the HTTP layer returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyResponse {
    pub status: PlacesStatus,
    pub results: Vec<PlaceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}
