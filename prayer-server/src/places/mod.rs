//! Nearby places (mosques) lookup against Google Places Nearby Search.
//!
//! Key characteristics of the upstream:
//! - A `next_page_token` only becomes valid a couple of seconds after it is
//!   issued; using it earlier yields `INVALID_REQUEST`
//! - `ZERO_RESULTS` is a successful, empty answer
//! - Errors arrive as a 200 response with a non-OK `status` and an optional
//!   `error_message`

mod client;
mod error;
pub mod mock;
mod types;

use futures::future::BoxFuture;

pub use client::{GooglePlacesClient, PlacesClientConfig};
pub use error::PlacesError;
pub use mock::MockPlacesProvider;
pub use types::{
    DEFAULT_PLACE_TYPE, DEFAULT_RADIUS_M, Geometry, LatLng, MAX_RADIUS_M, NearbyResponse,
    PlaceResult, PlacesQuery, PlacesStatus, UpstreamRequest, UpstreamResponse,
};

/// Source of raw Nearby Search responses.
///
/// Implemented by the HTTP client and by [`MockPlacesProvider`], so the
/// cache can be exercised without network access.
pub trait PlacesProvider: Send + Sync {
    fn nearby<'a>(
        &'a self,
        request: &'a UpstreamRequest,
    ) -> BoxFuture<'a, Result<UpstreamResponse, PlacesError>>;
}
