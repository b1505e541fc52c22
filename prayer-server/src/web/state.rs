//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::NearbyPlacesCache;
use crate::clock::Clock;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Cached nearby-places lookups
    pub places: Arc<NearbyPlacesCache>,

    /// Source of "now" for schedules and response timestamps
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(places: NearbyPlacesCache, clock: Arc<dyn Clock>) -> Self {
        Self {
            places: Arc::new(places),
            clock,
        }
    }
}
