//! Prayer times server binary.
//!
//! # Environment Variables
//!
//! - `HOST`, `PORT`: bind address (default `127.0.0.1:5000`)
//! - `GOOGLE_MAPS_API_KEY`: enables `/api/places/nearby`
//! - `FRONTEND_URL`: allowed CORS origin (default `http://localhost:5173`)
//! - `PLACES_CACHE_TTL_SECS`: places cache TTL (default 30)
//! - `RUST_LOG`: log filter (default `prayer_server=info,tower_http=info`)

use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use prayer_server::cache::{NearbyPlacesCache, PlacesCacheConfig};
use prayer_server::clock::SystemClock;
use prayer_server::config::ServerConfig;
use prayer_server::places::{GooglePlacesClient, PlacesClientConfig};
use prayer_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("prayer_server=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    if config.google_maps_api_key.is_none() {
        warn!("GOOGLE_MAPS_API_KEY not set; nearby places lookups will fail");
    }

    let client = GooglePlacesClient::new(PlacesClientConfig::new(
        config.google_maps_api_key.clone(),
    ))?;
    let places = NearbyPlacesCache::new(
        Arc::new(client),
        Arc::new(SystemClock),
        PlacesCacheConfig::default().with_ttl(config.places_cache_ttl),
    );
    let state = AppState::new(places, Arc::new(SystemClock));

    let cors = CorsLayer::new()
        .allow_origin(config.frontend_url.parse::<HeaderValue>()?)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.bind_addr();
    info!(%addr, frontend = %config.frontend_url, "prayer server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
