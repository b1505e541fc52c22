//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::{debug, error};

use crate::domain::{
    CalculationMethod, Coordinate, InvalidCoordinate, InvalidOffset, Location,
    offset_from_minutes, solar_zone_offset,
};
use crate::places::{MAX_RADIUS_M, NearbyResponse, PlacesError, PlacesQuery};
use crate::qibla::qibla;
use crate::schedule::current_and_next;
use crate::solar::{SolveError, solve};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/prayer/methods", get(methods))
        .route("/api/prayer/times", post(prayer_times))
        .route("/api/prayer/qibla", post(qibla_direction))
        .route("/api/places/nearby", get(nearby_places))
        .fallback(not_found)
        .with_state(state)
}

/// Service description.
async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Prayer times, qibla and nearby mosques API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: Endpoints {
            health: "/health",
            prayer_times: "/api/prayer/times",
            prayer_methods: "/api/prayer/methods",
            qibla: "/api/prayer/qibla",
            nearby_places: "/api/places/nearby",
        },
    })
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Server is running",
        timestamp: iso_timestamp(state.clock.now()),
    })
}

/// List the available calculation methods.
async fn methods() -> Json<MethodsResponse> {
    Json(MethodsResponse::all())
}

/// Compute a day's prayer times and the current/next prayer.
async fn prayer_times(
    State(state): State<AppState>,
    body: Result<Json<PrayerTimesRequest>, JsonRejection>,
) -> Result<Json<PrayerTimesResponse>, AppError> {
    let Json(req) = body?;
    let coordinate = require_coordinate(req.latitude, req.longitude)?;

    let offset = match req.utc_offset_minutes {
        Some(minutes) => offset_from_minutes(minutes)?,
        None => solar_zone_offset(coordinate.longitude()),
    };

    let mut location = Location::new(coordinate).with_utc_offset(offset);
    if let Some(elevation) = req.elevation_m {
        location = location.with_elevation(elevation);
    }

    let method = req
        .method
        .as_deref()
        .map(CalculationMethod::from_key_or_default)
        .unwrap_or_default();
    let mut params = method.params();
    if let Some(madhab) = req.madhab {
        params = params.with_madhab(madhab);
    }
    if let Some(rule) = req.high_latitude_rule {
        params = params.with_high_latitude_rule(rule);
    }

    let now = state.clock.now();
    let date = match req.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_date(raw, offset)?,
        None => now.with_timezone(&offset).date_naive(),
    };

    let schedule = solve(date, &location, &params)?;
    let prayer_state = current_and_next(&schedule, now)?;
    debug!(%coordinate, %date, %method, current = %prayer_state, "computed prayer times");

    Ok(Json(PrayerTimesResponse::new(&schedule, &prayer_state, now)))
}

/// Compute the qibla bearing from the given location.
async fn qibla_direction(
    State(state): State<AppState>,
    body: Result<Json<QiblaRequest>, JsonRejection>,
) -> Result<Json<QiblaResponse>, AppError> {
    let Json(req) = body?;
    let coordinate = require_coordinate(req.latitude, req.longitude)?;
    let direction = qibla(&coordinate);

    Ok(Json(QiblaResponse::new(
        coordinate,
        &direction,
        state.clock.now(),
    )))
}

/// Search for mosques (or another place type) near a point.
async fn nearby_places(
    State(state): State<AppState>,
    query: Result<Query<NearbyPlacesRequest>, QueryRejection>,
) -> Result<Json<NearbyResponse>, AppError> {
    let Query(req) = query?;

    let (Some(lat), Some(lng)) = (req.lat, req.lng) else {
        return Err(AppError::BadRequest {
            error: "Location required".to_string(),
            message: "lat and lng are required".to_string(),
        });
    };
    let mut places_query = PlacesQuery::new(Coordinate::new(lat, lng)?);

    if let Some(radius) = req.radius {
        if radius == 0 || radius > MAX_RADIUS_M {
            return Err(AppError::BadRequest {
                error: "Invalid radius".to_string(),
                message: format!("radius must be between 1 and {MAX_RADIUS_M} metres"),
            });
        }
        places_query = places_query.with_radius(radius);
    }
    if let Some(place_type) = req.place_type.filter(|t| !t.trim().is_empty()) {
        places_query = places_query.with_place_type(place_type.trim());
    }
    if let Some(token) = req.page_token.filter(|t| !t.is_empty()) {
        places_query = places_query.with_page_token(token);
    }

    let response = state.places.search(&places_query).await?;
    Ok(Json(NearbyResponse::clone(&response)))
}

/// Fallback for unmatched routes.
async fn not_found(method: Method, uri: Uri) -> AppError {
    let path = uri
        .path_and_query()
        .map_or(uri.path(), |pq| pq.as_str());
    AppError::NotFound {
        message: format!("Cannot {method} {path}"),
    }
}

fn require_coordinate(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Coordinate, AppError> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => Ok(Coordinate::new(lat, lng)?),
        _ => Err(AppError::BadRequest {
            error: "Location required".to_string(),
            message: "Please provide latitude and longitude".to_string(),
        }),
    }
}

/// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp read in the location's offset.
fn parse_date(raw: &str, offset: FixedOffset) -> Result<NaiveDate, AppError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&offset).date_naive())
        .map_err(|_| AppError::BadRequest {
            error: "Invalid date".to_string(),
            message: format!("expected YYYY-MM-DD or an RFC 3339 timestamp, got {raw:?}"),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { error: String, message: String },
    NotFound { message: String },
    Configuration { message: String },
    Upstream { message: String },
    Internal { message: String },
}

impl From<InvalidCoordinate> for AppError {
    fn from(e: InvalidCoordinate) -> Self {
        AppError::BadRequest {
            error: format!("Invalid {}", e.field()),
            message: e.to_string(),
        }
    }
}

impl From<InvalidOffset> for AppError {
    fn from(e: InvalidOffset) -> Self {
        AppError::BadRequest {
            error: "Invalid UTC offset".to_string(),
            message: e.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest {
            error: "Invalid request body".to_string(),
            message: e.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::BadRequest {
            error: "Invalid query".to_string(),
            message: e.body_text(),
        }
    }
}

impl From<SolveError> for AppError {
    fn from(e: SolveError) -> Self {
        match e {
            SolveError::InvalidCoordinate(e) => e.into(),
            SolveError::InvalidElevation(_) => AppError::BadRequest {
                error: "Invalid elevation".to_string(),
                message: e.to_string(),
            },
            SolveError::DateOutOfRange(_) => AppError::BadRequest {
                error: "Invalid date".to_string(),
                message: e.to_string(),
            },
            SolveError::Unresolvable { .. } | SolveError::Unordered { .. } => {
                AppError::Internal {
                    message: e.to_string(),
                }
            }
        }
    }
}

impl From<PlacesError> for AppError {
    fn from(e: PlacesError) -> Self {
        if e.is_upstream() {
            AppError::Upstream {
                message: e.to_string(),
            }
        } else {
            AppError::Configuration {
                message: e.to_string(),
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, message) = match self {
            AppError::BadRequest { error, message } => (StatusCode::BAD_REQUEST, error, message),
            AppError::NotFound { message } => {
                (StatusCode::NOT_FOUND, "Route not found".to_string(), message)
            }
            AppError::Configuration { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                message,
            ),
            AppError::Upstream { message } => (
                StatusCode::BAD_GATEWAY,
                "Upstream unavailable".to_string(),
                message,
            ),
            AppError::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                message,
            ),
        };

        if status.is_server_error() {
            error!(%status, %error, %message, "request failed");
        } else {
            debug!(%status, %error, %message, "request rejected");
        }

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}
