//! Great-circle direction and distance to the Kaaba.

use serde::Serialize;
use tracing::debug;

use crate::domain::Coordinate;

/// The Kaaba, Mecca.
pub const MECCA_LATITUDE: f64 = 21.4225;
pub const MECCA_LONGITUDE: f64 = 39.8262;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Below this both atan2 components are treated as zero.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Direction to Mecca from an observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QiblaDirection {
    /// Degrees clockwise from true north, in [0, 360).
    pub bearing: f64,
    pub distance_km: f64,
    /// At the Kaaba or its antipode every direction is equally valid; the
    /// bearing is then reported as 0.
    pub degenerate: bool,
}

impl QiblaDirection {
    /// Bearing rounded for display, e.g. "118.9°".
    pub fn formatted(&self) -> String {
        format_bearing(self.bearing)
    }
}

/// Qibla bearing and distance for a validated coordinate.
///
/// # Examples
///
/// ```
/// use prayer_server::domain::Coordinate;
/// use prayer_server::qibla::qibla;
///
/// let london = Coordinate::new(51.5074, -0.1278).unwrap();
/// let direction = qibla(&london);
/// assert!((118.0..=119.5).contains(&direction.bearing));
/// assert!(!direction.degenerate);
/// ```
pub fn qibla(coordinate: &Coordinate) -> QiblaDirection {
    let (bearing, degenerate) = initial_bearing(coordinate.latitude(), coordinate.longitude());
    if degenerate {
        debug!(%coordinate, "qibla direction is degenerate");
    }

    QiblaDirection {
        bearing,
        distance_km: distance_km(coordinate),
        degenerate,
    }
}

/// Qibla bearing in degrees, in [0, 360).
pub fn bearing(coordinate: &Coordinate) -> f64 {
    bearing_degrees(coordinate.latitude(), coordinate.longitude())
}

/// Qibla bearing for raw degrees. Longitude may lie outside ±180; inputs are
/// not validated, so callers outside this module go through [`Coordinate`].
fn bearing_degrees(latitude: f64, longitude: f64) -> f64 {
    initial_bearing(latitude, longitude).0
}

fn initial_bearing(latitude: f64, longitude: f64) -> (f64, bool) {
    let phi1 = latitude.to_radians();
    let phi2 = MECCA_LATITUDE.to_radians();
    let delta_lambda = (MECCA_LONGITUDE - longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    if x.abs() < DEGENERATE_EPSILON && y.abs() < DEGENERATE_EPSILON {
        return (0.0, true);
    }

    let degrees = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    let degrees = if degrees >= 360.0 { 0.0 } else { degrees };
    (degrees, false)
}

/// Haversine distance to the Kaaba.
fn distance_km(coordinate: &Coordinate) -> f64 {
    let phi1 = coordinate.latitude().to_radians();
    let phi2 = MECCA_LATITUDE.to_radians();
    let d_phi = phi2 - phi1;
    let d_lambda = (MECCA_LONGITUDE - coordinate.longitude()).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Format a bearing to one decimal place with a degree sign.
pub fn format_bearing(bearing: f64) -> String {
    format!("{bearing:.1}°")
}
