//! Geographic coordinate and observer location types.

use std::fmt;

use chrono::{FixedOffset, Offset, Utc};

/// Error returned when a latitude or longitude is unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct InvalidCoordinate {
    field: &'static str,
    reason: &'static str,
}

impl InvalidCoordinate {
    /// Which component was rejected ("latitude" or "longitude").
    pub fn field(&self) -> &'static str {
        self.field
    }
}

/// Error returned when a UTC offset cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid UTC offset: {minutes} minutes (must be within ±14 hours)")]
pub struct InvalidOffset {
    minutes: i32,
}

/// A point on the Earth's surface in decimal degrees.
///
/// Latitude is in [-90, 90] and longitude in [-180, 180]. NaN and infinite
/// values are rejected, so any `Coordinate` is safe to feed into the solar
/// and great-circle math.
///
/// # Examples
///
/// ```
/// use prayer_server::domain::Coordinate;
///
/// let london = Coordinate::new(51.5074, -0.1278).unwrap();
/// assert_eq!(london.latitude(), 51.5074);
///
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// assert!(Coordinate::new(0.0, f64::NAN).is_err());
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Validate and construct a coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        check_range("latitude", latitude, 90.0, "must be between -90 and 90")?;
        check_range("longitude", longitude, 180.0, "must be between -180 and 180")?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees, positive north.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees, positive east.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// The same point with a different latitude, used by the polar fallback.
    pub(crate) fn with_latitude(self, latitude: f64) -> Result<Self, InvalidCoordinate> {
        Self::new(latitude, self.longitude)
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    limit: f64,
    range_reason: &'static str,
) -> Result<(), InvalidCoordinate> {
    if !value.is_finite() {
        return Err(InvalidCoordinate {
            field,
            reason: "must be a finite number",
        });
    }
    if value < -limit || value > limit {
        return Err(InvalidCoordinate {
            field,
            reason: range_reason,
        });
    }
    Ok(())
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate({}, {})", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Where prayer times are computed for: a coordinate plus the civil time
/// offset used for the output and the observer's elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    coordinate: Coordinate,
    utc_offset: FixedOffset,
    elevation_m: f64,
}

impl Location {
    /// A sea-level location using the mean-solar zone of its longitude.
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            utc_offset: solar_zone_offset(coordinate.longitude()),
            elevation_m: 0.0,
        }
    }

    /// Use an explicit UTC offset instead of the longitude-derived one.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Set the observer's elevation above sea level.
    pub fn with_elevation(mut self, elevation_m: f64) -> Self {
        self.elevation_m = elevation_m;
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    pub fn elevation_m(&self) -> f64 {
        self.elevation_m
    }
}

/// Parse a UTC offset given in minutes east of Greenwich.
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, InvalidOffset> {
    if minutes.abs() > 14 * 60 {
        return Err(InvalidOffset { minutes });
    }
    FixedOffset::east_opt(minutes * 60).ok_or(InvalidOffset { minutes })
}

/// The whole-hour zone whose central meridian is nearest the longitude.
pub fn solar_zone_offset(longitude: f64) -> FixedOffset {
    let hours = (longitude / 15.0).round().clamp(-12.0, 12.0) as i32;
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}
