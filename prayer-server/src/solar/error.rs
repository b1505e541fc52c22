//! Solver error types.

use crate::domain::{InvalidCoordinate, Prayer};

/// Errors from computing a daily schedule.
///
/// High-latitude cases are not errors: the fallback policies resolve them
/// and report what they did in the schedule's `Resolution`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    /// Coordinate outside the valid range
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),

    /// Elevation is not finite or not a plausible height on Earth
    #[error("invalid elevation: {0}")]
    InvalidElevation(f64),

    /// Date is at the edge of the representable calendar
    #[error("date out of range: {0}")]
    DateOutOfRange(chrono::NaiveDate),

    /// No latitude between the observer and the equator gave a usable day
    #[error("sun position could not be resolved at latitude {latitude}")]
    Unresolvable { latitude: f64 },

    /// Computed events are not strictly increasing
    #[error("{later} is not after {earlier}")]
    Unordered { earlier: Prayer, later: Prayer },
}
