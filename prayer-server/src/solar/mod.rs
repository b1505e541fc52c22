//! Astronomical prayer-time computation.
//!
//! [`solve`] turns a date, a location and method parameters into a
//! [`DailySchedule`](crate::schedule::DailySchedule). It is pure and
//! deterministic; high-latitude fallbacks are reported in the schedule's
//! [`Resolution`] rather than raised as errors.

mod error;
mod position;
mod solver;

pub use error::SolveError;
pub use position::{SolarCoordinates, asr_altitude, hour_angle, julian_day, solar_coordinates};
pub use solver::{Resolution, TimeSource, solve};
