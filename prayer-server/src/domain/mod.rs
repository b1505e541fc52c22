//! Domain types for the prayer-time service.
//!
//! Coordinates, locations and method parameters are validated at
//! construction time, so the solver and the qibla math can trust them.

mod coordinate;
mod method;
mod prayer;

pub use coordinate::{
    Coordinate, InvalidCoordinate, InvalidOffset, Location, offset_from_minutes,
    solar_zone_offset,
};
pub use method::{CalculationMethod, HighLatitudeRule, IshaRule, Madhab, MethodParams};
pub use prayer::Prayer;
