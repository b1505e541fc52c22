//! Web layer for the prayer times server.
//!
//! JSON endpoints for prayer times, calculation methods, the qibla bearing
//! and nearby mosques.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
