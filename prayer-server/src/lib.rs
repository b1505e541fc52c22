//! Prayer times server.
//!
//! Computes the five daily prayers plus sunrise for any point on Earth,
//! the great-circle bearing towards the Kaaba, and proxies nearby-mosque
//! searches through a short-lived cache.

pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod places;
pub mod qibla;
pub mod schedule;
pub mod solar;
pub mod web;
