//! Server configuration from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Error from reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("{name} is invalid: {reason} (got {value:?})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Runtime configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Places API key; `None` disables the places endpoint
    pub google_maps_api_key: Option<String>,
    /// Origin allowed by CORS
    pub frontend_url: String,
    pub places_cache_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            google_maps_api_key: None,
            frontend_url: "http://localhost:5173".to_string(),
            places_cache_ttl: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `HOST` (default `127.0.0.1`): bind address
    /// - `PORT` (default `5000`): bind port
    /// - `GOOGLE_MAPS_API_KEY` (optional): places credential
    /// - `FRONTEND_URL` (default `http://localhost:5173`): allowed CORS origin
    /// - `PLACES_CACHE_TTL_SECS` (default `30`): places cache TTL
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let host = match get("HOST") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "HOST",
                value,
                reason: "must be an IP address",
            })?,
            None => defaults.host,
        };

        let port = match get("PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
                reason: "must be a port number",
            })?,
            None => defaults.port,
        };

        let places_cache_ttl = match get("PLACES_CACHE_TTL_SECS") {
            Some(value) => value
                .trim()
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "PLACES_CACHE_TTL_SECS",
                    value,
                    reason: "must be a whole number of seconds",
                })?,
            None => defaults.places_cache_ttl,
        };

        Ok(Self {
            host,
            port,
            google_maps_api_key: get("GOOGLE_MAPS_API_KEY"),
            frontend_url: get("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            places_cache_ttl,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
