//! Environment-based runtime configuration.
//!
//! ## Environment variables
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `GANTRY_ADDR` | `0.0.0.0:8080` | Listener bind address |
//! | `GANTRY_STATIC_ROOT` | `static` | Root directory for the static fallback |
//! | `GANTRY_STATIC_INDEX` | `/index.html` | File served for `/` |
//! | `GANTRY_READ_TIMEOUT_SECS` | `30` | Per-connection socket read deadline |
//! | `GANTRY_WRITE_TIMEOUT_SECS` | `30` | Per-connection socket write deadline |
//!
//! Signing secrets are separate (`GANTRY_JWT_SECRET`, read by
//! [`crate::security::JwtConfig::from_env`]); they must be present before
//! the first auth decorator runs.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Transport and static-fallback configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub static_root: PathBuf,
    pub static_index: String,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            static_root: PathBuf::from("static"),
            static_index: "/index.html".to_string(),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeout = |name: &str, default: Duration| {
            env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };
        Self {
            addr: env::var("GANTRY_ADDR").unwrap_or(defaults.addr),
            static_root: env::var("GANTRY_STATIC_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_root),
            static_index: env::var("GANTRY_STATIC_INDEX").unwrap_or(defaults.static_index),
            read_timeout: timeout("GANTRY_READ_TIMEOUT_SECS", defaults.read_timeout),
            write_timeout: timeout("GANTRY_WRITE_TIMEOUT_SECS", defaults.write_timeout),
        }
    }
}
