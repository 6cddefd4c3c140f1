// src/config.rs
//! Runtime configuration.
//!
//! Values are layered: built-in defaults first, then environment variables
//! prefixed with `DID_AUTH_`. A `.env` file, if present, is loaded into the
//! environment by `main` before this runs.
//!
//! ## Environment Variables
//! - `DID_AUTH_HOST`: interface to bind (default `0.0.0.0`)
//! - `DID_AUTH_PORT`: port to bind (default `8100`)
//! - `DID_AUTH_CHALLENGE_NONCE`: prefix of every challenge (default `challenge`)
//! - `DID_AUTH_BODY_LIMIT`: maximum request body in bytes (default 64 KiB)

use crate::services::challenge::DEFAULT_CHALLENGE_NONCE;
use config::{Config, ConfigError, Environment, Source};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "DID_AUTH";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8100;
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Fixed challenge prefix handed to the challenge service
    pub challenge_nonce: String,
    pub body_limit: usize,
}

impl AppConfig {
    /// Loads defaults overridden by `DID_AUTH_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::with_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    /// Loads defaults overridden by an arbitrary source.
    pub fn with_source<S>(source: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("challenge_nonce", DEFAULT_CHALLENGE_NONCE)?
            .set_default("body_limit", DEFAULT_BODY_LIMIT as i64)?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// `host:port` for binding the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
