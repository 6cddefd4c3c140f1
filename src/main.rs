// src/main.rs

//! # DID Authentication Server - Main Entry Point
//!
//! Loads configuration, initializes logging and starts the API server.
//!
//! ## Environment Variables
//! - `DID_AUTH_HOST`: (Optional) interface to bind (default: 0.0.0.0)
//! - `DID_AUTH_PORT`: (Optional) port to bind (default: 8100)
//! - `DID_AUTH_CHALLENGE_NONCE`: (Optional) challenge prefix (default: "challenge")
//! - `DID_AUTH_BODY_LIMIT`: (Optional) maximum request body in bytes (default: 65536)
//! - `RUST_LOG`: (Optional) log filter (default: info)

use anyhow::Context;
use did_auth::config::AppConfig;
use did_auth::services::api_server::ApiServer;
use did_auth::services::challenge::ChallengeService;
use dotenv::dotenv;
use log::info;

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load `.env` into the environment
/// 2. Initialize logging
/// 3. Load configuration
/// 4. Start API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("failed to load configuration")?;

    // The nonce is fixed for the life of the process; challenges are
    // recomputed on verify rather than stored
    let challenge_service = ChallengeService::new(config.challenge_nonce.clone());
    let api_server = ApiServer::new(challenge_service, config.body_limit);

    info!("Available endpoints:");
    info!("- POST /request-did-repeater");
    info!("- POST /verify-did-repeater");
    info!("- POST /request-did-batch");
    info!("- POST /verify-did-batch");
    info!("- POST /request-did-hd");
    info!("- POST /verify-did-hd");

    api_server
        .run(config.bind_address())
        .await
        .with_context(|| format!("API server on {} failed", config.bind_address()))
}
