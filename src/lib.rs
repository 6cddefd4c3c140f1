// src/lib.rs

//! # DID Challenge-Response Authentication
//!
//! Authenticates requesters who prove possession of the key embedded in a
//! self-certifying `did:key` identifier, and derives non-hardened child
//! public keys for HD wallets.
//!
//! ## Architecture Overview
//! 1. **Codec**: base64url and `did:key` parsing (`utils::encoding`, `models::did`)
//! 2. **Verifier**: Ed25519 and secp256k1 DER signatures (`services::verifier`)
//! 3. **Derivation**: BIP32 public child keys (`wallet::derivation`)
//! 4. **Orchestrator**: stateless challenge-response (`services::challenge`)
//! 5. **HTTP**: axum routes over the orchestrator (`services::api_server`)

pub mod config;    // Layered runtime configuration
pub mod error;     // Error taxonomy
pub mod models;    // Data structures
pub mod services;  // Verification, orchestration and API
pub mod utils;     // Helper functions
pub mod wallet;    // HD key derivation

pub use error::{AuthError, Result};
pub use services::challenge::{BatchVerdict, ChallengeService, Verdict};
