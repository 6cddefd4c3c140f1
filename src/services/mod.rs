// src/services/mod.rs
//! Verification, challenge-response orchestration and the HTTP surface.

pub mod api_server;
pub mod challenge;
pub mod verifier;
