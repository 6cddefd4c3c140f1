// src/utils/mod.rs
//! Encoding and digest helpers.

pub mod crypto;
pub mod encoding;
