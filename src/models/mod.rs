// src/models/mod.rs
//! Data structures passed between the codec, verifier and derivation engine.

pub mod did;
pub mod extended_key;
pub mod request;
