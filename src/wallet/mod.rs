// src/wallet/mod.rs
//! HD wallet key derivation.

pub mod derivation;
