// src/models/extended_key.rs
//! Public-only extended keys for hierarchical-deterministic derivation.

use crate::error::{AuthError, Result};
use crate::models::did::{build_identifier, RawPublicKey};
use crate::utils::encoding::{decode_base64, encode_base64};
use serde::{Deserialize, Serialize};

/// Length of a BIP32 chain code.
pub const CHAIN_CODE_LEN: usize = 32;

pub type ChainCode = [u8; CHAIN_CODE_LEN];

/// Converts decoded bytes into a chain code.
///
/// # Errors
/// - [`AuthError::ChainCodeLength`] unless exactly 32 bytes are supplied
pub fn chain_code_from_slice(bytes: &[u8]) -> Result<ChainCode> {
    ChainCode::try_from(bytes).map_err(|_| AuthError::ChainCodeLength(bytes.len()))
}

/// Decodes a base64url chain code.
pub fn chain_code_from_base64(encoded: &str) -> Result<ChainCode> {
    chain_code_from_slice(&decode_base64(encoded)?)
}

/// A node in a key-derivation tree holding public material only.
///
/// No private key is ever present. Instances are immutable; derivation
/// returns a new key rather than modifying the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    /// SEC1 public key, compressed (33 bytes) for derived keys
    pub public_key: Vec<u8>,
    pub chain_code: ChainCode,
    pub depth: u8,
    /// Index mixed into the HMAC when deriving from this key
    pub child_num: u32,
    /// Always `false`; only non-hardened derivation exists
    pub is_hardened: bool,
}

impl ExtendedKey {
    /// Creates a depth-0 parent key to derive from.
    ///
    /// `child_num` is used as-is; values at or above `2^31` are not treated
    /// as hardened.
    pub fn new(public_key: &RawPublicKey, chain_code: ChainCode, child_num: u32) -> Self {
        ExtendedKey {
            public_key: public_key.as_bytes().to_vec(),
            chain_code,
            depth: 0,
            child_num,
            is_hardened: false,
        }
    }
}

/// Wire form of a derived child key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildKeyRecord {
    /// Identifier built from the child public key
    pub did: String,
    /// Base64url compressed child public key
    pub public_key: String,
    /// Base64url child chain code
    pub chain_code: String,
    pub child_num: u32,
    pub depth: u8,
}

impl From<&ExtendedKey> for ChildKeyRecord {
    fn from(key: &ExtendedKey) -> Self {
        ChildKeyRecord {
            did: build_identifier(&key.public_key),
            public_key: encode_base64(&key.public_key),
            chain_code: encode_base64(&key.chain_code),
            child_num: key.child_num,
            depth: key.depth,
        }
    }
}
