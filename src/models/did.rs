// src/models/did.rs
//! Self-certifying `did:key` identifiers and raw public keys.
//!
//! An [`Identifier`] embeds its public key directly in the string
//! (`did:key:<base64url(key)>`), so no registry lookup is involved. In the
//! identifier flow the embedded key is an Ed25519 key. HD-wallet flows carry
//! a secp256k1 compressed key as bare base64url instead, represented by
//! [`RawPublicKey`]. Both shapes are plain bytes. The two types keep the call
//! paths apart, and conversions between them are explicit.
//!
//! Neither type validates that the bytes form a curve point; that is left to
//! the verifier and the derivation engine.

use crate::error::{AuthError, Result};
use crate::utils::encoding::{decode_base64, encode_base64};
use std::fmt;
use std::str::FromStr;

/// Required prefix of every identifier.
pub const DID_KEY_PREFIX: &str = "did:key:";

/// Extracts the public key bytes embedded in an identifier string.
///
/// # Errors
/// - [`AuthError::Format`] if the prefix is not exactly `did:key:`
/// - [`AuthError::Decode`] if the suffix is not valid base64url
pub fn extract_public_key(identifier: &str) -> Result<Vec<u8>> {
    let encoded = identifier
        .strip_prefix(DID_KEY_PREFIX)
        .ok_or(AuthError::Format {
            expected: DID_KEY_PREFIX,
        })?;
    decode_base64(encoded)
}

/// Formats public key bytes as an identifier. The key length is not checked.
pub fn build_identifier(public_key: &[u8]) -> String {
    format!("{}{}", DID_KEY_PREFIX, encode_base64(public_key))
}

/// A parsed `did:key` identifier.
///
/// Keeps the string exactly as supplied, since challenges are composed from
/// it, together with the decoded key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    did: String,
    public_key: Vec<u8>,
}

impl Identifier {
    /// Parses and validates an identifier string.
    pub fn parse(did: &str) -> Result<Self> {
        let public_key = extract_public_key(did)?;
        Ok(Identifier {
            did: did.to_string(),
            public_key,
        })
    }

    /// Builds the canonical identifier for a key.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        Identifier {
            did: build_identifier(public_key),
            public_key: public_key.to_vec(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.did
    }

    /// Embedded public key bytes.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Reinterprets the embedded key as raw key material.
    pub fn to_raw_public_key(&self) -> RawPublicKey {
        RawPublicKey(self.public_key.clone())
    }
}

impl FromStr for Identifier {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        Identifier::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.did)
    }
}

/// Public key bytes supplied directly rather than through an identifier.
///
/// In practice a 33-byte SEC1 compressed secp256k1 key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawPublicKey(Vec<u8>);

impl RawPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        RawPublicKey(bytes.to_vec())
    }

    /// Decodes a base64url-encoded key.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        Ok(RawPublicKey(decode_base64(encoded)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_base64(&self) -> String {
        encode_base64(&self.0)
    }

    /// Wraps the key in an identifier.
    pub fn to_identifier(&self) -> Identifier {
        Identifier::from_public_key(&self.0)
    }
}

impl From<Vec<u8>> for RawPublicKey {
    fn from(bytes: Vec<u8>) -> Self {
        RawPublicKey(bytes)
    }
}

impl AsRef<[u8]> for RawPublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
