// src/models/request.rs
//! Normalized verification and derivation requests.
//!
//! The transport layer accepts several wire spellings for the same fields
//! and converts them into these types before calling the core.

use crate::error::Result;
use crate::models::did::{Identifier, RawPublicKey};
use crate::models::extended_key::{chain_code_from_base64, ChainCode};
use crate::utils::encoding::encode_base64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signature scheme carried explicitly with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureScheme {
    /// Raw 64-byte Ed25519 signature over a 32-byte key
    Ed25519,
    /// DER-encoded ECDSA signature over a 33-byte compressed secp256k1 key
    Secp256k1Der,
}

impl SignatureScheme {
    /// Public key length the scheme accepts.
    pub fn public_key_len(self) -> usize {
        match self {
            SignatureScheme::Ed25519 => 32,
            SignatureScheme::Secp256k1Der => 33,
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureScheme::Ed25519 => f.write_str("ed25519"),
            SignatureScheme::Secp256k1Der => f.write_str("secp256k1-der"),
        }
    }
}

/// What the requester proves possession of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityMaterial {
    /// A `did:key` identifier embedding the verification key
    Identifier(Identifier),
    /// An HD-wallet parent key and its chain code
    HdWallet {
        public_key: RawPublicKey,
        chain_code: ChainCode,
    },
}

impl IdentityMaterial {
    /// Decodes base64url HD-wallet material.
    pub fn hd_from_base64(public_key: &str, chain_code: &str) -> Result<Self> {
        Ok(IdentityMaterial::HdWallet {
            public_key: RawPublicKey::from_base64(public_key)?,
            chain_code: chain_code_from_base64(chain_code)?,
        })
    }

    /// The string appended to the nonce to form a challenge.
    ///
    /// For identifiers this is the identifier as supplied. For HD material
    /// it is the base64url public key followed by the base64url chain code.
    pub fn challenge_suffix(&self) -> String {
        match self {
            IdentityMaterial::Identifier(identifier) => identifier.as_str().to_string(),
            IdentityMaterial::HdWallet {
                public_key,
                chain_code,
            } => format!("{}{}", public_key.to_base64(), encode_base64(chain_code)),
        }
    }

    /// Key the signature is checked against.
    pub fn public_key(&self) -> &[u8] {
        match self {
            IdentityMaterial::Identifier(identifier) => identifier.public_key(),
            IdentityMaterial::HdWallet { public_key, .. } => public_key.as_bytes(),
        }
    }
}

impl From<Identifier> for IdentityMaterial {
    fn from(identifier: Identifier) -> Self {
        IdentityMaterial::Identifier(identifier)
    }
}

/// A single signature to check against a recomputed challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub material: IdentityMaterial,
    pub signature: Vec<u8>,
    pub scheme: SignatureScheme,
}

/// Proof of possession for an HD parent key plus the children to derive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdRequest {
    pub public_key: RawPublicKey,
    pub chain_code: ChainCode,
    /// Served in this order; each value also keys the result
    pub child_indices: Vec<u32>,
}

impl HdRequest {
    pub fn material(&self) -> IdentityMaterial {
        IdentityMaterial::HdWallet {
            public_key: self.public_key.clone(),
            chain_code: self.chain_code,
        }
    }
}
