// src/error.rs
//! Error taxonomy for identifier decoding, signature verification and
//! child key derivation.

use crate::models::request::SignatureScheme;
use thiserror::Error;

/// Errors surfaced by the authentication core.
///
/// Framing errors (`Format`, `Decode`, `KeyLength`, `ChainCodeLength`, the
/// child index errors) are raised before any cryptographic work happens.
/// `VerificationFailed` is an expected outcome rather than a fault; it is
/// only produced when a [`crate::services::challenge::Verdict`] is turned
/// into a `Result` at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Identifier does not start with `did:key:`
    #[error("invalid identifier format: expected prefix `{expected}`")]
    Format { expected: &'static str },

    /// Input is not valid base64url
    #[error("invalid base64url encoding: {0}")]
    Decode(String),

    /// Public key length does not match the requested signature scheme
    #[error("{scheme} requires a {expected}-byte public key, got {actual} bytes")]
    KeyLength {
        scheme: SignatureScheme,
        expected: usize,
        actual: usize,
    },

    /// Chain code is not exactly 32 bytes
    #[error("chain code must be 32 bytes, got {0}")]
    ChainCodeLength(usize),

    /// Requested child index cannot address the result set
    #[error("child index {index} is out of range for {len} requested children")]
    ChildIndexOutOfRange { index: u32, len: usize },

    /// Same child index requested more than once
    #[error("child index {0} requested more than once")]
    DuplicateChildIndex(u32),

    /// Scalar or point degeneracy while deriving a child key
    #[error("invalid child key: {0}")]
    InvalidChildKey(&'static str),

    /// Parent public key is not a point on secp256k1
    #[error("parent public key is not a valid secp256k1 point")]
    ParentKey,

    /// Signature did not verify against the recomputed challenge
    #[error("signature verification failed")]
    VerificationFailed,
}

impl AuthError {
    /// True for malformed input framing, as opposed to cryptographic outcomes.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            AuthError::Format { .. }
                | AuthError::Decode(_)
                | AuthError::KeyLength { .. }
                | AuthError::ChainCodeLength(_)
                | AuthError::ChildIndexOutOfRange { .. }
                | AuthError::DuplicateChildIndex(_)
        )
    }
}

impl From<base64::DecodeError> for AuthError {
    fn from(e: base64::DecodeError) -> Self {
        AuthError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
