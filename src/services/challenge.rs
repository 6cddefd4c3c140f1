// src/services/challenge.rs
//! Challenge-response orchestration.
//!
//! The protocol has two phases and keeps no state between them:
//!
//! 1. **Request**: the requester sends identity material and receives
//!    `nonce || material`.
//! 2. **Verify**: the requester returns the same material with a signature
//!    over that challenge. The service recomputes the challenge, checks the
//!    signature and, for HD wallets, derives the requested child keys.
//!
//! The nonce is fixed per service instance and injected at construction.
//! A deployment that needs replay protection would issue a fresh nonce per
//! request and keep it in a time-bounded store. That store is outside this
//! crate.

use crate::error::{AuthError, Result};
use crate::models::did::RawPublicKey;
use crate::models::extended_key::{ChainCode, ExtendedKey};
use crate::models::request::{HdRequest, IdentityMaterial, SignatureScheme, VerificationRequest};
use crate::services::verifier;
use crate::wallet::derivation::derive_child;
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};

/// Nonce used when none is configured.
pub const DEFAULT_CHALLENGE_NONCE: &str = "challenge";

/// Child keys keyed by requested index.
pub type DerivedChildren = BTreeMap<u32, ExtendedKey>;

/// Outcome of a signature check. Rejection is an expected result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<T = ()> {
    Accepted(T),
    Rejected,
}

impl<T> Verdict<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }

    /// Converts a rejection into [`AuthError::VerificationFailed`].
    pub fn into_result(self) -> Result<T> {
        match self {
            Verdict::Accepted(value) => Ok(value),
            Verdict::Rejected => Err(AuthError::VerificationFailed),
        }
    }
}

/// Outcome of an all-or-nothing batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchVerdict {
    /// Every entry verified
    Accepted { verified: usize },
    /// Entry `index` was rejected; later entries were not examined
    Rejected { index: usize },
}

/// Composes `nonce || material`.
pub fn compose_challenge(nonce: &str, material: &str) -> String {
    let mut challenge = String::with_capacity(nonce.len() + material.len());
    challenge.push_str(nonce);
    challenge.push_str(material);
    challenge
}

/// Checks that child indices can key a result set of `indices.len()` entries.
///
/// # Errors
/// - [`AuthError::ChildIndexOutOfRange`] for any index `>= indices.len()`
/// - [`AuthError::DuplicateChildIndex`] for a repeated index
pub fn validate_child_indices(indices: &[u32]) -> Result<()> {
    let mut seen = HashSet::with_capacity(indices.len());
    for &index in indices {
        if index as usize >= indices.len() {
            return Err(AuthError::ChildIndexOutOfRange {
                index,
                len: indices.len(),
            });
        }
        if !seen.insert(index) {
            return Err(AuthError::DuplicateChildIndex(index));
        }
    }
    Ok(())
}

/// Derives one child per index, in the order given.
///
/// Each child is derived from a depth-0 parent whose `child_num` is the
/// requested index. The first failure aborts the whole set.
pub fn derive_children(
    public_key: &RawPublicKey,
    chain_code: ChainCode,
    indices: &[u32],
) -> Result<DerivedChildren> {
    validate_child_indices(indices)?;

    let mut children = DerivedChildren::new();
    for &index in indices {
        let parent = ExtendedKey::new(public_key, chain_code, index);
        let child = derive_child(&parent)?;
        children.insert(index, child);
    }
    Ok(children)
}

/// Stateless challenge-response service.
#[derive(Debug, Clone)]
pub struct ChallengeService {
    nonce: String,
}

impl Default for ChallengeService {
    fn default() -> Self {
        ChallengeService::new(DEFAULT_CHALLENGE_NONCE)
    }
}

impl ChallengeService {
    pub fn new(nonce: impl Into<String>) -> Self {
        ChallengeService {
            nonce: nonce.into(),
        }
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Request phase: the challenge the requester must sign.
    pub fn request_challenge(&self, material: &IdentityMaterial) -> String {
        compose_challenge(&self.nonce, &material.challenge_suffix())
    }

    /// Verify phase for a single signature.
    ///
    /// # Errors
    /// - [`AuthError::KeyLength`] if the key length does not fit the scheme.
    ///   This is checked before any verification work.
    ///
    /// An invalid signature is `Ok(Verdict::Rejected)`.
    pub fn verify(&self, request: &VerificationRequest) -> Result<Verdict> {
        let public_key = request.material.public_key();
        let expected = request.scheme.public_key_len();
        if public_key.len() != expected {
            return Err(AuthError::KeyLength {
                scheme: request.scheme,
                expected,
                actual: public_key.len(),
            });
        }

        let challenge = self.request_challenge(&request.material);
        if verifier::verify(
            request.scheme,
            public_key,
            challenge.as_bytes(),
            &request.signature,
        ) {
            debug!("{} signature accepted", request.scheme);
            Ok(Verdict::Accepted(()))
        } else {
            warn!("{} signature rejected", request.scheme);
            Ok(Verdict::Rejected)
        }
    }

    /// Verifies entries in order and stops at the first rejection.
    ///
    /// Entries are pulled from the iterator lazily, so nothing after the
    /// first rejection is decoded or checked. A framing error in an entry
    /// that is reached is returned as an error.
    pub fn verify_batch<I>(&self, entries: I) -> Result<BatchVerdict>
    where
        I: IntoIterator<Item = Result<VerificationRequest>>,
    {
        let mut verified = 0;
        for (index, entry) in entries.into_iter().enumerate() {
            let request = entry?;
            if !self.verify(&request)?.is_accepted() {
                warn!("batch rejected at entry {}", index);
                return Ok(BatchVerdict::Rejected { index });
            }
            verified += 1;
        }
        Ok(BatchVerdict::Accepted { verified })
    }

    /// Verify phase for an HD wallet.
    ///
    /// Child indices are validated first. The secp256k1 DER signature is then
    /// checked over the challenge. Only on acceptance are the requested
    /// children derived. Any derivation error aborts the request.
    pub fn verify_hd(&self, request: &HdRequest, signature: &[u8]) -> Result<Verdict<DerivedChildren>> {
        validate_child_indices(&request.child_indices)?;

        let verification = VerificationRequest {
            material: request.material(),
            signature: signature.to_vec(),
            scheme: SignatureScheme::Secp256k1Der,
        };
        if !self.verify(&verification)?.is_accepted() {
            return Ok(Verdict::Rejected);
        }

        let children = derive_children(&request.public_key, request.chain_code, &request.child_indices)?;
        debug!("derived {} child keys", children.len());
        Ok(Verdict::Accepted(children))
    }
}
