// src/services/verifier.rs
//! Stateless signature verification for the two supported schemes.
//!
//! The caller names the scheme. Key length and key shape are never used to
//! guess it. Both verifiers are fail-closed: malformed keys or signatures
//! produce `false`, never an error or a panic.

use crate::models::request::SignatureScheme;
use crate::utils::crypto::message_digest;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use ring::signature::{UnparsedPublicKey, ED25519};

pub const ED25519_PUBLIC_KEY_LEN: usize = 32;
pub const ED25519_SIGNATURE_LEN: usize = 64;

/// Verifies a raw Ed25519 signature.
///
/// # Returns
/// `true` only if the key is 32 bytes, the signature is 64 bytes and the
/// signature is valid for `message`.
pub fn verify_ed25519(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    if public_key.len() != ED25519_PUBLIC_KEY_LEN || signature.len() != ED25519_SIGNATURE_LEN {
        return false;
    }
    UnparsedPublicKey::new(&ED25519, public_key)
        .verify(message, signature)
        .is_ok()
}

/// Verifies a DER-encoded ECDSA signature over secp256k1.
///
/// # Process Flow
/// 1. Parses the SEC1 public key into a curve point
/// 2. Parses the DER signature into `(r, s)`
/// 3. Normalizes `s` to the lower half of the group order
/// 4. Verifies against the message bytes used directly as the digest
///    (see [`message_digest`])
///
/// A failure in step 1 or 2 returns `false`.
pub fn verify_secp256k1_der(public_key: &[u8], message: &[u8], der_signature: &[u8]) -> bool {
    let verifying_key = match VerifyingKey::from_sec1_bytes(public_key) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let signature = match Signature::from_der(der_signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    let signature = signature.normalize_s().unwrap_or(signature);

    verifying_key
        .verify_prehash(&message_digest(message), &signature)
        .is_ok()
}

/// Dispatches on an explicit scheme tag.
pub fn verify(
    scheme: SignatureScheme,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> bool {
    match scheme {
        SignatureScheme::Ed25519 => verify_ed25519(public_key, message, signature),
        SignatureScheme::Secp256k1Der => verify_secp256k1_der(public_key, message, signature),
    }
}
