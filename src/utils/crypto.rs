// src/utils/crypto.rs
//! Digest helpers shared by the secp256k1 verifier and its tests.
//!
//! HD-wallet clients sign the challenge string itself as the ECDSA digest
//! rather than a hash of it. The leading 32 bytes are taken big-endian and
//! shorter messages are left-padded, which is how the scalar `z` is formed
//! before reduction mod n.

/// Width of a secp256k1 scalar in bytes.
pub const DIGEST_LEN: usize = 32;

/// Maps message bytes onto the 32-byte ECDSA digest.
///
/// # Arguments
/// * `message` - Raw message bytes (usually the challenge string)
///
/// # Returns
/// Fixed-size 32-byte array holding the leading message bytes,
/// right-aligned.
pub fn message_digest(message: &[u8]) -> [u8; DIGEST_LEN] {
    let mut digest = [0u8; DIGEST_LEN];
    let take = message.len().min(DIGEST_LEN);
    digest[DIGEST_LEN - take..].copy_from_slice(&message[..take]);
    digest
}
