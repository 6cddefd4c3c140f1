// src/wallet/derivation.rs
//! Non-hardened child public key derivation over secp256k1.
//!
//! Implements the public-parent to public-child step of BIP32 (`CKDpub`):
//!
//! ```text
//! I           = HMAC-SHA512(key = chain_code, data = serP(K) || ser32(child_num))
//! IL, IR      = I[0..32], I[32..64]
//! K_child     = IL·G + K
//! chain_child = IR
//! ```
//!
//! Only public material is involved. Hardened derivation needs the parent
//! private key and is not supported; `child_num` values at or above `2^31`
//! are used as plain indices.
//!
//! Uses the following primitives:
//! - HMAC-SHA512 (via `ring`)
//! - secp256k1 scalar and point arithmetic (via `k256`)

use crate::error::{AuthError, Result};
use crate::models::extended_key::{ChainCode, ExtendedKey, CHAIN_CODE_LEN};
use k256::elliptic_curve::group::Group;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, ProjectivePoint, PublicKey, Scalar};
use log::trace;
use ring::hmac;

/// Derives the child of `parent` at index `parent.child_num`.
///
/// # Returns
/// A new key with the compressed child public key, the child chain code,
/// `depth + 1`, the same `child_num` and `is_hardened == false`.
///
/// # Errors
/// - [`AuthError::InvalidChildKey`] if `IL >= n`, if `IL·G` or the child
///   point is the point at infinity, or if the parent is already at depth 255
/// - [`AuthError::ParentKey`] if the parent key is not a valid curve point
///
/// # Determinism
/// Identical `(public_key, chain_code, child_num)` always yield identical
/// output.
pub fn derive_child(parent: &ExtendedKey) -> Result<ExtendedKey> {
    let depth = parent
        .depth
        .checked_add(1)
        .ok_or(AuthError::InvalidChildKey("maximum depth exceeded"))?;

    let (il, child_chain_code) = hmac_split(&parent.chain_code, &parent.public_key, parent.child_num);
    let public_key = tweak_add(&il, &parent.public_key)?;

    trace!("derived child {} at depth {}", parent.child_num, depth);

    Ok(ExtendedKey {
        public_key,
        chain_code: child_chain_code,
        depth,
        child_num: parent.child_num,
        is_hardened: false,
    })
}

/// Computes `I` and splits it into `IL` and the child chain code.
fn hmac_split(chain_code: &ChainCode, public_key: &[u8], child_num: u32) -> ([u8; 32], ChainCode) {
    let key = hmac::Key::new(hmac::HMAC_SHA512, chain_code);
    let mut ctx = hmac::Context::with_key(&key);
    ctx.update(public_key);
    ctx.update(&child_num.to_be_bytes());
    let tag = ctx.sign();
    let (left, right) = tag.as_ref().split_at(CHAIN_CODE_LEN);

    let mut il = [0u8; 32];
    il.copy_from_slice(left);
    let mut child_chain_code = [0u8; CHAIN_CODE_LEN];
    child_chain_code.copy_from_slice(right);
    (il, child_chain_code)
}

/// Returns `IL·G + K` in compressed SEC1 form.
///
/// `IL` is checked before the parent key is parsed.
fn tweak_add(il: &[u8; 32], parent_public_key: &[u8]) -> Result<Vec<u8>> {
    let il: Option<Scalar> = Scalar::from_repr(FieldBytes::clone_from_slice(il)).into();
    let il = il.ok_or(AuthError::InvalidChildKey("IL is not below the group order"))?;

    let tweak = ProjectivePoint::GENERATOR * il;
    if bool::from(tweak.is_identity()) {
        return Err(AuthError::InvalidChildKey("IL·G is the point at infinity"));
    }

    let parent = PublicKey::from_sec1_bytes(parent_public_key).map_err(|_| AuthError::ParentKey)?;

    let child = tweak + parent.to_projective();
    if bool::from(child.is_identity()) {
        return Err(AuthError::InvalidChildKey("child key is the point at infinity"));
    }

    Ok(child.to_affine().to_encoded_point(true).as_bytes().to_vec())
}
