// src/utils/encoding.rs
//! Base64url codec for keys, chain codes and signatures.
//!
//! All binary payloads crossing the identifier and HTTP boundaries use the
//! URL-safe alphabet (`-` and `_`) with standard `=` padding. Decoding is
//! strict: unpadded input and bytes outside the alphabet are rejected.

use crate::error::{AuthError, Result};

/// Encodes bytes as padded base64url.
///
/// # Example
/// ```
/// use did_auth::utils::encoding::encode_base64;
/// assert_eq!(encode_base64(&[0xfb, 0xff]), "-_8=");
/// ```
pub fn encode_base64(data: &[u8]) -> String {
    base64::encode_config(data, base64::URL_SAFE)
}

/// Decodes padded base64url.
///
/// # Errors
/// - [`AuthError::Decode`] if the input length is not a multiple of four
///   (missing padding) or contains bytes outside the URL-safe alphabet
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    if data.len() % 4 != 0 {
        return Err(AuthError::Decode(format!(
            "length {} is not a multiple of 4",
            data.len()
        )));
    }
    Ok(base64::decode_config(data, base64::URL_SAFE)?)
}
