// src/services/api_server.rs
//! API Server for DID challenge-response authentication
//!
//! This module exposes the challenge service over HTTP. Handlers only decode
//! wire payloads into normalized requests and encode results back; all
//! verification and derivation happens in [`ChallengeService`].
//!
//! The API is built using Axum and includes endpoints for:
//! - Identifier challenge request and verification (`repeater`)
//! - All-or-nothing verification of several identifiers (`batch`)
//! - HD-wallet proof of possession with child key derivation (`hd`)
//!
//! Clients spell the same fields differently: the identifier arrives as
//! `did` or `did_key` and the signature as `signature` or
//! `encoded_signature`. Both spellings are accepted everywhere.

use crate::error::AuthError;
use crate::models::did::{Identifier, RawPublicKey};
use crate::models::extended_key::{chain_code_from_base64, ChildKeyRecord};
use crate::models::request::{HdRequest, IdentityMaterial, SignatureScheme, VerificationRequest};
use crate::services::challenge::{BatchVerdict, ChallengeService};
use crate::utils::encoding::decode_base64;
use axum::{
    extract::{DefaultBodyLimit, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::limit::RequestBodyLimitLayer;

// API request and response structures

/// Request payload carrying an identifier
#[derive(Serialize, Deserialize)]
struct IdentifierRequest {
    #[serde(alias = "did_key")]
    did: String,
}

/// Response containing the challenge to sign
#[derive(Serialize, Deserialize)]
struct ChallengeResponse {
    challenge: String,
}

/// Response containing one challenge per identifier
#[derive(Serialize, Deserialize)]
struct BatchChallengeResponse {
    challenges: Vec<String>,
}

/// Request payload with an identifier and its base64url Ed25519 signature
#[derive(Serialize, Deserialize)]
struct SignedIdentifierRequest {
    #[serde(alias = "did_key")]
    did: String,
    #[serde(alias = "encoded_signature")]
    signature: String,
}

impl SignedIdentifierRequest {
    fn to_verification_request(&self) -> Result<VerificationRequest, AuthError> {
        Ok(VerificationRequest {
            material: IdentityMaterial::from(Identifier::parse(&self.did)?),
            signature: decode_base64(&self.signature)?,
            scheme: SignatureScheme::Ed25519,
        })
    }
}

/// Request payload describing an HD wallet parent key
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HdWalletRequest {
    public_key: String,
    chain_code: String,
    #[serde(default)]
    child_nums: Vec<u32>,
}

impl HdWalletRequest {
    fn to_hd_request(&self) -> Result<HdRequest, AuthError> {
        Ok(HdRequest {
            public_key: RawPublicKey::from_base64(&self.public_key)?,
            chain_code: chain_code_from_base64(&self.chain_code)?,
            child_indices: self.child_nums.clone(),
        })
    }
}

/// HD wallet payload plus its base64url DER signature
#[derive(Serialize, Deserialize)]
struct SignedHdWalletRequest {
    #[serde(flatten)]
    wallet: HdWalletRequest,
    #[serde(alias = "encoded_signature")]
    signature: String,
}

/// Errors returned to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("batch rejected at entry {0}")]
    BatchRejected(usize),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) if e.is_framing() => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::VerificationFailed) | ApiError::BatchRejected(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Auth(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("request failed with {}: {}", status, self);
        let body = match &self {
            ApiError::BatchRejected(index) => json!({ "error": self.to_string(), "index": index }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// API server state containing the challenge service
#[derive(Clone)]
pub struct ApiServer {
    /// Shared, immutable challenge-response service
    challenge_service: Arc<ChallengeService>,

    /// Maximum accepted request body in bytes
    body_limit: usize,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `challenge_service` - Service performing verification and derivation
    /// * `body_limit` - Maximum request body size in bytes
    pub fn new(challenge_service: ChallengeService, body_limit: usize) -> Self {
        ApiServer {
            challenge_service: Arc::new(challenge_service),
            body_limit,
        }
    }

    /// Builds the router with all API routes
    pub fn router(&self) -> Router {
        Router::new()
            .route("/request-did-repeater", post(Self::request_repeater_handler))
            .route("/verify-did-repeater", post(Self::verify_repeater_handler))
            .route("/request-did-batch", post(Self::request_batch_handler))
            .route("/verify-did-batch", post(Self::verify_batch_handler))
            .route("/request-did-hd", post(Self::request_hd_handler))
            .route("/verify-did-hd", post(Self::verify_hd_handler))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.body_limit))
            .with_state(Arc::new(self.clone()))
    }

    /// Binds `addr` and serves requests until the process exits
    ///
    /// # Errors
    /// Returns `Err` if the address cannot be bound or the server fails
    pub async fn run<A: ToSocketAddrs>(&self, addr: A) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("API server listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router()).await
    }

    // =====================
    // Identifier Handlers
    // =====================

    /// Issues the challenge for an identifier
    ///
    /// # Endpoint
    /// POST /request-did-repeater
    ///
    /// # Responses
    /// - 200 OK: Returns `{ "challenge": ... }`
    /// - 400 Bad Request: Malformed identifier
    async fn request_repeater_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<IdentifierRequest>,
    ) -> Result<Json<ChallengeResponse>, ApiError> {
        let identifier = Identifier::parse(&payload.did)?;
        let challenge = state.challenge_service.request_challenge(&IdentityMaterial::from(identifier));
        Ok(Json(ChallengeResponse { challenge }))
    }

    /// Verifies an Ed25519 signature over an identifier's challenge
    ///
    /// # Endpoint
    /// POST /verify-did-repeater
    ///
    /// # Responses
    /// - 200 OK: Signature valid
    /// - 400 Bad Request: Malformed identifier, signature encoding or key length
    /// - 401 Unauthorized: Signature invalid
    async fn verify_repeater_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<SignedIdentifierRequest>,
    ) -> Result<&'static str, ApiError> {
        let request = payload.to_verification_request()?;
        state.challenge_service.verify(&request)?.into_result()?;
        info!("authenticated {}", payload.did);
        Ok("OK")
    }

    // =====================
    // Batch Handlers
    // =====================

    /// Issues one challenge per identifier
    ///
    /// # Endpoint
    /// POST /request-did-batch
    ///
    /// # Responses
    /// - 200 OK: Returns `{ "challenges": [...] }` in request order
    /// - 400 Bad Request: Any identifier is malformed
    async fn request_batch_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<Vec<IdentifierRequest>>,
    ) -> Result<Json<BatchChallengeResponse>, ApiError> {
        let challenges = payload
            .iter()
            .map(|entry| -> Result<String, AuthError> {
                let identifier = Identifier::parse(&entry.did)?;
                Ok(state.challenge_service.request_challenge(&IdentityMaterial::from(identifier)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Json(BatchChallengeResponse { challenges }))
    }

    /// Verifies every entry, stopping at the first failure
    ///
    /// # Endpoint
    /// POST /verify-did-batch
    ///
    /// # Responses
    /// - 200 OK: All signatures valid
    /// - 400 Bad Request: An examined entry is malformed
    /// - 401 Unauthorized: Returns `{ "index": n }` of the first invalid entry
    async fn verify_batch_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<Vec<SignedIdentifierRequest>>,
    ) -> Result<&'static str, ApiError> {
        let entries = payload.iter().map(SignedIdentifierRequest::to_verification_request);
        match state.challenge_service.verify_batch(entries)? {
            BatchVerdict::Accepted { verified } => {
                info!("batch of {} authenticated", verified);
                Ok("OK")
            }
            BatchVerdict::Rejected { index } => Err(ApiError::BatchRejected(index)),
        }
    }

    // =====================
    // HD Wallet Handlers
    // =====================

    /// Issues the challenge for an HD wallet parent key
    ///
    /// # Endpoint
    /// POST /request-did-hd
    ///
    /// # Responses
    /// - 200 OK: Returns `{ "challenge": ... }`
    /// - 400 Bad Request: Malformed public key or chain code
    async fn request_hd_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<HdWalletRequest>,
    ) -> Result<Json<ChallengeResponse>, ApiError> {
        let request = payload.to_hd_request()?;
        let challenge = state.challenge_service.request_challenge(&request.material());
        Ok(Json(ChallengeResponse { challenge }))
    }

    /// Verifies possession of an HD parent key and derives child keys
    ///
    /// # Endpoint
    /// POST /verify-did-hd
    ///
    /// # Responses
    /// - 200 OK: Returns child key records ordered by child index
    /// - 400 Bad Request: Malformed encoding, key length or child indices
    /// - 401 Unauthorized: Signature invalid
    /// - 422 Unprocessable Entity: Parent key invalid or derivation degenerate
    async fn verify_hd_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<SignedHdWalletRequest>,
    ) -> Result<Json<Vec<ChildKeyRecord>>, ApiError> {
        let request = payload.wallet.to_hd_request()?;
        let signature = decode_base64(&payload.signature)?;

        let children = state
            .challenge_service
            .verify_hd(&request, &signature)?
            .into_result()?;

        Ok(Json(children.values().map(ChildKeyRecord::from).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::did::build_identifier;
    use crate::services::verifier::test_keys;
    use crate::utils::encoding::encode_base64;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        ApiServer::new(ChallengeService::default(), 4096).router()
    }

    async fn post(uri: &str, body: String) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("content-length", body.len())
            .body(Body::from(body))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let (status, bytes) = post(uri, body.to_string()).await;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn ed25519_did(seed: u8) -> (ring::signature::Ed25519KeyPair, String) {
        let key = test_keys::ed25519(seed);
        let did = build_identifier(&test_keys::ed25519_public(&key));
        (key, did)
    }

    #[tokio::test]
    async fn test_repeater_round_trip() {
        let (key, did) = ed25519_did(1);

        let (status, body) = post_json("/request-did-repeater", json!({ "did": did })).await;
        assert_eq!(status, StatusCode::OK);
        let challenge = body["challenge"].as_str().unwrap().to_string();
        assert_eq!(challenge, format!("challenge{}", did));

        let signature = encode_base64(&test_keys::ed25519_sign(&key, challenge.as_bytes()));
        let (status, bytes) = post(
            "/verify-did-repeater",
            json!({ "did": did, "signature": signature }).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"OK");
    }

    #[tokio::test]
    async fn test_repeater_accepts_alternate_field_names() {
        let (key, did) = ed25519_did(2);
        let challenge = format!("challenge{}", did);
        let signature = encode_base64(&test_keys::ed25519_sign(&key, challenge.as_bytes()));

        let (status, _) = post_json(
            "/verify-did-repeater",
            json!({ "did_key": did, "encoded_signature": signature }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_repeater_rejects_signature_over_bare_identifier() {
        let (key, did) = ed25519_did(3);
        let signature = encode_base64(&test_keys::ed25519_sign(&key, did.as_bytes()));

        let (status, body) = post_json(
            "/verify-did-repeater",
            json!({ "did": did, "signature": signature }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "signature verification failed");
    }

    #[tokio::test]
    async fn test_repeater_malformed_input_is_bad_request() {
        let (status, _) = post_json("/request-did-repeater", json!({ "did": "did:web:abc" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, did) = ed25519_did(4);
        let (status, _) = post_json(
            "/verify-did-repeater",
            json!({ "did": did, "signature": "***" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // 33-byte key inside an identifier cannot be Ed25519
        let (status, body) = post_json(
            "/verify-did-repeater",
            json!({ "did": build_identifier(&[2u8; 33]), "signature": encode_base64(&[0u8; 64]) }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("32-byte"));
    }

    #[tokio::test]
    async fn test_batch_challenges_in_order() {
        let dids: Vec<String> = (1..=3).map(|seed| ed25519_did(seed).1).collect();
        let (status, body) = post_json(
            "/request-did-batch",
            json!(dids.iter().map(|did| json!({ "did_key": did })).collect::<Vec<_>>()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let expected: Vec<String> = dids.iter().map(|did| format!("challenge{}", did)).collect();
        assert_eq!(body["challenges"], json!(expected));
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let entries: Vec<Value> = (1..=3u8)
            .map(|seed| {
                let (key, did) = ed25519_did(seed);
                let message = if seed == 2 { did.clone() } else { format!("challenge{}", did) };
                json!({
                    "did_key": did,
                    "encoded_signature": encode_base64(&test_keys::ed25519_sign(&key, message.as_bytes())),
                })
            })
            .collect();

        let (status, body) = post_json("/verify-did-batch", json!(entries)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["index"], 1);
    }

    #[tokio::test]
    async fn test_batch_all_valid() {
        let entries: Vec<Value> = (1..=3u8)
            .map(|seed| {
                let (key, did) = ed25519_did(seed);
                let challenge = format!("challenge{}", did);
                json!({
                    "did": did,
                    "signature": encode_base64(&test_keys::ed25519_sign(&key, challenge.as_bytes())),
                })
            })
            .collect();

        let (status, bytes) = post("/verify-did-batch", json!(entries).to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"OK");
    }

    #[tokio::test]
    async fn test_hd_round_trip() {
        let key = test_keys::secp256k1(0x51);
        let public_key = encode_base64(&test_keys::secp256k1_public(&key));
        let chain_code = encode_base64(&[0x52; 32]);

        let (status, body) = post_json(
            "/request-did-hd",
            json!({ "publicKey": public_key, "chainCode": chain_code, "childNums": [1, 0] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let challenge = body["challenge"].as_str().unwrap().to_string();
        assert_eq!(challenge, format!("challenge{}{}", public_key, chain_code));

        let signature = encode_base64(&test_keys::secp256k1_sign_der(&key, challenge.as_bytes()));
        let (status, body) = post_json(
            "/verify-did-hd",
            json!({
                "publicKey": public_key,
                "chainCode": chain_code,
                "childNums": [1, 0],
                "signature": signature,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let records: Vec<ChildKeyRecord> = serde_json::from_value(body).unwrap();
        assert_eq!(records.len(), 2);
        for (position, record) in records.iter().enumerate() {
            assert_eq!(record.child_num, position as u32);
            assert_eq!(record.depth, 1);
            assert_eq!(record.did, format!("did:key:{}", record.public_key));
            assert_eq!(decode_base64(&record.public_key).unwrap().len(), 33);
            assert_eq!(decode_base64(&record.chain_code).unwrap().len(), 32);
        }
    }

    #[tokio::test]
    async fn test_hd_failures() {
        let key = test_keys::secp256k1(0x53);
        let public_key = encode_base64(&test_keys::secp256k1_public(&key));
        let chain_code = encode_base64(&[0x54; 32]);
        let challenge = format!("challenge{}{}", public_key, chain_code);
        let signature = encode_base64(&test_keys::secp256k1_sign_der(&key, challenge.as_bytes()));

        // Out-of-range index
        let (status, _) = post_json(
            "/verify-did-hd",
            json!({
                "publicKey": public_key,
                "chainCode": chain_code,
                "childNums": [0, 5],
                "encoded_signature": signature,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Signature over something else
        let wrong = encode_base64(&test_keys::secp256k1_sign_der(&key, b"some other padded message"));
        let (status, _) = post_json(
            "/verify-did-hd",
            json!({
                "publicKey": public_key,
                "chainCode": chain_code,
                "childNums": [0],
                "signature": wrong,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Short chain code
        let (status, _) = post_json(
            "/request-did-hd",
            json!({ "publicKey": public_key, "chainCode": encode_base64(&[1u8; 8]) }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let (status, _) = post(
            "/request-did-repeater",
            json!({ "did": "x".repeat(8192) }).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
