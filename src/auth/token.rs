//! Access and refresh tokens
//!
//! Stateless HMAC-signed tokens. Only the SHA-256 of the current refresh
//! token is kept server-side (on the user row) so it can be rotated and
//! revoked.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::AuthConfig;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// User ID
    pub sub: String,
    pub kind: TokenKind,
    /// Random nonce so two tokens issued in the same instant differ
    pub jti: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    /// Issue both tokens for `user_id`
    pub fn issue(user_id: &str, auth: &AuthConfig) -> Result<Self, AppError> {
        Ok(Self {
            access_token: create_token(
                user_id,
                TokenKind::Access,
                auth.access_token_ttl,
                &auth.token_secret,
            )?,
            refresh_token: create_token(
                user_id,
                TokenKind::Refresh,
                auth.refresh_token_ttl,
                &auth.token_secret,
            )?,
        })
    }
}

/// Create a signed token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
///
/// # Arguments
/// * `user_id` - Subject
/// * `kind` - Access or refresh
/// * `ttl_seconds` - Lifetime
/// * `secret` - HMAC secret key
pub fn create_token(
    user_id: &str,
    kind: TokenKind,
    ttl_seconds: i64,
    secret: &str,
) -> Result<String, AppError> {
    let mut nonce = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut nonce);

    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        kind,
        jti: general_purpose::URL_SAFE_NO_PAD.encode(nonce),
        issued_at: now,
        expires_at: now + Duration::seconds(ttl_seconds),
    };

    let payload = serde_json::to_string(&claims).map_err(|e| AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    let signature = sign(&payload_b64, secret)?;
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify signature, kind and expiry of a token
///
/// # Errors
/// `Unauthorized` if the token is malformed, tampered with, expired
/// or of the wrong kind
pub fn verify_token(token: &str, expected: TokenKind, secret: &str) -> Result<TokenClaims, AppError> {
    let invalid = || AppError::unauthorized("Invalid or expired token");

    let (payload_b64, signature_b64) = token.split_once('.').ok_or_else(invalid)?;
    if signature_b64.contains('.') {
        return Err(invalid());
    }

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| invalid())?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid HMAC key: {e}")))?;
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature).map_err(|_| invalid())?;

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| invalid())?;
    let claims: TokenClaims = serde_json::from_slice(&payload).map_err(|_| invalid())?;

    if claims.kind != expected || claims.is_expired() {
        return Err(invalid());
    }

    Ok(claims)
}

/// SHA-256 hex digest of a token, as stored on the user row
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn sign(payload_b64: &str, secret: &str) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid HMAC key: {e}")))?;
    mac.update(payload_b64.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn access_token_verifies() {
        let token = create_token("user-1", TokenKind::Access, 60, SECRET).unwrap();
        let claims = verify_token(&token, TokenKind::Access, SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let token = create_token("user-1", TokenKind::Refresh, 60, SECRET).unwrap();
        assert!(matches!(
            verify_token(&token, TokenKind::Access, SECRET),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("user-1", TokenKind::Access, 60, SECRET).unwrap();
        assert!(verify_token(&token, TokenKind::Access, "another-secret-another-secret-xx").is_err());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = create_token("user-1", TokenKind::Access, 60, SECRET).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged_claims = serde_json::json!({
            "sub": "admin",
            "kind": "access",
            "jti": "x",
            "issuedAt": Utc::now(),
            "expiresAt": Utc::now() + Duration::hours(1),
        });
        let forged_payload =
            general_purpose::URL_SAFE_NO_PAD.encode(forged_claims.to_string().as_bytes());
        let forged = format!("{forged_payload}.{signature}");
        assert!(verify_token(&forged, TokenKind::Access, SECRET).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token("user-1", TokenKind::Access, -5, SECRET).unwrap();
        assert!(verify_token(&token, TokenKind::Access, SECRET).is_err());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for token in ["", "abc", "a.b.c", "!!!.???"] {
            assert!(verify_token(token, TokenKind::Access, SECRET).is_err());
        }
    }

    #[test]
    fn tokens_issued_together_differ() {
        let a = create_token("user-1", TokenKind::Refresh, 60, SECRET).unwrap();
        let b = create_token("user-1", TokenKind::Refresh, 60, SECRET).unwrap();
        assert_ne!(a, b);
        assert_ne!(hash_token(&a), hash_token(&b));
        assert_eq!(hash_token(&a).len(), 64);
    }
}
