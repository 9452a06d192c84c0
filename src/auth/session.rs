//! Session management
//!
//! Uses HMAC-signed tokens passed as a bearer token or cookie.
//! No server-side session storage needed. Tokens are minted by whatever
//! system registers users; this service only verifies them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// User session data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// ID of the acting user
    pub user_id: String,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Session for `user_id` valid for `max_age_seconds` from now
    pub fn new(user_id: impl Into<String>, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            created_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Whether the session was created more than `max_age_seconds` ago
    pub fn exceeds_max_age(&self, max_age_seconds: i64) -> bool {
        Utc::now() - self.created_at > Duration::seconds(max_age_seconds)
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
///
/// # Arguments
/// * `session` - Session data to encode
/// * `secret` - HMAC secret key
///
/// # Returns
/// Signed token string
pub fn create_session_token(
    session: &Session,
    secret: &str,
) -> Result<String, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize session to JSON
    let payload =
        serde_json::to_string(session).map_err(|e| crate::error::AppError::Internal(e.into()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 3. Create HMAC-SHA256 signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// Returns `Unauthorized` if the signature is invalid, the token is
/// malformed, or the session has expired
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, crate::error::AppError> {
    use crate::error::AppError;
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    mac.verify_slice(&expected_signature)
        .map_err(|_| AppError::Unauthorized)?;

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;

    let session: Session =
        serde_json::from_slice(&payload_bytes).map_err(|_| AppError::Unauthorized)?;

    if session.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    const SECRET: &str = "test-secret-key-that-is-32-bytes!";

    #[test]
    fn token_roundtrip_preserves_user_id() {
        let session = Session::new("01HUSER", 60);
        let token = create_session_token(&session, SECRET).unwrap();

        let verified = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(verified.user_id, "01HUSER");
    }

    #[test]
    fn tampered_or_foreign_tokens_are_rejected() {
        let session = Session::new("01HUSER", 60);
        let token = create_session_token(&session, SECRET).unwrap();

        let other_secret = "another-secret-key-that-is-32-by!";
        assert!(matches!(
            verify_session_token(&token, other_secret),
            Err(AppError::Unauthorized)
        ));

        let forged_payload = {
            use base64::{Engine as _, engine::general_purpose};
            let forged = Session::new("01HADMIN", 60);
            general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap())
        };
        let signature = token.split_once('.').unwrap().1;
        assert!(verify_session_token(&format!("{forged_payload}.{signature}"), SECRET).is_err());

        assert!(verify_session_token("not-a-token", SECRET).is_err());
    }

    #[test]
    fn max_age_is_measured_from_creation() {
        let mut session = Session::new("01HUSER", 3600);
        assert!(!session.exceeds_max_age(60));

        session.created_at = Utc::now() - Duration::seconds(120);
        assert!(session.exceeds_max_age(60));
        assert!(!session.exceeds_max_age(600));
    }

    #[test]
    fn expired_sessions_are_rejected() {
        let session = Session::new("01HUSER", -1);
        let token = create_session_token(&session, SECRET).unwrap();

        assert!(matches!(
            verify_session_token(&token, SECRET),
            Err(AppError::Unauthorized)
        ));
    }
}
