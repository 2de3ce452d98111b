//! HS256 credential verification.
//!
//! Tokens are issued by the external auth service with the same shared secret.
//! A secret mismatch shows up here only as every credential failing with
//! [`AuthError::InvalidCredential`].

use std::fmt;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use common::GatewayError;

/// Errors produced while authenticating a request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential cookie was sent.
    #[error("no credential supplied")]
    MissingCredential,

    /// Bad signature, malformed token, or expired. Carries the reason for logs.
    #[error("credential rejected: {0}")]
    InvalidCredential(String),
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => GatewayError::MissingCredential,
            AuthError::InvalidCredential(reason) => GatewayError::InvalidCredential(reason),
        }
    }
}

/// User identifier as issued by the auth service: numeric or string.
///
/// Any JSON number is accepted, including values past `i64::MAX` and floats.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{n}"),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

/// Claims decoded from a verified credential.
///
/// Unknown claims (email, roles, ...) are accepted and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimSet {
    /// Identity of the caller. Absent on tokens that carry no user.
    #[serde(rename = "userId", default)]
    pub user_id: Option<UserId>,

    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

/// Verifies credentials against the process-wide signing secret.
///
/// Built once at startup and shared read-only between requests.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for HS256 tokens signed with `secret`.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify the raw cookie value and return its claims.
    ///
    /// # Errors
    ///
    /// [`AuthError::MissingCredential`] when `cookie` is `None`;
    /// [`AuthError::InvalidCredential`] on any signature, format, or expiry failure.
    pub fn verify(&self, cookie: Option<&str>) -> Result<ClaimSet, AuthError> {
        let token = cookie.ok_or(AuthError::MissingCredential)?;
        decode::<ClaimSet>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidCredential(format!("{:?}", e.kind())))
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenVerifier([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mint_token, unix_now};
    use serde_json::json;

    const SECRET: &str = "shared-secret";

    #[test]
    fn missing_cookie_is_missing_credential() {
        let v = TokenVerifier::new(SECRET);
        assert!(matches!(v.verify(None), Err(AuthError::MissingCredential)));
    }

    #[test]
    fn valid_token_yields_numeric_user_id() {
        let v = TokenVerifier::new(SECRET);
        let token = mint_token(SECRET, json!({"userId": 42, "exp": unix_now() + 3600}));
        let claims = v.verify(Some(&token)).unwrap();
        assert_eq!(claims.user_id, Some(UserId::Number(42u64.into())));
        assert_eq!(claims.user_id.unwrap().to_string(), "42");
    }

    #[test]
    fn valid_token_yields_string_user_id_and_ignores_extra_claims() {
        let v = TokenVerifier::new(SECRET);
        let token = mint_token(
            SECRET,
            json!({"userId": "u-7", "email": "a@b.c", "iat": unix_now(), "exp": unix_now() + 60}),
        );
        let claims = v.verify(Some(&token)).unwrap();
        assert_eq!(claims.user_id, Some(UserId::Text("u-7".into())));
    }

    #[test]
    fn large_and_fractional_user_ids_are_accepted() {
        let v = TokenVerifier::new(SECRET);
        let token = mint_token(SECRET, json!({"userId": u64::MAX, "exp": unix_now() + 60}));
        let claims = v.verify(Some(&token)).unwrap();
        assert_eq!(claims.user_id.unwrap().to_string(), u64::MAX.to_string());

        let token = mint_token(SECRET, json!({"userId": 7.5, "exp": unix_now() + 60}));
        let claims = v.verify(Some(&token)).unwrap();
        assert_eq!(claims.user_id.unwrap().to_string(), "7.5");
    }

    #[test]
    fn non_scalar_user_id_is_invalid() {
        let v = TokenVerifier::new(SECRET);
        let token = mint_token(SECRET, json!({"userId": {"id": 1}, "exp": unix_now() + 60}));
        assert!(matches!(
            v.verify(Some(&token)),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn expired_token_is_invalid() {
        let v = TokenVerifier::new(SECRET);
        let token = mint_token(SECRET, json!({"userId": 1, "exp": unix_now() - 3600}));
        match v.verify(Some(&token)) {
            Err(AuthError::InvalidCredential(reason)) => assert!(reason.contains("Expired")),
            other => panic!("expected InvalidCredential, got {other:?}"),
        }
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let v = TokenVerifier::new(SECRET);
        let token = mint_token("another-secret", json!({"userId": 1, "exp": unix_now() + 3600}));
        assert!(matches!(
            v.verify(Some(&token)),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let v = TokenVerifier::new(SECRET);
        let token = mint_token(SECRET, json!({"userId": 1, "exp": unix_now() + 3600}));
        let forged = mint_token(SECRET, json!({"userId": 999, "exp": unix_now() + 3600}));
        // Splice the forged payload onto the original signature.
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);
        assert!(matches!(
            v.verify(Some(&spliced)),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        let v = TokenVerifier::new(SECRET);
        assert!(matches!(
            v.verify(Some("not-a-token")),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn token_without_expiry_is_invalid() {
        let v = TokenVerifier::new(SECRET);
        let token = mint_token(SECRET, json!({"userId": 1}));
        assert!(matches!(
            v.verify(Some(&token)),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn token_without_user_id_is_accepted_without_identity() {
        let v = TokenVerifier::new(SECRET);
        let token = mint_token(SECRET, json!({"exp": unix_now() + 60}));
        let claims = v.verify(Some(&token)).unwrap();
        assert!(claims.user_id.is_none());
    }

    #[test]
    fn auth_errors_map_to_401() {
        let missing: GatewayError = AuthError::MissingCredential.into();
        let invalid: GatewayError = AuthError::InvalidCredential("x".into()).into();
        assert_eq!(missing.http_status(), 401);
        assert_eq!(invalid.http_status(), 401);
        assert!(invalid.clears_credential());
    }

    #[test]
    fn debug_redacts_key() {
        let v = TokenVerifier::new(SECRET);
        assert!(!format!("{v:?}").contains(SECRET));
    }
}
