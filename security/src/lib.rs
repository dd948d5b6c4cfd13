// security/src/lib.rs

//! Credential store and token service: registration, login, and the
//! token-to-nurse resolution the request guards build on. Tokens are HS256
//! JWTs carrying only the nurse id; everything else is re-read from storage
//! on every request, so a promoted or deleted nurse takes effect
//! immediately.

pub mod guard;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use models::nurse::{LoginRequest, NewNurse, Nurse};
use models::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use storage::Store;
use tracing::debug;

pub use guard::{AdminNurse, AuthNurse};

/// Tokens live for seven days from issue.
pub const TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies bearer tokens. Cheap to clone; lives in app state.
#[derive(Clone)]
pub struct AuthService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // zero leeway: a token is valid up to its exact expiry instant and
        // invalid strictly after
        validation.leeway = 0;
        AuthService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue_token(&self, nurse_id: &str) -> ApiResult<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: nurse_id.to_string(),
            iat,
            exp: iat + TOKEN_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| ApiError::Internal(format!("token issue failed: {err}")))
    }

    /// Signature and expiry check only; whether the subject still exists is
    /// `resolve`'s job. Every failure cause collapses into the one uniform
    /// unauthorized outcome.
    pub fn verify_token(&self, token: &str) -> ApiResult<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::invalid_token())
    }

    /// Registers a nurse and logs them straight in.
    pub async fn register(&self, store: &Store, new: NewNurse) -> ApiResult<(String, Nurse)> {
        new.validate()?;
        let nurse = store.register_nurse(new).await?;
        let token = self.issue_token(&nurse.id)?;
        debug!(nurse_id = %nurse.id, "issued registration token");
        Ok((token, nurse))
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, store: &Store, request: LoginRequest) -> ApiResult<(String, Nurse)> {
        let Some(nurse) = store.nurse_by_email(&request.email).await? else {
            return Err(ApiError::invalid_credentials());
        };
        if !Nurse::verify_password(&request.password, &nurse.password_hash)? {
            return Err(ApiError::invalid_credentials());
        }
        let token = self.issue_token(&nurse.id)?;
        debug!(nurse_id = %nurse.id, "issued login token");
        Ok((token, nurse))
    }

    /// Turns a bearer token into the stored nurse. A subject whose row has
    /// since been deleted fails the same way a bad token does; storage
    /// trouble is surfaced as itself, not as an auth failure.
    pub async fn resolve(&self, store: &Store, token: &str) -> ApiResult<Nurse> {
        let claims = self.verify_token(token)?;
        match store.nurse_by_id(&claims.sub).await? {
            Some(nurse) => Ok(nurse),
            None => Err(ApiError::invalid_token()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str) -> NewNurse {
        NewNurse {
            email: email.to_string(),
            password: "pw-123456".to_string(),
            full_name: "Ada Example".to_string(),
            title: "RN".to_string(),
            license_number: None,
        }
    }

    #[test]
    fn issued_token_verifies_and_carries_a_week() {
        let auth = AuthService::new("test-secret");
        let token = auth.issue_token("nurse-1").unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "nurse-1");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn foreign_and_malformed_tokens_are_rejected_uniformly() {
        let auth = AuthService::new("test-secret");
        let other = AuthService::new("other-secret");
        let token = other.issue_token("nurse-1").unwrap();

        let forged = auth.verify_token(&token).unwrap_err();
        let garbage = auth.verify_token("not.a.jwt").unwrap_err();
        assert_eq!(forged.to_string(), "Invalid or expired token");
        assert_eq!(garbage.to_string(), forged.to_string());
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = AuthService::new("test-secret");
        let stale = Claims {
            sub: "nurse-1".to_string(),
            iat: Utc::now().timestamp() - TOKEN_TTL_SECS - 60,
            exp: Utc::now().timestamp() - 60,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &stale,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(auth.verify_token(&token).is_err());
    }

    #[tokio::test]
    async fn register_login_resolve_round_trip() {
        let store = Store::temporary().unwrap();
        let auth = AuthService::new("test-secret");

        let (token, nurse) = auth
            .register(&store, registration("flow@example.com"))
            .await
            .unwrap();
        let resolved = auth.resolve(&store, &token).await.unwrap();
        assert_eq!(resolved.id, nurse.id);

        let (login_token, _) = auth
            .login(
                &store,
                LoginRequest {
                    email: "flow@example.com".to_string(),
                    password: "pw-123456".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(auth.resolve(&store, &login_token).await.unwrap().id, nurse.id);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let store = Store::temporary().unwrap();
        let auth = AuthService::new("test-secret");
        auth.register(&store, registration("known@example.com"))
            .await
            .unwrap();

        let unknown = auth
            .login(
                &store,
                LoginRequest {
                    email: "unknown@example.com".to_string(),
                    password: "pw-123456".to_string(),
                },
            )
            .await
            .unwrap_err();
        let wrong = auth
            .login(
                &store,
                LoginRequest {
                    email: "known@example.com".to_string(),
                    password: "wrong".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(unknown.to_string(), "Invalid credentials");
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn token_for_a_vanished_subject_resolves_like_a_bad_token() {
        let store = Store::temporary().unwrap();
        let auth = AuthService::new("test-secret");
        let token = auth.issue_token("never-registered").unwrap();
        let err = auth.resolve(&store, &token).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired token");
    }

    #[tokio::test]
    async fn invalid_registration_is_rejected_before_storage() {
        let store = Store::temporary().unwrap();
        let auth = AuthService::new("test-secret");
        let mut bad = registration("ok@example.com");
        bad.password.clear();
        let err = auth.register(&store, bad).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(store.list_nurses().await.unwrap().len(), 0);
    }
}
