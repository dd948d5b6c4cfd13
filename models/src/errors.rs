// models/src/errors.rs

pub use thiserror::Error;

/// The failure taxonomy shared by every crate in the workspace. Variants map
/// one-to-one onto wire statuses in the REST layer; the message carried by a
/// variant is the message a caller sees, so nothing stored here may leak
/// internal identifiers or ownership hints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Duplicate resource, currently only a duplicate nurse email.
    #[error("{0}")]
    Conflict(String),
    /// Bad credentials or a bad/expired/absent token. Several internal causes
    /// collapse into this one variant deliberately.
    #[error("{0}")]
    Unauthorized(String),
    /// A role check failed on an admin-only operation.
    #[error("{0}")]
    Forbidden(String),
    /// Absent resource, or a resource the acting nurse does not own. The two
    /// are indistinguishable to the caller.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Input failed validation against the recognized field set.
    #[error("{0}")]
    Validation(String),
    /// The persistence layer was unreachable or an operation timed out.
    #[error("{0}")]
    Unavailable(String),
    /// Anything that should never surface in detail to a caller.
    #[error("internal error")]
    Internal(String),
    #[cfg(feature = "sled-errors")]
    #[error("internal error")]
    Sled(#[from] sled::Error),
}

impl ApiError {
    /// Wire status for this failure. Lives next to the variants so the
    /// feature-gated ones are mapped where their cfg is visible.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Conflict(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Validation(_) => 422,
            ApiError::Unavailable(_) => 503,
            ApiError::Internal(_) => 500,
            #[cfg(feature = "sled-errors")]
            ApiError::Sled(_) => 500,
        }
    }

    /// Uniform invalid-credentials failure: unknown email and wrong password
    /// must be indistinguishable to prevent account enumeration.
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("Invalid credentials".to_string())
    }

    /// Uniform bad-token failure used for every token-resolution cause.
    pub fn invalid_token() -> Self {
        ApiError::Unauthorized("Invalid or expired token".to_string())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing failed: {err}"))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("document serialization failed: {err}"))
    }
}

/// A type alias for a `Result` that returns an `ApiError` on failure.
pub type ApiResult<T> = Result<T, ApiError>;

// Wire mapping, gated so only the HTTP-facing crates pull in axum. The
// Display impl is already masked, so the body never carries internals; the
// unmasked cause is logged here, at the last point it is still visible.
#[cfg(feature = "axum-wire")]
mod wire {
    use axum::Json;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use serde_json::json;

    use super::ApiError;

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                tracing::error!(cause = ?self, %status, "request failed");
            }
            let body = Json(json!({
                "status": "error",
                "message": self.to_string(),
            }));
            (status, body).into_response()
        }
    }
}
