// models/src/nurse.rs

use bcrypt::{BcryptError, DEFAULT_COST, hash, verify};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};

/// Registration payload. Holds the plaintext password only for the duration
/// of the request; nothing downstream of hashing ever sees it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNurse {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub title: String,
    pub license_number: Option<String>,
}

impl NewNurse {
    /// Shallow shape check on the recognized field set. Email format is kept
    /// loose on purpose; uniqueness is the storage layer's job.
    pub fn validate(&self) -> ApiResult<()> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') || email.contains(char::is_whitespace) {
            return Err(ApiError::Validation("email is not a valid address".to_string()));
        }
        if self.password.is_empty() {
            return Err(ApiError::Validation("password must not be empty".to_string()));
        }
        if self.full_name.trim().is_empty() {
            return Err(ApiError::Validation("full_name must not be empty".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("title must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Login payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A nurse as stored. Carries the bcrypt hash, never the plaintext password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nurse {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub title: String,
    pub license_number: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: String,
}

impl Nurse {
    /// Hashes a plaintext password with a per-record random salt.
    pub fn hash_password(password: &str) -> Result<String, BcryptError> {
        hash(password, DEFAULT_COST)
    }

    /// Verifies a plaintext password against a stored hash.
    pub fn verify_password(password: &str, hashed: &str) -> Result<bool, BcryptError> {
        verify(password, hashed)
    }

    /// Builds the stored record from a registration payload, hashing the
    /// password. `is_admin` is decided by the caller: only the first
    /// registration in a fresh system is granted it.
    pub fn from_new(new: NewNurse, is_admin: bool) -> Result<Self, BcryptError> {
        let password_hash = Self::hash_password(&new.password)?;
        Ok(Nurse {
            id: crate::new_id(),
            email: new.email,
            password_hash,
            full_name: new.full_name,
            title: new.title,
            license_number: new.license_number,
            is_admin,
            created_at: crate::utc_now_string(),
        })
    }

    /// Outward-facing view of this nurse, without the password hash.
    pub fn profile(&self) -> NurseProfile {
        NurseProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            title: self.title.clone(),
            license_number: self.license_number.clone(),
            is_admin: self.is_admin,
            created_at: self.created_at.clone(),
        }
    }
}

/// What callers see over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurseProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub title: String,
    pub license_number: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
}
