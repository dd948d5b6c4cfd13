// storage/src/nurses.rs

use models::nurse::{NewNurse, Nurse};
use models::{ApiError, ApiResult};
use sled::Transactional;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use tracing::debug;

use crate::{LIST_CAP, META_ADMIN_SEEDED, Store, decode, encode};

impl Store {
    /// Registers a nurse. Email uniqueness and the first-admin decision are
    /// settled inside one transaction over the nurse, email-index and meta
    /// trees; a duplicate email aborts with `Conflict` and leaves no row
    /// behind. The bcrypt hash is computed before the transaction because
    /// the closure may retry.
    pub async fn register_nurse(&self, new: NewNurse) -> ApiResult<Nurse> {
        let template = Nurse::from_new(new, false)?;
        let nurses = self.nurses.clone();
        let emails = self.nurse_emails.clone();
        let meta = self.meta.clone();
        self.run(move || {
            let outcome = (&nurses, &emails, &meta).transaction(|(nurses, emails, meta)| {
                if emails.get(template.email.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(ApiError::Conflict(
                        "Email already registered".to_string(),
                    )));
                }
                let mut nurse = template.clone();
                nurse.is_admin = meta.get(META_ADMIN_SEEDED)?.is_none();
                let doc = encode(&nurse).map_err(ConflictableTransactionError::Abort)?;
                nurses.insert(nurse.id.as_bytes(), doc)?;
                emails.insert(nurse.email.as_bytes(), nurse.id.as_bytes())?;
                meta.insert(META_ADMIN_SEEDED, &b"1"[..])?;
                Ok(nurse)
            });
            match outcome {
                Ok(nurse) => {
                    debug!(nurse_id = %nurse.id, is_admin = nurse.is_admin, "registered nurse");
                    Ok(nurse)
                }
                Err(TransactionError::Abort(err)) => Err(err),
                Err(TransactionError::Storage(err)) => Err(err.into()),
            }
        })
        .await
    }

    pub async fn nurse_by_email(&self, email: &str) -> ApiResult<Option<Nurse>> {
        let emails = self.nurse_emails.clone();
        let nurses = self.nurses.clone();
        let email = email.to_string();
        self.run(move || {
            let Some(id) = emails.get(email.as_bytes())? else {
                return Ok(None);
            };
            match nurses.get(&id)? {
                Some(bytes) => Ok(Some(decode(&bytes)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn nurse_by_id(&self, id: &str) -> ApiResult<Option<Nurse>> {
        let nurses = self.nurses.clone();
        let id = id.to_string();
        self.run(move || match nurses.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        })
        .await
    }

    /// All registered nurses, oldest first.
    pub async fn list_nurses(&self) -> ApiResult<Vec<Nurse>> {
        let nurses = self.nurses.clone();
        self.run(move || {
            let mut rows: Vec<Nurse> = Vec::new();
            for entry in nurses.iter() {
                let (_, bytes) = entry?;
                rows.push(decode(&bytes)?);
                if rows.len() == LIST_CAP {
                    break;
                }
            }
            rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(rows)
        })
        .await
    }

    /// Whichever of `ids` do not exist as nurse rows, preserving input order.
    pub async fn unknown_nurse_ids(&self, ids: Vec<String>) -> ApiResult<Vec<String>> {
        let nurses = self.nurses.clone();
        self.run(move || {
            let mut unknown = Vec::new();
            for id in ids {
                if nurses.get(id.as_bytes())?.is_none() {
                    unknown.push(id);
                }
            }
            Ok(unknown)
        })
        .await
    }

    /// Grants the admin role. Read-modify-write in a transaction so a
    /// concurrent registration cannot be clobbered.
    pub async fn promote_nurse(&self, id: &str) -> ApiResult<Nurse> {
        let nurses = self.nurses.clone();
        let id = id.to_string();
        self.run(move || {
            let outcome = nurses.transaction(|tx| {
                let Some(bytes) = tx.get(id.as_bytes())? else {
                    return Err(ConflictableTransactionError::Abort(ApiError::NotFound(
                        "Nurse",
                    )));
                };
                let mut nurse: Nurse =
                    decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                nurse.is_admin = true;
                let doc = encode(&nurse).map_err(ConflictableTransactionError::Abort)?;
                tx.insert(nurse.id.as_bytes(), doc)?;
                Ok(nurse)
            });
            match outcome {
                Ok(nurse) => {
                    debug!(nurse_id = %nurse.id, "promoted nurse to admin");
                    Ok(nurse)
                }
                Err(TransactionError::Abort(err)) => Err(err),
                Err(TransactionError::Storage(err)) => Err(err.into()),
            }
        })
        .await
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

    #[tokio::test]
    async fn first_registration_is_admin_later_ones_are_not() {
        let store = Store::temporary().unwrap();
        let first = store
            .register_nurse(registration("first@example.com"))
            .await
            .unwrap();
        let second = store
            .register_nurse(registration("second@example.com"))
            .await
            .unwrap();
        assert!(first.is_admin);
        assert!(!second.is_admin);
    }

    #[tokio::test]
    async fn duplicate_email_leaves_no_second_row() {
        let store = Store::temporary().unwrap();
        store
            .register_nurse(registration("dup@example.com"))
            .await
            .unwrap();
        let err = store
            .register_nurse(registration("dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(err.to_string(), "Email already registered");
        assert_eq!(store.nurses.len(), 1);
    }

    #[tokio::test]
    async fn email_matching_is_case_sensitive() {
        let store = Store::temporary().unwrap();
        store
            .register_nurse(registration("Case@example.com"))
            .await
            .unwrap();
        assert!(
            store
                .nurse_by_email("case@example.com")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .nurse_by_email("Case@example.com")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn lookup_by_id_and_email_agree() {
        let store = Store::temporary().unwrap();
        let nurse = store
            .register_nurse(registration("look@example.com"))
            .await
            .unwrap();
        let by_id = store.nurse_by_id(&nurse.id).await.unwrap().unwrap();
        let by_email = store
            .nurse_by_email("look@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id, by_email);
        assert!(store.nurse_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn promote_flips_the_admin_flag() {
        let store = Store::temporary().unwrap();
        store
            .register_nurse(registration("root@example.com"))
            .await
            .unwrap();
        let plain = store
            .register_nurse(registration("plain@example.com"))
            .await
            .unwrap();
        assert!(!plain.is_admin);
        let promoted = store.promote_nurse(&plain.id).await.unwrap();
        assert!(promoted.is_admin);
        assert!(store.nurse_by_id(&plain.id).await.unwrap().unwrap().is_admin);
        let err = store.promote_nurse("missing").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("Nurse")));
    }

    #[tokio::test]
    async fn unknown_nurse_ids_reports_only_missing() {
        let store = Store::temporary().unwrap();
        let nurse = store
            .register_nurse(registration("known@example.com"))
            .await
            .unwrap();
        let unknown = store
            .unknown_nurse_ids(vec![nurse.id.clone(), "ghost-1".into(), "ghost-2".into()])
            .await
            .unwrap();
        assert_eq!(unknown, vec!["ghost-1".to_string(), "ghost-2".to_string()]);
    }
}
