// storage/src/lib.rs

//! Sled-backed document store. One tree per entity collection, each row
//! keyed by the externally issued uuid string and valued with the entity's
//! canonical JSON document, so a stored record reads back with every field
//! intact. Two auxiliary trees: `nurse_emails` (email uniqueness index,
//! value = nurse id) and `meta` (the first-admin flag).
//!
//! Every public operation runs the blocking sled work on the tokio blocking
//! pool under a bounded deadline; a missed deadline surfaces as
//! `ApiError::Unavailable` rather than hanging the request.

pub mod encounters;
pub mod nurses;
pub mod patients;

use std::path::Path;
use std::time::Duration;

use models::{ApiError, ApiResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task;
use tokio::time::timeout;
use tracing::info;

const TREE_NURSES: &str = "nurses";
const TREE_NURSE_EMAILS: &str = "nurse_emails";
const TREE_PATIENTS: &str = "patients";
const TREE_VISITS: &str = "visits";
const TREE_INTERVENTIONS: &str = "interventions";
const TREE_UNABLE_TO_CONTACT: &str = "unable_to_contact";
const TREE_META: &str = "meta";

pub(crate) const META_ADMIN_SEEDED: &[u8] = b"admin_seeded";

/// List fetches stop after this many rows, mirroring the fetch cap of the
/// roster queries.
pub const LIST_CAP: usize = 1_000;
/// Report fetches stop after this many rows. A safety cap, not pagination.
pub const REPORT_CAP: usize = 10_000;

/// Cheap-clone handle over the sled database and its trees. `Db` and `Tree`
/// are `Arc`-backed, so handlers share one handle by value.
#[derive(Clone)]
pub struct Store {
    db: sled::Db,
    pub(crate) nurses: sled::Tree,
    pub(crate) nurse_emails: sled::Tree,
    pub(crate) patients: sled::Tree,
    pub(crate) visits: sled::Tree,
    pub(crate) interventions: sled::Tree,
    pub(crate) unable_to_contact: sled::Tree,
    pub(crate) meta: sled::Tree,
    op_timeout: Duration,
}

impl Store {
    /// Opens (creating if necessary) the store at `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>, op_timeout: Duration) -> ApiResult<Store> {
        let path = data_dir.as_ref();
        let db = sled::Config::new().path(path).open()?;
        info!(path = %path.display(), "opened data store");
        Self::from_db(db, op_timeout)
    }

    /// In-memory store for tests; dropped state is discarded.
    pub fn temporary() -> ApiResult<Store> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db, Duration::from_secs(2))
    }

    fn from_db(db: sled::Db, op_timeout: Duration) -> ApiResult<Store> {
        Ok(Store {
            nurses: db.open_tree(TREE_NURSES)?,
            nurse_emails: db.open_tree(TREE_NURSE_EMAILS)?,
            patients: db.open_tree(TREE_PATIENTS)?,
            visits: db.open_tree(TREE_VISITS)?,
            interventions: db.open_tree(TREE_INTERVENTIONS)?,
            unable_to_contact: db.open_tree(TREE_UNABLE_TO_CONTACT)?,
            meta: db.open_tree(TREE_META)?,
            db,
            op_timeout,
        })
    }

    /// Runs a blocking sled operation on the blocking pool under the
    /// configured deadline. On expiry the request gets `Unavailable`; the
    /// blocking task itself cannot be cancelled and is left to finish.
    pub(crate) async fn run<T, F>(&self, op: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> ApiResult<T> + Send + 'static,
    {
        match timeout(self.op_timeout, task::spawn_blocking(op)).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ApiError::Internal(format!(
                "storage worker failed: {join_err}"
            ))),
            Err(_) => Err(ApiError::Unavailable(
                "storage operation timed out".to_string(),
            )),
        }
    }

    /// Flushes buffered writes to disk. Called once on shutdown; sled also
    /// flushes periodically on its own.
    pub async fn flush(&self) -> ApiResult<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> ApiResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ApiResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn temporary_store_opens_all_trees_empty() {
        let store = Store::temporary().unwrap();
        assert_eq!(store.nurses.len(), 0);
        assert_eq!(store.patients.len(), 0);
        assert_eq!(store.visits.len(), 0);
        assert_eq!(store.interventions.len(), 0);
        assert_eq!(store.unable_to_contact.len(), 0);
    }

    #[tokio::test]
    async fn run_propagates_the_closure_result() {
        let store = Store::temporary().unwrap();
        let ok: ApiResult<u32> = store.run(|| Ok(7)).await;
        assert_eq!(ok.unwrap(), 7);
        let err: ApiResult<u32> = store.run(|| Err(ApiError::NotFound("Patient"))).await;
        assert!(matches!(err, Err(ApiError::NotFound("Patient"))));
    }
}
