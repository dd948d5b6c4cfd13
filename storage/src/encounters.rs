// storage/src/encounters.rs

use std::collections::HashMap;

use models::intervention::Intervention;
use models::unable_to_contact::UnableToContact;
use models::visit::Visit;
use models::{ApiError, ApiResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sled::Transactional;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use tracing::debug;

use crate::{LIST_CAP, REPORT_CAP, Store, decode, encode};

/// The shape the three encounter kinds share: a uuid row id, the owning
/// patient, the recording nurse and a sortable date. Everything generic
/// about encounter persistence keys off this.
trait EncounterRow: Serialize + DeserializeOwned + Clone + Send + 'static {
    const ENTITY: &'static str;
    fn id(&self) -> &str;
    fn patient_id(&self) -> &str;
    fn nurse_id(&self) -> &str;
    fn date(&self) -> &str;
}

impl EncounterRow for Visit {
    const ENTITY: &'static str = "Visit";
    fn id(&self) -> &str {
        &self.id
    }
    fn patient_id(&self) -> &str {
        &self.patient_id
    }
    fn nurse_id(&self) -> &str {
        &self.nurse_id
    }
    fn date(&self) -> &str {
        &self.visit_date
    }
}

impl EncounterRow for Intervention {
    const ENTITY: &'static str = "Intervention";
    fn id(&self) -> &str {
        &self.id
    }
    fn patient_id(&self) -> &str {
        &self.patient_id
    }
    fn nurse_id(&self) -> &str {
        &self.nurse_id
    }
    fn date(&self) -> &str {
        &self.intervention_date
    }
}

impl EncounterRow for UnableToContact {
    const ENTITY: &'static str = "Unable to contact record";
    fn id(&self) -> &str {
        &self.id
    }
    fn patient_id(&self) -> &str {
        &self.patient_id
    }
    fn nurse_id(&self) -> &str {
        &self.nurse_id
    }
    fn date(&self) -> &str {
        &self.attempt_date
    }
}

impl Store {
    /// Inserts an encounter row inside a transaction with a patient
    /// existence check, so a concurrent patient delete cannot strand a
    /// child row.
    async fn insert_encounter<T: EncounterRow>(&self, tree: sled::Tree, row: T) -> ApiResult<T> {
        let patients = self.patients.clone();
        self.run(move || {
            let outcome = (&patients, &tree).transaction(|(patients, tree)| {
                if patients.get(row.patient_id().as_bytes())?.is_none() {
                    return Err(ConflictableTransactionError::Abort(ApiError::NotFound(
                        "Patient",
                    )));
                }
                let doc = encode(&row).map_err(ConflictableTransactionError::Abort)?;
                tree.insert(row.id().as_bytes(), doc)?;
                Ok(())
            });
            match outcome {
                Ok(()) => {
                    debug!(id = %row.id(), patient_id = %row.patient_id(), entity = T::ENTITY, "recorded encounter");
                    Ok(row)
                }
                Err(TransactionError::Abort(err)) => Err(err),
                Err(TransactionError::Storage(err)) => Err(err.into()),
            }
        })
        .await
    }

    /// Rows for one patient, newest first, capped.
    async fn encounter_rows_for_patient<T: EncounterRow>(
        &self,
        tree: sled::Tree,
        patient_id: &str,
    ) -> ApiResult<Vec<T>> {
        let patient_id = patient_id.to_string();
        self.run(move || {
            let mut rows: Vec<T> = Vec::new();
            for entry in tree.iter() {
                let (_, bytes) = entry?;
                let row: T = decode(&bytes)?;
                if row.patient_id() == patient_id {
                    rows.push(row);
                }
            }
            rows.sort_by(|a, b| b.date().cmp(a.date()));
            rows.truncate(LIST_CAP);
            Ok(rows)
        })
        .await
    }

    /// Fetch scoped by recording nurse. Absent and not-yours both come back
    /// `None`; the caller turns that into a 404.
    async fn encounter_scoped<T: EncounterRow>(
        &self,
        tree: sled::Tree,
        id: &str,
        nurse_id: &str,
        is_admin: bool,
    ) -> ApiResult<Option<T>> {
        let id = id.to_string();
        let nurse_id = nurse_id.to_string();
        self.run(move || {
            let Some(bytes) = tree.get(id.as_bytes())? else {
                return Ok(None);
            };
            let row: T = decode(&bytes)?;
            if is_admin || row.nurse_id() == nurse_id {
                Ok(Some(row))
            } else {
                Ok(None)
            }
        })
        .await
    }

    /// Conditional delete scoped by recording nurse, in one transaction so
    /// the scope check and the removal see the same row.
    async fn delete_encounter<T: EncounterRow>(
        &self,
        tree: sled::Tree,
        id: &str,
        nurse_id: &str,
        is_admin: bool,
    ) -> ApiResult<()> {
        let id = id.to_string();
        let nurse_id = nurse_id.to_string();
        self.run(move || {
            let outcome = tree.transaction(|tx| {
                let Some(bytes) = tx.get(id.as_bytes())? else {
                    return Err(ConflictableTransactionError::Abort(ApiError::NotFound(
                        T::ENTITY,
                    )));
                };
                let row: T = decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                if !is_admin && row.nurse_id() != nurse_id {
                    return Err(ConflictableTransactionError::Abort(ApiError::NotFound(
                        T::ENTITY,
                    )));
                }
                tx.remove(id.as_bytes())?;
                Ok(())
            });
            match outcome {
                Ok(()) => {
                    debug!(id = %id, entity = T::ENTITY, "deleted encounter");
                    Ok(())
                }
                Err(TransactionError::Abort(err)) => Err(err),
                Err(TransactionError::Storage(err)) => Err(err.into()),
            }
        })
        .await
    }

    pub async fn create_visit(&self, visit: Visit) -> ApiResult<Visit> {
        self.insert_encounter(self.visits.clone(), visit).await
    }

    pub async fn visits_for_patient(&self, patient_id: &str) -> ApiResult<Vec<Visit>> {
        self.encounter_rows_for_patient(self.visits.clone(), patient_id)
            .await
    }

    pub async fn visit_scoped(
        &self,
        id: &str,
        nurse_id: &str,
        is_admin: bool,
    ) -> ApiResult<Option<Visit>> {
        self.encounter_scoped(self.visits.clone(), id, nurse_id, is_admin)
            .await
    }

    pub async fn delete_visit(&self, id: &str, nurse_id: &str, is_admin: bool) -> ApiResult<()> {
        self.delete_encounter::<Visit>(self.visits.clone(), id, nurse_id, is_admin)
            .await
    }

    pub async fn create_intervention(&self, intervention: Intervention) -> ApiResult<Intervention> {
        self.insert_encounter(self.interventions.clone(), intervention)
            .await
    }

    pub async fn interventions_for_patient(
        &self,
        patient_id: &str,
    ) -> ApiResult<Vec<Intervention>> {
        self.encounter_rows_for_patient(self.interventions.clone(), patient_id)
            .await
    }

    pub async fn intervention_scoped(
        &self,
        id: &str,
        nurse_id: &str,
        is_admin: bool,
    ) -> ApiResult<Option<Intervention>> {
        self.encounter_scoped(self.interventions.clone(), id, nurse_id, is_admin)
            .await
    }

    pub async fn delete_intervention(
        &self,
        id: &str,
        nurse_id: &str,
        is_admin: bool,
    ) -> ApiResult<()> {
        self.delete_encounter::<Intervention>(self.interventions.clone(), id, nurse_id, is_admin)
            .await
    }

    pub async fn create_unable_to_contact(
        &self,
        record: UnableToContact,
    ) -> ApiResult<UnableToContact> {
        self.insert_encounter(self.unable_to_contact.clone(), record)
            .await
    }

    pub async fn unable_to_contact_for_patient(
        &self,
        patient_id: &str,
    ) -> ApiResult<Vec<UnableToContact>> {
        self.encounter_rows_for_patient(self.unable_to_contact.clone(), patient_id)
            .await
    }

    pub async fn unable_to_contact_scoped(
        &self,
        id: &str,
        nurse_id: &str,
        is_admin: bool,
    ) -> ApiResult<Option<UnableToContact>> {
        self.encounter_scoped(self.unable_to_contact.clone(), id, nurse_id, is_admin)
            .await
    }

    pub async fn delete_unable_to_contact(
        &self,
        id: &str,
        nurse_id: &str,
        is_admin: bool,
    ) -> ApiResult<()> {
        self.delete_encounter::<UnableToContact>(
            self.unable_to_contact.clone(),
            id,
            nurse_id,
            is_admin,
        )
        .await
    }

    /// The requesting nurse's visits inside an inclusive window, newest
    /// first. Bounds compare lexicographically against the stored date
    /// strings. Hard-capped; callers filter further.
    pub async fn visits_for_nurse_window(
        &self,
        nurse_id: &str,
        start: &str,
        end: &str,
    ) -> ApiResult<Vec<Visit>> {
        let tree = self.visits.clone();
        let nurse_id = nurse_id.to_string();
        let start = start.to_string();
        let end = end.to_string();
        self.run(move || {
            let mut rows: Vec<Visit> = Vec::new();
            for entry in tree.iter() {
                let (_, bytes) = entry?;
                let visit: Visit = decode(&bytes)?;
                if visit.nurse_id == nurse_id
                    && visit.visit_date.as_str() >= start.as_str()
                    && visit.visit_date.as_str() <= end.as_str()
                {
                    rows.push(visit);
                }
            }
            rows.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));
            rows.truncate(REPORT_CAP);
            Ok(rows)
        })
        .await
    }

    /// Newest visit date per patient, for roster enrichment in one scan.
    pub async fn visit_recency(&self) -> ApiResult<HashMap<String, String>> {
        let tree = self.visits.clone();
        self.run(move || {
            let mut newest: HashMap<String, String> = HashMap::new();
            for entry in tree.iter() {
                let (_, bytes) = entry?;
                let visit: Visit = decode(&bytes)?;
                match newest.get(&visit.patient_id) {
                    Some(date) if date.as_str() >= visit.visit_date.as_str() => {}
                    _ => {
                        newest.insert(visit.patient_id.clone(), visit.visit_date);
                    }
                }
            }
            Ok(newest)
        })
        .await
    }

    /// Newest failed-contact attempt per patient, for roster enrichment.
    pub async fn contact_recency(&self) -> ApiResult<HashMap<String, UnableToContact>> {
        let tree = self.unable_to_contact.clone();
        self.run(move || {
            let mut newest: HashMap<String, UnableToContact> = HashMap::new();
            for entry in tree.iter() {
                let (_, bytes) = entry?;
                let record: UnableToContact = decode(&bytes)?;
                match newest.get(&record.patient_id) {
                    Some(held) if held.attempt_date.as_str() >= record.attempt_date.as_str() => {}
                    _ => {
                        newest.insert(record.patient_id.clone(), record);
                    }
                }
            }
            Ok(newest)
        })
        .await
    }
}
