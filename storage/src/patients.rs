// storage/src/patients.rs

use models::patient::{Patient, PatientUpdate};
use models::visit::VitalSigns;
use models::{ApiError, ApiResult};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use tracing::debug;

use crate::{LIST_CAP, Store, decode, encode};

impl Store {
    pub async fn create_patient(&self, patient: Patient) -> ApiResult<Patient> {
        let patients = self.patients.clone();
        self.run(move || {
            let doc = encode(&patient)?;
            patients.insert(patient.id.as_bytes(), doc)?;
            debug!(patient_id = %patient.id, "created patient");
            Ok(patient)
        })
        .await
    }

    pub async fn patient_by_id(&self, id: &str) -> ApiResult<Option<Patient>> {
        let patients = self.patients.clone();
        let id = id.to_string();
        self.run(move || match patients.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        })
        .await
    }

    /// Roster rows visible to this nurse: created by them, assigned to them,
    /// or everything for an admin.
    pub async fn list_patients_visible(
        &self,
        nurse_id: &str,
        is_admin: bool,
    ) -> ApiResult<Vec<Patient>> {
        let patients = self.patients.clone();
        let nurse_id = nurse_id.to_string();
        self.run(move || {
            let mut rows: Vec<Patient> = Vec::new();
            for entry in patients.iter() {
                let (_, bytes) = entry?;
                let patient: Patient = decode(&bytes)?;
                if patient.readable_by(&nurse_id, is_admin) {
                    rows.push(patient);
                    if rows.len() == LIST_CAP {
                        break;
                    }
                }
            }
            Ok(rows)
        })
        .await
    }

    /// Partial update as one read-modify-write transaction. The caller has
    /// already settled ownership; this only answers "still exists?".
    pub async fn update_patient(
        &self,
        id: &str,
        update: PatientUpdate,
        allow_assignment: bool,
    ) -> ApiResult<Patient> {
        let patients = self.patients.clone();
        let id = id.to_string();
        self.run(move || {
            let outcome = patients.transaction(|tx| {
                let Some(bytes) = tx.get(id.as_bytes())? else {
                    return Err(ConflictableTransactionError::Abort(ApiError::NotFound(
                        "Patient",
                    )));
                };
                let mut patient: Patient =
                    decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                patient.apply_update(update.clone(), allow_assignment);
                let doc = encode(&patient).map_err(ConflictableTransactionError::Abort)?;
                tx.insert(patient.id.as_bytes(), doc)?;
                Ok(patient)
            });
            match outcome {
                Ok(patient) => {
                    debug!(patient_id = %patient.id, "updated patient");
                    Ok(patient)
                }
                Err(TransactionError::Abort(err)) => Err(err),
                Err(TransactionError::Storage(err)) => Err(err.into()),
            }
        })
        .await
    }

    /// Overwrites the parent's vitals cache after a visit insert. Runs as
    /// its own write after the visit transaction; a crash between the two
    /// leaves a stale display cache, nothing more. A patient deleted in the
    /// meantime makes this a no-op.
    pub async fn touch_last_vitals(
        &self,
        patient_id: &str,
        vitals: VitalSigns,
    ) -> ApiResult<()> {
        let patients = self.patients.clone();
        let patient_id = patient_id.to_string();
        self.run(move || {
            let outcome = patients.transaction(|tx| {
                let Some(bytes) = tx.get(patient_id.as_bytes())? else {
                    return Ok(());
                };
                let mut patient: Patient =
                    decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                patient.last_vitals = Some(vitals.clone());
                patient.updated_at = models::utc_now_string();
                let doc = encode(&patient).map_err(ConflictableTransactionError::Abort)?;
                tx.insert(patient.id.as_bytes(), doc)?;
                Ok(())
            });
            match outcome {
                Ok(()) => Ok(()),
                Err(TransactionError::Abort(err)) => Err(err),
                Err(TransactionError::Storage(err)) => Err(err.into()),
            }
        })
        .await
    }

    /// Hard delete with cascade. Children go first, then the patient row,
    /// then a sweep of the child trees catches rows that slipped in between
    /// the purge and the parent removal. An interruption can only leave a
    /// still-valid parent with fewer children, never orphans.
    pub async fn delete_patient_cascade(&self, id: &str) -> ApiResult<()> {
        let this = self.clone();
        let id = id.to_string();
        self.run(move || {
            let mut removed = 0;
            removed += remove_rows_for_patient(&this.visits, &id)?;
            removed += remove_rows_for_patient(&this.interventions, &id)?;
            removed += remove_rows_for_patient(&this.unable_to_contact, &id)?;
            if this.patients.remove(id.as_bytes())?.is_none() {
                return Err(ApiError::NotFound("Patient"));
            }
            removed += remove_rows_for_patient(&this.visits, &id)?;
            removed += remove_rows_for_patient(&this.interventions, &id)?;
            removed += remove_rows_for_patient(&this.unable_to_contact, &id)?;
            debug!(patient_id = %id, children_removed = removed, "deleted patient");
            Ok(())
        })
        .await
    }
}

/// Removes every row in `tree` whose document references `patient_id`.
fn remove_rows_for_patient(tree: &sled::Tree, patient_id: &str) -> ApiResult<usize> {
    let mut removed = 0;
    for entry in tree.iter() {
        let (key, bytes) = entry?;
        let doc: serde_json::Value = serde_json::from_slice(&bytes)?;
        if doc.get("patient_id").and_then(|v| v.as_str()) == Some(patient_id) {
            tree.remove(key)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::intervention::NewIntervention;
    use models::patient::NewPatient;
    use models::unable_to_contact::NewUnableToContact;
    use models::visit::NewVisit;

    fn new_patient(name: &str) -> NewPatient {
        NewPatient {
            full_name: name.to_string(),
            organization: Some("POSH-Able Living".to_string()),
            permanent_info: Default::default(),
        }
    }

    async fn seeded_patient(store: &Store, nurse_id: &str) -> Patient {
        store
            .create_patient(Patient::from_new(new_patient("Rosa Delgado"), nurse_id))
            .await
            .unwrap()
    }

    fn treatment(patient_id: &str) -> NewIntervention {
        serde_json::from_value(serde_json::json!({
            "patient_id": patient_id,
            "intervention_type": "treatment",
            "treatment_name": "wound care"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_then_get_round_trips_the_document() {
        let store = Store::temporary().unwrap();
        let created = seeded_patient(&store, "n-1").await;
        let fetched = store.patient_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(store.patient_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_visibility_follows_creator_assignment_and_role() {
        let store = Store::temporary().unwrap();
        let patient = seeded_patient(&store, "creator").await;
        store
            .update_patient(
                &patient.id,
                PatientUpdate {
                    assigned_nurses: Some(vec!["assigned".to_string()]),
                    ..PatientUpdate::default()
                },
                true,
            )
            .await
            .unwrap();

        let creator_view = store.list_patients_visible("creator", false).await.unwrap();
        let assigned_view = store.list_patients_visible("assigned", false).await.unwrap();
        let stranger_view = store.list_patients_visible("stranger", false).await.unwrap();
        let admin_view = store.list_patients_visible("stranger", true).await.unwrap();
        assert_eq!(creator_view.len(), 1);
        assert_eq!(assigned_view.len(), 1);
        assert!(stranger_view.is_empty());
        assert_eq!(admin_view.len(), 1);
    }

    #[tokio::test]
    async fn update_merges_only_present_fields() {
        let store = Store::temporary().unwrap();
        let patient = seeded_patient(&store, "n-1").await;
        let updated = store
            .update_patient(
                &patient.id,
                PatientUpdate {
                    full_name: Some("Rosa M. Delgado".to_string()),
                    ..PatientUpdate::default()
                },
                false,
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Rosa M. Delgado");
        assert_eq!(updated.organization, patient.organization);
        assert_eq!(updated.created_at, patient.created_at);
        assert!(updated.updated_at >= patient.updated_at);

        let err = store
            .update_patient("missing", PatientUpdate::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("Patient")));
    }

    #[tokio::test]
    async fn touch_last_vitals_overwrites_the_cache() {
        let store = Store::temporary().unwrap();
        let patient = seeded_patient(&store, "n-1").await;
        assert!(patient.last_vitals.is_none());

        let vitals = VitalSigns {
            pulse: Some("72".to_string()),
            ..VitalSigns::default()
        };
        store
            .touch_last_vitals(&patient.id, vitals.clone())
            .await
            .unwrap();
        let after = store.patient_by_id(&patient.id).await.unwrap().unwrap();
        assert_eq!(after.last_vitals, Some(vitals));

        let newer = VitalSigns {
            pulse: Some("80".to_string()),
            ..VitalSigns::default()
        };
        store
            .touch_last_vitals(&patient.id, newer.clone())
            .await
            .unwrap();
        let after = store.patient_by_id(&patient.id).await.unwrap().unwrap();
        assert_eq!(after.last_vitals, Some(newer));

        // vanished patient: the touch is a quiet no-op
        store
            .touch_last_vitals("missing", VitalSigns::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cascade_delete_spares_other_patients() {
        let store = Store::temporary().unwrap();
        let doomed = seeded_patient(&store, "n-1").await;
        let kept = store
            .create_patient(Patient::from_new(new_patient("Ben Okafor"), "n-1"))
            .await
            .unwrap();

        for patient in [&doomed, &kept] {
            store
                .create_visit(models::visit::Visit::from_new(
                    NewVisit::default(),
                    &patient.id,
                    "n-1",
                ))
                .await
                .unwrap();
            store
                .create_intervention(models::intervention::Intervention::from_new(
                    treatment(&patient.id),
                    "n-1",
                ))
                .await
                .unwrap();
            store
                .create_unable_to_contact(models::unable_to_contact::UnableToContact::from_new(
                    NewUnableToContact {
                        attempted_visit_type: "nurse_visit".into(),
                        attempt_date: None,
                        attempt_location: None,
                        person_reached: false,
                        reached_by: None,
                        whereabouts: "vacation".into(),
                        whereabouts_other: None,
                        follow_up_required: false,
                        follow_up_date: None,
                        notes: None,
                    },
                    &patient.id,
                    "n-1",
                ))
                .await
                .unwrap();
        }

        store.delete_patient_cascade(&doomed.id).await.unwrap();

        assert!(store.patient_by_id(&doomed.id).await.unwrap().is_none());
        assert_eq!(store.visits.len(), 1);
        assert_eq!(store.interventions.len(), 1);
        assert_eq!(store.unable_to_contact.len(), 1);
        assert_eq!(
            store
                .visits_for_patient(&kept.id)
                .await
                .unwrap()
                .len(),
            1
        );

        let err = store.delete_patient_cascade(&doomed.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("Patient")));
    }
}
