// rest_api/src/handlers_patients.rs

//! Patient roster CRUD. Reads are enriched with per-patient recency data;
//! ownership failures surface as 404 so callers cannot probe for records
//! they are not allowed to see.

use axum::Json;
use axum::extract::{Path, State};
use models::patient::{LastContact, NewPatient, Patient, PatientUpdate, PatientView};
use models::unable_to_contact::UnableToContact;
use models::{ApiError, ApiResult};
use security::AuthNurse;
use serde_json::{Value, json};

use crate::handlers_admin::vetted_assignment;
use crate::{AppState, Payload};

/// Derives the roster's failed-contact entry. It is shown only while it is
/// the latest word on the patient: a visit dated on or after the newest
/// attempt supersedes it.
fn last_contact(
    last_visit_date: &Option<String>,
    attempt: Option<&UnableToContact>,
) -> Option<LastContact> {
    let record = attempt?;
    let newer_than_visit = match last_visit_date {
        Some(visit_date) => record.attempt_date.as_str() > visit_date.as_str(),
        None => true,
    };
    newer_than_visit.then(|| LastContact {
        date: record.attempt_date.clone(),
        reason: record.whereabouts_reason(),
    })
}

pub async fn create_patient(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Payload(new): Payload<NewPatient>,
) -> ApiResult<Json<Patient>> {
    new.validate()?;
    let patient = Patient::from_new(new, &nurse.id);
    let patient = state.store.create_patient(patient).await?;
    Ok(Json(patient))
}

pub async fn list_patients(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
) -> ApiResult<Json<Vec<PatientView>>> {
    let patients = state
        .store
        .list_patients_visible(&nurse.id, nurse.is_admin)
        .await?;
    let visit_dates = state.store.visit_recency().await?;
    let attempts = state.store.contact_recency().await?;
    let views = patients
        .into_iter()
        .map(|patient| {
            let last_visit_date = visit_dates.get(&patient.id).cloned();
            let last_utc = last_contact(&last_visit_date, attempts.get(&patient.id));
            PatientView {
                patient,
                last_visit_date,
                last_utc,
            }
        })
        .collect();
    Ok(Json(views))
}

pub async fn get_patient(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(id): Path<String>,
) -> ApiResult<Json<PatientView>> {
    let patient = state
        .store
        .patient_by_id(&id)
        .await?
        .filter(|patient| patient.readable_by(&nurse.id, nurse.is_admin))
        .ok_or(ApiError::NotFound("Patient"))?;
    let last_visit_date = state
        .store
        .visits_for_patient(&id)
        .await?
        .first()
        .map(|visit| visit.visit_date.clone());
    let attempts = state.store.unable_to_contact_for_patient(&id).await?;
    let last_utc = last_contact(&last_visit_date, attempts.first());
    Ok(Json(PatientView {
        patient,
        last_visit_date,
        last_utc,
    }))
}

pub async fn update_patient(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(id): Path<String>,
    Payload(mut update): Payload<PatientUpdate>,
) -> ApiResult<Json<Patient>> {
    update.validate()?;
    let current = state
        .store
        .patient_by_id(&id)
        .await?
        .filter(|patient| patient.writable_by(&nurse.id, nurse.is_admin))
        .ok_or(ApiError::NotFound("Patient"))?;
    if nurse.is_admin {
        if let Some(ids) = update.assigned_nurses.take() {
            update.assigned_nurses = Some(vetted_assignment(&state.store, ids).await?);
        }
    }
    let patient = state
        .store
        .update_patient(&current.id, update, nurse.is_admin)
        .await?;
    Ok(Json(patient))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .store
        .patient_by_id(&id)
        .await?
        .filter(|patient| patient.writable_by(&nurse.id, nurse.is_admin))
        .ok_or(ApiError::NotFound("Patient"))?;
    state.store.delete_patient_cascade(&id).await?;
    Ok(Json(json!({ "message": "Patient deleted successfully" })))
}
