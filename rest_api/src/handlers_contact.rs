// rest_api/src/handlers_contact.rs

//! Unable-to-contact records: a failed visit attempt is documented with the
//! same care as a completed one, since the trail feeds both the roster and
//! follow-up scheduling.

use axum::Json;
use axum::extract::{Path, State};
use models::unable_to_contact::{NewUnableToContact, UnableToContact, UnableToContactView};
use models::{ApiError, ApiResult};
use security::AuthNurse;
use serde_json::{Value, json};

use crate::{AppState, Payload};

pub async fn create_record(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(patient_id): Path<String>,
    Payload(new): Payload<NewUnableToContact>,
) -> ApiResult<Json<UnableToContact>> {
    let patient = state
        .store
        .patient_by_id(&patient_id)
        .await?
        .filter(|patient| patient.writable_by(&nurse.id, nurse.is_admin))
        .ok_or(ApiError::NotFound("Patient"))?;
    let record = UnableToContact::from_new(new, &patient.id, &nurse.id);
    let record = state.store.create_unable_to_contact(record).await?;
    Ok(Json(record))
}

pub async fn list_records(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<Vec<UnableToContact>>> {
    state
        .store
        .patient_by_id(&patient_id)
        .await?
        .filter(|patient| patient.writable_by(&nurse.id, nurse.is_admin))
        .ok_or(ApiError::NotFound("Patient"))?;
    let records = state.store.unable_to_contact_for_patient(&patient_id).await?;
    Ok(Json(records))
}

pub async fn get_record(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(id): Path<String>,
) -> ApiResult<Json<UnableToContactView>> {
    let record = state
        .store
        .unable_to_contact_scoped(&id, &nurse.id, nurse.is_admin)
        .await?
        .ok_or(ApiError::NotFound("Unable to contact record"))?;
    let patient_name = state
        .store
        .patient_by_id(&record.patient_id)
        .await?
        .map(|patient| patient.full_name)
        .ok_or(ApiError::NotFound("Unable to contact record"))?;
    Ok(Json(UnableToContactView {
        record,
        patient_name,
    }))
}

pub async fn delete_record(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .store
        .delete_unable_to_contact(&id, &nurse.id, nurse.is_admin)
        .await?;
    Ok(Json(json!({
        "message": "Unable to contact record deleted successfully"
    })))
}
