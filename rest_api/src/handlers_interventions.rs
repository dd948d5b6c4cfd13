// rest_api/src/handlers_interventions.rs

//! Intervention records: injections, tests, treatments, and procedures.
//! Unlike visits, creation posts to a flat collection and carries the
//! patient id in the payload, matching how the documentation forms submit.

use axum::Json;
use axum::extract::{Path, State};
use models::intervention::{Intervention, InterventionView, NewIntervention};
use models::{ApiError, ApiResult};
use security::AuthNurse;
use serde_json::{Value, json};

use crate::{AppState, Payload};

pub async fn create_intervention(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Payload(new): Payload<NewIntervention>,
) -> ApiResult<Json<Intervention>> {
    new.validate()?;
    state
        .store
        .patient_by_id(&new.patient_id)
        .await?
        .filter(|patient| patient.writable_by(&nurse.id, nurse.is_admin))
        .ok_or(ApiError::NotFound("Patient"))?;
    let intervention = Intervention::from_new(new, &nurse.id);
    let intervention = state.store.create_intervention(intervention).await?;
    Ok(Json(intervention))
}

pub async fn list_interventions(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<Vec<Intervention>>> {
    state
        .store
        .patient_by_id(&patient_id)
        .await?
        .filter(|patient| patient.writable_by(&nurse.id, nurse.is_admin))
        .ok_or(ApiError::NotFound("Patient"))?;
    let interventions = state.store.interventions_for_patient(&patient_id).await?;
    Ok(Json(interventions))
}

pub async fn get_intervention(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(id): Path<String>,
) -> ApiResult<Json<InterventionView>> {
    let intervention = state
        .store
        .intervention_scoped(&id, &nurse.id, nurse.is_admin)
        .await?
        .ok_or(ApiError::NotFound("Intervention"))?;
    let patient = state
        .store
        .patient_by_id(&intervention.patient_id)
        .await?
        .ok_or(ApiError::NotFound("Intervention"))?;
    Ok(Json(InterventionView {
        intervention,
        patient_name: patient.full_name,
        patient_date_of_birth: patient.permanent_info.date_of_birth,
    }))
}

pub async fn delete_intervention(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .store
        .delete_intervention(&id, &nurse.id, nurse.is_admin)
        .await?;
    Ok(Json(json!({ "message": "Intervention deleted successfully" })))
}
