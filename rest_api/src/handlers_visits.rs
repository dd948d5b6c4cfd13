// rest_api/src/handlers_visits.rs

//! Visit documentation. Visits hang off a patient for create/list and are
//! addressed directly for get/delete. Creating one also refreshes the
//! patient's cached vitals for the roster screen.

use axum::Json;
use axum::extract::{Path, State};
use models::visit::{NewVisit, Visit, VisitView};
use models::{ApiError, ApiResult};
use security::AuthNurse;
use serde_json::{Value, json};

use crate::{AppState, Payload};

pub async fn create_visit(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(patient_id): Path<String>,
    Payload(new): Payload<NewVisit>,
) -> ApiResult<Json<Visit>> {
    let patient = state
        .store
        .patient_by_id(&patient_id)
        .await?
        .filter(|patient| patient.writable_by(&nurse.id, nurse.is_admin))
        .ok_or(ApiError::NotFound("Patient"))?;
    let visit = Visit::from_new(new, &patient.id, &nurse.id);
    let vitals = visit.vital_signs.clone();
    let visit = state.store.create_visit(visit).await?;
    state.store.touch_last_vitals(&patient.id, vitals).await?;
    Ok(Json(visit))
}

pub async fn list_visits(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<Vec<Visit>>> {
    state
        .store
        .patient_by_id(&patient_id)
        .await?
        .filter(|patient| patient.writable_by(&nurse.id, nurse.is_admin))
        .ok_or(ApiError::NotFound("Patient"))?;
    let visits = state.store.visits_for_patient(&patient_id).await?;
    Ok(Json(visits))
}

pub async fn get_visit(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(id): Path<String>,
) -> ApiResult<Json<VisitView>> {
    let visit = state
        .store
        .visit_scoped(&id, &nurse.id, nurse.is_admin)
        .await?
        .ok_or(ApiError::NotFound("Visit"))?;
    let patient_name = state
        .store
        .patient_by_id(&visit.patient_id)
        .await?
        .map(|patient| patient.full_name)
        .ok_or(ApiError::NotFound("Visit"))?;
    Ok(Json(VisitView {
        visit,
        patient_name,
    }))
}

pub async fn delete_visit(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .store
        .delete_visit(&id, &nurse.id, nurse.is_admin)
        .await?;
    Ok(Json(json!({ "message": "Visit deleted successfully" })))
}
