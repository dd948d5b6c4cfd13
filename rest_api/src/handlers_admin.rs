// rest_api/src/handlers_admin.rs

//! Admin-only surface: the nurse directory, role promotion, and patient
//! assignment. Every handler takes `AdminNurse`, so the role check happens
//! before any of this code runs.

use std::collections::HashSet;

use axum::Json;
use axum::extract::{Path, State};
use models::nurse::{Nurse, NurseProfile};
use models::patient::{AssignNurses, Patient, PatientUpdate};
use models::{ApiError, ApiResult};
use security::AdminNurse;
use storage::Store;

use crate::{AppState, Payload};

/// Drops duplicate ids while keeping first-seen order, then checks every
/// survivor against the nurse roster. Any unknown id fails the whole request.
pub(crate) async fn vetted_assignment(
    store: &Store,
    nurse_ids: Vec<String>,
) -> ApiResult<Vec<String>> {
    let mut seen = HashSet::new();
    let deduped: Vec<String> = nurse_ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();
    let unknown = store.unknown_nurse_ids(deduped.clone()).await?;
    if !unknown.is_empty() {
        return Err(ApiError::Validation(format!(
            "unknown nurse ids: {}",
            unknown.join(", ")
        )));
    }
    Ok(deduped)
}

pub async fn list_nurses(
    State(state): State<AppState>,
    AdminNurse(_admin): AdminNurse,
) -> ApiResult<Json<Vec<NurseProfile>>> {
    let nurses = state.store.list_nurses().await?;
    Ok(Json(nurses.iter().map(Nurse::profile).collect()))
}

pub async fn promote_nurse(
    State(state): State<AppState>,
    AdminNurse(_admin): AdminNurse,
    Path(id): Path<String>,
) -> ApiResult<Json<NurseProfile>> {
    let nurse = state.store.promote_nurse(&id).await?;
    Ok(Json(nurse.profile()))
}

pub async fn assign_nurses(
    State(state): State<AppState>,
    AdminNurse(_admin): AdminNurse,
    Path(id): Path<String>,
    Payload(assign): Payload<AssignNurses>,
) -> ApiResult<Json<Patient>> {
    let assigned = vetted_assignment(&state.store, assign.nurse_ids).await?;
    let update = PatientUpdate {
        assigned_nurses: Some(assigned),
        ..PatientUpdate::default()
    };
    let patient = state.store.update_patient(&id, update, true).await?;
    Ok(Json(patient))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{create_patient, get, post_json, register, send, test_app};

    #[tokio::test]
    async fn nurse_directory_requires_admin() {
        let app = test_app();
        let (admin_token, _) = register(&app, "admin@clinic.example").await;
        let (plain_token, _) = register(&app, "plain@clinic.example").await;

        let (status, body) = send(&app, get("/api/admin/nurses", Some(&plain_token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Admin access required");

        let (status, body) = send(&app, get("/api/admin/nurses", Some(&admin_token))).await;
        assert_eq!(status, StatusCode::OK);
        let emails: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|nurse| nurse["email"].as_str().unwrap())
            .collect();
        assert_eq!(emails, vec!["admin@clinic.example", "plain@clinic.example"]);
        assert!(body[0].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn promotion_opens_the_admin_surface() {
        let app = test_app();
        let (admin_token, _) = register(&app, "admin@clinic.example").await;
        let (plain_token, plain) = register(&app, "plain@clinic.example").await;
        let plain_id = plain["id"].as_str().unwrap();

        let uri = format!("/api/admin/nurses/{plain_id}/promote");
        let (status, body) = send(&app, post_json(&uri, Some(&admin_token), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_admin"], true);

        let (status, _) = send(&app, get("/api/admin/nurses", Some(&plain_token))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn promoting_a_missing_nurse_is_404() {
        let app = test_app();
        let (admin_token, _) = register(&app, "admin@clinic.example").await;
        let (status, body) = send(
            &app,
            post_json("/api/admin/nurses/ghost/promote", Some(&admin_token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Nurse not found");
    }

    #[tokio::test]
    async fn assignment_dedups_and_rejects_unknown_ids() {
        let app = test_app();
        let (admin_token, _) = register(&app, "admin@clinic.example").await;
        let (_, colleague) = register(&app, "colleague@clinic.example").await;
        let colleague_id = colleague["id"].as_str().unwrap();
        let patient = create_patient(&app, &admin_token, "Rosa Delgado").await;
        let uri = format!("/api/admin/patients/{}/assign", patient["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            post_json(
                &uri,
                Some(&admin_token),
                json!({ "nurse_ids": [colleague_id, "ghost"] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["message"].as_str().unwrap().contains("ghost"));

        let (status, body) = send(
            &app,
            post_json(
                &uri,
                Some(&admin_token),
                json!({ "nurse_ids": [colleague_id, colleague_id] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["assigned_nurses"], json!([colleague_id]));
    }

    #[tokio::test]
    async fn assignment_grants_read_access() {
        let app = test_app();
        let (admin_token, _) = register(&app, "admin@clinic.example").await;
        let (colleague_token, colleague) = register(&app, "colleague@clinic.example").await;
        let colleague_id = colleague["id"].as_str().unwrap();
        let patient = create_patient(&app, &admin_token, "Rosa Delgado").await;
        let patient_id = patient["id"].as_str().unwrap();

        let patient_uri = format!("/api/patients/{patient_id}");
        let (status, _) = send(&app, get(&patient_uri, Some(&colleague_token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let assign_uri = format!("/api/admin/patients/{patient_id}/assign");
        let (status, _) = send(
            &app,
            post_json(
                &assign_uri,
                Some(&admin_token),
                json!({ "nurse_ids": [colleague_id] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, get(&patient_uri, Some(&colleague_token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["full_name"], "Rosa Delgado");
    }
}
