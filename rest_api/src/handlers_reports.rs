// rest_api/src/handlers_reports.rs

//! Monthly activity report over the requesting nurse's own visits. The
//! window query, optional patient/organization filters, and the name join
//! all happen here; bucketing and tallying live in the report model.

use std::collections::HashMap;

use axum::Json;
use axum::extract::State;
use models::report::{MonthlyReport, MonthlyReportRequest, ReportVisit, month_window};
use models::{ApiResult, utc_now_string};
use security::AuthNurse;

use crate::{AppState, Payload};

pub async fn monthly_report(
    State(state): State<AppState>,
    AuthNurse(nurse): AuthNurse,
    Payload(request): Payload<MonthlyReportRequest>,
) -> ApiResult<Json<MonthlyReport>> {
    let now = utc_now_string();
    let (start, end) = month_window(request.year, request.month, &now)?;
    let mut visits = state
        .store
        .visits_for_nurse_window(&nurse.id, &start, &end)
        .await?;
    if let Some(patient_id) = &request.patient_id {
        visits.retain(|visit| visit.patient_id == *patient_id);
    }
    if let Some(organization) = &request.organization {
        visits.retain(|visit| visit.organization.as_deref() == Some(organization.as_str()));
    }

    // One name lookup per distinct patient, not per visit. A patient deleted
    // since the visit was written cannot happen (deletes cascade), but the
    // join still degrades to a placeholder rather than failing the report.
    let mut names: HashMap<String, String> = HashMap::new();
    for visit in &visits {
        if !names.contains_key(&visit.patient_id) {
            let name = state
                .store
                .patient_by_id(&visit.patient_id)
                .await?
                .map(|patient| patient.full_name)
                .unwrap_or_else(|| "Unknown".to_string());
            names.insert(visit.patient_id.clone(), name);
        }
    }
    let rows = visits
        .into_iter()
        .map(|visit| {
            let patient_name = names
                .get(&visit.patient_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string());
            ReportVisit {
                visit,
                patient_name,
            }
        })
        .collect();
    Ok(Json(MonthlyReport::assemble(rows)))
}
