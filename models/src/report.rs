// models/src/report.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};
use crate::visit::Visit;

#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyReportRequest {
    pub year: i32,
    pub month: u32,
    pub patient_id: Option<String>,
    pub organization: Option<String>,
}

/// Inclusive report window as ISO-8601 strings, compared lexicographically
/// against stored dates. The end bound carries max microseconds so any
/// timestamp on the last day sorts inside it. When the window would reach
/// past `now` (the current month, or a future one) the end clamps to `now`,
/// which drops future-dated placeholder entries.
pub fn month_window(year: i32, month: u32, now: &str) -> ApiResult<(String, String)> {
    if !(1..=12).contains(&month) {
        return Err(ApiError::Validation(
            "month must be between 1 and 12".into(),
        ));
    }
    let start = format!("{year:04}-{month:02}-01T00:00:00+00:00");
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last_day = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .ok_or_else(|| ApiError::Validation("year out of range".into()))?;
    let mut end = format!("{}T23:59:59.999999+00:00", last_day.format("%Y-%m-%d"));
    if end.as_str() > now {
        end = now.to_string();
    }
    Ok((start, end))
}

/// A visit row enriched with the patient's display name for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportVisit {
    #[serde(flatten)]
    pub visit: Visit,
    pub patient_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VisitsByType {
    pub nurse_visits: Vec<ReportVisit>,
    pub vitals_only: Vec<ReportVisit>,
    pub daily_notes: Vec<ReportVisit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_visits: usize,
    pub nurse_visits: usize,
    pub vitals_only: usize,
    pub daily_notes: usize,
    pub unique_patients: usize,
    pub by_organization: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub summary: ReportSummary,
    pub visits: Vec<ReportVisit>,
    pub visits_by_type: VisitsByType,
}

impl MonthlyReport {
    /// Buckets and tallies an already-filtered, already-enriched visit list.
    /// Unrecognized visit types fold into the nurse-visit bucket so the
    /// bucket counts always sum to the total. Visits without an organization
    /// tally under "Unspecified".
    pub fn assemble(visits: Vec<ReportVisit>) -> Self {
        let mut visits_by_type = VisitsByType::default();
        let mut by_organization: BTreeMap<String, usize> = BTreeMap::new();
        let mut patients: BTreeSet<&str> = BTreeSet::new();
        for row in &visits {
            patients.insert(row.visit.patient_id.as_str());
            let organization = row
                .visit
                .organization
                .clone()
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| "Unspecified".to_string());
            *by_organization.entry(organization).or_insert(0) += 1;
            match row.visit.visit_type.as_str() {
                "vitals_only" => visits_by_type.vitals_only.push(row.clone()),
                "daily_note" => visits_by_type.daily_notes.push(row.clone()),
                _ => visits_by_type.nurse_visits.push(row.clone()),
            }
        }
        let summary = ReportSummary {
            total_visits: visits.len(),
            nurse_visits: visits_by_type.nurse_visits.len(),
            vitals_only: visits_by_type.vitals_only.len(),
            daily_notes: visits_by_type.daily_notes.len(),
            unique_patients: patients.len(),
            by_organization,
        };
        MonthlyReport {
            summary,
            visits,
            visits_by_type,
        }
    }
}
