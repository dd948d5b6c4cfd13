// models/src/lib.rs

//! Shared domain model for the home-nursing visit documentation service:
//! the nurse identity, patient records, the three encounter kinds (visits,
//! interventions, unable-to-contact attempts), monthly report shapes, and
//! the error taxonomy every crate in the workspace speaks.

pub mod errors;
pub mod intervention;
pub mod nurse;
pub mod patient;
pub mod report;
pub mod unable_to_contact;
pub mod visit;

pub use errors::{ApiError, ApiResult};
pub use intervention::{Intervention, InterventionDetail, InterventionView, NewIntervention, SafetyChecks};
pub use nurse::{LoginRequest, NewNurse, Nurse, NurseProfile};
pub use patient::{
    AssignNurses, LastContact, NewPatient, Patient, PatientUpdate, PatientView, PermanentInfo,
};
pub use report::{MonthlyReport, MonthlyReportRequest, ReportSummary, ReportVisit, VisitsByType};
pub use unable_to_contact::{NewUnableToContact, UnableToContact, UnableToContactView};
pub use visit::{NewVisit, Visit, VisitStatus, VisitView, VitalSigns};

use chrono::{SecondsFormat, Utc};

/// Current UTC time as an RFC 3339 string with microsecond precision and an
/// explicit `+00:00` offset. Every stored timestamp uses this format so that
/// lexicographic comparison of date strings matches chronological order.
pub fn utc_now_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Freshly issued opaque identifier for a stored document.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
