// models/src/patient.rs

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{ApiError, ApiResult};
use crate::visit::VitalSigns;

// Older clients serialize blank lists as JSON null. Read those as empty
// instead of rejecting the payload.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// Slow-changing demographic and clinical background. Nurses fill this in
/// piecemeal over several visits, so every field is optional and list fields
/// default to empty (a missing key and an explicit null both read as empty).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermanentInfo {
    pub race: Option<String>,
    pub gender: Option<String>,
    pub height: Option<String>,
    pub home_address: Option<String>,
    pub caregiver_name: Option<String>,
    pub caregiver_phone: Option<String>,
    pub date_of_birth: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub medications: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub allergies: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub medical_diagnoses: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub psychiatric_diagnoses: Vec<String>,
    pub adult_day_program_name: Option<String>,
    pub adult_day_program_address: Option<String>,
    pub visit_frequency: Option<String>,
}

/// Patient roster entry. `nurse_id` is the creating nurse and never changes;
/// `assigned_nurses` grants additional read access. `last_vitals` is a
/// denormalized copy of the most recently created visit's vitals so roster
/// screens avoid a per-patient visit scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub full_name: String,
    pub organization: Option<String>,
    #[serde(default)]
    pub permanent_info: PermanentInfo,
    pub nurse_id: String,
    #[serde(default)]
    pub assigned_nurses: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_vitals: Option<VitalSigns>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub full_name: String,
    pub organization: Option<String>,
    #[serde(default)]
    pub permanent_info: PermanentInfo,
}

impl NewPatient {
    pub fn validate(&self) -> ApiResult<()> {
        if self.full_name.trim().is_empty() {
            return Err(ApiError::Validation("full_name must not be empty".into()));
        }
        Ok(())
    }
}

/// Partial update. Absent fields are left untouched; `assigned_nurses` is
/// honored only when the caller is an admin. `organization` is fixed at
/// creation and deliberately has no update path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
    pub full_name: Option<String>,
    pub permanent_info: Option<PermanentInfo>,
    pub assigned_nurses: Option<Vec<String>>,
}

impl PatientUpdate {
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(name) = &self.full_name {
            if name.trim().is_empty() {
                return Err(ApiError::Validation("full_name must not be empty".into()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignNurses {
    pub nurse_ids: Vec<String>,
}

impl Patient {
    pub fn from_new(new: NewPatient, nurse_id: &str) -> Self {
        let now = crate::utc_now_string();
        Patient {
            id: crate::new_id(),
            full_name: new.full_name,
            organization: new.organization,
            permanent_info: new.permanent_info,
            nurse_id: nurse_id.to_string(),
            assigned_nurses: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
            last_vitals: None,
        }
    }

    /// Applies a partial update in place and bumps `updated_at`.
    /// `allow_assignment` gates the admin-only `assigned_nurses` field.
    pub fn apply_update(&mut self, update: PatientUpdate, allow_assignment: bool) {
        if let Some(full_name) = update.full_name {
            self.full_name = full_name;
        }
        if let Some(permanent_info) = update.permanent_info {
            self.permanent_info = permanent_info;
        }
        if allow_assignment {
            if let Some(assigned) = update.assigned_nurses {
                self.assigned_nurses = assigned;
            }
        }
        self.updated_at = crate::utc_now_string();
    }

    /// Read access: creator, any assigned nurse, or an admin.
    pub fn readable_by(&self, nurse_id: &str, is_admin: bool) -> bool {
        is_admin || self.nurse_id == nurse_id || self.assigned_nurses.iter().any(|n| n == nurse_id)
    }

    /// Write access is narrower: only the creator or an admin.
    pub fn writable_by(&self, nurse_id: &str, is_admin: bool) -> bool {
        is_admin || self.nurse_id == nurse_id
    }
}

/// Last failed-contact attempt, surfaced on the roster next to the last
/// successful visit so the two can be compared at a glance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastContact {
    pub date: String,
    pub reason: String,
}

/// Roster read projection: the stored record plus per-patient recency data
/// computed at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientView {
    #[serde(flatten)]
    pub patient: Patient,
    pub last_visit_date: Option<String>,
    pub last_utc: Option<LastContact>,
}
