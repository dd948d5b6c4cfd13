// models/src/intervention.rs

use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};

/// Type-specific clinical payload. Internally tagged on `intervention_type`
/// and flattened into the record, so the wire shape stays flat while each
/// variant carries only its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intervention_type", rename_all = "snake_case")]
pub enum InterventionDetail {
    Injection {
        medication: String,
        dose: String,
        route: String,
        site: String,
        lot_number: Option<String>,
    },
    Test {
        test_name: String,
        specimen: Option<String>,
        result: Option<String>,
        #[serde(default)]
        sent_to_lab: bool,
    },
    Treatment {
        treatment_name: String,
        description: Option<String>,
        duration_minutes: Option<u32>,
    },
    Procedure {
        procedure_name: String,
        outcome: Option<String>,
        #[serde(default)]
        tolerated: bool,
    },
}

/// Pre-intervention safety checklist. Recorded as entered; nothing blocks an
/// intervention with unchecked boxes, the record just shows them unchecked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyChecks {
    #[serde(default)]
    pub identity_verified: bool,
    #[serde(default)]
    pub allergies_reviewed: bool,
    #[serde(default)]
    pub hand_hygiene: bool,
    #[serde(default)]
    pub supplies_verified: bool,
    #[serde(default)]
    pub site_inspected: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIntervention {
    pub patient_id: String,
    pub intervention_date: Option<String>,
    pub location: Option<String>,
    pub body_temperature: Option<String>,
    pub mood_scale: Option<u8>,
    #[serde(flatten)]
    pub detail: InterventionDetail,
    #[serde(default)]
    pub safety_checks: SafetyChecks,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub follow_up_required: bool,
    pub follow_up_date: Option<String>,
    #[serde(default)]
    pub caregiver_present: bool,
    pub persons_present: Option<String>,
    pub notes: Option<String>,
}

impl NewIntervention {
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(scale) = self.mood_scale {
            if !(1..=5).contains(&scale) {
                return Err(ApiError::Validation(
                    "mood_scale must be between 1 and 5".into(),
                ));
            }
        }
        Ok(())
    }
}

/// A recorded intervention. Immutable once written, same as visits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub id: String,
    pub patient_id: String,
    pub nurse_id: String,
    pub intervention_date: String,
    pub location: Option<String>,
    pub body_temperature: Option<String>,
    pub mood_scale: Option<u8>,
    #[serde(flatten)]
    pub detail: InterventionDetail,
    #[serde(default)]
    pub safety_checks: SafetyChecks,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub follow_up_required: bool,
    pub follow_up_date: Option<String>,
    #[serde(default)]
    pub caregiver_present: bool,
    pub persons_present: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Intervention {
    pub fn from_new(new: NewIntervention, nurse_id: &str) -> Self {
        let created_at = crate::utc_now_string();
        Intervention {
            id: crate::new_id(),
            patient_id: new.patient_id,
            nurse_id: nurse_id.to_string(),
            intervention_date: new.intervention_date.unwrap_or_else(|| created_at.clone()),
            location: new.location,
            body_temperature: new.body_temperature,
            mood_scale: new.mood_scale,
            detail: new.detail,
            safety_checks: new.safety_checks,
            completed: new.completed,
            follow_up_required: new.follow_up_required,
            follow_up_date: new.follow_up_date,
            caregiver_present: new.caregiver_present,
            persons_present: new.persons_present,
            notes: new.notes,
            created_at,
        }
    }
}

/// Read projection with patient identity resolved at read time. Date of
/// birth rides along because injection records are cross-checked against it
/// on review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionView {
    #[serde(flatten)]
    pub intervention: Intervention,
    pub patient_name: String,
    pub patient_date_of_birth: Option<String>,
}
