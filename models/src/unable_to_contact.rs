// models/src/unable_to_contact.rs

use serde::{Deserialize, Serialize};

/// Failed-contact record. `whereabouts` stays the raw submitted code so the
/// record round-trips; the display phrase is derived on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnableToContact {
    pub id: String,
    pub patient_id: String,
    pub nurse_id: String,
    pub attempted_visit_type: String,
    pub attempt_date: String,
    pub attempt_location: Option<String>,
    #[serde(default)]
    pub person_reached: bool,
    pub reached_by: Option<String>,
    pub whereabouts: String,
    pub whereabouts_other: Option<String>,
    #[serde(default)]
    pub follow_up_required: bool,
    pub follow_up_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUnableToContact {
    pub attempted_visit_type: String,
    pub attempt_date: Option<String>,
    pub attempt_location: Option<String>,
    #[serde(default)]
    pub person_reached: bool,
    pub reached_by: Option<String>,
    pub whereabouts: String,
    pub whereabouts_other: Option<String>,
    #[serde(default)]
    pub follow_up_required: bool,
    pub follow_up_date: Option<String>,
    pub notes: Option<String>,
}

impl UnableToContact {
    pub fn from_new(new: NewUnableToContact, patient_id: &str, nurse_id: &str) -> Self {
        let created_at = crate::utc_now_string();
        UnableToContact {
            id: crate::new_id(),
            patient_id: patient_id.to_string(),
            nurse_id: nurse_id.to_string(),
            attempted_visit_type: new.attempted_visit_type,
            attempt_date: new.attempt_date.unwrap_or_else(|| created_at.clone()),
            attempt_location: new.attempt_location,
            person_reached: new.person_reached,
            reached_by: new.reached_by,
            whereabouts: new.whereabouts,
            whereabouts_other: new.whereabouts_other,
            follow_up_required: new.follow_up_required,
            follow_up_date: new.follow_up_date,
            notes: new.notes,
            created_at,
        }
    }

    /// Human-readable reason for roster and report rows. Unrecognized codes
    /// map to "Unknown" rather than leaking raw input into reports.
    pub fn whereabouts_reason(&self) -> String {
        match self.whereabouts.as_str() {
            "admitted" => "Hospitalized".to_string(),
            "moved_temporarily" => "Moved Temporarily".to_string(),
            "moved_permanently" => "Moved Permanently".to_string(),
            "vacation" => "On Vacation".to_string(),
            "deceased" => "Deceased".to_string(),
            "other" => self
                .whereabouts_other
                .clone()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| "Other".to_string()),
            _ => "Unknown".to_string(),
        }
    }
}

/// Read projection with the patient's display name resolved at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnableToContactView {
    #[serde(flatten)]
    pub record: UnableToContact,
    pub patient_name: String,
}
