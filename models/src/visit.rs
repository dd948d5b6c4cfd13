// models/src/visit.rs

use serde::{Deserialize, Serialize};

/// Vital-signs snapshot. All measurements are kept as the free-form strings
/// nurses enter in the field ("98.6", "120/80 split across two fields"), not
/// parsed numbers: the record is a clinical transcript, not a computation
/// input, and must read back exactly as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    pub weight: Option<String>,
    pub body_temperature: Option<String>,
    pub blood_pressure_systolic: Option<String>,
    pub blood_pressure_diastolic: Option<String>,
    pub pulse_oximeter: Option<String>,
    pub pulse: Option<String>,
    pub respirations: Option<String>,
    pub repeat_blood_pressure_systolic: Option<String>,
    pub repeat_blood_pressure_diastolic: Option<String>,
    pub bp_abnormal: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAssessment {
    pub general_appearance: Option<String>,
    pub skin_assessment: Option<String>,
    pub mobility_level: Option<String>,
    pub speech_level: Option<String>,
    pub alert_oriented_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadToToeAssessment {
    pub head_neck: Option<String>,
    pub eyes_vision: Option<String>,
    pub ears_hearing: Option<String>,
    pub nose_nasal_cavity: Option<String>,
    pub mouth_teeth_oral_cavity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GastrointestinalAssessment {
    pub last_bowel_movement: Option<String>,
    pub bowel_sounds: Option<String>,
    pub nutritional_diet: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenitoUrinaryAssessment {
    pub toileting_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RespiratoryAssessment {
    pub lung_sounds: Option<String>,
    pub oxygen_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndocrineAssessment {
    pub is_diabetic: Option<bool>,
    pub diabetic_notes: Option<String>,
    pub blood_sugar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangesSinceLastVisit {
    pub medication_changes: Option<String>,
    pub diagnosis_changes: Option<String>,
    pub er_urgent_care_visits: Option<String>,
    pub upcoming_appointments: Option<String>,
}

/// Draft/completed marker. A visit without one is simply final the moment it
/// is written, which is how most entries arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    Draft,
    Completed,
}

fn default_visit_type() -> String {
    "nurse_visit".to_string()
}

/// Visit creation payload. Every clinical sub-section defaults to empty so a
/// vitals-only or daily-note entry does not have to send the full form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewVisit {
    pub visit_date: Option<String>,
    #[serde(default = "default_visit_type")]
    pub visit_type: String,
    pub organization: Option<String>,
    #[serde(default)]
    pub vital_signs: VitalSigns,
    #[serde(default)]
    pub physical_assessment: PhysicalAssessment,
    #[serde(default)]
    pub head_to_toe: HeadToToeAssessment,
    #[serde(default)]
    pub gastrointestinal: GastrointestinalAssessment,
    #[serde(default)]
    pub genito_urinary: GenitoUrinaryAssessment,
    #[serde(default)]
    pub respiratory: RespiratoryAssessment,
    #[serde(default)]
    pub endocrine: EndocrineAssessment,
    #[serde(default)]
    pub changes_since_last: ChangesSinceLastVisit,
    pub overall_health_status: Option<String>,
    pub nurse_notes: Option<String>,
    pub daily_note_content: Option<String>,
    pub status: Option<VisitStatus>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// A visit as stored: an immutable clinical snapshot. There is no update
/// path anywhere in the system, only create/read/delete.
///
/// `visit_type` stays a free string rather than an enum: unrecognized values
/// must survive storage verbatim and are only folded into a recognized
/// bucket at report time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub patient_id: String,
    pub nurse_id: String,
    pub visit_date: String,
    pub visit_type: String,
    pub organization: Option<String>,
    pub vital_signs: VitalSigns,
    pub physical_assessment: PhysicalAssessment,
    pub head_to_toe: HeadToToeAssessment,
    pub gastrointestinal: GastrointestinalAssessment,
    pub genito_urinary: GenitoUrinaryAssessment,
    pub respiratory: RespiratoryAssessment,
    pub endocrine: EndocrineAssessment,
    pub changes_since_last: ChangesSinceLastVisit,
    pub overall_health_status: Option<String>,
    pub nurse_notes: Option<String>,
    pub daily_note_content: Option<String>,
    pub status: Option<VisitStatus>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub created_at: String,
}

impl Visit {
    /// Stamps identity and timestamps onto a creation payload. A missing
    /// `visit_date` means "now".
    pub fn from_new(new: NewVisit, patient_id: &str, nurse_id: &str) -> Self {
        let created_at = crate::utc_now_string();
        Visit {
            id: crate::new_id(),
            patient_id: patient_id.to_string(),
            nurse_id: nurse_id.to_string(),
            visit_date: new.visit_date.unwrap_or_else(|| created_at.clone()),
            visit_type: new.visit_type,
            organization: new.organization,
            vital_signs: new.vital_signs,
            physical_assessment: new.physical_assessment,
            head_to_toe: new.head_to_toe,
            gastrointestinal: new.gastrointestinal,
            genito_urinary: new.genito_urinary,
            respiratory: new.respiratory,
            endocrine: new.endocrine,
            changes_since_last: new.changes_since_last,
            overall_health_status: new.overall_health_status,
            nurse_notes: new.nurse_notes,
            daily_note_content: new.daily_note_content,
            status: new.status,
            attachments: new.attachments,
            created_at,
        }
    }
}

/// Single-visit read projection: the stored fields plus the patient's
/// display name resolved at read time, so a later rename shows up
/// retroactively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitView {
    #[serde(flatten)]
    pub visit: Visit,
    pub patient_name: String,
}
