//! Render state - data structure sent from App layer to UI for rendering

use crate::app::state::{Alert, NewPatientForm, RegistrationDraft, SuccessSummary};
use crate::messages::ui_events::InputContext;
use crate::models::{Patient, TreatmentOption, User};

/// Registration screen contents
#[derive(Debug, Clone)]
pub struct RegistrationView {
    pub patient: Patient,
    pub treatments: Vec<TreatmentOption>,
    pub draft: RegistrationDraft,
    pub can_confirm: bool,
    pub busy: bool,
}

impl RegistrationView {
    pub fn selected_treatment(&self) -> Option<&TreatmentOption> {
        self.draft.treatment.and_then(|i| self.treatments.get(i))
    }
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    /// Screen, focus and popup; also drives key mapping
    pub input: InputContext,

    pub user: Option<User>,
    pub offline: bool,
    pub patient_count: usize,

    // Login
    pub login_email: String,
    pub login_error: Option<String>,
    pub login_busy: bool,

    // Search
    pub search_query: String,
    pub search_results: Vec<Patient>,
    pub selected_result: usize,

    // Registration
    pub registration: Option<RegistrationView>,
    pub success: Option<SuccessSummary>,

    // New patient
    pub new_patient: NewPatientForm,
    pub new_patient_busy: bool,

    // Popups
    pub alert: Option<Alert>,
}
