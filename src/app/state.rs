//! App state - pure data structure with no network logic

use crate::messages::ui_events::{InputContext, NewPatientField, Popup, RegisterField, Screen};
use crate::messages::render::{RegistrationView, RenderState};
use crate::models::{
    OutcomeTag, Patient, PatientSubmission, SessionAlert, SessionRecord, TreatmentOption, User,
};
use crate::storage::SessionStore;

/// Severity of a modal alert
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Warning,
    Danger,
}

/// Modal message the user must dismiss
#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    pub fn info(message: impl Into<String>) -> Self {
        Alert { level: AlertLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Alert { level: AlertLevel::Warning, message: message.into() }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Alert { level: AlertLevel::Danger, message: message.into() }
    }
}

/// What is known about the selected patient's previous visit
#[derive(Clone, Debug, PartialEq, Default)]
pub enum LastSession {
    #[default]
    Loading,
    Previous(SessionRecord),
    FirstVisit,
    /// Lookup failed; nothing is shown
    Unavailable,
}

/// Transient selection on the registration screen
#[derive(Clone, Debug, PartialEq, Default)]
pub struct RegistrationDraft {
    pub patient_id: String,
    /// Index into the treatment list
    pub treatment: Option<usize>,
    pub outcome: Option<OutcomeTag>,
    pub note: String,
    pub focus: RegisterField,
    pub last_session: LastSession,
}

/// Shown after a session was registered
#[derive(Clone, Debug, PartialEq)]
pub struct SuccessSummary {
    pub patient_name: String,
    pub session_number: String,
    pub date: String,
    pub time: String,
    pub practitioner: String,
    pub alert: Option<SessionAlert>,
}

/// New patient form contents
#[derive(Clone, Debug, PartialEq, Default)]
pub struct NewPatientForm {
    pub last_name: String,
    pub first_name: String,
    pub national_id: String,
    pub insurer: String,
    pub authorized_sessions: String,
    pub member_number: String,
    pub plan: String,
    pub referring_doctor: String,
    pub diagnosis: String,
    pub phone: String,
}

impl NewPatientForm {
    pub fn field(&self, field: NewPatientField) -> &str {
        match field {
            NewPatientField::LastName => &self.last_name,
            NewPatientField::FirstName => &self.first_name,
            NewPatientField::NationalId => &self.national_id,
            NewPatientField::Insurer => &self.insurer,
            NewPatientField::AuthorizedSessions => &self.authorized_sessions,
            NewPatientField::MemberNumber => &self.member_number,
            NewPatientField::Plan => &self.plan,
            NewPatientField::ReferringDoctor => &self.referring_doctor,
            NewPatientField::Diagnosis => &self.diagnosis,
            NewPatientField::Phone => &self.phone,
        }
    }

    pub fn field_mut(&mut self, field: NewPatientField) -> &mut String {
        match field {
            NewPatientField::LastName => &mut self.last_name,
            NewPatientField::FirstName => &mut self.first_name,
            NewPatientField::NationalId => &mut self.national_id,
            NewPatientField::Insurer => &mut self.insurer,
            NewPatientField::AuthorizedSessions => &mut self.authorized_sessions,
            NewPatientField::MemberNumber => &mut self.member_number,
            NewPatientField::Plan => &mut self.plan,
            NewPatientField::ReferringDoctor => &mut self.referring_doctor,
            NewPatientField::Diagnosis => &mut self.diagnosis,
            NewPatientField::Phone => &mut self.phone,
        }
    }

    /// Validate and build the request payload
    pub fn to_submission(&self, email: &str) -> Result<PatientSubmission, String> {
        let missing = NewPatientField::ALL
            .iter()
            .any(|f| f.is_required() && self.field(*f).trim().is_empty());
        if missing {
            return Err("Fill in the required fields (*)".to_string());
        }

        let authorized_sessions = self
            .authorized_sessions
            .trim()
            .parse::<u32>()
            .map_err(|_| "Authorized sessions must be a whole number".to_string())?;

        Ok(PatientSubmission {
            email: email.to_string(),
            last_name: self.last_name.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            national_id: self.national_id.trim().to_string(),
            insurer: self.insurer.trim().to_string(),
            authorized_sessions,
            member_number: self.member_number.trim().to_string(),
            plan: self.plan.trim().to_string(),
            referring_doctor: self.referring_doctor.trim().to_string(),
            diagnosis: self.diagnosis.trim().to_string(),
            phone: self.phone.trim().to_string(),
        })
    }
}

/// Ids of in-flight requests, one slot per triggering control
#[derive(Clone, Debug, Default)]
pub struct PendingRequests {
    pub login: Option<u64>,
    pub bootstrap: Option<u64>,
    pub last_sessions: Option<u64>,
    pub confirm: Option<u64>,
    pub new_patient: Option<u64>,
}

/// Main application state
pub struct AppState {
    pub screen: Screen,
    pub user: Option<User>,

    // Reference data
    pub patients: Vec<Patient>,
    pub treatments: Vec<TreatmentOption>,
    /// Reference data was served from the offline cache
    pub offline: bool,

    // Login
    pub login_email: String,
    pub login_error: Option<String>,

    // Search
    pub search_query: String,
    pub search_results: Vec<String>,
    pub selected_result: usize,

    // Registration
    pub registration: Option<RegistrationDraft>,
    pub success: Option<SuccessSummary>,

    // New patient
    pub new_patient: NewPatientForm,
    pub new_patient_field: NewPatientField,

    // Popups
    pub alert: Option<Alert>,
    pub confirm_logout: bool,

    // Requests
    pub next_request_id: u64,
    pub pending: PendingRequests,

    pub device_tag: String,
    pub session_store: SessionStore,
}

impl AppState {
    /// Build the initial state; a saved session skips the login screen
    pub fn new(session_store: SessionStore, device_tag: impl Into<String>) -> Self {
        let user = session_store.load();
        let screen = if user.is_some() { Screen::Loading } else { Screen::Login };

        AppState {
            screen,
            user,
            patients: Vec::new(),
            treatments: Vec::new(),
            offline: false,
            login_email: String::new(),
            login_error: None,
            search_query: String::new(),
            search_results: Vec::new(),
            selected_result: 0,
            registration: None,
            success: None,
            new_patient: NewPatientForm::default(),
            new_patient_field: NewPatientField::default(),
            alert: None,
            confirm_logout: false,
            next_request_id: 1,
            pending: PendingRequests::default(),
            device_tag: device_tag.into(),
            session_store,
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    /// Patient on the registration screen
    pub fn selected_patient(&self) -> Option<&Patient> {
        self.registration
            .as_ref()
            .and_then(|draft| self.patient(&draft.patient_id))
    }

    /// Treatment and outcome chosen, and no confirm in flight
    pub fn can_confirm(&self) -> bool {
        self.pending.confirm.is_none()
            && self
                .registration
                .as_ref()
                .map(|d| d.treatment.is_some() && d.outcome.is_some())
                .unwrap_or(false)
    }

    pub fn popup(&self) -> Popup {
        if self.alert.is_some() {
            Popup::Alert
        } else if self.confirm_logout {
            Popup::ConfirmLogout
        } else {
            Popup::None
        }
    }

    pub fn input_context(&self) -> InputContext {
        InputContext {
            screen: self.screen,
            register_field: self
                .registration
                .as_ref()
                .map(|d| d.focus)
                .unwrap_or_default(),
            new_patient_field: self.new_patient_field,
            popup: self.popup(),
            search_empty: self.search_query.is_empty(),
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let registration = self.registration.as_ref().and_then(|draft| {
            self.patient(&draft.patient_id).map(|patient| RegistrationView {
                patient: patient.clone(),
                treatments: self.treatments.clone(),
                draft: draft.clone(),
                can_confirm: self.can_confirm(),
                busy: self.pending.confirm.is_some(),
            })
        });

        RenderState {
            input: self.input_context(),
            user: self.user.clone(),
            offline: self.offline,
            patient_count: self.patients.len(),
            login_email: self.login_email.clone(),
            login_error: self.login_error.clone(),
            login_busy: self.pending.login.is_some(),
            search_query: self.search_query.clone(),
            search_results: self
                .search_results
                .iter()
                .filter_map(|id| self.patient(id).cloned())
                .collect(),
            selected_result: self.selected_result,
            registration,
            success: self.success.clone(),
            new_patient: self.new_patient.clone(),
            new_patient_busy: self.pending.new_patient.is_some(),
            alert: self.alert.clone(),
        }
    }
}
