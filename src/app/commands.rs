//! Command handlers - business logic for processing UI events

use crate::app::state::{
    Alert, AppState, LastSession, NewPatientForm, RegistrationDraft, SuccessSummary,
};
use crate::messages::ui_events::{NewPatientField, RegisterField, Screen};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::{OutcomeTag, SessionSubmission, User};
use crate::search::search_patients;

impl AppState {
    // ========================
    // Startup
    // ========================

    /// Bootstrap request for a session restored from disk
    pub fn startup_command(&mut self) -> Option<NetworkCommand> {
        if self.screen == Screen::Loading {
            self.bootstrap()
        } else {
            None
        }
    }

    fn bootstrap(&mut self) -> Option<NetworkCommand> {
        let email = self.user.as_ref()?.email.clone();
        self.screen = Screen::Loading;
        let id = self.next_id();
        self.pending.bootstrap = Some(id);
        Some(NetworkCommand::Bootstrap { id, email })
    }

    // ========================
    // Text input
    // ========================

    pub fn enter_char(&mut self, c: char) {
        match self.screen {
            Screen::Login => self.login_email.push(c),
            Screen::Home => {
                self.search_query.push(c);
                self.run_search();
            }
            Screen::Register => {
                if let Some(draft) = self.registration.as_mut() {
                    if draft.focus == RegisterField::Note {
                        draft.note.push(c);
                    }
                }
            }
            Screen::NewPatient => {
                let field = self.new_patient_field;
                if field == NewPatientField::AuthorizedSessions && !c.is_ascii_digit() {
                    return;
                }
                self.new_patient.field_mut(field).push(c);
            }
            Screen::Loading | Screen::Success => {}
        }
    }

    pub fn delete_char(&mut self) {
        match self.screen {
            Screen::Login => {
                self.login_email.pop();
            }
            Screen::Home => {
                self.search_query.pop();
                self.run_search();
            }
            Screen::Register => {
                if let Some(draft) = self.registration.as_mut() {
                    if draft.focus == RegisterField::Note {
                        draft.note.pop();
                    }
                }
            }
            Screen::NewPatient => {
                self.new_patient.field_mut(self.new_patient_field).pop();
            }
            Screen::Loading | Screen::Success => {}
        }
    }

    // ========================
    // Auth
    // ========================

    pub fn submit_login(&mut self) -> Option<NetworkCommand> {
        if self.pending.login.is_some() {
            return None;
        }
        self.login_error = None;

        let email = self.login_email.trim().to_lowercase();
        if email.is_empty() {
            self.login_error = Some("Enter your email".to_string());
            return None;
        }

        let id = self.next_id();
        self.pending.login = Some(id);
        Some(NetworkCommand::Login { id, email })
    }

    pub fn request_logout(&mut self) {
        if self.user.is_some() {
            self.confirm_logout = true;
        }
    }

    pub fn cancel_logout(&mut self) {
        self.confirm_logout = false;
    }

    pub fn logout(&mut self) {
        self.confirm_logout = false;
        if let Err(e) = self.session_store.clear() {
            tracing::warn!("Failed to remove saved session: {}", e);
        }
        tracing::info!("Logged out");

        self.user = None;
        self.patients.clear();
        self.offline = false;
        self.login_email.clear();
        self.login_error = None;
        self.pending = Default::default();
        self.clear_search();
        self.registration = None;
        self.success = None;
        self.screen = Screen::Login;
    }

    // ========================
    // Search
    // ========================

    pub fn run_search(&mut self) {
        self.search_results = search_patients(&self.patients, &self.search_query)
            .into_iter()
            .map(|p| p.id.clone())
            .collect();
        self.selected_result = 0;
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.search_results.clear();
        self.selected_result = 0;
    }

    pub fn next_result(&mut self) {
        if !self.search_results.is_empty() {
            self.selected_result = (self.selected_result + 1) % self.search_results.len();
        }
    }

    pub fn prev_result(&mut self) {
        if !self.search_results.is_empty() {
            self.selected_result = self
                .selected_result
                .checked_sub(1)
                .unwrap_or(self.search_results.len() - 1);
        }
    }

    pub fn select_result(&mut self) -> Option<NetworkCommand> {
        let id = self.search_results.get(self.selected_result)?.clone();
        self.select_patient(&id)
    }

    // ========================
    // Session registration
    // ========================

    /// Open the registration screen for a patient and ask for their last sessions
    pub fn select_patient(&mut self, patient_id: &str) -> Option<NetworkCommand> {
        self.patient(patient_id)?;
        let email = self.user.as_ref()?.email.clone();

        self.registration = Some(RegistrationDraft {
            patient_id: patient_id.to_string(),
            ..Default::default()
        });
        self.screen = Screen::Register;

        let id = self.next_id();
        self.pending.last_sessions = Some(id);
        Some(NetworkCommand::FetchLastSessions {
            id,
            email,
            patient_id: patient_id.to_string(),
        })
    }

    pub fn next_field(&mut self) {
        match self.screen {
            Screen::Register => {
                if let Some(draft) = self.registration.as_mut() {
                    draft.focus = draft.focus.next();
                }
            }
            Screen::NewPatient => self.new_patient_field = self.new_patient_field.next(),
            _ => {}
        }
    }

    pub fn prev_field(&mut self) {
        match self.screen {
            Screen::Register => {
                if let Some(draft) = self.registration.as_mut() {
                    draft.focus = draft.focus.prev();
                }
            }
            Screen::NewPatient => self.new_patient_field = self.new_patient_field.prev(),
            _ => {}
        }
    }

    /// Down through the list; "none selected" sits before the first entry
    pub fn next_treatment(&mut self) {
        let count = self.treatments.len();
        if let Some(draft) = self.registration.as_mut() {
            if count == 0 {
                return;
            }
            draft.treatment = match draft.treatment {
                None => Some(0),
                Some(i) if i + 1 < count => Some(i + 1),
                Some(i) => Some(i),
            };
        }
    }

    pub fn prev_treatment(&mut self) {
        if let Some(draft) = self.registration.as_mut() {
            draft.treatment = match draft.treatment {
                Some(0) | None => None,
                Some(i) => Some(i - 1),
            };
        }
    }

    pub fn select_outcome(&mut self, tag: OutcomeTag) {
        if let Some(draft) = self.registration.as_mut() {
            draft.outcome = Some(tag);
        }
    }

    pub fn next_outcome(&mut self) {
        if let Some(draft) = self.registration.as_mut() {
            draft.outcome = Some(draft.outcome.map(|t| t.next()).unwrap_or(OutcomeTag::ALL[0]));
        }
    }

    pub fn prev_outcome(&mut self) {
        if let Some(draft) = self.registration.as_mut() {
            let last = OutcomeTag::ALL[OutcomeTag::ALL.len() - 1];
            draft.outcome = Some(draft.outcome.map(|t| t.prev()).unwrap_or(last));
        }
    }

    pub fn confirm_session(&mut self) -> Option<NetworkCommand> {
        if !self.can_confirm() {
            return None;
        }

        let draft = self.registration.as_ref()?;
        let patient = self.selected_patient()?;
        let user = self.user.as_ref()?;
        let treatment = self.treatments.get(draft.treatment?)?;

        let submission = SessionSubmission {
            email: user.email.clone(),
            patient_id: patient.id.clone(),
            last_name: patient.last_name.clone(),
            first_name: patient.first_name.clone(),
            national_id: patient.national_id.clone(),
            insurer: patient.insurer.clone(),
            treatment: treatment.description.clone(),
            outcome: draft.outcome?,
            note: draft.note.trim().to_string(),
            device: self.device_tag.clone(),
        };

        let id = self.next_id();
        self.pending.confirm = Some(id);
        Some(NetworkCommand::RegisterSession { id, submission })
    }

    // ========================
    // New patient
    // ========================

    pub fn open_new_patient(&mut self) {
        self.new_patient_field = NewPatientField::default();
        self.screen = Screen::NewPatient;
    }

    pub fn save_new_patient(&mut self) -> Option<NetworkCommand> {
        if self.pending.new_patient.is_some() {
            return None;
        }
        let email = self.user.as_ref()?.email.clone();

        match self.new_patient.to_submission(&email) {
            Ok(submission) => {
                let id = self.next_id();
                self.pending.new_patient = Some(id);
                Some(NetworkCommand::RegisterPatient { id, submission })
            }
            Err(message) => {
                self.alert = Some(Alert::warning(message));
                None
            }
        }
    }

    // ========================
    // Navigation
    // ========================

    /// Back to search, dropping any transient selection
    pub fn go_home(&mut self) {
        self.registration = None;
        self.success = None;
        self.pending.last_sessions = None;
        self.clear_search();
        self.screen = Screen::Home;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    // ========================
    // Response handling
    // ========================

    /// Apply a network response; may yield a follow-up command
    pub fn handle_response(&mut self, response: NetworkResponse) -> Option<NetworkCommand> {
        match response {
            NetworkResponse::LoggedIn { id, email, result } => {
                if self.pending.login != Some(id) {
                    return None;
                }
                self.pending.login = None;

                match result {
                    Ok(display_name) => {
                        let user = User { email, display_name };
                        if let Err(e) = self.session_store.save(&user) {
                            tracing::warn!("Failed to save session: {}", e);
                        }
                        tracing::info!(email = %user.email, "Logged in");
                        self.user = Some(user);
                        self.login_error = None;
                        return self.bootstrap();
                    }
                    Err(err) if err.is_transport() => {
                        self.login_error =
                            Some("Connection error. Check your internet.".to_string());
                    }
                    Err(err) => {
                        self.login_error = Some(err.message_or("Email not authorized."));
                    }
                }
            }

            NetworkResponse::Bootstrapped { id, patients, treatments } => {
                if self.pending.bootstrap != Some(id) {
                    return None;
                }
                self.pending.bootstrap = None;

                let mut failures = Vec::new();
                let mut offline = false;

                match patients {
                    Ok(fetched) => {
                        offline |= fetched.from_cache;
                        self.patients = fetched.value;
                    }
                    Err(err) if err.is_transport() => failures.push(err.to_string()),
                    Err(err) => tracing::warn!("Patient list rejected: {}", err),
                }
                match treatments {
                    Ok(fetched) => {
                        offline |= fetched.from_cache;
                        self.treatments = fetched.value;
                    }
                    Err(err) if err.is_transport() => failures.push(err.to_string()),
                    Err(err) => tracing::warn!("Treatment list rejected: {}", err),
                }

                self.offline = offline;
                if let Some(first) = failures.first() {
                    let message = format!("Could not reach the server: {}", first);
                    self.alert = Some(Alert::danger(message));
                }
                self.go_home();
            }

            NetworkResponse::LastSessions { id, patient_id, result } => {
                if self.pending.last_sessions != Some(id) {
                    return None;
                }
                self.pending.last_sessions = None;

                let draft = self
                    .registration
                    .as_mut()
                    .filter(|d| d.patient_id == patient_id)?;

                draft.last_session = match result {
                    Ok(mut sessions) if !sessions.is_empty() => {
                        LastSession::Previous(sessions.remove(0))
                    }
                    Err(err) if err.is_transport() => LastSession::Unavailable,
                    _ => {
                        if draft.outcome.is_none() {
                            draft.outcome = Some(OutcomeTag::PrimeraSesion);
                        }
                        LastSession::FirstVisit
                    }
                };
            }

            NetworkResponse::SessionRegistered { id, patient_id, result } => {
                if self.pending.confirm != Some(id) {
                    return None;
                }
                self.pending.confirm = None;

                match result {
                    Ok(receipt) => {
                        let patient = self.patients.iter_mut().find(|p| p.id == patient_id)?;
                        patient.consumed_sessions = patient.consumed_sessions.saturating_add(1);
                        let patient_name = patient.full_name();

                        let now = chrono::Local::now();
                        self.success = Some(SuccessSummary {
                            patient_name,
                            session_number: receipt.session_number,
                            date: now.format("%d/%m/%Y").to_string(),
                            time: now.format("%H:%M").to_string(),
                            practitioner: self
                                .user
                                .as_ref()
                                .map(|u| u.display_name.clone())
                                .unwrap_or_default(),
                            alert: receipt.alert,
                        });
                        self.registration = None;
                        self.clear_search();
                        self.screen = Screen::Success;
                    }
                    Err(err) if err.is_transport() => {
                        self.alert = Some(Alert::danger(format!("Connection error: {}", err)));
                    }
                    Err(err) => {
                        self.alert = Some(Alert::danger(format!(
                            "Error saving: {}",
                            err.message_or("unknown error")
                        )));
                    }
                }
            }

            NetworkResponse::PatientRegistered { id, submission, result } => {
                if self.pending.new_patient != Some(id) {
                    return None;
                }
                self.pending.new_patient = None;

                match result {
                    Ok(patient_id) => {
                        let patient = submission.into_patient(patient_id);
                        let message = format!("Patient {} registered", patient.full_name());
                        self.alert = Some(Alert::info(message));
                        self.patients.push(patient);
                        self.new_patient = NewPatientForm::default();
                        self.go_home();
                    }
                    Err(err) if err.is_transport() => {
                        self.alert = Some(Alert::danger(format!("Connection error: {}", err)));
                    }
                    Err(err) => {
                        let message = format!("Error: {}", err.message_or("unknown error"));
                        self.alert = Some(Alert::danger(message));
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patient, PatientSubmission, SessionAlert, SessionRecord, TreatmentOption};
    use crate::network::client::Fetched;
    use crate::network::protocol::{ApiError, SessionReceipt};
    use crate::storage::SessionStore;
    use tempfile::{tempdir, TempDir};

    fn patient(id: &str, last: &str, authorized: u32, consumed: u32) -> Patient {
        Patient {
            id: id.to_string(),
            last_name: last.to_string(),
            first_name: "Ana".to_string(),
            national_id: format!("30{}", id),
            insurer: "OSDE".to_string(),
            plan: String::new(),
            referring_doctor: String::new(),
            authorized_sessions: authorized,
            consumed_sessions: consumed,
        }
    }

    fn logged_in_state() -> (AppState, TempDir) {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store
            .save(&User {
                email: "kine@example.com".to_string(),
                display_name: "Laura".to_string(),
            })
            .unwrap();

        let mut state = AppState::new(store, "tui");
        let cmd = state.startup_command();
        let id = match cmd {
            Some(NetworkCommand::Bootstrap { id, .. }) => id,
            other => panic!("expected bootstrap, got {:?}", other),
        };
        state.handle_response(NetworkResponse::Bootstrapped {
            id,
            patients: Ok(Fetched {
                value: vec![patient("1", "Gomez", 10, 3), patient("2", "Perez", 5, 4)],
                from_cache: false,
            }),
            treatments: Ok(Fetched {
                value: vec![
                    TreatmentOption { description: "TENS".to_string() },
                    TreatmentOption { description: "Masaje".to_string() },
                ],
                from_cache: false,
            }),
        });
        (state, dir)
    }

    fn last_sessions_id(cmd: Option<NetworkCommand>) -> u64 {
        match cmd {
            Some(NetworkCommand::FetchLastSessions { id, .. }) => id,
            other => panic!("expected last sessions fetch, got {:?}", other),
        }
    }

    #[test]
    fn test_saved_session_skips_login() {
        let (state, _dir) = logged_in_state();
        assert_eq!(state.screen, Screen::Home);
        assert_eq!(state.patients.len(), 2);
        assert!(state.alert.is_none());
    }

    #[test]
    fn test_login_flow() {
        let dir = tempdir().unwrap();
        let mut state = AppState::new(SessionStore::new(dir.path()), "tui");
        assert_eq!(state.screen, Screen::Login);

        assert!(state.submit_login().is_none());
        assert_eq!(state.login_error.as_deref(), Some("Enter your email"));

        for c in "  Kine@Example.com ".chars() {
            state.enter_char(c);
        }
        let id = match state.submit_login() {
            Some(NetworkCommand::Login { id, email }) => {
                assert_eq!(email, "kine@example.com");
                id
            }
            other => panic!("expected login, got {:?}", other),
        };
        // Control is busy while the request is in flight
        assert!(state.submit_login().is_none());

        let next = state.handle_response(NetworkResponse::LoggedIn {
            id,
            email: "kine@example.com".to_string(),
            result: Ok("Laura".to_string()),
        });
        assert!(matches!(next, Some(NetworkCommand::Bootstrap { .. })));
        assert_eq!(state.screen, Screen::Loading);
        assert_eq!(
            SessionStore::new(dir.path()).load().map(|u| u.display_name),
            Some("Laura".to_string())
        );
    }

    #[test]
    fn test_login_errors() {
        let dir = tempdir().unwrap();
        let mut state = AppState::new(SessionStore::new(dir.path()), "tui");
        state.login_email = "x@y.z".to_string();

        let id = match state.submit_login() {
            Some(NetworkCommand::Login { id, .. }) => id,
            _ => unreachable!(),
        };
        state.handle_response(NetworkResponse::LoggedIn {
            id,
            email: "x@y.z".to_string(),
            result: Err(ApiError::Rejected(String::new())),
        });
        assert_eq!(state.login_error.as_deref(), Some("Email not authorized."));
        assert_eq!(state.screen, Screen::Login);

        let id = match state.submit_login() {
            Some(NetworkCommand::Login { id, .. }) => id,
            _ => unreachable!(),
        };
        state.handle_response(NetworkResponse::LoggedIn {
            id,
            email: "x@y.z".to_string(),
            result: Err(ApiError::Transport("Connection failed".to_string())),
        });
        assert_eq!(
            state.login_error.as_deref(),
            Some("Connection error. Check your internet.")
        );
    }

    #[test]
    fn test_bootstrap_transport_failure_alerts_and_goes_home() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store
            .save(&User { email: "a@b.c".to_string(), display_name: "A".to_string() })
            .unwrap();
        let mut state = AppState::new(store, "tui");
        let id = match state.startup_command() {
            Some(NetworkCommand::Bootstrap { id, .. }) => id,
            _ => unreachable!(),
        };
        state.handle_response(NetworkResponse::Bootstrapped {
            id,
            patients: Err(ApiError::Transport("Connection failed".to_string())),
            treatments: Err(ApiError::Rejected("nope".to_string())),
        });
        assert_eq!(state.screen, Screen::Home);
        assert!(state.alert.as_ref().unwrap().message.starts_with("Could not reach the server"));
    }

    #[test]
    fn test_search_updates_on_input() {
        let (mut state, _dir) = logged_in_state();
        for c in "PER".chars() {
            state.enter_char(c);
        }
        assert_eq!(state.search_results, vec!["2".to_string()]);
        state.delete_char();
        state.delete_char();
        state.delete_char();
        assert!(state.search_results.is_empty());
    }

    #[test]
    fn test_confirm_requires_treatment_and_outcome() {
        let (mut state, _dir) = logged_in_state();
        state.select_patient("1");
        assert_eq!(state.screen, Screen::Register);
        assert!(!state.can_confirm());
        assert!(state.confirm_session().is_none());

        state.next_treatment();
        assert!(!state.can_confirm());
        assert!(state.confirm_session().is_none());

        state.prev_treatment();
        state.select_outcome(OutcomeTag::Mejora);
        assert!(!state.can_confirm());

        state.next_treatment();
        assert!(state.can_confirm());
    }

    #[test]
    fn test_first_visit_preselects_outcome_and_ignores_stale() {
        let (mut state, _dir) = logged_in_state();
        let stale = last_sessions_id(state.select_patient("1"));
        let current = last_sessions_id(state.select_patient("2"));

        state.handle_response(NetworkResponse::LastSessions {
            id: stale,
            patient_id: "1".to_string(),
            result: Ok(Vec::new()),
        });
        assert_eq!(state.registration.as_ref().unwrap().last_session, LastSession::Loading);

        state.handle_response(NetworkResponse::LastSessions {
            id: current,
            patient_id: "2".to_string(),
            result: Ok(Vec::new()),
        });
        let draft = state.registration.as_ref().unwrap();
        assert_eq!(draft.last_session, LastSession::FirstVisit);
        assert_eq!(draft.outcome, Some(OutcomeTag::PrimeraSesion));
    }

    #[test]
    fn test_previous_session_is_shown() {
        let (mut state, _dir) = logged_in_state();
        let id = last_sessions_id(state.select_patient("1"));
        let record = SessionRecord {
            date: "01/03/2026".to_string(),
            time: "10:30".to_string(),
            practitioner: "Laura".to_string(),
            treatment: "TENS".to_string(),
            outcome: "MEJORA".to_string(),
            note: String::new(),
        };
        state.handle_response(NetworkResponse::LastSessions {
            id,
            patient_id: "1".to_string(),
            result: Ok(vec![record.clone()]),
        });
        let draft = state.registration.as_ref().unwrap();
        assert_eq!(draft.last_session, LastSession::Previous(record));
        assert_eq!(draft.outcome, None);
    }

    #[test]
    fn test_successful_registration_increments_only_that_patient() {
        let (mut state, _dir) = logged_in_state();
        state.select_patient("2");
        state.next_treatment();
        state.select_outcome(OutcomeTag::Dolor);
        if let Some(draft) = state.registration.as_mut() {
            draft.note = "  knee better  ".to_string();
        }

        let id = match state.confirm_session() {
            Some(NetworkCommand::RegisterSession { id, submission }) => {
                assert_eq!(submission.treatment, "TENS");
                assert_eq!(submission.note, "knee better");
                assert_eq!(submission.device, "tui");
                id
            }
            other => panic!("expected registration, got {:?}", other),
        };
        assert!(!state.can_confirm());
        assert!(state.confirm_session().is_none());

        state.handle_response(NetworkResponse::SessionRegistered {
            id,
            patient_id: "2".to_string(),
            result: Ok(SessionReceipt {
                session_number: "5".to_string(),
                alert: Some(SessionAlert {
                    kind: "LIMITE_ALCANZADO".to_string(),
                    message: "Limit reached".to_string(),
                }),
            }),
        });

        assert_eq!(state.patient("2").unwrap().consumed_sessions, 5);
        assert_eq!(state.patient("1").unwrap().consumed_sessions, 3);
        assert_eq!(state.screen, Screen::Success);
        let summary = state.success.as_ref().unwrap();
        assert_eq!(summary.session_number, "5");
        assert_eq!(summary.practitioner, "Laura");
        assert!(state.registration.is_none());
    }

    #[test]
    fn test_registration_at_counter_ceiling_does_not_overflow() {
        let (mut state, _dir) = logged_in_state();
        state.patients[0].consumed_sessions = u32::MAX;
        state.select_patient("1");
        state.next_treatment();
        state.select_outcome(OutcomeTag::Mejora);
        let id = match state.confirm_session() {
            Some(NetworkCommand::RegisterSession { id, .. }) => id,
            other => panic!("expected registration, got {:?}", other),
        };

        state.handle_response(NetworkResponse::SessionRegistered {
            id,
            patient_id: "1".to_string(),
            result: Ok(SessionReceipt { session_number: "1".to_string(), alert: None }),
        });
        assert_eq!(state.patient("1").unwrap().consumed_sessions, u32::MAX);
        assert_eq!(state.screen, Screen::Success);
    }

    #[test]
    fn test_cached_lists_mark_state_offline() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store
            .save(&User { email: "a@b.c".to_string(), display_name: "A".to_string() })
            .unwrap();
        let mut state = AppState::new(store, "tui");
        let id = match state.startup_command() {
            Some(NetworkCommand::Bootstrap { id, .. }) => id,
            _ => unreachable!(),
        };
        state.handle_response(NetworkResponse::Bootstrapped {
            id,
            patients: Ok(Fetched { value: vec![patient("1", "Gomez", 10, 3)], from_cache: true }),
            treatments: Ok(Fetched { value: Vec::new(), from_cache: false }),
        });
        assert!(state.offline);
        assert!(state.to_render_state().offline);
        assert_eq!(state.patients.len(), 1);
        assert!(state.alert.is_none());
    }

    #[test]
    fn test_rejected_registration_keeps_form() {
        let (mut state, _dir) = logged_in_state();
        state.select_patient("1");
        state.next_treatment();
        state.select_outcome(OutcomeTag::Igual);
        let id = match state.confirm_session() {
            Some(NetworkCommand::RegisterSession { id, .. }) => id,
            _ => unreachable!(),
        };
        state.handle_response(NetworkResponse::SessionRegistered {
            id,
            patient_id: "1".to_string(),
            result: Err(ApiError::Rejected("Sin permiso".to_string())),
        });
        assert_eq!(state.patient("1").unwrap().consumed_sessions, 3);
        assert_eq!(state.screen, Screen::Register);
        assert_eq!(state.alert.as_ref().unwrap().message, "Error saving: Sin permiso");
        assert!(state.can_confirm());
    }

    #[test]
    fn test_new_patient_validation_and_success() {
        let (mut state, _dir) = logged_in_state();
        state.open_new_patient();
        assert!(state.save_new_patient().is_none());
        assert!(state.alert.take().is_some());

        state.new_patient.last_name = "Diaz".to_string();
        state.new_patient.first_name = "Luis".to_string();
        state.new_patient.national_id = "25000111".to_string();
        state.new_patient.insurer = "PAMI".to_string();
        state.new_patient_field = NewPatientField::AuthorizedSessions;
        for c in "1x2".chars() {
            state.enter_char(c);
        }
        assert_eq!(state.new_patient.authorized_sessions, "12");

        let (id, submission): (u64, PatientSubmission) = match state.save_new_patient() {
            Some(NetworkCommand::RegisterPatient { id, submission }) => (id, submission),
            other => panic!("expected new patient, got {:?}", other),
        };
        assert!(state.save_new_patient().is_none());

        state.handle_response(NetworkResponse::PatientRegistered {
            id,
            submission,
            result: Ok("99".to_string()),
        });
        let added = state.patient("99").unwrap();
        assert_eq!(added.authorized_sessions, 12);
        assert_eq!(added.consumed_sessions, 0);
        assert_eq!(state.screen, Screen::Home);
        assert_eq!(state.new_patient, NewPatientForm::default());
    }

    #[test]
    fn test_go_home_resets_selection() {
        let (mut state, _dir) = logged_in_state();
        state.search_query = "gom".to_string();
        state.run_search();
        state.select_result();
        state.select_outcome(OutcomeTag::Alta);
        state.go_home();
        assert!(state.registration.is_none());
        assert!(state.search_query.is_empty());
        assert_eq!(state.screen, Screen::Home);
    }

    #[test]
    fn test_logout_clears_session() {
        let (mut state, dir) = logged_in_state();
        state.request_logout();
        assert!(state.confirm_logout);
        state.logout();
        assert!(state.user.is_none());
        assert!(state.patients.is_empty());
        assert_eq!(state.screen, Screen::Login);
        assert!(SessionStore::new(dir.path()).load().is_none());
    }
}
