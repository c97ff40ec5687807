//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::models::OutcomeTag;

/// Application screens
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Screen {
    #[default]
    Login,
    Loading,
    Home,
    Register,
    Success,
    NewPatient,
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Text input (routed to the focused field)
    CharInput(char),
    Backspace,

    // Login
    SubmitLogin,
    RequestLogout,
    ConfirmLogout,
    CancelLogout,

    // Search
    NextResult,
    PrevResult,
    SelectResult,
    ClearSearch,

    // Form navigation
    NextField,
    PrevField,

    // Session registration
    NextTreatment,
    PrevTreatment,
    NextOutcome,
    PrevOutcome,
    SelectOutcome(OutcomeTag),
    ConfirmSession,

    // New patient
    OpenNewPatient,
    SavePatient,

    // Navigation
    GoHome,

    // Popups
    DismissAlert,

    // System
    Quit,
}

/// Focusable parts of the registration screen
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RegisterField {
    #[default]
    Treatment,
    Outcome,
    Note,
    Confirm,
}

impl RegisterField {
    pub fn next(&self) -> RegisterField {
        match self {
            RegisterField::Treatment => RegisterField::Outcome,
            RegisterField::Outcome => RegisterField::Note,
            RegisterField::Note => RegisterField::Confirm,
            RegisterField::Confirm => RegisterField::Treatment,
        }
    }

    pub fn prev(&self) -> RegisterField {
        match self {
            RegisterField::Treatment => RegisterField::Confirm,
            RegisterField::Outcome => RegisterField::Treatment,
            RegisterField::Note => RegisterField::Outcome,
            RegisterField::Confirm => RegisterField::Note,
        }
    }
}

/// Fields of the new patient form, in display order
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum NewPatientField {
    #[default]
    LastName,
    FirstName,
    NationalId,
    Insurer,
    AuthorizedSessions,
    MemberNumber,
    Plan,
    ReferringDoctor,
    Diagnosis,
    Phone,
}

impl NewPatientField {
    pub const ALL: [NewPatientField; 10] = [
        NewPatientField::LastName,
        NewPatientField::FirstName,
        NewPatientField::NationalId,
        NewPatientField::Insurer,
        NewPatientField::AuthorizedSessions,
        NewPatientField::MemberNumber,
        NewPatientField::Plan,
        NewPatientField::ReferringDoctor,
        NewPatientField::Diagnosis,
        NewPatientField::Phone,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NewPatientField::LastName => "Last name",
            NewPatientField::FirstName => "First name",
            NewPatientField::NationalId => "National ID",
            NewPatientField::Insurer => "Insurer",
            NewPatientField::AuthorizedSessions => "Authorized sessions",
            NewPatientField::MemberNumber => "Member number",
            NewPatientField::Plan => "Plan",
            NewPatientField::ReferringDoctor => "Referring doctor",
            NewPatientField::Diagnosis => "Diagnosis",
            NewPatientField::Phone => "Phone",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self,
            NewPatientField::LastName
                | NewPatientField::FirstName
                | NewPatientField::NationalId
                | NewPatientField::Insurer
                | NewPatientField::AuthorizedSessions
        )
    }

    fn position(&self) -> usize {
        NewPatientField::ALL
            .iter()
            .position(|f| f == self)
            .unwrap_or(0)
    }

    pub fn next(&self) -> NewPatientField {
        NewPatientField::ALL[(self.position() + 1) % NewPatientField::ALL.len()]
    }

    pub fn prev(&self) -> NewPatientField {
        let len = NewPatientField::ALL.len();
        NewPatientField::ALL[(self.position() + len - 1) % len]
    }

    pub fn is_last(&self) -> bool {
        self.position() == NewPatientField::ALL.len() - 1
    }
}

/// Modal popup currently on screen
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Popup {
    #[default]
    None,
    Alert,
    ConfirmLogout,
}

/// Everything key mapping needs to know about the current UI
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputContext {
    pub screen: Screen,
    pub register_field: RegisterField,
    pub new_patient_field: NewPatientField,
    pub popup: Popup,
    pub search_empty: bool,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(key: KeyEvent, ctx: InputContext) -> Option<UiEvent> {
    use crossterm::event::KeyEventKind;

    if key.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Some(UiEvent::Quit);
    }

    // Popups swallow every key
    match ctx.popup {
        Popup::Alert => return Some(UiEvent::DismissAlert),
        Popup::ConfirmLogout => {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    Some(UiEvent::ConfirmLogout)
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    Some(UiEvent::CancelLogout)
                }
                _ => None,
            };
        }
        Popup::None => {}
    }

    match ctx.screen {
        Screen::Login => handle_login_keys(key),
        Screen::Loading => match key.code {
            KeyCode::Esc => Some(UiEvent::Quit),
            _ => None,
        },
        Screen::Home => handle_home_keys(key, ctrl, ctx.search_empty),
        Screen::Register => handle_register_keys(key, ctrl, ctx.register_field),
        Screen::Success => match key.code {
            KeyCode::Char('l') if ctrl => Some(UiEvent::RequestLogout),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('n') => Some(UiEvent::GoHome),
            _ => None,
        },
        Screen::NewPatient => handle_new_patient_keys(key, ctrl, ctx.new_patient_field),
    }
}

fn handle_login_keys(key: KeyEvent) -> Option<UiEvent> {
    match key.code {
        KeyCode::Enter => Some(UiEvent::SubmitLogin),
        KeyCode::Esc => Some(UiEvent::Quit),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        _ => None,
    }
}

fn handle_home_keys(key: KeyEvent, ctrl: bool, search_empty: bool) -> Option<UiEvent> {
    if ctrl {
        return match key.code {
            KeyCode::Char('n') => Some(UiEvent::OpenNewPatient),
            KeyCode::Char('l') => Some(UiEvent::RequestLogout),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc if search_empty => Some(UiEvent::Quit),
        KeyCode::Esc => Some(UiEvent::ClearSearch),
        KeyCode::Up => Some(UiEvent::PrevResult),
        KeyCode::Down => Some(UiEvent::NextResult),
        KeyCode::Enter => Some(UiEvent::SelectResult),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        _ => None,
    }
}

fn handle_register_keys(key: KeyEvent, ctrl: bool, field: RegisterField) -> Option<UiEvent> {
    if ctrl {
        return match key.code {
            KeyCode::Char('s') => Some(UiEvent::ConfirmSession),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => return Some(UiEvent::GoHome),
        KeyCode::Tab => return Some(UiEvent::NextField),
        KeyCode::BackTab => return Some(UiEvent::PrevField),
        _ => {}
    }

    match field {
        RegisterField::Treatment => match key.code {
            KeyCode::Up => Some(UiEvent::PrevTreatment),
            KeyCode::Down => Some(UiEvent::NextTreatment),
            KeyCode::Enter => Some(UiEvent::NextField),
            _ => None,
        },
        RegisterField::Outcome => match key.code {
            KeyCode::Left | KeyCode::Up => Some(UiEvent::PrevOutcome),
            KeyCode::Right | KeyCode::Down => Some(UiEvent::NextOutcome),
            KeyCode::Enter => Some(UiEvent::NextField),
            KeyCode::Char(c) => c
                .to_digit(10)
                .and_then(|d| (d as usize).checked_sub(1))
                .and_then(|i| OutcomeTag::ALL.get(i).copied())
                .map(UiEvent::SelectOutcome),
            _ => None,
        },
        RegisterField::Note => match key.code {
            KeyCode::Enter => Some(UiEvent::NextField),
            KeyCode::Backspace => Some(UiEvent::Backspace),
            KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
            _ => None,
        },
        RegisterField::Confirm => match key.code {
            KeyCode::Enter => Some(UiEvent::ConfirmSession),
            _ => None,
        },
    }
}

fn handle_new_patient_keys(key: KeyEvent, ctrl: bool, field: NewPatientField) -> Option<UiEvent> {
    if ctrl {
        return match key.code {
            KeyCode::Char('s') => Some(UiEvent::SavePatient),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => Some(UiEvent::GoHome),
        KeyCode::Tab | KeyCode::Down => Some(UiEvent::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(UiEvent::PrevField),
        KeyCode::Enter if field.is_last() => Some(UiEvent::SavePatient),
        KeyCode::Enter => Some(UiEvent::NextField),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        _ => None,
    }
}
