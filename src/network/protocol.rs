//! Backend wire format: one POST endpoint, an `action` field selecting the
//! operation, and `{ ok: true, ... }` / `{ ok: false, error }` replies.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::{
    string_or_number, Patient, PatientSubmission, SessionAlert, SessionRecord, SessionSubmission,
    TreatmentOption,
};

/// Failure of a backend call as the user sees it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Network, I/O or unparsable reply
    #[error("{0}")]
    Transport(String),
    /// `ok: false`, carrying the server message (possibly empty)
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Server message, or `fallback` when the server sent none
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected(msg) | ApiError::Transport(msg) if !msg.trim().is_empty() => {
                msg.clone()
            }
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        let msg = if e.is_timeout() {
            "Request timed out".to_string()
        } else if e.is_connect() {
            format!("Connection failed: {}", e)
        } else {
            format!("Request failed: {}", e)
        };
        ApiError::Transport(msg)
    }
}

/// Request body; serializes with the `action` discriminator inline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action")]
pub enum ApiRequest {
    #[serde(rename = "loginEmail")]
    Login { email: String },
    #[serde(rename = "getPacientes")]
    Patients { email: String },
    #[serde(rename = "getTratamientos")]
    Treatments { email: String },
    #[serde(rename = "getUltimasSesiones")]
    LastSessions {
        email: String,
        #[serde(rename = "idPaciente")]
        patient_id: String,
    },
    #[serde(rename = "registrarSesion")]
    RegisterSession(SessionSubmission),
    #[serde(rename = "altaPaciente")]
    RegisterPatient(PatientSubmission),
}

impl ApiRequest {
    pub fn action(&self) -> &'static str {
        match self {
            ApiRequest::Login { .. } => "loginEmail",
            ApiRequest::Patients { .. } => "getPacientes",
            ApiRequest::Treatments { .. } => "getTratamientos",
            ApiRequest::LastSessions { .. } => "getUltimasSesiones",
            ApiRequest::RegisterSession(_) => "registrarSesion",
            ApiRequest::RegisterPatient(_) => "altaPaciente",
        }
    }

    pub fn email(&self) -> &str {
        match self {
            ApiRequest::Login { email }
            | ApiRequest::Patients { email }
            | ApiRequest::Treatments { email }
            | ApiRequest::LastSessions { email, .. } => email,
            ApiRequest::RegisterSession(s) => &s.email,
            ApiRequest::RegisterPatient(p) => &p.email,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginReply {
    #[serde(rename = "nombre", default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientsReply {
    #[serde(rename = "pacientes", default)]
    pub patients: Vec<Patient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreatmentsReply {
    #[serde(rename = "tratamientos", default)]
    pub treatments: Vec<TreatmentOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsReply {
    #[serde(rename = "sesiones", default)]
    pub sessions: Vec<SessionRecord>,
}

/// Reply to a registered session
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionReceipt {
    #[serde(rename = "nroSesion", default, deserialize_with = "string_or_number")]
    pub session_number: String,
    #[serde(rename = "alerta", default)]
    pub alert: Option<SessionAlert>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientCreated {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
}

/// Decode a reply body: `ok: true` yields `T`, anything else is a rejection
pub fn decode_reply<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ApiError::Transport(format!("Invalid response from server: {}", e)))?;

    if value.get("ok").and_then(serde_json::Value::as_bool) != Some(true) {
        let message = value
            .get("error")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(ApiError::Rejected(message));
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::Transport(format!("Unexpected response shape: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_action_inline() {
        let req = ApiRequest::LastSessions {
            email: "kine@example.com".to_string(),
            patient_id: "12".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action"], "getUltimasSesiones");
        assert_eq!(json["idPaciente"], "12");
        assert_eq!(req.action(), "getUltimasSesiones");
    }

    #[test]
    fn test_new_patient_request_is_flat() {
        let req = ApiRequest::RegisterPatient(PatientSubmission {
            email: "kine@example.com".to_string(),
            last_name: "Gomez".to_string(),
            first_name: "Ana".to_string(),
            national_id: "30111222".to_string(),
            insurer: "OSDE".to_string(),
            authorized_sessions: 10,
            member_number: String::new(),
            plan: "210".to_string(),
            referring_doctor: String::new(),
            diagnosis: String::new(),
            phone: String::new(),
        });
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action"], "altaPaciente");
        assert_eq!(json["sesionesAutorizadas"], 10);
        assert_eq!(json["planOS"], "210");
        assert_eq!(req.email(), "kine@example.com");
    }

    #[test]
    fn test_decode_ok_reply() {
        let reply: SessionReceipt = decode_reply(
            r#"{"ok": true, "nroSesion": 8, "alerta": {"tipo": "LIMITE_ALCANZADO", "mensaje": "Limit"}}"#,
        )
        .unwrap();
        assert_eq!(reply.session_number, "8");
        assert!(reply.alert.unwrap().is_limit_reached());
    }

    #[test]
    fn test_decode_rejection_and_garbage() {
        let err = decode_reply::<LoginReply>(r#"{"ok": false, "error": "Email no autorizado"}"#)
            .unwrap_err();
        assert_eq!(err, ApiError::Rejected("Email no autorizado".to_string()));

        let err = decode_reply::<LoginReply>(r#"{"ok": false}"#).unwrap_err();
        assert_eq!(err.message_or("Email not authorized."), "Email not authorized.");

        let err = decode_reply::<LoginReply>("<html>oops</html>").unwrap_err();
        assert!(err.is_transport());
    }
}
