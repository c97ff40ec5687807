use serde::{Deserialize, Deserializer, Serialize};

use crate::risk::{self, RiskTier};

/// Logged-in practitioner, persisted verbatim between runs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(rename = "nombre", default)]
    pub display_name: String,
}

/// A patient as returned by the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "apellido", default)]
    pub last_name: String,
    #[serde(rename = "nombre", default)]
    pub first_name: String,
    #[serde(rename = "dni", default, deserialize_with = "string_or_number")]
    pub national_id: String,
    #[serde(rename = "obraSocial", default, deserialize_with = "string_or_null")]
    pub insurer: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub plan: String,
    #[serde(rename = "medicoDer", default, deserialize_with = "string_or_null")]
    pub referring_doctor: String,
    #[serde(rename = "sesionesAut", default, deserialize_with = "count_or_zero")]
    pub authorized_sessions: u32,
    #[serde(rename = "sesionesConsumidas", default, deserialize_with = "count_or_zero")]
    pub consumed_sessions: u32,
}

impl Patient {
    /// "Last, First" as shown on cards and lists
    pub fn full_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    pub fn remaining_sessions(&self) -> i64 {
        risk::remaining(self.authorized_sessions, self.consumed_sessions)
    }

    pub fn risk(&self) -> RiskTier {
        RiskTier::classify(self.authorized_sessions, self.consumed_sessions)
    }

    pub fn progress_percent(&self) -> f64 {
        risk::progress_percent(self.consumed_sessions, self.authorized_sessions)
    }
}

/// A treatment the practitioner can pick for a session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentOption {
    #[serde(rename = "descripcion")]
    pub description: String,
}

/// Categorical status recorded with every session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeTag {
    PrimeraSesion,
    Mejora,
    Igual,
    Dolor,
    Reagudizacion,
    Alta,
}

impl OutcomeTag {
    pub const ALL: [OutcomeTag; 6] = [
        OutcomeTag::PrimeraSesion,
        OutcomeTag::Mejora,
        OutcomeTag::Igual,
        OutcomeTag::Dolor,
        OutcomeTag::Reagudizacion,
        OutcomeTag::Alta,
    ];

    /// Wire value understood by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeTag::PrimeraSesion => "PRIMERA_SESION",
            OutcomeTag::Mejora => "MEJORA",
            OutcomeTag::Igual => "IGUAL",
            OutcomeTag::Dolor => "DOLOR",
            OutcomeTag::Reagudizacion => "REAGUDIZACION",
            OutcomeTag::Alta => "ALTA",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutcomeTag::PrimeraSesion => "1st session",
            OutcomeTag::Mejora => "Improved",
            OutcomeTag::Igual => "No change",
            OutcomeTag::Dolor => "Pain",
            OutcomeTag::Reagudizacion => "Flare-up",
            OutcomeTag::Alta => "Discharged",
        }
    }

    pub fn from_wire(value: &str) -> Option<OutcomeTag> {
        OutcomeTag::ALL.into_iter().find(|tag| tag.as_str() == value)
    }

    pub fn next(&self) -> OutcomeTag {
        let idx = OutcomeTag::ALL.iter().position(|t| t == self).unwrap_or(0);
        OutcomeTag::ALL[(idx + 1) % OutcomeTag::ALL.len()]
    }

    pub fn prev(&self) -> OutcomeTag {
        let idx = OutcomeTag::ALL.iter().position(|t| t == self).unwrap_or(0);
        OutcomeTag::ALL[(idx + OutcomeTag::ALL.len() - 1) % OutcomeTag::ALL.len()]
    }
}

/// Human label for an outcome value received from the backend.
/// Unknown values are shown as-is.
pub fn format_outcome(value: &str) -> String {
    OutcomeTag::from_wire(value)
        .map(|tag| tag.label().to_string())
        .unwrap_or_else(|| value.to_string())
}

/// A previously registered session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "fecha", default, deserialize_with = "string_or_null")]
    pub date: String,
    #[serde(rename = "hora", default, deserialize_with = "string_or_null")]
    pub time: String,
    #[serde(rename = "kinesiologo", default, deserialize_with = "string_or_null")]
    pub practitioner: String,
    #[serde(rename = "tratamiento", default, deserialize_with = "string_or_null")]
    pub treatment: String,
    #[serde(rename = "estadoPaciente", default, deserialize_with = "string_or_null")]
    pub outcome: String,
    #[serde(rename = "nota", default, deserialize_with = "string_or_null")]
    pub note: String,
}

/// Warning attached by the backend to a registered session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionAlert {
    #[serde(rename = "tipo", default)]
    pub kind: String,
    #[serde(rename = "mensaje", default)]
    pub message: String,
}

impl SessionAlert {
    pub fn is_limit_reached(&self) -> bool {
        self.kind == crate::constants::ALERT_LIMIT_REACHED
    }
}

/// Session registration payload
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSubmission {
    pub email: String,
    #[serde(rename = "idPaciente")]
    pub patient_id: String,
    #[serde(rename = "apellidoPaciente")]
    pub last_name: String,
    #[serde(rename = "nombrePaciente")]
    pub first_name: String,
    #[serde(rename = "dniPaciente")]
    pub national_id: String,
    #[serde(rename = "obraSocial")]
    pub insurer: String,
    #[serde(rename = "tratamiento")]
    pub treatment: String,
    #[serde(rename = "estadoPaciente")]
    pub outcome: OutcomeTag,
    #[serde(rename = "nota")]
    pub note: String,
    #[serde(rename = "dispositivo")]
    pub device: String,
}

/// New patient payload
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatientSubmission {
    pub email: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "dni")]
    pub national_id: String,
    #[serde(rename = "obraSocial")]
    pub insurer: String,
    #[serde(rename = "sesionesAutorizadas")]
    pub authorized_sessions: u32,
    #[serde(rename = "nroAfiliado")]
    pub member_number: String,
    #[serde(rename = "planOS")]
    pub plan: String,
    #[serde(rename = "medicoDer")]
    pub referring_doctor: String,
    #[serde(rename = "diagnostico")]
    pub diagnosis: String,
    #[serde(rename = "telefono")]
    pub phone: String,
}

impl PatientSubmission {
    /// Local record for a patient the backend just accepted
    pub fn into_patient(self, id: String) -> Patient {
        Patient {
            id,
            last_name: self.last_name,
            first_name: self.first_name,
            national_id: self.national_id,
            insurer: self.insurer,
            plan: self.plan,
            referring_doctor: self.referring_doctor,
            authorized_sessions: self.authorized_sessions,
            consumed_sessions: 0,
        }
    }
}

/// Accepts `"123"`, `123` or `null` and yields a string
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Session counters may come as numbers, numeric strings, empty cells or null
fn count_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_accepts_numeric_ids_and_missing_counters() {
        let json = r#"{"id": 17, "apellido": "Gomez", "nombre": "Ana", "dni": 30123456,
                       "obraSocial": null, "sesionesAut": "10"}"#;
        let patient: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(patient.id, "17");
        assert_eq!(patient.national_id, "30123456");
        assert_eq!(patient.insurer, "");
        assert_eq!(patient.authorized_sessions, 10);
        assert_eq!(patient.consumed_sessions, 0);
        assert_eq!(patient.full_name(), "Gomez, Ana");
    }

    #[test]
    fn test_patient_row_without_id_still_decodes() {
        let json = r#"{"apellido": "Gomez", "nombre": "Ana", "sesionesConsumidas": 1e12}"#;
        let patient: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(patient.id, "");
        assert_eq!(patient.consumed_sessions, u32::MAX);
    }

    #[test]
    fn test_user_persists_with_wire_names() {
        let user = User {
            email: "kine@example.com".to_string(),
            display_name: "Laura".to_string(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["nombre"], "Laura");
        assert_eq!(json["email"], "kine@example.com");
    }

    #[test]
    fn test_outcome_labels_and_unknown_values() {
        assert_eq!(format_outcome("MEJORA"), "Improved");
        assert_eq!(format_outcome("OTRO"), "OTRO");
        assert_eq!(OutcomeTag::Alta.next(), OutcomeTag::PrimeraSesion);
        assert_eq!(OutcomeTag::PrimeraSesion.prev(), OutcomeTag::Alta);
    }

    #[test]
    fn test_session_submission_wire_shape() {
        let submission = SessionSubmission {
            email: "kine@example.com".to_string(),
            patient_id: "7".to_string(),
            last_name: "Perez".to_string(),
            first_name: "Juan".to_string(),
            national_id: "123".to_string(),
            insurer: "OSDE".to_string(),
            treatment: "Magnetoterapia".to_string(),
            outcome: OutcomeTag::Reagudizacion,
            note: String::new(),
            device: "tui".to_string(),
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["idPaciente"], "7");
        assert_eq!(json["estadoPaciente"], "REAGUDIZACION");
        assert_eq!(json["dispositivo"], "tui");
    }
}
