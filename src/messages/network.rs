//! Network messages - communication between App and Network layers

use crate::models::{Patient, PatientSubmission, SessionRecord, SessionSubmission, TreatmentOption};
use crate::network::client::Fetched;
use crate::network::protocol::{ApiError, SessionReceipt};

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Check a practitioner email against the backend
    Login {
        id: u64,
        email: String,
    },
    /// Fetch patients and treatments concurrently
    Bootstrap {
        id: u64,
        email: String,
    },
    /// Fetch the most recent sessions of a patient
    FetchLastSessions {
        id: u64,
        email: String,
        patient_id: String,
    },
    /// Register a treatment session
    RegisterSession {
        id: u64,
        submission: SessionSubmission,
    },
    /// Register a new patient
    RegisterPatient {
        id: u64,
        submission: PatientSubmission,
    },

    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    LoggedIn {
        id: u64,
        email: String,
        /// Display name on success
        result: Result<String, ApiError>,
    },
    Bootstrapped {
        id: u64,
        patients: Result<Fetched<Vec<Patient>>, ApiError>,
        treatments: Result<Fetched<Vec<TreatmentOption>>, ApiError>,
    },
    LastSessions {
        id: u64,
        patient_id: String,
        result: Result<Vec<SessionRecord>, ApiError>,
    },
    SessionRegistered {
        id: u64,
        patient_id: String,
        result: Result<SessionReceipt, ApiError>,
    },
    PatientRegistered {
        id: u64,
        submission: PatientSubmission,
        /// Backend id of the new patient on success
        result: Result<String, ApiError>,
    },
}
