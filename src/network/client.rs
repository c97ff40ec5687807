//! Backend client - posts actions and decodes replies

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;

use crate::models::{Patient, PatientSubmission, SessionRecord, SessionSubmission, TreatmentOption};
use crate::network::protocol::{
    decode_reply, ApiError, ApiRequest, LoginReply, PatientCreated, PatientsReply, SessionReceipt,
    SessionsReply, TreatmentsReply,
};
use crate::offline::OfflineCache;

/// A decoded reply and whether it came from the offline cache
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub from_cache: bool,
}

/// Client for the single backend endpoint
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoint: String,
    cache: Option<OfflineCache>,
}

impl ApiClient {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
        cache: Option<OfflineCache>,
    ) -> Self {
        ApiClient {
            http: create_client(timeout),
            endpoint: endpoint.into(),
            cache,
        }
    }

    /// POST the request and return the raw body. Only transport failures are errors here.
    async fn send_raw(&self, request: &ApiRequest) -> Result<String, ApiError> {
        let resp = self.http.post(&self.endpoint).json(request).send().await?;
        Ok(resp.text().await?)
    }

    /// Execute one action
    pub async fn call<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let start = Instant::now();
        let result = self.send_raw(request).await.and_then(|body| decode_reply(&body));
        log_outcome(request.action(), start, result.as_ref().err());
        result
    }

    /// Execute a cacheable action network-first. The offline cache is only
    /// consulted on transport failures, unreadable bodies included; a
    /// rejection from the server is returned as is.
    pub async fn call_cached<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Fetched<T>, ApiError> {
        let start = Instant::now();
        let action = request.action();
        let email = request.email();

        let online = self
            .send_raw(request)
            .await
            .and_then(|body| decode_reply::<T>(&body).map(|value| (value, body)));

        match online {
            Ok((value, body)) => {
                log_outcome(action, start, None);
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.store(action, email, &body) {
                        tracing::warn!(action, "Failed to update offline cache: {}", e);
                    }
                }
                Ok(Fetched { value, from_cache: false })
            }
            Err(err) if err.is_transport() => {
                let cached = self.cache.as_ref().and_then(|cache| cache.lookup(action, email));
                match cached {
                    Some(body) => {
                        tracing::warn!(
                            action,
                            error = %err,
                            "Network unavailable, serving cached reply"
                        );
                        let value = decode_reply::<T>(&body)?;
                        Ok(Fetched { value, from_cache: true })
                    }
                    None => {
                        log_outcome(action, start, Some(&err));
                        Err(err)
                    }
                }
            }
            Err(err) => {
                log_outcome(action, start, Some(&err));
                Err(err)
            }
        }
    }

    /// Returns the practitioner display name
    pub async fn login(&self, email: &str) -> Result<String, ApiError> {
        let reply: LoginReply = self
            .call(&ApiRequest::Login { email: email.to_string() })
            .await?;
        Ok(reply.display_name)
    }

    /// Patient list; rows without an id cannot be selected and are dropped
    pub async fn patients(&self, email: &str) -> Result<Fetched<Vec<Patient>>, ApiError> {
        let fetched: Fetched<PatientsReply> = self
            .call_cached(&ApiRequest::Patients { email: email.to_string() })
            .await?;
        let total = fetched.value.patients.len();
        let patients: Vec<Patient> = fetched
            .value
            .patients
            .into_iter()
            .filter(|p| !p.id.trim().is_empty())
            .collect();
        if patients.len() < total {
            tracing::warn!(skipped = total - patients.len(), "Ignoring patients without id");
        }
        Ok(Fetched {
            value: patients,
            from_cache: fetched.from_cache,
        })
    }

    pub async fn treatments(
        &self,
        email: &str,
    ) -> Result<Fetched<Vec<TreatmentOption>>, ApiError> {
        let fetched: Fetched<TreatmentsReply> = self
            .call_cached(&ApiRequest::Treatments { email: email.to_string() })
            .await?;
        Ok(Fetched {
            value: fetched.value.treatments,
            from_cache: fetched.from_cache,
        })
    }

    /// Most recent sessions of a patient, newest first
    pub async fn last_sessions(
        &self,
        email: &str,
        patient_id: &str,
    ) -> Result<Vec<SessionRecord>, ApiError> {
        let reply: SessionsReply = self
            .call(&ApiRequest::LastSessions {
                email: email.to_string(),
                patient_id: patient_id.to_string(),
            })
            .await?;
        Ok(reply.sessions)
    }

    pub async fn register_session(
        &self,
        submission: SessionSubmission,
    ) -> Result<SessionReceipt, ApiError> {
        self.call(&ApiRequest::RegisterSession(submission)).await
    }

    /// Returns the id assigned to the new patient
    pub async fn register_patient(
        &self,
        submission: PatientSubmission,
    ) -> Result<String, ApiError> {
        let reply: PatientCreated = self.call(&ApiRequest::RegisterPatient(submission)).await?;
        Ok(reply.id)
    }
}

fn log_outcome(action: &str, start: Instant, error: Option<&ApiError>) {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match error {
        None => tracing::info!(action, elapsed_ms, "Request completed"),
        Some(ApiError::Rejected(msg)) => {
            tracing::info!(action, elapsed_ms, error = %msg, "Request rejected by server")
        }
        Some(ApiError::Transport(msg)) => {
            tracing::warn!(action, elapsed_ms, error = %msg, "Request failed")
        }
    }
}

/// Create an HTTP client; no timeout unless one is configured
pub fn create_client(timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|_| reqwest::Client::new())
}
