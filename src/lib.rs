//! # Kine TUI
//!
//! Terminal client for registering physical-therapy sessions against a
//! single JSON endpoint.
//!
//! ## Features
//! - Email login with a locally saved session
//! - Patient search by name or national ID
//! - Session registration with remaining-session warnings
//! - New patient registration
//! - Offline fallback for the patient and treatment lists
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Network Layer (Tokio runtime)

pub mod app;
pub mod config;
pub mod constants;
pub mod messages;
pub mod models;
pub mod network;
pub mod offline;
pub mod risk;
pub mod search;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use app::{AppActor, AppState};
pub use config::AppConfig;
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{OutcomeTag, Patient, SessionRecord, TreatmentOption, User};
pub use network::{ApiClient, ApiError, NetworkActor};
pub use offline::OfflineCache;
pub use risk::RiskTier;
pub use search::search_patients;
pub use storage::SessionStore;
