//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Default backend endpoint (single POST endpoint for every action)
pub const DEFAULT_BACKEND_URL: &str = "https://script.google.com/macros/s/AKfycbxOSsNkuWoq52XonlJIcNLck3wrdyHVXH38fQb_P-VpNS1urxPFu2qh5bctykflPH8sKg/exec";

/// Key under which the logged-in practitioner is persisted
pub const SESSION_KEY: &str = "kine_sesion";

/// Offline cache version; bumping it starts a fresh cache directory
pub const CACHE_VERSION: &str = "kine-v1";

/// Device tag sent with every registered session
pub const DEFAULT_DEVICE_TAG: &str = "tui";

/// Maximum number of search results rendered
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Remaining sessions at or below this count trigger a low-sessions warning
pub const LOW_REMAINING_THRESHOLD: i64 = 2;

/// Alert type the backend sends when the authorized limit was reached
pub const ALERT_LIMIT_REACHED: &str = "LIMITE_ALCANZADO";

/// Application name
pub const APP_NAME: &str = "Kine";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
