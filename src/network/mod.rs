//! Network layer - backend calls
//!
//! The Network actor receives commands and sends back decoded replies.

pub mod actor;
pub mod client;
pub mod protocol;
#[cfg(test)]
pub(crate) mod test_server;

pub use actor::NetworkActor;
pub use client::{ApiClient, Fetched};
pub use protocol::ApiError;
