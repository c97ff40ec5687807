//! Network actor - runs backend calls in the Tokio runtime

use futures_util::future;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::client::ApiClient;

/// Network actor that executes backend commands concurrently
pub struct NetworkActor {
    client: ApiClient,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
}

impl NetworkActor {
    pub fn new(client: ApiClient, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        NetworkActor {
            client,
            response_tx,
            active_requests: JoinSet::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Shutdown) | None => {
                            self.active_requests.abort_all();
                            break;
                        }
                        Some(cmd) => self.spawn(cmd),
                    }
                }

                // Clean up completed tasks
                Some(_result) = self.active_requests.join_next() => {}
            }
        }
    }

    fn spawn(&mut self, cmd: NetworkCommand) {
        let client = self.client.clone();
        let response_tx = self.response_tx.clone();

        self.active_requests.spawn(async move {
            if let Some(response) = execute(&client, cmd).await {
                let _ = response_tx.send(response);
            }
        });
    }
}

/// Run one command against the backend
pub async fn execute(client: &ApiClient, cmd: NetworkCommand) -> Option<NetworkResponse> {
    let response = match cmd {
        NetworkCommand::Login { id, email } => {
            tracing::info!(id, email = %email, "Logging in");
            let result = client.login(&email).await;
            NetworkResponse::LoggedIn { id, email, result }
        }
        NetworkCommand::Bootstrap { id, email } => {
            tracing::info!(id, "Loading patients and treatments");
            let (patients, treatments) =
                future::join(client.patients(&email), client.treatments(&email)).await;
            NetworkResponse::Bootstrapped { id, patients, treatments }
        }
        NetworkCommand::FetchLastSessions { id, email, patient_id } => {
            let result = client.last_sessions(&email, &patient_id).await;
            NetworkResponse::LastSessions { id, patient_id, result }
        }
        NetworkCommand::RegisterSession { id, submission } => {
            let patient_id = submission.patient_id.clone();
            tracing::info!(id, patient_id = %patient_id, "Registering session");
            let result = client.register_session(submission).await;
            NetworkResponse::SessionRegistered { id, patient_id, result }
        }
        NetworkCommand::RegisterPatient { id, submission } => {
            tracing::info!(id, "Registering new patient");
            let result = client.register_patient(submission.clone()).await;
            NetworkResponse::PatientRegistered { id, submission, result }
        }
        NetworkCommand::Shutdown => return None,
    };
    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::test_server::{dead_endpoint, serve};
    use std::time::Duration;

    fn reply_by_action(body: &str) -> String {
        let request: serde_json::Value = serde_json::from_str(body).unwrap();
        match request["action"].as_str() {
            Some("getPacientes") => {
                r#"{"ok":true,"pacientes":[{"id":7,"apellido":"Gomez","nombre":"Ana"}]}"#
            }
            Some("getTratamientos") => r#"{"ok":true,"tratamientos":[{"descripcion":"TENS"}]}"#,
            _ => r#"{"ok":false,"error":"unexpected"}"#,
        }
        .to_string()
    }

    #[tokio::test]
    async fn test_bootstrap_returns_both_lists_in_one_response() {
        let (url, server) = serve(2, reply_by_action).await;
        let client = ApiClient::new(url, Some(Duration::from_secs(5)), None);

        let response = execute(
            &client,
            NetworkCommand::Bootstrap { id: 4, email: "kine@example.com".to_string() },
        )
        .await;

        match response {
            Some(NetworkResponse::Bootstrapped { id, patients, treatments }) => {
                assert_eq!(id, 4);
                assert_eq!(patients.unwrap().value[0].id, "7");
                assert_eq!(treatments.unwrap().value[0].description, "TENS");
            }
            other => panic!("expected bootstrap response, got {:?}", other),
        }

        let mut actions: Vec<String> = server
            .await
            .unwrap()
            .iter()
            .map(|body| {
                let request: serde_json::Value = serde_json::from_str(body).unwrap();
                request["action"].as_str().unwrap_or_default().to_string()
            })
            .collect();
        actions.sort();
        assert_eq!(actions, vec!["getPacientes", "getTratamientos"]);
    }

    #[tokio::test]
    async fn test_actor_answers_commands_and_stops_on_shutdown() {
        let client = ApiClient::new(dead_endpoint().await, Some(Duration::from_secs(5)), None);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        let actor = tokio::spawn(NetworkActor::new(client, resp_tx).run(cmd_rx));

        cmd_tx
            .send(NetworkCommand::Login { id: 1, email: "kine@example.com".to_string() })
            .unwrap();
        match resp_rx.recv().await {
            Some(NetworkResponse::LoggedIn { id, result, .. }) => {
                assert_eq!(id, 1);
                assert!(result.unwrap_err().is_transport());
            }
            other => panic!("expected login response, got {:?}", other),
        }

        cmd_tx.send(NetworkCommand::Shutdown).unwrap();
        actor.await.unwrap();
    }
}
