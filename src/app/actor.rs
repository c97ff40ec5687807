//! App actor - message loop processing UI events and network responses

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        state: AppState,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state,
            network_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // Resume a saved session
        if let Some(cmd) = self.state.startup_command() {
            self.send(cmd);
        }
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = net_rx.recv() => {
                    if let Some(cmd) = self.state.handle_response(response) {
                        self.send(cmd);
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    fn send(&self, cmd: NetworkCommand) {
        let _ = self.network_tx.send(cmd);
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        let cmd = match event {
            // Text input
            UiEvent::CharInput(c) => {
                self.state.enter_char(c);
                None
            }
            UiEvent::Backspace => {
                self.state.delete_char();
                None
            }

            // Login
            UiEvent::SubmitLogin => self.state.submit_login(),
            UiEvent::RequestLogout => {
                self.state.request_logout();
                None
            }
            UiEvent::ConfirmLogout => {
                self.state.logout();
                None
            }
            UiEvent::CancelLogout => {
                self.state.cancel_logout();
                None
            }

            // Search
            UiEvent::NextResult => {
                self.state.next_result();
                None
            }
            UiEvent::PrevResult => {
                self.state.prev_result();
                None
            }
            UiEvent::SelectResult => self.state.select_result(),
            UiEvent::ClearSearch => {
                self.state.clear_search();
                None
            }

            // Forms
            UiEvent::NextField => {
                self.state.next_field();
                None
            }
            UiEvent::PrevField => {
                self.state.prev_field();
                None
            }

            // Session registration
            UiEvent::NextTreatment => {
                self.state.next_treatment();
                None
            }
            UiEvent::PrevTreatment => {
                self.state.prev_treatment();
                None
            }
            UiEvent::NextOutcome => {
                self.state.next_outcome();
                None
            }
            UiEvent::PrevOutcome => {
                self.state.prev_outcome();
                None
            }
            UiEvent::SelectOutcome(tag) => {
                self.state.select_outcome(tag);
                None
            }
            UiEvent::ConfirmSession => self.state.confirm_session(),

            // New patient
            UiEvent::OpenNewPatient => {
                self.state.open_new_patient();
                None
            }
            UiEvent::SavePatient => self.state.save_new_patient(),

            // Navigation
            UiEvent::GoHome => {
                self.state.go_home();
                None
            }
            UiEvent::DismissAlert => {
                self.state.dismiss_alert();
                None
            }

            // System
            UiEvent::Quit => return true,
        };

        if let Some(cmd) = cmd {
            self.send(cmd);
        }
        false
    }
}
