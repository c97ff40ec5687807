//! Kine TUI - session registration client for a physical-therapy practice
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async backend calls

mod app;
mod config;
mod constants;
mod messages;
mod models;
mod network;
mod offline;
mod risk;
mod search;
mod storage;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use app::state::{AppState, LastSession};
use app::AppActor;
use config::AppConfig;
use constants::{APP_NAME, APP_VERSION, CACHE_VERSION};
use messages::render::RegistrationView;
use messages::ui_events::{key_to_ui_event, NewPatientField, Popup, RegisterField, Screen};
use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use models::format_outcome;
use network::{ApiClient, NetworkActor};
use offline::OfflineCache;
use storage::SessionStore;
use ui::{
    alert_color, field_line, outcome_chips, render_input, risk_badge, risk_color, session_gauge,
};

#[derive(Parser, Debug)]
#[command(name = "kine")]
#[command(version)]
#[command(about = "Register physical-therapy sessions from the terminal")]
struct Args {
    /// Backend endpoint
    #[arg(long, env = "KINE_BACKEND_URL")]
    backend_url: Option<String>,

    /// Directory for the saved session, offline cache and log
    #[arg(long, env = "KINE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Forget the saved session and exit
    #[arg(long)]
    logout: bool,

    /// Print the saved session and exit
    #[arg(long)]
    whoami: bool,
}

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path);
    if let Some(url) = args.backend_url {
        config.backend_url = url;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(secs) = args.timeout {
        config.request_timeout_secs = Some(secs);
    }

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(&data_dir, "kine.log");
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!(version = APP_VERSION, backend = %config.backend_url, "Starting");

    let session_store = SessionStore::new(&data_dir);

    if args.whoami {
        match session_store.load() {
            Some(user) => println!("{} <{}>", user.display_name, user.email),
            None => println!("Not logged in"),
        }
        return Ok(());
    }
    if args.logout {
        session_store.clear()?;
        println!("Session removed");
        return Ok(());
    }

    let cache = OfflineCache::new(&data_dir.join("cache"), CACHE_VERSION);
    let cache = match cache.install() {
        Ok(()) => Some(cache),
        Err(e) => {
            tracing::warn!("Offline cache disabled: {}", e);
            None
        }
    };
    let client = ApiClient::new(
        config.backend_url.clone(),
        config.request_timeout_secs.map(Duration::from_secs),
        cache,
    );
    let state = AppState::new(session_store, config.device_tag.clone());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(client, net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(state, net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    tracing::info!("Exiting");
    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(key, current_state.input) {
                    let quit = matches!(event, UiEvent::Quit);
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Top bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_top_bar(f, state, main_chunks[0]);

    match state.input.screen {
        Screen::Login => draw_login(f, state, main_chunks[1]),
        Screen::Loading => draw_loading(f, main_chunks[1]),
        Screen::Home => draw_home(f, state, main_chunks[1]),
        Screen::Register => draw_register(f, state, main_chunks[1]),
        Screen::Success => draw_success(f, state, main_chunks[1]),
        Screen::NewPatient => draw_new_patient(f, state, main_chunks[1]),
    }

    draw_status_bar(f, state, main_chunks[2]);

    // Popups
    match state.input.popup {
        Popup::Alert => draw_alert_popup(f, state, area),
        Popup::ConfirmLogout => draw_confirm_logout_popup(f, area),
        Popup::None => {}
    }
}

fn draw_top_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} ", APP_NAME),
        Style::default().fg(Color::Black).bg(Color::Cyan).bold(),
    )];

    if let Some(user) = &state.user {
        spans.push(Span::raw(format!(" {} ", user.display_name)));
        spans.push(Span::styled(
            format!(" {} patients ", state.patient_count),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if state.offline {
        spans.push(Span::styled(" [offline] ", Style::default().fg(Color::Yellow).bold()));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_login(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(60, 50, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(3), // Email
            Constraint::Length(2), // Error
            Constraint::Min(0),    // Hint
        ])
        .split(popup_area);

    let title = Paragraph::new("Sign in with your practitioner email")
        .style(Style::default().bold())
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let email_title = if state.login_busy { " Email (verifying...) " } else { " Email " };
    f.render_widget(
        render_input(&state.login_email, email_title, !state.login_busy),
        chunks[1],
    );
    if !state.login_busy {
        let max_x = chunks[1].x + chunks[1].width.saturating_sub(2);
        let cursor_x = (chunks[1].x + state.login_email.chars().count() as u16 + 1).min(max_x);
        f.set_cursor_position(Position::new(cursor_x, chunks[1].y + 1));
    }

    if let Some(error) = &state.login_error {
        let error = Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red));
        f.render_widget(error, chunks[2]);
    }

    let hint = Paragraph::new("Enter: sign in   Esc: quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(hint, chunks[3]);
}

fn draw_loading(f: &mut Frame, area: Rect) {
    let block = Paragraph::new("Loading patients...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(block, centered_rect(40, 20, area));
}

fn draw_home(f: &mut Frame, state: &RenderState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search
            Constraint::Min(3),    // Results
        ])
        .split(area);

    f.render_widget(
        render_input(&state.search_query, " Search patient (name or national ID) ", true),
        chunks[0],
    );
    let max_x = chunks[0].x + chunks[0].width.saturating_sub(2);
    let cursor_x = (chunks[0].x + state.search_query.chars().count() as u16 + 1).min(max_x);
    f.set_cursor_position(Position::new(cursor_x, chunks[0].y + 1));

    if state.search_query.trim().is_empty() {
        let help = Paragraph::new(
            "Type to search.\n\nCtrl+N  register a new patient\nCtrl+L  log out\nEsc     quit",
        )
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title(" Patients "));
        f.render_widget(help, chunks[1]);
        return;
    }

    if state.search_results.is_empty() {
        let none = Paragraph::new(
            "No patient found.\n\nPress Ctrl+N to register them as a new patient.",
        )
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Patients "));
        f.render_widget(none, chunks[1]);
        return;
    }

    let items: Vec<ListItem> = state
        .search_results
        .iter()
        .map(|p| {
            let insurer = if p.insurer.is_empty() { "No insurer" } else { p.insurer.as_str() };
            ListItem::new(vec![
                Line::from(Span::styled(p.full_name(), Style::default().bold())),
                Line::from(vec![
                    Span::styled(
                        format!("  ID: {} · {}  ", p.national_id, insurer),
                        Style::default().fg(Color::Gray),
                    ),
                    risk_badge(p),
                ]),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} result(s) - ↑/↓ Enter ", state.search_results.len())),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("› ");

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected_result));
    f.render_stateful_widget(list, chunks[1], &mut list_state);
}

fn draw_register(f: &mut Frame, state: &RenderState, area: Rect) {
    let Some(view) = &state.registration else {
        return;
    };
    let patient = &view.patient;
    let warning = patient.risk().warning(patient.remaining_sessions());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),                                      // Patient card
            Constraint::Length(if warning.is_some() { 3 } else { 0 }), // Risk warning
            Constraint::Length(4),                                      // Last session
            Constraint::Length(3),                                      // Treatment
            Constraint::Length(3),                                      // Outcome
            Constraint::Length(3),                                      // Note
            Constraint::Length(3),                                      // Confirm
            Constraint::Min(0),
        ])
        .split(area);

    // Patient card
    let card_block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(vec![
            Span::styled(format!(" {} ", patient.full_name()), Style::default().bold()),
            risk_badge(patient),
        ]));
    let card_inner = card_block.inner(chunks[0]);
    f.render_widget(card_block, chunks[0]);
    let card_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(2)])
        .split(card_inner);
    let details = Paragraph::new(vec![
        field_line("National ID", &patient.national_id, "-"),
        field_line("Insurer", &patient.insurer, "Private"),
        field_line("Plan", &patient.plan, "-"),
        field_line("Referring doctor", &patient.referring_doctor, "-"),
    ]);
    f.render_widget(details, card_chunks[0]);
    f.render_widget(session_gauge(patient), card_chunks[1]);

    // Risk warning
    if let Some(message) = warning {
        let color = risk_color(patient.risk());
        let warning_box = Paragraph::new(message)
            .style(Style::default().fg(color).bold())
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
        f.render_widget(warning_box, chunks[1]);
    }

    draw_last_session(f, view, chunks[2]);

    // Treatment
    let focus = view.draft.focus;
    let treatment_text = match view.selected_treatment() {
        Some(t) => t.description.clone(),
        None if view.treatments.is_empty() => "No treatments available".to_string(),
        None => "Select a treatment... (↑/↓)".to_string(),
    };
    f.render_widget(
        render_input(&treatment_text, " Treatment ", focus == RegisterField::Treatment),
        chunks[3],
    );

    // Outcome
    let outcome_border = if focus == RegisterField::Outcome {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let chips = outcome_chips(view.draft.outcome, focus == RegisterField::Outcome);
    let outcome = Paragraph::new(chips).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(outcome_border)
            .title(" Patient status (1-6, ←/→) "),
    );
    f.render_widget(outcome, chunks[4]);

    // Note
    f.render_widget(
        render_input(&view.draft.note, " Note (optional) ", focus == RegisterField::Note),
        chunks[5],
    );
    if focus == RegisterField::Note {
        let max_x = chunks[5].x + chunks[5].width.saturating_sub(2);
        let cursor_x = (chunks[5].x + view.draft.note.chars().count() as u16 + 1).min(max_x);
        f.set_cursor_position(Position::new(cursor_x, chunks[5].y + 1));
    }

    // Confirm
    let (label, style) = if view.busy {
        ("Saving...", Style::default().fg(Color::DarkGray))
    } else if view.can_confirm {
        ("✓ CONFIRM SESSION", Style::default().fg(Color::Black).bg(Color::Green).bold())
    } else {
        ("✓ CONFIRM SESSION (pick treatment and status)", Style::default().fg(Color::DarkGray))
    };
    let border = if focus == RegisterField::Confirm {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let confirm = Paragraph::new(Span::styled(label, style))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(border));
    f.render_widget(confirm, chunks[6]);
}

fn draw_last_session(f: &mut Frame, view: &RegistrationView, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Last session ");
    let lines = match &view.draft.last_session {
        LastSession::Loading => {
            vec![Line::styled("Loading...", Style::default().fg(Color::DarkGray))]
        }
        LastSession::Previous(s) => {
            let mut lines = vec![Line::from(vec![
                Span::styled(format!("{} – {}  ", s.date, s.time), Style::default().bold()),
                Span::raw(format!(
                    "{} · {} · {}",
                    s.practitioner,
                    s.treatment,
                    format_outcome(&s.outcome)
                )),
            ])];
            if !s.note.is_empty() {
                lines.push(Line::styled(
                    format!("\"{}\"", s.note),
                    Style::default().italic().fg(Color::Gray),
                ));
            }
            lines
        }
        LastSession::FirstVisit => vec![Line::styled(
            "First session for this patient",
            Style::default().fg(Color::Cyan),
        )],
        LastSession::Unavailable => Vec::new(),
    };
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_success(f: &mut Frame, state: &RenderState, area: Rect) {
    let Some(summary) = &state.success else {
        return;
    };
    let popup_area = centered_rect(70, 60, area);

    let mut lines = vec![
        Line::styled("✓ Session registered", Style::default().fg(Color::Green).bold()),
        Line::raw(""),
        Line::styled(summary.patient_name.clone(), Style::default().bold()),
        Line::raw(format!(
            "Session {} · {} · {}",
            summary.session_number, summary.date, summary.time
        )),
        Line::raw(format!("Practitioner: {}", summary.practitioner)),
    ];
    if let Some(alert) = &summary.alert {
        let color = if alert.is_limit_reached() { Color::Red } else { Color::Yellow };
        lines.push(Line::raw(""));
        lines.push(Line::styled(alert.message.clone(), Style::default().fg(color).bold()));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Enter: register another",
        Style::default().fg(Color::DarkGray),
    ));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, popup_area);
}

fn draw_new_patient(f: &mut Frame, state: &RenderState, area: Rect) {
    let focused = state.input.new_patient_field;

    let lines: Vec<Line> = NewPatientField::ALL
        .iter()
        .map(|field| {
            let is_focused = *field == focused;
            let marker = if field.is_required() { " *" } else { "" };
            let label_style = if is_focused {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default().fg(Color::Gray)
            };
            let value = state.new_patient.field(*field);
            let mut spans = vec![
                Span::styled(
                    format!("{:<22}", format!("{}{}", field.label(), marker)),
                    label_style,
                ),
                Span::raw(value.to_string()),
            ];
            if is_focused {
                spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
            }
            Line::from(spans)
        })
        .collect();

    let title = if state.new_patient_busy {
        " New patient (saving...) "
    } else {
        " New patient (* required) "
    };
    let form = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(form, area);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let status = match state.input.screen {
        Screen::Login => " Enter:sign in | Esc:quit ",
        Screen::Loading => " Loading... ",
        Screen::Home => " type:search | ↑/↓:move | Enter:select | Ctrl+N:new patient | Ctrl+L:log out ",
        Screen::Register => " Tab:next field | Ctrl+S:confirm | Esc:back ",
        Screen::Success => " Enter:register another | Ctrl+L:log out ",
        Screen::NewPatient => " Tab/↑/↓:field | Ctrl+S:save | Esc:cancel ",
    };

    let bar = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_alert_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let Some(alert) = &state.alert else {
        return;
    };
    let popup_area = centered_rect(60, 25, area);
    let color = alert_color(alert.level);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(" Press any key ")
        .style(Style::default().bg(Color::Black));

    let text = Paragraph::new(alert.message.as_str())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: false })
        .block(block);

    f.render_widget(Clear, popup_area);
    f.render_widget(text, popup_area);
}

fn draw_confirm_logout_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(40, 20, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Log out ")
        .style(Style::default().bg(Color::Black));

    let text = Paragraph::new("Log out? (y/n)")
        .alignment(Alignment::Center)
        .block(block);

    f.render_widget(Clear, popup_area);
    f.render_widget(text, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
