use ratatui::{prelude::*, widgets::*};

use crate::app::state::AlertLevel;
use crate::models::{OutcomeTag, Patient};
use crate::risk::{self, RiskTier};

/// Renders a text input field
pub fn render_input<'a>(content: &'a str, title: &'a str, is_focused: bool) -> Paragraph<'a> {
    let style = if is_focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title);

    Paragraph::new(content).block(block)
}

/// Risk tier color
pub fn risk_color(tier: RiskTier) -> Color {
    match tier {
        RiskTier::Normal => Color::Green,
        RiskTier::Low => Color::Yellow,
        RiskTier::Exhausted => Color::Red,
    }
}

/// Alert color
pub fn alert_color(level: AlertLevel) -> Color {
    match level {
        AlertLevel::Info => Color::Green,
        AlertLevel::Warning => Color::Yellow,
        AlertLevel::Danger => Color::Red,
    }
}

/// Remaining-sessions badge for a patient
pub fn risk_badge(patient: &Patient) -> Span<'static> {
    let tier = patient.risk();
    Span::styled(
        format!(" {} ", risk::badge_text(patient.remaining_sessions())),
        Style::default().fg(Color::Black).bg(risk_color(tier)),
    )
}

/// Consumed/authorized progress bar
pub fn session_gauge(patient: &Patient) -> Gauge<'static> {
    let percent = patient.progress_percent().round() as u16;
    Gauge::default()
        .block(Block::default().title(" Sessions used "))
        .gauge_style(Style::default().fg(risk_color(patient.risk())))
        .percent(percent.min(100))
        .label(format!(
            "{} / {}",
            patient.consumed_sessions, patient.authorized_sessions
        ))
}

/// Outcome tags as numbered chips, the selected one highlighted
pub fn outcome_chips(selected: Option<OutcomeTag>, is_focused: bool) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, tag) in OutcomeTag::ALL.iter().enumerate() {
        let style = if Some(*tag) == selected {
            Style::default().fg(Color::Black).bg(Color::Cyan).bold()
        } else if is_focused {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {}:{} ", i + 1, tag.label()), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Label/value pair for patient cards
pub fn field_line<'a>(label: &'a str, value: &str, fallback: &str) -> Line<'a> {
    let value = if value.trim().is_empty() { fallback.to_string() } else { value.to_string() };
    Line::from(vec![
        Span::styled(format!("{:<18}", label), Style::default().fg(Color::DarkGray)),
        Span::raw(value),
    ])
}
