//! Output formatting helpers for CLI commands

use crate::identity::IdentityOutcome;
use crate::stream::{ConnectionEvent, ConnectionState, StreamMonitor};
use chrono::Utc;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::{json, Value};

/// Get status icon for a connection state
pub fn status_icon(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Open => "●",
        ConnectionState::Connecting => "○",
        ConnectionState::Retrying => "↻",
        ConnectionState::Error => "✗",
    }
}

/// Colored status chip, e.g. "● open"
pub fn status_chip(state: ConnectionState) -> String {
    let chip = format!("{} {}", status_icon(state), state);
    match state {
        ConnectionState::Open => chip.green().to_string(),
        ConnectionState::Connecting => chip.yellow().to_string(),
        ConnectionState::Retrying => chip.cyan().to_string(),
        ConnectionState::Error => chip.red().to_string(),
    }
}

/// One human-readable line for an event, or `None` for events that only
/// update the endpoint description.
pub fn format_event_line(event: &ConnectionEvent, monitor: &StreamMonitor) -> Option<String> {
    let time = Utc::now().format("%H:%M:%S").to_string().dimmed();
    let chip = status_chip(monitor.state);

    let detail = match event {
        ConnectionEvent::Connecting { attempt: 0 } => {
            format!("connecting to {}", monitor.info.url.as_deref().unwrap_or("?"))
        }
        ConnectionEvent::Connecting { attempt } => format!("reconnecting (attempt {})", attempt),
        ConnectionEvent::Open => "stream open".to_string(),
        ConnectionEvent::Message(payload) => payload.to_string(),
        ConnectionEvent::Error(e) => e.to_string().red().to_string(),
        ConnectionEvent::Retrying { attempt, delay } => {
            format!("retry #{} in {}ms", attempt, delay.as_millis())
        }
        ConnectionEvent::InfoUpdate(_) => return None,
    };

    Some(format!("{} {} {}", time, chip, detail))
}

/// One JSON object per event, for `watch --json`.
pub fn event_json(event: &ConnectionEvent) -> Value {
    match event {
        ConnectionEvent::Connecting { attempt } => {
            json!({"kind": event.kind(), "attempt": attempt})
        }
        ConnectionEvent::Open => json!({"kind": event.kind()}),
        ConnectionEvent::Message(payload) => json!({"kind": event.kind(), "data": payload}),
        ConnectionEvent::Error(e) => json!({"kind": event.kind(), "error": e.to_string()}),
        ConnectionEvent::InfoUpdate(update) => json!({
            "kind": event.kind(),
            "url": update.url,
            "host": update.host,
            "port": update.port,
            "opened_at": update.opened_at,
            "disconnected_at": update.disconnected_at.flatten(),
            "initialization_failed": update.initialization_failed,
        }),
        ConnectionEvent::Retrying { attempt, delay } => json!({
            "kind": event.kind(),
            "attempt": attempt,
            "delay_ms": delay.as_millis() as u64,
        }),
    }
}

/// Format an identity lookup as a two-column table
pub fn format_identity_table(outcome: &IdentityOutcome) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);

    match outcome {
        IdentityOutcome::Anonymous => {
            table.add_row(vec![Cell::new("status"), Cell::new("anonymous".yellow())]);
        }
        IdentityOutcome::Unauthenticated => {
            table.add_row(vec![Cell::new("status"), Cell::new("unauthenticated".red())]);
        }
        IdentityOutcome::User(data) => {
            table.add_row(vec![Cell::new("status"), Cell::new("authenticated".green())]);
            match data.as_object() {
                Some(fields) => {
                    for (key, value) in fields {
                        table.add_row(vec![Cell::new(key), Cell::new(display_value(value))]);
                    }
                }
                None => {
                    table.add_row(vec![Cell::new("user"), Cell::new(data.to_string())]);
                }
            }
        }
    }

    table.to_string()
}

/// Format an identity lookup as JSON
pub fn format_identity_json(outcome: &IdentityOutcome) -> String {
    serde_json::to_string_pretty(outcome)
        .unwrap_or_else(|e| json!({"error": e.to_string()}).to_string())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
