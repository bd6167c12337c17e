//! Folds subscription events into the state a status view displays.

use super::events::ConnectionEvent;
use super::history::EventLog;
use super::state::{ConnectionInfo, ConnectionState, RetryState};

/// Connection state, endpoint description, retry telemetry and recent
/// messages of one subscription.
#[derive(Debug, Clone, Default)]
pub struct StreamMonitor {
    pub state: ConnectionState,
    pub info: ConnectionInfo,
    pub retry: RetryState,
    pub log: EventLog,
    /// Errors reported since the monitor was created
    pub error_count: u64,
    pub last_error: Option<String>,
}

impl StreamMonitor {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            log: EventLog::with_capacity(log_capacity),
            ..Default::default()
        }
    }

    /// Apply one event. Returns the new state if it changed.
    pub fn apply(&mut self, event: &ConnectionEvent) -> Option<ConnectionState> {
        let previous = self.state;

        match event {
            ConnectionEvent::Connecting { attempt } => {
                self.state = ConnectionState::Connecting;
                self.retry.attempt = *attempt;
                self.retry.next_delay_ms = None;
            }
            ConnectionEvent::Open => {
                self.state = ConnectionState::Open;
                self.retry.reset();
            }
            ConnectionEvent::Message(payload) => {
                self.log.push(payload.clone());
            }
            ConnectionEvent::Error(error) => {
                self.state = ConnectionState::Error;
                self.error_count += 1;
                self.last_error = Some(error.to_string());
            }
            ConnectionEvent::InfoUpdate(update) => {
                self.info.merge(update);
            }
            ConnectionEvent::Retrying { attempt, delay } => {
                self.state = ConnectionState::Retrying;
                self.retry.attempt = *attempt;
                self.retry.next_delay_ms = Some(delay.as_millis() as u64);
            }
        }

        if self.state != previous {
            tracing::debug!(
                from = %previous,
                to = %self.state,
                attempt = self.retry.attempt,
                "Stream state changed"
            );
            Some(self.state)
        } else {
            None
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }
}
