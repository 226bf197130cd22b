//! Session state machine: the single writer of the scenario grid, the session
//! status and the operator-facing error.
//!
//! Two sources feed it: operator intents and channel events. Which of them may
//! write the grid depends on the status:
//!
//! | status                    | grid authority                               |
//! |---------------------------|----------------------------------------------|
//! | `Idle`, `Errored`         | local edits only; snapshots are ignored      |
//! | `AwaitingStart`, `Running`| remote snapshots only; edits are locked      |
//! | `Stopped`                 | both; in-transit snapshots are still applied |

use std::{fmt, sync::Arc};

use shared::{
    domain::{CellKind, Grid},
    protocol::ClientRequest,
};
use tracing::{debug, info, warn};

use crate::{
    channel::EventSink,
    events::{ChannelEvent, EditOutcome, Intent},
    scenario::Scenario,
    validator::{validate, Validity},
};

pub const CONNECT_FAILURE_MESSAGE: &str = "Failed to connect to server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    AwaitingStart,
    Running,
    Stopped,
    Errored,
}

impl SessionStatus {
    /// True while a run is pending or in flight; editing is locked.
    pub fn is_simulating(self) -> bool {
        matches!(self, SessionStatus::AwaitingStart | SessionStatus::Running)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::AwaitingStart => "awaiting_start",
            SessionStatus::Running => "running",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Errored => "errored",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before anything was emitted.
    Validation,
    /// Reported by the simulation service through an `error` event.
    Application,
    /// The channel could not connect or was lost.
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorState {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorState {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Application,
            message: message.into(),
        }
    }

    pub fn transport() -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: CONNECT_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Read-only projection handed to presentation after every state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub grid: Grid,
    pub status: SessionStatus,
    pub error: Option<ErrorState>,
    pub is_simulating: bool,
    pub runnable: bool,
}

impl SessionView {
    pub fn initial(grid_size: usize) -> Self {
        Self {
            grid: Grid::empty(grid_size),
            status: SessionStatus::Idle,
            error: None,
            is_simulating: false,
            runnable: false,
        }
    }
}

pub struct SessionController {
    scenario: Scenario,
    status: SessionStatus,
    error: Option<ErrorState>,
    sink: Arc<dyn EventSink>,
}

impl SessionController {
    pub fn new(grid_size: usize, sink: Arc<dyn EventSink>) -> Self {
        Self {
            scenario: Scenario::new(grid_size),
            status: SessionStatus::Idle,
            error: None,
            sink,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ErrorState> {
        self.error.as_ref()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            grid: self.scenario.grid().clone(),
            status: self.status,
            error: self.error.clone(),
            is_simulating: self.status.is_simulating(),
            runnable: validate(self.scenario.grid()).is_ok(),
        }
    }

    pub fn apply_intent(&mut self, intent: Intent) {
        debug!(intent = intent.name(), status = %self.status, "session: intent");
        match intent {
            Intent::SetCell { row, col, kind } => {
                let outcome = self.set_cell(row, col, kind);
                if outcome != EditOutcome::Applied {
                    debug!(row, col, %kind, ?outcome, "session: edit not applied");
                }
            }
            Intent::Start => self.start(),
            Intent::Stop => self.stop(),
            Intent::Reset => self.reset(),
        }
    }

    pub fn handle_event(&mut self, event: ChannelEvent) {
        let event_name = event.kind().wire_name();
        debug!(event = event_name, status = %self.status, "session: channel event");
        match event {
            ChannelEvent::GridUpdate { grid, done } => self.apply_snapshot(grid, done),
            ChannelEvent::Error { message } => self.fail(ErrorState::application(message)),
            ChannelEvent::ConnectError => self.fail(ErrorState::transport()),
        }
    }

    /// Silently refused while a run is pending or in flight.
    pub fn set_cell(&mut self, row: usize, col: usize, kind: CellKind) -> EditOutcome {
        if self.status.is_simulating() {
            return EditOutcome::Locked;
        }
        match self.scenario.set_cell(row, col, kind) {
            Ok(()) => EditOutcome::Applied,
            Err(_) => EditOutcome::OutOfBounds,
        }
    }

    pub fn start(&mut self) {
        match self.status {
            SessionStatus::Idle | SessionStatus::Stopped => {}
            SessionStatus::AwaitingStart | SessionStatus::Running => {
                warn!(status = %self.status, "session: start ignored, a run is in flight");
                return;
            }
            SessionStatus::Errored => {
                info!("session: start ignored until the scenario is reset");
                return;
            }
        }

        self.error = None;
        match validate(self.scenario.grid()) {
            Validity::Ok => {
                self.transition(SessionStatus::AwaitingStart);
                let request = ClientRequest::StartSimulation {
                    grid: self.scenario.grid().clone(),
                };
                if let Err(err) = self.sink.emit(request) {
                    warn!(%err, "session: start_simulation could not be sent");
                    self.fail(ErrorState::transport());
                }
            }
            Validity::Invalid(reason) => {
                info!(%reason, "session: scenario rejected before start");
                self.error = Some(ErrorState::validation(reason));
            }
        }
    }

    /// Leaves the grid as last known. An errored session stays errored until reset.
    pub fn stop(&mut self) {
        if self.status == SessionStatus::Errored {
            debug!("session: stop ignored, the session is errored");
            return;
        }
        self.emit_stop();
        self.transition(SessionStatus::Stopped);
    }

    pub fn reset(&mut self) {
        if self.status.is_simulating() {
            self.emit_stop();
        }
        self.scenario.clear();
        self.error = None;
        self.transition(SessionStatus::Idle);
    }

    /// Best effort; a dead channel has nothing left to stop.
    fn emit_stop(&mut self) {
        if let Err(err) = self.sink.emit(ClientRequest::StopSimulation) {
            debug!(%err, "session: stop_simulation not sent");
        }
    }

    fn apply_snapshot(&mut self, grid: Grid, done: bool) {
        if matches!(self.status, SessionStatus::Idle | SessionStatus::Errored) {
            debug!(status = %self.status, "session: ignoring snapshot outside a run");
            return;
        }

        if let Err(err) = self.scenario.replace_grid(grid) {
            warn!(%err, status = %self.status, "session: rejecting snapshot");
            if self.status.is_simulating() {
                let message = format!("invalid snapshot: {err}");
                self.error = Some(ErrorState::application(message));
                self.transition(SessionStatus::Errored);
            }
            return;
        }

        if self.status.is_simulating() {
            let next = if done {
                SessionStatus::Stopped
            } else {
                SessionStatus::Running
            };
            self.transition(next);
        }
    }

    fn fail(&mut self, error: ErrorState) {
        warn!(
            kind = ?error.kind,
            message = %error.message,
            status = %self.status,
            "session: failure reported"
        );
        self.error = Some(error);
        if self.status.is_simulating() {
            self.transition(SessionStatus::Errored);
        }
    }

    fn transition(&mut self, next: SessionStatus) {
        if self.status != next {
            info!(from = %self.status, to = %next, "session: status changed");
            self.status = next;
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
