//! Operator intents and inbound channel events consumed by the session controller.

use shared::{
    domain::{CellKind, Grid},
    protocol::{self, ServerEvent},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SetCell {
        row: usize,
        col: usize,
        kind: CellKind,
    },
    Start,
    Stop,
    Reset,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::SetCell { .. } => "set_cell",
            Intent::Start => "start",
            Intent::Stop => "stop",
            Intent::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    GridUpdate { grid: Grid, done: bool },
    Error { message: String },
    /// Transport-level failure: the channel could not connect or was lost.
    ConnectError,
}

impl ChannelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChannelEvent::GridUpdate { .. } => EventKind::GridUpdate,
            ChannelEvent::Error { .. } => EventKind::Error,
            ChannelEvent::ConnectError => EventKind::ConnectError,
        }
    }
}

impl From<ServerEvent> for ChannelEvent {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::GridUpdate { grid, done } => ChannelEvent::GridUpdate { grid, done },
            ServerEvent::Error { message } => ChannelEvent::Error { message },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    GridUpdate,
    Error,
    ConnectError,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::GridUpdate,
        EventKind::Error,
        EventKind::ConnectError,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            EventKind::GridUpdate => protocol::GRID_UPDATE,
            EventKind::Error => protocol::ERROR,
            EventKind::ConnectError => protocol::CONNECT_ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// Editing is locked while a run is pending or in flight.
    Locked,
    OutOfBounds,
}
