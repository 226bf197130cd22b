use serde::{Deserialize, Serialize};

use crate::domain::Grid;

pub const START_SIMULATION: &str = "start_simulation";
pub const STOP_SIMULATION: &str = "stop_simulation";
pub const GRID_UPDATE: &str = "grid_update";
pub const ERROR: &str = "error";
/// Raised by the channel itself, never sent by the simulation service.
pub const CONNECT_ERROR: &str = "connect_error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientRequest {
    StartSimulation { grid: Grid },
    StopSimulation,
}

impl ClientRequest {
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientRequest::StartSimulation { .. } => START_SIMULATION,
            ClientRequest::StopSimulation => STOP_SIMULATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    GridUpdate {
        grid: Grid,
        #[serde(default)]
        done: bool,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerEvent::GridUpdate { .. } => GRID_UPDATE,
            ServerEvent::Error { .. } => ERROR,
        }
    }
}
