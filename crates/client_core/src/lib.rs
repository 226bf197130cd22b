//! Client-side scenario editing and simulation session control.
//!
//! The [`SessionController`] owns the grid and decides, per status, whether
//! local edits or remote snapshots may write it. [`ChannelLifecycle`] owns the
//! websocket to the simulation service, and [`spawn_session`] runs both on one
//! sequential event loop.

pub mod channel;
pub mod config;
pub mod controller;
pub mod events;
pub mod scenario;
pub mod session;
pub mod validator;

pub use channel::{ChannelConfig, ChannelError, ChannelLifecycle, ChannelSender, EventSink};
pub use config::{load_settings, ClientSettings};
pub use controller::{ErrorKind, ErrorState, SessionController, SessionStatus, SessionView};
pub use events::{ChannelEvent, EditOutcome, EventKind, Intent};
pub use scenario::Scenario;
pub use session::{run_session, spawn_session, SessionClosed, SessionHandle};
pub use validator::{validate, Validity};
