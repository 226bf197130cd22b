//! Single-task event loop joining operator intents and channel events.

use std::sync::Arc;

use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::{
    channel::{ChannelError, ChannelLifecycle},
    config::ClientSettings,
    controller::{SessionController, SessionView},
    events::{EventKind, Intent},
};

#[derive(Debug, Error)]
#[error("session has shut down")]
pub struct SessionClosed;

pub struct SessionHandle {
    intents: mpsc::UnboundedSender<Intent>,
    view: watch::Receiver<SessionView>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn submit(&self, intent: Intent) -> Result<(), SessionClosed> {
        self.intents.send(intent).map_err(|_| SessionClosed)
    }

    pub fn view(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Stops accepting intents, waits for the loop to close the channel.
    pub async fn shutdown(self) {
        let Self { intents, task, .. } = self;
        drop(intents);
        let _ = task.await;
    }
}

/// Opens the simulation channel and starts the session loop on the current runtime.
pub fn spawn_session(settings: &ClientSettings) -> Result<SessionHandle, ChannelError> {
    let mut channel = ChannelLifecycle::open(&settings.server_url, &settings.channel_config())?;
    for kind in EventKind::ALL {
        channel.subscribe(kind)?;
    }

    let controller = SessionController::new(settings.grid_size, Arc::new(channel.sender()));
    let (view_tx, view_rx) = watch::channel(controller.view());
    let (intent_tx, intent_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(run_session(controller, channel, intent_rx, view_tx));

    Ok(SessionHandle {
        intents: intent_tx,
        view: view_rx,
        task,
    })
}

/// Processes one intent or event at a time and publishes the resulting view.
/// Each source is handled in its own arrival order; when both are ready the
/// pending intent goes first. Returns once every intent sender is gone; the
/// channel is closed on the way out.
pub async fn run_session(
    mut controller: SessionController,
    mut channel: ChannelLifecycle,
    mut intents: mpsc::UnboundedReceiver<Intent>,
    view: watch::Sender<SessionView>,
) {
    info!(
        endpoint = %channel.endpoint(),
        grid_size = controller.scenario().size(),
        "session: started"
    );
    let mut channel_live = true;

    loop {
        tokio::select! {
            // Intents first: a steady snapshot stream must not starve operator input.
            biased;

            intent = intents.recv() => match intent {
                Some(intent) => controller.apply_intent(intent),
                None => break,
            },
            event = channel.next_event(), if channel_live => match event {
                Some(event) => controller.handle_event(event),
                None => {
                    debug!("session: channel drained");
                    channel_live = false;
                    continue;
                }
            },
        }

        view.send_if_modified(|current| {
            let next = controller.view();
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    channel.close();
    info!("session: ended");
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
