//! Persistent event channel to the simulation service.
//!
//! One [`ChannelLifecycle`] owns one websocket connection. Opening spawns a
//! single I/O task; events flow back through an ordered queue that is only
//! drained for subscribed event kinds. Closing (or dropping) the lifecycle
//! tears the connection down and makes any late event unobservable.

use std::{collections::HashSet, time::Duration};

use futures::{SinkExt, StreamExt};
use shared::protocol::{ClientRequest, ServerEvent};
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::events::{ChannelEvent, EventKind};

pub const DEFAULT_CHANNEL_PATH: &str = "/ws";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("server_url must start with http:// or https://, got scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("invalid channel endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("a handler for '{0}' is already registered on this channel")]
    AlreadySubscribed(&'static str),
    #[error("channel is closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub channel_path: String,
    pub connect_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            channel_path: DEFAULT_CHANNEL_PATH.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Fire-and-forget outbound side of the channel.
///
/// `Ok` only means the request was queued; nothing is acknowledged.
pub trait EventSink: Send + Sync {
    fn emit(&self, request: ClientRequest) -> Result<(), ChannelError>;
}

#[derive(Debug, Clone)]
pub struct ChannelSender {
    outbound: mpsc::UnboundedSender<ClientRequest>,
}

impl EventSink for ChannelSender {
    fn emit(&self, request: ClientRequest) -> Result<(), ChannelError> {
        let event = request.event_name();
        match self.outbound.send(request) {
            Ok(()) => {
                debug!(event, "channel: queued client event");
                Ok(())
            }
            Err(_) => {
                debug!(event, "channel: connection is gone, dropping client event");
                Err(ChannelError::Closed)
            }
        }
    }
}

pub fn websocket_endpoint(server_url: &str, channel_path: &str) -> Result<Url, ChannelError> {
    let mut url = Url::parse(server_url.trim())?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ChannelError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|()| ChannelError::UnsupportedScheme(scheme.to_string()))?;
    // The channel path is appended to any base path the server is mounted under.
    let path = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        channel_path.trim_start_matches('/')
    );
    url.set_path(&path);
    Ok(url)
}

pub struct ChannelLifecycle {
    endpoint: Url,
    outbound: mpsc::UnboundedSender<ClientRequest>,
    inbound: mpsc::UnboundedReceiver<ChannelEvent>,
    subscriptions: HashSet<EventKind>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl ChannelLifecycle {
    /// Starts connecting in the background and returns immediately.
    ///
    /// Connectivity problems are reported as a single
    /// [`ChannelEvent::ConnectError`]; only a malformed endpoint fails here.
    /// Must be called from within a tokio runtime.
    pub fn open(server_url: &str, config: &ChannelConfig) -> Result<Self, ChannelError> {
        let endpoint = websocket_endpoint(server_url, &config.channel_path)?;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        info!(%endpoint, "channel: opening");
        tokio::spawn(drive_connection(
            endpoint.clone(),
            config.connect_timeout,
            outbound_rx,
            inbound_tx,
            shutdown_rx,
        ));

        Ok(Self {
            endpoint,
            outbound: outbound_tx,
            inbound: inbound_rx,
            subscriptions: HashSet::new(),
            shutdown: Some(shutdown_tx),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn subscribe(&mut self, kind: EventKind) -> Result<(), ChannelError> {
        if !self.subscriptions.insert(kind) {
            return Err(ChannelError::AlreadySubscribed(kind.wire_name()));
        }
        Ok(())
    }

    pub fn sender(&self) -> ChannelSender {
        ChannelSender {
            outbound: self.outbound.clone(),
        }
    }

    /// Next subscribed event in arrival order. Cancel safe.
    ///
    /// Returns `None` once the connection task has ended and its queue is drained.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            let event = self.inbound.recv().await?;
            if self.subscriptions.contains(&event.kind()) {
                return Some(event);
            }
            let event_name = event.kind().wire_name();
            trace!(event = event_name, "channel: no handler registered, dropping event");
        }
    }

    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(shutdown) = self.shutdown.take() else {
            return;
        };
        let _ = shutdown.send(());
        self.inbound.close();
        info!(endpoint = %self.endpoint, "channel: closed");
    }
}

impl Drop for ChannelLifecycle {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn drive_connection(
    endpoint: Url,
    connect_timeout: Duration,
    mut outbound: mpsc::UnboundedReceiver<ClientRequest>,
    inbound: mpsc::UnboundedSender<ChannelEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let connected = tokio::select! {
        _ = &mut shutdown => {
            debug!(%endpoint, "channel: closed before the connection was established");
            return;
        }
        connected = timeout(connect_timeout, connect_async(endpoint.as_str())) => connected,
    };
    let ws_stream = match connected {
        Ok(Ok((ws_stream, _))) => ws_stream,
        Ok(Err(err)) => {
            warn!(%endpoint, %err, "channel: failed to connect websocket");
            let _ = inbound.send(ChannelEvent::ConnectError);
            return;
        }
        Err(_) => {
            let timeout_ms = connect_timeout.as_millis() as u64;
            warn!(%endpoint, timeout_ms, "channel: connect timed out");
            let _ = inbound.send(ChannelEvent::ConnectError);
            return;
        }
    };
    info!(%endpoint, "channel: connected");

    let (mut writer, mut reader) = ws_stream.split();
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = writer.close().await;
                break;
            }
            request = outbound.recv() => {
                let Some(request) = request else {
                    let _ = writer.close().await;
                    break;
                };
                let text = match serde_json::to_string(&request) {
                    Ok(text) => text,
                    Err(err) => {
                        let event = request.event_name();
                        warn!(event, %err, "channel: failed to encode client event");
                        continue;
                    }
                };
                if let Err(err) = writer.send(Message::Text(text)).await {
                    warn!(event = request.event_name(), %err, "channel: websocket send failed");
                    let _ = inbound.send(ChannelEvent::ConnectError);
                    break;
                }
                debug!(event = request.event_name(), "channel: sent client event");
            }
            frame = reader.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let event = match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => ChannelEvent::from(event),
                        Err(err) => ChannelEvent::Error {
                            message: format!("invalid server event: {err}"),
                        },
                    };
                    if inbound.send(event).is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    warn!(%endpoint, "channel: server closed the connection");
                    let _ = inbound.send(ChannelEvent::ConnectError);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(%endpoint, %err, "channel: websocket receive failed");
                    let _ = inbound.send(ChannelEvent::ConnectError);
                    break;
                }
            },
        }
    }
    debug!(%endpoint, "channel: connection task finished");
}

#[cfg(test)]
#[path = "tests/channel_tests.rs"]
mod tests;
