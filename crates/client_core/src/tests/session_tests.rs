use std::{future::Future, time::Duration};

use super::*;
use crate::controller::{ErrorKind, SessionStatus};
use axum::{
    extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    routing::get,
    Router,
};
use shared::domain::{CellKind, Grid};
use tokio::{net::TcpListener, time::timeout};

const WAIT: Duration = Duration::from_secs(5);

async fn serve_engine<H, Fut>(engine: H) -> String
where
    H: Fn(WebSocket) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let app = Router::new().route(
        "/ws",
        get(move |ws: WebSocketUpgrade| {
            let engine = engine.clone();
            async move { ws.on_upgrade(engine) }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

fn settings(server_url: String, grid_size: usize) -> ClientSettings {
    ClientSettings {
        server_url,
        grid_size,
        connect_timeout_ms: 2_000,
        ..ClientSettings::default()
    }
}

async fn wait_for_view(
    view: &mut watch::Receiver<SessionView>,
    predicate: impl FnMut(&SessionView) -> bool,
) -> SessionView {
    timeout(WAIT, view.wait_for(predicate))
        .await
        .expect("view within deadline")
        .expect("session alive")
        .clone()
}

fn paint_runnable(handle: &SessionHandle, size: usize) {
    handle
        .submit(Intent::SetCell {
            row: 0,
            col: 0,
            kind: CellKind::Runner,
        })
        .expect("submit");
    handle
        .submit(Intent::SetCell {
            row: size - 1,
            col: size - 1,
            kind: CellKind::Catcher,
        })
        .expect("submit");
}

/// Answers every `start_simulation` with the submitted grid moved one step, then done.
async fn two_step_engine(mut socket: WebSocket) {
    while let Some(Ok(msg)) = socket.recv().await {
        let WsMessage::Text(text) = msg else {
            continue;
        };
        let frame: serde_json::Value = serde_json::from_str(&text).expect("frame");
        if frame["type"] != "start_simulation" {
            continue;
        }
        let size = frame["payload"]["grid"]
            .as_array()
            .map(Vec::len)
            .expect("grid rows");
        let mut step = vec![vec![0u8; size]; size];
        step[0][1] = 3;
        step[size - 1][size - 2] = 2;
        let mut last = vec![vec![0u8; size]; size];
        last[0][1] = 2;

        for (grid, done) in [(step, false), (last, true)] {
            let reply = serde_json::json!({
                "type": "grid_update",
                "payload": { "grid": grid, "done": done }
            });
            if socket.send(WsMessage::Text(reply.to_string())).await.is_err() {
                return;
            }
        }
    }
}

#[tokio::test]
async fn full_run_ends_stopped_with_final_snapshot() {
    let server_url = serve_engine(two_step_engine).await;
    let handle = spawn_session(&settings(server_url, 4)).expect("spawn");
    let mut view = handle.view();

    paint_runnable(&handle, 4);
    wait_for_view(&mut view, |view| view.runnable).await;
    handle.submit(Intent::Start).expect("submit");

    let done = wait_for_view(&mut view, |view| view.status == SessionStatus::Stopped).await;
    let mut expected = Grid::empty(4);
    expected.set(0, 1, CellKind::Catcher).expect("set");
    assert_eq!(done.grid, expected);
    assert!(!done.is_simulating);
    assert!(done.error.is_none());

    handle.shutdown().await;
}

#[tokio::test]
async fn unreachable_server_surfaces_transport_error_and_fails_start() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let handle = spawn_session(&settings(format!("http://{addr}"), 3)).expect("spawn");
    let mut view = handle.view();

    let banner = wait_for_view(&mut view, |view| view.error.is_some()).await;
    assert_eq!(banner.status, SessionStatus::Idle);
    assert_eq!(banner.error.map(|error| error.kind), Some(ErrorKind::Transport));

    paint_runnable(&handle, 3);
    handle.submit(Intent::Start).expect("submit");
    let failed = wait_for_view(&mut view, |view| view.status == SessionStatus::Errored).await;
    assert_eq!(
        failed.error.map(|error| error.message),
        Some("Failed to connect to server".to_string())
    );

    handle.submit(Intent::Reset).expect("submit");
    let reset = wait_for_view(&mut view, |view| view.status == SessionStatus::Idle).await;
    assert_eq!(reset.grid, Grid::empty(3));
    assert!(reset.error.is_none());

    handle.shutdown().await;
}

#[tokio::test]
async fn shutdown_closes_channel_and_stops_publishing() {
    let (gone_tx, mut gone_rx) = mpsc::unbounded_channel::<()>();
    let server_url = serve_engine(move |mut socket: WebSocket| {
        let gone_tx = gone_tx.clone();
        async move {
            while let Some(Ok(_)) = socket.recv().await {}
            let _ = gone_tx.send(());
        }
    })
    .await;

    let handle = spawn_session(&settings(server_url, 3)).expect("spawn");
    let mut view = handle.view();
    handle
        .submit(Intent::SetCell {
            row: 1,
            col: 1,
            kind: CellKind::Obstacle,
        })
        .expect("submit");
    wait_for_view(&mut view, |view| view.grid.get(1, 1) == Some(CellKind::Obstacle)).await;

    handle.shutdown().await;

    timeout(WAIT, gone_rx.recv())
        .await
        .expect("server observed disconnect")
        .expect("gone");
    assert!(view.changed().await.is_err());
}

#[tokio::test]
async fn queued_intents_are_handled_before_a_queued_snapshot() {
    let pushed = {
        let mut grid = vec![vec![0u8; 3]; 3];
        grid[1][1] = 2;
        grid
    };
    let frame = serde_json::json!({
        "type": "grid_update",
        "payload": { "grid": pushed, "done": false }
    })
    .to_string();
    let server_url = serve_engine(move |mut socket: WebSocket| {
        let frame = frame.clone();
        async move {
            if socket.send(WsMessage::Text(frame)).await.is_err() {
                return;
            }
            while let Some(Ok(_)) = socket.recv().await {}
        }
    })
    .await;

    let config = settings(server_url, 3);
    let mut channel =
        ChannelLifecycle::open(&config.server_url, &config.channel_config()).expect("open");
    for kind in EventKind::ALL {
        channel.subscribe(kind).expect("subscribe");
    }
    let controller = SessionController::new(3, Arc::new(channel.sender()));
    let (view_tx, mut view) = watch::channel(controller.view());
    let (intent_tx, intent_rx) = mpsc::unbounded_channel();

    // Let the pushed snapshot reach the inbound queue before the loop runs.
    tokio::time::sleep(Duration::from_millis(300)).await;
    for intent in [
        Intent::SetCell {
            row: 0,
            col: 0,
            kind: CellKind::Runner,
        },
        Intent::SetCell {
            row: 2,
            col: 2,
            kind: CellKind::Catcher,
        },
        Intent::Start,
    ] {
        intent_tx.send(intent).expect("queue intent");
    }

    let task = tokio::spawn(run_session(controller, channel, intent_rx, view_tx));

    let running = wait_for_view(&mut view, |view| view.status == SessionStatus::Running).await;
    let mut expected = Grid::empty(3);
    expected.set(1, 1, CellKind::Catcher).expect("set");
    assert_eq!(running.grid, expected);

    drop(intent_tx);
    timeout(WAIT, task).await.expect("loop ends").expect("join");
}
