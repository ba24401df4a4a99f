//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Direct replies queued per connection
const REPLY_CHANNEL_CAPACITY: usize = 32;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    state.spectators.insert(connection_id, unix_millis());
    info!(
        connection_id = %connection_id,
        spectators = state.spectators.len(),
        "New WebSocket connection"
    );

    let (mut ws_sink, ws_stream) = socket.split();

    // Subscribe before the first snapshot so no tick is missed in between
    let snapshot_rx = state.snapshot_tx.subscribe();

    let welcome = ServerMsg::Welcome {
        connection_id,
        server_now_ms: state.now_ms(),
    };
    let current = ServerMsg::State {
        payload: Box::new(state.snapshot()),
    };
    for msg in [&welcome, &current] {
        if let Err(e) = send_msg(&mut ws_sink, msg).await {
            error!(connection_id = %connection_id, error = %e, "Failed to send initial state");
            state.spectators.remove(&connection_id);
            return;
        }
    }

    run_session(connection_id, &state, ws_sink, ws_stream, snapshot_rx).await;

    state.spectators.remove(&connection_id);
    info!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    connection_id: Uuid,
    state: &AppState,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    mut snapshot_rx: broadcast::Receiver<ServerMsg>,
) {
    let rate_limiter = ConnectionRateLimiter::new();
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMsg>(REPLY_CHANNEL_CAPACITY);

    // Spawn writer task: broadcast snapshots and direct replies -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                reply = reply_rx.recv() => match reply {
                    Some(msg) => msg,
                    None => break,
                },
                broadcast = snapshot_rx.recv() => match broadcast {
                    Ok(msg) => msg,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(
                            connection_id = %connection_id,
                            lagged_count = n,
                            "Client lagged, skipping {} snapshots", n
                        );
                        // Continue - the next snapshot is complete anyway
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(connection_id = %connection_id, "Snapshot channel closed");
                        break;
                    }
                },
            };

            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(connection_id = %connection_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> votes
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check() {
                    warn!(connection_id = %connection_id, "Rate limited socket message");
                    continue;
                }

                let reply = match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(client_msg) => handle_client_msg(state, client_msg),
                    Err(e) => {
                        warn!(connection_id = %connection_id, error = %e, "Failed to parse client message");
                        ServerMsg::Error {
                            code: "bad_message".to_string(),
                            message: "Unrecognized message".to_string(),
                        }
                    }
                };

                if reply_tx.send(reply).await.is_err() {
                    debug!(connection_id = %connection_id, "Writer task gone");
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(connection_id = %connection_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(connection_id = %connection_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Apply one client message and produce the direct reply
fn handle_client_msg(state: &AppState, msg: ClientMsg) -> ServerMsg {
    match msg {
        ClientMsg::Vote { name, action } => match state.cast_vote(&name, &action) {
            Ok(action) => ServerMsg::VoteAccepted { action },
            Err(e) => ServerMsg::VoteRejected {
                code: e.code().to_string(),
                message: e.to_string(),
            },
        },
        ClientMsg::Ping { t } => ServerMsg::Pong { t },
    }
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn state() -> AppState {
        AppState::new(Config {
            opponent: "idle".to_string(),
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn test_ping_gets_pong() {
        let reply = handle_client_msg(&state(), ClientMsg::Ping { t: 42 });
        assert!(matches!(reply, ServerMsg::Pong { t: 42 }));
    }

    #[test]
    fn test_vote_reply() {
        let state = state();
        let vote = || ClientMsg::Vote {
            name: "alice".to_string(),
            action: "FORWARD".to_string(),
        };

        match handle_client_msg(&state, vote()) {
            ServerMsg::VoteRejected { code, .. } => assert_eq!(code, "not_voting"),
            other => panic!("unexpected {other:?}"),
        }

        state.start();
        assert!(matches!(
            handle_client_msg(&state, vote()),
            ServerMsg::VoteAccepted { .. }
        ));
    }
}
