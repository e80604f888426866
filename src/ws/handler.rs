//! WebSocket upgrade handler and per-connection session

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::room::{RoomHandle, RoomInput};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Depth of the per-connection outbox
const OUTBOX_BUFFER: usize = 64;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    info!(%conn_id, "new WebSocket connection");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Private outbox: the room task and this connection's own error
    // replies both go through it, so ordering is preserved.
    let (outbox_tx, mut outbox_rx) = mpsc::channel::<ServerMsg>(OUTBOX_BUFFER);

    let writer_conn_id = conn_id;
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(conn_id = %writer_conn_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    let rate_limiter = ConnectionRateLimiter::new();
    let mut current_room: Option<RoomHandle> = None;

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(%conn_id, "rate limited message");
                    continue;
                }
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => {
                        handle_client_msg(conn_id, msg, &state, &outbox_tx, &mut current_room)
                            .await;
                    }
                    Err(e) => {
                        warn!(%conn_id, error = %e, "failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(%conn_id, "received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(%conn_id, "client initiated close");
                break;
            }
            Err(e) => {
                debug!(%conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    if let Some(room) = current_room {
        let _ = room.input_tx.send(RoomInput::Disconnect { conn_id }).await;
    }
    writer_handle.abort();

    info!(%conn_id, "WebSocket connection closed");
}

/// Route one parsed message: lobby messages talk to the registry, the
/// rest are forwarded to the connection's room task.
async fn handle_client_msg(
    conn_id: Uuid,
    msg: ClientMsg,
    state: &AppState,
    outbox_tx: &mpsc::Sender<ServerMsg>,
    current_room: &mut Option<RoomHandle>,
) {
    match msg {
        ClientMsg::CreateRoom => {
            if current_room.is_some() {
                let _ = outbox_tx
                    .send(ServerMsg::JoinError {
                        message: "Already in a room".into(),
                    })
                    .await;
                return;
            }
            let handle = state.rooms.create_room();
            let join = RoomInput::Join {
                conn_id,
                tx: outbox_tx.clone(),
            };
            if handle.input_tx.send(join).await.is_err() {
                error!(%conn_id, room = %handle.code, "room task gone right after create");
                return;
            }
            *current_room = Some(handle);
        }
        ClientMsg::JoinRoom { code } => {
            if current_room.is_some() {
                let _ = outbox_tx
                    .send(ServerMsg::JoinError {
                        message: "Already in a room".into(),
                    })
                    .await;
                return;
            }
            let code = code.trim().to_ascii_uppercase();
            let Some(handle) = state.rooms.get(&code) else {
                let _ = outbox_tx
                    .send(ServerMsg::JoinError {
                        message: "Room not found".into(),
                    })
                    .await;
                return;
            };
            let join = RoomInput::Join {
                conn_id,
                tx: outbox_tx.clone(),
            };
            if handle.input_tx.send(join).await.is_err() {
                let _ = outbox_tx
                    .send(ServerMsg::JoinError {
                        message: "Room not found".into(),
                    })
                    .await;
                return;
            }
            *current_room = Some(handle);
        }
        other => {
            let Some(room) = current_room.as_ref() else {
                debug!(%conn_id, "in-room message without a room");
                return;
            };
            let input = RoomInput::Client {
                conn_id,
                msg: other,
            };
            if room.input_tx.send(input).await.is_err() {
                debug!(%conn_id, room = %room.code, "room task ended");
                *current_room = None;
            }
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
