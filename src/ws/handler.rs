//! WebSocket upgrade handler

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
use crate::relay::{RelayError, RelayHandle, OUTBOX_CAPACITY};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (ws_sink, ws_stream) = socket.split();
    let (outbox_tx, outbox_rx) = mpsc::channel::<ServerMsg>(OUTBOX_CAPACITY);

    // The identity handed back here is the only one this connection may act as.
    let participant_id = match state.relay.connect(outbox_tx.clone()).await {
        Ok(participant) => participant.id,
        Err(e) => {
            error!(error = %e, "Failed to register connection");
            return;
        }
    };

    info!(participant_id = %participant_id, "New WebSocket connection");

    let rate_limiter = ConnectionRateLimiter::new(state.config.input_rate_limit);
    run_session(
        participant_id,
        ws_sink,
        ws_stream,
        outbox_tx,
        outbox_rx,
        &state.relay,
        rate_limiter,
    )
    .await;

    // Cleanup on disconnect
    if let Err(e) = state.relay.disconnect(participant_id).await {
        warn!(participant_id = %participant_id, error = %e, "Failed to unregister connection");
    }

    info!(participant_id = %participant_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    participant_id: Uuid,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    outbox_tx: mpsc::Sender<ServerMsg>,
    mut outbox_rx: mpsc::Receiver<ServerMsg>,
    relay: &RelayHandle,
    rate_limiter: ConnectionRateLimiter,
) {
    // Spawn writer task: outbox -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(participant_id = %participant_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> relay
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(participant_id = %participant_id, "Rate limited input message");
                    continue;
                }

                let outcome = match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => dispatch(relay, participant_id, msg).await,
                    Err(e) => {
                        let e = RelayError::MalformedEvent(e.to_string());
                        warn!(participant_id = %participant_id, error = %e, "Failed to parse client message");
                        let _ = outbox_tx.try_send(e.to_msg());
                        Ok(())
                    }
                };

                if let Err(e) = outcome {
                    debug!(participant_id = %participant_id, error = %e, "Relay closed");
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(participant_id = %participant_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(participant_id = %participant_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(participant_id = %participant_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(participant_id = %participant_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(participant_id = %participant_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Abort writer task
    writer_handle.abort();
}

/// Forward a decoded client event to the relay under the bound identity
async fn dispatch(relay: &RelayHandle, id: Uuid, msg: ClientMsg) -> Result<(), RelayError> {
    match msg {
        ClientMsg::Move(position) => relay.move_to(id, position).await,
        ClientMsg::Attack(payload) => relay.attack(id, payload).await,
        ClientMsg::Pickup(req) => relay.pickup(id, req.item_id).await,
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
