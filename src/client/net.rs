//! WebSocket connection to the relay

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use glam::Vec3;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::ws::protocol::{ClientMsg, InitPayload, PickupRequest, ServerMsg};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid server message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Expected init, got {0}")]
    UnexpectedFirstMessage(String),

    #[error("Connection closed")]
    Closed,
}

/// Connect and wait for the `init` frame
pub async fn connect(url: &str) -> Result<(RelaySender, RelayReceiver, InitPayload), ClientError> {
    let (ws, _) = connect_async(url).await?;
    let (sink, stream) = ws.split();
    let sender = RelaySender { sink };
    let mut receiver = RelayReceiver { stream };

    match receiver.next_event().await? {
        Some(ServerMsg::Init(init)) => Ok((sender, receiver, init)),
        Some(other) => Err(ClientError::UnexpectedFirstMessage(format!("{other:?}"))),
        None => Err(ClientError::Closed),
    }
}

/// Outbound half
pub struct RelaySender {
    sink: SplitSink<WsStream, Message>,
}

impl RelaySender {
    pub async fn send(&mut self, msg: &ClientMsg) -> Result<(), ClientError> {
        let json = serde_json::to_string(msg)?;
        self.sink.send(Message::Text(json)).await?;
        Ok(())
    }

    pub async fn send_move(&mut self, position: Vec3) -> Result<(), ClientError> {
        self.send(&ClientMsg::Move(position.into())).await
    }

    pub async fn send_pickup(&mut self, item_id: impl Into<String>) -> Result<(), ClientError> {
        self.send(&ClientMsg::Pickup(PickupRequest {
            item_id: item_id.into(),
        }))
        .await
    }

    /// Raw text frame, for exercising the relay's error paths
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), ClientError> {
        self.sink.send(Message::Text(text.into())).await?;
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.sink.close().await?;
        Ok(())
    }
}

/// Inbound half
pub struct RelayReceiver {
    stream: SplitStream<WsStream>,
}

impl RelayReceiver {
    /// Next decoded server message; `None` once the connection is closed.
    /// Cancel-safe, so it can sit in a `select!`.
    pub async fn next_event(&mut self) -> Result<Option<ServerMsg>, ClientError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(_) => return Ok(None),
                other => debug!(?other, "Ignoring non-text frame"),
            }
        }
        Ok(None)
    }
}
