// Per-test relay bootstrapping. Each test gets its own server so participants
// from concurrently running tests never show up in each other's broadcasts.
use std::time::Duration;

use outbreak_relay::client::{self, RelayReceiver, RelaySender};
use outbreak_relay::config::Config;
use outbreak_relay::ws::protocol::{InitPayload, ServerMsg};

// How long to wait before concluding that no frame is coming.
pub const QUIET: Duration = Duration::from_millis(200);

// Bind an ephemeral port, serve the relay on it and return the WebSocket URL.
pub async fn spawn_relay() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");

    let config = Config {
        server_addr: addr,
        spawn_seed: Some(11),
        ..Config::default()
    };
    tokio::spawn(async move {
        outbreak_relay::run(listener, config, std::future::pending())
            .await
            .expect("server failed");
    });

    format!("ws://{addr}/ws")
}

pub struct TestClient {
    pub tx: RelaySender,
    pub rx: RelayReceiver,
    pub init: InitPayload,
}

impl TestClient {
    pub async fn join(url: &str) -> Self {
        let (tx, rx, init) = client::connect(url).await.expect("connect to relay");
        Self { tx, rx, init }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.init.own.id
    }

    // Next frame, failing the test if none arrives in time.
    pub async fn expect_event(&mut self) -> ServerMsg {
        tokio::time::timeout(Duration::from_secs(2), self.rx.next_event())
            .await
            .expect("timed out waiting for a frame")
            .expect("transport error")
            .expect("connection closed")
    }

    // Assert nothing arrives within QUIET.
    pub async fn expect_silence(&mut self) {
        if let Ok(frame) = tokio::time::timeout(QUIET, self.rx.next_event()).await {
            panic!("expected silence, got {frame:?}");
        }
    }
}
