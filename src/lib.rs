//! Outbreak relay - position relay server and client motion core
//!
//! The server side assigns spawns, keeps one record per connection and fans
//! movement, attack and pickup events out to the other participants. The
//! client side mirrors that state and turns key/joystick input into
//! movement on a fixed timestep.

pub mod app;
pub mod catalog;
pub mod client;
pub mod config;
pub mod http;
pub mod motion;
pub mod relay;
pub mod util;
pub mod ws;

use std::future::Future;

use tokio::net::TcpListener;

use crate::app::AppState;
use crate::config::Config;
use crate::http::build_router;

/// Serve the relay on `listener` until `shutdown` resolves
pub async fn run<F>(listener: TcpListener, config: Config, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::new(config);
    let router = build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
