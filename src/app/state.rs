//! Application state shared across routes

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::Config;
use crate::relay::{Relay, RelayHandle};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: RelayHandle,
}

impl AppState {
    /// Build the state and spawn the relay task. Must run inside a tokio runtime.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let rng = match config.spawn_seed {
            Some(seed) => {
                info!(seed, "Using fixed spawn seed");
                ChaCha8Rng::seed_from_u64(seed)
            }
            None => ChaCha8Rng::from_entropy(),
        };

        let (relay, handle) = Relay::new(rng);
        tokio::spawn(relay.run());

        Self {
            config,
            relay: handle,
        }
    }
}
