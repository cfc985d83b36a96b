//! Headless demo participant.
//!
//! Connects to a relay, walks in a slow circle, jumps every few seconds and
//! logs peers coming and going. Useful for eyeballing a running server.
//!
//! Environment:
//! - `RELAY_URL` (default `ws://127.0.0.1:3000/ws`)
//! - `RUN_SECONDS` stop after this many seconds (default: run until Ctrl+C)

use std::env;
use std::time::{Duration, Instant};

use glam::{Vec2, Vec3};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use outbreak_relay::client::{self, ClientMirror, MirrorEvent};
use outbreak_relay::motion::{DirectionKey, MotionState, JOYSTICK_RADIUS, STEP_SECONDS};

/// Joystick sweep speed, radians per second
const TURN_RATE: f32 = 0.4;
const JUMP_EVERY_SECS: f32 = 3.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();

    let url = env::var("RELAY_URL").unwrap_or_else(|_| "ws://127.0.0.1:3000/ws".to_string());
    let run_for = env::var("RUN_SECONDS")
        .ok()
        .map(|s| s.parse::<f32>())
        .transpose()?
        .map(Duration::try_from_secs_f32)
        .transpose()?;

    let (mut tx, mut rx, init) = client::connect(&url).await?;
    let mut mirror = ClientMirror::new(init);
    let mut motion = MotionState::new(Vec3::from(mirror.own().position));

    info!(
        participant_id = %mirror.id(),
        peers = mirror.peer_count(),
        "Joined relay at {}", url
    );

    motion.on_pointer_down();
    if let Some(pos) = motion.on_key(DirectionKey::Forward, true) {
        mirror.set_own_position(pos);
        tx.send_move(pos).await?;
    }

    let mut ticker = interval(Duration::from_secs_f32(STEP_SECONDS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let started = Instant::now();
    let mut last_frame = started;
    let mut next_jump = JUMP_EVERY_SECS;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                let t = now.duration_since(started).as_secs_f32();
                if run_for.is_some_and(|limit| now.duration_since(started) >= limit) {
                    info!("Run time elapsed");
                    break;
                }

                let angle = t * TURN_RATE;
                motion.on_pointer_move(Vec2::new(angle.cos(), angle.sin()) * JOYSTICK_RADIUS);

                if t >= next_jump {
                    motion.on_jump();
                    next_jump += JUMP_EVERY_SECS;
                }

                if let Some(pos) = motion.advance(dt) {
                    mirror.set_own_position(pos);
                    tx.send_move(pos).await?;
                }
            }
            event = rx.next_event() => {
                let Some(msg) = event? else {
                    info!("Relay closed the connection");
                    break;
                };
                match mirror.apply(msg) {
                    MirrorEvent::PeerJoined(id) => {
                        info!(peer_id = %id, peers = mirror.peer_count(), "Peer joined");
                    }
                    MirrorEvent::PeerLeft(id) => {
                        info!(peer_id = %id, peers = mirror.peer_count(), "Peer left");
                    }
                    MirrorEvent::Rejected(e) => {
                        warn!(code = %e.code, "Relay rejected an event: {}", e.message);
                    }
                    other => debug!(?other, "Relay event"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C");
                break;
            }
        }
    }

    if let Err(e) = tx.close().await {
        debug!(error = %e, "Close failed");
    }
    Ok(())
}
