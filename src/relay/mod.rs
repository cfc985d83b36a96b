//! Relay: owns the session registry and fans events out to participants
//!
//! All registry mutations happen inside the single relay task, fed by the
//! command channel behind [`RelayHandle`]. Connection handlers never touch
//! the registry directly.

pub mod error;
pub mod registry;

pub use error::RelayError;
pub use registry::{random_spawn, SessionRegistry, SPAWN_HALF_EXTENT};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ws::protocol::{
    InitPayload, ItemPickedUp, Participant, PlayerAttacked, PlayerMoved, Position, ServerMsg,
};

/// Capacity of the command channel into the relay task
pub const COMMAND_CHANNEL_CAPACITY: usize = 1024;

/// Capacity of each connection's outbox
pub const OUTBOX_CAPACITY: usize = 256;

/// Commands accepted by the relay task. The identity on each command is the
/// one bound to the sending connection, never one taken from client data.
#[derive(Debug)]
pub enum RelayCommand {
    Connect {
        outbox: mpsc::Sender<ServerMsg>,
        reply: oneshot::Sender<Participant>,
    },
    Move {
        id: Uuid,
        position: Position,
    },
    Attack {
        id: Uuid,
        payload: Option<Value>,
    },
    Pickup {
        id: Uuid,
        item_id: String,
    },
    Disconnect {
        id: Uuid,
    },
}

/// Cheap, cloneable handle used by connection tasks
#[derive(Clone)]
pub struct RelayHandle {
    command_tx: mpsc::Sender<RelayCommand>,
    participant_count: Arc<AtomicUsize>,
}

impl RelayHandle {
    /// Register a connection. Its `init` frame is already queued on `outbox`
    /// when this returns.
    pub async fn connect(
        &self,
        outbox: mpsc::Sender<ServerMsg>,
    ) -> Result<Participant, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::Connect { outbox, reply }).await?;
        rx.await.map_err(|_| RelayError::Closed)
    }

    pub async fn move_to(&self, id: Uuid, position: Position) -> Result<(), RelayError> {
        self.send(RelayCommand::Move { id, position }).await
    }

    pub async fn attack(&self, id: Uuid, payload: Option<Value>) -> Result<(), RelayError> {
        self.send(RelayCommand::Attack { id, payload }).await
    }

    pub async fn pickup(&self, id: Uuid, item_id: String) -> Result<(), RelayError> {
        self.send(RelayCommand::Pickup { id, item_id }).await
    }

    pub async fn disconnect(&self, id: Uuid) -> Result<(), RelayError> {
        self.send(RelayCommand::Disconnect { id }).await
    }

    pub fn participant_count(&self) -> usize {
        self.participant_count.load(Ordering::Relaxed)
    }

    async fn send(&self, cmd: RelayCommand) -> Result<(), RelayError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| RelayError::Closed)
    }
}

/// The relay task state
pub struct Relay {
    registry: SessionRegistry,
    command_rx: mpsc::Receiver<RelayCommand>,
    participant_count: Arc<AtomicUsize>,
}

impl Relay {
    pub fn new(rng: ChaCha8Rng) -> (Self, RelayHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let participant_count = Arc::new(AtomicUsize::new(0));

        let handle = RelayHandle {
            command_tx,
            participant_count: participant_count.clone(),
        };

        let relay = Self {
            registry: SessionRegistry::new(rng),
            command_rx,
            participant_count,
        };

        (relay, handle)
    }

    /// Process commands until every handle is dropped
    pub async fn run(mut self) {
        info!("Relay started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle(cmd);
        }

        info!(
            participants = self.registry.len(),
            "All relay handles dropped, stopping"
        );
    }

    fn handle(&mut self, cmd: RelayCommand) {
        let result = match cmd {
            RelayCommand::Connect { outbox, reply } => {
                let participant = self.connect(outbox);
                if reply.send(participant.clone()).is_err() {
                    // Handler went away before hearing back.
                    self.disconnect(participant.id).map(|_| ())
                } else {
                    Ok(())
                }
            }
            RelayCommand::Move { id, position } => self.move_participant(id, position),
            RelayCommand::Attack { id, payload } => self.attack(id, payload),
            RelayCommand::Pickup { id, item_id } => self.pickup_item(id, item_id),
            RelayCommand::Disconnect { id } => self.disconnect(id).map(|_| ()),
        };

        if let Err(e) = result {
            warn!(error = %e, code = e.code(), "Rejected relay command");
        }
    }

    /// Register a participant, send it `init`, then announce it to everyone else
    pub fn connect(&mut self, outbox: mpsc::Sender<ServerMsg>) -> Participant {
        let participant = self.registry.connect(outbox);
        self.publish_count();

        // The registry just inserted this id, so the snapshot cannot miss.
        if let Ok((own, players)) = self.registry.snapshot(participant.id) {
            self.deliver(participant.id, ServerMsg::Init(InitPayload { own, players }));
        }
        self.fan_out(
            Some(participant.id),
            ServerMsg::PlayerJoined(participant.clone()),
        );

        info!(
            participant_id = %participant.id,
            x = participant.position.x,
            z = participant.position.z,
            participants = self.registry.len(),
            "Participant connected"
        );
        participant
    }

    /// The participant's own record plus everyone registered
    pub fn snapshot(&self, id: Uuid) -> Result<InitPayload, RelayError> {
        let (own, players) = self.registry.snapshot(id)?;
        Ok(InitPayload { own, players })
    }

    /// Overwrite the position and relay it to everyone but the mover
    pub fn move_participant(&mut self, id: Uuid, position: Position) -> Result<(), RelayError> {
        if !position.is_finite() {
            let err = RelayError::MalformedEvent(format!("non-finite position {position:?}"));
            self.deliver(id, err.to_msg());
            return Err(err);
        }
        self.registry.set_position(id, position)?;
        self.fan_out(
            Some(id),
            ServerMsg::PlayerMoved(PlayerMoved { id, data: position }),
        );
        Ok(())
    }

    /// Relay an attack to everyone, the attacker included. Nothing is resolved.
    pub fn attack(&mut self, id: Uuid, payload: Option<Value>) -> Result<(), RelayError> {
        if !self.registry.contains(id) {
            return Err(RelayError::UnknownIdentity(id));
        }

        let checked = match payload {
            Some(Value::Object(map)) => check_attack_payload(id, map),
            None | Some(Value::Null) => Ok(serde_json::Map::new()),
            Some(other) => Err(RelayError::MalformedEvent(format!(
                "attack payload must be an object, got {other}"
            ))),
        };

        let payload = match checked {
            Ok(payload) => payload,
            Err(e) => {
                self.deliver(id, e.to_msg());
                return Err(e);
            }
        };

        debug!(participant_id = %id, "Relaying attack");
        self.fan_out(
            None,
            ServerMsg::PlayerAttacked(PlayerAttacked {
                attacker: id,
                payload,
            }),
        );
        Ok(())
    }

    /// Relay a pickup to everyone. The catalog and inventories are not consulted.
    pub fn pickup_item(&mut self, id: Uuid, item_id: String) -> Result<(), RelayError> {
        if !self.registry.contains(id) {
            return Err(RelayError::UnknownIdentity(id));
        }

        debug!(participant_id = %id, item_id = %item_id, "Relaying pickup");
        self.fan_out(
            None,
            ServerMsg::ItemPickedUp(ItemPickedUp {
                player_id: id,
                item_id,
            }),
        );
        Ok(())
    }

    /// Drop the participant and tell everyone left
    pub fn disconnect(&mut self, id: Uuid) -> Result<Participant, RelayError> {
        let participant = self.registry.remove(id)?;
        self.publish_count();
        self.fan_out(None, ServerMsg::PlayerDisconnected(id));

        info!(
            participant_id = %id,
            participants = self.registry.len(),
            "Participant disconnected"
        );
        Ok(participant)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    fn publish_count(&self) {
        self.participant_count
            .store(self.registry.len(), Ordering::Relaxed);
    }

    fn deliver(&self, id: Uuid, msg: ServerMsg) {
        if let Some(outbox) = self.registry.outbox(id) {
            push(id, outbox, msg);
        }
    }

    fn fan_out(&self, skip: Option<Uuid>, msg: ServerMsg) {
        for (id, outbox) in self.registry.outboxes_except(skip) {
            push(id, outbox, msg.clone());
        }
    }
}

/// Strip a matching `attacker` field; reject one naming somebody else
fn check_attack_payload(
    id: Uuid,
    mut map: serde_json::Map<String, Value>,
) -> Result<serde_json::Map<String, Value>, RelayError> {
    if let Some(claimed) = map.remove("attacker") {
        let matches = claimed
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .is_some_and(|claimed| claimed == id);
        if !matches {
            return Err(RelayError::SpoofedIdentity {
                bound: id,
                claimed: claimed.to_string(),
            });
        }
    }
    Ok(map)
}

/// Fire-and-forget delivery into one outbox
fn push(id: Uuid, outbox: &mpsc::Sender<ServerMsg>, msg: ServerMsg) {
    match outbox.try_send(msg) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!(participant_id = %id, "Outbox full, dropping message");
        }
        Err(TrySendError::Closed(_)) => {
            debug!(participant_id = %id, "Outbox closed, dropping message");
        }
    }
}
