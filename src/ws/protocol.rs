//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Health every participant starts with
pub const DEFAULT_HEALTH: i32 = 100;

/// World coordinate. Kept at full JSON precision so the relay hands out
/// exactly what the client sent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// JSON has no encoding for NaN or infinities
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<glam::Vec3> for Position {
    fn from(v: glam::Vec3) -> Self {
        Self::new(f64::from(v.x), f64::from(v.y), f64::from(v.z))
    }
}

impl From<Position> for glam::Vec3 {
    fn from(p: Position) -> Self {
        glam::Vec3::new(p.x as f32, p.y as f32, p.z as f32)
    }
}

/// Whether a participant is still human. Nothing transitions it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalState {
    Human,
    Zombie,
}

impl Default for VitalState {
    fn default() -> Self {
        Self::Human
    }
}

/// A connected player's record as the relay holds it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub position: Position,
    /// Yaw in radians
    pub rotation: f64,
    #[serde(rename = "state")]
    pub vital_state: VitalState,
    pub health: i32,
    /// Item ids, in pickup order
    pub inventory: Vec<String>,
}

impl Participant {
    pub fn new(id: Uuid, position: Position) -> Self {
        Self {
            id,
            position,
            rotation: 0.0,
            vital_state: VitalState::default(),
            health: DEFAULT_HEALTH,
            inventory: Vec::new(),
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Overwrite the sender's position
    Move(Position),

    /// Free-form attack payload, relayed as-is. May be omitted.
    Attack(Option<Value>),

    /// Announce an item pickup
    Pickup(PickupRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupRequest {
    pub item_id: String,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Sent once, right after connecting
    Init(InitPayload),

    /// Someone else connected
    PlayerJoined(Participant),

    /// Someone else moved
    PlayerMoved(PlayerMoved),

    /// Attack relayed to everyone, sender included
    PlayerAttacked(PlayerAttacked),

    /// Pickup relayed to everyone, sender included
    ItemPickedUp(ItemPickedUp),

    /// Participant left; carries the identity only
    PlayerDisconnected(Uuid),

    /// Rejected event, only sent to the offending connection
    Error(ErrorPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitPayload {
    #[serde(rename = "self")]
    pub own: Participant,
    /// Every registered participant, the receiver included
    pub players: HashMap<Uuid, Participant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMoved {
    pub id: Uuid,
    pub data: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAttacked {
    pub attacker: Uuid,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPickedUp {
    pub player_id: Uuid,
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}
