//! Local copy of the relay's view, kept current from server messages

use std::collections::HashMap;

use glam::Vec3;
use uuid::Uuid;

use crate::ws::protocol::{
    ErrorPayload, InitPayload, ItemPickedUp, Participant, PlayerAttacked, Position, ServerMsg,
};

/// What applying a server message did to the mirror
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorEvent {
    Reset,
    PeerJoined(Uuid),
    PeerMoved(Uuid),
    PeerLeft(Uuid),
    /// Passed through untouched
    Attacked(PlayerAttacked),
    /// Passed through untouched
    ItemPickedUp(ItemPickedUp),
    Rejected(ErrorPayload),
    /// Message carried nothing the mirror tracks
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ClientMirror {
    own: Participant,
    peers: HashMap<Uuid, Participant>,
}

impl ClientMirror {
    pub fn new(init: InitPayload) -> Self {
        let mut mirror = Self {
            own: init.own.clone(),
            peers: HashMap::new(),
        };
        mirror.reset(init);
        mirror
    }

    fn reset(&mut self, init: InitPayload) {
        let own_id = init.own.id;
        self.own = init.own;
        self.peers = init
            .players
            .into_iter()
            .filter(|(id, _)| *id != own_id)
            .collect();
    }

    pub fn apply(&mut self, msg: ServerMsg) -> MirrorEvent {
        match msg {
            ServerMsg::Init(init) => {
                self.reset(init);
                MirrorEvent::Reset
            }
            ServerMsg::PlayerJoined(p) => {
                if p.id == self.own.id {
                    return MirrorEvent::Ignored;
                }
                let id = p.id;
                self.peers.insert(id, p);
                MirrorEvent::PeerJoined(id)
            }
            ServerMsg::PlayerMoved(moved) => match self.peers.get_mut(&moved.id) {
                Some(peer) => {
                    peer.position = moved.data;
                    MirrorEvent::PeerMoved(moved.id)
                }
                None => MirrorEvent::Ignored,
            },
            ServerMsg::PlayerDisconnected(id) => {
                if self.peers.remove(&id).is_some() {
                    MirrorEvent::PeerLeft(id)
                } else {
                    MirrorEvent::Ignored
                }
            }
            ServerMsg::PlayerAttacked(attack) => MirrorEvent::Attacked(attack),
            ServerMsg::ItemPickedUp(pickup) => MirrorEvent::ItemPickedUp(pickup),
            ServerMsg::Error(e) => MirrorEvent::Rejected(e),
        }
    }

    /// Record a locally-driven move of our own avatar
    pub fn set_own_position(&mut self, position: Vec3) {
        self.own.position = Position::from(position);
    }

    pub fn own(&self) -> &Participant {
        &self.own
    }

    pub fn id(&self) -> Uuid {
        self.own.id
    }

    pub fn peer(&self, id: Uuid) -> Option<&Participant> {
        self.peers.get(&id)
    }

    pub fn peers(&self) -> impl Iterator<Item = &Participant> {
        self.peers.values()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}
