//! Session registry: the authoritative participant table

use std::collections::HashMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws::protocol::{Participant, Position, ServerMsg};

use super::RelayError;

/// Spawns are drawn from a square of this half-width around the origin
pub const SPAWN_HALF_EXTENT: f64 = 50.0;

/// Pick a spawn uniformly in the horizontal square, on the ground plane
pub fn random_spawn<R: Rng>(rng: &mut R) -> Position {
    Position {
        x: rng.gen_range(-SPAWN_HALF_EXTENT..=SPAWN_HALF_EXTENT),
        y: 0.0,
        z: rng.gen_range(-SPAWN_HALF_EXTENT..=SPAWN_HALF_EXTENT),
    }
}

/// One live connection
#[derive(Debug)]
struct Session {
    participant: Participant,
    outbox: mpsc::Sender<ServerMsg>,
}

/// Participant records keyed by identity, plus each connection's outbox
pub struct SessionRegistry {
    sessions: HashMap<Uuid, Session>,
    rng: ChaCha8Rng,
}

impl SessionRegistry {
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self {
            sessions: HashMap::new(),
            rng,
        }
    }

    /// Register a new connection with a fresh identity and a random spawn
    pub fn connect(&mut self, outbox: mpsc::Sender<ServerMsg>) -> Participant {
        let mut id = Uuid::new_v4();
        while self.sessions.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let participant = Participant::new(id, random_spawn(&mut self.rng));
        self.sessions.insert(
            id,
            Session {
                participant: participant.clone(),
                outbox,
            },
        );
        participant
    }

    /// The caller's own record plus every registered participant
    pub fn snapshot(
        &self,
        id: Uuid,
    ) -> Result<(Participant, HashMap<Uuid, Participant>), RelayError> {
        let own = self.get(id).cloned().ok_or(RelayError::UnknownIdentity(id))?;
        let all = self
            .sessions
            .iter()
            .map(|(id, s)| (*id, s.participant.clone()))
            .collect();
        Ok((own, all))
    }

    /// Overwrite a participant's position verbatim
    pub fn set_position(&mut self, id: Uuid, position: Position) -> Result<(), RelayError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(RelayError::UnknownIdentity(id))?;
        session.participant.position = position;
        Ok(())
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Participant, RelayError> {
        self.sessions
            .remove(&id)
            .map(|s| s.participant)
            .ok_or(RelayError::UnknownIdentity(id))
    }

    pub fn get(&self, id: Uuid) -> Option<&Participant> {
        self.sessions.get(&id).map(|s| &s.participant)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn outbox(&self, id: Uuid) -> Option<&mpsc::Sender<ServerMsg>> {
        self.sessions.get(&id).map(|s| &s.outbox)
    }

    /// Outboxes of every session, optionally skipping one identity
    pub fn outboxes_except(
        &self,
        skip: Option<Uuid>,
    ) -> impl Iterator<Item = (Uuid, &mpsc::Sender<ServerMsg>)> + '_ {
        self.sessions
            .iter()
            .filter(move |(id, _)| Some(**id) != skip)
            .map(|(id, s)| (*id, &s.outbox))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(ChaCha8Rng::seed_from_u64(42))
    }

    fn outbox() -> mpsc::Sender<ServerMsg> {
        mpsc::channel(8).0
    }

    #[test]
    fn spawns_stay_inside_the_square() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..10_000 {
            let p = random_spawn(&mut rng);
            assert!((-SPAWN_HALF_EXTENT..=SPAWN_HALF_EXTENT).contains(&p.x));
            assert!((-SPAWN_HALF_EXTENT..=SPAWN_HALF_EXTENT).contains(&p.z));
            assert_eq!(p.y, 0.0);
        }
    }

    #[test]
    fn connect_assigns_defaults() {
        let mut reg = registry();
        let p = reg.connect(outbox());

        assert_eq!(p.rotation, 0.0);
        assert_eq!(p.health, 100);
        assert!(p.inventory.is_empty());
        assert_eq!(reg.get(p.id), Some(&p));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn identities_are_unique() {
        let mut reg = registry();
        let a = reg.connect(outbox());
        let b = reg.connect(outbox());
        assert_ne!(a.id, b.id);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn last_position_wins() {
        let mut reg = registry();
        let p = reg.connect(outbox());
        let moves = [
            Position::new(1.0, 0.0, 1.0),
            Position::new(-300.0, 12.5, 7.25),
            Position::new(0.5, 0.0, -0.5),
        ];
        for m in moves {
            reg.set_position(p.id, m).unwrap();
        }
        assert_eq!(reg.get(p.id).unwrap().position, moves[2]);
    }

    #[test]
    fn set_position_on_unknown_identity_fails() {
        let mut reg = registry();
        let err = reg
            .set_position(Uuid::new_v4(), Position::default())
            .unwrap_err();
        assert!(matches!(err, RelayError::UnknownIdentity(_)));
    }

    #[test]
    fn snapshot_includes_self_and_peers() {
        let mut reg = registry();
        let a = reg.connect(outbox());
        let b = reg.connect(outbox());

        let (own, all) = reg.snapshot(b.id).unwrap();
        assert_eq!(own.id, b.id);
        assert_eq!(all.len(), 2);
        assert!(all.contains_key(&a.id));
    }

    #[test]
    fn removed_identity_leaves_snapshots() {
        let mut reg = registry();
        let a = reg.connect(outbox());
        let b = reg.connect(outbox());
        reg.remove(a.id).unwrap();

        let (_, all) = reg.snapshot(b.id).unwrap();
        assert!(!all.contains_key(&a.id));
        assert!(reg.snapshot(a.id).is_err());
        assert!(reg.remove(a.id).is_err());
    }

    #[test]
    fn outboxes_except_skips_one() {
        let mut reg = registry();
        let a = reg.connect(outbox());
        let b = reg.connect(outbox());
        let ids: Vec<Uuid> = reg.outboxes_except(Some(a.id)).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![b.id]);
        assert_eq!(reg.outboxes_except(None).count(), 2);
    }
}
