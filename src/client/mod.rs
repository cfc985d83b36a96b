//! Client side of the relay: connection, state mirror

pub mod mirror;
pub mod net;

pub use mirror::{ClientMirror, MirrorEvent};
pub use net::{connect, ClientError, RelayReceiver, RelaySender};
