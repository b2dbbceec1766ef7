//! Domain layer: the lobby aggregate, its value objects and the traits the
//! use cases depend on.

mod admission;
mod ban_list;
mod entity;
mod error;
mod hooks;
mod lobby;
mod message_pusher;
mod phase;
mod replication;
mod repository;
mod slot_pool;
mod value_object;

pub use admission::{AdmissionPolicy, ConnectRequest, check_admission};
pub use ban_list::{BanEntry, BanList};
pub use entity::{
    ClientConnection, ClientData, ClientUpdate, Mission, MissionCatalog, MissionState, SpawnPoint,
};
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use hooks::GameHooks;
pub use lobby::Lobby;
pub use message_pusher::{MessagePusher, PusherChannel};
pub use phase::{AckOutcome, MissionPhase, PhaseTransition, guard_transition};
pub use replication::GhostReplicator;
pub use repository::LobbyRepository;
pub use slot_pool::{SlotKind, SlotPool};
pub use value_object::{ClientId, ClientIdFactory, Identity, PlayerName, Timestamp};

#[cfg(test)]
pub use hooks::MockGameHooks;
#[cfg(test)]
pub use message_pusher::MockMessagePusher;
#[cfg(test)]
pub use replication::MockGhostReplicator;
