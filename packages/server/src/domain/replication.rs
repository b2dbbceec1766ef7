//! Object replication ("ghosting") collaborator.
//!
//! The mission controller only starts transfers; completion comes back as a
//! `GhostAlwaysObjectsReceived` acknowledgement from the client.

use async_trait::async_trait;

use missionlink_shared::protocol::MissionSequence;

use super::{ClientId, MessagePushError};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GhostReplicator: Send + Sync {
    /// Push path data ahead of the object transfer.
    async fn transmit_paths(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
        paths: &[String],
    ) -> Result<(), MessagePushError>;

    /// Start sending every ghost-always object to the client.
    async fn activate_ghosting(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
        objects: &[String],
    ) -> Result<(), MessagePushError>;
}
