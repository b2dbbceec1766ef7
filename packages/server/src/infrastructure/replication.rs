//! Ghost replication over the client's command channel.
//!
//! Paths go out as one `MissionPaths` command; ghost-always objects follow as
//! `GhostAlwaysStarted` and one `GhostAlwaysObject` per object. The client
//! reports completion with `GhostAlwaysObjectsReceived`.

use std::sync::Arc;

use async_trait::async_trait;

use missionlink_shared::protocol::{MissionSequence, ServerCommand};

use crate::domain::{ClientId, GhostReplicator, MessagePushError, MessagePusher};

pub struct PushGhostReplicator {
    message_pusher: Arc<dyn MessagePusher>,
}

impl PushGhostReplicator {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }
}

#[async_trait]
impl GhostReplicator for PushGhostReplicator {
    async fn transmit_paths(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
        paths: &[String],
    ) -> Result<(), MessagePushError> {
        self.message_pusher
            .push_to(
                client_id,
                &ServerCommand::MissionPaths {
                    sequence,
                    paths: paths.to_vec(),
                },
            )
            .await
    }

    async fn activate_ghosting(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
        objects: &[String],
    ) -> Result<(), MessagePushError> {
        let ghost_count = u32::try_from(objects.len()).unwrap_or(u32::MAX);
        self.message_pusher
            .push_to(
                client_id,
                &ServerCommand::GhostAlwaysStarted {
                    sequence,
                    ghost_count,
                },
            )
            .await?;

        for (index, object) in (0..ghost_count).zip(objects) {
            self.message_pusher
                .push_to(
                    client_id,
                    &ServerCommand::GhostAlwaysObject {
                        sequence,
                        index,
                        object: object.clone(),
                    },
                )
                .await?;
        }
        tracing::debug!(
            "Ghosting activated for '{}': {} objects (seq {})",
            client_id,
            ghost_count,
            sequence
        );
        Ok(())
    }
}
