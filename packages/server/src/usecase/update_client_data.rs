//! UseCase: クライアントデータ（名前・identity）の更新
//!
//! 接続済みのクライアントが名前や identity を送り直した場合に呼ばれます。
//! スロットは受け入れ時に取得済みのため、ここでは再取得されません。
//! 招待・ローカル接続のフラグは接続時の値を引き継ぎます。

use std::sync::Arc;

use missionlink_shared::{protocol::ServerCommand, time::Clock};

use crate::domain::{
    ClientConnection, ClientData, ClientId, Identity, LobbyRepository, MessagePusher, PlayerName,
    RepositoryError, Timestamp,
};

use super::{error::UpdateClientDataError, server_params::broadcast_server_params};

pub struct UpdateClientDataUseCase {
    repository: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl UpdateClientDataUseCase {
    pub fn new(
        repository: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    pub async fn execute(
        &self,
        client_id: &ClientId,
        name: String,
        identity: String,
    ) -> Result<ClientConnection, UpdateClientDataError> {
        let name = PlayerName::new(name)?;
        let identity = Identity::new(identity)?;
        let current = self
            .repository
            .get_connection(client_id)
            .await
            .ok_or_else(|| RepositoryError::ClientNotFound(client_id.as_str().to_string()))?;

        let data = ClientData {
            name,
            identity,
            invited: current.invited,
            local: current.is_host,
        };
        let now = Timestamp::new(self.clock.now_millis());
        let update = self
            .repository
            .update_client_data(client_id, data, now)
            .await?;
        let connection = update.connection;

        let others: Vec<ClientId> = self
            .repository
            .get_all_client_ids()
            .await
            .into_iter()
            .filter(|id| id != client_id)
            .collect();
        let pushed = async {
            self.message_pusher
                .push_to(
                    client_id,
                    &ServerCommand::ClientJoined {
                        client: connection.to_join_data(),
                        is_me: true,
                    },
                )
                .await?;
            self.message_pusher
                .broadcast(
                    others,
                    &ServerCommand::ClientJoined {
                        client: connection.to_join_data(),
                        is_me: false,
                    },
                )
                .await?;
            broadcast_server_params(self.repository.as_ref(), self.message_pusher.as_ref()).await
        };
        if let Err(e) = pushed.await {
            tracing::warn!("Failed to announce updated data of '{}': {}", client_id, e);
        }

        tracing::info!("Client '{}' updated its data (name: {})", client_id, connection.name);
        Ok(connection)
    }
}
