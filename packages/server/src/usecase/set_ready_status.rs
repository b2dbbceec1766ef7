//! UseCase: Ready 状態の変更

use std::sync::Arc;

use missionlink_shared::protocol::ServerCommand;

use crate::domain::{ClientId, LobbyRepository, MessagePushError, MessagePusher};

pub struct SetReadyStatusUseCase {
    repository: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl SetReadyStatusUseCase {
    pub fn new(
        repository: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 値が変化した場合のみ全員に通知する
    pub async fn execute(&self, client_id: &ClientId, ready: bool) -> Result<bool, MessagePushError> {
        let changed = match self.repository.set_ready(client_id, ready).await {
            Ok(changed) => changed,
            Err(e) => {
                tracing::debug!("Ignoring ready status from '{}': {}", client_id, e);
                return Ok(false);
            }
        };
        if !changed {
            return Ok(false);
        }

        let targets = self.repository.get_all_client_ids().await;
        self.message_pusher
            .broadcast(
                targets,
                &ServerCommand::ClientReadyStatusChanged {
                    client_id: client_id.as_str().to_string(),
                    ready,
                },
            )
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            AdmissionPolicy, BanList, ConnectRequest, Identity, Lobby, MockMessagePusher,
            PlayerName, SlotPool, Timestamp,
        },
        infrastructure::repository::InMemoryLobbyRepository,
    };
    use tokio::sync::Mutex;

    async fn create_repository_with_alice() -> (Arc<InMemoryLobbyRepository>, ClientId) {
        let lobby = Lobby::new(
            "Test Server".to_string(),
            SlotPool::new(4, 0),
            AdmissionPolicy {
                pc_build: true,
                ..AdmissionPolicy::default()
            },
            BanList::new(),
        );
        let repository = Arc::new(InMemoryLobbyRepository::new(Arc::new(Mutex::new(lobby))));
        let id = ClientId::new("alice".to_string()).unwrap();
        let request = ConnectRequest {
            address: "127.0.0.1:5000".to_string(),
            name: PlayerName::new("Alice".to_string()).unwrap(),
            identity: Identity::default(),
            invite: None,
            demo: false,
            local: false,
        };
        repository
            .admit(id.clone(), request, Timestamp::new(0))
            .await
            .unwrap();
        (repository, id)
    }

    #[tokio::test]
    async fn test_ready_change_is_broadcast() {
        // テスト項目: Ready 状態が変化すると全員に通知される
        // given (前提条件):
        let (repository, alice) = create_repository_with_alice().await;
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_broadcast()
            .withf(|_, command| {
                matches!(command, ServerCommand::ClientReadyStatusChanged { ready: true, .. })
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let usecase = SetReadyStatusUseCase::new(repository.clone(), Arc::new(pusher));

        // when (操作):
        let changed = usecase.execute(&alice, true).await.unwrap();

        // then (期待する結果):
        assert!(changed);
        assert!(repository.get_connection(&alice).await.unwrap().ready);
    }

    #[tokio::test]
    async fn test_unchanged_ready_is_not_broadcast() {
        // テスト項目: 同じ値を再設定しても通知されない
        // given (前提条件):
        let (repository, alice) = create_repository_with_alice().await;
        let usecase = SetReadyStatusUseCase::new(repository, Arc::new(MockMessagePusher::new()));

        // when (操作):
        let changed = usecase.execute(&alice, false).await.unwrap();

        // then (期待する結果):
        assert!(!changed);
    }
}
