//! UseCase: サーバーパラメータの取得と通知

use std::sync::Arc;

use missionlink_shared::protocol::{ServerCommand, ServerParams};

use crate::domain::{LobbyRepository, MessagePushError, MessagePusher};

/// サーバーパラメータ取得のユースケース
pub struct ServerParamsUseCase {
    repository: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ServerParamsUseCase {
    pub fn new(
        repository: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 現在のサーバーパラメータを取得
    pub async fn execute(&self) -> ServerParams {
        self.repository.get_server_params().await
    }

    /// 全クライアントにサーバーパラメータを通知
    pub async fn broadcast(&self) -> Result<(), MessagePushError> {
        broadcast_server_params(self.repository.as_ref(), self.message_pusher.as_ref()).await
    }
}

/// 接続中の全クライアントに `ServerParams` を送信
///
/// 参加・切断の度に呼ばれる。スロット数などはクライアント数に依存するため、
/// 全員に送り直す。
pub(super) async fn broadcast_server_params(
    repository: &dyn LobbyRepository,
    message_pusher: &dyn MessagePusher,
) -> Result<(), MessagePushError> {
    let params = repository.get_server_params().await;
    let targets = repository.get_all_client_ids().await;
    message_pusher
        .broadcast(targets, &ServerCommand::ServerParams(params))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{AdmissionPolicy, BanList, Lobby, MockMessagePusher, SlotPool},
        infrastructure::repository::InMemoryLobbyRepository,
    };
    use tokio::sync::Mutex;

    fn create_test_repository() -> Arc<InMemoryLobbyRepository> {
        let lobby = Lobby::new(
            "Test Server".to_string(),
            SlotPool::new(8, 2),
            AdmissionPolicy::default(),
            BanList::new(),
        );
        Arc::new(InMemoryLobbyRepository::new(Arc::new(Mutex::new(lobby))))
    }

    #[tokio::test]
    async fn test_execute_returns_slot_counts() {
        // テスト項目: サーバーパラメータに設定どおりのスロット数が含まれる
        // given (前提条件):
        let repository = create_test_repository();
        let usecase = ServerParamsUseCase::new(repository, Arc::new(MockMessagePusher::new()));

        // when (操作):
        let params = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(params.host_name, "Test Server");
        assert_eq!(params.public_slots_free, 6);
        assert_eq!(params.private_slots_free, 2);
        assert!(!params.mission_running);
    }

    #[tokio::test]
    async fn test_broadcast_sends_server_params() {
        // テスト項目: broadcast で ServerParams コマンドが送信される
        // given (前提条件):
        let repository = create_test_repository();
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_broadcast()
            .withf(|_, command| matches!(command, ServerCommand::ServerParams(_)))
            .times(1)
            .returning(|_, _| Ok(()));
        let usecase = ServerParamsUseCase::new(repository, Arc::new(pusher));

        // when (操作):
        let result = usecase.broadcast().await;

        // then (期待する結果):
        assert!(result.is_ok());
    }
}
