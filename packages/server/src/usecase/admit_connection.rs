//! UseCase: 接続受け入れ処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AdmitConnectionUseCase::execute() / announce_join()
//! - 受け入れ判定の結果と、参加時に送られるコマンドの順序
//!
//! ### どのような状況を想定しているか
//! - 正常系：空きのあるサーバーへの接続
//! - 異常系：満員・BAN による拒否
//! - エッジケース：既存クライアントがいる状態での参加通知

use std::sync::Arc;

use missionlink_shared::{protocol::ServerCommand, time::Clock};

use crate::domain::{
    ClientConnection, ClientIdFactory, ConnectRequest, LobbyRepository, MessagePushError,
    MessagePusher, PusherChannel, Timestamp,
};

use super::{error::ConnectError, server_params::broadcast_server_params};

/// 接続受け入れのユースケース
pub struct AdmitConnectionUseCase {
    repository: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl AdmitConnectionUseCase {
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

    /// 接続要求を受け入れ判定し、成功すれば送信チャンネルを登録
    ///
    /// # Returns
    ///
    /// * `Ok(ClientConnection)` - 受け入れ成功（スロット取得済み）
    /// * `Err(ConnectError::Rejected)` - 拒否（スロットは消費されない）
    pub async fn execute(
        &self,
        request: ConnectRequest,
        sender: PusherChannel,
    ) -> Result<ClientConnection, ConnectError> {
        let client_id = ClientIdFactory::generate();
        let now = Timestamp::new(self.clock.now_millis());
        let address = request.address.clone();

        let update = self
            .repository
            .admit(client_id.clone(), request, now)
            .await
            .map_err(|reason| {
                tracing::warn!("Rejected connection from {}: {}", address, reason.code());
                ConnectError::Rejected(reason)
            })?;

        self.message_pusher.register_client(client_id, sender).await;

        let connection = update.connection;
        tracing::info!(
            "Client '{}' ({}) admitted from {} using a {} slot",
            connection.name,
            connection.id,
            address,
            connection.slot.map(|s| s.as_str()).unwrap_or("no")
        );
        Ok(connection)
    }

    /// 参加したクライアントと既存クライアントに参加を通知
    ///
    /// 1. 本人に `ConnectAccepted`
    /// 2. 本人に既存クライアントの `ClientJoined`
    /// 3. 本人に自身の `ClientJoined`（`is_me = true`）
    /// 4. 他の全員に本人の `ClientJoined`
    /// 5. 全員に `ServerParams`
    pub async fn announce_join(
        &self,
        connection: &ClientConnection,
    ) -> Result<(), MessagePushError> {
        let lobby = self.repository.get_lobby().await;
        let me = &connection.id;

        self.message_pusher
            .push_to(
                me,
                &ServerCommand::ConnectAccepted {
                    client_id: me.as_str().to_string(),
                    sequence: lobby.mission.sequence,
                },
            )
            .await?;

        let others: Vec<&ClientConnection> =
            lobby.connections.iter().filter(|c| &c.id != me).collect();
        for other in &others {
            self.message_pusher
                .push_to(
                    me,
                    &ServerCommand::ClientJoined {
                        client: other.to_join_data(),
                        is_me: false,
                    },
                )
                .await?;
        }

        self.message_pusher
            .push_to(
                me,
                &ServerCommand::ClientJoined {
                    client: connection.to_join_data(),
                    is_me: true,
                },
            )
            .await?;

        let targets = others.iter().map(|c| c.id.clone()).collect();
        self.message_pusher
            .broadcast(
                targets,
                &ServerCommand::ClientJoined {
                    client: connection.to_join_data(),
                    is_me: false,
                },
            )
            .await?;

        broadcast_server_params(self.repository.as_ref(), self.message_pusher.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            AdmissionPolicy, BanEntry, BanList, Identity, Lobby, MockMessagePusher, PlayerName, SlotPool,
        },
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryLobbyRepository,
        },
    };
    use missionlink_shared::{
        protocol::{RejectReason, ServerCommand},
        time::FixedClock,
    };
    use std::collections::HashMap;
    use tokio::sync::{Mutex, mpsc};

    fn create_test_repository(max_players: u32, bans: BanList) -> Arc<InMemoryLobbyRepository> {
        let lobby = Lobby::new(
            "Test Server".to_string(),
            SlotPool::new(max_players, 0),
            AdmissionPolicy {
                pc_build: true,
                ..AdmissionPolicy::default()
            },
            bans,
        );
        Arc::new(InMemoryLobbyRepository::new(Arc::new(Mutex::new(lobby))))
    }

    fn request(name: &str) -> ConnectRequest {
        ConnectRequest {
            address: "127.0.0.1:5000".to_string(),
            name: PlayerName::new(name.to_string()).unwrap(),
            identity: Identity::new(format!("{}-id", name)).unwrap(),
            invite: None,
            demo: false,
            local: false,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<ServerCommand> {
        let mut commands = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            commands.push(ServerCommand::from_json(&frame).unwrap());
        }
        commands
    }

    #[tokio::test]
    async fn test_execute_admits_and_registers_client() {
        // テスト項目: 受け入れに成功するとクライアントが MessagePusher に登録される
        // given (前提条件):
        let repository = create_test_repository(4, BanList::new());
        let mut pusher = MockMessagePusher::new();
        pusher.expect_register_client().times(1).return_const(());
        let usecase = AdmitConnectionUseCase::new(
            repository.clone(),
            Arc::new(pusher),
            Arc::new(FixedClock::new(1_000)),
        );
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let result = usecase.execute(request("Alice"), tx).await;

        // then (期待する結果):
        let connection = result.unwrap();
        assert_eq!(connection.name.as_str(), "Alice");
        assert_eq!(connection.join_time, Timestamp::new(1_000));
        assert_eq!(repository.get_server_params().await.public_slots_used, 1);
    }

    #[tokio::test]
    async fn test_execute_rejects_when_server_is_full() {
        // テスト項目: 満員のサーバーへの接続は CR_SERVERFULL で拒否され、登録されない
        // given (前提条件):
        let repository = create_test_repository(1, BanList::new());
        let mut pusher = MockMessagePusher::new();
        pusher.expect_register_client().times(1).return_const(());
        let usecase = AdmitConnectionUseCase::new(
            repository.clone(),
            Arc::new(pusher),
            Arc::new(FixedClock::new(1_000)),
        );
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        usecase.execute(request("Alice"), tx1).await.unwrap();

        // when (操作):
        let result = usecase.execute(request("Bob"), tx2).await;

        // then (期待する結果):
        assert_eq!(result, Err(ConnectError::Rejected(RejectReason::ServerFull)));
        assert_eq!(repository.get_all_client_ids().await.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_rejects_banned_identity() {
        // テスト項目: BAN 中の identity からの接続は CR_YOUAREBANNED で拒否される
        // given (前提条件):
        let mut bans = BanList::new();
        bans.ban(
            Identity::new("Mallory-id".to_string()).unwrap(),
            BanEntry::new(Timestamp::new(0), 60_000),
        );
        let repository = create_test_repository(4, bans);
        let usecase = AdmitConnectionUseCase::new(
            repository,
            Arc::new(MockMessagePusher::new()),
            Arc::new(FixedClock::new(1_000)),
        );
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let result = usecase.execute(request("Mallory"), tx).await;

        // then (期待する結果):
        assert_eq!(result, Err(ConnectError::Rejected(RejectReason::Banned)));
    }

    #[tokio::test]
    async fn test_announce_join_sends_roster_then_self_then_params() {
        // テスト項目: 参加通知が ConnectAccepted → 既存クライアント → 自身 → ServerParams の順で届く
        // given (前提条件):
        let repository = create_test_repository(4, BanList::new());
        let pusher = Arc::new(WebSocketMessagePusher::new(Arc::new(Mutex::new(
            HashMap::new(),
        ))));
        let usecase = AdmitConnectionUseCase::new(
            repository,
            pusher,
            Arc::new(FixedClock::new(1_000)),
        );
        let (tx_alice, mut rx_alice) = mpsc::unbounded_channel();
        let (tx_bob, mut rx_bob) = mpsc::unbounded_channel();
        let alice = usecase.execute(request("Alice"), tx_alice).await.unwrap();
        usecase.announce_join(&alice).await.unwrap();
        drain(&mut rx_alice);

        // when (操作):
        let bob = usecase.execute(request("Bob"), tx_bob).await.unwrap();
        usecase.announce_join(&bob).await.unwrap();

        // then (期待する結果):
        let to_bob = drain(&mut rx_bob);
        assert_eq!(to_bob.len(), 4);
        assert!(matches!(&to_bob[0], ServerCommand::ConnectAccepted { client_id, .. } if client_id == bob.id.as_str()));
        assert!(matches!(&to_bob[1], ServerCommand::ClientJoined { client, is_me: false } if client.name == "Alice"));
        assert!(matches!(&to_bob[2], ServerCommand::ClientJoined { client, is_me: true } if client.name == "Bob"));
        assert!(matches!(&to_bob[3], ServerCommand::ServerParams(params) if params.public_slots_used == 2));

        let to_alice = drain(&mut rx_alice);
        assert_eq!(to_alice.len(), 2);
        assert!(matches!(&to_alice[0], ServerCommand::ClientJoined { client, is_me: false } if client.name == "Bob"));
        assert!(matches!(&to_alice[1], ServerCommand::ServerParams(_)));
    }
}
