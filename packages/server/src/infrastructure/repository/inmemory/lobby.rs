//! InMemory Lobby Repository 実装
//!
//! ドメイン層が定義する LobbyRepository trait の具体的な実装。
//! Lobby 集約を 1 つの Mutex で保護し、各メソッドをロック中に完結させます。
//! これにより受け入れ判定とスロット取得、シーケンス確認とフェーズ更新が
//! それぞれ原子的に行われます。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use missionlink_shared::protocol::{MissionSequence, RejectReason, ServerParams};

use crate::domain::{
    AckOutcome, ClientConnection, ClientData, ClientId, ClientUpdate, ConnectRequest, Lobby,
    LobbyRepository, Mission, MissionState, PhaseTransition, RepositoryError, Timestamp,
};

/// インメモリ Lobby Repository 実装
pub struct InMemoryLobbyRepository {
    lobby: Arc<Mutex<Lobby>>,
}

impl InMemoryLobbyRepository {
    pub fn new(lobby: Arc<Mutex<Lobby>>) -> Self {
        Self { lobby }
    }
}

#[async_trait]
impl LobbyRepository for InMemoryLobbyRepository {
    async fn get_lobby(&self) -> Lobby {
        self.lobby.lock().await.clone()
    }

    async fn admit(
        &self,
        client_id: ClientId,
        request: ConnectRequest,
        now: Timestamp,
    ) -> Result<ClientUpdate, RejectReason> {
        let mut lobby = self.lobby.lock().await;
        if lobby.connection(&client_id).is_some() {
            tracing::error!("Client id '{}' is already registered", client_id);
            return Err(RejectReason::ServerFull);
        }
        lobby.admit(client_id, request, now)
    }

    async fn update_client_data(
        &self,
        client_id: &ClientId,
        data: ClientData,
        now: Timestamp,
    ) -> Result<ClientUpdate, RepositoryError> {
        let mut lobby = self.lobby.lock().await;
        lobby.update_client_data(client_id, data, now)
    }

    async fn remove_connection(
        &self,
        client_id: &ClientId,
    ) -> Result<ClientConnection, RepositoryError> {
        let mut lobby = self.lobby.lock().await;
        lobby.remove(client_id)
    }

    async fn get_connection(&self, client_id: &ClientId) -> Option<ClientConnection> {
        let lobby = self.lobby.lock().await;
        lobby.connection(client_id).cloned()
    }

    async fn get_all_client_ids(&self) -> Vec<ClientId> {
        let lobby = self.lobby.lock().await;
        lobby.connections.iter().map(|c| c.id.clone()).collect()
    }

    async fn set_ready(&self, client_id: &ClientId, ready: bool) -> Result<bool, RepositoryError> {
        let mut lobby = self.lobby.lock().await;
        lobby.set_ready(client_id, ready)
    }

    async fn begin_mission(&self, mission: Mission) -> MissionSequence {
        let mut lobby = self.lobby.lock().await;
        lobby.begin_mission(mission)
    }

    async fn end_mission(&self) -> Option<MissionSequence> {
        let mut lobby = self.lobby.lock().await;
        lobby.end_mission()
    }

    async fn start_client(
        &self,
        client_id: &ClientId,
    ) -> Result<Option<(MissionSequence, Mission)>, RepositoryError> {
        let mut lobby = self.lobby.lock().await;
        lobby.start_client(client_id)
    }

    async fn advance_phase(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
        transition: PhaseTransition,
    ) -> AckOutcome {
        let mut lobby = self.lobby.lock().await;
        lobby.advance(client_id, sequence, transition)
    }

    async fn get_mission_state(&self) -> MissionState {
        let lobby = self.lobby.lock().await;
        lobby.mission.clone()
    }

    async fn get_server_params(&self) -> ServerParams {
        let lobby = self.lobby.lock().await;
        lobby.server_params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AdmissionPolicy, BanList, Identity, MissionPhase, PlayerName, SlotKind, SlotPool,
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryLobbyRepository が Lobby 集約の操作を正しく委譲すること
    // - 受け入れ・削除でスロット数が正しく増減すること
    // - 並行した受け入れでもスロット数を超えないこと
    // ========================================

    fn create_test_repository(max_players: u32) -> InMemoryLobbyRepository {
        let lobby = Lobby::new(
            "Test Server".to_string(),
            SlotPool::new(max_players, 0),
            AdmissionPolicy {
                pc_build: true,
                ..AdmissionPolicy::default()
            },
            BanList::new(),
        );
        InMemoryLobbyRepository::new(Arc::new(Mutex::new(lobby)))
    }

    fn request(name: &str) -> ConnectRequest {
        ConnectRequest {
            address: "127.0.0.1:1".to_string(),
            name: PlayerName::new(name.to_string()).unwrap(),
            identity: Identity::default(),
            invite: None,
            demo: false,
            local: false,
        }
    }

    fn id(value: &str) -> ClientId {
        ClientId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_admit_and_remove_round_trip_slots() {
        // テスト項目: 受け入れで取得したスロットが削除で解放される
        // given (前提条件):
        let repo = create_test_repository(4);

        // when (操作):
        let update = repo
            .admit(id("alice"), request("Alice"), Timestamp::new(0))
            .await
            .unwrap();
        let params_after_admit = repo.get_server_params().await;
        repo.remove_connection(&id("alice")).await.unwrap();
        let params_after_remove = repo.get_server_params().await;

        // then (期待する結果):
        assert_eq!(update.connection.slot, Some(SlotKind::Public));
        assert_eq!(params_after_admit.public_slots_used, 1);
        assert_eq!(params_after_remove.public_slots_used, 0);
        assert_eq!(params_after_remove.public_slots_free, 4);
    }

    #[tokio::test]
    async fn test_duplicate_client_id_is_refused() {
        // テスト項目: 同じ client_id での二重登録は拒否される
        // given (前提条件):
        let repo = create_test_repository(4);
        repo.admit(id("alice"), request("Alice"), Timestamp::new(0))
            .await
            .unwrap();

        // when (操作):
        let result = repo
            .admit(id("alice"), request("Alice"), Timestamp::new(0))
            .await;

        // then (期待する結果):
        assert!(result.is_err());
        assert_eq!(repo.get_all_client_ids().await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_admissions_never_exceed_capacity() {
        // テスト項目: 並行して受け入れても定員を超えない
        // given (前提条件):
        let repo = Arc::new(create_test_repository(3));

        // when (操作):
        let mut handles = Vec::new();
        for i in 0..10 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.admit(
                    id(&format!("c{}", i)),
                    request(&format!("Player{}", i)),
                    Timestamp::new(0),
                )
                .await
                .is_ok()
            }));
        }
        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        // then (期待する結果):
        assert_eq!(admitted, 3);
        let params = repo.get_server_params().await;
        assert_eq!(params.public_slots_used, 3);
        assert_eq!(params.public_slots_free, 0);
    }

    #[tokio::test]
    async fn test_advance_phase_updates_stored_connection() {
        // テスト項目: フェーズ遷移の結果が保存された接続に反映される
        // given (前提条件):
        let repo = create_test_repository(4);
        repo.admit(id("alice"), request("Alice"), Timestamp::new(0))
            .await
            .unwrap();
        let seq = repo.begin_mission(Mission::new("m")).await;

        // when (操作):
        let outcome = repo
            .advance_phase(&id("alice"), seq, PhaseTransition::Phase1Ack)
            .await;

        // then (期待する結果):
        assert_eq!(outcome, AckOutcome::Advanced(MissionPhase::AwaitingDatablocks));
        let connection = repo.get_connection(&id("alice")).await.unwrap();
        assert_eq!(connection.phase, MissionPhase::AwaitingDatablocks);
        assert_eq!(repo.get_mission_state().await.sequence, seq);
    }
}
