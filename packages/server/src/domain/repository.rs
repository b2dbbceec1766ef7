//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! 各メソッドは Lobby 集約に対する 1 回の原子的な操作です。スロット数、
//! フェーズ、ミッションシーケンスの整合性はこの単位で保証されます。

use async_trait::async_trait;

use missionlink_shared::protocol::{MissionSequence, RejectReason, ServerParams};

use super::{
    AckOutcome, ClientConnection, ClientData, ClientId, ClientUpdate, ConnectRequest, Lobby,
    Mission, MissionState, PhaseTransition, RepositoryError, Timestamp,
};

/// Lobby Repository trait
#[async_trait]
pub trait LobbyRepository: Send + Sync {
    /// Lobby 集約のスナップショットを取得
    async fn get_lobby(&self) -> Lobby;

    /// 受け入れ判定を行い、成功すれば接続を登録してスロットを取得
    async fn admit(
        &self,
        client_id: ClientId,
        request: ConnectRequest,
        now: Timestamp,
    ) -> Result<ClientUpdate, RejectReason>;

    /// クライアントデータを更新（スロットは初回のみ取得）
    async fn update_client_data(
        &self,
        client_id: &ClientId,
        data: ClientData,
        now: Timestamp,
    ) -> Result<ClientUpdate, RepositoryError>;

    /// 接続を削除し、スロットを解放
    async fn remove_connection(
        &self,
        client_id: &ClientId,
    ) -> Result<ClientConnection, RepositoryError>;

    /// 接続を取得
    async fn get_connection(&self, client_id: &ClientId) -> Option<ClientConnection>;

    /// 接続中の全てのクライアント ID を取得（参加順）
    async fn get_all_client_ids(&self) -> Vec<ClientId>;

    /// Ready 状態を設定し、変化したかどうかを返す
    async fn set_ready(&self, client_id: &ClientId, ready: bool) -> Result<bool, RepositoryError>;

    /// 新しいミッションのロードを開始（シーケンスを進める）
    async fn begin_mission(&self, mission: Mission) -> MissionSequence;

    /// 実行中のミッションを終了
    async fn end_mission(&self) -> Option<MissionSequence>;

    /// 1 クライアントのハンドシェイクを開始（ミッション実行中のみ）
    async fn start_client(
        &self,
        client_id: &ClientId,
    ) -> Result<Option<(MissionSequence, Mission)>, RepositoryError>;

    /// フェーズ遷移を試みる
    async fn advance_phase(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
        transition: PhaseTransition,
    ) -> AckOutcome;

    /// ミッションロードの状態を取得
    async fn get_mission_state(&self) -> MissionState;

    /// サーバーパラメータを取得
    async fn get_server_params(&self) -> ServerParams;
}
