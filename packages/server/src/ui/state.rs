//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    AdmitConnectionUseCase, DropConnectionUseCase, GetConnectionsUseCase, MissionDownloadUseCase,
    ServerParamsUseCase, SetReadyStatusUseCase, UpdateClientDataUseCase,
};

pub struct AppState {
    /// AdmitConnectionUseCase（接続受け入れ）
    pub admit_connection_usecase: Arc<AdmitConnectionUseCase>,
    /// DropConnectionUseCase（切断）
    pub drop_connection_usecase: Arc<DropConnectionUseCase>,
    /// UpdateClientDataUseCase（名前・identity の更新）
    pub update_client_data_usecase: Arc<UpdateClientDataUseCase>,
    /// SetReadyStatusUseCase（Ready 状態の変更）
    pub set_ready_status_usecase: Arc<SetReadyStatusUseCase>,
    /// MissionDownloadUseCase（ミッションロードとハンドシェイク）
    pub mission_download_usecase: Arc<MissionDownloadUseCase>,
    /// ServerParamsUseCase（サーバーパラメータ）
    pub server_params_usecase: Arc<ServerParamsUseCase>,
    /// GetConnectionsUseCase（接続一覧）
    pub get_connections_usecase: Arc<GetConnectionsUseCase>,
}
