//! UseCase 層
//!
//! ドメインモデルと Repository / MessagePusher を組み合わせて、
//! 接続受け入れ、切断、ミッションダウンロードのハンドシェイクを実行します。

mod admit_connection;
mod drop_connection;
mod error;
mod get_connections;
mod mission_download;
mod server_params;
mod set_ready_status;
mod update_client_data;

pub use admit_connection::AdmitConnectionUseCase;
pub use drop_connection::DropConnectionUseCase;
pub use error::{ConnectError, DropError, MissionError, UpdateClientDataError};
pub use get_connections::GetConnectionsUseCase;
pub use mission_download::MissionDownloadUseCase;
pub use server_params::ServerParamsUseCase;
pub use set_ready_status::SetReadyStatusUseCase;
pub use update_client_data::UpdateClientDataUseCase;
