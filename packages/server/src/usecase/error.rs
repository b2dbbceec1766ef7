//! UseCase 層のエラー定義

use thiserror::Error;

use missionlink_shared::protocol::RejectReason;

use crate::domain::{MessagePushError, RepositoryError, ValueObjectError};

/// 接続受け入れのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// 受け入れ判定で拒否された
    #[error("connection rejected: {}", .0.code())]
    Rejected(RejectReason),
}

/// 切断処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropError {
    /// 接続が完了していないクライアント
    #[error("client '{0}' never finished connecting")]
    NotConnected(String),
}

/// クライアントデータ更新のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateClientDataError {
    #[error("invalid client data: {0}")]
    Invalid(#[from] ValueObjectError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// ミッションロード・ハンドシェイクのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissionError {
    #[error("unknown mission '{0}'")]
    UnknownMission(String),

    #[error(transparent)]
    Push(#[from] MessagePushError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
