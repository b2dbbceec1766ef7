//! MessagePusher trait 定義
//!
//! クライアントへのコマンド送信を抽象化します。
//! UseCase 層はこの trait に依存し、WebSocket などの具体的な実装には依存しません。

use async_trait::async_trait;
use tokio::sync::mpsc;

use missionlink_shared::protocol::ServerCommand;

use super::{ClientId, MessagePushError};

/// 1 クライアントへの送信チャンネル（エンコード済みのフレーム）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントを登録
    async fn register_client(&self, client_id: ClientId, sender: PusherChannel);

    /// クライアントの登録を解除
    async fn unregister_client(&self, client_id: &ClientId);

    /// 特定のクライアントにコマンドを送信
    async fn push_to(
        &self,
        client_id: &ClientId,
        command: &ServerCommand,
    ) -> Result<(), MessagePushError>;

    /// 複数のクライアントにコマンドを送信（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ClientId>,
        command: &ServerCommand,
    ) -> Result<(), MessagePushError>;
}
