//! UseCase: 接続一覧の取得

use std::sync::Arc;

use crate::domain::{ClientConnection, LobbyRepository};

pub struct GetConnectionsUseCase {
    repository: Arc<dyn LobbyRepository>,
}

impl GetConnectionsUseCase {
    pub fn new(repository: Arc<dyn LobbyRepository>) -> Self {
        Self { repository }
    }

    /// 参加順の接続一覧
    pub async fn execute(&self) -> Vec<ClientConnection> {
        self.repository.get_lobby().await.connections
    }
}
