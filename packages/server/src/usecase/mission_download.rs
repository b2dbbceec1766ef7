//! UseCase: ミッションダウンロードのハンドシェイク
//!
//! サーバー側のフェーズ制御を担当します。
//!
//! ```text
//! load_mission ─▶ MissionStartPhase1 ─▶ (ack1) ─▶ MissionStartPhase2
//!   ─▶ (ack2) ─▶ paths + ghost-always objects ─▶ (objects received)
//!   ─▶ MissionStartPhase3 ─▶ (ack3) ─▶ MissionStart + spawn
//! ```
//!
//! 各 ack は Repository 上でシーケンスと直前のフェーズを同時に確認してから
//! 処理されます。条件を満たさない ack は debug ログを出して破棄し、
//! クライアントには何も返しません。
//!
//! ## テスト実装の作業記録
//!
//! ### どのような状況を想定しているか
//! - 正常系：ロードから Ready までの一連のハンドシェイク
//! - 異常系：古いシーケンスの ack、順序違いの ack、停止中の ack
//! - エッジケース：ゴースト転送のリトライ、スポーン地点が未定義のミッション

use std::sync::Arc;

use missionlink_shared::protocol::{MissionSequence, ServerCommand};

use crate::domain::{
    AckOutcome, ClientId, GameHooks, GhostReplicator, LobbyRepository, MessagePusher, Mission,
    MissionCatalog, PhaseTransition,
};

use super::{error::MissionError, server_params::broadcast_server_params};

/// ミッションダウンロードのユースケース
pub struct MissionDownloadUseCase {
    repository: Arc<dyn LobbyRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    replicator: Arc<dyn GhostReplicator>,
    hooks: Arc<dyn GameHooks>,
    catalog: Arc<MissionCatalog>,
}

impl MissionDownloadUseCase {
    pub fn new(
        repository: Arc<dyn LobbyRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        replicator: Arc<dyn GhostReplicator>,
        hooks: Arc<dyn GameHooks>,
        catalog: Arc<MissionCatalog>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            replicator,
            hooks,
            catalog,
        }
    }

    /// 新しいミッションをロードし、全クライアントのハンドシェイクを開始
    ///
    /// 実行中のミッションがあれば先に終了させます。
    pub async fn load_mission(&self, name: &str) -> Result<MissionSequence, MissionError> {
        let mission = self
            .catalog
            .find(name)
            .cloned()
            .ok_or_else(|| MissionError::UnknownMission(name.to_string()))?;

        self.end_mission().await;
        let sequence = self.repository.begin_mission(mission).await;
        tracing::info!("Loading mission '{}' (seq {})", name, sequence);

        for client_id in self.repository.get_all_client_ids().await {
            if let Err(e) = self.start_client(&client_id).await {
                tracing::warn!("Failed to start mission download for '{}': {}", client_id, e);
            }
        }
        broadcast_server_params(self.repository.as_ref(), self.message_pusher.as_ref()).await?;
        Ok(sequence)
    }

    /// 実行中のミッションを終了し、全員に `MissionEnd` を送信
    pub async fn end_mission(&self) -> Option<MissionSequence> {
        let sequence = self.repository.end_mission().await?;
        let targets = self.repository.get_all_client_ids().await;
        if let Err(e) = self
            .message_pusher
            .broadcast(targets, &ServerCommand::MissionEnd { sequence })
            .await
        {
            tracing::warn!("Failed to broadcast mission end: {}", e);
        }
        tracing::info!("Mission ended (seq {})", sequence);
        Some(sequence)
    }

    /// 1 クライアントのハンドシェイクを開始
    ///
    /// ミッションが実行中でなければ何もせず `Ok(false)` を返します。
    pub async fn start_client(&self, client_id: &ClientId) -> Result<bool, MissionError> {
        let Some((sequence, mission)) = self.repository.start_client(client_id).await? else {
            return Ok(false);
        };
        self.message_pusher
            .push_to(
                client_id,
                &ServerCommand::MissionStartPhase1 {
                    sequence,
                    mission: mission.name,
                },
            )
            .await?;
        tracing::debug!("Sent phase 1 to '{}' (seq {})", client_id, sequence);
        Ok(true)
    }

    /// Phase 1 ack: データブロックは常駐済みのため、即座に Phase 2 へ進む
    pub async fn on_phase1_ack(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
    ) -> Result<AckOutcome, MissionError> {
        let outcome = self
            .repository
            .advance_phase(client_id, sequence, PhaseTransition::Phase1Ack)
            .await;
        if !outcome.is_advanced() {
            log_ignored(client_id, PhaseTransition::Phase1Ack, outcome);
            return Ok(outcome);
        }
        self.on_datablocks_done(client_id, sequence).await
    }

    async fn on_datablocks_done(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
    ) -> Result<AckOutcome, MissionError> {
        let (outcome, mission) = self
            .accept(client_id, sequence, PhaseTransition::DatablocksDone)
            .await;
        let Some(mission) = mission else {
            return Ok(outcome);
        };
        self.message_pusher
            .push_to(
                client_id,
                &ServerCommand::MissionStartPhase2 {
                    sequence,
                    mission: mission.name,
                },
            )
            .await?;
        tracing::debug!("Sent phase 2 to '{}' (seq {})", client_id, sequence);
        Ok(outcome)
    }

    /// Phase 2 ack: パスデータを送ってからゴースト転送を開始
    pub async fn on_phase2_ack(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
    ) -> Result<AckOutcome, MissionError> {
        let (outcome, mission) = self
            .accept(client_id, sequence, PhaseTransition::Phase2Ack)
            .await;
        let Some(mission) = mission else {
            return Ok(outcome);
        };
        self.replicator
            .transmit_paths(client_id, sequence, &mission.paths)
            .await?;
        self.replicator
            .activate_ghosting(client_id, sequence, &mission.ghost_objects)
            .await?;
        Ok(outcome)
    }

    /// ゴースト転送の完了通知: Phase 3 を送信
    pub async fn on_ghost_always_objects_received(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
    ) -> Result<AckOutcome, MissionError> {
        let (outcome, mission) = self
            .accept(client_id, sequence, PhaseTransition::GhostsReceived)
            .await;
        let Some(mission) = mission else {
            return Ok(outcome);
        };
        self.message_pusher
            .push_to(
                client_id,
                &ServerCommand::MissionStartPhase3 {
                    sequence,
                    mission: mission.name,
                },
            )
            .await?;
        tracing::debug!("Sent phase 3 to '{}' (seq {})", client_id, sequence);
        Ok(outcome)
    }

    /// クライアントからのゴースト転送のやり直し要求
    pub async fn on_ghost_always_retry(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
    ) -> Result<AckOutcome, MissionError> {
        let (outcome, mission) = self
            .accept(client_id, sequence, PhaseTransition::GhostRetry)
            .await;
        let Some(mission) = mission else {
            return Ok(outcome);
        };
        tracing::info!("Client '{}' requested a ghost transfer retry", client_id);
        self.replicator
            .activate_ghosting(client_id, sequence, &mission.ghost_objects)
            .await?;
        Ok(outcome)
    }

    /// Phase 3 ack: ミッション開始を通知し、スポーン地点を決めて送信
    pub async fn on_phase3_ack(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
    ) -> Result<AckOutcome, MissionError> {
        let (outcome, mission) = self
            .accept(client_id, sequence, PhaseTransition::Phase3Ack)
            .await;
        let Some(mission) = mission else {
            return Ok(outcome);
        };
        self.message_pusher
            .push_to(client_id, &ServerCommand::MissionStart { sequence })
            .await?;

        let spawn = self.hooks.on_client_enter_game(client_id, &mission);
        self.message_pusher
            .push_to(client_id, &ServerCommand::PlayerSpawned { position: spawn.0 })
            .await?;
        tracing::info!(
            "Client '{}' entered mission '{}' (seq {})",
            client_id,
            mission.name,
            sequence
        );
        Ok(outcome)
    }

    /// フェーズ遷移を試み、成功した場合は現在のミッションを返す
    async fn accept(
        &self,
        client_id: &ClientId,
        sequence: MissionSequence,
        transition: PhaseTransition,
    ) -> (AckOutcome, Option<Mission>) {
        let outcome = self
            .repository
            .advance_phase(client_id, sequence, transition)
            .await;
        if !outcome.is_advanced() {
            log_ignored(client_id, transition, outcome);
            return (outcome, None);
        }

        // 遷移後に別のミッションがロードされていれば、その後の処理は新しいロードに任せる
        let state = self.repository.get_mission_state().await;
        if state.sequence != sequence || !state.running {
            tracing::debug!(
                "Mission changed while handling {:?} from '{}' (seq {} -> {})",
                transition,
                client_id,
                sequence,
                state.sequence
            );
            return (outcome, None);
        }
        (outcome, state.mission)
    }
}

fn log_ignored(client_id: &ClientId, transition: PhaseTransition, outcome: AckOutcome) {
    match outcome {
        AckOutcome::Stale { received, current } => tracing::debug!(
            "Ignoring stale {:?} from '{}' (seq {}, current {})",
            transition,
            client_id,
            received,
            current
        ),
        AckOutcome::OutOfOrder { phase, expected } => tracing::debug!(
            "Ignoring {:?} from '{}': phase is {:?}, expected {:?}",
            transition,
            client_id,
            phase,
            expected
        ),
        AckOutcome::NotRunning => tracing::debug!(
            "Ignoring {:?} from '{}': no mission running",
            transition,
            client_id
        ),
        AckOutcome::UnknownClient => tracing::debug!(
            "Ignoring {:?} from unknown client '{}'",
            transition,
            client_id
        ),
        AckOutcome::Advanced(_) => {}
    }
}
