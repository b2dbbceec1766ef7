//! Client side of the mission download handshake.
//!
//! Every acknowledgement echoes the sequence carried by the server command it
//! answers. The phase 3 acknowledgement waits for the lighting bake and is
//! sent at most once per bake; a `MissionEnd` or a new load cancels the
//! pending bake so no stale acknowledgement leaves the client.

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};

use missionlink_shared::protocol::{ClientCommand, MissionSequence, ServerCommand};

use crate::{error::ClientError, lighting::SceneLighting};

/// Hooks for the loading UI. Progress values are in `[0, 1]`.
pub trait MissionObserver: Send + Sync {
    fn on_mission_download_phase1(&self, mission: &str);
    fn on_phase1_progress(&self, progress: f32);
    fn on_phase1_complete(&self);
    fn on_mission_download_phase2(&self, mission: &str);
    fn on_phase2_progress(&self, progress: f32);
    fn on_phase2_complete(&self);
    fn on_mission_download_phase3(&self, mission: &str);
    fn on_phase3_progress(&self, progress: f32);
    fn on_phase3_complete(&self);
    fn on_mission_download_complete(&self);
    fn on_mission_start(&self) {}
    fn on_mission_end(&self) {}
    fn on_player_spawned(&self, _position: [f32; 3]) {}
}

/// Ghost-always transfer in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GhostTransfer {
    sequence: MissionSequence,
    expected: u32,
    received: u32,
}

impl GhostTransfer {
    fn progress(&self) -> f32 {
        if self.expected == 0 {
            return 1.0;
        }
        (self.received as f32 / self.expected as f32).clamp(0.0, 1.0)
    }

    fn is_complete(&self) -> bool {
        self.received >= self.expected
    }
}

pub struct MissionDownloader {
    outbound: mpsc::UnboundedSender<ClientCommand>,
    observer: Arc<dyn MissionObserver>,
    lighting: SceneLighting,
    ghosts: Option<GhostTransfer>,
    pending_bake: Option<JoinHandle<()>>,
}

impl MissionDownloader {
    pub fn new(
        outbound: mpsc::UnboundedSender<ClientCommand>,
        observer: Arc<dyn MissionObserver>,
        lighting: SceneLighting,
    ) -> Self {
        Self {
            outbound,
            observer,
            lighting,
            ghosts: None,
            pending_bake: None,
        }
    }

    /// React to one server command. Commands unrelated to the mission download
    /// are ignored.
    pub fn handle(&mut self, command: &ServerCommand) -> Result<(), ClientError> {
        match command {
            ServerCommand::MissionStartPhase1 { sequence, mission } => {
                self.reset();
                self.observer.on_mission_download_phase1(mission);
                // Datablocks are resident, phase 1 is complete on arrival
                self.observer.on_phase1_progress(1.0);
                self.send(ClientCommand::MissionStartPhase1Ack {
                    sequence: *sequence,
                })
            }
            ServerCommand::MissionStartPhase2 { sequence, mission } => {
                self.observer.on_phase1_complete();
                self.observer.on_mission_download_phase2(mission);
                self.send(ClientCommand::MissionStartPhase2Ack {
                    sequence: *sequence,
                })
            }
            ServerCommand::MissionPaths { paths, .. } => {
                tracing::debug!("Received {} paths", paths.len());
                Ok(())
            }
            ServerCommand::GhostAlwaysStarted {
                sequence,
                ghost_count,
            } => {
                let transfer = GhostTransfer {
                    sequence: *sequence,
                    expected: *ghost_count,
                    received: 0,
                };
                self.ghosts = Some(transfer);
                self.observer.on_phase2_progress(0.0);
                self.report_ghosts(transfer)
            }
            ServerCommand::GhostAlwaysObject {
                sequence, object, ..
            } => {
                let Some(mut transfer) = self.ghosts.filter(|t| t.sequence == *sequence) else {
                    tracing::debug!("Ignoring ghost object '{}' outside a transfer", object);
                    return Ok(());
                };
                if transfer.is_complete() {
                    return Ok(());
                }
                transfer.received += 1;
                self.ghosts = Some(transfer);
                self.report_ghosts(transfer)
            }
            ServerCommand::MissionStartPhase3 { sequence, mission } => {
                self.observer.on_phase2_complete();
                self.observer.on_mission_download_phase3(mission);
                self.start_lighting(*sequence);
                Ok(())
            }
            ServerCommand::MissionStart { sequence } => {
                tracing::info!("Mission started (seq {})", sequence);
                self.observer.on_mission_start();
                Ok(())
            }
            ServerCommand::PlayerSpawned { position } => {
                self.observer.on_player_spawned(*position);
                Ok(())
            }
            ServerCommand::MissionEnd { sequence } => {
                tracing::info!("Mission ended (seq {})", sequence);
                self.reset();
                self.observer.on_mission_end();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// `true` while a lighting bake is waiting to acknowledge phase 3.
    pub fn is_baking(&self) -> bool {
        self.pending_bake
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn send(&self, command: ClientCommand) -> Result<(), ClientError> {
        self.outbound
            .send(command)
            .map_err(|e| ClientError::ConnectionError(e.to_string()))
    }

    fn report_ghosts(&mut self, transfer: GhostTransfer) -> Result<(), ClientError> {
        self.observer.on_phase2_progress(transfer.progress());
        if !transfer.is_complete() {
            return Ok(());
        }
        self.send(ClientCommand::GhostAlwaysObjectsReceived {
            sequence: transfer.sequence,
        })
    }

    fn reset(&mut self) {
        self.ghosts = None;
        if let Some(task) = self.pending_bake.take() {
            task.abort();
        }
    }

    fn start_lighting(&mut self, sequence: MissionSequence) {
        if let Some(task) = self.pending_bake.take() {
            task.abort();
        }
        let mut bake = self.lighting.start_bake();
        let observer = self.observer.clone();
        let outbound = self.outbound.clone();

        self.pending_bake = Some(tokio::spawn(async move {
            let progress_observer = observer.clone();
            if let Err(e) = bake
                .wait_for_completion(|p| progress_observer.on_phase3_progress(p))
                .await
            {
                tracing::warn!("Lighting did not finish: {}", e);
                return;
            }
            observer.on_phase3_complete();
            observer.on_mission_download_complete();
            if outbound
                .send(ClientCommand::MissionStartPhase3Ack { sequence })
                .is_err()
            {
                tracing::debug!("Connection closed before phase 3 could be acknowledged");
            }
        }));
    }
}

impl Drop for MissionDownloader {
    fn drop(&mut self) {
        self.reset();
    }
}
