//! Lobby aggregate: every connection, the slot pool and the mission-load state.
//!
//! All mutations of slots, phases and the mission sequence go through this
//! type, so a single lock around it keeps the counters and the phase guard
//! consistent.

use missionlink_shared::protocol::{MissionSequence, RejectReason, ServerParams};

use super::{
    admission::{AdmissionPolicy, ConnectRequest, check_admission},
    ban_list::BanList,
    entity::{ClientConnection, ClientData, ClientUpdate, Mission, MissionState},
    error::RepositoryError,
    phase::{AckOutcome, MissionPhase, PhaseTransition, guard_transition},
    slot_pool::SlotPool,
    value_object::{ClientId, PlayerName, Timestamp},
};

#[derive(Debug, Clone)]
pub struct Lobby {
    pub server_name: String,
    pub connections: Vec<ClientConnection>,
    pub slots: SlotPool,
    pub policy: AdmissionPolicy,
    pub bans: BanList,
    pub mission: MissionState,
}

impl Lobby {
    pub fn new(server_name: String, slots: SlotPool, policy: AdmissionPolicy, bans: BanList) -> Self {
        Self {
            server_name,
            connections: Vec::new(),
            slots,
            policy,
            bans,
            mission: MissionState::default(),
        }
    }

    pub fn connection(&self, id: &ClientId) -> Option<&ClientConnection> {
        self.connections.iter().find(|c| &c.id == id)
    }

    fn connection_mut(&mut self, id: &ClientId) -> Result<&mut ClientConnection, RepositoryError> {
        self.connections
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| RepositoryError::ClientNotFound(id.as_str().to_string()))
    }

    /// Run the admission checks and, on success, register the connection and
    /// take its slot in one step.
    pub fn admit(
        &mut self,
        id: ClientId,
        request: ConnectRequest,
        now: Timestamp,
    ) -> Result<ClientUpdate, RejectReason> {
        let purged = self.bans.purge_expired(now);
        if purged > 0 {
            tracing::debug!("Purged {} expired ban(s)", purged);
        }
        check_admission(&request, &self.slots, &self.policy, &self.bans, now)?;

        let data = ClientData {
            name: request.name.clone(),
            identity: request.identity.clone(),
            invited: request.is_invited(),
            local: request.local,
        };
        self.connections.push(ClientConnection::new(
            id.clone(),
            request.address,
            request.name,
            now,
        ));

        match self.update_client_data(&id, data, now) {
            Ok(update) => Ok(update),
            Err(e) => {
                tracing::warn!("Admitted client '{}' could not take a slot: {}", id, e);
                self.connections.retain(|c| c.id != id);
                Err(RejectReason::ServerFull)
            }
        }
    }

    /// Apply client data. The slot is taken only the first time.
    pub fn update_client_data(
        &mut self,
        id: &ClientId,
        data: ClientData,
        now: Timestamp,
    ) -> Result<ClientUpdate, RepositoryError> {
        let name = self.unique_name(&data.name, id);
        let mission_running = self.mission.running;
        let slot_kind = self.slots.kind_for(data.invited);
        let host_taken = self.connections.iter().any(|c| &c.id != id && c.is_host);

        let new_client = !self.connection_mut(id)?.data_initialized;
        if new_client {
            self.slots.acquire(slot_kind)?;
        }

        let connection = self.connection_mut(id)?;
        connection.data_initialized = true;
        connection.name = name;
        connection.identity = data.identity;
        connection.invited = data.invited;
        connection.is_host = data.local && !host_taken;
        if new_client {
            connection.join_time = now;
            connection.join_in_progress = mission_running;
            connection.slot = Some(slot_kind);
        }

        Ok(ClientUpdate {
            connection: connection.clone(),
            new_client,
        })
    }

    /// Remove a connection and give back the slot it held.
    pub fn remove(&mut self, id: &ClientId) -> Result<ClientConnection, RepositoryError> {
        let index = self
            .connections
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| RepositoryError::ClientNotFound(id.as_str().to_string()))?;
        let connection = self.connections.remove(index);
        if let Some(kind) = connection.slot {
            self.slots.release(kind);
        }
        Ok(connection)
    }

    /// Returns whether the ready flag changed.
    pub fn set_ready(&mut self, id: &ClientId, ready: bool) -> Result<bool, RepositoryError> {
        let connection = self.connection_mut(id)?;
        let changed = connection.ready != ready;
        connection.ready = ready;
        Ok(changed)
    }

    /// `name` if no other connection uses it, otherwise `name.1`, `name.2`, ...
    pub fn unique_name(&self, name: &PlayerName, exclude: &ClientId) -> PlayerName {
        let taken = |candidate: &PlayerName| {
            self.connections
                .iter()
                .any(|c| &c.id != exclude && c.name.as_str() == candidate.as_str())
        };
        if !taken(name) {
            return name.clone();
        }
        (1..)
            .map(|suffix| name.with_suffix(suffix))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| name.clone())
    }

    /// Start a new mission load: bump the sequence and put every client back
    /// at the start of the handshake.
    pub fn begin_mission(&mut self, mission: Mission) -> MissionSequence {
        self.mission.sequence = self.mission.sequence.next();
        self.mission.running = true;
        self.mission.mission = Some(mission);
        for connection in &mut self.connections {
            connection.phase = MissionPhase::AwaitingPhase1Ack;
        }
        self.mission.sequence
    }

    /// Stop the running mission. Returns `None` if nothing was running.
    pub fn end_mission(&mut self) -> Option<MissionSequence> {
        if !self.mission.running {
            return None;
        }
        self.mission.running = false;
        for connection in &mut self.connections {
            connection.phase = MissionPhase::Idle;
        }
        Some(self.mission.sequence)
    }

    /// Start the handshake for one client if a mission is running.
    ///
    /// A client already past phase 1 keeps its phase.
    pub fn start_client(
        &mut self,
        id: &ClientId,
    ) -> Result<Option<(MissionSequence, Mission)>, RepositoryError> {
        let running = self.mission.running;
        let sequence = self.mission.sequence;
        let mission = self.mission.mission.clone();
        let connection = self.connection_mut(id)?;
        match mission {
            Some(mission)
                if running
                    && matches!(
                        connection.phase,
                        MissionPhase::Idle | MissionPhase::AwaitingPhase1Ack
                    ) =>
            {
                connection.phase = MissionPhase::AwaitingPhase1Ack;
                Ok(Some((sequence, mission)))
            }
            _ => Ok(None),
        }
    }

    /// Offer a phase transition; the phase changes only on `Advanced`.
    pub fn advance(
        &mut self,
        id: &ClientId,
        sequence: MissionSequence,
        transition: PhaseTransition,
    ) -> AckOutcome {
        let current = self.mission.sequence;
        let running = self.mission.running;
        let Ok(connection) = self.connection_mut(id) else {
            return AckOutcome::UnknownClient;
        };
        let outcome = guard_transition(connection.phase, transition, sequence, current, running);
        if let AckOutcome::Advanced(next) = outcome {
            connection.phase = next;
        }
        outcome
    }

    pub fn host_name(&self) -> String {
        self.connections
            .iter()
            .find(|c| c.is_host)
            .map(|c| c.name.as_str().to_string())
            .unwrap_or_else(|| self.server_name.clone())
    }

    pub fn server_params(&self) -> ServerParams {
        ServerParams {
            host_name: self.host_name(),
            mission_name: self.mission.mission_name().map(str::to_string),
            sequence: self.mission.sequence,
            mission_running: self.mission.running,
            public_slots_used: self.slots.public_used(),
            public_slots_free: self.slots.public_free(),
            private_slots_used: self.slots.private_used(),
            private_slots_free: self.slots.private_free(),
        }
    }
}
