//! Wire protocol between the game server and its clients.
//!
//! Every WebSocket text frame carries exactly one JSON-encoded command. The
//! `type` field selects the variant:
//!
//! ```text
//! server -> client: ServerCommand  (phase signals, join/drop notices, params)
//! client -> server: ClientCommand  (phase acknowledgements, ready status)
//! ```
//!
//! Phase acknowledgements always echo the `MissionSequence` the server sent;
//! the server discards any acknowledgement whose sequence is not current.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mission-load epoch.
///
/// Incremented by the server every time a mission is loaded. Messages carrying
/// an older value belong to an abandoned load and are ignored.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MissionSequence(u32);

impl MissionSequence {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// The sequence of the following mission load.
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for MissionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reason a connect request was refused.
///
/// Serialized with the symbolic codes clients already know how to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RejectReason {
    #[serde(rename = "CR_SERVERFULL")]
    #[error("the server is full")]
    ServerFull,

    #[serde(rename = "CR_YOUAREBANNED")]
    #[error("you are banned from this server")]
    Banned,

    #[serde(rename = "CR_DEMOUPGRADE")]
    #[error("demo clients cannot join a full-version server")]
    DemoUpgrade,

    #[serde(rename = "CR_DEMOREJECT")]
    #[error("full-version clients cannot join a demo server")]
    DemoReject,

    #[serde(rename = "CHR_PASSWORD")]
    #[error("invite code does not match")]
    BadInvite,
}

impl RejectReason {
    /// Symbolic code sent on the wire.
    pub const fn code(self) -> &'static str {
        match self {
            Self::ServerFull => "CR_SERVERFULL",
            Self::Banned => "CR_YOUAREBANNED",
            Self::DemoUpgrade => "CR_DEMOUPGRADE",
            Self::DemoReject => "CR_DEMOREJECT",
            Self::BadInvite => "CHR_PASSWORD",
        }
    }
}

/// Server-wide parameters broadcast whenever a client joins or drops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerParams {
    pub host_name: String,
    pub mission_name: Option<String>,
    pub sequence: MissionSequence,
    pub mission_running: bool,
    pub public_slots_used: u32,
    pub public_slots_free: u32,
    pub private_slots_used: u32,
    pub private_slots_free: u32,
}

/// Per-client data sent to every client when someone joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientJoinData {
    pub client_id: String,
    pub name: String,
    pub identity: String,
    pub is_host: bool,
    pub invited: bool,
    pub ready: bool,
    pub score: i32,
    pub join_time: i64,
    pub join_in_progress: bool,
}

/// Commands sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerCommand {
    /// Connect request accepted; `client_id` names this connection.
    ConnectAccepted {
        client_id: String,
        sequence: MissionSequence,
    },
    /// Connect request refused. The server closes the socket afterwards.
    ConnectRejected { reason: RejectReason },
    ServerParams(ServerParams),
    ClientJoined {
        client: ClientJoinData,
        /// `true` only on the copy sent to the joining client itself.
        is_me: bool,
    },
    ClientDropped { client_id: String, name: String },
    ClientReadyStatusChanged { client_id: String, ready: bool },
    MissionStartPhase1 {
        sequence: MissionSequence,
        mission: String,
    },
    MissionStartPhase2 {
        sequence: MissionSequence,
        mission: String,
    },
    /// Path data, pushed before ghosting starts.
    MissionPaths {
        sequence: MissionSequence,
        paths: Vec<String>,
    },
    GhostAlwaysStarted {
        sequence: MissionSequence,
        ghost_count: u32,
    },
    GhostAlwaysObject {
        sequence: MissionSequence,
        index: u32,
        object: String,
    },
    MissionStartPhase3 {
        sequence: MissionSequence,
        mission: String,
    },
    MissionStart { sequence: MissionSequence },
    MissionEnd { sequence: MissionSequence },
    PlayerSpawned { position: [f32; 3] },
}

/// Commands sent from a client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientCommand {
    MissionStartPhase1Ack { sequence: MissionSequence },
    MissionStartPhase2Ack { sequence: MissionSequence },
    /// Every ghost-always object of the current load has arrived.
    GhostAlwaysObjectsReceived { sequence: MissionSequence },
    /// Ask the server to restart the ghost transfer.
    GhostAlwaysRetry { sequence: MissionSequence },
    MissionStartPhase3Ack { sequence: MissionSequence },
    SetReadyStatus { ready: bool },
    /// Refresh name and identity without reconnecting.
    UpdateClientData {
        name: String,
        #[serde(default)]
        identity: String,
    },
}

/// Error raised while encoding or decoding a frame.
#[derive(Debug, Error)]
#[error("invalid frame: {0}")]
pub struct FrameError(#[from] serde_json::Error);

impl ServerCommand {
    pub fn to_json(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ClientCommand {
    pub fn to_json(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Sequence carried by a phase acknowledgement, if any.
    pub fn sequence(&self) -> Option<MissionSequence> {
        match self {
            Self::MissionStartPhase1Ack { sequence }
            | Self::MissionStartPhase2Ack { sequence }
            | Self::GhostAlwaysObjectsReceived { sequence }
            | Self::GhostAlwaysRetry { sequence }
            | Self::MissionStartPhase3Ack { sequence } => Some(*sequence),
            Self::SetReadyStatus { .. } | Self::UpdateClientData { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mission_sequence_next_wraps() {
        // テスト項目: MissionSequence::next が 1 ずつ増加し、上限でラップする
        // given (前提条件):
        let seq = MissionSequence::new(4);
        let max = MissionSequence::new(u32::MAX);

        // when (操作):
        let next = seq.next();
        let wrapped = max.next();

        // then (期待する結果):
        assert_eq!(next.value(), 5);
        assert_eq!(wrapped.value(), 0);
    }

    #[test]
    fn test_server_command_uses_kebab_case_tag() {
        // テスト項目: ServerCommand の type タグが kebab-case で出力される
        // given (前提条件):
        let command = ServerCommand::MissionStartPhase1 {
            sequence: MissionSequence::new(5),
            mission: "beginner/learn_the_roll".to_string(),
        };

        // when (操作):
        let json = command.to_json().unwrap();

        // then (期待する結果):
        assert!(json.contains(r#""type":"mission-start-phase1""#));
        assert!(json.contains(r#""sequence":5"#));
    }

    #[test]
    fn test_reject_reason_serializes_to_symbolic_code() {
        // テスト項目: RejectReason がシンボリックなコード文字列にシリアライズされる
        // given (前提条件):
        let command = ServerCommand::ConnectRejected {
            reason: RejectReason::Banned,
        };

        // when (操作):
        let json = command.to_json().unwrap();

        // then (期待する結果):
        assert!(json.contains(r#""reason":"CR_YOUAREBANNED""#));
        assert_eq!(RejectReason::Banned.code(), "CR_YOUAREBANNED");
    }

    #[test]
    fn test_client_command_parses_ack_from_text() {
        // テスト項目: クライアントの ack がテキストから正しくデコードされる
        // given (前提条件):
        let text = r#"{"type":"mission-start-phase2-ack","sequence":7}"#;

        // when (操作):
        let command = ClientCommand::from_json(text).unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            ClientCommand::MissionStartPhase2Ack {
                sequence: MissionSequence::new(7)
            }
        );
        assert_eq!(command.sequence(), Some(MissionSequence::new(7)));
    }

    #[test]
    fn test_client_command_rejects_unknown_type() {
        // テスト項目: 未知の type を持つフレームはエラーになる
        // given (前提条件):
        let text = r#"{"type":"teleport","x":1}"#;

        // when (操作):
        let result = ClientCommand::from_json(text);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_server_params_newtype_variant_is_flattened() {
        // テスト項目: ServerParams バリアントのフィールドが type と同じ階層に出力される
        // given (前提条件):
        let command = ServerCommand::ServerParams(ServerParams {
            host_name: "host".to_string(),
            mission_name: None,
            sequence: MissionSequence::new(1),
            mission_running: false,
            public_slots_used: 1,
            public_slots_free: 7,
            private_slots_used: 0,
            private_slots_free: 0,
        });

        // when (操作):
        let json = command.to_json().unwrap();
        let decoded = ServerCommand::from_json(&json).unwrap();

        // then (期待する結果):
        assert!(json.contains(r#""type":"server-params","host_name":"host""#));
        assert_eq!(decoded, command);
    }
}
