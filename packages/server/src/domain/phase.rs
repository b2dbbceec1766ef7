//! Mission download phases and the acknowledgement guard.
//!
//! ```text
//! Idle ──load──▶ AwaitingPhase1Ack ──ack1──▶ AwaitingDatablocks ──done──▶ AwaitingPhase2Ack
//!                                                                            │
//!   Ready ◀──ack3── AwaitingPhase3Ack ◀──ghosts received── Ghosting ◀──ack2──┘
//! ```
//!
//! Within one mission sequence a client only moves forward along this chain.
//! A new mission load restarts every client at `AwaitingPhase1Ack` under the
//! next sequence.

use serde::Serialize;

use missionlink_shared::protocol::MissionSequence;

/// Where a client is in the mission download handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionPhase {
    /// Connected, no mission download in progress.
    Idle,
    /// Phase 1 sent (phase 0).
    AwaitingPhase1Ack,
    /// Phase 1 acknowledged, datablocks being transmitted (phase 1).
    AwaitingDatablocks,
    /// Datablocks done, phase 2 sent (phase 1.5).
    AwaitingPhase2Ack,
    /// Phase 2 acknowledged, ghost-always objects in flight (phase 2).
    Ghosting,
    /// Ghosts received, phase 3 sent.
    AwaitingPhase3Ack,
    /// Phase 3 acknowledged, client is in the game (phase 3).
    Ready,
}

impl MissionPhase {
    /// Position along the handshake; strictly increases with every advance.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::AwaitingPhase1Ack => 1,
            Self::AwaitingDatablocks => 2,
            Self::AwaitingPhase2Ack => 3,
            Self::Ghosting => 4,
            Self::AwaitingPhase3Ack => 5,
            Self::Ready => 6,
        }
    }

    /// Phase number as the scripts count it (0, 1, 1.5, 2, 3).
    pub fn legacy_value(self) -> f32 {
        match self {
            Self::Idle | Self::AwaitingPhase1Ack => 0.0,
            Self::AwaitingDatablocks => 1.0,
            Self::AwaitingPhase2Ack => 1.5,
            Self::Ghosting | Self::AwaitingPhase3Ack => 2.0,
            Self::Ready => 3.0,
        }
    }
}

/// An inbound event that may advance a client's phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTransition {
    Phase1Ack,
    DatablocksDone,
    Phase2Ack,
    GhostsReceived,
    /// Restart the ghost transfer; the phase does not move.
    GhostRetry,
    Phase3Ack,
}

impl PhaseTransition {
    /// The only phase this transition is accepted from.
    pub const fn expected(self) -> MissionPhase {
        match self {
            Self::Phase1Ack => MissionPhase::AwaitingPhase1Ack,
            Self::DatablocksDone => MissionPhase::AwaitingDatablocks,
            Self::Phase2Ack => MissionPhase::AwaitingPhase2Ack,
            Self::GhostsReceived | Self::GhostRetry => MissionPhase::Ghosting,
            Self::Phase3Ack => MissionPhase::AwaitingPhase3Ack,
        }
    }

    /// The phase the client moves to once accepted.
    pub const fn target(self) -> MissionPhase {
        match self {
            Self::Phase1Ack => MissionPhase::AwaitingDatablocks,
            Self::DatablocksDone => MissionPhase::AwaitingPhase2Ack,
            Self::Phase2Ack | Self::GhostRetry => MissionPhase::Ghosting,
            Self::GhostsReceived => MissionPhase::AwaitingPhase3Ack,
            Self::Phase3Ack => MissionPhase::Ready,
        }
    }
}

/// Result of offering a transition to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Advanced(MissionPhase),
    /// The message belongs to another mission load.
    Stale {
        received: MissionSequence,
        current: MissionSequence,
    },
    /// The client is not in the phase this message answers.
    OutOfOrder {
        phase: MissionPhase,
        expected: MissionPhase,
    },
    NotRunning,
    UnknownClient,
}

impl AckOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced(_))
    }
}

/// Apply the double guard: sequence first, then predecessor phase.
pub fn guard_transition(
    phase: MissionPhase,
    transition: PhaseTransition,
    received: MissionSequence,
    current: MissionSequence,
    mission_running: bool,
) -> AckOutcome {
    if received != current {
        return AckOutcome::Stale { received, current };
    }
    if !mission_running {
        return AckOutcome::NotRunning;
    }
    let expected = transition.expected();
    if phase != expected {
        return AckOutcome::OutOfOrder { phase, expected };
    }
    AckOutcome::Advanced(transition.target())
}
