//! Connect-request admission rules.

use missionlink_shared::protocol::RejectReason;

use super::{
    ban_list::BanList,
    slot_pool::SlotPool,
    value_object::{Identity, PlayerName, Timestamp},
};

/// A validated connect request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub address: String,
    pub name: PlayerName,
    pub identity: Identity,
    /// Invite token; `None` when the client was not invited.
    pub invite: Option<String>,
    pub demo: bool,
    /// Connection comes from the hosting machine itself.
    pub local: bool,
}

impl ConnectRequest {
    pub fn is_invited(&self) -> bool {
        self.invite.is_some()
    }
}

/// Server preferences that take part in admission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionPolicy {
    /// Uninvited connections are refused.
    pub private: bool,
    pub invite_code: Option<String>,
    pub demo_build: bool,
    /// PC builds skip the demo/full-version check.
    pub pc_build: bool,
}

/// Decide whether `request` may join.
///
/// The checks run in a fixed order and the first failing one decides the
/// reason.
pub fn check_admission(
    request: &ConnectRequest,
    slots: &SlotPool,
    policy: &AdmissionPolicy,
    bans: &BanList,
    now: Timestamp,
) -> Result<(), RejectReason> {
    let invited = request.is_invited();
    let public_full = slots.is_public_full();

    if !invited && public_full {
        return Err(RejectReason::ServerFull);
    }
    if invited && slots.is_private_full() && public_full {
        return Err(RejectReason::ServerFull);
    }
    if !invited && policy.private {
        return Err(RejectReason::ServerFull);
    }

    if bans.is_banned(&request.identity, now) {
        return Err(RejectReason::Banned);
    }

    if !policy.pc_build && request.demo != policy.demo_build {
        return Err(if request.demo {
            RejectReason::DemoUpgrade
        } else {
            RejectReason::DemoReject
        });
    }

    if let Some(invite) = &request.invite
        && policy.invite_code.as_deref() != Some(invite.as_str())
    {
        return Err(RejectReason::BadInvite);
    }

    Ok(())
}
