//! Capabilities the TPA manager needs from the hosting server.

use std::time::{Duration, Instant};

use mcu_plugin_api::PlayerId;

use crate::request::RequestId;

/// Something a player should be told about. The host renders it as chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TpaNotice {
    /// To the sender: the request to `to` is out.
    Sent { to: PlayerId },
    /// To the recipient: `from` wants to teleport to you.
    Received { from: PlayerId },
    /// To the recipient: you accepted `from`.
    Accepted { from: PlayerId },
    /// To the sender: `to` accepted, you are being moved.
    AcceptedByTarget { to: PlayerId },
    /// To the recipient: you denied `from`.
    Denied { from: PlayerId },
    /// To the sender: `to` denied.
    DeniedByTarget { to: PlayerId },
    /// To the sender: the request to `to` ran out.
    Expired { to: PlayerId },
    /// To the recipient: the request from `from` ran out.
    ExpiredFrom { from: PlayerId },
    /// To the sender: `to` left, the request is gone.
    RecipientLeft { to: PlayerId },
    /// To the recipient: `from` left, the request is gone.
    SenderLeft { from: PlayerId },
}

impl TpaNotice {
    /// Notices about the other party's action, only sent when the
    /// deployment enables counterpart notifications.
    pub fn is_counterpart(&self) -> bool {
        matches!(
            self,
            TpaNotice::DeniedByTarget { .. }
                | TpaNotice::ExpiredFrom { .. }
                | TpaNotice::RecipientLeft { .. }
                | TpaNotice::SenderLeft { .. }
        )
    }
}

/// Host side of the TPA manager. Implementations must not block: the manager
/// calls the scheduling methods while holding its lock.
pub trait TpaHost {
    fn now(&self) -> Instant;

    /// Whether the player is still connected.
    fn is_online(&self, player: PlayerId) -> bool;

    /// Arrange for [`crate::TpaManager::expire`] to be called with `request`
    /// after `delay`.
    fn schedule_expiry(&mut self, delay: Duration, request: RequestId);

    /// Best-effort cancel; the expiry may still arrive and is then ignored.
    fn cancel_expiry(&mut self, request: RequestId);

    fn notify(&mut self, player: PlayerId, notice: TpaNotice);

    /// Move `player` to where `destination` currently stands.
    fn teleport_to(&mut self, player: PlayerId, destination: PlayerId);
}
