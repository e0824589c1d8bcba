//! The TPA manager: send, accept, deny, expire, disconnect cleanup, shutdown.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use mcu_plugin_api::PlayerId;
use tracing::{debug, info};

use crate::cooldown::{whole_secs_ceil, CooldownTracker};
use crate::error::TpaError;
use crate::host::{TpaHost, TpaNotice};
use crate::request::{RequestId, TpaRequest};
use crate::store::RequestStore;

/// Tunables for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpaConfig {
    /// Minimum time between two requests from the same sender.
    pub cooldown: Duration,
    /// How long a request stays answerable.
    pub timeout: Duration,
    /// Whether a player may send a request to themselves.
    pub allow_self_request: bool,
    /// Whether the other party hears about denials, expiries and departures.
    pub notify_counterpart: bool,
}

impl Default for TpaConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(30),
            timeout: Duration::from_secs(60),
            allow_self_request: false,
            notify_counterpart: true,
        }
    }
}

struct TpaState {
    requests: RequestStore,
    cooldowns: CooldownTracker,
    next_id: u32,
}

impl TpaState {
    fn next_request_id(&mut self) -> RequestId {
        self.next_id = self.next_id.wrapping_add(1);
        RequestId::new(self.next_id)
    }
}

/// Owns every pending request and cooldown entry.
///
/// One lock covers both maps and is held for the whole of each operation, so
/// accept, deny, expiry and disconnect cleanup are totally ordered. Expiry
/// arrives as a message (`expire(id)`) through the same lock; whichever of
/// accept/deny/expire runs first removes the entry and the others find nothing.
pub struct TpaManager {
    config: TpaConfig,
    state: Mutex<TpaState>,
}

impl TpaManager {
    pub fn new(config: TpaConfig) -> Self {
        Self {
            state: Mutex::new(TpaState {
                requests: RequestStore::new(),
                cooldowns: CooldownTracker::new(config.cooldown),
                next_id: 0,
            }),
            config,
        }
    }

    pub fn config(&self) -> &TpaConfig {
        &self.config
    }

    // Every mutation leaves both maps consistent, so a panic elsewhere while
    // the lock was held does not invalidate the state.
    fn lock(&self) -> MutexGuard<'_, TpaState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tell `player` about `notice` if they are still online. Counterpart
    /// notices are dropped unless the deployment enables them.
    fn deliver(&self, host: &mut dyn TpaHost, player: PlayerId, notice: TpaNotice) {
        if notice.is_counterpart() && !self.config.notify_counterpart {
            return;
        }
        if host.is_online(player) {
            host.notify(player, notice);
        }
    }

    /// Issue a request from `from` to `to`, replacing any earlier request
    /// from `from`.
    pub fn send(
        &self,
        from: PlayerId,
        to: PlayerId,
        host: &mut dyn TpaHost,
    ) -> Result<RequestId, TpaError> {
        if from == to && !self.config.allow_self_request {
            return Err(TpaError::SelfTarget);
        }

        let mut state = self.lock();
        let now = host.now();
        if let Some(remaining) = state.cooldowns.remaining(from, now) {
            return Err(TpaError::RateLimited {
                remaining_secs: whole_secs_ceil(remaining),
            });
        }

        let id = state.next_request_id();
        if let Some(replaced) = state.requests.insert(TpaRequest::new(id, from, to, now)) {
            host.cancel_expiry(replaced.id());
            debug!(
                "TPA {} from {from} replaced by {id} (was to {})",
                replaced.id(),
                replaced.to()
            );
        }
        state.cooldowns.record(from, now);
        host.schedule_expiry(self.config.timeout, id);
        debug!("TPA {id}: {from} -> {to}");

        // A self-request (when allowed) gets both lines, like any other.
        self.deliver(host, from, TpaNotice::Sent { to });
        self.deliver(host, to, TpaNotice::Received { from });
        Ok(id)
    }

    /// Accept the newest request addressed to `recipient` and teleport its sender.
    pub fn accept(
        &self,
        recipient: PlayerId,
        host: &mut dyn TpaHost,
    ) -> Result<TpaRequest, TpaError> {
        let mut state = self.lock();
        let request = state
            .requests
            .latest_to(recipient)
            .cloned()
            .ok_or(TpaError::NoPendingRequest)?;
        state.requests.remove(request.from());
        host.cancel_expiry(request.id());

        let from = request.from();
        if !host.is_online(from) {
            debug!("TPA {}: sender {from} gone, dropped", request.id());
            return Err(TpaError::SenderGone);
        }

        host.teleport_to(from, recipient);
        self.deliver(host, recipient, TpaNotice::Accepted { from });
        self.deliver(host, from, TpaNotice::AcceptedByTarget { to: recipient });
        debug!("TPA {} accepted by {recipient}", request.id());
        Ok(request)
    }

    /// Deny the newest request addressed to `recipient`.
    pub fn deny(
        &self,
        recipient: PlayerId,
        host: &mut dyn TpaHost,
    ) -> Result<TpaRequest, TpaError> {
        let mut state = self.lock();
        let request = state
            .requests
            .latest_to(recipient)
            .cloned()
            .ok_or(TpaError::NoPendingRequest)?;
        state.requests.remove(request.from());
        host.cancel_expiry(request.id());

        self.deliver(host, recipient, TpaNotice::Denied {
            from: request.from(),
        });
        self.deliver(host, request.from(), TpaNotice::DeniedByTarget {
            to: recipient,
        });
        debug!("TPA {} denied by {recipient}", request.id());
        Ok(request)
    }

    /// Timer callback. Removes the request only if it is still the one the
    /// timer was armed for; a stale or already-answered id is a no-op.
    pub fn expire(&self, id: RequestId, host: &mut dyn TpaHost) -> Option<TpaRequest> {
        let mut state = self.lock();
        let Some(request) = state.requests.remove_by_id(id) else {
            debug!("TPA {id}: expiry ignored, request already gone");
            return None;
        };

        let (from, to) = (request.from(), request.to());
        self.deliver(host, from, TpaNotice::Expired { to });
        if to != from {
            self.deliver(host, to, TpaNotice::ExpiredFrom { from });
        }
        debug!("TPA {id} expired");
        Some(request)
    }

    /// Drop every request `player` sent or received. Cooldowns are kept so a
    /// quick reconnect does not reset the rate limit. Returns how many
    /// requests were removed.
    pub fn on_disconnect(&self, player: PlayerId, host: &mut dyn TpaHost) -> usize {
        let mut state = self.lock();
        let mut removed = 0;

        if let Some(outgoing) = state.requests.remove(player) {
            host.cancel_expiry(outgoing.id());
            if outgoing.to() != player {
                self.deliver(host, outgoing.to(), TpaNotice::SenderLeft {
                    from: player,
                });
            }
            removed += 1;
        }
        for incoming in state.requests.remove_all_to(player) {
            host.cancel_expiry(incoming.id());
            self.deliver(host, incoming.from(), TpaNotice::RecipientLeft {
                to: player,
            });
            removed += 1;
        }

        if removed > 0 {
            debug!("Removed {removed} TPA request(s) for departed player {player}");
        }
        removed
    }

    /// Cancel every timer and clear all state. Safe to call repeatedly.
    pub fn shutdown(&self, host: &mut dyn TpaHost) -> usize {
        let mut state = self.lock();
        let drained = state.requests.drain();
        for request in &drained {
            host.cancel_expiry(request.id());
        }
        state.cooldowns.clear();
        info!("TPA manager shut down ({} pending request(s) dropped)", drained.len());
        drained.len()
    }

    // --- Queries ---

    pub fn pending_from(&self, sender: PlayerId) -> Option<TpaRequest> {
        self.lock().requests.get(sender).cloned()
    }

    /// Requests addressed to `recipient`, oldest first.
    pub fn pending_to(&self, recipient: PlayerId) -> Vec<TpaRequest> {
        self.lock()
            .requests
            .all_to(recipient)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn last_request_at(&self, sender: PlayerId) -> Option<Instant> {
        self.lock().cooldowns.last_issued(sender)
    }

    pub fn cooldown_remaining(&self, sender: PlayerId, now: Instant) -> Option<Duration> {
        self.lock().cooldowns.remaining(sender, now)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
