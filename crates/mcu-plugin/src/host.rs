//! Bridges the TPA manager onto the plugin-facing server API.

use std::time::{Duration, Instant};

use mcu_plugin_api::{PlayerId, PluginPlayer, ServerApi};
use mcu_tpa::{Clock, RequestId, TpaHost, TpaNotice};

use crate::messages::MessageService;

pub const TICKS_PER_SECOND: u64 = 20;

/// Server ticks covering `delay`, rounded up, never zero.
pub fn delay_to_ticks(delay: Duration) -> u64 {
    let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    millis
        .saturating_mul(TICKS_PER_SECOND)
        .div_ceil(1000)
        .max(1)
}

/// Message key for a notice and the player whose name fills `{player}`.
pub fn notice_message(notice: TpaNotice) -> (&'static str, PlayerId) {
    match notice {
        TpaNotice::Sent { to } => ("tpa-sent", to),
        TpaNotice::Received { from } => ("tpa-received", from),
        TpaNotice::Accepted { from } => ("tpa-accepted", from),
        TpaNotice::AcceptedByTarget { to } => ("tpa-accepted-other", to),
        TpaNotice::Denied { from } => ("tpa-denied", from),
        TpaNotice::DeniedByTarget { to } => ("tpa-denied-other", to),
        TpaNotice::Expired { to } => ("tpa-timeout", to),
        TpaNotice::ExpiredFrom { from } => ("tpa-timeout-other", from),
        TpaNotice::RecipientLeft { to } => ("tpa-recipient-left", to),
        TpaNotice::SenderLeft { from } => ("tpa-sender-left", from),
    }
}

/// [`TpaHost`] over one plugin callback's [`ServerApi`].
///
/// Expiry timers become delayed tasks keyed by the request id, so they come
/// back through `Plugin::on_task`.
pub struct ApiHost<'a> {
    api: &'a mut dyn ServerApi,
    messages: &'a MessageService,
    clock: &'a dyn Clock,
    plugin: &'a str,
    departing: Option<&'a PluginPlayer>,
}

impl<'a> ApiHost<'a> {
    pub fn new(
        api: &'a mut dyn ServerApi,
        messages: &'a MessageService,
        clock: &'a dyn Clock,
        plugin: &'a str,
    ) -> Self {
        Self {
            api,
            messages,
            clock,
            plugin,
            departing: None,
        }
    }

    /// Treat `player` as already gone while still knowing their name.
    pub fn departing(mut self, player: &'a PluginPlayer) -> Self {
        self.departing = Some(player);
        self
    }

    fn player(&self, id: PlayerId) -> Option<PluginPlayer> {
        if self.departing.is_some_and(|p| p.id == id) {
            return None;
        }
        self.api.get_player_by_id(id)
    }

    fn name_of(&self, id: PlayerId) -> String {
        match self.departing {
            Some(p) if p.id == id => p.name.clone(),
            _ => self
                .api
                .get_player_by_id(id)
                .map(|p| p.name)
                .unwrap_or_else(|| id.to_string()),
        }
    }
}

impl TpaHost for ApiHost<'_> {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn is_online(&self, player: PlayerId) -> bool {
        self.player(player).is_some()
    }

    fn schedule_expiry(&mut self, delay: Duration, request: RequestId) {
        self.api
            .schedule_delayed(self.plugin, delay_to_ticks(delay), request.raw());
    }

    fn cancel_expiry(&mut self, request: RequestId) {
        self.api.cancel_task(self.plugin, request.raw());
    }

    fn notify(&mut self, player: PlayerId, notice: TpaNotice) {
        let Some(recipient) = self.player(player) else {
            return;
        };
        let (key, subject) = notice_message(notice);
        let name = self.name_of(subject);
        let text = self.messages.format(key, &[("player", &name)]);
        self.api.send_message(&recipient.name, &text);
    }

    fn teleport_to(&mut self, player: PlayerId, destination: PlayerId) {
        let (Some(mover), Some(target)) = (self.player(player), self.player(destination)) else {
            return;
        };
        let (x, y, z) = target.position;
        self.api.teleport_player(&mover.name, x, y, z);
    }
}
