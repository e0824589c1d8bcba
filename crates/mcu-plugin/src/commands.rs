//! Built-in commands and the single handler that runs them.

use mcu_command::{
    complete_from, resolve_policy, CommandResult, CommandSpec, MessageKeys, PlayerInfo,
    TargetError, TargetPolicy,
};
use mcu_plugin_api::{CommandSender, GameMode, PluginPlayer, ServerApi};
use mcu_tpa::TpaError;
use tracing::debug;

use crate::host::ApiHost;
use crate::{UtilityPlugin, PLUGIN_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Gamemode,
    God,
    TpaSend,
    TpaAccept,
    TpaDeny,
}

pub fn builtin_commands() -> Vec<CommandSpec<Action>> {
    vec![
        CommandSpec {
            name: "gamemode",
            aliases: &["gm"],
            description: "Change a player's game mode",
            usage: "/gamemode <mode> [player]",
            permission: "utility.gamemode",
            target: TargetPolicy::OptionalOrSender(1),
            messages: MessageKeys::new("gamemode-changed", "gamemode-changed-other"),
            action: Action::Gamemode,
        },
        CommandSpec {
            name: "god",
            aliases: &[],
            description: "Toggle god mode",
            usage: "/god [player]",
            permission: "utility.god",
            target: TargetPolicy::OptionalOrSender(0),
            messages: MessageKeys::new("god-enabled", "god-disabled"),
            action: Action::God,
        },
        CommandSpec {
            name: "tpa",
            aliases: &[],
            description: "Ask to teleport to a player",
            usage: "/tpa <player>",
            permission: "utility.tpa",
            target: TargetPolicy::Required(0),
            messages: MessageKeys::NONE,
            action: Action::TpaSend,
        },
        CommandSpec {
            name: "tpaccept",
            aliases: &["tpyes"],
            description: "Accept the latest teleport request",
            usage: "/tpaccept",
            permission: "utility.tpa",
            target: TargetPolicy::SenderOnly,
            messages: MessageKeys::NONE,
            action: Action::TpaAccept,
        },
        CommandSpec {
            name: "tpadeny",
            aliases: &["tpno"],
            description: "Deny the latest teleport request",
            usage: "/tpadeny",
            permission: "utility.tpa",
            target: TargetPolicy::SenderOnly,
            messages: MessageKeys::NONE,
            action: Action::TpaDeny,
        },
    ]
}

fn player_infos(players: &[PluginPlayer]) -> Vec<PlayerInfo> {
    players
        .iter()
        .map(|p| PlayerInfo {
            name: p.name.clone(),
            position: p.position,
        })
        .collect()
}

impl UtilityPlugin {
    fn reply(&self, key: &str, params: &[(&str, &str)]) -> String {
        self.messages.format(key, params)
    }

    fn target_error(&self, spec: &CommandSpec<Action>, err: TargetError) -> CommandResult {
        let text = match err {
            TargetError::PlayerOnly => self.reply("player-only", &[]),
            TargetError::ConsoleNeedsTarget => self.reply("console-player-required", &[]),
            TargetError::MissingArgument => self.reply("usage", &[("usage", spec.usage)]),
            TargetError::NotFound(name) => self.reply("player-not-found", &[("player", &name)]),
            TargetError::NotSingle => self.reply("single-target", &[]),
        };
        CommandResult::err(text)
    }

    fn tpa_error(&self, err: TpaError) -> CommandResult {
        let text = match err {
            TpaError::SelfTarget => self.reply("tpa-self", &[]),
            TpaError::RateLimited { remaining_secs } => {
                self.reply("tpa-cooldown", &[("cooldown", &remaining_secs.to_string())])
            }
            TpaError::NoPendingRequest => self.reply("tpa-no-request", &[]),
            TpaError::SenderGone => self.reply("tpa-sender-gone", &[]),
        };
        CommandResult::err(text)
    }

    /// Run one command: permission check, target resolution, action.
    pub(crate) fn execute(
        &self,
        spec: &CommandSpec<Action>,
        args: &[String],
        sender: &CommandSender,
        api: &mut dyn ServerApi,
    ) -> CommandResult {
        if !api.has_permission(sender, spec.permission) {
            return CommandResult::err(self.reply("no-permission", &[]));
        }

        // The mode comes before the target, so check it first.
        let mode = if spec.action == Action::Gamemode {
            let Some(arg) = args.first() else {
                return CommandResult::err(self.reply("usage", &[("usage", spec.usage)]));
            };
            match GameMode::from_arg(arg) {
                Some(mode) => Some(mode),
                None => return CommandResult::err(self.reply("invalid-gamemode", &[])),
            }
        } else {
            None
        };

        let online = api.online_players();
        let infos = player_infos(&online);
        let sender_player = sender.player();
        let resolved = resolve_policy(
            spec.target,
            args,
            sender_player.map(|p| (p.name.as_str(), p.position)),
            &infos,
        );
        let target = match resolved {
            Ok(name) => match online.iter().find(|p| p.name == name) {
                Some(p) => p.clone(),
                None => return self.target_error(spec, TargetError::NotFound(name)),
            },
            Err(err) => return self.target_error(spec, err),
        };
        let is_self = sender_player.is_some_and(|p| p.id == target.id);
        debug!("{} ran /{} on {}", sender.name(), spec.name, target.name);

        match spec.action {
            Action::Gamemode => {
                let mode = mode.unwrap_or_default();
                api.set_gamemode(&target.name, mode);
                let text = if is_self {
                    self.reply(spec.messages.success, &[("gamemode", mode.as_str())])
                } else {
                    self.reply(
                        spec.messages.alternate,
                        &[("gamemode", mode.as_str()), ("player", &target.name)],
                    )
                };
                CommandResult::ok(text)
            }
            Action::God => {
                let key = if self.god.toggle(target.id) {
                    spec.messages.success
                } else {
                    spec.messages.alternate
                };
                CommandResult::ok(self.reply(key, &[("player", &target.name)]))
            }
            Action::TpaSend => {
                let Some(from) = sender_player else {
                    return self.target_error(spec, TargetError::PlayerOnly);
                };
                let mut host = ApiHost::new(api, &self.messages, self.clock.as_ref(), PLUGIN_NAME);
                match self.tpa.send(from.id, target.id, &mut host) {
                    Ok(_) => CommandResult::silent(),
                    Err(err) => self.tpa_error(err),
                }
            }
            Action::TpaAccept | Action::TpaDeny => {
                let mut host = ApiHost::new(api, &self.messages, self.clock.as_ref(), PLUGIN_NAME);
                let outcome = if spec.action == Action::TpaAccept {
                    self.tpa.accept(target.id, &mut host)
                } else {
                    self.tpa.deny(target.id, &mut host)
                };
                match outcome {
                    Ok(_) => CommandResult::silent(),
                    Err(err) => self.tpa_error(err),
                }
            }
        }
    }

    /// Candidates for the last argument in `args`.
    pub(crate) fn complete(
        &self,
        spec: &CommandSpec<Action>,
        args: &[String],
        sender: &CommandSender,
        api: &dyn ServerApi,
    ) -> Vec<String> {
        if !api.has_permission(sender, spec.permission) {
            return Vec::new();
        }
        let index = args.len().saturating_sub(1);
        let partial = args.last().map(String::as_str).unwrap_or("");

        let names_at = match spec.target {
            TargetPolicy::Required(i) | TargetPolicy::OptionalOrSender(i) => Some(i),
            TargetPolicy::SenderOnly => None,
        };
        if spec.action == Action::Gamemode && index == 0 {
            return complete_from(partial, GameMode::NAMES);
        }
        if names_at != Some(index) {
            return Vec::new();
        }

        let hide_sender =
            spec.action == Action::TpaSend && !self.tpa.config().allow_self_request;
        let sender_id = sender.player().map(|p| p.id);
        let online = api.online_players();
        let names = online
            .iter()
            .filter(|p| !hide_sender || Some(p.id) != sender_id)
            .map(|p| p.name.as_str());
        complete_from(partial, names)
    }
}
