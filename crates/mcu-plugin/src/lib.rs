//! The utility plugin: teleport requests, god mode, and game-mode switching.

pub mod commands;
pub mod config;
pub mod god;
pub mod host;
pub mod messages;

use std::sync::Arc;

use mcu_command::CommandRegistry;
use mcu_plugin_api::{CommandSender, EventResult, Plugin, PluginEvent, PluginInfo, ServerApi};
use mcu_tpa::{Clock, RequestId, SystemClock, TpaManager};
use tracing::{debug, info, warn};

use crate::commands::{builtin_commands, Action};
use crate::config::PluginConfig;
use crate::god::GodModeRegistry;
use crate::host::ApiHost;
use crate::messages::MessageService;

pub const PLUGIN_NAME: &str = "UtilityPlugin";

pub struct UtilityPlugin {
    config: PluginConfig,
    messages: MessageService,
    tpa: Arc<TpaManager>,
    god: Arc<GodModeRegistry>,
    clock: Arc<dyn Clock>,
    commands: CommandRegistry<Action>,
}

impl UtilityPlugin {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let config = PluginConfig::default();
        let mut commands = CommandRegistry::new();
        for spec in builtin_commands() {
            commands.register(spec);
        }
        Self {
            messages: MessageService::new(config.prefix.clone(), &config.messages),
            tpa: Arc::new(TpaManager::new(config.tpa_config())),
            god: Arc::new(GodModeRegistry::new()),
            clock,
            commands,
            config,
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn tpa(&self) -> &Arc<TpaManager> {
        &self.tpa
    }

    pub fn god(&self) -> &Arc<GodModeRegistry> {
        &self.god
    }

    fn apply_config(&mut self, config: PluginConfig) {
        self.messages = MessageService::new(config.prefix.clone(), &config.messages);
        self.tpa = Arc::new(TpaManager::new(config.tpa_config()));
        self.config = config;
    }
}

impl Default for UtilityPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for UtilityPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: "Teleport requests, god mode and game mode commands".into(),
            author: "mcu".into(),
        }
    }

    fn on_enable(&mut self, api: &mut dyn ServerApi) {
        for spec in self.commands.specs() {
            api.register_command(spec.name, spec.description, PLUGIN_NAME);
            for alias in spec.aliases {
                api.register_command(alias, spec.description, PLUGIN_NAME);
            }
        }
        info!(
            "{PLUGIN_NAME} enabled with {} commands (tpa cooldown {}s, timeout {}s)",
            self.commands.len(),
            self.config.tpa.cooldown_secs,
            self.config.tpa.timeout_secs
        );
    }

    fn on_disable(&mut self, api: &mut dyn ServerApi) {
        let mut host = ApiHost::new(api, &self.messages, self.clock.as_ref(), PLUGIN_NAME);
        let requests = self.tpa.shutdown(&mut host);
        let gods = self.god.clear_all();
        info!("{PLUGIN_NAME} disabled: dropped {requests} teleport requests, {gods} god-mode players");
    }

    fn on_event(&mut self, event: &PluginEvent, api: &mut dyn ServerApi) -> EventResult {
        match event {
            PluginEvent::PlayerQuit { player } => {
                let mut host = ApiHost::new(api, &self.messages, self.clock.as_ref(), PLUGIN_NAME)
                    .departing(player);
                let removed = self.tpa.on_disconnect(player.id, &mut host);
                if self.god.remove(player.id) {
                    debug!("Removed god mode from {} (left)", player.name);
                }
                if removed > 0 {
                    debug!("Dropped {removed} teleport requests for {}", player.name);
                }
                EventResult::Continue
            }
            PluginEvent::PlayerDamage { player, cause, .. } if self.god.is_enabled(player.id) => {
                debug!("Prevented {cause:?} damage to {} (god mode)", player.name);
                EventResult::Cancelled
            }
            PluginEvent::PlayerFoodChange { player, .. }
                if self.config.god.prevent_hunger && self.god.is_enabled(player.id) =>
            {
                debug!("Prevented hunger change for {} (god mode)", player.name);
                EventResult::Cancelled
            }
            _ => EventResult::Continue,
        }
    }

    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        let mut host = ApiHost::new(api, &self.messages, self.clock.as_ref(), PLUGIN_NAME);
        self.tpa.expire(RequestId::new(task_id), &mut host);
    }

    fn on_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
        api: &mut dyn ServerApi,
    ) -> Option<String> {
        let spec = self.commands.get(command)?;
        self.execute(spec, args, sender, api).reply()
    }

    fn tab_complete(
        &self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
        api: &dyn ServerApi,
    ) -> Vec<String> {
        match self.commands.get(command) {
            Some(spec) => self.complete(spec, args, sender, api),
            None => Vec::new(),
        }
    }

    fn default_config(&self) -> Option<serde_json::Value> {
        PluginConfig::default().to_json().ok()
    }

    fn load_config(&mut self, config: serde_json::Value) {
        match PluginConfig::from_json(config) {
            Ok(config) => self.apply_config(config),
            Err(e) => {
                warn!("{e}; using defaults");
                self.apply_config(PluginConfig::default());
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    use mcu_plugin_api::{DamageCause, GameMode, PlayerId, PluginPlayer};
    use mcu_tpa::ManualClock;
    use serde_json::json;

    /// A tiny server: players, per-plugin delayed tasks, recorded writes.
    #[derive(Default)]
    struct MockServer {
        players: Vec<PluginPlayer>,
        denied: HashSet<String>,
        tick: u64,
        tasks: Vec<(u64, u32)>,
        messages: Vec<(String, String)>,
        teleports: Vec<(String, (f32, f32, f32))>,
        gamemodes: Vec<(String, GameMode)>,
        commands: Vec<String>,
    }

    impl ServerApi for MockServer {
        fn online_players(&self) -> Vec<PluginPlayer> {
            self.players.clone()
        }
        fn get_player(&self, name: &str) -> Option<PluginPlayer> {
            self.players
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(name))
                .cloned()
        }
        fn get_player_by_id(&self, id: PlayerId) -> Option<PluginPlayer> {
            self.players.iter().find(|p| p.id == id).cloned()
        }
        fn send_message(&mut self, player_name: &str, message: &str) {
            self.messages.push((player_name.into(), message.into()));
        }
        fn teleport_player(&mut self, player_name: &str, x: f32, y: f32, z: f32) {
            self.teleports.push((player_name.into(), (x, y, z)));
        }
        fn set_gamemode(&mut self, player_name: &str, mode: GameMode) {
            self.gamemodes.push((player_name.into(), mode));
        }
        fn has_permission(&self, _sender: &CommandSender, permission: &str) -> bool {
            !self.denied.contains(permission)
        }
        fn schedule_delayed(&mut self, _plugin_name: &str, delay_ticks: u64, task_id: u32) {
            self.tasks.push((self.tick + delay_ticks, task_id));
        }
        fn cancel_task(&mut self, _plugin_name: &str, task_id: u32) {
            self.tasks.retain(|(_, id)| *id != task_id);
        }
        fn register_command(&mut self, name: &str, _description: &str, _plugin_name: &str) {
            self.commands.push(name.into());
        }
    }

    impl MockServer {
        fn join(&mut self, id: u128, name: &str, position: (f32, f32, f32)) -> PluginPlayer {
            let player = PluginPlayer {
                id: PlayerId::from_u128(id),
                name: name.into(),
                position,
                gamemode: GameMode::Survival,
                health: 20.0,
                food: 20,
            };
            self.players.push(player.clone());
            player
        }

        fn sender(&self, name: &str) -> CommandSender {
            match self.get_player(name) {
                Some(p) => CommandSender::Player(p),
                None => CommandSender::Console,
            }
        }

        fn last_message_to(&self, name: &str) -> Option<&str> {
            self.messages
                .iter()
                .rev()
                .find(|(to, _)| to == name)
                .map(|(_, text)| text.as_str())
        }
    }

    /// Advance simulated time and server ticks together, firing due tasks.
    fn advance(
        plugin: &mut UtilityPlugin,
        clock: &ManualClock,
        server: &mut MockServer,
        secs: u64,
    ) {
        clock.advance_secs(secs);
        server.tick += secs * 20;
        let now = server.tick;
        let (due, rest): (Vec<_>, Vec<_>) = server.tasks.drain(..).partition(|(at, _)| *at <= now);
        server.tasks = rest;
        for (_, id) in due {
            plugin.on_task(id, server);
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn setup() -> (UtilityPlugin, Arc<ManualClock>, MockServer) {
        let clock = Arc::new(ManualClock::new());
        let mut plugin = UtilityPlugin::with_clock(clock.clone());
        plugin.load_config(json!({
            "prefix": "",
            "tpa": { "cooldown_secs": 10, "timeout_secs": 60 }
        }));
        let mut server = MockServer::default();
        server.join(1, "Alice", (0.0, 64.0, 0.0));
        server.join(2, "Bob", (100.0, 70.0, 100.0));
        server.join(3, "Carol", (-50.0, 64.0, 20.0));
        plugin.on_enable(&mut server);
        (plugin, clock, server)
    }

    fn run(
        plugin: &mut UtilityPlugin,
        server: &mut MockServer,
        who: &str,
        cmd: &[&str],
    ) -> Option<String> {
        let sender = server.sender(who);
        plugin.on_command(cmd[0], &args(&cmd[1..]), &sender, server)
    }

    #[test]
    fn enable_registers_commands_and_aliases() {
        let (_plugin, _clock, server) = setup();
        for name in ["gamemode", "gm", "god", "tpa", "tpaccept", "tpyes", "tpadeny", "tpno"] {
            assert!(server.commands.iter().any(|c| c == name), "missing {name}");
        }
    }

    #[test]
    fn load_config_applies_and_falls_back() {
        let (mut plugin, _clock, _server) = setup();
        assert_eq!(plugin.tpa().config().cooldown, Duration::from_secs(10));
        plugin.load_config(json!({ "tpa": { "timeout_secs": "never" } }));
        assert_eq!(plugin.config(), &PluginConfig::default());
        assert_eq!(plugin.tpa().config().cooldown, Duration::from_secs(30));
        assert!(plugin.default_config().is_some());
    }

    #[test]
    fn tpa_accept_teleports_sender() {
        let (mut plugin, clock, mut server) = setup();
        assert_eq!(run(&mut plugin, &mut server, "Alice", &["tpa", "bob"]), None);
        assert_eq!(server.last_message_to("Alice"), Some("§aTeleport request sent to §eBob§a."));
        assert!(server.last_message_to("Bob").is_some_and(|m| m.contains("Alice")));
        assert_eq!(server.tasks.len(), 1);

        advance(&mut plugin, &clock, &mut server, 5);
        assert_eq!(run(&mut plugin, &mut server, "Bob", &["tpyes"]), None);
        assert_eq!(server.teleports, vec![("Alice".to_string(), (100.0, 70.0, 100.0))]);
        assert!(server.tasks.is_empty());
        assert_eq!(plugin.tpa().pending_count(), 0);
    }

    #[test]
    fn tpa_expires_through_scheduled_task() {
        let (mut plugin, clock, mut server) = setup();
        run(&mut plugin, &mut server, "Alice", &["tpa", "Bob"]);
        advance(&mut plugin, &clock, &mut server, 59);
        assert_eq!(plugin.tpa().pending_count(), 1);
        advance(&mut plugin, &clock, &mut server, 1);
        assert_eq!(plugin.tpa().pending_count(), 0);
        assert!(server.last_message_to("Alice").is_some_and(|m| m.contains("expired")));
        assert!(server.last_message_to("Bob").is_some_and(|m| m.contains("expired")));

        let reply = run(&mut plugin, &mut server, "Bob", &["tpaccept"]);
        assert_eq!(reply.as_deref(), Some("§cYou have no pending teleport requests."));
    }

    #[test]
    fn tpa_errors_render_messages() {
        let (mut plugin, clock, mut server) = setup();
        let reply = run(&mut plugin, &mut server, "Alice", &["tpa", "Alice"]);
        assert_eq!(reply.as_deref(), Some("§cYou cannot send a teleport request to yourself."));

        run(&mut plugin, &mut server, "Alice", &["tpa", "Bob"]);
        advance(&mut plugin, &clock, &mut server, 3);
        let reply = run(&mut plugin, &mut server, "Alice", &["tpa", "Carol"]);
        assert_eq!(
            reply.as_deref(),
            Some("§cWait §e7§c more seconds before sending another request.")
        );

        let reply = run(&mut plugin, &mut server, "Alice", &["tpa"]);
        assert_eq!(reply.as_deref(), Some("§cUsage: §e/tpa <player>"));
        let reply = run(&mut plugin, &mut server, "Alice", &["tpa", "Nobody"]);
        assert_eq!(reply.as_deref(), Some("§cPlayer §eNobody§c is not online."));
        let reply = run(&mut plugin, &mut server, "Alice", &["tpa", "@a"]);
        assert_eq!(reply.as_deref(), Some("§cThat selector matches more than one player."));
    }

    #[test]
    fn tpa_from_console_is_refused() {
        let (mut plugin, _clock, mut server) = setup();
        let reply = run(&mut plugin, &mut server, "CONSOLE", &["tpa", "Bob"]);
        assert_eq!(reply.as_deref(), Some("§cOnly players can use this command."));
        let reply = run(&mut plugin, &mut server, "CONSOLE", &["tpaccept"]);
        assert_eq!(reply.as_deref(), Some("§cOnly players can use this command."));
        assert_eq!(plugin.tpa().pending_count(), 0);
    }

    #[test]
    fn tpadeny_notifies_sender() {
        let (mut plugin, _clock, mut server) = setup();
        run(&mut plugin, &mut server, "Alice", &["tpa", "Bob"]);
        assert_eq!(run(&mut plugin, &mut server, "Bob", &["tpno"]), None);
        assert!(server.teleports.is_empty());
        assert_eq!(
            server.last_message_to("Alice"),
            Some("§eBob§c denied your teleport request.")
        );
    }

    #[test]
    fn quit_cleans_up_requests_and_god_mode() {
        let (mut plugin, _clock, mut server) = setup();
        run(&mut plugin, &mut server, "Alice", &["tpa", "Bob"]);
        run(&mut plugin, &mut server, "Carol", &["tpa", "Alice"]);
        run(&mut plugin, &mut server, "Alice", &["god"]);
        let alice = server.players[0].clone();
        assert!(plugin.god().is_enabled(alice.id));

        plugin.on_event(&PluginEvent::PlayerQuit { player: alice.clone() }, &mut server);
        server.players.retain(|p| p.id != alice.id);

        assert_eq!(plugin.tpa().pending_count(), 0);
        assert!(!plugin.god().is_enabled(alice.id));
        assert!(server.tasks.is_empty());
        assert_eq!(
            server.last_message_to("Bob"),
            Some("§eAlice§c left; their teleport request was cancelled.")
        );
        assert_eq!(
            server.last_message_to("Carol"),
            Some("§eAlice§c left; your teleport request was cancelled.")
        );
    }

    #[test]
    fn god_mode_cancels_damage_and_hunger() {
        let (mut plugin, _clock, mut server) = setup();
        let bob = server.players[1].clone();
        let damage = PluginEvent::PlayerDamage {
            player: bob.clone(),
            damage: 4.0,
            cause: DamageCause::Fall,
        };
        let hunger = PluginEvent::PlayerFoodChange {
            player: bob.clone(),
            food: 19,
        };
        assert_eq!(plugin.on_event(&damage, &mut server), EventResult::Continue);

        let reply = run(&mut plugin, &mut server, "Alice", &["god", "bob"]);
        assert_eq!(reply.as_deref(), Some("§aGod mode enabled for §eBob§a."));
        assert_eq!(plugin.on_event(&damage, &mut server), EventResult::Cancelled);
        assert_eq!(plugin.on_event(&hunger, &mut server), EventResult::Cancelled);

        plugin.load_config(json!({ "god": { "prevent_hunger": false } }));
        assert_eq!(plugin.on_event(&hunger, &mut server), EventResult::Continue);

        let reply = run(&mut plugin, &mut server, "Alice", &["god", "Bob"]);
        assert_eq!(reply.as_deref(), Some("§8[§bUtility§8] §r§cGod mode disabled for §eBob§c."));
        assert_eq!(plugin.on_event(&damage, &mut server), EventResult::Continue);
    }

    #[test]
    fn gamemode_self_and_other() {
        let (mut plugin, _clock, mut server) = setup();
        let reply = run(&mut plugin, &mut server, "Alice", &["gm", "c"]);
        assert_eq!(reply.as_deref(), Some("§aYour game mode is now §ecreative§a."));
        let reply = run(&mut plugin, &mut server, "Alice", &["gamemode", "3", "carol"]);
        assert_eq!(
            reply.as_deref(),
            Some("§aSet §eCarol§a's game mode to §espectator§a.")
        );
        assert_eq!(
            server.gamemodes,
            vec![
                ("Alice".to_string(), GameMode::Creative),
                ("Carol".to_string(), GameMode::Spectator)
            ]
        );

        let reply = run(&mut plugin, &mut server, "Alice", &["gm", "hardcore"]);
        assert!(reply.is_some_and(|r| r.contains("Unknown game mode")));
        let reply = run(&mut plugin, &mut server, "CONSOLE", &["gm", "s"]);
        assert_eq!(
            reply.as_deref(),
            Some("§cSpecify a player when running this from the console.")
        );
        assert_eq!(server.gamemodes.len(), 2);
    }

    #[test]
    fn permission_is_checked_first() {
        let (mut plugin, _clock, mut server) = setup();
        server.denied.insert("utility.god".into());
        let reply = run(&mut plugin, &mut server, "Alice", &["god"]);
        assert_eq!(
            reply.as_deref(),
            Some("§cYou do not have permission to use this command.")
        );
        assert!(plugin.god().is_empty());
        let sender = server.sender("Alice");
        assert!(plugin.tab_complete("god", &args(&[""]), &sender, &server).is_empty());
    }

    #[test]
    fn tab_completion() {
        let (plugin, _clock, server) = setup();
        let alice = server.sender("Alice");
        assert_eq!(
            plugin.tab_complete("gamemode", &args(&["s"]), &alice, &server),
            vec!["survival".to_string(), "spectator".to_string()]
        );
        assert_eq!(
            plugin.tab_complete("gm", &args(&["c", "c"]), &alice, &server),
            vec!["Carol".to_string()]
        );
        // The sender is not offered as a teleport target.
        assert_eq!(
            plugin.tab_complete("tpa", &args(&[""]), &alice, &server),
            vec!["Bob".to_string(), "Carol".to_string()]
        );
        assert!(plugin.tab_complete("tpaccept", &args(&[""]), &alice, &server).is_empty());
        assert!(plugin.tab_complete("unknown", &args(&[""]), &alice, &server).is_empty());
    }

    #[test]
    fn tpa_completion_offers_sender_when_self_requests_allowed() {
        let (mut plugin, _clock, server) = setup();
        plugin.load_config(json!({ "tpa": { "allow_self_request": true } }));
        let alice = server.sender("Alice");
        assert_eq!(
            plugin.tab_complete("tpa", &args(&["a"]), &alice, &server),
            vec!["Alice".to_string()]
        );
        assert_eq!(
            plugin.tab_complete("tpa", &args(&[""]), &alice, &server).len(),
            3
        );
    }

    #[test]
    fn disable_drops_everything() {
        let (mut plugin, _clock, mut server) = setup();
        run(&mut plugin, &mut server, "Alice", &["tpa", "Bob"]);
        run(&mut plugin, &mut server, "Bob", &["god"]);
        plugin.on_disable(&mut server);
        assert_eq!(plugin.tpa().pending_count(), 0);
        assert!(plugin.god().is_empty());
        assert!(server.tasks.is_empty());
        plugin.on_disable(&mut server);
    }

    #[test]
    fn unknown_command_is_ignored() {
        let (mut plugin, _clock, mut server) = setup();
        assert_eq!(run(&mut plugin, &mut server, "Alice", &["fly"]), None);
    }
}
