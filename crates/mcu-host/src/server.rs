//! In-memory server: online players, the tick counter, and the plugins.

use std::path::Path;

use mcu_plugin_api::{
    CommandSender, DamageCause, EventResult, GameMode, PlayerId, Plugin, PluginEvent, PluginPlayer,
};
use tracing::{debug, info};

use crate::console::{self, ConsoleCommand};
use crate::permissions::PermissionManager;
use crate::plugin_manager::{PendingAction, PluginManager, ServerSnapshot};

const SPAWN: (f32, f32, f32) = (0.5, 64.0, 0.5);
const MAX_HEALTH: f32 = 20.0;
const MAX_FOOD: i32 = 20;

/// What the main loop should do after a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleOutcome {
    Continue,
    Stop,
}

pub struct Server {
    players: Vec<PluginPlayer>,
    tick: u64,
    permissions: PermissionManager,
    plugins: PluginManager,
    /// Chat delivered to players since the last `take_delivered`.
    delivered: Vec<(String, String)>,
}

/// Borrows only the permission list, so plugins can be driven mutably alongside it.
fn snapshot<'a>(players: &[PluginPlayer], permissions: &'a PermissionManager) -> ServerSnapshot<'a> {
    ServerSnapshot {
        players: players.to_vec(),
        permissions,
    }
}

impl Server {
    pub fn new(permissions: PermissionManager) -> Self {
        Self {
            players: Vec::new(),
            tick: 0,
            permissions,
            plugins: PluginManager::new(),
            delivered: Vec::new(),
        }
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.register(plugin);
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    #[cfg(test)]
    pub fn players(&self) -> &[PluginPlayer] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Option<&PluginPlayer> {
        self.players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    #[cfg(test)]
    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    /// Chat lines delivered to players, oldest first.
    pub fn take_delivered(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.delivered)
    }

    /// Load plugin configs from `dir` and enable every plugin.
    pub fn start(&mut self, plugin_dir: &Path) {
        self.plugins.load_configs(plugin_dir);
        info!("Loaded {} plugin(s)", self.plugins.plugin_count());
        let snap = snapshot(&self.players, &self.permissions);
        let actions = self.plugins.enable_all(&snap);
        self.apply_actions(actions);
        self.dispatch(&PluginEvent::ServerStarted);
    }

    /// Disable plugins. Pending teleport requests and god mode are dropped.
    pub fn shutdown(&mut self) {
        self.dispatch(&PluginEvent::ServerStopping);
        let pending = self.plugins.pending_tasks().len();
        let snap = snapshot(&self.players, &self.permissions);
        let actions = self.plugins.disable_all(&snap);
        self.apply_actions(actions);
        info!("Plugins disabled ({pending} scheduled task(s) dropped)");
    }

    /// Advance one tick and run due plugin tasks.
    pub fn game_tick(&mut self) {
        self.tick += 1;
        let snap = snapshot(&self.players, &self.permissions);
        let actions = self.plugins.tick_scheduler(&snap);
        self.apply_actions(actions);
    }

    fn dispatch(&mut self, event: &PluginEvent) -> EventResult {
        let snap = snapshot(&self.players, &self.permissions);
        let (result, actions) = self.plugins.dispatch(event, &snap);
        self.apply_actions(actions);
        result
    }

    fn apply_actions(&mut self, actions: Vec<PendingAction>) {
        for action in actions {
            match action {
                PendingAction::SendMessage {
                    player_name,
                    message,
                } => {
                    if let Some(name) = self.player(&player_name).map(|p| p.name.clone()) {
                        self.delivered.push((name, message));
                    }
                }
                PendingAction::TeleportPlayer {
                    player_name,
                    x,
                    y,
                    z,
                } => {
                    if let Some(p) = self.player_mut(&player_name) {
                        p.position = (x, y, z);
                        debug!("Teleported {} to ({x:.1}, {y:.1}, {z:.1})", p.name);
                    }
                }
                PendingAction::SetGamemode { player_name, mode } => {
                    if let Some(p) = self.player_mut(&player_name) {
                        p.gamemode = mode;
                        debug!("{} is now in {}", p.name, mode.as_str());
                    }
                }
                // Scheduler and command actions never leave the plugin manager.
                PendingAction::RegisterCommand { .. }
                | PendingAction::ScheduleTask { .. }
                | PendingAction::CancelTask { .. } => {}
            }
        }
    }

    fn player_mut(&mut self, name: &str) -> Option<&mut PluginPlayer> {
        self.players
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    // --- Player lifecycle ---

    pub fn join(&mut self, name: &str, position: Option<(f32, f32, f32)>) -> Result<PlayerId, String> {
        if self.player(name).is_some() {
            return Err(format!("{name} is already online"));
        }
        let player = PluginPlayer {
            id: PlayerId::random(),
            name: name.to_string(),
            position: position.unwrap_or(SPAWN),
            gamemode: GameMode::default(),
            health: MAX_HEALTH,
            food: MAX_FOOD,
        };
        let id = player.id;
        info!("{name} joined ({id})");
        self.players.push(player.clone());
        self.dispatch(&PluginEvent::PlayerJoin { player });
        Ok(id)
    }

    /// Plugins see the quit while the player is still in the snapshot.
    pub fn quit(&mut self, name: &str) -> Result<(), String> {
        let player = self
            .player(name)
            .cloned()
            .ok_or_else(|| format!("{name} is not online"))?;
        self.dispatch(&PluginEvent::PlayerQuit {
            player: player.clone(),
        });
        self.players.retain(|p| p.id != player.id);
        info!("{} left", player.name);
        Ok(())
    }

    /// Returns the player's health afterwards.
    pub fn damage(&mut self, name: &str, amount: f32) -> Result<f32, String> {
        let player = self
            .player(name)
            .cloned()
            .ok_or_else(|| format!("{name} is not online"))?;
        let event = PluginEvent::PlayerDamage {
            player: player.clone(),
            damage: amount,
            cause: DamageCause::Other,
        };
        if self.dispatch(&event) == EventResult::Cancelled {
            return Ok(player.health);
        }
        let p = self
            .player_mut(name)
            .ok_or_else(|| format!("{name} is not online"))?;
        p.health = (p.health - amount).max(0.0);
        Ok(p.health)
    }

    /// Drain one food point. Returns the food level afterwards.
    pub fn hunger(&mut self, name: &str) -> Result<i32, String> {
        let player = self
            .player(name)
            .cloned()
            .ok_or_else(|| format!("{name} is not online"))?;
        let food = (player.food - 1).max(0);
        let event = PluginEvent::PlayerFoodChange {
            player: player.clone(),
            food,
        };
        if self.dispatch(&event) == EventResult::Cancelled {
            return Ok(player.food);
        }
        let p = self
            .player_mut(name)
            .ok_or_else(|| format!("{name} is not online"))?;
        p.food = food;
        Ok(food)
    }

    // --- Commands ---

    /// Run a command line for `sender`. Returns the reply lines.
    pub fn run_command(&mut self, sender: &CommandSender, line: &str) -> Vec<String> {
        let (label, args) = console::split_command(line);
        if !self.plugins.has_command(&label) {
            return vec![format!("Unknown command: {label}")];
        }
        let snap = snapshot(&self.players, &self.permissions);
        let (response, actions) = self
            .plugins
            .handle_command(&label, &args, sender, &snap);
        self.apply_actions(actions);
        response
            .map(|r| r.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    pub fn complete(&self, sender: &CommandSender, line: &str) -> Vec<String> {
        let (label, args) = console::split_command(line);
        let snap = snapshot(&self.players, &self.permissions);
        self.plugins.tab_complete(&label, &args, sender, &snap)
    }

    fn sender_for(&self, name: &str) -> Result<CommandSender, String> {
        self.player(name)
            .cloned()
            .map(CommandSender::Player)
            .ok_or_else(|| format!("{name} is not online"))
    }

    /// Execute one console line. Returns what to print and whether to stop.
    pub fn handle_console_line(&mut self, line: &str) -> (Vec<String>, ConsoleOutcome) {
        let command = match console::parse(line) {
            Ok(c) => c,
            Err(usage) => return (vec![usage], ConsoleOutcome::Continue),
        };

        let output = match command {
            ConsoleCommand::Stop => return (Vec::new(), ConsoleOutcome::Stop),
            ConsoleCommand::Join { name, position } => match self.join(&name, position) {
                Ok(_) => vec![format!("{name} joined")],
                Err(e) => vec![e],
            },
            ConsoleCommand::Quit { name } => match self.quit(&name) {
                Ok(()) => vec![format!("{name} left")],
                Err(e) => vec![e],
            },
            ConsoleCommand::As { name, line } => match self.sender_for(&name) {
                Ok(sender) => self.run_command(&sender, &line),
                Err(e) => vec![e],
            },
            ConsoleCommand::Tab { name, line } => match self.sender_for(&name) {
                Ok(sender) => vec![self.complete(&sender, &line).join(", ")],
                Err(e) => vec![e],
            },
            ConsoleCommand::Damage { name, amount } => match self.damage(&name, amount) {
                Ok(health) => vec![format!("{name} health: {health:.1}")],
                Err(e) => vec![e],
            },
            ConsoleCommand::Hunger { name } => match self.hunger(&name) {
                Ok(food) => vec![format!("{name} food: {food}")],
                Err(e) => vec![e],
            },
            ConsoleCommand::List => {
                let mut lines = vec![format!("{} player(s) online", self.players.len())];
                lines.extend(self.players.iter().map(|p| {
                    let (x, y, z) = p.position;
                    format!(
                        "  {} [{}] at ({x:.1}, {y:.1}, {z:.1}) health {:.1} food {}",
                        p.name,
                        p.gamemode.as_str(),
                        p.health,
                        p.food
                    )
                }));
                lines
            }
            ConsoleCommand::Help => {
                let mut lines: Vec<String> = console::HELP.iter().map(|s| s.to_string()).collect();
                lines.extend(
                    self.plugins
                        .commands()
                        .into_iter()
                        .map(|(name, description)| format!("/{name:<20} {description}")),
                );
                lines
            }
            ConsoleCommand::Run(line) => self.run_command(&CommandSender::Console, &line),
        };
        (output, ConsoleOutcome::Continue)
    }
}
