//! Plugin manager: loads, enables, and dispatches events to plugins.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use mcu_plugin_api::{
    CommandSender, EventResult, GameMode, PlayerId, Plugin, PluginEvent, PluginPlayer,
    ServerApi,
};
use tracing::{debug, info, warn};

use crate::permissions::PermissionManager;

// ─── Types ───────────────────────────────────────────────────────────────────

/// A one-shot task owned by a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub plugin_name: String,
    pub task_id: u32,
    pub remaining_ticks: u64,
}

/// Server state snapshot for plugin API reads (built before dispatch).
pub struct ServerSnapshot<'a> {
    pub players: Vec<PluginPlayer>,
    pub permissions: &'a PermissionManager,
}

/// Deferred side-effect requested by a plugin during a callback.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    SendMessage {
        player_name: String,
        message: String,
    },
    TeleportPlayer {
        player_name: String,
        x: f32,
        y: f32,
        z: f32,
    },
    SetGamemode {
        player_name: String,
        mode: GameMode,
    },
    RegisterCommand {
        name: String,
        description: String,
        plugin_name: String,
    },
    ScheduleTask {
        task: ScheduledTask,
    },
    CancelTask {
        plugin_name: String,
        task_id: u32,
    },
}

// ─── ServerApiImpl ───────────────────────────────────────────────────────────

/// Implements `ServerApi` using a snapshot for reads and accumulating PendingActions for writes.
struct ServerApiImpl<'s, 'p> {
    snapshot: &'s ServerSnapshot<'p>,
    actions: Vec<PendingAction>,
}

impl<'s, 'p> ServerApiImpl<'s, 'p> {
    fn new(snapshot: &'s ServerSnapshot<'p>) -> Self {
        Self {
            snapshot,
            actions: Vec::new(),
        }
    }

    fn queue(&mut self, action: PendingAction) {
        self.actions.push(action);
    }

    fn find(&self, pred: impl Fn(&PluginPlayer) -> bool) -> Option<PluginPlayer> {
        self.snapshot.players.iter().find(|p| pred(p)).cloned()
    }
}

impl ServerApi for ServerApiImpl<'_, '_> {
    fn online_players(&self) -> Vec<PluginPlayer> {
        self.snapshot.players.clone()
    }

    fn get_player(&self, name: &str) -> Option<PluginPlayer> {
        self.find(|p| p.name.eq_ignore_ascii_case(name))
    }

    fn get_player_by_id(&self, id: PlayerId) -> Option<PluginPlayer> {
        self.find(|p| p.id == id)
    }

    fn send_message(&mut self, player_name: &str, message: &str) {
        self.queue(PendingAction::SendMessage {
            player_name: player_name.into(),
            message: message.into(),
        });
    }

    fn teleport_player(&mut self, player_name: &str, x: f32, y: f32, z: f32) {
        let player_name = player_name.into();
        self.queue(PendingAction::TeleportPlayer { player_name, x, y, z });
    }

    fn set_gamemode(&mut self, player_name: &str, mode: GameMode) {
        let player_name = player_name.into();
        self.queue(PendingAction::SetGamemode { player_name, mode });
    }

    fn has_permission(&self, sender: &CommandSender, permission: &str) -> bool {
        self.snapshot.permissions.has_permission(sender, permission)
    }

    fn schedule_delayed(&mut self, plugin_name: &str, delay_ticks: u64, task_id: u32) {
        let task = ScheduledTask {
            plugin_name: plugin_name.into(),
            task_id,
            remaining_ticks: delay_ticks,
        };
        self.queue(PendingAction::ScheduleTask { task });
    }

    fn cancel_task(&mut self, plugin_name: &str, task_id: u32) {
        let plugin_name = plugin_name.into();
        self.queue(PendingAction::CancelTask { plugin_name, task_id });
    }

    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str) {
        self.queue(PendingAction::RegisterCommand {
            name: name.into(),
            description: description.into(),
            plugin_name: plugin_name.into(),
        });
    }
}

// ─── PluginManager ───────────────────────────────────────────────────────────

/// Manages all loaded plugins, their scheduled tasks, and command registrations.
///
/// Scheduler and command actions are applied here, in the order the plugin
/// issued them; everything else is handed back to the caller.
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
    tasks: Vec<ScheduledTask>,
    /// Commands registered by plugins: command_name → (plugin_name, description).
    plugin_commands: HashMap<String, (String, String)>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            tasks: Vec::new(),
            plugin_commands: HashMap::new(),
        }
    }

    /// Register a plugin (call before enable_all).
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        info!("Registered plugin: {}", plugin.info().name);
        self.plugins.push(plugin);
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn pending_tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    /// Registered command names with their descriptions, sorted.
    pub fn commands(&self) -> Vec<(&str, &str)> {
        let mut list: Vec<(&str, &str)> = self
            .plugin_commands
            .iter()
            .map(|(name, (_, description))| (name.as_str(), description.as_str()))
            .collect();
        list.sort_unstable();
        list
    }

    /// Run `f` against the plugin named `name` with a fresh API.
    fn with_plugin<R>(
        &mut self,
        name: &str,
        snapshot: &ServerSnapshot<'_>,
        f: impl FnOnce(&mut dyn Plugin, &mut dyn ServerApi) -> R,
    ) -> Option<(R, Vec<PendingAction>)> {
        let plugin = self.plugins.iter_mut().find(|p| p.info().name == name)?;
        let mut api = ServerApiImpl::new(snapshot);
        let result = f(plugin.as_mut(), &mut api);
        let actions = self.apply_internal_actions(api.actions);
        Some((result, actions))
    }

    /// Call `f` on every plugin in registration order, collecting writes.
    fn each_plugin(
        &mut self,
        snapshot: &ServerSnapshot<'_>,
        mut f: impl FnMut(&mut dyn Plugin, &mut dyn ServerApi),
    ) -> Vec<PendingAction> {
        let mut queued = Vec::new();
        for plugin in &mut self.plugins {
            let mut api = ServerApiImpl::new(snapshot);
            f(plugin.as_mut(), &mut api);
            queued.append(&mut api.actions);
        }
        self.apply_internal_actions(queued)
    }

    pub fn enable_all(&mut self, snapshot: &ServerSnapshot<'_>) -> Vec<PendingAction> {
        self.each_plugin(snapshot, |plugin, api| {
            plugin.on_enable(api);
            info!("Enabled plugin: {}", plugin.info().name);
        })
    }

    /// Pending tasks are dropped after every plugin has been disabled.
    pub fn disable_all(&mut self, snapshot: &ServerSnapshot<'_>) -> Vec<PendingAction> {
        let actions = self.each_plugin(snapshot, |plugin, api| {
            plugin.on_disable(api);
            info!("Disabled plugin: {}", plugin.info().name);
        });
        self.tasks.clear();
        actions
    }

    /// Dispatch an event to all plugins. Returns the combined result and pending actions.
    pub fn dispatch(
        &mut self,
        event: &PluginEvent,
        snapshot: &ServerSnapshot<'_>,
    ) -> (EventResult, Vec<PendingAction>) {
        let cancellable = event.is_cancellable();
        let mut all_actions = Vec::new();
        let mut final_result = EventResult::Continue;

        for plugin in &mut self.plugins {
            let mut api = ServerApiImpl::new(snapshot);
            let result = plugin.on_event(event, &mut api);
            all_actions.append(&mut api.actions);

            if cancellable && result == EventResult::Cancelled {
                final_result = EventResult::Cancelled;
                break; // Stop propagation
            }
        }

        (final_result, self.apply_internal_actions(all_actions))
    }

    /// Advance the scheduler one tick. Returns pending actions from fired tasks.
    pub fn tick_scheduler(&mut self, snapshot: &ServerSnapshot<'_>) -> Vec<PendingAction> {
        let mut fired: Vec<(String, u32)> = Vec::new();
        for task in &mut self.tasks {
            task.remaining_ticks = task.remaining_ticks.saturating_sub(1);
            if task.remaining_ticks == 0 {
                fired.push((task.plugin_name.clone(), task.task_id));
            }
        }
        self.tasks.retain(|t| t.remaining_ticks > 0);

        let mut all_actions = Vec::new();
        for (plugin_name, task_id) in fired {
            if let Some(((), actions)) = self.with_plugin(&plugin_name, snapshot, |plugin, api| {
                plugin.on_task(task_id, api)
            }) {
                all_actions.extend(actions);
            }
        }
        all_actions
    }

    /// Handle a plugin-registered command. Returns (response_message, pending_actions).
    pub fn handle_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
        snapshot: &ServerSnapshot<'_>,
    ) -> (Option<String>, Vec<PendingAction>) {
        let plugin_name = match self.plugin_commands.get(&command.to_lowercase()) {
            Some((name, _)) => name.clone(),
            None => return (None, Vec::new()),
        };
        self.with_plugin(&plugin_name, snapshot, |plugin, api| {
            plugin.on_command(command, args, sender, api)
        })
        .unwrap_or((None, Vec::new()))
    }

    /// Is `command` owned by some plugin?
    pub fn has_command(&self, command: &str) -> bool {
        self.plugin_commands.contains_key(&command.to_lowercase())
    }

    /// Tab completion for a plugin-registered command.
    pub fn tab_complete(
        &self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
        snapshot: &ServerSnapshot<'_>,
    ) -> Vec<String> {
        let Some((plugin_name, _)) = self.plugin_commands.get(&command.to_lowercase()) else {
            return Vec::new();
        };
        let api = ServerApiImpl::new(snapshot);
        self.plugins
            .iter()
            .find(|p| &p.info().name == plugin_name)
            .map(|p| p.tab_complete(command, args, sender, &api))
            .unwrap_or_default()
    }

    /// Load configs for all plugins from `dir/<plugin>/config.json`, writing
    /// the default config where none exists.
    pub fn load_configs(&mut self, dir: &Path) {
        for plugin in &mut self.plugins {
            let info = plugin.info();
            let Some(default_config) = plugin.default_config() else {
                continue;
            };
            let plugin_dir = dir.join(&info.name);
            let config_path = plugin_dir.join("config.json");

            let config = if config_path.exists() {
                match fs::read_to_string(&config_path) {
                    Ok(data) => match serde_json::from_str(&data) {
                        Ok(v) => v,
                        Err(e) => {
                            warn!("Failed to parse config for {}: {e}", info.name);
                            default_config
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config for {}: {e}", info.name);
                        default_config
                    }
                }
            } else {
                if let Err(e) = fs::create_dir_all(&plugin_dir) {
                    warn!("Failed to create {}: {e}", plugin_dir.display());
                }
                match serde_json::to_string_pretty(&default_config) {
                    Ok(json) => {
                        if let Err(e) = fs::write(&config_path, json) {
                            warn!("Failed to write {}: {e}", config_path.display());
                        }
                    }
                    Err(e) => warn!("Failed to serialize config for {}: {e}", info.name),
                }
                default_config
            };

            plugin.load_config(config);
        }
    }

    /// Apply RegisterCommand, ScheduleTask and CancelTask in order; return the rest.
    fn apply_internal_actions(&mut self, actions: Vec<PendingAction>) -> Vec<PendingAction> {
        let mut external = Vec::new();
        for action in actions {
            match action {
                PendingAction::RegisterCommand {
                    name,
                    description,
                    plugin_name,
                } => {
                    debug!("Command /{name} registered by {plugin_name}");
                    self.plugin_commands
                        .insert(name.to_lowercase(), (plugin_name, description));
                }
                PendingAction::ScheduleTask { task } => {
                    self.tasks.push(task);
                }
                PendingAction::CancelTask {
                    plugin_name,
                    task_id,
                } => {
                    self.tasks
                        .retain(|t| !(t.plugin_name == plugin_name && t.task_id == task_id));
                }
                other => external.push(other),
            }
        }
        external
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
