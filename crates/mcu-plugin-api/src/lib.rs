//! Plugin API: identities, events, and the host capabilities a plugin may use.
//!
//! This crate defines the boundary between a host server and the utility
//! plugin. It has no dependency on any host crate.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Stable identifier of a player. Survives renames and reconnects, unlike the
/// display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random (v4) identity.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build an identity from a small integer. Handy for fixtures.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ─── Types ───────────────────────────────────────────────────────────────────

/// Player game mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    pub const NAMES: [&'static str; 4] = ["survival", "creative", "adventure", "spectator"];

    /// Parse a command argument: full name, short alias, or numeric id.
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg.to_lowercase().as_str() {
            "survival" | "s" | "0" => Some(GameMode::Survival),
            "creative" | "c" | "1" => Some(GameMode::Creative),
            "adventure" | "a" | "2" => Some(GameMode::Adventure),
            "spectator" | "sp" | "3" => Some(GameMode::Spectator),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Survival => "survival",
            GameMode::Creative => "creative",
            GameMode::Adventure => "adventure",
            GameMode::Spectator => "spectator",
        }
    }

    pub fn id(self) -> i32 {
        match self {
            GameMode::Survival => 0,
            GameMode::Creative => 1,
            GameMode::Adventure => 2,
            GameMode::Spectator => 3,
        }
    }
}

/// Information about an online player, passed to plugins in events and reads.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginPlayer {
    pub id: PlayerId,
    pub name: String,
    pub position: (f32, f32, f32),
    pub gamemode: GameMode,
    pub health: f32,
    pub food: i32,
}

/// Who issued a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandSender {
    Console,
    Player(PluginPlayer),
}

impl CommandSender {
    pub fn name(&self) -> &str {
        match self {
            CommandSender::Console => "CONSOLE",
            CommandSender::Player(p) => &p.name,
        }
    }

    pub fn player(&self) -> Option<&PluginPlayer> {
        match self {
            CommandSender::Console => None,
            CommandSender::Player(p) => Some(p),
        }
    }
}

/// Cause of damage for PlayerDamage events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageCause {
    Attack,
    Fall,
    Drowning,
    Lava,
    Fire,
    Starvation,
    Void,
    Other,
}

/// Result of dispatching an event to a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Continue normal handling.
    Continue,
    /// Event was cancelled by this plugin.
    Cancelled,
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// All events that plugins can listen to.
#[derive(Debug, Clone)]
pub enum PluginEvent {
    PlayerJoin {
        player: PluginPlayer,
    },
    PlayerQuit {
        player: PluginPlayer,
    },
    PlayerDamage {
        player: PluginPlayer,
        damage: f32,
        cause: DamageCause,
    },
    PlayerFoodChange {
        player: PluginPlayer,
        food: i32,
    },
    ServerStarted,
    ServerStopping,
}

impl PluginEvent {
    /// Whether this event type can be cancelled by a plugin.
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            PluginEvent::PlayerDamage { .. } | PluginEvent::PlayerFoodChange { .. }
        )
    }
}

// ─── Plugin trait ────────────────────────────────────────────────────────────

/// Metadata about a plugin.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
}

/// The Plugin trait: implemented by plugins loaded into a host.
pub trait Plugin: Send {
    /// Return plugin metadata.
    fn info(&self) -> PluginInfo;

    /// Called when the plugin is loaded. Use `api` to register commands, schedule tasks.
    fn on_enable(&mut self, api: &mut dyn ServerApi);

    /// Called when the plugin is unloaded. Pending tasks should be cancelled here.
    fn on_disable(&mut self, api: &mut dyn ServerApi) {
        let _ = api;
    }

    /// Called for every dispatched event. Return `Cancelled` to cancel cancellable events.
    fn on_event(&mut self, event: &PluginEvent, api: &mut dyn ServerApi) -> EventResult {
        let _ = (event, api);
        EventResult::Continue
    }

    /// Called when a scheduled task fires.
    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        let _ = (task_id, api);
    }

    /// Called when a plugin-registered command is executed. Returns the reply
    /// for the sender, one line per `\n`.
    fn on_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
        api: &mut dyn ServerApi,
    ) -> Option<String> {
        let _ = (command, args, sender, api);
        None
    }

    /// Completion candidates for the argument currently being typed.
    fn tab_complete(
        &self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
        api: &dyn ServerApi,
    ) -> Vec<String> {
        let _ = (command, args, sender, api);
        Vec::new()
    }

    /// Return a default config as JSON. If `Some`, the plugin gets a config file.
    fn default_config(&self) -> Option<serde_json::Value> {
        None
    }

    /// Called with the loaded config (from `plugins/<name>/config.json`).
    fn load_config(&mut self, _config: serde_json::Value) {}
}

// ─── Server API ──────────────────────────────────────────────────────────────

/// Safe read/write access to host state, passed to plugins during callbacks.
///
/// Read methods return data immediately. Write methods are deferred (applied
/// after the plugin callback returns).
pub trait ServerApi {
    // --- Players ---
    fn online_players(&self) -> Vec<PluginPlayer>;
    /// Case-insensitive lookup by display name.
    fn get_player(&self, name: &str) -> Option<PluginPlayer>;
    fn get_player_by_id(&self, id: PlayerId) -> Option<PluginPlayer>;
    fn send_message(&mut self, player_name: &str, message: &str);
    fn teleport_player(&mut self, player_name: &str, x: f32, y: f32, z: f32);
    fn set_gamemode(&mut self, player_name: &str, mode: GameMode);

    // --- Permissions ---
    fn has_permission(&self, sender: &CommandSender, permission: &str) -> bool;

    // --- Scheduler ---
    fn schedule_delayed(&mut self, plugin_name: &str, delay_ticks: u64, task_id: u32);
    fn cancel_task(&mut self, plugin_name: &str, task_id: u32);

    // --- Commands ---
    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str);
}

// ─── Tests ───────────────────────────────────────────────────────────────────
