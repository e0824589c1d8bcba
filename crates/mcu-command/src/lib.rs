//! Command descriptions, registry, and target resolution.
//!
//! Every command is a [`CommandSpec`] record; a single handler in the plugin
//! interprets the record's `action`. Nothing here knows about players beyond
//! their names and positions.

pub mod selector;

use std::collections::HashMap;

pub use selector::{PlayerInfo, Selector};

/// Result returned by a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command executed successfully.
    pub success: bool,
    /// Messages to send back to the command sender.
    pub messages: Vec<String>,
}

impl CommandResult {
    /// Create a successful result with a single message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
        }
    }

    /// Create a failed result with a single message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
        }
    }

    /// A successful result with nothing to say (the action replied on its own).
    pub fn silent() -> Self {
        Self {
            success: true,
            messages: Vec::new(),
        }
    }

    /// Join messages into a single reply, or `None` if there is nothing to send.
    pub fn reply(&self) -> Option<String> {
        if self.messages.is_empty() {
            None
        } else {
            Some(self.messages.join("\n"))
        }
    }
}

/// Where a command finds the player it acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPolicy {
    /// Acts on the sender; the console is refused.
    SenderOnly,
    /// Argument `n` names the target and must be present.
    Required(usize),
    /// Argument `n` names the target; without it the sender is the target.
    OptionalOrSender(usize),
}

/// The message keys a command replies with. `success` is the normal reply;
/// `alternate` is the reply when acting on someone else, or the "off" state
/// of a toggle. Empty keys mean the action replies on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageKeys {
    pub success: &'static str,
    pub alternate: &'static str,
}

impl MessageKeys {
    pub const NONE: MessageKeys = MessageKeys {
        success: "",
        alternate: "",
    };

    pub const fn new(success: &'static str, alternate: &'static str) -> Self {
        Self { success, alternate }
    }
}

/// Static description of one command.
#[derive(Debug, Clone)]
pub struct CommandSpec<A> {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub usage: &'static str,
    pub permission: &'static str,
    pub target: TargetPolicy,
    pub messages: MessageKeys,
    pub action: A,
}

/// Why a target could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The console ran a command that only makes sense for a player.
    PlayerOnly,
    /// The console omitted a target the command defaults to the sender for.
    ConsoleNeedsTarget,
    /// A required argument is missing.
    MissingArgument,
    /// No online player matches.
    NotFound(String),
    /// A selector matched more than one player.
    NotSingle,
}

/// Resolve the single player name a command acts on.
///
/// `sender` is the sender's name and position, or `None` for the console.
pub fn resolve_policy(
    policy: TargetPolicy,
    args: &[String],
    sender: Option<(&str, (f32, f32, f32))>,
    players: &[PlayerInfo],
) -> Result<String, TargetError> {
    let (index, required) = match policy {
        TargetPolicy::SenderOnly => {
            return sender
                .map(|(name, _)| name.to_string())
                .ok_or(TargetError::PlayerOnly);
        }
        TargetPolicy::Required(i) => (i, true),
        TargetPolicy::OptionalOrSender(i) => (i, false),
    };

    match args.get(index) {
        Some(arg) => {
            let picked = match Selector::parse(arg) {
                Some(Selector::Many) => return Err(TargetError::NotSingle),
                Some(sel) => selector::pick(sel, sender, players),
                None => selector::find(arg, players),
            };
            picked
                .map(|p| p.name.clone())
                .ok_or_else(|| TargetError::NotFound(arg.clone()))
        }
        None if required => Err(TargetError::MissingArgument),
        None => sender
            .map(|(name, _)| name.to_string())
            .ok_or(TargetError::ConsoleNeedsTarget),
    }
}

/// Registry of commands, addressable by name or alias.
pub struct CommandRegistry<A> {
    commands: HashMap<&'static str, CommandSpec<A>>,
    aliases: HashMap<&'static str, &'static str>,
}

impl<A> CommandRegistry<A> {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Register a command and its aliases. A later command with the same name wins.
    pub fn register(&mut self, spec: CommandSpec<A>) {
        for &alias in spec.aliases {
            self.aliases.insert(alias, spec.name);
        }
        self.commands.insert(spec.name, spec);
    }

    /// Look up by name or alias, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&CommandSpec<A>> {
        let name = name.to_lowercase();
        let canonical = self
            .aliases
            .get(name.as_str())
            .copied()
            .unwrap_or(name.as_str());
        self.commands.get(canonical)
    }

    /// All commands sorted by name.
    pub fn specs(&self) -> Vec<&CommandSpec<A>> {
        let mut specs: Vec<&CommandSpec<A>> = self.commands.values().collect();
        specs.sort_by_key(|s| s.name);
        specs
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<A> Default for CommandRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Options starting with `partial`, case-insensitively.
pub fn complete_from<'a>(partial: &str, options: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let partial = partial.to_lowercase();
    options
        .into_iter()
        .filter(|o| o.to_lowercase().starts_with(&partial))
        .map(String::from)
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================
