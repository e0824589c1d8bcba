//! Chat message templates.

use std::collections::{BTreeMap, HashMap};

const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    ("no-permission", "&cYou do not have permission to use this command."),
    ("player-only", "&cOnly players can use this command."),
    ("player-not-found", "&cPlayer &e{player}&c is not online."),
    ("console-player-required", "&cSpecify a player when running this from the console."),
    ("usage", "&cUsage: &e{usage}"),
    ("single-target", "&cThat selector matches more than one player."),
    ("invalid-gamemode", "&cUnknown game mode. Use survival, creative, adventure or spectator."),
    ("gamemode-changed", "&aYour game mode is now &e{gamemode}&a."),
    ("gamemode-changed-other", "&aSet &e{player}&a's game mode to &e{gamemode}&a."),
    ("god-enabled", "&aGod mode enabled for &e{player}&a."),
    ("god-disabled", "&cGod mode disabled for &e{player}&c."),
    ("tpa-self", "&cYou cannot send a teleport request to yourself."),
    ("tpa-cooldown", "&cWait &e{cooldown}&c more seconds before sending another request."),
    ("tpa-sent", "&aTeleport request sent to &e{player}&a."),
    ("tpa-received", "&e{player}&a wants to teleport to you. Type &e/tpaccept&a or &e/tpadeny&a."),
    ("tpa-no-request", "&cYou have no pending teleport requests."),
    ("tpa-sender-gone", "&cThe player who sent that request is no longer online."),
    ("tpa-accepted", "&aAccepted the teleport request from &e{player}&a."),
    ("tpa-accepted-other", "&e{player}&a accepted your teleport request."),
    ("tpa-denied", "&cDenied the teleport request from &e{player}&c."),
    ("tpa-denied-other", "&e{player}&c denied your teleport request."),
    ("tpa-timeout", "&cYour teleport request to &e{player}&c has expired."),
    ("tpa-timeout-other", "&cThe teleport request from &e{player}&c has expired."),
    ("tpa-recipient-left", "&e{player}&c left; your teleport request was cancelled."),
    ("tpa-sender-left", "&e{player}&c left; their teleport request was cancelled."),
];

/// Valid colour and format codes after `&`.
const COLOR_CODES: &str = "0123456789abcdefklmnor";

/// Resolves message keys to coloured, prefixed chat lines.
#[derive(Debug, Clone)]
pub struct MessageService {
    prefix: String,
    templates: HashMap<String, String>,
}

impl MessageService {
    /// Built-in templates with `overrides` applied on top.
    pub fn new(prefix: impl Into<String>, overrides: &BTreeMap<String, String>) -> Self {
        let mut templates: HashMap<String, String> = DEFAULT_MESSAGES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (key, value) in overrides {
            templates.insert(key.clone(), value.clone());
        }
        Self {
            prefix: prefix.into(),
            templates,
        }
    }

    /// The raw template, with placeholders substituted but no prefix or colour.
    pub fn template(&self, key: &str, params: &[(&str, &str)]) -> String {
        let Some(template) = self.templates.get(key) else {
            return format!("Message not found: {key}");
        };
        params
            .iter()
            .fold(template.clone(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }

    /// Prefixed and colour-translated chat line for `key`.
    pub fn format(&self, key: &str, params: &[(&str, &str)]) -> String {
        colorize(&format!("{}{}", self.prefix, self.template(key, params)))
    }
}

/// Translate `&x` colour codes to `§x`. Other `&` characters are left alone.
pub fn colorize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '&' && COLOR_CODES.contains(next.to_ascii_lowercase()) => {
                out.push('§');
                out.push(next.to_ascii_lowercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}
