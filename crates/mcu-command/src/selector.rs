//! Target selectors for single-player commands.
//!
//! `@s`, `@p` and `@r` pick one player. `@a` and `@e` can pick many and are
//! only recognised so callers can refuse them.

use std::cmp::Ordering;

use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// `@s`
    Sender,
    /// `@p`, never the sender itself.
    Nearest,
    /// `@r`
    Random,
    /// `@a` or `@e`
    Many,
}

impl Selector {
    pub fn parse(arg: &str) -> Option<Self> {
        Some(match arg {
            "@s" => Selector::Sender,
            "@p" => Selector::Nearest,
            "@r" => Selector::Random,
            "@a" | "@e" => Selector::Many,
            _ => return None,
        })
    }
}

/// What a selector needs to know about an online player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub name: String,
    pub position: (f32, f32, f32),
}

impl PlayerInfo {
    fn distance_sq(&self, to: (f32, f32, f32)) -> f32 {
        let (x, y, z) = self.position;
        (x - to.0).powi(2) + (y - to.1).powi(2) + (z - to.2).powi(2)
    }
}

/// Pick the single player a selector refers to. `origin` is the sender's name
/// and position; the console has none, so `@s` and `@p` find nobody for it.
pub fn pick<'a>(
    selector: Selector,
    origin: Option<(&str, (f32, f32, f32))>,
    players: &'a [PlayerInfo],
) -> Option<&'a PlayerInfo> {
    match selector {
        Selector::Sender => {
            let (name, _) = origin?;
            find(name, players)
        }
        Selector::Nearest => {
            let (name, position) = origin?;
            players
                .iter()
                .filter(|p| !p.name.eq_ignore_ascii_case(name))
                .min_by(|a, b| {
                    a.distance_sq(position)
                        .partial_cmp(&b.distance_sq(position))
                        .unwrap_or(Ordering::Equal)
                })
        }
        Selector::Random => players.choose(&mut rand::thread_rng()),
        Selector::Many => None,
    }
}

/// Case-insensitive lookup by display name.
pub fn find<'a>(name: &str, players: &'a [PlayerInfo]) -> Option<&'a PlayerInfo> {
    players.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
