use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use mcu_plugin_api::PlayerId;

/// Players currently flagged invulnerable.
#[derive(Debug, Default)]
pub struct GodModeRegistry {
    players: Mutex<HashSet<PlayerId>>,
}

impl GodModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PlayerId>> {
        self.players.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if the player was not already enabled.
    pub fn enable(&self, player: PlayerId) -> bool {
        self.lock().insert(player)
    }

    /// Returns `true` if the player was enabled.
    pub fn disable(&self, player: PlayerId) -> bool {
        self.lock().remove(&player)
    }

    /// Flip the flag and return the new state.
    pub fn toggle(&self, player: PlayerId) -> bool {
        let mut players = self.lock();
        if players.remove(&player) {
            false
        } else {
            players.insert(player);
            true
        }
    }

    pub fn is_enabled(&self, player: PlayerId) -> bool {
        self.lock().contains(&player)
    }

    /// Disconnect cleanup.
    pub fn remove(&self, player: PlayerId) -> bool {
        self.disable(player)
    }

    pub fn clear_all(&self) -> usize {
        let mut players = self.lock();
        let count = players.len();
        players.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
