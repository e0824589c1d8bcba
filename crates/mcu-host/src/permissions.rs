//! Who may run what: operators from `ops.json` plus a default grant list.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use mcu_plugin_api::CommandSender;
use tracing::{info, warn};

pub struct PermissionManager {
    /// Lower-cased display names of operators.
    ops: HashSet<String>,
    /// Permissions granted to every player.
    defaults: HashSet<String>,
}

impl PermissionManager {
    pub fn new(
        ops: impl IntoIterator<Item = String>,
        defaults: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            ops: ops.into_iter().map(|name| name.to_lowercase()).collect(),
            defaults: defaults.into_iter().collect(),
        }
    }

    /// Load operators from a JSON array of names. A missing file means no operators.
    pub fn load(ops_path: impl AsRef<Path>, defaults: impl IntoIterator<Item = String>) -> Self {
        Self::new(load_set(ops_path.as_ref()), defaults)
    }

    pub fn is_op(&self, name: &str) -> bool {
        self.ops.contains(&name.to_lowercase())
    }

    /// The console and operators have every permission.
    pub fn has_permission(&self, sender: &CommandSender, permission: &str) -> bool {
        match sender {
            CommandSender::Console => true,
            CommandSender::Player(player) => {
                self.is_op(&player.name)
                    || self.defaults.contains(permission)
                    || self.defaults.contains("*")
            }
        }
    }
}

fn load_set(path: &Path) -> HashSet<String> {
    if !path.exists() {
        return HashSet::new();
    }
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Vec<String>>(&contents) {
            Ok(vec) => {
                info!("Loaded {} entries from {}", vec.len(), path.display());
                vec.into_iter().collect()
            }
            Err(e) => {
                warn!("Failed to parse {}: {e}", path.display());
                HashSet::new()
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            HashSet::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcu_plugin_api::{GameMode, PlayerId, PluginPlayer};

    fn player(name: &str) -> CommandSender {
        CommandSender::Player(PluginPlayer {
            id: PlayerId::random(),
            name: name.into(),
            position: (0.0, 64.0, 0.0),
            gamemode: GameMode::Survival,
            health: 20.0,
            food: 20,
        })
    }

    #[test]
    fn console_has_everything() {
        let perms = PermissionManager::new(Vec::<String>::new(), Vec::<String>::new());
        assert!(perms.has_permission(&CommandSender::Console, "utility.god"));
    }

    #[test]
    fn ops_ignore_case() {
        let perms = PermissionManager::new(vec!["Alice".to_string()], Vec::<String>::new());
        assert!(perms.is_op("alice"));
        assert!(perms.has_permission(&player("ALICE"), "utility.god"));
        assert!(!perms.has_permission(&player("Bob"), "utility.god"));
    }

    #[test]
    fn defaults_apply_to_everyone() {
        let perms = PermissionManager::new(Vec::<String>::new(), vec!["utility.tpa".to_string()]);
        assert!(perms.has_permission(&player("Bob"), "utility.tpa"));
        assert!(!perms.has_permission(&player("Bob"), "utility.gamemode"));

        let open = PermissionManager::new(Vec::<String>::new(), vec!["*".to_string()]);
        assert!(open.has_permission(&player("Bob"), "utility.gamemode"));
    }

    #[test]
    fn load_reads_json_array() {
        let dir = std::env::temp_dir().join(format!("mcu-perms-{}", PlayerId::random()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ops.json");
        fs::write(&path, r#"["Alice", "Carol"]"#).unwrap();
        let perms = PermissionManager::load(&path, Vec::<String>::new());
        assert!(perms.is_op("carol"));
        assert!(!perms.is_op("bob"));

        fs::write(&path, "not json").unwrap();
        let perms = PermissionManager::load(&path, Vec::<String>::new());
        assert!(!perms.is_op("alice"));

        let missing = PermissionManager::load(dir.join("nope.json"), Vec::<String>::new());
        assert!(!missing.is_op("alice"));
        fs::remove_dir_all(&dir).ok();
    }
}
