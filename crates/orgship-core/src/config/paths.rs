//! Config path resolution helpers.

use std::path::{Path, PathBuf};

/// File name looked up in the workspace and the user config directory.
pub const CONFIG_FILE: &str = "orgship.toml";

/// `~/.config/orgship/orgship.toml` (platform equivalent)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("orgship").join(CONFIG_FILE))
}

/// First existing config file among the workspace and the global location.
pub fn discover_config_path(workspace: &Path, global: Option<&Path>) -> Option<PathBuf> {
    let local = workspace.join(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    global.filter(|p| p.is_file()).map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_config_wins() {
        let ws = tempfile::tempdir().unwrap();
        let global_dir = tempfile::tempdir().unwrap();
        let global = global_dir.path().join(CONFIG_FILE);
        std::fs::write(&global, "").unwrap();

        assert_eq!(discover_config_path(ws.path(), Some(&global)), Some(global.clone()));

        std::fs::write(ws.path().join(CONFIG_FILE), "").unwrap();
        assert_eq!(
            discover_config_path(ws.path(), Some(&global)),
            Some(ws.path().join(CONFIG_FILE))
        );
    }

    #[test]
    fn nothing_found() {
        let ws = tempfile::tempdir().unwrap();
        assert_eq!(discover_config_path(ws.path(), None), None);
    }
}
