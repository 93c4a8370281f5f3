//! Configuration loading
//!
//! Lookup order:
//! - an explicit `--config` path (must exist)
//! - `<workspace>/orgship.toml`
//! - the user config directory (`orgship/orgship.toml`)
//!
//! With no file at all every default applies and credentials must come from
//! the environment.

pub mod parser;
pub mod paths;
pub mod schema;

use std::path::Path;

use anyhow::Context;
use tracing::debug;

pub use parser::{parse_orgship_toml, parse_orgship_toml_str, to_toml};
pub use paths::{CONFIG_FILE, discover_config_path, global_config_path};
pub use schema::{
    DeployConfig, OrgConfig, OrgshipConfig, SettingsBackend, SettingsConfig, TestsConfig,
};

/// Load the configuration for a workspace.
pub fn load_config(explicit: Option<&Path>, workspace: &Path) -> anyhow::Result<OrgshipConfig> {
    if let Some(path) = explicit {
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        debug!("Using config {}", path.display());
        return parse_orgship_toml(path);
    }

    let global = global_config_path();
    match discover_config_path(workspace, global.as_deref()) {
        Some(path) => {
            debug!("Using config {}", path.display());
            parse_orgship_toml(&path)
        }
        None => {
            debug!("No orgship.toml found, using defaults");
            let config = OrgshipConfig::new();
            config.validate().context("Default configuration is invalid")?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_must_exist() {
        let ws = tempfile::tempdir().unwrap();
        let err = load_config(Some(&ws.path().join("nope.toml")), ws.path()).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn loads_workspace_file() {
        let ws = tempfile::tempdir().unwrap();
        std::fs::write(
            ws.path().join(CONFIG_FILE),
            "[deploy]\nsource_root = \"force-app/\"\n",
        )
        .unwrap();
        let config = load_config(None, ws.path()).unwrap();
        assert_eq!(config.deploy.source_root, "force-app/");
    }
}
