//! Config file discovery and loading for `.tracegen.toml`.
//!
//! An explicit `--config` path must load. Otherwise two locations are checked in
//! precedence order:
//! 1. `./.tracegen.toml` (project-local)
//! 2. `~/.config/tracegen.toml` (user-global)

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::CliConfig;

const CONFIG_FILENAME: &str = ".tracegen.toml";
const GLOBAL_CONFIG_DIR: &str = ".config";
const GLOBAL_CONFIG_FILENAME: &str = "tracegen.toml";

/// Load the CLI config from `explicit`, or from the first discovered location,
/// or return defaults.
pub(crate) fn load_cli_config(explicit: Option<&Path>) -> anyhow::Result<CliConfig> {
    if let Some(path) = explicit {
        let config = parse_file(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?;
        tracing::debug!(?path, "Loaded CLI config");
        return Ok(config);
    }

    if let Some(path) = find_config_file() {
        match parse_file(&path) {
            Ok(config) => {
                tracing::debug!(?path, "Loaded CLI config");
                return Ok(config);
            }
            Err(e) => {
                tracing::warn!(?path, error = %e, "Failed to load CLI config, using defaults");
            }
        }
    }
    Ok(CliConfig::default())
}

fn parse_file(path: &Path) -> anyhow::Result<CliConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: CliConfig = toml::from_str(&contents)?;
    config.engine.validate()?;
    Ok(config)
}

/// Search for config file in precedence order.
fn find_config_file() -> Option<PathBuf> {
    find_config_file_in(Path::new("."), home_dir().as_deref())
}

fn find_config_file_in(cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
    let local = cwd.join(CONFIG_FILENAME);
    if local.is_file() {
        return Some(local);
    }
    let global = home?.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILENAME);
    global.is_file().then_some(global)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
