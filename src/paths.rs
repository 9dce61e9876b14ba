//! Config and data file resolution.
//!
//! The gateway keeps its footprint small: one optional `chyron.json` and an
//! optional log file. Both resolve through the same priority chain:
//!
//! 1. `--config-dir` CLI argument
//! 2. `CHYRON_CONFIG_DIR` environment variable
//! 3. the current directory, if a chyron file already lives there
//!    (portable/side-by-side deployments)
//! 4. the platform directory from `dirs-next`
//!    (`~/.config/chyron`, `%APPDATA%\chyron`, ...)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Files whose presence marks a directory as a portable install
const LOCAL_MARKERS: [&str; 2] = ["chyron.json", "chyron.log"];

/// Directory override resolved once at startup
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI arg → `CHYRON_CONFIG_DIR` → None (resolve per file)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir =
            cli_dir.or_else(|| std::env::var("CHYRON_CONFIG_DIR").ok().map(PathBuf::from));

        Self { config_dir }
    }
}

/// Path of a configuration file (`chyron.json`)
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir).join(name)
}

/// Path of a data file (log)
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir).join(name)
}

/// Create the config and data directories if missing
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = resolve_dir(config, dirs_next::config_dir);
    let data_dir = resolve_dir(config, dirs_next::data_dir);

    for dir in [&config_dir, &data_dir] {
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }

    Ok(())
}

fn has_local_markers(dir: &Path) -> bool {
    LOCAL_MARKERS.iter().any(|f| dir.join(f).exists())
}

/// Walk the priority chain; `platform_dir` picks config vs data flavor
fn resolve_dir(config: &PathConfig, platform_dir: fn() -> Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_markers(&current_dir) {
            return current_dir;
        }
    }

    if let Some(dir) = platform_dir() {
        return dir.join("chyron");
    }

    // Last resort if the platform reports no home at all
    PathBuf::from(".")
}
