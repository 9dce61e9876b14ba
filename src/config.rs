//! Gateway configuration.
//!
//! `Settings` is read once at startup (JSON file overlaid by CLI flags),
//! then passed around behind an `Arc` and never mutated - there is no
//! process-wide mutable configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::cli::Args;

/// Gateway settings, immutable after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Interface and port the HTTP gateway listens on
    pub listen_addr: String,
    /// Accepted username
    pub user: String,
    /// Accepted password (compared verbatim)
    pub password: String,
    /// Control endpoint of the rendering process
    pub channel_addr: String,
    /// Reply deadline for one control-channel exchange
    pub reply_timeout_ms: u64,
    /// Longest a request may queue for its turn before failing busy
    pub max_queue_wait_ms: u64,
    /// Filter instance addressed by reinit commands
    pub target_node: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            user: "editor".to_string(),
            password: "change-me".to_string(),
            channel_addr: "127.0.0.1:5555".to_string(),
            reply_timeout_ms: 1000,
            max_queue_wait_ms: 1000,
            target_node: "Parsed_drawtext_2".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load `path` if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply command-line overrides on top of file/default values.
    pub fn apply_cli(&mut self, args: &Args) {
        if let Some(listen) = &args.listen {
            self.listen_addr = listen.clone();
        }
        if let Some(channel) = &args.channel {
            self.channel_addr = channel.clone();
        }
        if let Some(user) = &args.user {
            self.user = user.clone();
        }
        if let Some(password) = &args.password {
            self.password = password.clone();
        }
        if let Some(target) = &args.target {
            self.target_node = target.clone();
        }
        if let Some(timeout_ms) = args.timeout_ms {
            self.reply_timeout_ms = timeout_ms;
        }
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    pub fn max_queue_wait(&self) -> Duration {
        Duration::from_millis(self.max_queue_wait_ms)
    }
}
