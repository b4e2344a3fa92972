//! Workspace discovery and `.ticketdesk/config.json`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::Priority;

pub const DESK_DIR: &str = ".ticketdesk";
pub const CONFIG_FILE: &str = "config.json";
pub const DATABASE_FILE: &str = "tickets.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Priority the store gives new tickets.
    pub default_priority: Priority,
    /// Where uploaded attachments are written, relative to the desk dir.
    pub attachments_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_priority: Priority::Medium,
            attachments_dir: PathBuf::from("attachments"),
        }
    }
}

impl Config {
    /// Read `config.json` from `desk_dir`; a missing file means defaults.
    pub fn load(desk_dir: &Path) -> Result<Self> {
        let path = desk_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn save(&self, desk_dir: &Path) -> Result<()> {
        let path = desk_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn attachments_path(&self, desk_dir: &Path) -> PathBuf {
        desk_dir.join(&self.attachments_dir)
    }
}

/// Walk up from `start` looking for a `.ticketdesk` directory.
pub fn find_desk_dir(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let candidate = current.join(DESK_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            bail!("Not a ticketdesk workspace (or any parent). Run 'ticketdesk init' first.");
        }
    }
}
