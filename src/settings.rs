//! Tool settings
//!
//! Loaded from `<config_dir>/dispconf/settings.json`. Every key has a
//! default, so a missing file and a partial file both work.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{config, env as env_vars, paths};
use crate::generator::ValidityFlags;
use crate::store::StorePaths;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Preference root, the per-user data dir when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding one subdirectory per ACPI lid switch
    #[serde(default = "default_lid_root")]
    pub lid_state_glob_root: PathBuf,

    /// Reject layouts without an enabled primary output
    #[serde(default)]
    pub require_primary: bool,

    /// Takes precedence over the `LOG_LEVEL` environment variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_lid_root() -> PathBuf {
    PathBuf::from(paths::ACPI_LID_ROOT)
}

const DEFAULT_LOG_LEVEL: &str = "info";

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            lid_state_glob_root: default_lid_root(),
            require_primary: false,
            log_level: None,
        }
    }
}

impl Settings {
    pub fn settings_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load from the default location with environment overrides applied
    ///
    /// Values are not validated yet; call `validate` once logging is up.
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::settings_path())?;
        settings.apply_overrides(|key| env::var(key).ok());
        Ok(settings)
    }

    /// Load `path`, defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides read through `lookup`
    ///
    /// The data dir variable wins over the file, the log level variable only
    /// fills in when the file sets none.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(env_vars::DATA_DIR)
            && !dir.is_empty()
        {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if self.log_level.is_none()
            && let Some(level) = lookup(env_vars::LOG_LEVEL)
        {
            self.log_level = Some(level);
        }
    }

    /// Normalize values to something usable
    ///
    /// Returns a note for every value that was replaced, for the caller to
    /// log once a subscriber is installed.
    pub fn validate(&mut self) -> Vec<String> {
        let mut notes = Vec::new();

        if let Some(raw) = self.log_level.take() {
            let level = raw.trim().to_lowercase();
            if LOG_LEVELS.contains(&level.as_str()) {
                self.log_level = Some(level);
            } else {
                notes.push(format!("Unknown log level '{raw}', using {DEFAULT_LOG_LEVEL}"));
            }
        }

        if self.data_dir.as_ref().is_some_and(|d| d.as_os_str().is_empty()) {
            notes.push("Empty data_dir, using the default data directory".to_string());
            self.data_dir = None;
        }
        notes
    }

    /// Effective log level
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Where control documents live
    pub fn store_paths(&self) -> Result<StorePaths> {
        let root = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => StorePaths::default_root().context("Failed to determine data directory")?,
        };
        Ok(StorePaths::new(root))
    }

    pub fn validity_flags(&self) -> ValidityFlags {
        let mut flags = ValidityFlags::default();
        flags.set(ValidityFlags::REQUIRE_PRIMARY, self.require_primary);
        flags
    }
}
