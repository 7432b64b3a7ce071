use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::transfer::SpeedPolicy;

const DEFAULT_ADB_PATH: &str = "/usr/local/bin/adb";
const DEFAULT_REMOTE_ROOT: &str = "/sdcard";
/// Config file of the earlier releases, read from the working directory.
const LEGACY_JSON_CONFIG: &str = "config.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TransferConfig {
    pub poll_initial_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub speed_policy: SpeedPolicy,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            poll_initial_delay_ms: 1000,
            poll_interval_ms: 2000,
            speed_policy: SpeedPolicy::Cumulative,
        }
    }
}

impl TransferConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.poll_initial_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        // a zero period would make the interval timer panic
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub adb_path: PathBuf,
    pub local_start_path: PathBuf,
    pub remote_root: String,
    pub show_hidden_files: bool,
    pub browse_above_root: bool,
    pub message_duration_secs: u64,
    pub reload_debounce_ms: u64,
    pub transfer: TransferConfig,
}

fn default_local_start() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            adb_path: PathBuf::from(DEFAULT_ADB_PATH),
            local_start_path: default_local_start(),
            remote_root: DEFAULT_REMOTE_ROOT.to_string(),
            show_hidden_files: false,
            browse_above_root: false,
            message_duration_secs: 5,
            reload_debounce_ms: 200,
            transfer: TransferConfig::default(),
        }
    }
}

impl AppConfig {
    /// Replace empty or unusable values with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.adb_path.as_os_str().is_empty() {
            self.adb_path = PathBuf::from(DEFAULT_ADB_PATH);
        }
        if self.local_start_path.as_os_str().is_empty() || !self.local_start_path.is_absolute() {
            self.local_start_path = default_local_start();
        }
        if !self.remote_root.starts_with('/') {
            self.remote_root = DEFAULT_REMOTE_ROOT.to_string();
        }
        self
    }

    pub fn message_duration(&self) -> Duration {
        Duration::from_secs(self.message_duration_secs)
    }

    pub fn reload_debounce(&self) -> Duration {
        Duration::from_millis(self.reload_debounce_ms)
    }
}

/// Keys of the old `config.json`.
#[derive(Debug, Deserialize, Default)]
struct LegacyConfig {
    adb_path: Option<String>,
    mac_start_path: Option<String>,
    android_browse_above_sdcard: Option<bool>,
    show_hidden_files: Option<bool>,
}

impl LegacyConfig {
    fn apply_to(self, config: &mut AppConfig) {
        if let Some(path) = self.adb_path {
            config.adb_path = PathBuf::from(path);
        }
        if let Some(path) = self.mac_start_path {
            config.local_start_path = PathBuf::from(path);
        }
        if let Some(flag) = self.android_browse_above_sdcard {
            config.browse_above_root = flag;
        }
        if let Some(flag) = self.show_hidden_files {
            config.show_hidden_files = flag;
        }
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    config_file: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("adbfm");

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }

        Ok(Self {
            config_file: config_dir.join("adbfm.toml"),
        })
    }

    pub fn with_file(config_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
        }
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_file
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        // First run: seed from the legacy JSON file when there is one
        if !self.config_file.exists() {
            let config = Self::import_legacy(Path::new(LEGACY_JSON_CONFIG))?;
            self.save_config(&config)?;
        }

        let content =
            fs::read_to_string(&self.config_file).context("Failed to read config file")?;
        let config: AppConfig = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config.normalized())
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }
        let toml = toml::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.config_file, toml).context("Failed to write config file")?;
        Ok(())
    }

    fn import_legacy(path: &Path) -> Result<AppConfig> {
        let mut config = AppConfig::default();
        if !path.exists() {
            return Ok(config);
        }

        let content = fs::read_to_string(path).context("Failed to read config.json")?;
        match serde_json::from_str::<LegacyConfig>(&content) {
            Ok(legacy) => {
                tracing::info!("Imported settings from {}", path.display());
                legacy.apply_to(&mut config);
            }
            Err(e) => tracing::warn!("Ignoring unreadable {}: {}", path.display(), e),
        }
        Ok(config.normalized())
    }
}
