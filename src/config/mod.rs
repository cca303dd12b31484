use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub plugins: PluginsConfig,
    #[serde(default)]
    pub host: HostConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PluginsConfig {
    /// Plugin directory. Defaults to `plugins` next to the executable.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Load plugins in path order instead of filesystem order
    #[serde(default)]
    pub sort_by_path: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Frame rate cap; 0 disables pacing
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// Show one plugin at a time
    #[serde(default = "default_true")]
    pub single_app_mode: bool,

    /// Width of the host control panel in columns
    #[serde(default = "default_control_panel_width")]
    pub control_panel_width: u16,
}

// Default value functions
fn default_target_fps() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

fn default_control_panel_width() -> u16 {
    36
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            single_app_mode: true,
            control_panel_width: default_control_panel_width(),
        }
    }
}

impl Config {
    /// Read `~/.gtools/config.yaml`, or fall back to defaults when it is absent.
    pub fn load_default() -> Result<Self> {
        match Self::default_config_path()? {
            path if path.is_file() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse a YAML document. Missing sections and keys take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Write the configuration as YAML, creating parent directories.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = serde_yaml::to_string(self)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        }
        fs::write(path, text)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".gtools").join("config.yaml"))
            .context("Failed to get home directory")
    }
}
