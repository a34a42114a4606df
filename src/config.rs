use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Where the TUI writes exported statements; the data dir when unset
    #[serde(default)]
    pub export_dir: Option<String>,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_help")]
    pub help: String,
    #[serde(default = "default_prev_tab")]
    pub prev_tab: String,
    #[serde(default = "default_next_tab")]
    pub next_tab: String,
    #[serde(default = "default_tab_1")]
    pub tab_1: String,
    #[serde(default = "default_tab_2")]
    pub tab_2: String,
    #[serde(default = "default_tab_3")]
    pub tab_3: String,
    #[serde(default = "default_prev_month")]
    pub prev_month: String,
    #[serde(default = "default_next_month")]
    pub next_month: String,
    #[serde(default = "default_today")]
    pub today: String,
    #[serde(default = "default_toggle_day")]
    pub toggle_day: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_clear_override")]
    pub clear_override: String,
    #[serde(default = "default_invoice")]
    pub invoice: String,
    #[serde(default = "default_rate")]
    pub rate: String,
    #[serde(default = "default_export")]
    pub export: String,
    #[serde(default = "default_save")]
    pub save: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    /// Background of attended days in the calendar
    #[serde(default = "default_selected_bg")]
    pub selected_bg: String,
    /// Marker colour for days with custom hours
    #[serde(default = "default_override_fg")]
    pub override_fg: String,
    #[serde(default = "default_over_fg")]
    pub over_invoiced_fg: String,
    #[serde(default = "default_under_fg")]
    pub under_invoiced_fg: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            export_dir: None,
            key_bindings: KeyBindings::default(),
            theme: Theme::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            help: default_help(),
            prev_tab: default_prev_tab(),
            next_tab: default_next_tab(),
            tab_1: default_tab_1(),
            tab_2: default_tab_2(),
            tab_3: default_tab_3(),
            prev_month: default_prev_month(),
            next_month: default_next_month(),
            today: default_today(),
            toggle_day: default_toggle_day(),
            edit: default_edit(),
            clear_override: default_clear_override(),
            invoice: default_invoice(),
            rate: default_rate(),
            export: default_export(),
            save: default_save(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            selected_bg: default_selected_bg(),
            override_fg: default_override_fg(),
            over_invoiced_fg: default_over_fg(),
            under_invoiced_fg: default_under_fg(),
        }
    }
}

// Default value functions
fn default_database_path() -> String {
    // Fallback only, the profile decides the real path at load time
    if let Some(data_dir) = utils::get_data_dir(utils::Profile::Prod) {
        data_dir.join("creche.db").to_string_lossy().to_string()
    } else {
        "~/.local/share/creche/creche.db".to_string()
    }
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_prev_tab() -> String {
    "BackTab".to_string()
}

fn default_next_tab() -> String {
    "Tab".to_string()
}

fn default_tab_1() -> String {
    "1".to_string()
}

fn default_tab_2() -> String {
    "2".to_string()
}

fn default_tab_3() -> String {
    "3".to_string()
}

fn default_prev_month() -> String {
    "[".to_string()
}

fn default_next_month() -> String {
    "]".to_string()
}

fn default_today() -> String {
    "t".to_string()
}

fn default_toggle_day() -> String {
    "Space".to_string()
}

fn default_edit() -> String {
    "Enter".to_string()
}

fn default_clear_override() -> String {
    "d".to_string()
}

fn default_invoice() -> String {
    "i".to_string()
}

fn default_rate() -> String {
    "r".to_string()
}

fn default_export() -> String {
    "x".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_selected_bg() -> String {
    "green".to_string()
}

fn default_override_fg() -> String {
    "yellow".to_string()
}

fn default_over_fg() -> String {
    "lightred".to_string()
}

fn default_under_fg() -> String {
    "lightgreen".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from file, or create the default one if missing.
    /// The profile decides the config and database locations.
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let config = Self::from_toml(&contents)?;
            tracing::debug!(path = %config_path.display(), "Loaded config");
            Ok(config)
        } else {
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            if let Err(e) = config.save_with_profile(profile) {
                tracing::error!(path = %config_path.display(), error = %e, "Failed to save config file");
                return Err(e);
            }
            Ok(config)
        }
    }

    /// Load an explicit config file (the `--config` flag). It must exist.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save_with_profile(&mut self, profile: utils::Profile) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        let config_path = Self::get_config_path(profile)?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("creche.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/creche-dev/creche.db".to_string(),
                utils::Profile::Prod => "~/.local/share/creche/creche.db".to_string(),
            }
        }
    }

    /// Database path with `~` expanded
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Directory for exported statements: `export_dir` if set, else next to the database
    pub fn get_export_dir(&self) -> PathBuf {
        match self.export_dir {
            Some(ref dir) => utils::expand_path(dir),
            None => self
                .get_database_path()
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}
