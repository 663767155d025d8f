//! Application configuration file.
//!
//! Lives in the platform config directory (`quote/config.toml`), separate
//! from business settings which belong to the repository. This file only
//! holds what is needed before the repository exists: where the database
//! is, who the user is, remote credentials and the theme preference.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Light/dark preference, with `System` deferring to the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// Resolves `System` against the terminal's reported background.
    ///
    /// `COLORFGBG` is the only widely set hint; its last field is the
    /// background color index, where 0–6 and 8 are dark. Absent or
    /// unparseable, light wins.
    pub fn resolve(self) -> Self {
        match self {
            Self::System => match std::env::var("COLORFGBG") {
                Ok(value) => {
                    let background = value.rsplit(';').next().unwrap_or("");
                    match background.parse::<u8>() {
                        Ok(index) if index <= 6 || index == 8 => Self::Dark,
                        _ => Self::Light,
                    }
                }
                Err(_) => Self::Light,
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database path. Relative paths resolve against the data dir.
    #[serde(default = "default_database")]
    pub database: String,
    /// Owner key for every stored record.
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub sync_url: String,
    #[serde(default)]
    pub sync_key: String,
    #[serde(default)]
    pub assist_key: String,
    #[serde(default)]
    pub theme: Theme,
}

fn default_database() -> String {
    "quotes.db".to_string()
}

fn default_user_id() -> String {
    "local".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            user_id: default_user_id(),
            sync_url: String::new(),
            sync_key: String::new(),
            assist_key: String::new(),
            theme: Theme::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config, creating a default file on first run.
    pub fn load_or_create(dir: &Path) -> Result<Self> {
        let path = dir.join("config.toml");
        if !path.exists() {
            let config = Self::default();
            config.save(dir)?;
            return Ok(config);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("cannot read config '{}'", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("malformed config '{}'", path.display()))
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create config dir '{}'", dir.display()))?;
        let path = dir.join("config.toml");
        let raw = toml::to_string_pretty(self).context("cannot serialize config")?;
        fs::write(&path, raw)
            .with_context(|| format!("cannot write config '{}'", path.display()))
    }

    /// Absolute database path, placing relative paths in `data_dir`.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        let path = Path::new(&self.database);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            data_dir.join(path)
        }
    }
}

/// Platform config/data directories for the application.
pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "quote").context("cannot determine a home directory")
}
