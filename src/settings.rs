use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpendlensError};

pub const DATA_DIR_ENV: &str = "SPENDLENS_DATA_DIR";
const DB_FILENAME: &str = "spendlens.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub default_user: Option<String>,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            default_user: None,
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl Settings {
    /// `explicit` wins, then `default_user`; blank ids count as absent.
    pub fn resolve_user(&self, explicit: Option<String>) -> Result<String> {
        explicit
            .or_else(|| self.default_user.clone())
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(SpendlensError::MissingUser)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("spendlens")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spendlens")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| SpendlensError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

fn data_dir_for(settings: &Settings) -> PathBuf {
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(shellexpand_path(&dir)),
        _ => PathBuf::from(&settings.data_dir),
    }
}

pub fn get_data_dir() -> PathBuf {
    data_dir_for(&load_settings())
}

pub fn db_path() -> PathBuf {
    get_data_dir().join(DB_FILENAME)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
