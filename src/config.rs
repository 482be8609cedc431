use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api/";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  /// SQLite cache location (defaults to $XDG_DATA_HOME/mortdex/characters.db)
  pub database_path: Option<PathBuf>,
  /// Directory for mortdex.log (defaults to $XDG_DATA_HOME/mortdex)
  pub log_dir: Option<PathBuf>,
  /// Filter used when RUST_LOG is not set
  pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Whole-request timeout
  pub request_timeout_secs: u64,
  pub connect_timeout_secs: u64,
  pub read_timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      request_timeout_secs: 15,
      connect_timeout_secs: 10,
      read_timeout_secs: 15,
    }
  }
}

impl Config {
  /// Load configuration from file, falling back to defaults.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./mortdex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/mortdex/config.yaml
  ///
  /// `MORTDEX_BASE_URL` overrides the API base url from any source.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(base_url) = std::env::var("MORTDEX_BASE_URL") {
      config.api.base_url = base_url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("mortdex.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("mortdex").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file deserializes to unit, not to an empty map
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Resolved cache database path.
  pub fn database_path(&self) -> Result<PathBuf> {
    match &self.database_path {
      Some(p) => Ok(p.clone()),
      None => Ok(data_dir()?.join("characters.db")),
    }
  }

  /// Resolved log directory.
  pub fn log_dir(&self) -> Result<PathBuf> {
    match &self.log_dir {
      Some(p) => Ok(p.clone()),
      None => data_dir(),
    }
  }

  pub fn log_level(&self) -> &str {
    self.log_level.as_deref().unwrap_or("info")
  }
}

/// $XDG_DATA_HOME/mortdex, or ~/.local/share/mortdex
fn data_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("mortdex"))
}
