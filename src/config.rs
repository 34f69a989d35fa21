//! Application configuration.
//!
//! Values are resolved with priority: config.toml > environment (.env) > default.
//! Limits that are not meant to be tuned per deployment live here as constants.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::paths;

// ==================== Config File ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
  server: Option<ServerSection>,
  database: Option<DatabaseSection>,
  storage: Option<StorageSection>,
  auth: Option<AuthSection>,
  cors: Option<CorsSection>,
  log: Option<LogSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
  addr: Option<String>,
  port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseSection {
  path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StorageSection {
  export_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthSection {
  api_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CorsSection {
  origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LogSection {
  level: Option<String>,
}

// ==================== Resolved Config ====================

/// Runtime configuration shared by the server and its handlers.
#[derive(Debug, Clone)]
pub struct Config {
  pub bind_addr: String,
  pub port: u16,
  pub db_path: PathBuf,
  pub export_dir: PathBuf,
  /// When set, every `/api/v1` route requires `Authorization: Bearer <token>`.
  pub api_token: Option<String>,
  pub cors_origins: Vec<String>,
  /// Tracing filter directive used when RUST_LOG is not set.
  pub log_filter: String,
}

impl Config {
  /// Load configuration from `config.toml` in the working directory, then the
  /// environment, then defaults.
  pub fn load() -> Self {
    // Load .env file if present
    let _ = dotenvy::dotenv();
    Self::load_from(Path::new("config.toml"))
  }

  /// Same as [`Config::load`] but with an explicit config file path.
  pub fn load_from(path: &Path) -> Self {
    let file = match std::fs::read_to_string(path) {
      Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
        Ok(parsed) => {
          tracing::info!("Using configuration from {}", path.display());
          parsed
        }
        Err(e) => {
          tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
          FileConfig::default()
        }
      },
      Err(_) => FileConfig::default(),
    };
    Self::resolve(file, |key| std::env::var(key).ok())
  }

  fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
    let server = file.server.unwrap_or_default();
    let database = file.database.unwrap_or_default();
    let storage = file.storage.unwrap_or_default();
    let auth = file.auth.unwrap_or_default();
    let cors = file.cors.unwrap_or_default();
    let log = file.log.unwrap_or_default();

    let data_dir = env("DATA_DIR").unwrap_or_else(|| paths::DEFAULT_DATA_DIR.to_string());

    let bind_addr = server
      .addr
      .or_else(|| env("BIND_ADDR"))
      .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

    let port = server
      .port
      .or_else(|| env("PORT").and_then(|p| p.parse().ok()))
      .unwrap_or(DEFAULT_PORT);

    let db_path = database
      .path
      .or_else(|| env("DB_PATH"))
      .map(PathBuf::from)
      .unwrap_or_else(|| paths::db_path(&data_dir));

    let export_dir = storage
      .export_dir
      .or_else(|| env("EXPORT_DIR"))
      .map(PathBuf::from)
      .unwrap_or_else(|| paths::export_dir(&data_dir));

    let api_token = auth
      .api_token
      .or_else(|| env("API_TOKEN"))
      .filter(|t| !t.trim().is_empty());

    let cors_origins = cors
      .origins
      .or_else(|| {
        env("CORS_ORIGINS").map(|v| {
          v.split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
        })
      })
      .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect());

    let log_filter = log
      .level
      .or_else(|| env("LOG_LEVEL"))
      .map(|level| log_directive(&level))
      .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    Self {
      bind_addr,
      port,
      db_path,
      export_dir,
      api_token,
      cors_origins,
      log_filter,
    }
  }

  /// Get the full server bind address
  pub fn server_bind_addr(&self) -> String {
    format!("{}:{}", self.bind_addr, self.port)
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::resolve(FileConfig::default(), |_| None)
  }
}

/// Turn a bare level ("info") into a directive scoped to this crate; pass full
/// directives ("flashmind=trace,tower_http=info") through unchanged.
fn log_directive(level: &str) -> String {
  if level.contains('=') || level.contains(',') {
    level.to_string()
  } else {
    format!("flashmind={0},tower_http={0}", level)
  }
}

// ==================== Server Configuration ====================

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_LOG_FILTER: &str = "flashmind=debug,tower_http=debug";

/// Local development front-end origins
pub const DEFAULT_CORS_ORIGINS: [&str; 6] = [
  "http://localhost:3000",
  "http://localhost:5173",
  "http://localhost:5174",
  "http://127.0.0.1:3000",
  "http://127.0.0.1:5173",
  "http://127.0.0.1:5174",
];

/// Version reported by `/system/stats`
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ==================== Validation Limits ====================

pub const DECK_NAME_MAX_CHARS: usize = 100;

pub const TAG_NAME_MAX_CHARS: usize = 50;

// ==================== Query Limits ====================

pub const DEFAULT_PAGE_SIZE: i64 = 20;

pub const MAX_PAGE_SIZE: i64 = 100;

/// (default, max) queue sizes for deck, tag and due-card study
pub const STUDY_LIMITS: (i64, i64) = (20, 100);

/// (default, max) queue sizes for random study
pub const RANDOM_STUDY_LIMITS: (i64, i64) = (10, 50);

// ==================== Upload Limits ====================

pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

pub const MAX_RESTORE_BYTES: usize = 50 * 1024 * 1024;

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |key| map.get(key).cloned()
  }

  #[test]
  fn test_defaults() {
    let config = Config::resolve(FileConfig::default(), env_of(&[]));
    assert_eq!(config.server_bind_addr(), "0.0.0.0:8080");
    assert_eq!(config.db_path, PathBuf::from("data/flashcard.db"));
    assert_eq!(config.export_dir, PathBuf::from("data/exports"));
    assert!(config.api_token.is_none());
    assert_eq!(config.cors_origins.len(), 6);
    assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
  }

  #[test]
  fn test_env_overrides_defaults() {
    let config = Config::resolve(
      FileConfig::default(),
      env_of(&[
        ("DATA_DIR", "/srv/cards"),
        ("PORT", "9090"),
        ("API_TOKEN", "secret"),
        ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ("LOG_LEVEL", "info"),
      ]),
    );
    assert_eq!(config.port, 9090);
    assert_eq!(config.db_path, PathBuf::from("/srv/cards/flashcard.db"));
    assert_eq!(config.api_token.as_deref(), Some("secret"));
    assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
    assert_eq!(config.log_filter, "flashmind=info,tower_http=info");
  }

  #[test]
  fn test_file_wins_over_env() {
    let file: FileConfig = toml::from_str(
      r#"
      [server]
      port = 7000

      [database]
      path = "custom.db"

      [auth]
      api_token = ""
      "#,
    )
    .unwrap();
    let config = Config::resolve(file, env_of(&[("PORT", "9090"), ("DB_PATH", "env.db")]));
    assert_eq!(config.port, 7000);
    assert_eq!(config.db_path, PathBuf::from("custom.db"));
    // Blank tokens disable auth
    assert!(config.api_token.is_none());
  }

  #[test]
  fn test_invalid_port_falls_back() {
    let config = Config::resolve(FileConfig::default(), env_of(&[("PORT", "not-a-port")]));
    assert_eq!(config.port, DEFAULT_PORT);
  }

  #[test]
  fn test_full_log_directive_passthrough() {
    assert_eq!(log_directive("flashmind=trace"), "flashmind=trace");
    assert_eq!(log_directive("warn"), "flashmind=warn,tower_http=warn");
  }

  #[test]
  fn test_load_from_missing_file_uses_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("nope.toml"));
    assert!(!config.log_filter.is_empty());
    assert!(!config.cors_origins.is_empty());
  }
}
