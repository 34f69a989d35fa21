//! Project path functions - single source of truth for on-disk locations.
//!
//! ## Environment Variables
//!
//! - `DATA_DIR`: Override the base data directory (default: "data")
//!
//! This allows running multiple isolated server instances side by side:
//! ```bash
//! DATA_DIR=data/test/a PORT=8081 cargo run
//! DATA_DIR=data/test/b PORT=8082 cargo run
//! ```

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "data";

/// SQLite database path under a data directory
pub fn db_path(data_dir: &str) -> PathBuf {
  Path::new(data_dir).join("flashcard.db")
}

/// Directory for deck exports written with `download=false`
pub fn export_dir(data_dir: &str) -> PathBuf {
  Path::new(data_dir).join("exports")
}

/// File name of an exported deck: `{deck}_{YYYYMMDD}.{ext}`.
///
/// Path separators in the deck name are replaced so the name can never
/// escape the export directory.
pub fn export_file_name(deck_name: &str, extension: &str, at: DateTime<Utc>) -> String {
  let safe: String = deck_name
    .chars()
    .map(|c| match c {
      '/' | '\\' | ':' | '\0' => '_',
      _ => c,
    })
    .collect();
  format!("{}_{}.{}", safe, at.format("%Y%m%d"), extension)
}

/// File name of a full backup: `flashmind_complete_backup_{YYYY-MM-DD_HH-MM-SS}.json`
pub fn backup_file_name(at: DateTime<Utc>) -> String {
  format!(
    "flashmind_complete_backup_{}.json",
    at.format("%Y-%m-%d_%H-%M-%S")
  )
}

/// Deck name derived from an uploaded file name: the stem, minus a trailing
/// `_YYYYMMDD` export stamp.
pub fn deck_name_from_file(file_name: &str) -> String {
  let stem = Path::new(file_name)
    .file_stem()
    .map(|s| s.to_string_lossy().to_string())
    .unwrap_or_default();

  match stem.rsplit_once('_') {
    Some((head, stamp))
      if !head.is_empty() && stamp.len() == 8 && stamp.chars().all(|c| c.is_ascii_digit()) =>
    {
      head.to_string()
    }
    _ => stem,
  }
}

/// Lower-cased extension of an uploaded file name, without the dot
pub fn extension_of(file_name: &str) -> Option<String> {
  Path::new(file_name)
    .extension()
    .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap()
  }

  #[test]
  fn test_db_path() {
    assert_eq!(db_path("data"), PathBuf::from("data/flashcard.db"));
  }

  #[test]
  fn test_export_file_name() {
    assert_eq!(export_file_name("Go", "json", at()), "Go_20260307.json");
    assert_eq!(export_file_name("a/b", "csv", at()), "a_b_20260307.csv");
  }

  #[test]
  fn test_backup_file_name() {
    assert_eq!(
      backup_file_name(at()),
      "flashmind_complete_backup_2026-03-07_09-05-01.json"
    );
  }

  #[test]
  fn test_deck_name_from_file_strips_stamp() {
    assert_eq!(deck_name_from_file("Go_20260307.csv"), "Go");
    assert_eq!(deck_name_from_file("my_deck_20250101.txt"), "my_deck");
  }

  #[test]
  fn test_deck_name_from_file_keeps_other_suffixes() {
    assert_eq!(deck_name_from_file("my_deck.csv"), "my_deck");
    assert_eq!(deck_name_from_file("deck_2025.csv"), "deck_2025");
    assert_eq!(deck_name_from_file("_20250101.csv"), "_20250101");
  }

  #[test]
  fn test_extension_of() {
    assert_eq!(extension_of("a.JSON").as_deref(), Some("json"));
    assert_eq!(extension_of("noext"), None);
  }
}
