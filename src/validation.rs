//! Input normalization and validation for names and card text.
//!
//! Names are trimmed and NFC-normalized before they are stored so that
//! visually identical names (precomposed vs. combining characters) collide
//! on the database's uniqueness constraints.

use unicode_normalization::UnicodeNormalization;

use crate::config::{DECK_NAME_MAX_CHARS, TAG_NAME_MAX_CHARS};
use crate::error::{AppError, Result};

/// Trim and NFC-normalize a name, then check `1..=max_chars` characters.
pub fn normalize_name(raw: &str, what: &str, max_chars: usize) -> Result<String> {
  let name: String = raw.trim().nfc().collect();
  let len = name.chars().count();
  if len == 0 {
    return Err(AppError::invalid(format!("{} name must not be empty", what)));
  }
  if len > max_chars {
    return Err(AppError::invalid(format!(
      "{} name must be at most {} characters",
      what, max_chars
    )));
  }
  Ok(name)
}

pub fn deck_name(raw: &str) -> Result<String> {
  normalize_name(raw, "deck", DECK_NAME_MAX_CHARS)
}

pub fn tag_name(raw: &str) -> Result<String> {
  normalize_name(raw, "tag", TAG_NAME_MAX_CHARS)
}

/// Question/answer text: must contain something other than whitespace.
/// Inner formatting is kept; only the ends are trimmed.
pub fn card_text(raw: &str, field: &str) -> Result<String> {
  let text = raw.trim();
  if text.is_empty() {
    return Err(AppError::invalid(format!("{} must not be empty", field)));
  }
  Ok(text.to_string())
}

/// Path ids must be positive integers.
pub fn parse_id(raw: &str, what: &str) -> Result<i64> {
  raw
    .trim()
    .parse::<i64>()
    .ok()
    .filter(|id| *id > 0)
    .ok_or_else(|| AppError::invalid(format!("invalid {} id: {}", what, raw)))
}

/// Lenient limit parsing: missing, non-numeric or non-positive values use the
/// default; larger values are clamped to `max`.
pub fn clamp_limit(raw: Option<&str>, (default, max): (i64, i64)) -> i64 {
  raw
    .and_then(|v| v.trim().parse::<i64>().ok())
    .filter(|v| *v > 0)
    .map(|v| v.min(max))
    .unwrap_or(default)
}
