use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use super::{time_column, timestamp};
use crate::config::DECK_NAME_MAX_CHARS;
use crate::domain::Deck;

const DECK_COLUMNS: &str = "id, name, archived, created_at, updated_at";

fn row_to_deck(row: &Row<'_>) -> Result<Deck> {
  Ok(Deck {
    id: row.get(0)?,
    name: row.get(1)?,
    archived: row.get(2)?,
    created_at: time_column(row, 3)?,
    updated_at: time_column(row, 4)?,
  })
}

pub fn list_decks(conn: &Connection) -> Result<Vec<Deck>> {
  let mut stmt = conn.prepare(&format!("SELECT {} FROM decks ORDER BY id", DECK_COLUMNS))?;
  let decks = stmt.query_map([], row_to_deck)?.collect::<Result<Vec<_>>>()?;
  Ok(decks)
}

pub fn get_deck(conn: &Connection, id: i64) -> Result<Option<Deck>> {
  conn
    .query_row(
      &format!("SELECT {} FROM decks WHERE id = ?1", DECK_COLUMNS),
      params![id],
      row_to_deck,
    )
    .optional()
}

pub fn deck_name_taken(conn: &Connection, name: &str) -> Result<bool> {
  conn.query_row(
    "SELECT EXISTS(SELECT 1 FROM decks WHERE name = ?1)",
    params![name],
    |row| row.get(0),
  )
}

/// First free name among `base`, `base (2)`, `base (3)`, ...
/// The base is shortened so the suffixed name still fits the deck name limit.
pub fn available_deck_name(conn: &Connection, base: &str) -> Result<String> {
  if !deck_name_taken(conn, base)? {
    return Ok(base.to_string());
  }
  let mut n = 2;
  loop {
    let suffix = format!(" ({})", n);
    let keep = DECK_NAME_MAX_CHARS.saturating_sub(suffix.chars().count());
    let stem: String = base.chars().take(keep).collect();
    let candidate = format!("{}{}", stem.trim_end(), suffix);
    if !deck_name_taken(conn, &candidate)? {
      return Ok(candidate);
    }
    n += 1;
  }
}

pub fn insert_deck(conn: &Connection, name: &str, now: DateTime<Utc>) -> Result<Deck> {
  let ts = timestamp(now);
  conn.execute(
    "INSERT INTO decks (name, archived, created_at, updated_at) VALUES (?1, 0, ?2, ?2)",
    params![name, ts],
  )?;
  let id = conn.last_insert_rowid();
  get_deck(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Apply the given changes; returns false when the deck does not exist.
pub fn update_deck(
  conn: &Connection,
  id: i64,
  name: Option<&str>,
  archived: Option<bool>,
  now: DateTime<Utc>,
) -> Result<bool> {
  let changed = conn.execute(
    "UPDATE decks
     SET name = COALESCE(?2, name),
         archived = COALESCE(?3, archived),
         updated_at = ?4
     WHERE id = ?1",
    params![id, name, archived, timestamp(now)],
  )?;
  Ok(changed > 0)
}

/// Tags, cards, reviews and logs go with the deck.
pub fn delete_deck(conn: &Connection, id: i64) -> Result<bool> {
  let deleted = conn.execute("DELETE FROM decks WHERE id = ?1", params![id])?;
  Ok(deleted > 0)
}
