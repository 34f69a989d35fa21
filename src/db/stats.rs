//! Deck and tag statistics

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Result};

use super::timestamp;
use crate::domain::{DeckStats, TagStats};

/// Midnight UTC of the day containing `now`
fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
  now
    .date_naive()
    .and_hms_opt(0, 0, 0)
    .map(|midnight| midnight.and_utc())
    .unwrap_or(now)
}

/// Card counts for the cards matching `filter` (a condition on `c`).
/// Returns (total, due, new).
fn card_counts(conn: &Connection, filter: &str, id: i64, now: DateTime<Utc>) -> Result<(i64, i64, i64)> {
  conn.query_row(
    &format!(
      "SELECT COUNT(*),
              COALESCE(SUM(CASE WHEN r.id IS NULL OR r.next_review <= ?2 THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN r.id IS NULL THEN 1 ELSE 0 END), 0)
       FROM cards c LEFT JOIN reviews r ON r.card_id = c.id
       WHERE {}",
      filter
    ),
    params![id, timestamp(now)],
    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
  )
}

/// Distinct cards matching `filter` reviewed at or after `since`
fn studied_since(conn: &Connection, filter: &str, id: i64, since: DateTime<Utc>) -> Result<i64> {
  conn.query_row(
    &format!(
      "SELECT COUNT(DISTINCT l.card_id)
       FROM review_logs l JOIN cards c ON c.id = l.card_id
       WHERE {} AND l.reviewed_at >= ?2",
      filter
    ),
    params![id, timestamp(since)],
    |row| row.get(0),
  )
}

pub fn deck_stats(conn: &Connection, deck_id: i64, now: DateTime<Utc>) -> Result<DeckStats> {
  let filter = "c.deck_id = ?1";
  let (total_cards, due_cards, new_cards) = card_counts(conn, filter, deck_id, now)?;
  let tag_count = conn.query_row(
    "SELECT COUNT(*) FROM tags WHERE deck_id = ?1",
    params![deck_id],
    |row| row.get(0),
  )?;

  Ok(DeckStats {
    total_cards,
    due_cards,
    new_cards,
    tag_count,
    today_studied: studied_since(conn, filter, deck_id, start_of_day(now))?,
    week_studied: studied_since(conn, filter, deck_id, now - Duration::days(7))?,
  })
}

pub fn tag_stats(conn: &Connection, tag_id: i64, now: DateTime<Utc>) -> Result<TagStats> {
  let filter = "c.tag_id = ?1";
  let (total_cards, due_cards, new_cards) = card_counts(conn, filter, tag_id, now)?;

  Ok(TagStats {
    total_cards,
    due_cards,
    new_cards,
    today_studied: studied_since(conn, filter, tag_id, start_of_day(now))?,
  })
}
