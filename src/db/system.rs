//! Whole-database reads and writes used by backup, restore and clear

use rusqlite::{params, Connection, Result};

use super::reviews::row_to_review;
use super::{time_column, timestamp};
use crate::domain::{Card, Deck, Review, ReviewLog, ReviewResult, Tag};

/// Row counts: (decks, cards, tags, reviews)
pub fn table_counts(conn: &Connection) -> Result<(i64, i64, i64, i64)> {
  conn.query_row(
    "SELECT (SELECT COUNT(*) FROM decks), (SELECT COUNT(*) FROM cards),
            (SELECT COUNT(*) FROM tags), (SELECT COUNT(*) FROM reviews)",
    [],
    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
  )
}

pub fn all_cards(conn: &Connection) -> Result<Vec<Card>> {
  let mut stmt = conn.prepare(
    "SELECT id, deck_id, tag_id, question, answer, created_at, updated_at FROM cards ORDER BY id",
  )?;
  let cards = stmt
    .query_map([], |row| {
      Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        tag_id: row.get(2)?,
        question: row.get(3)?,
        answer: row.get(4)?,
        created_at: time_column(row, 5)?,
        updated_at: time_column(row, 6)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(cards)
}

pub fn all_reviews(conn: &Connection) -> Result<Vec<Review>> {
  let mut stmt = conn.prepare(
    "SELECT id, card_id, e_factor, interval_days, repetitions, next_review, created_at, updated_at
     FROM reviews ORDER BY id",
  )?;
  let reviews = stmt.query_map([], row_to_review)?.collect::<Result<Vec<_>>>()?;
  Ok(reviews)
}

pub fn all_review_logs(conn: &Connection) -> Result<Vec<ReviewLog>> {
  let mut stmt = conn.prepare(
    "SELECT id, card_id, result, interval_days, e_factor, reviewed_at FROM review_logs ORDER BY id",
  )?;
  let logs = stmt
    .query_map([], |row| {
      let raw: u8 = row.get(2)?;
      let result = ReviewResult::from_u8(raw)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(2, i64::from(raw)))?;
      Ok(ReviewLog {
        id: row.get(0)?,
        card_id: row.get(1)?,
        result,
        interval: row.get(3)?,
        e_factor: row.get(4)?,
        reviewed_at: time_column(row, 5)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(logs)
}

// ==================== Restore ====================
// These keep the ids and timestamps of the rows they are given.

pub fn restore_deck(conn: &Connection, deck: &Deck) -> Result<()> {
  conn.execute(
    "INSERT INTO decks (id, name, archived, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      deck.id,
      deck.name,
      deck.archived,
      timestamp(deck.created_at),
      timestamp(deck.updated_at)
    ],
  )?;
  Ok(())
}

pub fn restore_tag(conn: &Connection, tag: &Tag) -> Result<()> {
  conn.execute(
    "INSERT INTO tags (id, deck_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      tag.id,
      tag.deck_id,
      tag.name,
      timestamp(tag.created_at),
      timestamp(tag.updated_at)
    ],
  )?;
  Ok(())
}

pub fn restore_card(conn: &Connection, card: &Card) -> Result<()> {
  conn.execute(
    "INSERT INTO cards (id, deck_id, tag_id, question, answer, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      card.id,
      card.deck_id,
      card.tag_id,
      card.question,
      card.answer,
      timestamp(card.created_at),
      timestamp(card.updated_at)
    ],
  )?;
  Ok(())
}

pub fn restore_review(conn: &Connection, review: &Review) -> Result<()> {
  conn.execute(
    "INSERT INTO reviews (id, card_id, e_factor, interval_days, repetitions, next_review, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    params![
      review.id,
      review.card_id,
      review.e_factor,
      review.interval,
      review.repetitions,
      timestamp(review.next_review),
      timestamp(review.created_at),
      timestamp(review.updated_at)
    ],
  )?;
  Ok(())
}

pub fn restore_review_log(conn: &Connection, log: &ReviewLog) -> Result<()> {
  conn.execute(
    "INSERT INTO review_logs (id, card_id, result, interval_days, e_factor, reviewed_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      log.id,
      log.card_id,
      log.result.as_u8(),
      log.interval,
      log.e_factor,
      timestamp(log.reviewed_at)
    ],
  )?;
  Ok(())
}

/// Delete every row and reset the autoincrement counters.
pub fn clear_all(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    "DELETE FROM review_logs;
     DELETE FROM reviews;
     DELETE FROM cards;
     DELETE FROM tags;
     DELETE FROM decks;
     DELETE FROM sqlite_sequence
       WHERE name IN ('review_logs', 'reviews', 'cards', 'tags', 'decks');",
  )
}
