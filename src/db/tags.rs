use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use super::{time_column, timestamp};
use crate::domain::Tag;

const TAG_COLUMNS: &str = "id, deck_id, name, created_at, updated_at";

fn row_to_tag(row: &Row<'_>) -> Result<Tag> {
  Ok(Tag {
    id: row.get(0)?,
    deck_id: row.get(1)?,
    name: row.get(2)?,
    created_at: time_column(row, 3)?,
    updated_at: time_column(row, 4)?,
  })
}

pub fn list_tags(conn: &Connection) -> Result<Vec<Tag>> {
  let mut stmt = conn.prepare(&format!("SELECT {} FROM tags ORDER BY id", TAG_COLUMNS))?;
  let tags = stmt.query_map([], row_to_tag)?.collect::<Result<Vec<_>>>()?;
  Ok(tags)
}

pub fn list_tags_by_deck(conn: &Connection, deck_id: i64) -> Result<Vec<Tag>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM tags WHERE deck_id = ?1 ORDER BY id",
    TAG_COLUMNS
  ))?;
  let tags = stmt
    .query_map(params![deck_id], row_to_tag)?
    .collect::<Result<Vec<_>>>()?;
  Ok(tags)
}

pub fn get_tag(conn: &Connection, id: i64) -> Result<Option<Tag>> {
  conn
    .query_row(
      &format!("SELECT {} FROM tags WHERE id = ?1", TAG_COLUMNS),
      params![id],
      row_to_tag,
    )
    .optional()
}

pub fn find_tag_by_name(conn: &Connection, deck_id: i64, name: &str) -> Result<Option<Tag>> {
  conn
    .query_row(
      &format!("SELECT {} FROM tags WHERE deck_id = ?1 AND name = ?2", TAG_COLUMNS),
      params![deck_id, name],
      row_to_tag,
    )
    .optional()
}

pub fn insert_tag(conn: &Connection, deck_id: i64, name: &str, now: DateTime<Utc>) -> Result<Tag> {
  conn.execute(
    "INSERT INTO tags (deck_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
    params![deck_id, name, timestamp(now)],
  )?;
  let id = conn.last_insert_rowid();
  get_tag(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Rename a tag and optionally move it to another deck. Cards of the old deck
/// are detached on a move since a card's tag must share its deck.
pub fn update_tag(
  conn: &Connection,
  id: i64,
  name: &str,
  deck_id: Option<i64>,
  now: DateTime<Utc>,
) -> Result<bool> {
  let tx = conn.unchecked_transaction()?;
  let changed = tx.execute(
    "UPDATE tags SET name = ?2, deck_id = COALESCE(?3, deck_id), updated_at = ?4 WHERE id = ?1",
    params![id, name, deck_id, timestamp(now)],
  )?;
  if changed > 0 && deck_id.is_some() {
    tx.execute(
      "UPDATE cards SET tag_id = NULL
       WHERE tag_id = ?1 AND deck_id != (SELECT deck_id FROM tags WHERE id = ?1)",
      params![id],
    )?;
  }
  tx.commit()?;
  Ok(changed > 0)
}

/// Delete a tag. Its cards are detached, or deleted with it when `delete_cards` is set.
pub fn delete_tag(conn: &Connection, id: i64, delete_cards: bool) -> Result<bool> {
  let tx = conn.unchecked_transaction()?;
  if delete_cards {
    tx.execute("DELETE FROM cards WHERE tag_id = ?1", params![id])?;
  }
  let deleted = tx.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
  tx.commit()?;
  Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{cards, decks};
  use crate::testing::test_conn;

  #[test]
  fn test_insert_and_list_by_deck() {
    let conn = test_conn();
    let go = decks::insert_deck(&conn, "Go", Utc::now()).unwrap();
    let rust = decks::insert_deck(&conn, "Rust", Utc::now()).unwrap();
    insert_tag(&conn, go.id, "basics", Utc::now()).unwrap();
    insert_tag(&conn, rust.id, "basics", Utc::now()).unwrap();
    insert_tag(&conn, go.id, "channels", Utc::now()).unwrap();

    let go_tags: Vec<_> = list_tags_by_deck(&conn, go.id)
      .unwrap()
      .into_iter()
      .map(|t| t.name)
      .collect();
    assert_eq!(go_tags, vec!["basics", "channels"]);
    assert_eq!(list_tags(&conn).unwrap().len(), 3);
  }

  #[test]
  fn test_duplicate_name_within_deck_rejected() {
    let conn = test_conn();
    let go = decks::insert_deck(&conn, "Go", Utc::now()).unwrap();
    insert_tag(&conn, go.id, "basics", Utc::now()).unwrap();
    assert!(insert_tag(&conn, go.id, "basics", Utc::now()).is_err());
  }

  #[test]
  fn test_unknown_deck_rejected() {
    let conn = test_conn();
    assert!(insert_tag(&conn, 42, "basics", Utc::now()).is_err());
  }

  #[test]
  fn test_delete_detaches_cards_by_default() {
    let conn = test_conn();
    let go = decks::insert_deck(&conn, "Go", Utc::now()).unwrap();
    let tag = insert_tag(&conn, go.id, "basics", Utc::now()).unwrap();
    let card = cards::insert_card(&conn, go.id, Some(tag.id), "q", "a", Utc::now()).unwrap();

    assert!(delete_tag(&conn, tag.id, false).unwrap());
    let card = cards::get_card(&conn, card.id).unwrap().unwrap();
    assert_eq!(card.tag_id, None);
  }

  #[test]
  fn test_delete_with_cards() {
    let conn = test_conn();
    let go = decks::insert_deck(&conn, "Go", Utc::now()).unwrap();
    let tag = insert_tag(&conn, go.id, "basics", Utc::now()).unwrap();
    let tagged = cards::insert_card(&conn, go.id, Some(tag.id), "q", "a", Utc::now()).unwrap();
    let loose = cards::insert_card(&conn, go.id, None, "q2", "a2", Utc::now()).unwrap();

    assert!(delete_tag(&conn, tag.id, true).unwrap());
    assert!(cards::get_card(&conn, tagged.id).unwrap().is_none());
    assert!(cards::get_card(&conn, loose.id).unwrap().is_some());
  }

  #[test]
  fn test_move_to_other_deck_detaches_cards() {
    let conn = test_conn();
    let go = decks::insert_deck(&conn, "Go", Utc::now()).unwrap();
    let rust = decks::insert_deck(&conn, "Rust", Utc::now()).unwrap();
    let tag = insert_tag(&conn, go.id, "basics", Utc::now()).unwrap();
    let card = cards::insert_card(&conn, go.id, Some(tag.id), "q", "a", Utc::now()).unwrap();

    assert!(update_tag(&conn, tag.id, "basics", Some(rust.id), Utc::now()).unwrap());
    assert_eq!(get_tag(&conn, tag.id).unwrap().unwrap().deck_id, rust.id);
    assert_eq!(cards::get_card(&conn, card.id).unwrap().unwrap().tag_id, None);
  }

  #[test]
  fn test_rename_keeps_cards() {
    let conn = test_conn();
    let go = decks::insert_deck(&conn, "Go", Utc::now()).unwrap();
    let tag = insert_tag(&conn, go.id, "basics", Utc::now()).unwrap();
    let card = cards::insert_card(&conn, go.id, Some(tag.id), "q", "a", Utc::now()).unwrap();

    assert!(update_tag(&conn, tag.id, "fundamentals", None, Utc::now()).unwrap());
    assert_eq!(get_tag(&conn, tag.id).unwrap().unwrap().name, "fundamentals");
    assert_eq!(cards::get_card(&conn, card.id).unwrap().unwrap().tag_id, Some(tag.id));
    assert!(!update_tag(&conn, 999, "x", None, Utc::now()).unwrap());
  }
}
