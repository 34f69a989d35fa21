use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result, Row};

use super::{time_column, timestamp};
use crate::domain::{is_card_due, Card, CardSearch, CardView, Pagination, Review, StudyItem};

const CARD_COLUMNS: &str = "id, deck_id, tag_id, question, answer, created_at, updated_at";

/// Card columns followed by deck name, tag name and the review row.
const VIEW_SELECT: &str = "SELECT c.id, c.deck_id, c.tag_id, c.question, c.answer, c.created_at, c.updated_at,
         d.name, t.name,
         r.id, r.e_factor, r.interval_days, r.repetitions, r.next_review, r.created_at, r.updated_at
  FROM cards c
  JOIN decks d ON d.id = c.deck_id
  LEFT JOIN tags t ON t.id = c.tag_id
  LEFT JOIN reviews r ON r.card_id = c.id";

const STUDY_SELECT: &str = "SELECT c.id, c.question, c.answer, d.name, t.name
  FROM cards c
  JOIN decks d ON d.id = c.deck_id
  LEFT JOIN tags t ON t.id = c.tag_id
  LEFT JOIN reviews r ON r.card_id = c.id";

/// Which cards a study queue is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardScope {
  Deck(i64),
  Tag(i64),
}

fn row_to_card(row: &Row<'_>) -> Result<Card> {
  Ok(Card {
    id: row.get(0)?,
    deck_id: row.get(1)?,
    tag_id: row.get(2)?,
    question: row.get(3)?,
    answer: row.get(4)?,
    created_at: time_column(row, 5)?,
    updated_at: time_column(row, 6)?,
  })
}

fn row_to_view(row: &Row<'_>, now: DateTime<Utc>) -> Result<CardView> {
  let card = row_to_card(row)?;
  let review_id: Option<i64> = row.get(9)?;
  let review = match review_id {
    Some(id) => Some(Review {
      id,
      card_id: card.id,
      e_factor: row.get(10)?,
      interval: row.get(11)?,
      repetitions: row.get(12)?,
      next_review: time_column(row, 13)?,
      created_at: time_column(row, 14)?,
      updated_at: time_column(row, 15)?,
    }),
    None => None,
  };
  Ok(CardView {
    due: is_card_due(review.as_ref(), now),
    deck_name: row.get(7)?,
    tag_name: row.get(8)?,
    card,
    review,
  })
}

fn row_to_study_item(row: &Row<'_>) -> Result<StudyItem> {
  Ok(StudyItem {
    card_id: row.get(0)?,
    question: row.get(1)?,
    answer: row.get(2)?,
    deck_name: row.get(3)?,
    tag_name: row.get(4)?,
  })
}

pub fn insert_card(
  conn: &Connection,
  deck_id: i64,
  tag_id: Option<i64>,
  question: &str,
  answer: &str,
  now: DateTime<Utc>,
) -> Result<Card> {
  conn.execute(
    "INSERT INTO cards (deck_id, tag_id, question, answer, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    params![deck_id, tag_id, question, answer, timestamp(now)],
  )?;
  let id = conn.last_insert_rowid();
  get_card(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get_card(conn: &Connection, id: i64) -> Result<Option<Card>> {
  conn
    .query_row(
      &format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS),
      params![id],
      row_to_card,
    )
    .optional()
}

pub fn get_card_view(conn: &Connection, id: i64, now: DateTime<Utc>) -> Result<Option<CardView>> {
  conn
    .query_row(&format!("{} WHERE c.id = ?1", VIEW_SELECT), params![id], |row| {
      row_to_view(row, now)
    })
    .optional()
}

/// Store the card's deck, tag, question and answer as given.
pub fn update_card(conn: &Connection, card: &Card, now: DateTime<Utc>) -> Result<bool> {
  let changed = conn.execute(
    "UPDATE cards SET deck_id = ?2, tag_id = ?3, question = ?4, answer = ?5, updated_at = ?6
     WHERE id = ?1",
    params![
      card.id,
      card.deck_id,
      card.tag_id,
      card.question,
      card.answer,
      timestamp(now)
    ],
  )?;
  Ok(changed > 0)
}

pub fn delete_card(conn: &Connection, id: i64) -> Result<bool> {
  let deleted = conn.execute("DELETE FROM cards WHERE id = ?1", params![id])?;
  Ok(deleted > 0)
}

/// Escape LIKE wildcards so the keyword matches literally.
fn like_pattern(keyword: &str) -> String {
  let escaped = keyword
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_");
  format!("%{}%", escaped)
}

/// One page of cards matching the filters, newest first, and the total match count.
pub fn search_cards(
  conn: &Connection,
  search: &CardSearch,
  page: Pagination,
  now: DateTime<Utc>,
) -> Result<(Vec<CardView>, i64)> {
  let mut clauses: Vec<&str> = Vec::new();
  let mut args: Vec<Box<dyn ToSql>> = Vec::new();

  if let Some(deck_id) = search.deck_id {
    args.push(Box::new(deck_id));
    clauses.push("c.deck_id = ?");
  }
  if let Some(tag_id) = search.tag_id {
    args.push(Box::new(tag_id));
    clauses.push("c.tag_id = ?");
  }
  if let Some(keyword) = search.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
    let pattern = like_pattern(keyword);
    args.push(Box::new(pattern.clone()));
    args.push(Box::new(pattern));
    clauses.push("(c.question LIKE ? ESCAPE '\\' OR c.answer LIKE ? ESCAPE '\\')");
  }

  let filter = if clauses.is_empty() {
    String::new()
  } else {
    format!(" WHERE {}", clauses.join(" AND "))
  };

  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM cards c{}", filter),
    params_from_iter(args.iter()),
    |row| row.get(0),
  )?;

  args.push(Box::new(page.page_size));
  args.push(Box::new(page.offset()));
  let mut stmt = conn.prepare(&format!(
    "{}{} ORDER BY c.created_at DESC, c.id DESC LIMIT ? OFFSET ?",
    VIEW_SELECT, filter
  ))?;
  let cards = stmt
    .query_map(params_from_iter(args.iter()), |row| row_to_view(row, now))?
    .collect::<Result<Vec<_>>>()?;

  Ok((cards, total))
}

/// Every card of a deck with its tag name, in creation order
pub fn deck_cards_with_tags(conn: &Connection, deck_id: i64) -> Result<Vec<(Card, Option<String>)>> {
  let mut stmt = conn.prepare(
    "SELECT c.id, c.deck_id, c.tag_id, c.question, c.answer, c.created_at, c.updated_at, t.name
     FROM cards c LEFT JOIN tags t ON t.id = c.tag_id
     WHERE c.deck_id = ?1
     ORDER BY c.id",
  )?;
  let cards = stmt
    .query_map(params![deck_id], |row| Ok((row_to_card(row)?, row.get(7)?)))?
    .collect::<Result<Vec<_>>>()?;
  Ok(cards)
}

/// Due cards of active decks: new cards first, then the longest overdue.
pub fn due_study_items(conn: &Connection, now: DateTime<Utc>, limit: i64) -> Result<Vec<StudyItem>> {
  let mut stmt = conn.prepare(&format!(
    "{} WHERE d.archived = 0 AND (r.id IS NULL OR r.next_review <= ?1)
     ORDER BY r.id IS NOT NULL, r.next_review, c.id
     LIMIT ?2",
    STUDY_SELECT
  ))?;
  let items = stmt
    .query_map(params![timestamp(now), limit], row_to_study_item)?
    .collect::<Result<Vec<_>>>()?;
  Ok(items)
}

/// Up to `limit` cards of a deck or tag: due cards first, then the rest by
/// how soon they come due.
pub fn scoped_study_items(
  conn: &Connection,
  scope: CardScope,
  now: DateTime<Utc>,
  limit: i64,
) -> Result<Vec<StudyItem>> {
  let (filter, id) = match scope {
    CardScope::Deck(id) => ("c.deck_id = ?1", id),
    CardScope::Tag(id) => ("c.tag_id = ?1", id),
  };
  let mut stmt = conn.prepare(&format!(
    "{} WHERE {}
     ORDER BY CASE WHEN r.id IS NULL THEN 0 WHEN r.next_review <= ?2 THEN 1 ELSE 2 END,
              r.next_review, c.id
     LIMIT ?3",
    STUDY_SELECT, filter
  ))?;
  let items = stmt
    .query_map(params![id, timestamp(now), limit], row_to_study_item)?
    .collect::<Result<Vec<_>>>()?;
  Ok(items)
}

/// Random cards from active decks
pub fn random_study_items(conn: &Connection, limit: i64) -> Result<Vec<StudyItem>> {
  let mut stmt = conn.prepare(&format!(
    "{} WHERE d.archived = 0 ORDER BY RANDOM() LIMIT ?1",
    STUDY_SELECT
  ))?;
  let items = stmt
    .query_map(params![limit], row_to_study_item)?
    .collect::<Result<Vec<_>>>()?;
  Ok(items)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{decks, reviews, tags};
  use crate::testing::test_conn;
  use chrono::Duration;

  fn search(deck_id: Option<i64>, tag_id: Option<i64>, keyword: Option<&str>) -> CardSearch {
    CardSearch {
      deck_id,
      tag_id,
      keyword: keyword.map(String::from),
    }
  }

  fn first_page() -> Pagination {
    Pagination::new(None, None, 20, 100)
  }

  #[test]
  fn test_new_card_view_is_due() {
    let conn = test_conn();
    let deck = decks::insert_deck(&conn, "Go", Utc::now()).unwrap();
    let card = insert_card(&conn, deck.id, None, "Go问题", "Go答案", Utc::now()).unwrap();

    let view = get_card_view(&conn, card.id, Utc::now()).unwrap().unwrap();
    assert!(view.due);
    assert!(view.review.is_none());
    assert_eq!(view.deck_name, "Go");
    assert_eq!(view.card.question, "Go问题");
  }

  #[test]
  fn test_view_includes_review_and_tag() {
    let conn = test_conn();
    let now = Utc::now();
    let deck = decks::insert_deck(&conn, "Go", now).unwrap();
    let tag = tags::insert_tag(&conn, deck.id, "basics", now).unwrap();
    let card = insert_card(&conn, deck.id, Some(tag.id), "q", "a", now).unwrap();
    reviews::upsert_review(&conn, card.id, 2.5, 6, 2, now + Duration::days(6), now).unwrap();

    let view = get_card_view(&conn, card.id, now).unwrap().unwrap();
    assert!(!view.due);
    assert_eq!(view.tag_name.as_deref(), Some("basics"));
    assert_eq!(view.review.unwrap().interval, 6);
  }

  #[test]
  fn test_search_filters_and_paginates() {
    let conn = test_conn();
    let now = Utc::now();
    let go = decks::insert_deck(&conn, "Go", now).unwrap();
    let rust = decks::insert_deck(&conn, "Rust", now).unwrap();
    for i in 0..25 {
      insert_card(&conn, go.id, None, &format!("goroutine {}", i), "a", now).unwrap();
    }
    insert_card(&conn, rust.id, None, "borrow", "checker", now).unwrap();

    let (cards, total) = search_cards(&conn, &search(Some(go.id), None, None), first_page(), now).unwrap();
    assert_eq!(total, 25);
    assert_eq!(cards.len(), 20);
    // Newest first
    assert_eq!(cards[0].card.question, "goroutine 24");

    let page2 = Pagination::new(Some(2), None, 20, 100);
    let (cards, _) = search_cards(&conn, &search(Some(go.id), None, None), page2, now).unwrap();
    assert_eq!(cards.len(), 5);

    let (cards, total) = search_cards(&conn, &search(None, None, Some("check")), first_page(), now).unwrap();
    assert_eq!(total, 1);
    assert_eq!(cards[0].card.question, "borrow");
  }

  #[test]
  fn test_search_keyword_is_literal() {
    let conn = test_conn();
    let now = Utc::now();
    let deck = decks::insert_deck(&conn, "SQL", now).unwrap();
    insert_card(&conn, deck.id, None, "100% sure", "a", now).unwrap();
    insert_card(&conn, deck.id, None, "1000 rows", "a", now).unwrap();

    let (_, total) = search_cards(&conn, &search(None, None, Some("0%")), first_page(), now).unwrap();
    assert_eq!(total, 1);
  }

  #[test]
  fn test_search_by_tag() {
    let conn = test_conn();
    let now = Utc::now();
    let deck = decks::insert_deck(&conn, "Go", now).unwrap();
    let tag = tags::insert_tag(&conn, deck.id, "basics", now).unwrap();
    insert_card(&conn, deck.id, Some(tag.id), "q1", "a", now).unwrap();
    insert_card(&conn, deck.id, None, "q2", "a", now).unwrap();

    let (cards, total) = search_cards(&conn, &search(None, Some(tag.id), None), first_page(), now).unwrap();
    assert_eq!(total, 1);
    assert_eq!(cards[0].card.question, "q1");
  }

  #[test]
  fn test_update_and_delete() {
    let conn = test_conn();
    let deck = decks::insert_deck(&conn, "Go", Utc::now()).unwrap();
    let mut card = insert_card(&conn, deck.id, None, "q", "a", Utc::now()).unwrap();
    card.answer = "better answer".into();
    assert!(update_card(&conn, &card, Utc::now()).unwrap());
    assert_eq!(get_card(&conn, card.id).unwrap().unwrap().answer, "better answer");

    assert!(delete_card(&conn, card.id).unwrap());
    assert!(!delete_card(&conn, card.id).unwrap());
  }

  #[test]
  fn test_deck_delete_cascades() {
    let conn = test_conn();
    let now = Utc::now();
    let deck = decks::insert_deck(&conn, "Go", now).unwrap();
    let tag = tags::insert_tag(&conn, deck.id, "basics", now).unwrap();
    let card = insert_card(&conn, deck.id, Some(tag.id), "q", "a", now).unwrap();
    reviews::upsert_review(&conn, card.id, 2.5, 1, 1, now, now).unwrap();
    reviews::insert_review_log(&conn, card.id, crate::domain::ReviewResult::Good, 1, 2.5, now).unwrap();

    assert!(decks::delete_deck(&conn, deck.id).unwrap());
    let remaining: i64 = conn
      .query_row(
        "SELECT (SELECT COUNT(*) FROM tags) + (SELECT COUNT(*) FROM cards)
              + (SELECT COUNT(*) FROM reviews) + (SELECT COUNT(*) FROM review_logs)",
        [],
        |row| row.get(0),
      )
      .unwrap();
    assert_eq!(remaining, 0);
  }

  #[test]
  fn test_due_items_skip_archived_and_future() {
    let conn = test_conn();
    let now = Utc::now();
    let active = decks::insert_deck(&conn, "Go", now).unwrap();
    let archived = decks::insert_deck(&conn, "Old", now).unwrap();
    decks::update_deck(&conn, archived.id, None, Some(true), now).unwrap();

    let overdue = insert_card(&conn, active.id, None, "overdue", "a", now).unwrap();
    reviews::upsert_review(&conn, overdue.id, 2.5, 1, 1, now - Duration::days(2), now).unwrap();
    let future = insert_card(&conn, active.id, None, "future", "a", now).unwrap();
    reviews::upsert_review(&conn, future.id, 2.5, 6, 2, now + Duration::days(3), now).unwrap();
    insert_card(&conn, active.id, None, "new", "a", now).unwrap();
    insert_card(&conn, archived.id, None, "archived", "a", now).unwrap();

    let questions: Vec<_> = due_study_items(&conn, now, 20)
      .unwrap()
      .into_iter()
      .map(|i| i.question)
      .collect();
    assert_eq!(questions, vec!["new", "overdue"]);
  }

  #[test]
  fn test_scoped_items_put_due_first() {
    let conn = test_conn();
    let now = Utc::now();
    let deck = decks::insert_deck(&conn, "Go", now).unwrap();
    let future = insert_card(&conn, deck.id, None, "future", "a", now).unwrap();
    reviews::upsert_review(&conn, future.id, 2.5, 6, 2, now + Duration::days(3), now).unwrap();
    insert_card(&conn, deck.id, None, "new", "a", now).unwrap();

    let items = scoped_study_items(&conn, CardScope::Deck(deck.id), now, 1).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].question, "new");

    let items = scoped_study_items(&conn, CardScope::Deck(deck.id), now, 10).unwrap();
    assert_eq!(items.len(), 2);
  }

  #[test]
  fn test_random_items_respect_limit() {
    let conn = test_conn();
    let now = Utc::now();
    let deck = decks::insert_deck(&conn, "Go", now).unwrap();
    for i in 0..5 {
      insert_card(&conn, deck.id, None, &format!("q{}", i), "a", now).unwrap();
    }
    assert_eq!(random_study_items(&conn, 3).unwrap().len(), 3);
    assert_eq!(random_study_items(&conn, 50).unwrap().len(), 5);
  }
}
