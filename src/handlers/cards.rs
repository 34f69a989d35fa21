//! Card routes: CRUD plus paginated listing and search.

use axum::extract::{rejection::JsonRejection, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

use super::{json_body, PageQuery};
use crate::db::{self, cards, decks, tags};
use crate::domain::{CardPage, CardSearch, CardView, CreateCard, UpdateCard};
use crate::error::{AppError, Result};
use crate::response::{self, Reply};
use crate::state::AppState;
use crate::validation;

/// `GET /cards` filters. Ids stay text so a bad value is reported as 400.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
  pub deck_id: Option<String>,
  pub tag_id: Option<String>,
  pub keyword: Option<String>,
  #[serde(flatten)]
  pub page: PageQuery,
}

fn optional_id(raw: Option<&str>, what: &str) -> Result<Option<i64>> {
  raw
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(|v| validation::parse_id(v, what))
    .transpose()
}

/// A card's tag must exist and belong to the card's deck.
fn check_tag(conn: &Connection, deck_id: i64, tag_id: Option<i64>) -> Result<()> {
  let Some(tag_id) = tag_id else {
    return Ok(());
  };
  let tag = tags::get_tag(conn, tag_id)?.ok_or_else(|| AppError::not_found("tag"))?;
  if tag.deck_id != deck_id {
    return Err(AppError::invalid(format!(
      "tag {} does not belong to deck {}",
      tag_id, deck_id
    )));
  }
  Ok(())
}

fn card_view(conn: &Connection, id: i64) -> Result<CardView> {
  cards::get_card_view(conn, id, Utc::now())?.ok_or_else(|| AppError::not_found("card"))
}

fn page_of(conn: &Connection, search: &CardSearch, query: &PageQuery) -> Result<CardPage> {
  let page = query.pagination();
  let (rows, total) = cards::search_cards(conn, search, page, Utc::now())?;
  Ok(CardPage::new(rows, total, page))
}

// ============================================================================
// Queries
// ============================================================================

/// Search by deck, tag and keyword (substring of question or answer).
pub async fn search_cards(
  State(state): State<AppState>,
  Query(query): Query<SearchQuery>,
) -> Result<Reply<CardPage>> {
  let search = CardSearch {
    deck_id: optional_id(query.deck_id.as_deref(), "deck")?,
    tag_id: optional_id(query.tag_id.as_deref(), "tag")?,
    keyword: query.keyword.clone(),
  };
  let conn = db::try_lock(&state.db)?;
  Ok(response::success(page_of(&conn, &search, &query.page)?))
}

pub async fn cards_by_deck(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Query(query): Query<PageQuery>,
) -> Result<Reply<CardPage>> {
  let deck_id = validation::parse_id(&id, "deck")?;
  let conn = db::try_lock(&state.db)?;
  if decks::get_deck(&conn, deck_id)?.is_none() {
    return Err(AppError::not_found("deck"));
  }
  let search = CardSearch {
    deck_id: Some(deck_id),
    ..CardSearch::default()
  };
  Ok(response::success(page_of(&conn, &search, &query)?))
}

pub async fn cards_by_tag(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Query(query): Query<PageQuery>,
) -> Result<Reply<CardPage>> {
  let tag_id = validation::parse_id(&id, "tag")?;
  let conn = db::try_lock(&state.db)?;
  if tags::get_tag(&conn, tag_id)?.is_none() {
    return Err(AppError::not_found("tag"));
  }
  let search = CardSearch {
    tag_id: Some(tag_id),
    ..CardSearch::default()
  };
  Ok(response::success(page_of(&conn, &search, &query)?))
}

/// Card with its deck and tag names, review state and `due` flag
pub async fn get_card(State(state): State<AppState>, Path(id): Path<String>) -> Result<Reply<CardView>> {
  let id = validation::parse_id(&id, "card")?;
  let conn = db::try_lock(&state.db)?;
  Ok(response::success(card_view(&conn, id)?))
}

// ============================================================================
// Mutations
// ============================================================================

pub async fn create_card(
  State(state): State<AppState>,
  body: std::result::Result<Json<CreateCard>, JsonRejection>,
) -> Result<(StatusCode, Reply<CardView>)> {
  let input = json_body(body)?;
  let question = validation::card_text(&input.question, "question")?;
  let answer = validation::card_text(&input.answer, "answer")?;

  let conn = db::try_lock(&state.db)?;
  if decks::get_deck(&conn, input.deck_id)?.is_none() {
    return Err(AppError::not_found("deck"));
  }
  check_tag(&conn, input.deck_id, input.tag_id)?;

  let card = cards::insert_card(&conn, input.deck_id, input.tag_id, &question, &answer, Utc::now())?;
  Ok(response::created(card_view(&conn, card.id)?, "card created"))
}

/// Partial update. `"tag_id": null` clears the tag; moving a card to another
/// deck without naming a tag drops a tag that stays behind.
pub async fn update_card(
  State(state): State<AppState>,
  Path(id): Path<String>,
  body: std::result::Result<Json<UpdateCard>, JsonRejection>,
) -> Result<Reply<CardView>> {
  let id = validation::parse_id(&id, "card")?;
  let input = json_body(body)?;
  let question = input
    .question
    .as_deref()
    .map(|q| validation::card_text(q, "question"))
    .transpose()?;
  let answer = input
    .answer
    .as_deref()
    .map(|a| validation::card_text(a, "answer"))
    .transpose()?;

  let conn = db::try_lock(&state.db)?;
  let mut card = cards::get_card(&conn, id)?.ok_or_else(|| AppError::not_found("card"))?;

  if let Some(deck_id) = input.deck_id {
    if decks::get_deck(&conn, deck_id)?.is_none() {
      return Err(AppError::not_found("deck"));
    }
    if deck_id != card.deck_id && input.tag_id.is_none() {
      card.tag_id = None;
    }
    card.deck_id = deck_id;
  }
  if let Some(tag_id) = input.tag_id {
    card.tag_id = tag_id;
  }
  check_tag(&conn, card.deck_id, card.tag_id)?;
  if let Some(question) = question {
    card.question = question;
  }
  if let Some(answer) = answer {
    card.answer = answer;
  }

  cards::update_card(&conn, &card, Utc::now())?;
  Ok(response::success(card_view(&conn, id)?))
}

pub async fn delete_card(State(state): State<AppState>, Path(id): Path<String>) -> Result<Reply<()>> {
  let id = validation::parse_id(&id, "card")?;
  let conn = db::try_lock(&state.db)?;
  if !cards::delete_card(&conn, id)? {
    return Err(AppError::not_found("card"));
  }
  Ok(response::done("card deleted"))
}
