//! Tag routes. A tag always belongs to exactly one deck.

use axum::extract::{rejection::JsonRejection, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

use super::{is_truthy, json_body, StatsQuery};
use crate::db::{self, decks, stats, tags};
use crate::domain::{CreateTag, Tag, TagStats, TagWithStats, UpdateTag};
use crate::error::{AppError, Result};
use crate::response::{self, Reply};
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Default, Deserialize)]
pub struct DeleteTagQuery {
  pub delete_cards: Option<String>,
}

fn with_stats(conn: &Connection, rows: Vec<Tag>, include: bool) -> Result<serde_json::Value> {
  let value = if include {
    let now = Utc::now();
    let rows = rows
      .into_iter()
      .map(|tag| {
        let stats = stats::tag_stats(conn, tag.id, now)?;
        Ok(TagWithStats { tag, stats })
      })
      .collect::<rusqlite::Result<Vec<_>>>()?;
    serde_json::to_value(rows)
  } else {
    serde_json::to_value(rows)
  };
  value.map_err(|e| AppError::Internal(e.to_string()))
}

fn ensure_deck(conn: &Connection, deck_id: i64) -> Result<()> {
  match decks::get_deck(conn, deck_id)? {
    Some(_) => Ok(()),
    None => Err(AppError::not_found("deck")),
  }
}

// ============================================================================
// Queries
// ============================================================================

pub async fn list_tags(
  State(state): State<AppState>,
  Query(query): Query<StatsQuery>,
) -> Result<Reply<serde_json::Value>> {
  let conn = db::try_lock(&state.db)?;
  let rows = tags::list_tags(&conn)?;
  Ok(response::success(with_stats(&conn, rows, query.enabled())?))
}

pub async fn tags_by_deck(
  State(state): State<AppState>,
  Path(deck_id): Path<String>,
  Query(query): Query<StatsQuery>,
) -> Result<Reply<serde_json::Value>> {
  let deck_id = validation::parse_id(&deck_id, "deck")?;
  let conn = db::try_lock(&state.db)?;
  ensure_deck(&conn, deck_id)?;
  let rows = tags::list_tags_by_deck(&conn, deck_id)?;
  Ok(response::success(with_stats(&conn, rows, query.enabled())?))
}

pub async fn get_tag(State(state): State<AppState>, Path(id): Path<String>) -> Result<Reply<Tag>> {
  let id = validation::parse_id(&id, "tag")?;
  let conn = db::try_lock(&state.db)?;
  let tag = tags::get_tag(&conn, id)?.ok_or_else(|| AppError::not_found("tag"))?;
  Ok(response::success(tag))
}

pub async fn tag_stats(State(state): State<AppState>, Path(id): Path<String>) -> Result<Reply<TagStats>> {
  let id = validation::parse_id(&id, "tag")?;
  let conn = db::try_lock(&state.db)?;
  if tags::get_tag(&conn, id)?.is_none() {
    return Err(AppError::not_found("tag"));
  }
  Ok(response::success(stats::tag_stats(&conn, id, Utc::now())?))
}

// ============================================================================
// Mutations
// ============================================================================

pub async fn create_tag(
  State(state): State<AppState>,
  body: std::result::Result<Json<CreateTag>, JsonRejection>,
) -> Result<(StatusCode, Reply<Tag>)> {
  let input = json_body(body)?;
  let name = validation::tag_name(&input.name)?;

  let conn = db::try_lock(&state.db)?;
  ensure_deck(&conn, input.deck_id)?;
  if tags::find_tag_by_name(&conn, input.deck_id, &name)?.is_some() {
    return Err(AppError::conflict(format!("tag '{}' already exists in this deck", name)));
  }
  let tag = tags::insert_tag(&conn, input.deck_id, &name, Utc::now())?;
  Ok(response::created(tag, "tag created"))
}

/// Rename a tag, optionally moving it to another deck.
pub async fn update_tag(
  State(state): State<AppState>,
  Path(id): Path<String>,
  body: std::result::Result<Json<UpdateTag>, JsonRejection>,
) -> Result<Reply<Tag>> {
  let id = validation::parse_id(&id, "tag")?;
  let input = json_body(body)?;
  let name = validation::tag_name(&input.name)?;

  let conn = db::try_lock(&state.db)?;
  let current = tags::get_tag(&conn, id)?.ok_or_else(|| AppError::not_found("tag"))?;
  let target_deck = input.deck_id.unwrap_or(current.deck_id);
  if input.deck_id.is_some() {
    ensure_deck(&conn, target_deck)?;
  }
  if let Some(existing) = tags::find_tag_by_name(&conn, target_deck, &name)? {
    if existing.id != id {
      return Err(AppError::conflict(format!("tag '{}' already exists in this deck", name)));
    }
  }

  tags::update_tag(&conn, id, &name, input.deck_id, Utc::now())?;
  let tag = tags::get_tag(&conn, id)?.ok_or_else(|| AppError::not_found("tag"))?;
  Ok(response::success(tag))
}

/// Delete a tag. Its cards lose the tag unless `?delete_cards=true`.
pub async fn delete_tag(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Query(query): Query<DeleteTagQuery>,
) -> Result<Reply<()>> {
  let id = validation::parse_id(&id, "tag")?;
  let delete_cards = is_truthy(query.delete_cards.as_deref());
  let conn = db::try_lock(&state.db)?;
  if !tags::delete_tag(&conn, id, delete_cards)? {
    return Err(AppError::not_found("tag"));
  }
  tracing::info!(tag_id = id, delete_cards, "Deleted tag");
  Ok(response::done("tag deleted"))
}
