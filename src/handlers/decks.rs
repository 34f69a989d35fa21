//! Deck routes: CRUD, archive flag and per-deck statistics.

use axum::extract::{rejection::JsonRejection, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use super::{json_body, StatsQuery};
use crate::db::{self, decks, stats};
use crate::domain::{CreateDeck, Deck, DeckStats, DeckWithStats, UpdateDeck};
use crate::error::{AppError, Result};
use crate::response::{self, Reply};
use crate::state::AppState;
use crate::validation;

// ============================================================================
// Queries
// ============================================================================

/// List decks. Returns `DeckWithStats` rows when `?include_stats=true`.
pub async fn list_decks(
  State(state): State<AppState>,
  Query(query): Query<StatsQuery>,
) -> Result<Reply<serde_json::Value>> {
  let conn = db::try_lock(&state.db)?;
  let all = decks::list_decks(&conn)?;

  let data = if query.enabled() {
    let now = Utc::now();
    let rows = all
      .into_iter()
      .map(|deck| {
        let stats = stats::deck_stats(&conn, deck.id, now)?;
        Ok(DeckWithStats { deck, stats })
      })
      .collect::<rusqlite::Result<Vec<_>>>()?;
    serde_json::to_value(rows)
  } else {
    serde_json::to_value(all)
  }
  .map_err(|e| AppError::Internal(e.to_string()))?;

  Ok(response::success(data))
}

pub async fn get_deck(State(state): State<AppState>, Path(id): Path<String>) -> Result<Reply<Deck>> {
  let id = validation::parse_id(&id, "deck")?;
  let conn = db::try_lock(&state.db)?;
  let deck = decks::get_deck(&conn, id)?.ok_or_else(|| AppError::not_found("deck"))?;
  Ok(response::success(deck))
}

pub async fn deck_stats(
  State(state): State<AppState>,
  Path(id): Path<String>,
) -> Result<Reply<DeckStats>> {
  let id = validation::parse_id(&id, "deck")?;
  let conn = db::try_lock(&state.db)?;
  if decks::get_deck(&conn, id)?.is_none() {
    return Err(AppError::not_found("deck"));
  }
  Ok(response::success(stats::deck_stats(&conn, id, Utc::now())?))
}

// ============================================================================
// Mutations
// ============================================================================

pub async fn create_deck(
  State(state): State<AppState>,
  body: std::result::Result<Json<CreateDeck>, JsonRejection>,
) -> Result<(StatusCode, Reply<Deck>)> {
  let input = json_body(body)?;
  let name = validation::deck_name(&input.name)?;

  let conn = db::try_lock(&state.db)?;
  if decks::deck_name_taken(&conn, &name)? {
    return Err(AppError::conflict(format!("deck '{}' already exists", name)));
  }
  let deck = decks::insert_deck(&conn, &name, Utc::now())?;
  tracing::info!("Created deck {} ({})", deck.id, deck.name);
  Ok(response::created(deck, "deck created"))
}

/// Rename and/or archive a deck. At least one field is required.
pub async fn update_deck(
  State(state): State<AppState>,
  Path(id): Path<String>,
  body: std::result::Result<Json<UpdateDeck>, JsonRejection>,
) -> Result<Reply<Deck>> {
  let id = validation::parse_id(&id, "deck")?;
  let input = json_body(body)?;
  if input.is_empty() {
    return Err(AppError::invalid("nothing to update"));
  }
  let name = input.name.as_deref().map(validation::deck_name).transpose()?;

  let conn = db::try_lock(&state.db)?;
  let current = decks::get_deck(&conn, id)?.ok_or_else(|| AppError::not_found("deck"))?;
  if let Some(name) = name.as_deref() {
    if name != current.name && decks::deck_name_taken(&conn, name)? {
      return Err(AppError::conflict(format!("deck '{}' already exists", name)));
    }
  }

  decks::update_deck(&conn, id, name.as_deref(), input.archived, Utc::now())?;
  let deck = decks::get_deck(&conn, id)?.ok_or_else(|| AppError::not_found("deck"))?;
  Ok(response::success(deck))
}

/// Delete a deck with all of its tags, cards and review history.
pub async fn delete_deck(State(state): State<AppState>, Path(id): Path<String>) -> Result<Reply<()>> {
  let id = validation::parse_id(&id, "deck")?;
  let conn = db::try_lock(&state.db)?;
  if !decks::delete_deck(&conn, id)? {
    return Err(AppError::not_found("deck"));
  }
  tracing::info!("Deleted deck {}", id);
  Ok(response::done("deck deleted"))
}
