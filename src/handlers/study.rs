//! Study session routes and review submission.

use axum::extract::{rejection::JsonRejection, Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::json_body;
use crate::config::{RANDOM_STUDY_LIMITS, STUDY_LIMITS};
use crate::db::{self, cards::CardScope};
use crate::domain::{ReviewOutcome, ReviewRequest, StudySession};
use crate::error::Result;
use crate::response::{self, Reply};
use crate::services::study;
use crate::state::AppState;
use crate::validation;

/// `?limit=`. Bad values fall back to the route's default.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
  pub limit: Option<String>,
}

impl LimitQuery {
  fn limit(&self, bounds: (i64, i64)) -> i64 {
    validation::clamp_limit(self.limit.as_deref(), bounds)
  }
}

pub async fn start_deck_study(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Query(query): Query<LimitQuery>,
) -> Result<Reply<StudySession>> {
  let deck_id = validation::parse_id(&id, "deck")?;
  let conn = db::try_lock(&state.db)?;
  let session = study::start_scoped_study(
    &conn,
    CardScope::Deck(deck_id),
    query.limit(STUDY_LIMITS),
    Utc::now(),
  )?;
  Ok(response::success(session))
}

pub async fn start_tag_study(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Query(query): Query<LimitQuery>,
) -> Result<Reply<StudySession>> {
  let tag_id = validation::parse_id(&id, "tag")?;
  let conn = db::try_lock(&state.db)?;
  let session = study::start_scoped_study(
    &conn,
    CardScope::Tag(tag_id),
    query.limit(STUDY_LIMITS),
    Utc::now(),
  )?;
  Ok(response::success(session))
}

pub async fn start_random_study(
  State(state): State<AppState>,
  Query(query): Query<LimitQuery>,
) -> Result<Reply<StudySession>> {
  let conn = db::try_lock(&state.db)?;
  let session = study::start_random_study(&conn, query.limit(RANDOM_STUDY_LIMITS), Utc::now())?;
  Ok(response::success(session))
}

pub async fn due_cards(
  State(state): State<AppState>,
  Query(query): Query<LimitQuery>,
) -> Result<Reply<StudySession>> {
  let conn = db::try_lock(&state.db)?;
  let session = study::due_cards(&conn, query.limit(STUDY_LIMITS), Utc::now())?;
  Ok(response::success(session))
}

/// Record a recall result (0 = again, 1 = hard, 2 = good).
pub async fn submit_review(
  State(state): State<AppState>,
  Path(id): Path<String>,
  body: std::result::Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Reply<ReviewOutcome>> {
  let card_id = validation::parse_id(&id, "card")?;
  let request = json_body(body)?;
  let conn = db::try_lock(&state.db)?;
  let outcome = study::submit_review(&conn, card_id, request.result, Utc::now())?;
  let message = outcome.message.clone();
  Ok(Json(response::ApiResponse::with_message(outcome, message)))
}
