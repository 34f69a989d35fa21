//! Liveness checks and whole-database administration.

use axum::extract::{multipart::MultipartRejection, Multipart, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::is_truthy;
use super::transfer::{attachment, read_upload};
use crate::config::{APP_VERSION, MAX_RESTORE_BYTES};
use crate::db::{self, system};
use crate::domain::{RestoreCounts, SystemStats};
use crate::error::{AppError, Result};
use crate::paths;
use crate::response::{self, Reply};
use crate::services::backup;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RestoreQuery {
  pub clear_existing: Option<String>,
}

pub async fn health() -> Reply<&'static str> {
  response::success("ok")
}

pub async fn ping() -> Reply<&'static str> {
  response::success("pong")
}

pub async fn system_stats(State(state): State<AppState>) -> Result<Reply<SystemStats>> {
  let conn = db::try_lock(&state.db)?;
  let (total_decks, total_cards, total_tags, total_reviews) = system::table_counts(&conn)?;
  Ok(response::success(SystemStats {
    total_decks,
    total_cards,
    total_tags,
    total_reviews,
    version: APP_VERSION.to_string(),
  }))
}

/// Download every table as one JSON file.
pub async fn backup(State(state): State<AppState>) -> Result<Response> {
  let now = Utc::now();
  let data = {
    let conn = db::try_lock(&state.db)?;
    backup::build_backup(&conn, now)?
  };
  let body = serde_json::to_vec_pretty(&data).map_err(|e| AppError::Internal(e.to_string()))?;
  tracing::info!(
    "Backup created: {} decks, {} cards",
    data.decks.len(),
    data.cards.len()
  );
  Ok(attachment(&paths::backup_file_name(now), "application/json", body))
}

/// Restore a backup upload. Existing data is wiped first unless
/// `?clear_existing=false`.
pub async fn restore(
  State(state): State<AppState>,
  Query(query): Query<RestoreQuery>,
  multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Reply<RestoreCounts>> {
  let clear_existing = query
    .clear_existing
    .as_deref()
    .is_none_or(|v| is_truthy(Some(v)));
  let (_, bytes) = read_upload(multipart, MAX_RESTORE_BYTES).await?;
  let data = backup::parse_backup(&bytes)?;

  let conn = db::try_lock(&state.db)?;
  let counts = backup::restore(&conn, data, clear_existing)?;
  Ok(Json(response::ApiResponse::with_message(counts, "backup restored")))
}

/// Delete all data and reset id counters.
pub async fn clear(State(state): State<AppState>) -> Result<Reply<()>> {
  let conn = db::try_lock(&state.db)?;
  let tx = conn.unchecked_transaction()?;
  system::clear_all(&tx)?;
  tx.commit()?;
  tracing::warn!("All data cleared");
  Ok(response::done("all data cleared"))
}

#[cfg(test)]
mod tests {
  use crate::testing::TestEnv;
  use axum::http::{header, StatusCode};
  use axum_test::multipart::{MultipartForm, Part};
  use axum_test::TestServer;
  use serde_json::{json, Value};

  async fn seed(server: &TestServer) {
    server.post("/api/v1/decks").json(&json!({"name": "Go"})).await;
    server
      .post("/api/v1/tags")
      .json(&json!({"deck_id": 1, "name": "basics"}))
      .await;
    server
      .post("/api/v1/cards")
      .json(&json!({"deck_id": 1, "tag_id": 1, "question": "Go问题", "answer": "Go答案"}))
      .await;
    server
      .post("/api/v1/study/review/1")
      .json(&json!({"result": 2}))
      .await
      .assert_status_ok();
  }

  fn backup_form(bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(bytes).file_name("backup.json"))
  }

  #[tokio::test]
  async fn test_stats() {
    let env = TestEnv::new();
    let server = env.server();
    seed(&server).await;

    let body: Value = server.get("/api/v1/system/stats").await.json();
    assert_eq!(body["data"]["total_decks"], 1);
    assert_eq!(body["data"]["total_cards"], 1);
    assert_eq!(body["data"]["total_tags"], 1);
    assert_eq!(body["data"]["total_reviews"], 1);
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
  }

  #[tokio::test]
  async fn test_backup_clear_restore() {
    let env = TestEnv::new();
    let server = env.server();
    seed(&server).await;

    let res = server.get("/api/v1/system/backup").await;
    res.assert_status_ok();
    let disposition = res.header(header::CONTENT_DISPOSITION);
    assert!(disposition
      .to_str()
      .unwrap()
      .contains("flashmind_complete_backup_"));
    let bytes = res.as_bytes().to_vec();
    let backup: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(backup["version"], "1.0.0");

    server.delete("/api/v1/system/clear").await.assert_status_ok();
    let body: Value = server.get("/api/v1/system/stats").await.json();
    assert_eq!(body["data"]["total_decks"], 0);

    let res = server
      .post("/api/v1/system/restore")
      .multipart(backup_form(bytes))
      .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["data"], json!({"decks": 1, "tags": 1, "cards": 1, "reviews": 1}));

    let card: Value = server.get("/api/v1/cards/1").await.json();
    assert_eq!(card["data"]["question"], "Go问题");
    assert_eq!(card["data"]["tag_name"], "basics");
    assert_eq!(card["data"]["review"]["interval"], 1);
  }

  #[tokio::test]
  async fn test_restore_without_clear_conflicts_on_existing_ids() {
    let env = TestEnv::new();
    let server = env.server();
    seed(&server).await;
    let bytes = server.get("/api/v1/system/backup").await.as_bytes().to_vec();

    let res = server
      .post("/api/v1/system/restore")
      .add_query_param("clear_existing", "false")
      .multipart(backup_form(bytes))
      .await;
    res.assert_status(StatusCode::CONFLICT);

    // Rolled back, nothing duplicated
    let body: Value = server.get("/api/v1/system/stats").await.json();
    assert_eq!(body["data"]["total_cards"], 1);
  }

  #[tokio::test]
  async fn test_restore_rejects_bad_files() {
    let env = TestEnv::new();
    let server = env.server();

    let res = server
      .post("/api/v1/system/restore")
      .multipart(backup_form(b"{\"decks\": []}".to_vec()))
      .await;
    res.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>()["message"], "backup file has no version");

    let res = server
      .post("/api/v1/system/restore")
      .multipart(backup_form(b"{\"version\": \"3.0.0\"}".to_vec()))
      .await;
    res.assert_status(StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn test_clear_resets_ids() {
    let env = TestEnv::new();
    let server = env.server();
    seed(&server).await;
    server.delete("/api/v1/system/clear").await.assert_status_ok();

    let res = server.post("/api/v1/decks").json(&json!({"name": "Again"})).await;
    assert_eq!(res.json::<Value>()["data"]["id"], 1);
  }
}
