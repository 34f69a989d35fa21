//! Deck import (multipart upload) and export (attachment or saved file).

use axum::body::Bytes;
use axum::extract::{multipart::MultipartRejection, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;

use super::is_truthy;
use crate::config::MAX_IMPORT_BYTES;
use crate::db;
use crate::domain::{ExportFormat, ExportLink, ImportSummary};
use crate::error::{AppError, Result};
use crate::paths;
use crate::response::{self, Reply};
use crate::services::transfer;
use crate::state::AppState;
use crate::validation;

/// Upload field carrying the file
const FILE_FIELD: &str = "file";

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
  pub format: Option<String>,
  pub download: Option<String>,
}

/// Read the `file` field of a multipart upload, enforcing a size limit.
pub(super) async fn read_upload(
  multipart: std::result::Result<Multipart, MultipartRejection>,
  max_bytes: usize,
) -> Result<(String, Bytes)> {
  let mut multipart = multipart.map_err(|e| AppError::invalid(e.body_text()))?;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| AppError::invalid(format!("invalid upload: {}", e.body_text())))?
  {
    if field.name() != Some(FILE_FIELD) {
      continue;
    }
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field
      .bytes()
      .await
      .map_err(|e| AppError::invalid(format!("invalid upload: {}", e.body_text())))?;
    if bytes.len() > max_bytes {
      return Err(AppError::invalid(format!(
        "file is too large (max {} MiB)",
        max_bytes / (1024 * 1024)
      )));
    }
    return Ok((file_name, bytes));
  }

  Err(AppError::invalid("missing file field"))
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name.
pub(super) fn attachment(file_name: &str, content_type: &str, body: Vec<u8>) -> Response {
  let fallback: String = file_name
    .chars()
    .map(|c| if c.is_ascii() && c != '"' && c != '\\' && !c.is_ascii_control() { c } else { '_' })
    .collect();
  let disposition = format!(
    "attachment; filename=\"{}\"; filename*=UTF-8''{}",
    fallback,
    urlencoding::encode(file_name)
  );
  (
    [
      (header::CONTENT_TYPE, content_type.to_string()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    body,
  )
    .into_response()
}

/// Create a new deck from an uploaded `.json`, `.csv` or `.txt` file.
pub async fn import_deck(
  State(state): State<AppState>,
  multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Reply<ImportSummary>)> {
  let (file_name, bytes) = read_upload(multipart, MAX_IMPORT_BYTES).await?;
  if file_name.is_empty() {
    return Err(AppError::invalid("uploaded file has no name"));
  }
  let parsed = transfer::parse_upload(&file_name, &bytes)?;

  let conn = db::try_lock(&state.db)?;
  let summary = transfer::import_deck(&conn, &parsed, Utc::now())?;
  Ok(response::created(summary, "deck imported"))
}

/// Export a deck. `?download=true` streams it back as an attachment;
/// otherwise it is saved to the export directory and a link is returned.
pub async fn export_deck(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Query(query): Query<ExportQuery>,
) -> Result<Response> {
  let deck_id = validation::parse_id(&id, "deck")?;
  let format = match query.format.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
    Some(raw) => ExportFormat::parse(raw)
      .ok_or_else(|| AppError::invalid(format!("unsupported export format: {}", raw)))?,
    None => ExportFormat::Json,
  };

  let export = {
    let conn = db::try_lock(&state.db)?;
    transfer::build_export(&conn, deck_id)?
  };
  let body = transfer::render(&export, format)?;
  let file_name = paths::export_file_name(&export.name, format.extension(), Utc::now());

  if is_truthy(query.download.as_deref()) {
    return Ok(attachment(&file_name, format.content_type(), body));
  }

  transfer::write_export_file(&state.config.export_dir, &file_name, &body)?;
  tracing::info!("Exported deck {} to {}", deck_id, file_name);
  let link = ExportLink {
    download_url: format!(
      "/api/v1/import-export/decks/{}?download=true&format={}",
      deck_id,
      format.extension()
    ),
    filename: file_name,
  };
  Ok(response::success(link).into_response())
}
