//! Service errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rusqlite::ffi;

use crate::db::DbLockError;
use crate::response::{self, ApiResponse};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("{0}")]
  InvalidParam(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("authentication required")]
  Unauthorized,

  #[error("database error: {0}")]
  Database(rusqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("{0}")]
  Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::InvalidParam(message.into())
  }

  pub fn not_found(what: &str) -> Self {
    Self::NotFound(format!("{} not found", what))
  }

  pub fn conflict(message: impl Into<String>) -> Self {
    Self::Conflict(message.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::InvalidParam(_) => StatusCode::BAD_REQUEST,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Database(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::InvalidParam(_) => response::INVALID_PARAM,
      Self::NotFound(_) => response::NOT_FOUND,
      Self::Conflict(_) => response::CONFLICT,
      Self::Unauthorized => response::UNAUTHORIZED,
      Self::Database(_) | Self::Io(_) | Self::Internal(_) => response::INTERNAL_ERROR,
    }
  }

  /// Replace a generic missing-row error with a named one.
  pub fn or_not_found(self, what: &str) -> Self {
    match self {
      Self::NotFound(_) => Self::not_found(what),
      other => other,
    }
  }
}

/// Constraint violations are client mistakes, not server faults.
impl From<rusqlite::Error> for AppError {
  fn from(err: rusqlite::Error) -> Self {
    match &err {
      rusqlite::Error::QueryReturnedNoRows => Self::NotFound("record not found".to_string()),
      rusqlite::Error::SqliteFailure(e, _) if e.code == ffi::ErrorCode::ConstraintViolation => {
        match e.extended_code {
          ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
            Self::Conflict("a record with the same name already exists".to_string())
          }
          ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
            Self::InvalidParam("referenced record does not exist".to_string())
          }
          _ => Self::InvalidParam(err.to_string()),
        }
      }
      _ => Self::Database(err),
    }
  }
}

impl From<DbLockError> for AppError {
  fn from(err: DbLockError) -> Self {
    Self::Internal(err.to_string())
  }
}

impl From<serde_json::Error> for AppError {
  fn from(err: serde_json::Error) -> Self {
    Self::InvalidParam(format!("invalid JSON: {}", err))
  }
}

impl From<csv::Error> for AppError {
  fn from(err: csv::Error) -> Self {
    Self::InvalidParam(format!("invalid CSV: {}", err))
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    let (message, details) = match &self {
      Self::Database(_) | Self::Io(_) | Self::Internal(_) => {
        tracing::error!("Request failed: {}", self);
        ("internal server error".to_string(), Some(self.to_string()))
      }
      _ => (self.to_string(), None),
    };
    let body = ApiResponse::error(self.code(), message, details);
    (status, Json(body)).into_response()
  }
}
