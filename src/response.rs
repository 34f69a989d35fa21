//! Uniform JSON envelope returned by every API route.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

pub const SUCCESS: &str = "SUCCESS";
pub const INVALID_PARAM: &str = "INVALID_PARAM";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const CONFLICT: &str = "CONFLICT";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";

/// `{code, message, data?, details?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
  pub code: String,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<T>,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub details: Option<String>,
}

impl<T> ApiResponse<T> {
  pub fn ok(data: T) -> Self {
    Self::with_message(data, "ok")
  }

  pub fn with_message(data: T, message: impl Into<String>) -> Self {
    Self {
      code: SUCCESS.to_string(),
      message: message.into(),
      data: Some(data),
      details: None,
    }
  }
}

impl ApiResponse<()> {
  pub fn error(code: &str, message: impl Into<String>, details: Option<String>) -> Self {
    Self {
      code: code.to_string(),
      message: message.into(),
      data: None,
      details,
    }
  }

  /// Success without a payload (deletes, clear)
  pub fn message(message: impl Into<String>) -> Self {
    Self {
      code: SUCCESS.to_string(),
      message: message.into(),
      data: None,
      details: None,
    }
  }
}

pub type Reply<T> = Json<ApiResponse<T>>;

pub fn success<T>(data: T) -> Reply<T> {
  Json(ApiResponse::ok(data))
}

/// 201 with the created resource
pub fn created<T>(data: T, message: &str) -> (StatusCode, Reply<T>) {
  (StatusCode::CREATED, Json(ApiResponse::with_message(data, message)))
}

pub fn done(message: &str) -> Reply<()> {
  Json(ApiResponse::message(message))
}
