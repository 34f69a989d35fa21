pub mod cards;
pub mod decks;
pub mod study;
pub mod system;
pub mod tags;
pub mod transfer;

use axum::{
  extract::{rejection::JsonRejection, DefaultBodyLimit},
  http::{header, HeaderValue, Method},
  middleware,
  routing::{get, post},
  Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::RequireToken;
use crate::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MAX_RESTORE_BYTES};
use crate::domain::Pagination;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
  let api = Router::new()
    .route("/ping", get(system::ping))
    // Decks
    .route("/decks", get(decks::list_decks).post(decks::create_deck))
    .route(
      "/decks/{id}",
      get(decks::get_deck).patch(decks::update_deck).delete(decks::delete_deck),
    )
    .route("/decks/{id}/stats", get(decks::deck_stats))
    .route("/decks/{id}/cards", get(cards::cards_by_deck))
    // Tags
    .route("/tags", get(tags::list_tags).post(tags::create_tag))
    .route("/tags/deck/{id}", get(tags::tags_by_deck))
    .route(
      "/tags/{id}",
      get(tags::get_tag).patch(tags::update_tag).delete(tags::delete_tag),
    )
    .route("/tags/{id}/stats", get(tags::tag_stats))
    .route("/tags/{id}/cards", get(cards::cards_by_tag))
    // Cards
    .route("/cards", get(cards::search_cards).post(cards::create_card))
    .route("/cards/deck/{id}", get(cards::cards_by_deck))
    .route("/cards/tag/{id}", get(cards::cards_by_tag))
    .route(
      "/cards/{id}",
      get(cards::get_card).patch(cards::update_card).delete(cards::delete_card),
    )
    // Study
    .route("/study/deck/{id}", post(study::start_deck_study))
    .route("/study/tag/{id}", post(study::start_tag_study))
    .route("/study/random", post(study::start_random_study))
    .route("/study/due", get(study::due_cards))
    .route("/study/review/{id}", post(study::submit_review))
    // Import / export
    .route("/import-export/decks", post(transfer::import_deck))
    .route("/import-export/decks/{id}", get(transfer::export_deck))
    // System
    .route("/system/stats", get(system::system_stats))
    .route("/system/backup", get(system::backup))
    .route("/system/restore", post(system::restore))
    .route("/system/clear", axum::routing::delete(system::clear))
    .route_layer(middleware::from_extractor_with_state::<RequireToken, AppState>(
      state.clone(),
    ));

  Router::new()
    .route("/health", get(system::health))
    .nest("/api/v1", api)
    .layer(DefaultBodyLimit::max(MAX_RESTORE_BYTES))
    .layer(cors_layer(&state.config.cors_origins))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
  let origins: Vec<HeaderValue> = origins
    .iter()
    .filter_map(|o| match HeaderValue::from_str(o) {
      Ok(v) => Some(v),
      Err(_) => {
        tracing::warn!("Ignoring invalid CORS origin: {}", o);
        None
      }
    })
    .collect();

  CorsLayer::new()
    .allow_origin(origins)
    .allow_methods([
      Method::GET,
      Method::POST,
      Method::PUT,
      Method::PATCH,
      Method::DELETE,
      Method::OPTIONS,
    ])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
    .allow_credentials(true)
}

/// Unwrap a JSON body, reporting malformed input as INVALID_PARAM.
fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
  body
    .map(|Json(value)| value)
    .map_err(|rejection| AppError::invalid(rejection.body_text()))
}

/// `?page=&page_size=` kept as text so bad values fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
  pub page: Option<String>,
  pub page_size: Option<String>,
}

impl PageQuery {
  fn pagination(&self) -> Pagination {
    let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
    Pagination::new(
      parse(&self.page),
      parse(&self.page_size),
      DEFAULT_PAGE_SIZE,
      MAX_PAGE_SIZE,
    )
  }
}

/// `?include_stats=true`
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
  #[serde(default, alias = "stats")]
  pub include_stats: Option<String>,
}

impl StatsQuery {
  fn enabled(&self) -> bool {
    is_truthy(self.include_stats.as_deref())
  }
}

fn is_truthy(value: Option<&str>) -> bool {
  matches!(
    value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
    Some("true" | "1" | "yes")
  )
}
