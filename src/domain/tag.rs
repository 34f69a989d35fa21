use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
  pub id: i64,
  pub deck_id: i64,
  pub name: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagStats {
  pub total_cards: i64,
  pub due_cards: i64,
  pub new_cards: i64,
  pub today_studied: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithStats {
  #[serde(flatten)]
  pub tag: Tag,
  pub stats: TagStats,
}

/// Body of `POST /tags`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTag {
  pub deck_id: i64,
  pub name: String,
}

/// Body of `PATCH /tags/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTag {
  pub name: String,
  /// Move the tag to another deck
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub deck_id: Option<i64>,
}
