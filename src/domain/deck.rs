use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
  pub id: i64,
  pub name: String,
  /// Archived decks are kept but excluded from study
  #[serde(default)]
  pub archived: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStats {
  pub total_cards: i64,
  pub due_cards: i64,
  /// Cards never reviewed
  pub new_cards: i64,
  pub tag_count: i64,
  pub today_studied: i64,
  pub week_studied: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckWithStats {
  #[serde(flatten)]
  pub deck: Deck,
  pub stats: DeckStats,
}

/// Body of `POST /decks`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeck {
  pub name: String,
}

/// Body of `PATCH /decks/{id}`; at least one field must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDeck {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub archived: Option<bool>,
}

impl UpdateDeck {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.archived.is_none()
  }
}
