//! Interchange types for deck import/export and system statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Portable deck file. Ids are not carried; cards reference tags by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckExport {
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub cards: Vec<CardExport>,
  #[serde(default)]
  pub tags: Vec<TagExport>,
  #[serde(default = "Utc::now")]
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardExport {
  pub question: String,
  pub answer: String,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub tag_name: Option<String>,
  #[serde(default = "Utc::now")]
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagExport {
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default = "Utc::now")]
  pub created_at: DateTime<Utc>,
}

/// Older deck file layout: `{deck, tags, cards}` where cards point at tags by id.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyDeckFile {
  pub deck: LegacyDeck,
  #[serde(default)]
  pub tags: Vec<LegacyTag>,
  #[serde(default)]
  pub cards: Vec<LegacyCard>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyDeck {
  pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyTag {
  #[serde(default)]
  pub id: i64,
  pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyCard {
  pub question: String,
  pub answer: String,
  #[serde(default)]
  pub tag_id: Option<i64>,
}

impl From<LegacyDeckFile> for DeckExport {
  fn from(file: LegacyDeckFile) -> Self {
    let now = Utc::now();
    let cards = file
      .cards
      .into_iter()
      .map(|card| CardExport {
        tag_name: card
          .tag_id
          .and_then(|id| file.tags.iter().find(|t| t.id == id))
          .map(|t| t.name.clone()),
        question: card.question,
        answer: card.answer,
        created_at: now,
      })
      .collect();
    let tags = file
      .tags
      .into_iter()
      .map(|t| TagExport {
        name: t.name,
        description: String::new(),
        created_at: now,
      })
      .collect();

    Self {
      name: file.deck.name,
      description: String::new(),
      cards,
      tags,
      created_at: now,
    }
  }
}

/// Result of a deck import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
  pub deck_id: i64,
  pub deck_name: String,
  pub card_count: i64,
  pub import_time: DateTime<Utc>,
}

/// Returned by an export with `download=false`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportLink {
  pub filename: String,
  pub download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
  pub total_decks: i64,
  pub total_cards: i64,
  pub total_tags: i64,
  pub total_reviews: i64,
  pub version: String,
}

/// Rows inserted by a restore
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreCounts {
  pub decks: usize,
  pub tags: usize,
  pub cards: usize,
  pub reviews: usize,
}

/// Deck interchange formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
  Json,
  Csv,
  Txt,
}

impl ExportFormat {
  pub fn parse(value: &str) -> Option<Self> {
    match value.trim().to_ascii_lowercase().as_str() {
      "json" => Some(Self::Json),
      "csv" => Some(Self::Csv),
      "txt" => Some(Self::Txt),
      _ => None,
    }
  }

  pub fn extension(&self) -> &'static str {
    match self {
      Self::Json => "json",
      Self::Csv => "csv",
      Self::Txt => "txt",
    }
  }

  pub fn content_type(&self) -> &'static str {
    match self {
      Self::Json => "application/json",
      Self::Csv => "text/csv; charset=utf-8",
      Self::Txt => "text/plain; charset=utf-8",
    }
  }
}
