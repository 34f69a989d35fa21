use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::review::Review;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
  pub id: i64,
  pub deck_id: i64,
  /// None means the card is not grouped under a tag
  pub tag_id: Option<i64>,
  pub question: String,
  pub answer: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A card together with the names and scheduling state the views display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardView {
  #[serde(flatten)]
  pub card: Card,
  pub deck_name: String,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub tag_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub review: Option<Review>,
  pub due: bool,
}

/// One page of a card listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardPage {
  pub cards: Vec<CardView>,
  pub total: i64,
  pub page: i64,
  pub page_size: i64,
  pub total_pages: i64,
}

impl CardPage {
  pub fn new(cards: Vec<CardView>, total: i64, page: Pagination) -> Self {
    Self {
      cards,
      total,
      page: page.page,
      page_size: page.page_size,
      total_pages: total_pages(total, page.page_size),
    }
  }
}

/// Normalized page request: `page >= 1`, `1 <= page_size <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  pub page: i64,
  pub page_size: i64,
}

impl Pagination {
  /// Out-of-range values fall back to the first page / default size.
  /// Pages past the last addressable offset are capped.
  pub fn new(page: Option<i64>, page_size: Option<i64>, default_size: i64, max_size: i64) -> Self {
    let page_size = page_size
      .filter(|s| (1..=max_size).contains(s))
      .unwrap_or(default_size)
      .max(1);
    let page = page
      .filter(|p| *p >= 1)
      .unwrap_or(1)
      .min(i64::MAX / page_size);
    Self { page, page_size }
  }

  pub fn offset(&self) -> i64 {
    (self.page - 1).saturating_mul(self.page_size)
  }
}

pub fn total_pages(total: i64, page_size: i64) -> i64 {
  if page_size <= 0 {
    return 0;
  }
  (total + page_size - 1) / page_size
}

/// Filters for `GET /cards`
#[derive(Debug, Clone, Default)]
pub struct CardSearch {
  pub deck_id: Option<i64>,
  pub tag_id: Option<i64>,
  pub keyword: Option<String>,
}

/// Body of `POST /cards`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCard {
  pub deck_id: i64,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub tag_id: Option<i64>,
  pub question: String,
  pub answer: String,
}

/// Body of `PATCH /cards/{id}`. Absent fields are left unchanged;
/// `"tag_id": null` clears the tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCard {
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub deck_id: Option<i64>,
  #[serde(
    skip_serializing_if = "Option::is_none",
    default,
    deserialize_with = "present_or_null"
  )]
  pub tag_id: Option<Option<i64>>,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub question: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub answer: Option<String>,
}

/// Distinguishes a field set to `null` (`Some(None)`) from an absent one (`None`).
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  Option::<i64>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pagination_defaults() {
    let p = Pagination::new(None, None, 20, 100);
    assert_eq!(p, Pagination { page: 1, page_size: 20 });
    assert_eq!(p.offset(), 0);
  }

  #[test]
  fn test_pagination_out_of_range_falls_back() {
    assert_eq!(Pagination::new(Some(0), Some(0), 20, 100).page, 1);
    assert_eq!(Pagination::new(Some(-3), Some(101), 20, 100).page_size, 20);
    assert_eq!(Pagination::new(Some(3), Some(100), 20, 100).offset(), 200);
  }

  #[test]
  fn test_huge_page_is_capped() {
    let p = Pagination::new(Some(i64::MAX), Some(100), 20, 100);
    assert_eq!(p.page, i64::MAX / 100);
    assert!(p.offset() > 0);
    let p = Pagination::new(Some(i64::MAX), None, 20, 100);
    assert_eq!(p.offset(), (i64::MAX / 20 - 1) * 20);
  }

  #[test]
  fn test_total_pages() {
    assert_eq!(total_pages(0, 20), 0);
    assert_eq!(total_pages(1, 20), 1);
    assert_eq!(total_pages(20, 20), 1);
    assert_eq!(total_pages(21, 20), 2);
  }

  #[test]
  fn test_card_view_flattens_card() {
    let now = Utc::now();
    let view = CardView {
      card: Card {
        id: 7,
        deck_id: 1,
        tag_id: None,
        question: "Go问题".into(),
        answer: "Go答案".into(),
        created_at: now,
        updated_at: now,
      },
      deck_name: "Go".into(),
      tag_name: None,
      review: None,
      due: true,
    };
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["question"], "Go问题");
    assert_eq!(json["deck_name"], "Go");
    assert!(json.get("review").is_none());
    assert_eq!(json["due"], true);

    let back: CardView = serde_json::from_value(json).unwrap();
    assert_eq!(back.card, view.card);
  }

  #[test]
  fn test_update_card_tag_presence() {
    let absent: UpdateCard = serde_json::from_str(r#"{"question": "q"}"#).unwrap();
    assert_eq!(absent.tag_id, None);

    let cleared: UpdateCard = serde_json::from_str(r#"{"tag_id": null}"#).unwrap();
    assert_eq!(cleared.tag_id, Some(None));

    let set: UpdateCard = serde_json::from_str(r#"{"tag_id": 4}"#).unwrap();
    assert_eq!(set.tag_id, Some(Some(4)));
  }
}
