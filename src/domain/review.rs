use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recall quality submitted for a card.
///
/// Travels over the wire as its integer value (0, 1, 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ReviewResult {
  /// Forgotten; start over
  Again = 0,
  /// Recalled with difficulty
  Hard = 1,
  /// Recalled
  Good = 2,
}

impl ReviewResult {
  pub fn from_u8(value: u8) -> Option<Self> {
    match value {
      0 => Some(Self::Again),
      1 => Some(Self::Hard),
      2 => Some(Self::Good),
      _ => None,
    }
  }

  pub fn as_u8(&self) -> u8 {
    *self as u8
  }

  pub fn is_success(&self) -> bool {
    matches!(self, Self::Hard | Self::Good)
  }
}

impl TryFrom<u8> for ReviewResult {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Self::from_u8(value).ok_or_else(|| format!("review result must be 0-2, got {}", value))
  }
}

impl From<ReviewResult> for u8 {
  fn from(result: ReviewResult) -> Self {
    result.as_u8()
  }
}

/// Per-card scheduling state. A card without one is new.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
  pub id: i64,
  pub card_id: i64,
  #[serde(alias = "efactor")]
  pub e_factor: f64,
  /// Days until the card is due again
  pub interval: i64,
  /// Consecutive successful recalls
  #[serde(default)]
  pub repetitions: i64,
  pub next_review: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Review {
  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.next_review <= now
  }
}

/// New cards are always due.
pub fn is_card_due(review: Option<&Review>, now: DateTime<Utc>) -> bool {
  review.is_none_or(|r| r.is_due(now))
}

/// One row per submission, used for study statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLog {
  pub id: i64,
  pub card_id: i64,
  pub result: ReviewResult,
  pub interval: i64,
  pub e_factor: f64,
  pub reviewed_at: DateTime<Utc>,
}

/// Body of `POST /study/review/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
  pub result: ReviewResult,
}

/// Response to a review submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutcome {
  pub success: bool,
  pub card_id: i64,
  pub next_review: DateTime<Utc>,
  pub interval: i64,
  pub e_factor: f64,
  pub repetitions: i64,
  pub message: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn review_due_at(next_review: DateTime<Utc>) -> Review {
    Review {
      id: 1,
      card_id: 1,
      e_factor: 2.5,
      interval: 1,
      repetitions: 1,
      next_review,
      created_at: next_review,
      updated_at: next_review,
    }
  }

  #[test]
  fn test_review_result_from_u8() {
    assert_eq!(ReviewResult::from_u8(0), Some(ReviewResult::Again));
    assert_eq!(ReviewResult::from_u8(1), Some(ReviewResult::Hard));
    assert_eq!(ReviewResult::from_u8(2), Some(ReviewResult::Good));
    assert_eq!(ReviewResult::from_u8(3), None);
  }

  #[test]
  fn test_review_result_success() {
    assert!(!ReviewResult::Again.is_success());
    assert!(ReviewResult::Hard.is_success());
    assert!(ReviewResult::Good.is_success());
  }

  #[test]
  fn test_review_request_serde() {
    let req: ReviewRequest = serde_json::from_str(r#"{"result": 2}"#).unwrap();
    assert_eq!(req.result, ReviewResult::Good);
    assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"result":2}"#);

    assert!(serde_json::from_str::<ReviewRequest>(r#"{"result": 5}"#).is_err());
    assert!(serde_json::from_str::<ReviewRequest>(r#"{"result": -1}"#).is_err());
  }

  #[test]
  fn test_new_card_is_due() {
    assert!(is_card_due(None, Utc::now()));
  }

  #[test]
  fn test_due_boundary() {
    let now = Utc::now();
    assert!(is_card_due(Some(&review_due_at(now)), now));
    assert!(is_card_due(Some(&review_due_at(now - Duration::days(1))), now));
    assert!(!is_card_due(Some(&review_due_at(now + Duration::seconds(1))), now));
  }

  #[test]
  fn test_review_accepts_legacy_efactor() {
    let json = r#"{
      "id": 3, "card_id": 9, "efactor": 2.1, "interval": 6, "repetitions": 2,
      "next_review": "2026-01-01T00:00:00Z",
      "created_at": "2025-12-01T00:00:00Z", "updated_at": "2025-12-26T00:00:00Z"
    }"#;
    let review: Review = serde_json::from_str(json).unwrap();
    assert_eq!(review.e_factor, 2.1);
    assert_eq!(review.interval, 6);
  }
}
