use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One card in a study queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyItem {
  pub card_id: i64,
  pub question: String,
  pub answer: String,
  pub deck_name: String,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub tag_name: Option<String>,
}

/// A freshly started study session. Progress is tracked by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
  pub queue: Vec<StudyItem>,
  pub current: usize,
  pub total: usize,
  pub completed: usize,
  pub start_time: DateTime<Utc>,
}

impl StudySession {
  pub fn new(queue: Vec<StudyItem>, start_time: DateTime<Utc>) -> Self {
    Self {
      total: queue.len(),
      queue,
      current: 0,
      completed: 0,
      start_time,
    }
  }
}
