use chrono::{DateTime, Duration, Utc};

use crate::domain::{Review, ReviewResult};

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
const MIN_EASE_FACTOR: f64 = 1.3;
const MAX_EASE_FACTOR: f64 = 2.5;

/// Interval after a failure or a first success
const BASELINE_INTERVAL: i64 = 1;

/// Longest schedulable interval, about a hundred years
pub const MAX_INTERVAL: i64 = 36_500;

/// Scheduling inputs carried between submissions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sm2State {
  pub e_factor: f64,
  pub interval: i64,
  pub repetitions: i64,
}

impl Default for Sm2State {
  /// State of a card that has never been reviewed
  fn default() -> Self {
    Self {
      e_factor: DEFAULT_EASE_FACTOR,
      interval: 0,
      repetitions: 0,
    }
  }
}

impl From<&Review> for Sm2State {
  fn from(review: &Review) -> Self {
    Self {
      e_factor: review.e_factor,
      interval: review.interval,
      repetitions: review.repetitions,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sm2Result {
  pub e_factor: f64,
  pub interval: i64,
  pub repetitions: i64,
  pub next_review: DateTime<Utc>,
}

pub fn calculate_sm2(result: ReviewResult, current: Sm2State, now: DateTime<Utc>) -> Sm2Result {
  let (interval, repetitions, e_factor) = match result {
    ReviewResult::Again => (
      BASELINE_INTERVAL,
      0,
      current.e_factor - 0.2,
    ),
    ReviewResult::Hard => (
      grown_interval(&current, 3).max(current.interval),
      current.repetitions + 1,
      current.e_factor - 0.15,
    ),
    ReviewResult::Good => (
      grown_interval(&current, 6).max(current.interval),
      current.repetitions + 1,
      current.e_factor + 0.1,
    ),
  };

  let interval = interval.min(MAX_INTERVAL);
  Sm2Result {
    e_factor: round_ease(e_factor.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR)),
    interval,
    repetitions,
    next_review: now + Duration::days(interval),
  }
}

/// Growth uses the ease factor from before this submission.
fn grown_interval(current: &Sm2State, second_step: i64) -> i64 {
  match current.repetitions {
    0 => BASELINE_INTERVAL,
    1 => second_step,
    _ => ((current.interval.min(MAX_INTERVAL) as f64) * current.e_factor).round() as i64,
  }
}

/// Keep stored ease factors free of accumulated float noise.
fn round_ease(e_factor: f64) -> f64 {
  (e_factor * 100.0).round() / 100.0
}

/// Text shown to the learner after a submission
pub fn review_message(interval: i64) -> String {
  if interval <= 1 {
    "We'll review this card again tomorrow".to_string()
  } else {
    format!("We'll review this card again in {} days", interval)
  }
}
