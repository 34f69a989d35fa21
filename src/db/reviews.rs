//! Per-card scheduling state and the review log

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use super::{time_column, timestamp};
use crate::domain::{Review, ReviewResult};

const REVIEW_COLUMNS: &str =
    "id, card_id, e_factor, interval_days, repetitions, next_review, created_at, updated_at";

pub(crate) fn row_to_review(row: &Row<'_>) -> Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        card_id: row.get(1)?,
        e_factor: row.get(2)?,
        interval: row.get(3)?,
        repetitions: row.get(4)?,
        next_review: time_column(row, 5)?,
        created_at: time_column(row, 6)?,
        updated_at: time_column(row, 7)?,
    })
}

pub fn get_review(conn: &Connection, card_id: i64) -> Result<Option<Review>> {
    conn.query_row(
        &format!("SELECT {} FROM reviews WHERE card_id = ?1", REVIEW_COLUMNS),
        params![card_id],
        row_to_review,
    )
    .optional()
}

/// Create the card's review on first submission, overwrite it afterwards.
pub fn upsert_review(
    conn: &Connection,
    card_id: i64,
    e_factor: f64,
    interval: i64,
    repetitions: i64,
    next_review: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Review> {
    conn.execute(
        r#"
    INSERT INTO reviews (card_id, e_factor, interval_days, repetitions, next_review, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
    ON CONFLICT(card_id) DO UPDATE SET
      e_factor = excluded.e_factor,
      interval_days = excluded.interval_days,
      repetitions = excluded.repetitions,
      next_review = excluded.next_review,
      updated_at = excluded.updated_at
    "#,
        params![
            card_id,
            e_factor,
            interval,
            repetitions,
            timestamp(next_review),
            timestamp(now),
        ],
    )?;
    get_review(conn, card_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn insert_review_log(
    conn: &Connection,
    card_id: i64,
    result: ReviewResult,
    interval: i64,
    e_factor: f64,
    reviewed_at: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO review_logs (card_id, result, interval_days, e_factor, reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![card_id, result.as_u8(), interval, e_factor, timestamp(reviewed_at)],
    )?;
    Ok(conn.last_insert_rowid())
}
