//! Study queues and review submission.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rusqlite::Connection;

use crate::db::cards::{self, CardScope};
use crate::db::{decks, reviews, tags};
use crate::domain::{ReviewOutcome, ReviewResult, StudySession};
use crate::error::{AppError, Result};
use crate::srs::{self, Sm2State};

/// Queue for a deck or tag: due cards first, topped up with cards that are
/// not yet due, then shuffled.
pub fn start_scoped_study(
    conn: &Connection,
    scope: CardScope,
    limit: i64,
    now: DateTime<Utc>,
) -> Result<StudySession> {
    let deck_id = match scope {
        CardScope::Deck(id) => id,
        CardScope::Tag(id) => {
            tags::get_tag(conn, id)?
                .ok_or_else(|| AppError::not_found("tag"))?
                .deck_id
        }
    };
    let deck = decks::get_deck(conn, deck_id)?.ok_or_else(|| AppError::not_found("deck"))?;
    if deck.archived {
        return Err(AppError::conflict(format!(
            "deck '{}' is archived and cannot be studied",
            deck.name
        )));
    }

    let mut queue = cards::scoped_study_items(conn, scope, now, limit)?;
    queue.shuffle(&mut rand::rng());
    Ok(StudySession::new(queue, now))
}

pub fn start_random_study(conn: &Connection, limit: i64, now: DateTime<Utc>) -> Result<StudySession> {
    let queue = cards::random_study_items(conn, limit)?;
    Ok(StudySession::new(queue, now))
}

/// Due cards in review order (new cards first, then the longest overdue)
pub fn due_cards(conn: &Connection, limit: i64, now: DateTime<Utc>) -> Result<StudySession> {
    let queue = cards::due_study_items(conn, now, limit)?;
    Ok(StudySession::new(queue, now))
}

/// Apply one recall result to a card's schedule and log it.
///
/// Runs in a transaction so the review row and its log entry land together.
pub fn submit_review(
    conn: &Connection,
    card_id: i64,
    result: ReviewResult,
    now: DateTime<Utc>,
) -> Result<ReviewOutcome> {
    if cards::get_card(conn, card_id)?.is_none() {
        return Err(AppError::not_found("card"));
    }

    let tx = conn.unchecked_transaction()?;
    let current = reviews::get_review(&tx, card_id)?
        .as_ref()
        .map(Sm2State::from)
        .unwrap_or_default();
    let next = srs::calculate_sm2(result, current, now);

    let review = reviews::upsert_review(
        &tx,
        card_id,
        next.e_factor,
        next.interval,
        next.repetitions,
        next.next_review,
        now,
    )?;
    reviews::insert_review_log(&tx, card_id, result, next.interval, next.e_factor, now)?;
    tx.commit()?;

    tracing::debug!(
        card_id,
        result = result.as_u8(),
        interval = review.interval,
        "Review recorded"
    );

    Ok(ReviewOutcome {
        success: true,
        card_id,
        next_review: review.next_review,
        interval: review.interval,
        e_factor: review.e_factor,
        repetitions: review.repetitions,
        message: srs::review_message(review.interval),
    })
}
