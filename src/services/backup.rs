//! Full-database backup and restore.
//!
//! ## Backup Format
//! ```text
//! flashmind_complete_backup_{YYYY-MM-DD_HH-MM-SS}.json
//! {
//!   "version": "1.0.0",
//!   "export_date": "...",
//!   "decks": [...], "tags": [...], "cards": [...], "reviews": [...],
//!   "review_logs": [...]
//! }
//! ```
//! Rows keep their ids and timestamps so a restore reproduces the database.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::db::{decks, system, tags};
use crate::domain::{Card, Deck, RestoreCounts, Review, ReviewLog, Tag};
use crate::error::{AppError, Result};

/// Backup format version
pub const BACKUP_VERSION: &str = "1.0.0";

/// Complete backup file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupData {
    /// Format version for compatibility checks
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "Utc::now")]
    pub export_date: DateTime<Utc>,
    #[serde(default)]
    pub decks: Vec<Deck>,
    #[serde(default)]
    pub tags: Vec<BackupTag>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Absent from files written before logs were kept
    #[serde(default)]
    pub review_logs: Vec<ReviewLog>,
}

/// Tag row as found in a backup. Older files may carry tags without a deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupTag {
    pub id: i64,
    #[serde(default)]
    pub deck_id: Option<i64>,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tag> for BackupTag {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            deck_id: Some(tag.deck_id),
            name: tag.name,
            created_at: tag.created_at,
            updated_at: tag.updated_at,
        }
    }
}

impl BackupTag {
    fn into_tag(self) -> Option<Tag> {
        let deck_id = self.deck_id.filter(|id| *id > 0)?;
        Some(Tag {
            id: self.id,
            deck_id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Check if export version is compatible with current version.
///
/// We allow any version within the same major version number.
/// Pre-1.0 versions (0.x.y) are all considered compatible with each other.
pub fn check_version_compatible(export_version: &str, current_version: &str) -> bool {
    let parse_major = |v: &str| -> Option<u32> {
        v.split('.').next()?.trim().parse().ok()
    };

    match (parse_major(export_version), parse_major(current_version)) {
        (Some(export_major), Some(current_major)) => {
            // For pre-1.0, all 0.x versions are compatible
            if export_major == 0 && current_major == 0 {
                return true;
            }
            export_major == current_major
        }
        _ => false,
    }
}

/// Snapshot every table.
pub fn build_backup(conn: &Connection, now: DateTime<Utc>) -> rusqlite::Result<BackupData> {
    Ok(BackupData {
        version: Some(BACKUP_VERSION.to_string()),
        export_date: now,
        decks: decks::list_decks(conn)?,
        tags: tags::list_tags(conn)?.into_iter().map(BackupTag::from).collect(),
        cards: system::all_cards(conn)?,
        reviews: system::all_reviews(conn)?,
        review_logs: system::all_review_logs(conn)?,
    })
}

/// Parse an uploaded backup and reject files from an incompatible version.
pub fn parse_backup(bytes: &[u8]) -> Result<BackupData> {
    let data: BackupData = serde_json::from_slice(bytes)
        .map_err(|e| AppError::invalid(format!("invalid backup file: {}", e)))?;
    let version = data
        .version
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::invalid("backup file has no version"))?;
    if !check_version_compatible(version, BACKUP_VERSION) {
        return Err(AppError::invalid(format!(
            "backup version {} is not compatible with {}",
            version, BACKUP_VERSION
        )));
    }
    Ok(data)
}

/// Insert every row of `data`, optionally wiping the database first.
/// All or nothing: any failure rolls the whole restore back.
pub fn restore(conn: &Connection, data: BackupData, clear_existing: bool) -> Result<RestoreCounts> {
    let tx = conn.unchecked_transaction()?;
    if clear_existing {
        system::clear_all(&tx)?;
    }

    let mut counts = RestoreCounts::default();
    for deck in &data.decks {
        system::restore_deck(&tx, deck)?;
        counts.decks += 1;
    }

    let mut tag_decks: HashMap<i64, i64> = HashMap::new();
    let mut skipped_tags = HashSet::new();
    for backup_tag in data.tags {
        let id = backup_tag.id;
        match backup_tag.into_tag() {
            Some(tag) => {
                system::restore_tag(&tx, &tag)?;
                tag_decks.insert(tag.id, tag.deck_id);
                counts.tags += 1;
            }
            None => {
                tracing::warn!("Skipping tag {} without a deck", id);
                skipped_tags.insert(id);
            }
        }
    }

    for mut card in data.cards {
        if let Some(tag_id) = card.tag_id {
            let tag_deck = match tag_decks.get(&tag_id) {
                Some(deck_id) => Some(*deck_id),
                None if skipped_tags.contains(&tag_id) => None,
                None => tags::get_tag(&tx, tag_id)?.map(|t| t.deck_id),
            };
            if tag_deck != Some(card.deck_id) {
                tracing::warn!(
                    "Detaching card {} from tag {} outside its deck",
                    card.id,
                    tag_id
                );
                card.tag_id = None;
            }
        }
        system::restore_card(&tx, &card)?;
        counts.cards += 1;
    }

    for review in &data.reviews {
        system::restore_review(&tx, review)?;
        counts.reviews += 1;
    }

    for log in &data.review_logs {
        system::restore_review_log(&tx, log)?;
    }

    tx.commit()?;
    tracing::info!(
        "Restored {} decks, {} tags, {} cards, {} reviews",
        counts.decks,
        counts.tags,
        counts.cards,
        counts.reviews
    );
    Ok(counts)
}
