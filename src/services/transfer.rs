//! Deck import and export in the JSON, CSV and TXT interchange formats.
//!
//! ## Formats
//! ```text
//! JSON  {name, description, cards: [{question, answer, tag_name?, created_at}], tags: [...], created_at}
//!       (the older {deck, tags, cards} layout is accepted on import)
//! CSV   ID,Question,Answer,Tag
//! TXT   # tag
//!       question
//!       ---
//!       answer
//!       ===
//!       ...
//! ```
//! In TXT files a `#` header applies to the cards that follow it until the
//! next header; a bare `#` returns to untagged cards.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;

use crate::db::{cards, decks, tags};
use crate::domain::{CardExport, DeckExport, ExportFormat, ImportSummary, LegacyDeckFile, TagExport};
use crate::error::{AppError, Result};
use crate::paths;
use crate::validation;

const CSV_HEADER: [&str; 4] = ["ID", "Question", "Answer", "Tag"];
const TXT_CARD_SEPARATOR: &str = "===";
const TXT_ANSWER_SEPARATOR: &str = "---";

// ==================== Export ====================

/// Snapshot of a deck with tags referenced by name.
pub fn build_export(conn: &Connection, deck_id: i64) -> Result<DeckExport> {
    let deck = decks::get_deck(conn, deck_id)?.ok_or_else(|| AppError::not_found("deck"))?;
    let tags = tags::list_tags_by_deck(conn, deck_id)?
        .into_iter()
        .map(|tag| TagExport {
            name: tag.name,
            description: String::new(),
            created_at: tag.created_at,
        })
        .collect();
    let cards = cards::deck_cards_with_tags(conn, deck_id)?
        .into_iter()
        .map(|(card, tag_name)| CardExport {
            question: card.question,
            answer: card.answer,
            tag_name,
            created_at: card.created_at,
        })
        .collect();

    Ok(DeckExport {
        name: deck.name,
        description: String::new(),
        cards,
        tags,
        created_at: deck.created_at,
    })
}

pub fn render(export: &DeckExport, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Json => serde_json::to_vec_pretty(export)
            .map_err(|e| AppError::Internal(format!("serialize export: {}", e))),
        ExportFormat::Csv => render_csv(export),
        ExportFormat::Txt => Ok(render_txt(export).into_bytes()),
    }
}

fn render_csv(export: &DeckExport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for (i, card) in export.cards.iter().enumerate() {
        let row = (i + 1).to_string();
        writer.write_record([
            row.as_str(),
            card.question.as_str(),
            card.answer.as_str(),
            card.tag_name.as_deref().unwrap_or(""),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("flush csv: {}", e)))
}

/// Cards grouped by tag in order of first appearance, untagged cards last.
fn render_txt(export: &DeckExport) -> String {
    let mut groups: Vec<(Option<&str>, Vec<&CardExport>)> = Vec::new();
    let mut untagged: Vec<&CardExport> = Vec::new();
    for card in &export.cards {
        match card.tag_name.as_deref() {
            Some(tag) => match groups.iter_mut().find(|(name, _)| *name == Some(tag)) {
                Some((_, cards)) => cards.push(card),
                None => groups.push((Some(tag), vec![card])),
            },
            None => untagged.push(card),
        }
    }
    if !untagged.is_empty() {
        groups.push((None, untagged));
    }

    let has_tags = groups.iter().any(|(name, _)| name.is_some());
    let mut parts: Vec<String> = Vec::new();
    for (tag, cards) in groups {
        for (i, card) in cards.iter().enumerate() {
            let mut part = String::new();
            if i == 0 {
                match tag {
                    Some(name) => part.push_str(&format!("# {}\n", name)),
                    None if has_tags => part.push_str("#\n"),
                    None => {}
                }
            }
            part.push_str(&format!(
                "{}\n{}\n{}",
                escape_txt(&card.question),
                TXT_ANSWER_SEPARATOR,
                escape_txt(&card.answer)
            ));
            parts.push(part);
        }
    }

    let mut out = parts.join(&format!("\n{}\n", TXT_CARD_SEPARATOR));
    out.push('\n');
    out
}

/// Backslash-prefix lines that would read as a header, a separator or an
/// escape.
fn escape_txt(text: &str) -> String {
    text.lines()
        .map(|line| {
            let bare = line.trim();
            let markup = bare.starts_with('#')
                || bare.starts_with('\\')
                || bare == TXT_ANSWER_SEPARATOR
                || bare == TXT_CARD_SEPARATOR;
            if markup {
                format!("\\{}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn unescape_txt(line: &str) -> &str {
    line.strip_prefix('\\').unwrap_or(line)
}

/// Write an export into `dir`, creating it when needed.
pub fn write_export_file(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(file_name), bytes)?;
    Ok(())
}

// ==================== Import ====================

/// Parse an uploaded deck file, picking the format from its extension.
pub fn parse_upload(file_name: &str, bytes: &[u8]) -> Result<DeckExport> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    let format = paths::extension_of(file_name)
        .as_deref()
        .and_then(ExportFormat::parse)
        .ok_or_else(|| AppError::invalid("unsupported file format"))?;

    match format {
        ExportFormat::Json => parse_json(bytes),
        ExportFormat::Csv => parse_csv(&paths::deck_name_from_file(file_name), bytes),
        ExportFormat::Txt => {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| AppError::invalid("TXT file must be UTF-8"))?;
            Ok(parse_txt(&paths::deck_name_from_file(file_name), text))
        }
    }
}

fn parse_json(bytes: &[u8]) -> Result<DeckExport> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    if value.get("deck").is_some_and(|deck| deck.is_object()) {
        let legacy: LegacyDeckFile = serde_json::from_value(value)?;
        Ok(legacy.into())
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

fn parse_csv(deck_name: &str, bytes: &[u8]) -> Result<DeckExport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut records = reader.records();

    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| AppError::invalid("CSV file is empty"))?;
    let header_ok = header.len() >= 3
        && header
            .iter()
            .zip(CSV_HEADER)
            .take(3)
            .all(|(got, want)| got.trim().eq_ignore_ascii_case(want));
    if !header_ok {
        return Err(AppError::invalid(
            "CSV header must be: ID,Question,Answer,Tag",
        ));
    }

    let now = Utc::now();
    let mut cards = Vec::new();
    for record in records {
        let record = record?;
        if record.len() < 3 {
            continue;
        }
        let tag_name = record
            .get(3)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);
        cards.push(CardExport {
            question: record[1].to_string(),
            answer: record[2].to_string(),
            tag_name,
            created_at: now,
        });
    }

    Ok(deck_from_cards(deck_name, cards, now))
}

fn parse_txt(deck_name: &str, text: &str) -> DeckExport {
    let now = Utc::now();
    let mut cards = Vec::new();
    let mut current_tag: Option<String> = None;
    let mut part: Vec<&str> = Vec::new();

    // The trailing separator flushes the last card
    for line in text.lines().chain(std::iter::once(TXT_CARD_SEPARATOR)) {
        if line.trim() == TXT_CARD_SEPARATOR {
            if let Some(card) = parse_txt_part(&part, &mut current_tag, now) {
                cards.push(card);
            }
            part.clear();
        } else {
            part.push(line);
        }
    }

    deck_from_cards(deck_name, cards, now)
}

/// One `===`-delimited part: optional `#` headers, then `question --- answer`.
fn parse_txt_part(
    lines: &[&str],
    current_tag: &mut Option<String>,
    now: DateTime<Utc>,
) -> Option<CardExport> {
    // Headers are only recognized before the card text
    let mut start = 0;
    while let Some(line) = lines.get(start).map(|l| l.trim()) {
        if let Some(name) = line.strip_prefix('#') {
            let name = name.trim();
            *current_tag = (!name.is_empty()).then(|| name.to_string());
        } else if !line.is_empty() {
            break;
        }
        start += 1;
    }

    let body = &lines[start..];
    let split = body.iter().position(|l| l.trim() == TXT_ANSWER_SEPARATOR)?;
    let join = |lines: &[&str]| {
        let text: Vec<&str> = lines.iter().map(|l| unescape_txt(l)).collect();
        text.join("\n").trim().to_string()
    };
    let question = join(&body[..split]);
    let answer = join(&body[split + 1..]);
    if question.is_empty() || answer.is_empty() {
        return None;
    }

    Some(CardExport {
        question,
        answer,
        tag_name: current_tag.clone(),
        created_at: now,
    })
}

/// Deck with a tag list derived from the cards, in order of first use.
fn deck_from_cards(deck_name: &str, cards: Vec<CardExport>, now: DateTime<Utc>) -> DeckExport {
    let mut tags: Vec<TagExport> = Vec::new();
    for name in cards.iter().filter_map(|c| c.tag_name.as_deref()) {
        if !tags.iter().any(|t| t.name == name) {
            tags.push(TagExport {
                name: name.to_string(),
                description: String::new(),
                created_at: now,
            });
        }
    }
    DeckExport {
        name: deck_name.to_string(),
        description: String::new(),
        cards,
        tags,
        created_at: now,
    }
}

/// Create a new deck from a parsed file. Runs in one transaction; a taken
/// deck name gets a ` (n)` suffix. Cards with a blank side are skipped.
pub fn import_deck(conn: &Connection, export: &DeckExport, now: DateTime<Utc>) -> Result<ImportSummary> {
    let base_name = validation::deck_name(&export.name)?;

    let tx = conn.unchecked_transaction()?;
    let name = decks::available_deck_name(&tx, &base_name)?;
    let deck = decks::insert_deck(&tx, &name, now)?;

    let mut tag_ids: HashMap<String, i64> = HashMap::new();
    let listed = export.tags.iter().map(|t| t.name.as_str());
    let referenced = export.cards.iter().filter_map(|c| c.tag_name.as_deref());
    for raw in listed.chain(referenced) {
        if raw.trim().is_empty() {
            continue;
        }
        let tag_name = validation::tag_name(raw)?;
        if !tag_ids.contains_key(&tag_name) {
            let tag = tags::insert_tag(&tx, deck.id, &tag_name, now)?;
            tag_ids.insert(tag_name, tag.id);
        }
    }

    let mut card_count = 0;
    for card in &export.cards {
        let (Ok(question), Ok(answer)) = (
            validation::card_text(&card.question, "question"),
            validation::card_text(&card.answer, "answer"),
        ) else {
            continue;
        };
        let tag_id = match card.tag_name.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(raw) => tag_ids.get(&validation::tag_name(raw)?).copied(),
            None => None,
        };
        cards::insert_card(&tx, deck.id, tag_id, &question, &answer, now)?;
        card_count += 1;
    }
    tx.commit()?;

    tracing::info!(
        "Imported deck '{}' (id {}) with {} cards",
        deck.name,
        deck.id,
        card_count
    );

    Ok(ImportSummary {
        deck_id: deck.id,
        deck_name: deck.name,
        card_count,
        import_time: now,
    })
}
