pub mod card;
pub mod deck;
pub mod review;
pub mod study;
pub mod tag;
pub mod transfer;

pub use card::{Card, CardPage, CardSearch, CardView, CreateCard, Pagination, UpdateCard};
pub use deck::{CreateDeck, Deck, DeckStats, DeckWithStats, UpdateDeck};
pub use review::{is_card_due, Review, ReviewLog, ReviewOutcome, ReviewRequest, ReviewResult};
pub use study::{StudyItem, StudySession};
pub use tag::{CreateTag, Tag, TagStats, TagWithStats, UpdateTag};
pub use transfer::{
  CardExport, DeckExport, ExportFormat, ExportLink, ImportSummary, LegacyDeckFile, RestoreCounts, SystemStats,
  TagExport,
};
