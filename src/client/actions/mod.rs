//! Per-resource operations, reached through [`FlashClient`](super::FlashClient)
//! accessors such as `client.decks()`.

mod cards;
mod decks;
mod study;
mod system;
mod tags;
mod transfer;

pub use cards::{CardActions, CardQuery};
pub use decks::DeckActions;
pub use study::StudyActions;
pub use system::SystemActions;
pub use tags::TagActions;
pub use transfer::TransferActions;

use serde::Serialize;

/// `?page=&page_size=` for paginated listings
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub(crate) struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
}
