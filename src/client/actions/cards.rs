//! Card operations.

use reqwest::Method;
use serde::Serialize;

use crate::client::{FlashClient, Result};
use crate::domain::{CardPage, CardView, CreateCard, UpdateCard};

/// Filters for [`CardActions::search`]. Unset fields are left out of the query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CardQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<i64>,
    /// Substring of the question or answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
}

/// Obtained via [`FlashClient::cards()`].
#[derive(Debug)]
pub struct CardActions<'a> {
    pub(crate) client: &'a FlashClient,
}

impl CardActions<'_> {
    pub async fn search(&self, query: &CardQuery) -> Result<CardPage> {
        let request = self.client.request(Method::GET, "cards")?.query(query);
        self.client.fetch(request).await
    }

    /// The card with its deck and tag names, review state and due flag.
    pub async fn get(&self, id: i64) -> Result<CardView> {
        let path = format!("cards/{}", id);
        self.client.fetch(self.client.request(Method::GET, &path)?).await
    }

    pub async fn create(&self, card: &CreateCard) -> Result<CardView> {
        let request = self.client.request(Method::POST, "cards")?.json(card);
        self.client.fetch(request).await
    }

    /// Partial update; `tag_id: Some(None)` clears the tag.
    pub async fn update(&self, id: i64, changes: &UpdateCard) -> Result<CardView> {
        let path = format!("cards/{}", id);
        let request = self.client.request(Method::PATCH, &path)?.json(changes);
        self.client.fetch(request).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let path = format!("cards/{}", id);
        self.client
            .fetch_message(self.client.request(Method::DELETE, &path)?)
            .await
            .map(|_| ())
    }
}
