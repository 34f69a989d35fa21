//! Tag operations.

use reqwest::Method;
use serde_json::json;

use super::PageParams;
use crate::client::{FlashClient, Result};
use crate::domain::{CardPage, Tag, TagStats, TagWithStats, UpdateTag};

/// Obtained via [`FlashClient::tags()`].
#[derive(Debug)]
pub struct TagActions<'a> {
    pub(crate) client: &'a FlashClient,
}

impl TagActions<'_> {
    pub async fn list(&self) -> Result<Vec<Tag>> {
        self.client.fetch(self.client.request(Method::GET, "tags")?).await
    }

    pub async fn list_with_stats(&self) -> Result<Vec<TagWithStats>> {
        let request = self
            .client
            .request(Method::GET, "tags")?
            .query(&[("include_stats", "true")]);
        self.client.fetch(request).await
    }

    pub async fn by_deck(&self, deck_id: i64) -> Result<Vec<Tag>> {
        let path = format!("tags/deck/{}", deck_id);
        self.client.fetch(self.client.request(Method::GET, &path)?).await
    }

    pub async fn get(&self, id: i64) -> Result<Tag> {
        let path = format!("tags/{}", id);
        self.client.fetch(self.client.request(Method::GET, &path)?).await
    }

    pub async fn create(&self, deck_id: i64, name: &str) -> Result<Tag> {
        let request = self
            .client
            .request(Method::POST, "tags")?
            .json(&json!({ "deck_id": deck_id, "name": name }));
        self.client.fetch(request).await
    }

    /// Rename a tag; set `deck_id` to move it to another deck.
    pub async fn update(&self, id: i64, changes: &UpdateTag) -> Result<Tag> {
        let path = format!("tags/{}", id);
        let request = self.client.request(Method::PATCH, &path)?.json(changes);
        self.client.fetch(request).await
    }

    /// Delete a tag. With `delete_cards` its cards go too; otherwise they
    /// just lose the tag.
    pub async fn delete(&self, id: i64, delete_cards: bool) -> Result<()> {
        let path = format!("tags/{}", id);
        let mut request = self.client.request(Method::DELETE, &path)?;
        if delete_cards {
            request = request.query(&[("delete_cards", "true")]);
        }
        self.client.fetch_message(request).await.map(|_| ())
    }

    pub async fn stats(&self, id: i64) -> Result<TagStats> {
        let path = format!("tags/{}/stats", id);
        self.client.fetch(self.client.request(Method::GET, &path)?).await
    }

    pub async fn cards(&self, id: i64, page: Option<i64>, page_size: Option<i64>) -> Result<CardPage> {
        let path = format!("tags/{}/cards", id);
        let request = self
            .client
            .request(Method::GET, &path)?
            .query(&PageParams { page, page_size });
        self.client.fetch(request).await
    }
}
