//! Deck operations.

use reqwest::Method;
use serde_json::json;

use super::PageParams;
use crate::client::{FlashClient, Result};
use crate::domain::{CardPage, Deck, DeckStats, DeckWithStats, UpdateDeck};

/// Obtained via [`FlashClient::decks()`].
#[derive(Debug)]
pub struct DeckActions<'a> {
    pub(crate) client: &'a FlashClient,
}

impl DeckActions<'_> {
    pub async fn list(&self) -> Result<Vec<Deck>> {
        self.client.fetch(self.client.request(Method::GET, "decks")?).await
    }

    /// Every deck with its statistics.
    pub async fn list_with_stats(&self) -> Result<Vec<DeckWithStats>> {
        let request = self
            .client
            .request(Method::GET, "decks")?
            .query(&[("include_stats", "true")]);
        self.client.fetch(request).await
    }

    pub async fn get(&self, id: i64) -> Result<Deck> {
        let path = format!("decks/{}", id);
        self.client.fetch(self.client.request(Method::GET, &path)?).await
    }

    pub async fn create(&self, name: &str) -> Result<Deck> {
        let request = self
            .client
            .request(Method::POST, "decks")?
            .json(&json!({ "name": name }));
        self.client.fetch(request).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateDeck) -> Result<Deck> {
        let path = format!("decks/{}", id);
        let request = self.client.request(Method::PATCH, &path)?.json(changes);
        self.client.fetch(request).await
    }

    /// Shorthand for an update that only flips the archive flag.
    pub async fn set_archived(&self, id: i64, archived: bool) -> Result<Deck> {
        let changes = UpdateDeck {
            archived: Some(archived),
            ..UpdateDeck::default()
        };
        self.update(id, &changes).await
    }

    /// Delete a deck with its tags, cards and review history.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let path = format!("decks/{}", id);
        self.client
            .fetch_message(self.client.request(Method::DELETE, &path)?)
            .await
            .map(|_| ())
    }

    pub async fn stats(&self, id: i64) -> Result<DeckStats> {
        let path = format!("decks/{}/stats", id);
        self.client.fetch(self.client.request(Method::GET, &path)?).await
    }

    /// One page of a deck's cards, newest first.
    pub async fn cards(&self, id: i64, page: Option<i64>, page_size: Option<i64>) -> Result<CardPage> {
        let path = format!("decks/{}/cards", id);
        let request = self
            .client
            .request(Method::GET, &path)?
            .query(&PageParams { page, page_size });
        self.client.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::{client_for, deck_json, error, ok};
    use crate::client::Error;
    use crate::domain::UpdateDeck;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer};

    #[tokio::test]
    async fn test_list_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/decks"))
            .respond_with(ok(vec![deck_json(1, "Go"), deck_json(2, "Rust")]))
            .expect(1)
            .mount(&server)
            .await;

        let decks = client_for(&server).decks().list().await.unwrap();
        assert_eq!(decks.len(), 2);
        assert_eq!(decks[1].name, "Rust");
    }

    #[tokio::test]
    async fn test_list_with_stats() {
        let server = MockServer::start().await;
        let mut row = deck_json(1, "Go");
        row["stats"] = serde_json::json!({
            "total_cards": 3, "due_cards": 2, "new_cards": 1,
            "tag_count": 0, "today_studied": 0, "week_studied": 1
        });
        Mock::given(method("GET"))
            .and(path("/api/v1/decks"))
            .and(query_param("include_stats", "true"))
            .respond_with(ok(vec![row]))
            .mount(&server)
            .await;

        let decks = client_for(&server).decks().list_with_stats().await.unwrap();
        assert_eq!(decks[0].deck.name, "Go");
        assert_eq!(decks[0].stats.due_cards, 2);
    }

    #[tokio::test]
    async fn test_create_sends_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/decks"))
            .and(body_json(serde_json::json!({"name": "Go"})))
            .respond_with(ok(deck_json(1, "Go")))
            .mount(&server)
            .await;

        let deck = client_for(&server).decks().create("Go").await.unwrap();
        assert_eq!(deck.id, 1);
    }

    #[tokio::test]
    async fn test_update_sends_only_set_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/decks/1"))
            .and(body_json(serde_json::json!({"archived": true})))
            .respond_with(ok(deck_json(1, "Go")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.decks().set_archived(1, true).await.unwrap();

        // Unmatched body falls through to wiremock's 404
        let changes = UpdateDeck {
            name: Some("Golang".into()),
            archived: None,
        };
        let err = client.decks().update(1, &changes).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_missing_deck() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/decks/9"))
            .respond_with(error(404, "NOT_FOUND", "deck not found"))
            .mount(&server)
            .await;

        let err = client_for(&server).decks().get(9).await.unwrap_err();
        assert!(matches!(&err, Error::NotFound(m) if m == "deck not found"));
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/decks/4"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "SUCCESS", "message": "deck deleted"
            })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).decks().delete(4).await.unwrap();
    }
}
