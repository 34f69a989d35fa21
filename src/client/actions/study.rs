//! Study sessions and review submission.

use reqwest::{Method, RequestBuilder};
use serde_json::json;

use crate::client::{FlashClient, Result};
use crate::domain::{ReviewOutcome, ReviewResult, StudySession};

/// Obtained via [`FlashClient::study()`].
#[derive(Debug)]
pub struct StudyActions<'a> {
    pub(crate) client: &'a FlashClient,
}

fn with_limit(request: RequestBuilder, limit: Option<i64>) -> RequestBuilder {
    match limit {
        Some(limit) => request.query(&[("limit", limit)]),
        None => request,
    }
}

impl StudyActions<'_> {
    /// Shuffled queue from one deck, due cards first. The server defaults the
    /// limit to 20 and caps it at 100.
    pub async fn deck(&self, deck_id: i64, limit: Option<i64>) -> Result<StudySession> {
        let path = format!("study/deck/{}", deck_id);
        let request = with_limit(self.client.request(Method::POST, &path)?, limit);
        self.client.fetch(request).await
    }

    pub async fn tag(&self, tag_id: i64, limit: Option<i64>) -> Result<StudySession> {
        let path = format!("study/tag/{}", tag_id);
        let request = with_limit(self.client.request(Method::POST, &path)?, limit);
        self.client.fetch(request).await
    }

    /// Random cards from all active decks (default 10, max 50).
    pub async fn random(&self, limit: Option<i64>) -> Result<StudySession> {
        let request = with_limit(self.client.request(Method::POST, "study/random")?, limit);
        self.client.fetch(request).await
    }

    /// Cards due now, new cards first.
    pub async fn due(&self, limit: Option<i64>) -> Result<StudySession> {
        let request = with_limit(self.client.request(Method::GET, "study/due")?, limit);
        self.client.fetch(request).await
    }

    /// Submit a recall result. The server computes the new schedule.
    pub async fn review(&self, card_id: i64, result: ReviewResult) -> Result<ReviewOutcome> {
        let path = format!("study/review/{}", card_id);
        let request = self
            .client
            .request(Method::POST, &path)?
            .json(&json!({ "result": result }));
        self.client.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::actions::mock::{client_for, error, ok};
    use crate::client::Error;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer};

    #[tokio::test]
    async fn test_due_with_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/study/due"))
            .and(query_param("limit", "5"))
            .respond_with(ok(json!({
                "queue": [{"card_id": 1, "question": "Go问题", "answer": "Go答案", "deck_name": "Go"}],
                "current": 0, "total": 1, "completed": 0,
                "start_time": "2026-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let session = client_for(&server).study().due(Some(5)).await.unwrap();
        assert_eq!(session.total, 1);
        assert_eq!(session.queue[0].question, "Go问题");
        assert_eq!(session.queue[0].tag_name, None);
    }

    #[tokio::test]
    async fn test_review_sends_numeric_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/study/review/7"))
            .and(body_json(json!({"result": 0})))
            .respond_with(ok(json!({
                "success": true, "card_id": 7,
                "next_review": "2026-01-02T00:00:00Z",
                "interval": 1, "e_factor": 1.8, "repetitions": 0,
                "message": "We'll review this card again tomorrow"
            })))
            .mount(&server)
            .await;

        let outcome = client_for(&server)
            .study()
            .review(7, ReviewResult::Again)
            .await
            .unwrap();
        assert_eq!(outcome.interval, 1);
        assert_eq!(outcome.repetitions, 0);
    }

    #[tokio::test]
    async fn test_archived_deck_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/study/deck/2"))
            .respond_with(error(409, "CONFLICT", "deck 'Old' is archived and cannot be studied"))
            .mount(&server)
            .await;

        let err = client_for(&server).study().deck(2, None).await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 409, .. }));
    }
}
