//! Deck import and export.

use reqwest::multipart::{Form, Part};
use reqwest::Method;

use crate::client::{FlashClient, Result};
use crate::domain::{ExportFormat, ExportLink, ImportSummary};

/// Obtained via [`FlashClient::transfer()`].
#[derive(Debug)]
pub struct TransferActions<'a> {
    pub(crate) client: &'a FlashClient,
}

impl TransferActions<'_> {
    /// Upload a `.json`, `.csv` or `.txt` deck file. The extension of
    /// `file_name` selects the parser; for CSV and TXT the stem names the deck.
    pub async fn import(&self, file_name: &str, contents: Vec<u8>) -> Result<ImportSummary> {
        let form = Form::new().part("file", Part::bytes(contents).file_name(file_name.to_string()));
        let request = self
            .client
            .request(Method::POST, "import-export/decks")?
            .multipart(form);
        self.client.fetch(request).await
    }

    /// Download a deck file.
    pub async fn download(&self, deck_id: i64, format: ExportFormat) -> Result<Vec<u8>> {
        let path = format!("import-export/decks/{}", deck_id);
        let request = self
            .client
            .request(Method::GET, &path)?
            .query(&[("download", "true"), ("format", format.extension())]);
        self.client.fetch_bytes(request).await
    }

    /// Have the server write the export to its export directory.
    pub async fn export(&self, deck_id: i64, format: ExportFormat) -> Result<ExportLink> {
        let path = format!("import-export/decks/{}", deck_id);
        let request = self
            .client
            .request(Method::GET, &path)?
            .query(&[("download", "false"), ("format", format.extension())]);
        self.client.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::actions::mock::{client_for, error, ok};
    use crate::client::Error;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_returns_raw_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/import-export/decks/1"))
            .and(query_param("download", "true"))
            .and(query_param("format", "csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ID,Question,Answer,Tag\n"))
            .mount(&server)
            .await;

        let bytes = client_for(&server)
            .transfer()
            .download(1, ExportFormat::Csv)
            .await
            .unwrap();
        assert_eq!(bytes, b"ID,Question,Answer,Tag\n");
    }

    #[tokio::test]
    async fn test_import_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import-export/decks"))
            .respond_with(ok(json!({
                "deck_id": 4, "deck_name": "Go (2)", "card_count": 2,
                "import_time": "2026-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let summary = client_for(&server)
            .transfer()
            .import("Go.json", b"{}".to_vec())
            .await
            .unwrap();
        assert_eq!(summary.deck_name, "Go (2)");
        assert_eq!(summary.card_count, 2);
    }

    #[tokio::test]
    async fn test_unsupported_format_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/import-export/decks"))
            .respond_with(error(400, "INVALID_PARAM", "unsupported file format"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .transfer()
            .import("deck.pdf", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "unsupported file format");
        assert!(matches!(err, Error::Api { status: 400, .. }));
    }
}
