//! Typed client for the flashcard REST API.
//!
//! # Example
//!
//! ```no_run
//! use flashmind::client::FlashClient;
//!
//! # async fn example() -> flashmind::client::Result<()> {
//! let client = FlashClient::builder()
//!     .base_url("http://localhost:8080/api/v1")
//!     .token("secret")
//!     .build()?;
//!
//! let deck = client.decks().create("Go").await?;
//! let session = client.study().deck(deck.id, None).await?;
//! println!("{} cards to study", session.total);
//! # Ok(())
//! # }
//! ```

mod actions;
mod error;
mod token;

pub use actions::{
    CardActions, CardQuery, DeckActions, StudyActions, SystemActions, TagActions, TransferActions,
};
pub use error::{Error, Result};
pub use token::{FileToken, MemoryToken, TokenSource};

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::response::ApiResponse;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Default timeout for requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the `/api/v1` REST API.
///
/// Every call is a single request: no retries and no queuing. Errors are
/// returned to the caller classified as [`Error`].
#[derive(Debug, Clone)]
pub struct FlashClient {
    http: Client,
    base_url: Url,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl FlashClient {
    /// Client for [`DEFAULT_BASE_URL`] without a token.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn decks(&self) -> DeckActions<'_> {
        DeckActions { client: self }
    }

    pub fn tags(&self) -> TagActions<'_> {
        TagActions { client: self }
    }

    pub fn cards(&self) -> CardActions<'_> {
        CardActions { client: self }
    }

    pub fn study(&self) -> StudyActions<'_> {
        StudyActions { client: self }
    }

    /// Deck import and export.
    pub fn transfer(&self) -> TransferActions<'_> {
        TransferActions { client: self }
    }

    /// Statistics, backup, restore and clear.
    pub fn system(&self) -> SystemActions<'_> {
        SystemActions { client: self }
    }

    /// Start a request to `path` (relative to the base URL), with the current
    /// token attached.
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("invalid path {}: {}", path, e)))?;

        let mut request = self.http.request(method, url);
        if let Some(token) = self.tokens.as_ref().and_then(|source| source.token()) {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    /// Send a request and return the raw response when its status is 2xx.
    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(Error::from_transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.map_err(Error::from_transport)?;
        tracing::debug!(status = status.as_u16(), "API request failed");
        Err(Error::from_status(status, &body))
    }

    /// Send a request and unwrap the `data` of the response envelope.
    pub(crate) async fn fetch<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let envelope: ApiResponse<T> = self.envelope(request).await?;
        envelope
            .data
            .ok_or_else(|| Error::Decode("response has no data".to_string()))
    }

    /// Send a request whose envelope carries only a message.
    pub(crate) async fn fetch_message(&self, request: RequestBuilder) -> Result<String> {
        let envelope: ApiResponse<serde_json::Value> = self.envelope(request).await?;
        Ok(envelope.message)
    }

    /// Send a request for a file download.
    pub(crate) async fn fetch_bytes(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = self.execute(request).await?;
        let bytes = response.bytes().await.map_err(Error::from_transport)?;
        Ok(bytes.to_vec())
    }

    async fn envelope<T>(&self, request: RequestBuilder) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.execute(request).await?;
        let bytes = response.bytes().await.map_err(Error::from_transport)?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Builder for a customized [`FlashClient`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_url: String,
    timeout: Duration,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            tokens: None,
        }
    }

    /// Base URL including the `/api/v1` prefix.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Defaults to 5 seconds.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    /// Send a fixed token.
    pub fn token(self, token: impl Into<String>) -> Self {
        self.token_source(Arc::new(MemoryToken::new(token)))
    }

    /// Read the token from `source` before each request.
    pub fn token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(source);
        self
    }

    /// Build the client. Fails with [`Error::Config`] on a malformed base URL.
    pub fn build(self) -> Result<FlashClient> {
        // Url::join drops the last segment unless the base ends with a slash
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| Error::Config(format!("invalid base URL {}: {}", self.base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "unsupported URL scheme: {}",
                base_url.scheme()
            )));
        }

        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(FlashClient {
            http,
            base_url,
            tokens: self.tokens,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
