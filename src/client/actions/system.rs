//! System administration: statistics, backup, restore and clear.

use reqwest::multipart::{Form, Part};
use reqwest::Method;

use crate::client::{FlashClient, Result};
use crate::domain::{RestoreCounts, SystemStats};

/// Obtained via [`FlashClient::system()`].
#[derive(Debug)]
pub struct SystemActions<'a> {
    pub(crate) client: &'a FlashClient,
}

impl SystemActions<'_> {
    /// Cheap round trip to check that the API is reachable and the token works.
    pub async fn ping(&self) -> Result<String> {
        self.client.fetch(self.client.request(Method::GET, "ping")?).await
    }

    pub async fn stats(&self) -> Result<SystemStats> {
        self.client
            .fetch(self.client.request(Method::GET, "system/stats")?)
            .await
    }

    /// The full backup file.
    pub async fn backup(&self) -> Result<Vec<u8>> {
        self.client
            .fetch_bytes(self.client.request(Method::GET, "system/backup")?)
            .await
    }

    /// Restore a backup file. With `clear_existing` the current data is
    /// deleted first.
    pub async fn restore(&self, contents: Vec<u8>, clear_existing: bool) -> Result<RestoreCounts> {
        let form = Form::new().part("file", Part::bytes(contents).file_name("backup.json"));
        let request = self
            .client
            .request(Method::POST, "system/restore")?
            .query(&[("clear_existing", clear_existing)])
            .multipart(form);
        self.client.fetch(request).await
    }

    /// Delete every deck, tag, card and review.
    pub async fn clear(&self) -> Result<()> {
        self.client
            .fetch_message(self.client.request(Method::DELETE, "system/clear")?)
            .await
            .map(|_| ())
    }
}
