// Blacklist endpoints

use crate::client::LokiClient;
use crate::error::Error;
use crate::models::{BlacklistRequest, BlacklistResponse, ListBody, ListResponse};

impl LokiClient {
    /// `GET /api/blacklist`. Not paginated server-side.
    pub async fn list_blacklist(&self) -> Result<ListResponse<BlacklistResponse>, Error> {
        let url = self.endpoint(&["api", "blacklist"])?;
        let body: ListBody<BlacklistResponse> = self.get(url).await?;
        Ok(body.into())
    }

    pub async fn add_blacklist(
        &self,
        entry: &BlacklistRequest,
    ) -> Result<serde_json::Value, Error> {
        let url = self.endpoint(&["api", "blacklist"])?;
        self.post(url, entry).await
    }

    pub async fn remove_blacklist(&self, ip: &str) -> Result<(), Error> {
        let url = self.endpoint(&["api", "blacklist", ip])?;
        self.delete(url).await
    }
}
