// Stats and system status endpoints

use crate::client::LokiClient;
use crate::error::Error;
use crate::models::{HealthResponse, StatsResponse, SyncResponse, SystemStatusResponse};

impl LokiClient {
    pub async fn stats(&self) -> Result<StatsResponse, Error> {
        let url = self.endpoint(&["api", "stats"])?;
        self.get(url).await
    }

    pub async fn system_status(&self) -> Result<SystemStatusResponse, Error> {
        let url = self.endpoint(&["api", "system", "status"])?;
        self.get(url).await
    }

    pub async fn health(&self) -> Result<HealthResponse, Error> {
        let url = self.endpoint(&["api", "system", "health"])?;
        self.get(url).await
    }

    /// Make the running IDS engine reload its rules.
    pub async fn reload_engine(&self) -> Result<SyncResponse, Error> {
        let url = self.endpoint(&["api", "system", "reload-signatures"])?;
        self.post_with_params(url, &[]).await
    }
}
