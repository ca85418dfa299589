// Alert endpoints

use crate::client::LokiClient;
use crate::error::Error;
use crate::models::{AlertRequest, AlertResponse, ListBody, ListResponse};

impl LokiClient {
    /// `GET /api/alerts` with `page`, `page_size` and filter parameters.
    pub async fn list_alerts(
        &self,
        params: &[(String, String)],
    ) -> Result<ListResponse<AlertResponse>, Error> {
        let url = self.endpoint(&["api", "alerts"])?;
        let body: ListBody<AlertResponse> = self.get_with_params(url, params).await?;
        Ok(body.into())
    }

    pub async fn get_alert(&self, id: i64) -> Result<AlertResponse, Error> {
        let url = self.endpoint(&["api", "alerts", &id.to_string()])?;
        self.get(url).await
    }

    pub async fn create_alert(&self, alert: &AlertRequest) -> Result<AlertResponse, Error> {
        let url = self.endpoint(&["api", "alerts"])?;
        self.post(url, alert).await
    }

    pub async fn update_alert(
        &self,
        id: i64,
        alert: &AlertRequest,
    ) -> Result<AlertResponse, Error> {
        let url = self.endpoint(&["api", "alerts", &id.to_string()])?;
        self.put(url, alert).await
    }

    pub async fn delete_alert(&self, id: i64) -> Result<(), Error> {
        let url = self.endpoint(&["api", "alerts", &id.to_string()])?;
        self.delete(url).await
    }
}
