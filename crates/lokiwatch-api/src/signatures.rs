// Signature endpoints

use crate::client::LokiClient;
use crate::error::Error;
use crate::models::{
    ImportResponse, ListBody, ListResponse, SignatureRequest, SignatureResponse, SyncResponse,
};

/// MIME type sent with uploaded rule files.
const YAML_MIME: &str = "application/x-yaml";

impl LokiClient {
    /// `GET /api/signatures` with `page`, `page_size`, `search`, `action`, `enabled`.
    pub async fn list_signatures(
        &self,
        params: &[(String, String)],
    ) -> Result<ListResponse<SignatureResponse>, Error> {
        let url = self.endpoint(&["api", "signatures"])?;
        let body: ListBody<SignatureResponse> = self.get_with_params(url, params).await?;
        Ok(body.into())
    }

    pub async fn get_signature(&self, id: i64) -> Result<SignatureResponse, Error> {
        let url = self.endpoint(&["api", "signatures", &id.to_string()])?;
        self.get(url).await
    }

    pub async fn create_signature(
        &self,
        signature: &SignatureRequest,
    ) -> Result<SignatureResponse, Error> {
        let url = self.endpoint(&["api", "signatures"])?;
        self.post(url, signature).await
    }

    /// Replace a signature. The body always carries every field.
    pub async fn update_signature(
        &self,
        id: i64,
        signature: &SignatureRequest,
    ) -> Result<SignatureResponse, Error> {
        let url = self.endpoint(&["api", "signatures", &id.to_string()])?;
        self.put(url, signature).await
    }

    pub async fn delete_signature(&self, id: i64) -> Result<(), Error> {
        let url = self.endpoint(&["api", "signatures", &id.to_string()])?;
        self.delete(url).await
    }

    /// Upload a YAML rule file to `POST /api/signatures/reload`.
    ///
    /// The file goes in the multipart field `file`. The backend rejects
    /// anything that isn't `.yaml`/`.yml`, so check first and fail without
    /// a round trip.
    pub async fn import_signatures(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<ImportResponse, Error> {
        if !is_yaml_file_name(file_name) {
            return Err(Error::Validation {
                field: "file",
                reason: format!("{file_name} is not a .yaml or .yml file"),
            });
        }

        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name.to_owned())
            .mime_str(YAML_MIME)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = self.endpoint(&["api", "signatures", "reload"])?;
        self.post_multipart(url, form).await
    }

    /// Write the database rules back to the engine's YAML file.
    pub async fn sync_signatures_to_yaml(&self) -> Result<SyncResponse, Error> {
        let url = self.endpoint(&["api", "signatures", "sync-to-yaml"])?;
        self.post_with_params(url, &[]).await
    }
}

/// Whether `name` carries a YAML extension (case-insensitive).
pub fn is_yaml_file_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".yaml") || lower.ends_with(".yml")
}
