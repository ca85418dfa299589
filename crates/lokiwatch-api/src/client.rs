// Async HTTP client for the Loki IDS dashboard API.
//
// Base path: /api/
// Auth: none (the backend is expected to sit on a trusted network)

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::{ParseError, Url};

use crate::error::Error;
use crate::models::ErrorBody;
use crate::transport::TransportConfig;

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Loki IDS REST API.
///
/// Endpoint methods live in per-area modules (`alerts`, `signatures`,
/// `blacklist`, `iot`, `system`) as additional `impl LokiClient` blocks.
/// Every method is a single attempt; retries are the caller's business.
#[derive(Debug, Clone)]
pub struct LokiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl LokiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for the backend at `base_url` (e.g. `http://10.0.0.5:8080`).
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base path ends with `/` so relative joins land under it.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// WebSocket URL of the alert push stream (`ws[s]://host/ws/alerts`).
    pub fn push_url(&self) -> Result<Url, Error> {
        crate::websocket::push_url(&self.base_url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build an endpoint URL from path segments.
    ///
    /// Segments are percent-encoded individually, so caller-supplied
    /// values (IP addresses, device ids) can't escape their position.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        handle_response(resp).await
    }

    /// POST with query parameters and no body (device commands, MQTT connect).
    pub(crate) async fn post_with_params<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        debug!("POST {url} params={params:?}");

        let resp = self.http.post(url).query(params).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: Url,
        form: reqwest::multipart::Form,
    ) -> Result<T, Error> {
        debug!("POST {url} (multipart)");

        let resp = self.http.post(url).multipart(form).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        handle_empty(resp).await
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorBody>(&raw) {
        Ok(err) => err.message(),
        Err(_) if raw.is_empty() => status.to_string(),
        Err(_) => raw,
    };

    Error::Api {
        status: status.as_u16(),
        message,
    }
}
