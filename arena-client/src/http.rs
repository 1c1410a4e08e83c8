use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use arena_core::{ApiError, ServiceResult};
use arena_shared::Masked;

use crate::ClientError;

/// JSON-over-HTTP client for one collaborator.
///
/// Every failure comes back as a normalized [`ApiError`] tagged with `domain`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    domain: &'static str,
    token: Option<Masked<String>>,
}

impl ApiClient {
    pub fn new(
        domain: &'static str,
        base_url: impl Into<String>,
        timeout: Duration,
        token: Option<Masked<String>>,
    ) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            domain,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ServiceResult<T> {
        let response = self.send(self.client.get(self.url(path))).await?;
        self.decode(response).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ServiceResult<T> {
        let response = self
            .send(self.client.post(self.url(path)).json(body))
            .await?;
        self.decode(response).await
    }

    pub async fn delete(&self, path: &str) -> ServiceResult<()> {
        self.send(self.client.delete(self.url(path))).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> ServiceResult<Response> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            warn!("{} request failed: {}", self.domain, e);
            ApiError::transport(self.domain, e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("{} responded {}: {}", self.domain, status, body);
        Err(ApiError::normalize(self.domain, Some(status.as_u16()), &body))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> ServiceResult<T> {
        response.json::<T>().await.map_err(|e| {
            warn!("{} returned an unreadable body: {}", self.domain, e);
            ApiError::transport(self.domain, e)
        })
    }
}
