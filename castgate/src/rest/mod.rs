pub mod endpoints;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::HubConfig;
use crate::error::{CastgateError, Result};

/// HTTP client wrapper for the hub REST API. Carries the API key on every
/// request via the `api_key` header.
#[derive(Debug, Clone)]
pub struct HubClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HubClient {
    pub fn new(config: &HubConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("api_key", &self.api_key)
            .query(query)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CastgateError::Http {
                status,
                message: body,
            });
        }

        resp.json::<T>().await.map_err(CastgateError::Request)
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .header("api_key", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CastgateError::Http {
                status,
                message: body,
            });
        }

        resp.json::<T>().await.map_err(CastgateError::Request)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
