//! Best-effort persistence to the hosted backend (PostgREST-style API).
//!
//! Two tables: `users` (upserts keyed by `fid`, read back for the
//! leaderboard) and `golden_casts` (append-only, read back newest-first
//! for the golden feed). The caller decides whether to block on writes
//! (one-shot commands) or spawn them fire-and-forget (the session client).

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::SyncConfig;
use crate::error::{CastgateError, Result};
use crate::types::{GoldenCast, UserRow};

const USERS_RESOURCE: &str = "/rest/v1/users";
const GOLDEN_RESOURCE: &str = "/rest/v1/golden_casts";

/// Client for the hosted sync backend.
#[derive(Debug, Clone)]
pub struct SyncClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SyncClient {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Upsert one user row, merging on the `fid` key.
    pub async fn upsert_user(&self, row: &UserRow) -> Result<()> {
        self.post(
            USERS_RESOURCE,
            &[("on_conflict", "fid")],
            Some("resolution=merge-duplicates"),
            &[row],
        )
        .await
    }

    /// Top users by token balance, descending. Failures surface as errors;
    /// rows are never fabricated.
    pub async fn top_users(&self, limit: u32) -> Result<Vec<UserRow>> {
        let limit = limit.to_string();
        self.get(
            USERS_RESOURCE,
            &[
                (
                    "select",
                    "fid,username,display_name,pfp_url,wallet_address,token_balance,updated_at",
                ),
                ("order", "token_balance.desc"),
                ("limit", limit.as_str()),
            ],
        )
        .await
    }

    /// Record one golden cast.
    pub async fn insert_golden_cast(&self, row: &GoldenCast) -> Result<()> {
        self.post(GOLDEN_RESOURCE, &[], None, &[row]).await
    }

    /// Latest golden casts, newest first.
    pub async fn golden_casts(&self, limit: u32) -> Result<Vec<GoldenCast>> {
        let limit = limit.to_string();
        self.get(
            GOLDEN_RESOURCE,
            &[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ],
        )
        .await
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Request plumbing
    // -----------------------------------------------------------------------

    async fn get<T: DeserializeOwned>(&self, resource: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, resource);
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", self.api_key))
            .query(query)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_for(resp).await);
        }
        resp.json::<T>().await.map_err(CastgateError::Request)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
        prefer: Option<&str>,
        body: &B,
    ) -> Result<()> {
        let url = format!("{}{}", self.base_url, resource);
        let mut req = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", self.api_key));
        if let Some(prefer) = prefer {
            req = req.header("prefer", prefer);
        }
        let resp = req.query(query).json(body).send().await?;

        if !resp.status().is_success() {
            return Err(error_for(resp).await);
        }
        Ok(())
    }
}

async fn error_for(resp: reqwest::Response) -> CastgateError {
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    CastgateError::Http { status, message }
}
