use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row in the hosted backend's `users` table, keyed by `fid`. Upserted
/// best-effort on sign-in and balance changes; read back for the
/// leaderboard. The capability token is deliberately not part of this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub fid: u64,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub pfp_url: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub token_balance: f64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A row in the backend's `golden_casts` table. Written when an entitled
/// user publishes a golden cast; read back newest-first for the golden
/// feed. `created_at` is assigned by the backend and omitted on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenCast {
    pub cast_hash: String,
    pub fid: u64,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub pfp_url: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
