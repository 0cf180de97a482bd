/// Configuration for the hub (social-graph) client.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Base URL for the hub REST API (e.g. `https://api.neynar.com/v2`).
    pub base_url: String,
    /// API key sent in the `api_key` header on every request.
    pub api_key: String,
}

/// Configuration for the identity-provider sign-in flow.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider sign-in page (e.g. `https://app.neynar.com/login`).
    pub auth_url: String,
    /// Client identifier issued by the provider. Sign-in aborts before
    /// opening anything when this is empty.
    pub client_id: String,
    /// Origin of this application, passed to the provider as the callback
    /// origin (e.g. `http://127.0.0.1:9311`).
    pub app_origin: String,
    /// Origins whose messages are honored. Anything else is discarded.
    pub allowed_origins: Vec<String>,
}

/// Configuration for ledger balance reads.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint (e.g. `https://mainnet.base.org`).
    pub rpc_url: String,
    /// Chain ID, informational only (Base mainnet = 8453).
    pub chain_id: u64,
    /// ERC-20 token contract address.
    pub token_address: String,
}

/// Configuration for the hosted sync backend.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Backend base URL (PostgREST-style, e.g. `https://xyz.supabase.co`).
    pub base_url: String,
    /// Service key sent as both `apikey` and bearer token.
    pub api_key: String,
}

/// Configuration for the price aggregator.
#[derive(Debug, Clone)]
pub struct PriceConfig {
    /// Aggregator base URL (e.g. `https://api.geckoterminal.com/api/v2`).
    pub base_url: String,
    /// Network slug the token lives on (e.g. `base`).
    pub network: String,
    /// Token contract address to price.
    pub token_address: String,
}
