//! Client bootstrap: environment-driven configuration and construction of
//! every collaborator client.

use castgate::{
    HubClient, HubConfig, LedgerClient, LedgerConfig, PriceClient, PriceConfig, ProviderConfig,
    SignInFlow, SyncClient, SyncConfig,
};
use tracing::info;

use crate::error::GiltError;

pub const DEFAULT_HUB_URL: &str = "https://api.neynar.com/v2";
pub const DEFAULT_AUTH_URL: &str = "https://app.neynar.com/login";
pub const DEFAULT_PROVIDER_ORIGIN: &str = "https://app.neynar.com";
pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
/// Base mainnet.
pub const DEFAULT_CHAIN_ID: u64 = 8453;
/// $GILT token contract on Base.
pub const DEFAULT_TOKEN_ADDRESS: &str = "0x6117de9f5f889dac0561c70f3bcaf055c0b6914d";
pub const DEFAULT_PRICE_URL: &str = "https://api.geckoterminal.com/api/v2";
pub const DEFAULT_PRICE_NETWORK: &str = "base";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> Result<String, GiltError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(GiltError::Config(format!("{key} is not set"))),
    }
}

/// Hub client from `GILT_HUB_API_KEY` (plus optional `GILT_HUB_URL`).
pub fn hub_from_env() -> Result<HubClient, GiltError> {
    let api_key = require_env("GILT_HUB_API_KEY")?;
    let base_url = env_or("GILT_HUB_URL", DEFAULT_HUB_URL);
    Ok(HubClient::new(&HubConfig { base_url, api_key }))
}

/// Ledger client from `GILT_RPC_URL` / `GILT_TOKEN_ADDRESS`, with mainnet
/// defaults. Connecting reads the token's decimals from the contract.
pub async fn ledger_from_env() -> Result<LedgerClient, GiltError> {
    let chain_id = match std::env::var("GILT_CHAIN_ID") {
        Ok(v) => v
            .parse()
            .map_err(|_| GiltError::Config("GILT_CHAIN_ID must be an integer".into()))?,
        Err(_) => DEFAULT_CHAIN_ID,
    };
    let config = LedgerConfig {
        rpc_url: env_or("GILT_RPC_URL", DEFAULT_RPC_URL),
        chain_id,
        token_address: env_or("GILT_TOKEN_ADDRESS", DEFAULT_TOKEN_ADDRESS),
    };
    Ok(LedgerClient::connect(&config).await?)
}

/// Sync client from `GILT_SYNC_URL` + `GILT_SYNC_KEY`.
pub fn sync_from_env() -> Result<SyncClient, GiltError> {
    let base_url = require_env("GILT_SYNC_URL")?;
    let api_key = require_env("GILT_SYNC_KEY")?;
    Ok(SyncClient::new(&SyncConfig { base_url, api_key }))
}

/// Price client; every knob has a mainnet default.
pub fn price_from_env() -> PriceClient {
    PriceClient::new(&PriceConfig {
        base_url: env_or("GILT_PRICE_URL", DEFAULT_PRICE_URL),
        network: env_or("GILT_PRICE_NETWORK", DEFAULT_PRICE_NETWORK),
        token_address: env_or("GILT_TOKEN_ADDRESS", DEFAULT_TOKEN_ADDRESS),
    })
}

/// Everything the interactive session needs.
pub struct GiltClient {
    pub hub: HubClient,
    pub ledger: LedgerClient,
    pub sync: Option<SyncClient>,
    pub price: PriceClient,
    pub flow: SignInFlow,
    pub app_origin: String,
}

/// Build the full client set for `gilt run`.
///
/// 1. Resolves hub and provider credentials from the environment
///    (`GILT_HUB_API_KEY` and `GILT_CLIENT_ID` are required).
/// 2. Connects to the ledger and reads the token's decimals.
/// 3. The sync backend is optional: without `GILT_SYNC_URL` the client
///    runs with remote sync disabled.
///
/// # Errors
///
/// Returns `GiltError::Config` for missing or malformed environment
/// variables, or the ledger's own error when the decimals read fails.
pub async fn create_client(callback_port: u16) -> Result<GiltClient, GiltError> {
    let hub = hub_from_env()?;
    let ledger = ledger_from_env().await?;
    let price = price_from_env();

    let sync = match std::env::var("GILT_SYNC_URL") {
        Ok(_) => Some(sync_from_env()?),
        Err(_) => {
            info!("GILT_SYNC_URL not set, remote sync disabled");
            None
        }
    };

    let app_origin = format!("http://127.0.0.1:{callback_port}");
    let client_id = require_env("GILT_CLIENT_ID")?;
    let provider_origin = env_or("GILT_PROVIDER_ORIGIN", DEFAULT_PROVIDER_ORIGIN);
    let flow = SignInFlow::new(ProviderConfig {
        auth_url: env_or("GILT_AUTH_URL", DEFAULT_AUTH_URL),
        client_id,
        app_origin: app_origin.clone(),
        allowed_origins: vec![provider_origin, app_origin.clone()],
    });

    Ok(GiltClient {
        hub,
        ledger,
        sync,
        price,
        flow,
        app_origin,
    })
}
