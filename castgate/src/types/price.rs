use serde::{Deserialize, Serialize};

/// Token price snapshot from the aggregator. The simple price endpoint only
/// carries the spot USD price; change and market cap stay 0 unless a richer
/// endpoint fills them in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenPrice {
    pub usd: f64,
    pub usd_24h_change: f64,
    pub usd_market_cap: f64,
}
