//! Token USD price from the aggregator's simple-price endpoint.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;

use crate::config::PriceConfig;
use crate::error::{CastgateError, Result};
use crate::types::TokenPrice;

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    data: SimplePriceData,
}

#[derive(Debug, Deserialize)]
struct SimplePriceData {
    attributes: SimplePriceAttributes,
}

#[derive(Debug, Deserialize)]
struct SimplePriceAttributes {
    /// Map of lowercase token address to price string.
    #[serde(default)]
    token_prices: HashMap<String, String>,
}

/// Client for the price aggregator.
#[derive(Debug, Clone)]
pub struct PriceClient {
    client: Client,
    base_url: String,
    network: String,
    token_address: String,
}

impl PriceClient {
    pub fn new(config: &PriceConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            network: config.network.clone(),
            token_address: config.token_address.to_lowercase(),
        }
    }

    /// GET /simple/networks/{network}/token_price/{address} - Spot USD price.
    ///
    /// The simple endpoint only carries the spot price; 24h change and market
    /// cap stay 0.
    pub async fn fetch_price(&self) -> Result<TokenPrice> {
        let url = format!(
            "{}/simple/networks/{}/token_price/{}",
            self.base_url, self.network, self.token_address
        );
        let resp = self.client.get(&url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CastgateError::Http {
                status,
                message: body,
            });
        }

        let body: SimplePriceResponse = resp.json().await?;
        let usd = body
            .data
            .attributes
            .token_prices
            .get(&self.token_address)
            .map(|p| p.parse::<f64>())
            .transpose()
            .map_err(|e| CastgateError::Validation(format!("unparseable price: {e}")))?
            .unwrap_or(0.0);

        Ok(TokenPrice {
            usd,
            usd_24h_change: 0.0,
            usd_market_cap: 0.0,
        })
    }
}
