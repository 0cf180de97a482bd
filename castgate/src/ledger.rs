//! Ledger balance reads: ERC-20 `balanceOf`/`decimals` over JSON-RPC.
//!
//! The token's fractional precision is read from the contract once at
//! construction, never guessed. Raw ledger integers are converted to display
//! units by exact decimal division so gate thresholds are not perturbed by
//! binary floating point.

use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LedgerConfig;
use crate::error::{CastgateError, Result};
use crate::types::Address;

/// `balanceOf(address)` function selector.
const SELECTOR_BALANCE_OF: &str = "70a08231";
/// `decimals()` function selector.
const SELECTOR_DECIMALS: &str = "313ce567";

/// A balance observation: the raw ledger integer and its display-unit value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TokenBalance {
    pub raw: u128,
    pub units: f64,
}

impl TokenBalance {
    pub const ZERO: TokenBalance = TokenBalance {
        raw: 0,
        units: 0.0,
    };
}

/// Read-only client for the token contract.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    client: Client,
    rpc_url: String,
    token: Address,
    decimals: u8,
}

impl LedgerClient {
    /// Connect to the ledger: validates the configured token address and
    /// reads `decimals()` from the contract.
    ///
    /// # Errors
    ///
    /// Returns an error when the token address is malformed or the decimals
    /// read fails; a client is never handed out with guessed precision.
    pub async fn connect(config: &LedgerConfig) -> Result<Self> {
        let token = Address::parse(&config.token_address)?;
        let client = Client::new();
        let rpc_url = config.rpc_url.clone();

        let raw = eth_call(&client, &rpc_url, &token, SELECTOR_DECIMALS, None).await?;
        let value = decode_uint(&raw)?;
        let decimals = u8::try_from(value)
            .map_err(|_| CastgateError::Validation(format!("decimals out of range: {value}")))?;
        debug!(token = %token, decimals, "ledger connected");

        Ok(Self {
            client,
            rpc_url,
            token,
            decimals,
        })
    }

    /// The token's declared fractional precision.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// The token contract address.
    pub fn token(&self) -> &Address {
        &self.token
    }

    /// Read the current balance of `address` from the ledger.
    pub async fn balance_of(&self, address: &Address) -> Result<TokenBalance> {
        let raw_hex = eth_call(
            &self.client,
            &self.rpc_url,
            &self.token,
            SELECTOR_BALANCE_OF,
            Some(address),
        )
        .await?;
        let raw = decode_uint(&raw_hex)?;
        let units = to_display_units(raw, self.decimals)?;
        Ok(TokenBalance { raw, units })
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC plumbing
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: (CallParams<'a>, &'static str),
}

#[derive(Debug, Serialize)]
struct CallParams<'a> {
    to: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

async fn eth_call(
    client: &Client,
    rpc_url: &str,
    token: &Address,
    selector: &str,
    arg: Option<&Address>,
) -> Result<String> {
    let to = token.to_string();
    let data = encode_call(selector, arg);
    let request = RpcRequest {
        jsonrpc: "2.0",
        id: 1,
        method: "eth_call",
        params: (
            CallParams {
                to: &to,
                data: &data,
            },
            "latest",
        ),
    };

    let resp = client.post(rpc_url).json(&request).send().await?;
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(CastgateError::Http {
            status,
            message: body,
        });
    }

    let body: RpcResponse = resp.json().await?;
    if let Some(err) = body.error {
        return Err(CastgateError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    body.result
        .ok_or_else(|| CastgateError::Validation("eth_call response missing result".into()))
}

/// Build `0x` calldata: 4-byte selector, then the address argument (if any)
/// left-padded to 32 bytes.
fn encode_call(selector: &str, arg: Option<&Address>) -> String {
    match arg {
        Some(addr) => format!(
            "0x{selector}{:0>64}",
            hex::encode(addr.as_bytes())
        ),
        None => format!("0x{selector}"),
    }
}

/// Decode a hex-encoded uint256 result, rejecting values above 128 bits of
/// significance rather than truncating them.
fn decode_uint(value: &str) -> Result<u128> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    let significant = stripped.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(0);
    }
    if significant.len() > 32 {
        return Err(CastgateError::Overflow(format!(
            "uint exceeds 128 bits: {value}"
        )));
    }
    u128::from_str_radix(significant, 16)
        .map_err(|e| CastgateError::Validation(format!("invalid uint hex {value}: {e}")))
}

/// Convert a raw ledger integer to display units by exact decimal division.
///
/// # Errors
///
/// Returns `CastgateError::Overflow` when the value or precision exceeds
/// what `Decimal` can represent exactly.
pub fn to_display_units(raw: u128, decimals: u8) -> Result<f64> {
    let signed = i128::try_from(raw)
        .map_err(|_| CastgateError::Overflow(format!("raw balance too large: {raw}")))?;
    let scaled = Decimal::try_from_i128_with_scale(signed, u32::from(decimals))
        .map_err(|e| CastgateError::Overflow(format!("raw {raw} at {decimals} decimals: {e}")))?;
    scaled
        .to_f64()
        .ok_or_else(|| CastgateError::Overflow(format!("raw {raw} at {decimals} decimals")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> Address {
        Address::parse("0x6117de9f5f889dac0561c70f3bcaf055c0b6914d").unwrap()
    }

    // ---- encode_call ----

    #[test]
    fn test_encode_balance_of_pads_address() {
        let data = encode_call(SELECTOR_BALANCE_OF, Some(&addr()));
        assert_eq!(
            data,
            "0x70a082310000000000000000000000006117de9f5f889dac0561c70f3bcaf055c0b6914d"
        );
        // 0x + 4-byte selector + 32-byte word
        assert_eq!(data.len(), 2 + 8 + 64);
    }

    #[test]
    fn test_encode_decimals_has_no_argument() {
        assert_eq!(encode_call(SELECTOR_DECIMALS, None), "0x313ce567");
    }

    // ---- decode_uint ----

    #[test]
    fn test_decode_uint_full_word() {
        let padded = format!("0x{:0>64}", "152d02c7e14af6800000"); // 1e23
        assert_eq!(decode_uint(&padded).unwrap(), 100_000_000_000_000_000_000_000);
    }

    #[test]
    fn test_decode_uint_zero_and_empty() {
        assert_eq!(decode_uint("0x0").unwrap(), 0);
        assert_eq!(decode_uint(&format!("0x{}", "0".repeat(64))).unwrap(), 0);
        assert_eq!(decode_uint("0x").unwrap(), 0);
    }

    #[test]
    fn test_decode_uint_small_value() {
        assert_eq!(decode_uint("0x249f0").unwrap(), 150_000);
    }

    #[test]
    fn test_decode_uint_rejects_over_128_bits() {
        // 2^128 exactly: 1 followed by 32 zero hex digits.
        let too_big = format!("0x{:0>64}", format!("1{}", "0".repeat(32)));
        assert!(matches!(
            decode_uint(&too_big),
            Err(CastgateError::Overflow(_))
        ));
    }

    #[test]
    fn test_decode_uint_max_u128_accepted() {
        let max = format!("0x{:0>64}", "f".repeat(32));
        assert_eq!(decode_uint(&max).unwrap(), u128::MAX);
    }

    #[test]
    fn test_decode_uint_rejects_garbage() {
        assert!(decode_uint("0xzz").is_err());
    }

    // ---- to_display_units ----

    #[test]
    fn test_display_units_exact_at_threshold() {
        // 1e23 raw at 18 decimals is exactly 100,000 tokens; binary-float
        // division would land a hair under and break the >= gate.
        let units = to_display_units(100_000_000_000_000_000_000_000, 18).unwrap();
        assert_eq!(units, 100_000.0);
    }

    #[test]
    fn test_display_units_dust() {
        let units = to_display_units(150_000, 18).unwrap();
        assert!((units - 1.5e-13).abs() < 1e-27, "got {units}");
    }

    #[test]
    fn test_display_units_zero() {
        assert_eq!(to_display_units(0, 18).unwrap(), 0.0);
    }

    #[test]
    fn test_display_units_zero_decimals() {
        assert_eq!(to_display_units(42, 0).unwrap(), 42.0);
    }

    #[test]
    fn test_display_units_rejects_unsupported_precision() {
        assert!(to_display_units(1, 77).is_err());
    }
}
