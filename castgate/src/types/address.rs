use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CastgateError;

/// An EVM account address: `0x` + 40 hex digits, case-insensitive on input,
/// rendered lowercase. Validation happens at the parse boundary so nothing
/// downstream ever holds a malformed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// Parse and validate an address string.
    ///
    /// # Errors
    ///
    /// Returns `CastgateError::InvalidAddress` when the input is not
    /// `0x` followed by exactly 40 hex digits.
    pub fn parse(value: &str) -> Result<Self, CastgateError> {
        let trimmed = value.trim();
        let stripped = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| CastgateError::InvalidAddress(format!("missing 0x prefix: {trimmed}")))?;
        if stripped.len() != 40 {
            return Err(CastgateError::InvalidAddress(format!(
                "expected 40 hex digits, got {}",
                stripped.len()
            )));
        }
        let decoded = hex::decode(stripped)
            .map_err(|e| CastgateError::InvalidAddress(format!("{trimmed}: {e}")))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&decoded);
        Ok(Address(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = CastgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = CastgateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}
