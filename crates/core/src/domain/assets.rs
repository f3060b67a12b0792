use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A non-fungible token identified on both sides of the bridge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetRef {
    /// Token contract on L1
    pub l1_token: Address,

    /// Token contract on L2
    pub l2_token: Address,

    /// Unique token identifier
    pub token_id: U256,

    /// Token identifier exactly as the caller supplied it
    pub token_id_text: String,
}

impl AssetRef {
    /// Validates caller-supplied contract addresses and token id
    pub fn parse(l1_token: &str, l2_token: &str, token_id: &str) -> Result<Self> {
        let l1 = parse_address("L1 token", l1_token)?;
        let l2 = parse_address("L2 token", l2_token)?;

        let id_text = token_id.trim();
        if id_text.is_empty() || !id_text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAsset(format!("token id '{}' is not an unsigned integer", token_id)));
        }
        let id = U256::from_dec_str(id_text)
            .map_err(|_| Error::InvalidAsset(format!("token id '{}' is out of range", token_id)))?;

        Ok(Self {
            l1_token: l1,
            l2_token: l2,
            token_id: id,
            token_id_text: id_text.to_string(),
        })
    }
}

/// Accepts only `0x` followed by exactly 40 hex digits
fn parse_address(label: &str, value: &str) -> Result<Address> {
    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| Error::InvalidAsset(format!("{} address '{}' must start with 0x", label, value)))?;

    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidAsset(format!("{} address '{}' is malformed", label, value)));
    }

    hex.parse::<Address>()
        .map_err(|e| Error::InvalidAsset(format!("{} address '{}': {}", label, value, e)))
}
