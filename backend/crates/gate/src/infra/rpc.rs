//! JSON-RPC ownership oracle
//!
//! Read-only `eth_call` against the key contract. The call asks the
//! contract which token (if any) the address owns and whether the
//! holding flag is set; transport and decode failures surface as
//! errors, never as "does not own".

use crate::domain::repository::OwnershipOracle;
use crate::domain::value_objects::EthAddress;
use crate::error::{GateError, GateResult};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// ABI word size in hex characters
const WORD_HEX: usize = 64;

#[derive(Deserialize)]
struct RpcEnvelope {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// `eth_call`-backed ownership oracle
pub struct EthRpcOracle {
    client: reqwest::Client,
    rpc_url: String,
    contract_address: String,
    /// 4-byte selector of `tokenOfOwner(address)`, hex encoded
    selector: String,
}

impl EthRpcOracle {
    pub fn new(rpc_url: String, contract_address: String) -> GateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GateError::Rpc(e.to_string()))?;
        let digest = platform::eth::keccak256(b"tokenOfOwner(address)");
        Ok(Self {
            client,
            rpc_url,
            contract_address,
            selector: hex::encode(&digest[..4]),
        })
    }

    /// ABI-encode the single address argument as one left-padded word.
    fn call_data(&self, address: &EthAddress) -> String {
        let bare = address.as_str().trim_start_matches("0x");
        format!("0x{}{:0>width$}", self.selector, bare, width = WORD_HEX)
    }

    async fn eth_call(&self, data: String) -> GateResult<String> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                {"to": self.contract_address, "data": data},
                "latest"
            ]
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::Rpc(format!("eth_call transport: {e}")))?;
        if !response.status().is_success() {
            return Err(GateError::Rpc(format!(
                "eth_call returned status {}",
                response.status()
            )));
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| GateError::Rpc(format!("eth_call decode: {e}")))?;
        if let Some(error) = envelope.error {
            return Err(GateError::Rpc(format!(
                "eth_call error {}: {}",
                error.code, error.message
            )));
        }
        envelope
            .result
            .ok_or_else(|| GateError::Rpc("eth_call returned no result".to_string()))
    }
}

impl OwnershipOracle for EthRpcOracle {
    async fn owner_owns_token(&self, address: &EthAddress, token_id: u64) -> GateResult<bool> {
        let result = self.eth_call(self.call_data(address)).await?;
        let (owned_token_id, holds) = decode_token_of_owner(&result)?;

        let owns = holds && owned_token_id == token_id;
        tracing::debug!(
            address = %address,
            token_id,
            owned_token_id,
            holds,
            "ownership oracle result"
        );
        Ok(owns)
    }
}

/// Decode the `(uint256 tokenId, bool holds)` return tuple.
fn decode_token_of_owner(result: &str) -> GateResult<(u64, bool)> {
    let hex_data = result.trim_start_matches("0x");
    if hex_data.len() < 2 * WORD_HEX {
        return Err(GateError::Rpc(format!(
            "eth_call result too short: {} chars",
            hex_data.len()
        )));
    }

    let token_word = &hex_data[..WORD_HEX];
    let token_id = u64::from_str_radix(token_word.trim_start_matches('0'), 16)
        .or_else(|_| {
            // All-zero word trims to empty.
            if token_word.chars().all(|c| c == '0') {
                Ok(0)
            } else {
                Err(GateError::Rpc("eth_call token id not a u64".to_string()))
            }
        })?;

    let bool_word = &hex_data[WORD_HEX..2 * WORD_HEX];
    let holds = match bool_word.trim_start_matches('0') {
        "" => false,
        "1" => true,
        other => {
            return Err(GateError::Rpc(format!(
                "eth_call bool word malformed: {other}"
            )));
        }
    };

    Ok((token_id, holds))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(value: u64) -> String {
        format!("{value:064x}")
    }

    #[test]
    fn test_decode_owner_tuple() {
        let result = format!("0x{}{}", word(42), word(1));
        assert_eq!(decode_token_of_owner(&result).unwrap(), (42, true));

        let result = format!("0x{}{}", word(0), word(0));
        assert_eq!(decode_token_of_owner(&result).unwrap(), (0, false));
    }

    #[test]
    fn test_decode_rejects_short_result() {
        assert!(decode_token_of_owner("0x").is_err());
        assert!(decode_token_of_owner(&format!("0x{}", word(1))).is_err());
    }

    #[test]
    fn test_decode_rejects_garbage_bool() {
        let result = format!("0x{}{}", word(42), word(7));
        assert!(decode_token_of_owner(&result).is_err());
    }

    #[test]
    fn test_call_data_layout() {
        let oracle = EthRpcOracle::new(
            "http://localhost:8545".to_string(),
            "0x00000000000000000000000000000000000000aa".to_string(),
        )
        .unwrap();
        let address =
            EthAddress::parse("0x1234567890abcdef1234567890abcdef12345678").unwrap();
        let data = oracle.call_data(&address);

        // 0x + 8 selector chars + one 64-char word
        assert_eq!(data.len(), 2 + 8 + WORD_HEX);
        assert!(data.ends_with("0000000000000000000000001234567890abcdef1234567890abcdef12345678"));
    }
}
