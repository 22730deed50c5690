//! Legacy signed-message challenge
//!
//! Predates the SIWE flow. The challenge is never persisted: signer and
//! verifier reconstruct it independently, so both sides must derive a
//! byte-identical string or verification fails.

use std::fmt::Write;

/// Build the deterministic challenge a wallet signs in the legacy flow.
pub fn challenge_message(
    token_id: u64,
    host: &str,
    path: &str,
    method: &str,
    chain_id: u64,
    timestamp_ms: i64,
) -> String {
    let mut message = String::new();
    // write! to a String cannot fail
    let _ = write!(
        message,
        "I own key #{token_id}\nDomain: {host}\nPath: {path}\nMethod: {method}\nChainId: {chain_id}\nTimestamp: {timestamp_ms}"
    );
    message
}
