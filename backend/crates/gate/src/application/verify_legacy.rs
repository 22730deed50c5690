//! Legacy signed-message verification
//!
//! The pre-SIWE flow. There is no stored nonce; freshness comes from the
//! signed timestamp, and binding comes from reconstructing the exact
//! challenge server-side from the request's own host, path and method.

use crate::application::config::GateConfig;
use crate::domain::legacy::challenge_message;
use crate::domain::siwe::normalize_domain;
use crate::domain::value_objects::EthAddress;
use crate::error::{AuthFailure, GateError, GateResult};
use std::sync::Arc;

/// Inputs for one legacy verification
#[derive(Debug)]
pub struct LegacyVerifyInput<'a> {
    pub address: &'a EthAddress,
    /// Hex-encoded 65-byte signature
    pub signature: &'a str,
    pub token_id: u64,
    /// Client-claimed signing time, unix milliseconds
    pub timestamp_ms: i64,
    /// Host the request actually arrived on
    pub request_host: Option<&'a str>,
    pub path: &'a str,
    pub method: &'a str,
}

/// The verified proof, kept for credential minting.
#[derive(Debug, Clone)]
pub struct LegacyProof {
    pub host: String,
    pub chain_id: u64,
    /// The exact challenge string that was signed
    pub message: String,
}

/// Verifies legacy timestamped challenges.
pub struct LegacyVerifier {
    config: Arc<GateConfig>,
}

impl LegacyVerifier {
    pub fn new(config: Arc<GateConfig>) -> Self {
        Self { config }
    }

    /// Run the full check sequence: timestamp freshness, host allowlist,
    /// challenge reconstruction, signature recovery.
    pub fn verify(&self, input: LegacyVerifyInput<'_>) -> GateResult<LegacyProof> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        if input.timestamp_ms - now_ms > self.config.future_leeway_ms() {
            return Err(GateError::auth(AuthFailure::TimestampInFuture));
        }
        if now_ms - input.timestamp_ms > self.config.max_skew_ms() {
            return Err(GateError::auth(AuthFailure::TimestampExpired));
        }

        let host = match input.request_host {
            Some(host) => normalize_domain(host),
            None => return Err(GateError::auth(AuthFailure::DomainMismatch)),
        };
        if !self.config.is_domain_allowed(&host) {
            return Err(GateError::auth(AuthFailure::DomainMismatch));
        }

        let message = challenge_message(
            input.token_id,
            &host,
            input.path,
            input.method,
            self.config.chain_id,
            input.timestamp_ms,
        );

        let recovered = platform::eth::recover_personal_sign_address(&message, input.signature)?;
        if !input.address.matches(&recovered) {
            return Err(GateError::auth(AuthFailure::InvalidSignature));
        }

        tracing::info!(address = %input.address, host = %host, "legacy proof verified");
        Ok(LegacyProof {
            host,
            chain_id: self.config.chain_id,
            message,
        })
    }
}
