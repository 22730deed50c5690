//! SIWE proof verification
//!
//! Checks run in a fixed order: parse, nonce consumption, domain,
//! address, signature, chain id, validity window. The nonce is consumed
//! before any other policy check so a replayed message is dead even when
//! later checks would also have rejected it. Every rejection goes
//! through `GateError::auth`, so callers see one uniform failure.

use crate::application::config::GateConfig;
use crate::domain::repository::NonceRepository;
use crate::domain::siwe::{SiweClaims, normalize_domain};
use crate::domain::value_objects::EthAddress;
use crate::error::{AuthFailure, GateError, GateResult};
use std::sync::Arc;

/// Inputs for one SIWE verification
#[derive(Debug)]
pub struct SiweVerifyInput<'a> {
    /// The exact plaintext message the wallet signed
    pub message: &'a str,
    /// Hex-encoded 65-byte signature
    pub signature: &'a str,
    /// Nonce echoed by the client alongside the message
    pub nonce: &'a str,
    /// Address the caller claims to control
    pub address: &'a EthAddress,
    /// Caller identifier the nonce was issued under
    pub identifier: &'a str,
    /// Host the request actually arrived on
    pub request_host: Option<&'a str>,
}

/// Verifies a SIWE message/signature pair against stored nonce state.
pub struct SiweVerifier<N> {
    nonces: Arc<N>,
    config: Arc<GateConfig>,
}

impl<N: NonceRepository> SiweVerifier<N> {
    pub fn new(nonces: Arc<N>, config: Arc<GateConfig>) -> Self {
        Self { nonces, config }
    }

    /// Run the full check sequence. Returns the parsed claims on success.
    pub async fn verify(&self, input: SiweVerifyInput<'_>) -> GateResult<SiweClaims> {
        let claims = SiweClaims::parse(input.message)
            .map_err(|_| GateError::auth(AuthFailure::MessageMalformed))?;

        // Burn the nonce first. Infrastructure errors propagate; a
        // missing or different stored value is an auth rejection.
        let outcome = self.nonces.consume(input.identifier, input.nonce).await?;
        if !outcome.is_valid() || claims.nonce != input.nonce {
            return Err(GateError::auth(AuthFailure::NonceMismatch));
        }

        let message_domain = normalize_domain(&claims.domain);
        if !self.config.is_domain_allowed(&message_domain) {
            return Err(GateError::auth(AuthFailure::DomainMismatch));
        }
        match input.request_host {
            Some(host) if normalize_domain(host) == message_domain => {}
            _ => return Err(GateError::auth(AuthFailure::DomainMismatch)),
        }

        if !input.address.matches(&claims.address) {
            return Err(GateError::auth(AuthFailure::AddressMismatch));
        }

        let recovered = platform::eth::recover_personal_sign_address(input.message, input.signature)?;
        if !input.address.matches(&recovered) {
            return Err(GateError::auth(AuthFailure::InvalidSignature));
        }

        if claims.chain_id != self.config.chain_id {
            return Err(GateError::auth(AuthFailure::ChainMismatch));
        }

        if !claims.is_within_validity_window(chrono::Utc::now()) {
            return Err(GateError::auth(AuthFailure::MessageWindow));
        }

        tracing::info!(
            address = %input.address,
            domain = %message_domain,
            "SIWE proof verified"
        );
        Ok(claims)
    }
}
